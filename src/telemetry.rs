//! Machine telemetry snapshot
//!
//! The host replaces the snapshot wholesale on every update tick; the engine
//! only ever keeps the most recent one.

use serde::{Deserialize, Serialize};

/// Firmware connection state reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirmwareState {
    #[default]
    Ready,
    Startup,
    Shutdown,
    Error,
}

/// Print job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Standby,
    Printing,
    Paused,
    Complete,
    Cancelled,
    Error,
}

impl JobState {
    /// Printing or paused
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Printing | Self::Paused)
    }
}

/// Machine operations that hold the firmware command queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingOperation {
    Homing,
    Meshing,
    Leveling,
    Probing,
}

/// Heater selector used by thermal effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaterKind {
    #[default]
    #[serde(alias = "extruder")]
    Tool,
    Bed,
    Chamber,
}

impl HeaterKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Bed => "bed",
            Self::Chamber => "chamber",
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            "tool" | "extruder" => Some(Self::Tool),
            "bed" => Some(Self::Bed),
            "chamber" => Some(Self::Chamber),
            _ => None,
        }
    }
}

/// One heater reading in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeaterReading {
    pub current: f32,
    #[serde(default)]
    pub target: f32,
    #[serde(default)]
    pub power: f32,
}

impl HeaterReading {
    pub const fn new(current: f32, target: f32) -> Self {
        Self {
            current,
            target,
            power: 0.0,
        }
    }

    pub fn has_target(&self) -> bool {
        self.target > 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.current.is_finite() && self.target.is_finite()
    }

    pub fn within(&self, tolerance: f32) -> bool {
        (self.current - self.target).abs() <= tolerance
    }
}

/// Toolhead position in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySnapshot {
    pub firmware_state: FirmwareState,
    pub job_state: JobState,
    /// Job completion, 0.0-1.0
    pub progress: f32,
    #[serde(alias = "extruder")]
    pub tool: Option<HeaterReading>,
    #[serde(alias = "heater_bed")]
    pub bed: Option<HeaterReading>,
    pub chamber: Option<HeaterReading>,
    pub position: Option<Position>,
    pub filament_detected: Option<bool>,
    /// Raw idle-timeout state string (`Idle`, `Ready`, `Printing`, `error`)
    pub idle_state: Option<String>,
    pub blocking_operation: Option<BlockingOperation>,
}

impl TelemetrySnapshot {
    #[must_use]
    pub fn with_tool(mut self, current: f32, target: f32) -> Self {
        self.tool = Some(HeaterReading::new(current, target));
        self
    }

    #[must_use]
    pub fn with_bed(mut self, current: f32, target: f32) -> Self {
        self.bed = Some(HeaterReading::new(current, target));
        self
    }

    #[must_use]
    pub fn with_chamber(mut self, current: f32, target: f32) -> Self {
        self.chamber = Some(HeaterReading::new(current, target));
        self
    }

    #[must_use]
    pub fn with_job(mut self, job_state: JobState) -> Self {
        self.job_state = job_state;
        self
    }

    #[must_use]
    pub fn with_firmware(mut self, firmware_state: FirmwareState) -> Self {
        self.firmware_state = firmware_state;
        self
    }

    pub fn heater(&self, kind: HeaterKind) -> Option<&HeaterReading> {
        match kind {
            HeaterKind::Tool => self.tool.as_ref(),
            HeaterKind::Bed => self.bed.as_ref(),
            HeaterKind::Chamber => self.chamber.as_ref(),
        }
    }

    /// Every reported heater with its kind
    pub fn heaters(&self) -> impl Iterator<Item = (HeaterKind, &HeaterReading)> {
        [HeaterKind::Tool, HeaterKind::Bed, HeaterKind::Chamber]
            .into_iter()
            .filter_map(|kind| self.heater(kind).map(|reading| (kind, reading)))
    }
}
