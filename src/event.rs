use serde::{Deserialize, Serialize};

const EVENT_NAME_IDLE: &str = "idle";
const EVENT_NAME_HEATING: &str = "heating";
const EVENT_NAME_PRINTING: &str = "printing";
const EVENT_NAME_COOLDOWN: &str = "cooldown";
const EVENT_NAME_ERROR: &str = "error";
const EVENT_NAME_BORED: &str = "bored";
const EVENT_NAME_SLEEP: &str = "sleep";

/// Discrete machine-state classification driving every LED group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingEvent {
    Idle,
    Heating,
    Printing,
    Cooldown,
    Error,
    Bored,
    Sleep,
}

impl OperatingEvent {
    pub const ALL: [Self; 7] = [
        Self::Idle,
        Self::Heating,
        Self::Printing,
        Self::Cooldown,
        Self::Error,
        Self::Bored,
        Self::Sleep,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => EVENT_NAME_IDLE,
            Self::Heating => EVENT_NAME_HEATING,
            Self::Printing => EVENT_NAME_PRINTING,
            Self::Cooldown => EVENT_NAME_COOLDOWN,
            Self::Error => EVENT_NAME_ERROR,
            Self::Bored => EVENT_NAME_BORED,
            Self::Sleep => EVENT_NAME_SLEEP,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            EVENT_NAME_IDLE => Some(Self::Idle),
            EVENT_NAME_HEATING => Some(Self::Heating),
            EVENT_NAME_PRINTING => Some(Self::Printing),
            EVENT_NAME_COOLDOWN => Some(Self::Cooldown),
            EVENT_NAME_ERROR => Some(Self::Error),
            EVENT_NAME_BORED => Some(Self::Bored),
            EVENT_NAME_SLEEP => Some(Self::Sleep),
            _ => None,
        }
    }

    /// Timeout overlays that hold until interrupted
    pub const fn is_sticky(self) -> bool {
        matches!(self, Self::Bored | Self::Sleep)
    }
}

impl core::fmt::Display for OperatingEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
