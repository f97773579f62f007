use thiserror::Error;

use crate::{
    classifier::ClassifierConfig,
    event::OperatingEvent,
    telemetry::{FirmwareState, HeaterKind, HeaterReading, JobState, TelemetrySnapshot},
};

/// Detector failure; the classifier logs it and treats the predicate as false.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("{heater} reading is not finite")]
    NonFiniteReading { heater: &'static str },
    #[error("job progress {0} is out of range")]
    InvalidProgress(f32),
}

impl ClassifyError {
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::NonFiniteReading { .. } => "classify_non_finite_reading",
            Self::InvalidProgress(_) => "classify_invalid_progress",
        }
    }
}

/// Single event predicate over the latest telemetry
pub trait Detector {
    /// Event produced when the predicate holds
    fn event(&self) -> OperatingEvent;

    fn detect(
        &self,
        telemetry: &TelemetrySnapshot,
        config: &ClassifierConfig,
    ) -> Result<bool, ClassifyError>;
}

pub struct ErrorDetector;
pub struct PrintingDetector;
pub struct HeatingDetector;
pub struct CooldownDetector;

fn checked(kind: HeaterKind, reading: &HeaterReading) -> Result<&HeaterReading, ClassifyError> {
    if reading.is_finite() {
        Ok(reading)
    } else {
        Err(ClassifyError::NonFiniteReading {
            heater: kind.as_str(),
        })
    }
}

fn tolerance(kind: HeaterKind, config: &ClassifierConfig) -> f32 {
    match kind {
        HeaterKind::Tool => config.tool_tolerance,
        HeaterKind::Bed | HeaterKind::Chamber => config.bed_tolerance,
    }
}

/// Tool temperature below which an active job still counts as warming up.
///
/// Capped at the lower edge of the tool tolerance band so low-temperature
/// materials can still reach printing.
fn effective_print_floor(tool: &HeaterReading, config: &ClassifierConfig) -> Option<f32> {
    if config.print_floor <= 0.0 || !tool.has_target() {
        return None;
    }
    Some(config.print_floor.min(tool.target - config.tool_tolerance))
}

impl Detector for ErrorDetector {
    fn event(&self) -> OperatingEvent {
        OperatingEvent::Error
    }

    fn detect(
        &self,
        telemetry: &TelemetrySnapshot,
        _config: &ClassifierConfig,
    ) -> Result<bool, ClassifyError> {
        let firmware = matches!(
            telemetry.firmware_state,
            FirmwareState::Shutdown | FirmwareState::Error
        );
        let idle_timeout = telemetry
            .idle_state
            .as_deref()
            .is_some_and(|state| state.eq_ignore_ascii_case("error"));
        Ok(firmware || telemetry.job_state == JobState::Error || idle_timeout)
    }
}

impl Detector for PrintingDetector {
    fn event(&self) -> OperatingEvent {
        OperatingEvent::Printing
    }

    fn detect(
        &self,
        telemetry: &TelemetrySnapshot,
        config: &ClassifierConfig,
    ) -> Result<bool, ClassifyError> {
        if !telemetry.job_state.is_active() {
            return Ok(false);
        }
        if !telemetry.progress.is_finite() {
            return Err(ClassifyError::InvalidProgress(telemetry.progress));
        }

        for (kind, reading) in telemetry.heaters() {
            let reading = checked(kind, reading)?;
            if reading.has_target() && !reading.within(tolerance(kind, config)) {
                return Ok(false);
            }
        }

        if let Some(tool) = telemetry.tool.as_ref() {
            if let Some(floor) = effective_print_floor(tool, config) {
                return Ok(tool.current >= floor);
            }
        }
        Ok(true)
    }
}

impl Detector for HeatingDetector {
    fn event(&self) -> OperatingEvent {
        OperatingEvent::Heating
    }

    fn detect(
        &self,
        telemetry: &TelemetrySnapshot,
        config: &ClassifierConfig,
    ) -> Result<bool, ClassifyError> {
        for (kind, reading) in telemetry.heaters() {
            let reading = checked(kind, reading)?;
            if reading.has_target() && !reading.within(tolerance(kind, config)) {
                return Ok(true);
            }
        }

        // Job started but the tool is still short of printing temperature
        if telemetry.job_state.is_active() {
            if let Some(tool) = telemetry.tool.as_ref() {
                if let Some(floor) = effective_print_floor(tool, config) {
                    return Ok(tool.current < floor);
                }
            }
        }
        Ok(false)
    }
}

impl Detector for CooldownDetector {
    fn event(&self) -> OperatingEvent {
        OperatingEvent::Cooldown
    }

    fn detect(
        &self,
        telemetry: &TelemetrySnapshot,
        config: &ClassifierConfig,
    ) -> Result<bool, ClassifyError> {
        if telemetry.job_state.is_active() {
            return Ok(false);
        }

        let threshold = config.temp_floor + config.cooldown_margin;
        let mut warm = false;
        for (kind, reading) in telemetry.heaters() {
            let reading = checked(kind, reading)?;
            if reading.has_target() {
                return Ok(false);
            }
            warm |= reading.current > threshold;
        }
        Ok(warm)
    }
}
