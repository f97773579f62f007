//! Priority-ordered machine state classification
//!
//! Detectors run highest priority first: error, printing, heating, cooldown,
//! then the sleep and bored timeout overlays, and finally idle. Bored and
//! sleep are sticky: once entered, only an interrupting detector (error,
//! printing, heating), the bored-to-sleep timer, or an explicit reset moves
//! the classifier on.

mod detector;

use embassy_time::{Duration, Instant};
use log::{info, warn};

pub use detector::{
    ClassifyError, CooldownDetector, Detector, ErrorDetector, HeatingDetector, PrintingDetector,
};

use crate::{event::OperatingEvent, telemetry::TelemetrySnapshot};

pub const DEFAULT_TOOL_TOLERANCE: f32 = 10.0;
pub const DEFAULT_BED_TOLERANCE: f32 = 5.0;
pub const DEFAULT_PRINT_FLOOR: f32 = 200.0;
pub const DEFAULT_TEMP_FLOOR: f32 = 25.0;
pub const DEFAULT_COOLDOWN_MARGIN: f32 = 10.0;
pub const DEFAULT_BORED_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_SLEEP_TIMEOUT: Duration = Duration::from_secs(600);

/// Detectors that may leave a sticky event
const INTERRUPTS: [&dyn Detector; 3] = [&ErrorDetector, &PrintingDetector, &HeatingDetector];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    /// Tool within this many degrees of target counts as at temperature
    pub tool_tolerance: f32,
    /// Bed and chamber tolerance
    pub bed_tolerance: f32,
    /// Minimum tool temperature for printing, `0.0` disables the check
    pub print_floor: f32,
    /// Ambient baseline
    pub temp_floor: f32,
    /// Degrees above ambient that still count as cooling down
    pub cooldown_margin: f32,
    pub bored_timeout: Duration,
    pub sleep_timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            tool_tolerance: DEFAULT_TOOL_TOLERANCE,
            bed_tolerance: DEFAULT_BED_TOLERANCE,
            print_floor: DEFAULT_PRINT_FLOOR,
            temp_floor: DEFAULT_TEMP_FLOOR,
            cooldown_margin: DEFAULT_COOLDOWN_MARGIN,
            bored_timeout: DEFAULT_BORED_TIMEOUT,
            sleep_timeout: DEFAULT_SLEEP_TIMEOUT,
        }
    }
}

/// Persistent timer state carried between classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTimers {
    /// When the current event was entered
    pub entered_at: Instant,
}

/// Run one detector, logging and discarding its error.
fn run(detector: &dyn Detector, telemetry: &TelemetrySnapshot, config: &ClassifierConfig) -> bool {
    match detector.detect(telemetry, config) {
        Ok(hit) => hit,
        Err(err) => {
            warn!(
                "[classifier] {} detector failed ({}): {}",
                detector.event(),
                err.as_label(),
                err
            );
            false
        }
    }
}

/// Classify telemetry into exactly one event.
///
/// Pure function of its inputs; [`StateClassifier`] owns the timers.
pub fn classify(
    telemetry: &TelemetrySnapshot,
    previous: OperatingEvent,
    timers: &EventTimers,
    now: Instant,
    config: &ClassifierConfig,
) -> OperatingEvent {
    for detector in INTERRUPTS {
        if run(detector, telemetry, config) {
            return detector.event();
        }
    }

    let in_state = now.saturating_duration_since(timers.entered_at);
    match previous {
        OperatingEvent::Sleep => return OperatingEvent::Sleep,
        OperatingEvent::Bored => {
            return if in_state >= config.sleep_timeout {
                OperatingEvent::Sleep
            } else {
                OperatingEvent::Bored
            };
        }
        _ => {}
    }

    if run(&CooldownDetector, telemetry, config) {
        return OperatingEvent::Cooldown;
    }

    if previous == OperatingEvent::Idle && in_state >= config.bored_timeout {
        return OperatingEvent::Bored;
    }
    OperatingEvent::Idle
}

/// Stateful classifier holding the current event and its timers
#[derive(Debug, Clone)]
pub struct StateClassifier {
    config: ClassifierConfig,
    current: OperatingEvent,
    previous: Option<OperatingEvent>,
    timers: EventTimers,
    last_telemetry: TelemetrySnapshot,
}

impl StateClassifier {
    pub fn new(config: ClassifierConfig, now: Instant) -> Self {
        Self {
            config,
            current: OperatingEvent::Idle,
            previous: None,
            timers: EventTimers { entered_at: now },
            last_telemetry: TelemetrySnapshot::default(),
        }
    }

    /// Classify a fresh snapshot and record any transition.
    pub fn update(&mut self, telemetry: TelemetrySnapshot, now: Instant) -> OperatingEvent {
        self.last_telemetry = telemetry;
        self.tick(now)
    }

    /// Re-classify the last snapshot so timeouts advance without new telemetry.
    pub fn tick(&mut self, now: Instant) -> OperatingEvent {
        let next = classify(
            &self.last_telemetry,
            self.current,
            &self.timers,
            now,
            &self.config,
        );
        self.enter(next, now);
        self.current
    }

    /// Override the current event, restarting its timer.
    pub fn force(&mut self, event: OperatingEvent, now: Instant) {
        info!("[classifier] forced event {}", event);
        self.enter(event, now);
        self.timers.entered_at = now;
    }

    /// Clear sticky overlays and restart the idle timer.
    pub fn reset(&mut self, now: Instant) {
        self.previous = Some(self.current);
        self.current = OperatingEvent::Idle;
        self.timers.entered_at = now;
    }

    pub fn set_config(&mut self, config: ClassifierConfig) {
        self.config = config;
    }

    pub fn current(&self) -> OperatingEvent {
        self.current
    }

    pub fn previous(&self) -> Option<OperatingEvent> {
        self.previous
    }

    pub fn timers(&self) -> EventTimers {
        self.timers
    }

    pub fn telemetry(&self) -> &TelemetrySnapshot {
        &self.last_telemetry
    }

    /// Time spent in the current event
    pub fn time_in_state(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.timers.entered_at)
    }

    fn enter(&mut self, next: OperatingEvent, now: Instant) {
        if next == self.current {
            return;
        }
        info!("[classifier] event {} -> {}", self.current, next);
        self.previous = Some(self.current);
        self.current = next;
        self.timers.entered_at = now;
    }
}
