//! Effect system with compile-time known effect variants
//!
//! Every effect unit lives in the closed [`EffectSlot`] enum and implements
//! [`Effect`]. A slot is built from an [`EffectId`] when a group's active
//! effect changes and is dropped, scratch state included, when it changes
//! again.

mod chase;
mod comet;
mod disco;
mod fill;
mod fire;
mod kitt;
mod off;
mod params;
mod pulse;
mod rainbow;
mod solid;

use embassy_time::{Duration, Instant};
use thiserror::Error;

pub use chase::ChaseEffect;
pub use comet::CometEffect;
pub use disco::DiscoEffect;
pub use fill::{ProgressEffect, ThermalEffect};
pub use fire::FireEffect;
pub use kitt::KittEffect;
pub use off::OffEffect;
pub use params::{EffectOverrides, EffectParams, TrackingAxis};
pub use pulse::{HeartbeatEffect, PulseEffect};
pub use rainbow::RainbowEffect;
pub use solid::SolidEffect;

use crate::{
    chase::ChaseCoordinator, color::Rgb, group::Direction, math8::secs_f32,
    telemetry::TelemetrySnapshot,
};

const EFFECT_NAME_SOLID: &str = "solid";
const EFFECT_NAME_PULSE: &str = "pulse";
const EFFECT_NAME_HEARTBEAT: &str = "heartbeat";
const EFFECT_NAME_DISCO: &str = "disco";
const EFFECT_NAME_RAINBOW: &str = "rainbow";
const EFFECT_NAME_FIRE: &str = "fire";
const EFFECT_NAME_COMET: &str = "comet";
const EFFECT_NAME_CHASE: &str = "chase";
const EFFECT_NAME_KITT: &str = "kitt";
const EFFECT_NAME_THERMAL: &str = "thermal";
const EFFECT_NAME_PROGRESS: &str = "progress";
const EFFECT_NAME_OFF: &str = "off";

/// How often an effect needs recomputing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectComplexity {
    /// Constant output, refreshed rarely
    Static,
    /// Continuous animation at the channel's fastest interval
    Animated,
    /// Follows telemetry, no faster than the reactive interval
    Reactive,
    /// Dispatched once, then skipped
    Off,
}

/// Effect computation failure; the group falls back to its base color.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
    #[error("chase coordinator does not contain member {0}")]
    UnknownChaseMember(usize),
}

impl EffectError {
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "effect_invalid_parameter",
            Self::UnknownChaseMember(_) => "effect_unknown_chase_member",
        }
    }
}

/// Coordinated chase position for one ring member
#[derive(Clone, Copy)]
pub struct ChaseView<'a> {
    pub coordinator: &'a ChaseCoordinator,
    pub member: usize,
}

/// Machine bed extent used for toolhead tracking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BedExtent {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Default for BedExtent {
    fn default() -> Self {
        Self {
            x_min: 0.0,
            x_max: 300.0,
            y_min: 0.0,
            y_max: 300.0,
        }
    }
}

/// Read-only inputs shared by every effect for one frame
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub telemetry: &'a TelemetrySnapshot,
    /// Ambient baseline for thermal fills
    pub temp_floor: f32,
    pub bed: BedExtent,
    pub chase: Option<ChaseView<'a>>,
}

impl<'a> RenderContext<'a> {
    pub fn new(telemetry: &'a TelemetrySnapshot) -> Self {
        Self {
            telemetry,
            temp_floor: crate::classifier::DEFAULT_TEMP_FLOOR,
            bed: BedExtent::default(),
            chase: None,
        }
    }
}

/// Per-(group, event) animation state
#[derive(Debug, Clone, PartialEq)]
pub struct EffectState {
    pub effect: EffectId,
    /// Base color before any brightness scaling
    pub color: Rgb,
    pub params: EffectParams,
    pub direction: Direction,
    /// Phase origin
    pub start: Instant,
    /// Last time a changed frame was produced
    pub last_update: Option<Instant>,
}

impl EffectState {
    pub fn new(spec: &EffectSpec, direction: Direction, now: Instant) -> Self {
        Self {
            effect: spec.effect,
            color: spec.color,
            params: spec.params,
            direction,
            start: now,
            last_update: None,
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }

    /// Elapsed seconds since the phase origin
    pub fn elapsed_secs(&self, now: Instant) -> f32 {
        secs_f32(self.elapsed(now))
    }
}

/// Effect selected for one group and event
#[derive(Debug, Clone, PartialEq)]
pub struct EffectSpec {
    pub effect: EffectId,
    pub color: Rgb,
    pub params: EffectParams,
}

impl EffectSpec {
    pub fn new(effect: EffectId, color: Rgb) -> Self {
        Self {
            effect,
            color,
            params: EffectParams::defaults_for(effect),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: EffectParams) -> Self {
        self.params = params;
        self
    }
}

/// One computed frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// One entry per pixel, `None` is unlit
    pub colors: Vec<Option<Rgb>>,
    /// Whether the frame differs from the previous one and needs sending
    pub changed: bool,
}

pub trait Effect {
    /// Scheduling class of this effect
    const COMPLEXITY: EffectComplexity = EffectComplexity::Animated;

    /// Render a single frame into `leds`
    ///
    /// Returns whether the buffer changed. Effects that throttle themselves
    /// leave the buffer untouched and return `false`.
    fn render(
        &mut self,
        state: &EffectState,
        now: Instant,
        ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError>;

    /// Reset effect scratch state
    fn reset(&mut self) {}
}

/// Effect slot - enum containing all possible effects
#[derive(Debug, Clone)]
pub enum EffectSlot {
    Solid(SolidEffect),
    Pulse(PulseEffect),
    Heartbeat(HeartbeatEffect),
    Disco(DiscoEffect),
    Rainbow(RainbowEffect),
    Fire(FireEffect),
    Comet(CometEffect),
    Chase(ChaseEffect),
    Kitt(KittEffect),
    Thermal(ThermalEffect),
    Progress(ProgressEffect),
    Off(OffEffect),
}

/// Known effect ids that can be requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectId {
    Solid,
    Pulse,
    Heartbeat,
    Disco,
    Rainbow,
    Fire,
    Comet,
    Chase,
    Kitt,
    Thermal,
    Progress,
    Off,
}

impl EffectId {
    pub const ALL: [Self; 12] = [
        Self::Solid,
        Self::Pulse,
        Self::Heartbeat,
        Self::Disco,
        Self::Rainbow,
        Self::Fire,
        Self::Comet,
        Self::Chase,
        Self::Kitt,
        Self::Thermal,
        Self::Progress,
        Self::Off,
    ];

    pub fn to_slot(self) -> EffectSlot {
        match self {
            Self::Solid => EffectSlot::Solid(SolidEffect::default()),
            Self::Pulse => EffectSlot::Pulse(PulseEffect),
            Self::Heartbeat => EffectSlot::Heartbeat(HeartbeatEffect),
            Self::Disco => EffectSlot::Disco(DiscoEffect::new()),
            Self::Rainbow => EffectSlot::Rainbow(RainbowEffect),
            Self::Fire => EffectSlot::Fire(FireEffect::new()),
            Self::Comet => EffectSlot::Comet(CometEffect),
            Self::Chase => EffectSlot::Chase(ChaseEffect),
            Self::Kitt => EffectSlot::Kitt(KittEffect::default()),
            Self::Thermal => EffectSlot::Thermal(ThermalEffect),
            Self::Progress => EffectSlot::Progress(ProgressEffect),
            Self::Off => EffectSlot::Off(OffEffect::default()),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solid => EFFECT_NAME_SOLID,
            Self::Pulse => EFFECT_NAME_PULSE,
            Self::Heartbeat => EFFECT_NAME_HEARTBEAT,
            Self::Disco => EFFECT_NAME_DISCO,
            Self::Rainbow => EFFECT_NAME_RAINBOW,
            Self::Fire => EFFECT_NAME_FIRE,
            Self::Comet => EFFECT_NAME_COMET,
            Self::Chase => EFFECT_NAME_CHASE,
            Self::Kitt => EFFECT_NAME_KITT,
            Self::Thermal => EFFECT_NAME_THERMAL,
            Self::Progress => EFFECT_NAME_PROGRESS,
            Self::Off => EFFECT_NAME_OFF,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            EFFECT_NAME_SOLID => Some(Self::Solid),
            EFFECT_NAME_PULSE => Some(Self::Pulse),
            EFFECT_NAME_HEARTBEAT => Some(Self::Heartbeat),
            EFFECT_NAME_DISCO => Some(Self::Disco),
            EFFECT_NAME_RAINBOW => Some(Self::Rainbow),
            EFFECT_NAME_FIRE => Some(Self::Fire),
            EFFECT_NAME_COMET => Some(Self::Comet),
            EFFECT_NAME_CHASE => Some(Self::Chase),
            EFFECT_NAME_KITT => Some(Self::Kitt),
            EFFECT_NAME_THERMAL => Some(Self::Thermal),
            EFFECT_NAME_PROGRESS => Some(Self::Progress),
            EFFECT_NAME_OFF => Some(Self::Off),
            _ => None,
        }
    }

    pub const fn complexity(self) -> EffectComplexity {
        match self {
            Self::Solid => SolidEffect::COMPLEXITY,
            Self::Pulse => PulseEffect::COMPLEXITY,
            Self::Heartbeat => HeartbeatEffect::COMPLEXITY,
            Self::Disco => DiscoEffect::COMPLEXITY,
            Self::Rainbow => RainbowEffect::COMPLEXITY,
            Self::Fire => FireEffect::COMPLEXITY,
            Self::Comet => CometEffect::COMPLEXITY,
            Self::Chase => ChaseEffect::COMPLEXITY,
            Self::Kitt => KittEffect::COMPLEXITY,
            Self::Thermal => ThermalEffect::COMPLEXITY,
            Self::Progress => ProgressEffect::COMPLEXITY,
            Self::Off => OffEffect::COMPLEXITY,
        }
    }

    /// Effects that only need one brightness level for the whole group
    pub const fn is_uniform(self) -> bool {
        matches!(self, Self::Solid | Self::Pulse | Self::Heartbeat | Self::Off)
    }
}

impl EffectSlot {
    /// Render into an existing buffer
    pub fn render(
        &mut self,
        state: &EffectState,
        now: Instant,
        ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        match self {
            Self::Solid(effect) => effect.render(state, now, ctx, leds),
            Self::Pulse(effect) => effect.render(state, now, ctx, leds),
            Self::Heartbeat(effect) => effect.render(state, now, ctx, leds),
            Self::Disco(effect) => effect.render(state, now, ctx, leds),
            Self::Rainbow(effect) => effect.render(state, now, ctx, leds),
            Self::Fire(effect) => effect.render(state, now, ctx, leds),
            Self::Comet(effect) => effect.render(state, now, ctx, leds),
            Self::Chase(effect) => effect.render(state, now, ctx, leds),
            Self::Kitt(effect) => effect.render(state, now, ctx, leds),
            Self::Thermal(effect) => effect.render(state, now, ctx, leds),
            Self::Progress(effect) => effect.render(state, now, ctx, leds),
            Self::Off(effect) => effect.render(state, now, ctx, leds),
        }
    }

    /// Compute a fresh frame of `pixel_count` pixels
    pub fn calculate(
        &mut self,
        state: &EffectState,
        now: Instant,
        pixel_count: usize,
        ctx: &RenderContext<'_>,
    ) -> Result<Frame, EffectError> {
        let mut colors = vec![None; pixel_count];
        let changed = self.render(state, now, ctx, &mut colors)?;
        Ok(Frame { colors, changed })
    }

    /// Reset the effect state
    pub fn reset(&mut self) {
        match self {
            Self::Solid(effect) => Effect::reset(effect),
            Self::Pulse(effect) => Effect::reset(effect),
            Self::Heartbeat(effect) => Effect::reset(effect),
            Self::Disco(effect) => Effect::reset(effect),
            Self::Rainbow(effect) => Effect::reset(effect),
            Self::Fire(effect) => Effect::reset(effect),
            Self::Comet(effect) => Effect::reset(effect),
            Self::Chase(effect) => Effect::reset(effect),
            Self::Kitt(effect) => Effect::reset(effect),
            Self::Thermal(effect) => Effect::reset(effect),
            Self::Progress(effect) => Effect::reset(effect),
            Self::Off(effect) => Effect::reset(effect),
        }
    }

    /// Get the effect ID for external observation
    pub fn id(&self) -> EffectId {
        match self {
            Self::Solid(_) => EffectId::Solid,
            Self::Pulse(_) => EffectId::Pulse,
            Self::Heartbeat(_) => EffectId::Heartbeat,
            Self::Disco(_) => EffectId::Disco,
            Self::Rainbow(_) => EffectId::Rainbow,
            Self::Fire(_) => EffectId::Fire,
            Self::Comet(_) => EffectId::Comet,
            Self::Chase(_) => EffectId::Chase,
            Self::Kitt(_) => EffectId::Kitt,
            Self::Thermal(_) => EffectId::Thermal,
            Self::Progress(_) => EffectId::Progress,
            Self::Off(_) => EffectId::Off,
        }
    }
}

/// Fill every pixel with one color
pub(crate) fn fill(leds: &mut [Option<Rgb>], color: Option<Rgb>) {
    for led in leds {
        *led = color;
    }
}

/// Fractional phase in 0.0-1.0 of a periodic effect at `speed` cycles/s
pub(crate) fn cycle_phase(elapsed: f32, speed: f32) -> f32 {
    let value = elapsed * speed;
    value - libm::floorf(value)
}
