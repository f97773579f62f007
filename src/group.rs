//! LED groups
//!
//! [`GroupConfig`] is the static description of one independently addressed
//! segment. [`GroupRuntime`] holds its mutable render state: the cached
//! effect instance for the current (event, effect) pair, the frame buffer,
//! and dispatch bookkeeping.

use std::collections::BTreeMap;

use embassy_time::{Duration, Instant};
use serde::{Deserialize, Serialize};

use crate::{
    color::Rgb,
    effect::{EffectError, EffectId, EffectSlot, EffectSpec, EffectState, RenderContext},
    event::OperatingEvent,
};

/// Physical pixel addressing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Standard,
    Reverse,
}

/// Scheduling class of an output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelClass {
    /// Hardware sidecar, supports short intervals
    Direct,
    /// Pixels set through the firmware command queue
    Firmware,
    /// Single brightness pin through the firmware command queue
    Binary,
}

/// Physical output channel identity; groups sharing a key share a bus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelKey {
    Sidecar { gpio_pin: u8 },
    Firmware { neopixel: String },
    Binary { pin_name: String },
}

impl ChannelKey {
    pub const fn class(&self) -> ChannelClass {
        match self {
            Self::Sidecar { .. } => ChannelClass::Direct,
            Self::Firmware { .. } => ChannelClass::Firmware,
            Self::Binary { .. } => ChannelClass::Binary,
        }
    }

    /// Uses the firmware command queue
    pub const fn is_queued(&self) -> bool {
        !matches!(self, Self::Sidecar { .. })
    }
}

impl core::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Sidecar { gpio_pin } => write!(f, "sidecar:gpio{gpio_pin}"),
            Self::Firmware { neopixel } => write!(f, "firmware:{neopixel}"),
            Self::Binary { pin_name } => write!(f, "pin:{pin_name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupConfig {
    pub name: String,
    pub channel: ChannelKey,
    /// First pixel on the channel, 1-based
    pub index_start: usize,
    /// Last pixel on the channel, inclusive
    pub index_end: usize,
    pub direction: Direction,
    /// Multiplier applied after the effect's own brightness
    pub brightness: f32,
    /// Full-scale value for binary channels
    pub pwm_scale: f32,
    pub effects: BTreeMap<OperatingEvent, EffectSpec>,
}

impl GroupConfig {
    pub fn new(name: impl Into<String>, channel: ChannelKey, index_start: usize, index_end: usize) -> Self {
        Self {
            name: name.into(),
            channel,
            index_start,
            index_end,
            direction: Direction::Standard,
            brightness: 1.0,
            pwm_scale: 1.0,
            effects: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_effect(mut self, event: OperatingEvent, spec: EffectSpec) -> Self {
        self.effects.insert(event, spec);
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_brightness(mut self, brightness: f32) -> Self {
        self.brightness = brightness;
        self
    }

    /// Whether both drive the same pixels under the same name
    pub fn same_footprint(&self, other: &GroupConfig) -> bool {
        self.name == other.name
            && self.channel == other.channel
            && self.index_start == other.index_start
            && self.index_end == other.index_end
    }

    pub fn pixel_count(&self) -> usize {
        (self.index_end + 1).saturating_sub(self.index_start)
    }

    /// Effect configured for `event`, if any
    pub fn effect_for(&self, event: OperatingEvent) -> Option<&EffectSpec> {
        self.effects.get(&event)
    }
}

#[derive(Debug, Clone)]
struct ActiveEffect {
    event: OperatingEvent,
    spec: EffectSpec,
    state: EffectState,
    slot: EffectSlot,
}

/// Mutable per-group render state
#[derive(Debug, Clone)]
pub struct GroupRuntime {
    active: Option<ActiveEffect>,
    frame: Vec<Option<Rgb>>,
    last_render: Option<Instant>,
    off_sent: bool,
}

impl GroupRuntime {
    pub fn new(pixel_count: usize) -> Self {
        Self {
            active: None,
            frame: vec![None; pixel_count],
            last_render: None,
            off_sent: false,
        }
    }

    /// Bring the cached effect in line with `spec` for `event`.
    ///
    /// The effect state and instance are replaced whenever the event or the
    /// configured effect changes. Returns whether a replacement happened.
    pub fn sync(
        &mut self,
        event: OperatingEvent,
        spec: &EffectSpec,
        direction: Direction,
        now: Instant,
    ) -> bool {
        if let Some(active) = &self.active {
            if active.event == event && active.spec == *spec {
                return false;
            }
        }

        self.active = Some(ActiveEffect {
            event,
            spec: spec.clone(),
            state: EffectState::new(spec, direction, now),
            slot: spec.effect.to_slot(),
        });
        self.last_render = None;
        self.off_sent = false;
        true
    }

    /// Render the active effect into the frame buffer
    pub fn render(&mut self, now: Instant, ctx: &RenderContext<'_>) -> Result<bool, EffectError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(false);
        };
        let changed = active.slot.render(&active.state, now, ctx, &mut self.frame)?;
        if changed {
            active.state.last_update = Some(now);
        }
        self.last_render = Some(now);
        Ok(changed)
    }

    /// Show the base color after an effect failure
    pub fn fallback(&mut self, now: Instant) {
        let color = self.active.as_ref().map(|active| active.spec.color);
        for led in &mut self.frame {
            *led = color;
        }
        self.last_render = Some(now);
    }

    pub fn effect(&self) -> Option<EffectId> {
        self.active.as_ref().map(|active| active.spec.effect)
    }

    pub fn event(&self) -> Option<OperatingEvent> {
        self.active.as_ref().map(|active| active.event)
    }

    pub fn effect_state(&self) -> Option<&EffectState> {
        self.active.as_ref().map(|active| &active.state)
    }

    pub fn frame(&self) -> &[Option<Rgb>] {
        &self.frame
    }

    pub fn is_due(&self, now: Instant, interval: Duration) -> bool {
        self.last_render
            .is_none_or(|last| now.saturating_duration_since(last) >= interval)
    }

    /// When the group next needs rendering
    pub fn next_due(&self, now: Instant, interval: Duration) -> Instant {
        match self.last_render {
            Some(last) => (last + interval).max(now),
            None => now,
        }
    }

    /// An off frame has been dispatched; stop scheduling until the effect changes
    pub fn mark_off_sent(&mut self) {
        self.off_sent = true;
    }

    pub fn is_parked(&self) -> bool {
        self.off_sent && self.effect() == Some(EffectId::Off)
    }

    /// Drop the cached effect; the next sync rebuilds it
    pub fn invalidate(&mut self) {
        self.active = None;
        self.last_render = None;
        self.off_sent = false;
    }
}
