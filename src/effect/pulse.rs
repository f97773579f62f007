//! Breathing effects
//!
//! - `PulseEffect`: sine brightness between the configured bounds
//! - `HeartbeatEffect`: a strong beat followed by a weaker sub-beat, then rest

use core::f32::consts::TAU;

use embassy_time::Instant;

use super::{Effect, EffectError, EffectState, RenderContext, cycle_phase, fill};
use crate::color::{Rgb, dim};

const FIRST_BEAT: f32 = 0.15;
const DIP: f32 = 0.05;
const SECOND_BEAT: f32 = 0.05;
const FADE: f32 = 0.10;
/// Envelope floor reached between the two beats
const DIP_LEVEL: f32 = 0.25;
/// Peak of the second beat relative to the first
const SECOND_BEAT_LEVEL: f32 = 0.5;

fn brightness(state: &EffectState, envelope: f32) -> f32 {
    let params = &state.params;
    params.min_brightness + envelope * (params.max_brightness - params.min_brightness)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PulseEffect;

impl Effect for PulseEffect {
    fn render(
        &mut self,
        state: &EffectState,
        now: Instant,
        _ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        let elapsed = state.elapsed_secs(now);
        let envelope = (libm::sinf(elapsed * state.params.speed * TAU) + 1.0) / 2.0;
        fill(leds, Some(dim(state.color, brightness(state, envelope))));
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeartbeatEffect;

impl HeartbeatEffect {
    /// Beat envelope in 0.0-1.0 for a phase in 0.0-1.0
    pub fn envelope(phase: f32) -> f32 {
        let mut start = 0.0;
        if phase < start + FIRST_BEAT {
            return (phase - start) / FIRST_BEAT;
        }
        start += FIRST_BEAT;
        if phase < start + DIP {
            let t = (phase - start) / DIP;
            return 1.0 - t * (1.0 - DIP_LEVEL);
        }
        start += DIP;
        if phase < start + SECOND_BEAT {
            let t = (phase - start) / SECOND_BEAT;
            return DIP_LEVEL + t * (SECOND_BEAT_LEVEL - DIP_LEVEL);
        }
        start += SECOND_BEAT;
        if phase < start + FADE {
            let t = (phase - start) / FADE;
            return SECOND_BEAT_LEVEL * (1.0 - t);
        }
        0.0
    }
}

impl Effect for HeartbeatEffect {
    fn render(
        &mut self,
        state: &EffectState,
        now: Instant,
        _ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        let phase = cycle_phase(state.elapsed_secs(now), state.params.speed);
        let envelope = Self::envelope(phase);
        fill(leds, Some(dim(state.color, brightness(state, envelope))));
        Ok(true)
    }
}
