//! Scanner effect with optional toolhead tracking
//!
//! The eye bounces end to end on a triangle wave, one full sweep there and
//! back per `1 / speed` seconds. With a tracking axis set, the eye follows
//! the toolhead across the bed while it moves and resumes bouncing when it
//! stops.

use embassy_time::Instant;

use super::{Effect, EffectError, EffectState, RenderContext, TrackingAxis, cycle_phase};
use crate::color::{Rgb, dim};

/// Minimum toolhead travel between frames that counts as moving, in mm
const MOTION_THRESHOLD: f32 = 1.0;
const TAIL_EXPONENT: f32 = 2.5;

#[derive(Debug, Clone, Default)]
pub struct KittEffect {
    last_toolhead: Option<f32>,
}

impl KittEffect {
    /// Bouncing eye position in 0..=len-1
    pub fn bounce_position(elapsed: f32, speed: f32, len: usize) -> f32 {
        let phase = cycle_phase(elapsed, speed) * 2.0;
        let span = len.saturating_sub(1) as f32;
        if phase < 1.0 {
            phase * span
        } else {
            (2.0 - phase) * span
        }
    }

    fn tracking_position(
        &mut self,
        axis: TrackingAxis,
        ctx: &RenderContext<'_>,
        len: usize,
    ) -> Option<f32> {
        let position = ctx.telemetry.position?;
        let (current, min, max) = match axis {
            TrackingAxis::X => (position.x, ctx.bed.x_min, ctx.bed.x_max),
            TrackingAxis::Y => (position.y, ctx.bed.y_min, ctx.bed.y_max),
        };

        let moving = self
            .last_toolhead
            .is_some_and(|last| (current - last).abs() > MOTION_THRESHOLD);
        self.last_toolhead = Some(current);
        if !moving {
            return None;
        }

        let normalized = ((current - min) / (max - min).max(1.0)).clamp(0.0, 1.0);
        Some(normalized * len.saturating_sub(1) as f32)
    }
}

impl Effect for KittEffect {
    fn render(
        &mut self,
        state: &EffectState,
        now: Instant,
        ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        let len = leds.len();
        if len <= 1 {
            leds.fill(Some(state.color));
            return Ok(true);
        }

        let params = &state.params;
        let tracked = params
            .tracking_axis
            .and_then(|axis| self.tracking_position(axis, ctx, len));
        let position = tracked.unwrap_or_else(|| {
            Self::bounce_position(state.elapsed_secs(now), params.speed, len)
        });

        let eye = f32::from(params.eye_size / 2);
        let tail = f32::from(params.tail_length);
        for (i, led) in leds.iter_mut().enumerate() {
            let distance = (i as f32 - position).abs();
            *led = if distance <= eye {
                Some(dim(state.color, params.max_brightness))
            } else if tail > 0.0 && distance <= eye + tail {
                let fade = 1.0 - (distance - eye) / tail;
                Some(dim(
                    state.color,
                    params.max_brightness * libm::powf(fade, TAIL_EXPONENT),
                ))
            } else {
                None
            };
        }
        Ok(true)
    }

    fn reset(&mut self) {
        self.last_toolhead = None;
    }
}
