//! Two colored segments chasing each other
//!
//! Inside a chase ring the segment positions come from the shared
//! [`ChaseCoordinator`](crate::chase::ChaseCoordinator), so the member groups
//! read as one continuous strip. A group outside any ring runs a standalone
//! chase whose second segment trails the first by a slowly wandering offset.

use embassy_time::Instant;

use super::{ChaseView, Effect, EffectError, EffectState, RenderContext};
use crate::color::{Rgb, dim};

/// Offset wander rate in radians per second
const OFFSET_WANDER: f32 = 0.5;
const OFFSET_MIN: f32 = 0.2;
const OFFSET_MAX: f32 = 0.8;

#[derive(Debug, Clone, Copy, Default)]
pub struct ChaseEffect;

/// Whether `index` lies inside a segment of `size` pixels centered on
/// `center`, on a circle of `len` pixels
pub(crate) fn in_segment(index: f32, center: f32, size: f32, len: f32) -> bool {
    let start = center - size / 2.0;
    let end = center + size / 2.0;
    if end <= len && start >= 0.0 {
        start <= index && index < end
    } else if end > len {
        index >= start || index < end - len
    } else {
        index < end || index >= start + len
    }
}

impl ChaseEffect {
    fn render_ring(
        state: &EffectState,
        view: ChaseView<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<(), EffectError> {
        let coordinator = view.coordinator;
        let ring = coordinator.ring();
        if view.member >= ring.members().len() {
            return Err(EffectError::UnknownChaseMember(view.member));
        }

        let params = &state.params;
        let colors = [
            dim(params.chase_colors.0, params.max_brightness),
            dim(params.chase_colors.1, params.max_brightness),
        ];
        let size = f32::from(params.chase_size.max(1));
        let len = ring.len() as f32;
        let runners = coordinator.runners();
        let predator = coordinator.predator_runner();
        let prey = 1 - predator;

        for (local, led) in leds.iter_mut().enumerate() {
            let Some(absolute) = ring.absolute(view.member, local) else {
                *led = None;
                continue;
            };
            let index = absolute as f32;
            *led = if in_segment(index, runners[predator].position, size, len) {
                Some(colors[predator])
            } else if in_segment(index, runners[prey].position, size, len) {
                Some(colors[prey])
            } else {
                None
            };
        }
        Ok(())
    }

    fn render_standalone(state: &EffectState, now: Instant, leds: &mut [Option<Rgb>]) {
        let params = &state.params;
        let elapsed = state.elapsed_secs(now);
        let first = dim(params.chase_colors.0, params.max_brightness);
        let second = dim(params.chase_colors.1, params.max_brightness);

        let len = leds.len();
        if len <= 1 {
            let phase = libm::floorf(elapsed * params.speed) as i64;
            leds.fill(Some(if phase.rem_euclid(2) == 0 { first } else { second }));
            return;
        }

        let len = len as f32;
        let lead = (elapsed * params.speed).rem_euclid(len);
        let wander = libm::sinf(elapsed * OFFSET_WANDER) * params.chase_offset_variation;
        let offset = (params.chase_offset_base + wander).clamp(OFFSET_MIN, OFFSET_MAX);
        let trail = (lead + len * offset).rem_euclid(len);
        let size = f32::from(params.chase_size.max(1));

        for (i, led) in leds.iter_mut().enumerate() {
            let index = i as f32;
            *led = if in_segment(index, lead, size, len) {
                Some(first)
            } else if in_segment(index, trail, size, len) {
                Some(second)
            } else {
                None
            };
        }
    }
}

impl Effect for ChaseEffect {
    fn render(
        &mut self,
        state: &EffectState,
        now: Instant,
        ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        match ctx.chase {
            Some(view) => Self::render_ring(state, view, leds)?,
            None => Self::render_standalone(state, now, leds),
        }
        Ok(true)
    }
}
