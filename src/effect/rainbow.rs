//! Rainbow cycling effect

use embassy_time::Instant;

use super::{Effect, EffectError, EffectState, RenderContext, cycle_phase};
use crate::color::{Rgb, hue_to_rgb};

/// Rainbow whose hue rotates at `speed` turns per second and spans `spread`
/// turns across the strip
#[derive(Debug, Clone, Copy, Default)]
pub struct RainbowEffect;

impl Effect for RainbowEffect {
    fn render(
        &mut self,
        state: &EffectState,
        now: Instant,
        _ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        let base_hue = cycle_phase(state.elapsed_secs(now), state.params.speed);
        let len = leds.len() as f32;

        for (i, led) in leds.iter_mut().enumerate() {
            let offset = if len > 1.0 {
                i as f32 / len * state.params.spread
            } else {
                0.0
            };
            *led = Some(hue_to_rgb(base_hue + offset, 1.0, state.params.max_brightness));
        }
        Ok(true)
    }
}
