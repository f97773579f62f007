//! Comet effect - a bright head with a fading tail circling the strip

use embassy_time::Instant;

use super::{Effect, EffectError, EffectState, RenderContext};
use crate::{
    color::{Rgb, dim},
    group::Direction,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct CometEffect;

/// Distance of `index` behind a head at `head`, wrapping around the strip
fn distance_behind(index: usize, head: f32, len: usize) -> f32 {
    let len = len as f32;
    let mut distance = head - index as f32;
    if distance < 0.0 {
        distance += len;
    }
    distance
}

impl Effect for CometEffect {
    fn render(
        &mut self,
        state: &EffectState,
        now: Instant,
        _ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        let len = leds.len();
        if len <= 1 {
            leds.fill(Some(state.color));
            return Ok(true);
        }

        let params = &state.params;
        let tail = f32::from(params.tail_length.max(1));
        let exponent = 1.0 + params.fade_rate * 2.0;
        let head = libm::fmodf(state.elapsed_secs(now) * params.speed, len as f32);

        for (i, led) in leds.iter_mut().enumerate() {
            let distance = distance_behind(i, head, len);
            *led = if distance <= tail && distance <= len as f32 / 2.0 {
                let fade = libm::powf(1.0 - distance / tail, exponent);
                Some(dim(state.color, params.max_brightness * fade))
            } else {
                None
            };
        }

        if state.direction == Direction::Reverse {
            leds.reverse();
        }
        Ok(true)
    }
}
