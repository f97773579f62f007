//! Random sparkle effect

use embassy_time::Instant;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::index};

use super::{Effect, EffectError, EffectState, RenderContext, fill};
use crate::{
    color::{Rgb, hue_to_rgb},
    math8::duration_from_secs_f32,
};

/// Lights a random number of random pixels with random hues, `speed` times per second
#[derive(Debug, Clone)]
pub struct DiscoEffect {
    rng: StdRng,
    last_tick: Option<Instant>,
}

impl DiscoEffect {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    /// Create with a fixed random source
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            last_tick: None,
        }
    }

    /// Inclusive sparkle count range. `min` is pulled down to `max` and
    /// both are clamped to the strip length.
    pub fn sparkle_range(min: u16, max: u16, len: usize) -> (usize, usize) {
        let low = min.min(max);
        (usize::from(low).min(len), usize::from(max).min(len))
    }
}

impl Default for DiscoEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for DiscoEffect {
    fn render(
        &mut self,
        state: &EffectState,
        now: Instant,
        _ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        let interval = duration_from_secs_f32(1.0 / state.params.speed);
        if let Some(last) = self.last_tick {
            if now.saturating_duration_since(last) < interval {
                return Ok(false);
            }
        }
        self.last_tick = Some(now);

        fill(leds, None);
        let len = leds.len();
        if len == 0 {
            return Ok(true);
        }

        let (low, high) =
            Self::sparkle_range(state.params.min_sparkle, state.params.max_sparkle, len);
        let count = self.rng.random_range(low..=high);
        for i in index::sample(&mut self.rng, len, count) {
            let hue: f32 = self.rng.random();
            leds[i] = Some(hue_to_rgb(hue, 1.0, state.params.max_brightness));
        }
        Ok(true)
    }

    fn reset(&mut self) {
        self.last_tick = None;
    }
}
