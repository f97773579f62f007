//! Flickering fire effect
//!
//! Each pixel carries a heat value in 0.0-1.0. Every update the heat cools,
//! occasionally sparks, and jitters; heat then maps onto the red to yellow
//! part of the hue circle.

use embassy_time::Instant;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{Effect, EffectError, EffectState, RenderContext};
use crate::{
    color::{Rgb, hue_to_rgb},
    math8::duration_from_secs_f32,
};

const INITIAL_HEAT: f32 = 0.5;
const SPARK_CHANCE: f64 = 0.1;
const SPARK_MIN: f32 = 0.2;
const SPARK_MAX: f32 = 0.5;
const JITTER: f32 = 0.05;
/// Hue span covered from cold to hot
const HUE_SPAN: f32 = 0.15;
const DESATURATION: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct FireEffect {
    rng: StdRng,
    heat: Vec<f32>,
    last_tick: Option<Instant>,
}

impl FireEffect {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            heat: Vec::new(),
            last_tick: None,
        }
    }

    /// Current per-pixel heat
    pub fn heat(&self) -> &[f32] {
        &self.heat
    }
}

impl Default for FireEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for FireEffect {
    fn render(
        &mut self,
        state: &EffectState,
        now: Instant,
        _ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        let params = &state.params;
        if !(0.0..=1.0).contains(&params.cooling) {
            return Err(EffectError::InvalidParameter {
                name: "cooling",
                reason: "must be within 0.0-1.0",
            });
        }

        let interval = duration_from_secs_f32(1.0 / params.speed);
        if let Some(last) = self.last_tick {
            if now.saturating_duration_since(last) < interval {
                return Ok(false);
            }
        }
        self.last_tick = Some(now);

        if self.heat.len() != leds.len() {
            self.heat = vec![INITIAL_HEAT; leds.len()];
        }

        for (heat, led) in self.heat.iter_mut().zip(leds.iter_mut()) {
            *heat *= 1.0 - params.cooling;
            if self.rng.random_bool(SPARK_CHANCE) {
                *heat = (*heat + self.rng.random_range(SPARK_MIN..SPARK_MAX)).min(1.0);
            }
            *heat += self.rng.random_range(-JITTER..JITTER);
            *heat = heat.clamp(0.0, 1.0);

            let brightness =
                params.min_brightness + *heat * (params.max_brightness - params.min_brightness);
            *led = Some(hue_to_rgb(
                *heat * HUE_SPAN,
                1.0 - *heat * DESATURATION,
                brightness,
            ));
        }
        Ok(true)
    }

    fn reset(&mut self) {
        self.heat.clear();
        self.last_tick = None;
    }
}
