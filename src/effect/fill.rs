//! Progress-bar style fills
//!
//! `ThermalEffect` fills as a heater climbs from the ambient floor to its
//! target, `ProgressEffect` follows job completion. Both share
//! [`fill_bar`](crate::color::fill_bar).

use embassy_time::Instant;

use super::{Effect, EffectComplexity, EffectError, EffectState, RenderContext, fill};
use crate::{
    color::{Rgb, fill_bar},
    group::Direction,
};

fn render_fill(state: &EffectState, amount: f32, leds: &mut [Option<Rgb>]) {
    let params = &state.params;
    fill_bar(
        leds,
        amount,
        params.start_color,
        params.end_color,
        params.gradient_curve,
    );
    if state.direction == Direction::Reverse {
        leds.reverse();
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalEffect;

impl ThermalEffect {
    /// Fill fraction for a heater, or `None` when it has no usable range
    pub fn fill_fraction(current: f32, target: f32, floor: f32) -> Option<f32> {
        if !current.is_finite() || !target.is_finite() || target <= 0.0 {
            return None;
        }
        let range = target - floor;
        if range <= 0.0 {
            return None;
        }
        Some((current - floor) / range)
    }
}

impl Effect for ThermalEffect {
    const COMPLEXITY: EffectComplexity = EffectComplexity::Reactive;

    fn render(
        &mut self,
        state: &EffectState,
        _now: Instant,
        ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        let fraction = ctx
            .telemetry
            .heater(state.params.temp_source)
            .and_then(|reading| {
                Self::fill_fraction(reading.current, reading.target, ctx.temp_floor)
            });

        match fraction {
            Some(fraction) => render_fill(state, fraction, leds),
            None => fill(leds, Some(state.params.start_color)),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressEffect;

impl Effect for ProgressEffect {
    const COMPLEXITY: EffectComplexity = EffectComplexity::Reactive;

    fn render(
        &mut self,
        state: &EffectState,
        _now: Instant,
        ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        render_fill(state, ctx.telemetry.progress, leds);
        Ok(true)
    }
}
