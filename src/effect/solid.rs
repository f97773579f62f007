//! Solid color fill effect

use embassy_time::Instant;

use super::{Effect, EffectComplexity, EffectError, EffectState, RenderContext, fill};
use crate::color::Rgb;

/// Solid color effect - fills all LEDs with the base color
///
/// Only the first frame is reported as changed.
#[derive(Debug, Clone, Default)]
pub struct SolidEffect {
    rendered: bool,
}

impl Effect for SolidEffect {
    const COMPLEXITY: EffectComplexity = EffectComplexity::Static;

    fn render(
        &mut self,
        state: &EffectState,
        _now: Instant,
        _ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        fill(leds, Some(state.color));
        let changed = !self.rendered;
        self.rendered = true;
        Ok(changed)
    }

    fn reset(&mut self) {
        self.rendered = false;
    }
}
