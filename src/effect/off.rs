use embassy_time::Instant;

use super::{Effect, EffectComplexity, EffectError, EffectState, RenderContext, fill};
use crate::color::{BLACK, Rgb};

/// Explicit all-dark frame
///
/// Every pixel is set to black rather than left unlit so the clear is
/// authoritative downstream.
#[derive(Debug, Clone, Default)]
pub struct OffEffect {
    rendered: bool,
}

impl Effect for OffEffect {
    const COMPLEXITY: EffectComplexity = EffectComplexity::Off;

    fn render(
        &mut self,
        _state: &EffectState,
        _now: Instant,
        _ctx: &RenderContext<'_>,
        leds: &mut [Option<Rgb>],
    ) -> Result<bool, EffectError> {
        fill(leds, Some(BLACK));
        let changed = !self.rendered;
        self.rendered = true;
        Ok(changed)
    }

    fn reset(&mut self) {
        self.rendered = false;
    }
}
