use crate::{
    color::{Rgb, blend_colors, dim},
    math8::unit8,
};

/// Linear interpolation between two colors, `t` clamped to 0.0-1.0
#[inline]
pub fn lerp_colors(start: Rgb, end: Rgb, t: f32) -> Rgb {
    blend_colors(start, end, unit8(t))
}

/// Fill a progress bar with a two-color gradient.
///
/// `fill` is clamped to 0.0-1.0 and covers `fill * len` pixels. Each lit pixel
/// takes its color from the gradient position `(i / (len - 1)) ^ curve`, and the
/// leading pixel is dimmed by its fractional coverage. Pixels past the fill
/// are left unlit.
pub fn fill_bar(leds: &mut [Option<Rgb>], fill: f32, start: Rgb, end: Rgb, curve: f32) {
    let len = leds.len();
    if len == 0 {
        return;
    }

    let fill = if fill.is_finite() { fill.clamp(0.0, 1.0) } else { 0.0 };
    let lit = fill * len as f32;
    let curve = if curve.is_finite() && curve > 0.0 { curve } else { 1.0 };

    for (i, led) in leds.iter_mut().enumerate() {
        let position = i as f32;
        if position >= lit {
            *led = None;
            continue;
        }

        let t = if len <= 1 {
            1.0
        } else {
            position / (len - 1) as f32
        };
        let color = lerp_colors(start, end, libm::powf(t, curve));

        let coverage = lit - position;
        *led = Some(if coverage < 1.0 { dim(color, coverage) } else { color });
    }
}
