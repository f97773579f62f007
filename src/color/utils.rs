pub use smart_leds::hsv::hsv2rgb;

use crate::{
    color::{Hsv, Rgb},
    math8::{blend8, unit8},
};

/// Blend two RGB colors
///
/// # Arguments
/// * `a` - First color
/// * `b` - Second color
/// * `amount_of_b` - Blend factor (0 = all a, 255 = all b)
#[inline]
pub fn blend_colors(a: Rgb, b: Rgb, amount_of_b: u8) -> Rgb {
    Rgb {
        r: blend8(a.r, b.r, amount_of_b),
        g: blend8(a.g, b.g, amount_of_b),
        b: blend8(a.b, b.b, amount_of_b),
    }
}

/// Scale every channel by a unit float (0.0-1.0)
#[inline]
pub fn dim(color: Rgb, factor: f32) -> Rgb {
    let channel = |v: u8| unit8(f32::from(v) / 255.0 * factor);
    Rgb {
        r: channel(color.r),
        g: channel(color.g),
        b: channel(color.b),
    }
}

/// Convert a hue on the unit circle (0.0-1.0) to RGB
pub fn hue_to_rgb(hue: f32, sat: f32, val: f32) -> Rgb {
    let hue = hue - libm::floorf(hue);
    hsv2rgb(Hsv {
        hue: unit8(hue),
        sat: unit8(sat),
        val: unit8(val),
    })
}

/// Create an RGB color from a u32 value (0xRRGGBB format)
pub const fn rgb_from_u32(color: u32) -> Rgb {
    Rgb {
        r: ((color >> 16) & 0xFF) as u8,
        g: ((color >> 8) & 0xFF) as u8,
        b: (color & 0xFF) as u8,
    }
}
