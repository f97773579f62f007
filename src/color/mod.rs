mod gradient;
mod named;
mod utils;

pub use gradient::{fill_bar, lerp_colors};
pub use named::{NAMED_COLORS, parse_color};
use smart_leds::{RGB8, hsv::Hsv as HSV};
pub use utils::{blend_colors, dim, hsv2rgb, hue_to_rgb, rgb_from_u32};

pub type Rgb = RGB8;
pub type Hsv = HSV;

pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
pub const WHITE: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 255,
};
