//! Named colors and color space helpers.
//!
//! HSV is more intuitive than RGB for picking indicator colors; the helpers
//! here convert to the 8-bit [`Color`] the engine interpolates in.

use crate::types::Color;
use palette::{FromColor, Hsv, Srgb};

pub const BLACK: Color = Color::new(0, 0, 0);
pub const WHITE: Color = Color::new(255, 255, 255);
pub const RED: Color = Color::new(255, 0, 0);
pub const GREEN: Color = Color::new(0, 255, 0);
pub const BLUE: Color = Color::new(0, 0, 255);

/// Creates an 8-bit RGB color from HSV (Hue, Saturation, Value) components.
///
/// Hue is in degrees, saturation and value in the 0.0-1.0 range.
#[inline]
pub fn hsv(hue: f32, saturation: f32, value: f32) -> Color {
    let hsv = Hsv::new(hue, saturation, value);
    let rgb: Srgb<f32> = Srgb::from_color(hsv);
    rgb.into_format()
}

/// Creates a color from hue only (full saturation and value).
#[inline]
pub fn hue(hue: f32) -> Color {
    hsv(hue, 1.0, 1.0)
}
