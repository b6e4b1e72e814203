//! HSL saturation boost.
//!
//! Each pixel is converted to hue/saturation/lightness, its saturation is
//! multiplied by a fixed gain and clamped to `[0, 1]`, and the result is
//! converted back to 8-bit RGB with rounding. Achromatic pixels carry no
//! hue and are left as they are.

use crate::RasterImage;

/// Saturation multiplier applied by the pipeline.
pub const SATURATION_GAIN: f32 = 1.2;

/// Convert 8-bit RGB to HSL, all components in `[0, 1]`.
#[must_use]
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let l = (max + min) / 2.0;

    if delta <= f32::EPSILON {
        return (0.0, 0.0, l);
    }

    let s = if l < 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };

    #[allow(clippy::float_cmp)]
    let h = if max == r {
        (g - b) / delta
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    ((h / 6.0).rem_euclid(1.0), s, l)
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn to_u8(v: f32) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    }
}

/// Convert HSL (components in `[0, 1]`) back to 8-bit RGB.
#[must_use]
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    if s <= 0.0 {
        let v = to_u8(l);
        return (v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    (
        to_u8(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_u8(hue_to_channel(p, q, h)),
        to_u8(hue_to_channel(p, q, h - 1.0 / 3.0)),
    )
}

/// Scale the HSL saturation of one pixel by `gain`.
#[must_use]
pub fn saturate_pixel(r: u8, g: u8, b: u8, gain: f32) -> (u8, u8, u8) {
    if r == g && g == b {
        return (r, g, b);
    }
    let (h, s, l) = rgb_to_hsl(r, g, b);
    hsl_to_rgb(h, (s * gain).clamp(0.0, 1.0), l)
}

/// Scale the saturation of every pixel of `image` by `gain`.
///
/// Takes ownership of the buffer and returns it; alpha is untouched.
#[must_use]
pub fn saturate(mut image: RasterImage, gain: f32) -> RasterImage {
    for px in image.pixels_mut() {
        let (r, g, b) = saturate_pixel(px[0], px[1], px[2], gain);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
    image
}
