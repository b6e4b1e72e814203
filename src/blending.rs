//! Alpha blending math for the contrast pre-pass.
//!
//! A uniform colour overlay is composited over every pixel with the
//! source-over rule:
//! `blended = alpha * overlay + (1 - alpha) * original`
//!
//! The pipeline overlays white at 10% opacity, which lifts shadows and
//! compresses the tonal range toward the highlights.

use crate::RasterImage;

/// Overlay opacity used by the contrast pre-pass.
pub const CONTRAST_ALPHA: f32 = 0.1;

/// Overlay colour used by the contrast pre-pass.
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Blend a single channel value toward `overlay` by `alpha`.
///
/// The result is rounded to the nearest integer and clamped to `[0, 255]`.
#[must_use]
pub fn blend_channel(value: u8, overlay: u8, alpha: f32) -> u8 {
    let alpha = alpha.clamp(0.0, 1.0);
    let blended = f32::from(value) * (1.0 - alpha) + f32::from(overlay) * alpha;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        blended.round().clamp(0.0, 255.0) as u8
    }
}

/// Composite a uniform `overlay` colour over every pixel of `image`.
///
/// Returns a new image; the source is left untouched. Only the RGB channels
/// are blended, alpha is copied as-is.
#[must_use]
pub fn blend_over(image: &RasterImage, overlay: [u8; 3], alpha: f32) -> RasterImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        for (ch, &over) in overlay.iter().enumerate() {
            px[ch] = blend_channel(px[ch], over, alpha);
        }
    }
    out
}

/// The contrast pre-pass: white overlay at [`CONTRAST_ALPHA`].
#[must_use]
pub fn lift_contrast(image: &RasterImage) -> RasterImage {
    blend_over(image, WHITE, CONTRAST_ALPHA)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn white_is_a_fixed_point() {
        assert_eq!(blend_channel(255, 255, CONTRAST_ALPHA), 255);

        let img = RasterImage::from_pixel(5, 4, Rgba([255, 255, 255, 255]));
        let out = lift_contrast(&img);
        assert_eq!(out, img);
    }

    #[test]
    fn mid_gray_rounds_to_nearest() {
        // 128 * 0.9 + 255 * 0.1 = 140.7
        assert_eq!(blend_channel(128, 255, CONTRAST_ALPHA), 141);
        // 0 * 0.9 + 255 * 0.1 = 25.5
        assert_eq!(blend_channel(0, 255, CONTRAST_ALPHA), 26);
    }

    #[test]
    fn alpha_channel_is_untouched() {
        let img = RasterImage::from_pixel(3, 3, Rgba([10, 20, 30, 77]));
        let out = lift_contrast(&img);
        for px in out.pixels() {
            assert_eq!(px[3], 77);
        }
    }

    #[test]
    fn blend_returns_new_buffer_and_keeps_source() {
        let img = RasterImage::from_pixel(3, 3, Rgba([0, 0, 0, 255]));
        let out = blend_over(&img, [255, 0, 0], 0.5);
        assert_eq!(img.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(1, 1), &Rgba([128, 0, 0, 255]));
    }

    #[test]
    fn out_of_range_alpha_is_clamped() {
        assert_eq!(blend_channel(10, 200, 2.0), 200);
        assert_eq!(blend_channel(10, 200, -1.0), 10);
    }
}
