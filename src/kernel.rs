//! 3x3 convolution over RGBA rasters.
//!
//! Only interior pixels are convolved. Border rows and columns are copied
//! from the source unchanged, and the alpha channel is always passed
//! through. Every neighbour lookup reads the untouched source snapshot, so
//! the result does not depend on traversal order.

use crate::RasterImage;

/// A fixed 3x3 integer kernel, stored row-major.
///
/// Weights are applied without normalisation: kernels intended to preserve
/// overall brightness should sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolutionKernel {
    weights: [i32; 9],
}

/// Laplacian sharpen: `{0,-1,0, -1,5,-1, 0,-1,0}`.
pub const SHARPEN: ConvolutionKernel = ConvolutionKernel::new([0, -1, 0, -1, 5, -1, 0, -1, 0]);

impl ConvolutionKernel {
    /// Create a kernel from row-major weights.
    #[must_use]
    pub const fn new(weights: [i32; 9]) -> Self {
        Self { weights }
    }

    /// Row-major weights.
    #[must_use]
    pub const fn weights(&self) -> &[i32; 9] {
        &self.weights
    }

    /// Sum of all weights.
    #[must_use]
    pub fn sum(&self) -> i32 {
        self.weights.iter().sum()
    }
}

/// Compute one output row. `row` is the destination slice for row `y`.
fn convolve_row(src: &[u8], stride: usize, y: usize, row: &mut [u8], kernel: &ConvolutionKernel) {
    let width = stride / 4;
    for x in 1..width - 1 {
        for ch in 0..3 {
            let mut acc = 0i32;
            for ky in 0..3 {
                let base = (y + ky - 1) * stride;
                for kx in 0..3 {
                    let idx = base + (x + kx - 1) * 4 + ch;
                    acc += i32::from(src[idx]) * kernel.weights[ky * 3 + kx];
                }
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                row[x * 4 + ch] = acc.clamp(0, 255) as u8;
            }
        }
    }
}

/// Fill every interior row of a copy of `image`, skipping rows once
/// `should_stop` reports `true`.
fn convolve_rows(
    image: &RasterImage,
    kernel: &ConvolutionKernel,
    should_stop: &(dyn Fn() -> bool + Sync),
) -> RasterImage {
    let mut out = image.clone();
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return out;
    }

    let stride = width as usize * 4;
    let last = height as usize - 1;
    let src = image.as_raw().as_slice();

    let run_row = |(y, row): (usize, &mut [u8])| {
        if y == 0 || y == last || should_stop() {
            return;
        }
        convolve_row(src, stride, y, row, kernel);
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        out.par_chunks_mut(stride).enumerate().for_each(run_row);
    }

    #[cfg(not(feature = "parallel"))]
    {
        out.chunks_mut(stride).enumerate().for_each(run_row);
    }

    out
}

/// Convolve `image` with `kernel`, polling `should_stop` once per row.
///
/// Returns `None` if `should_stop` reported `true` at any point, in which
/// case the partially computed buffer is dropped. `should_stop` must be
/// monotonic: once it returns `true` it keeps returning `true`.
///
/// Images narrower or shorter than 3 pixels have no interior and are
/// returned as an unchanged copy.
pub fn convolve_until(
    image: &RasterImage,
    kernel: &ConvolutionKernel,
    should_stop: &(dyn Fn() -> bool + Sync),
) -> Option<RasterImage> {
    let out = convolve_rows(image, kernel, should_stop);
    if should_stop() {
        return None;
    }
    Some(out)
}

/// Convolve `image` with `kernel`, returning a new image.
#[must_use]
pub fn convolve(image: &RasterImage, kernel: &ConvolutionKernel) -> RasterImage {
    convolve_rows(image, kernel, &|| false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn gradient(width: u32, height: u32) -> RasterImage {
        RasterImage::from_fn(width, height, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let v = ((x * 37 + y * 91) % 256) as u8;
            Rgba([v, 255 - v, v / 2, 200])
        })
    }

    #[test]
    fn sharpen_kernel_sums_to_one() {
        assert_eq!(SHARPEN.sum(), 1);
        assert_eq!(SHARPEN.weights()[4], 5);
    }

    #[test]
    fn uniform_image_is_unchanged() {
        let img = RasterImage::from_pixel(6, 5, Rgba([141, 141, 141, 255]));
        assert_eq!(convolve(&img, &SHARPEN), img);
    }

    #[test]
    fn borders_and_alpha_are_copied() {
        let img = gradient(9, 7);
        let out = convolve(&img, &SHARPEN);
        let (w, h) = img.dimensions();
        for (x, y, px) in out.enumerate_pixels() {
            assert_eq!(px[3], img.get_pixel(x, y)[3]);
            if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                assert_eq!(px, img.get_pixel(x, y), "border pixel ({x},{y}) changed");
            }
        }
    }

    #[test]
    fn single_bright_pixel_is_amplified_and_neighbours_clamped() {
        let mut img = RasterImage::from_pixel(5, 5, Rgba([100, 100, 100, 255]));
        img.put_pixel(2, 2, Rgba([200, 200, 200, 255]));
        let out = convolve(&img, &SHARPEN);

        // 5*200 - 4*100 = 600 -> 255
        assert_eq!(out.get_pixel(2, 2)[0], 255);
        // 5*100 - 200 - 3*100 = 0
        assert_eq!(out.get_pixel(2, 1)[0], 0);
        assert_eq!(out.get_pixel(1, 2)[0], 0);
        // Diagonal neighbour sees only uniform values.
        assert_eq!(out.get_pixel(1, 1)[0], 100);
    }

    #[test]
    fn reads_from_snapshot_not_partial_output() {
        // Two adjacent bright pixels: an in-place pass would see the first
        // pixel's updated value when computing the second.
        let mut img = RasterImage::from_pixel(6, 3, Rgba([50, 50, 50, 255]));
        img.put_pixel(2, 1, Rgba([60, 60, 60, 255]));
        img.put_pixel(3, 1, Rgba([60, 60, 60, 255]));
        let out = convolve(&img, &SHARPEN);

        // 5*60 - 60 - 50 - 50 - 50 = 90
        assert_eq!(out.get_pixel(2, 1)[0], 90);
        assert_eq!(out.get_pixel(3, 1)[0], 90);
    }

    #[test]
    fn too_small_image_is_copied() {
        let img = gradient(2, 8);
        assert_eq!(convolve(&img, &SHARPEN), img);
    }

    #[test]
    fn stop_request_discards_output() {
        let img = gradient(16, 16);
        let stop = AtomicBool::new(true);
        assert!(convolve_until(&img, &SHARPEN, &|| stop.load(Ordering::SeqCst)).is_none());

        stop.store(false, Ordering::SeqCst);
        assert!(convolve_until(&img, &SHARPEN, &|| stop.load(Ordering::SeqCst)).is_some());
    }

    #[test]
    fn rows_after_stop_are_not_convolved() {
        // Vertical stripes: sharpening changes every interior row.
        let img = RasterImage::from_fn(8, 40, |x, _| {
            let v = if x % 2 == 0 { 50 } else { 150 };
            Rgba([v, v, v, 255])
        });
        let polls = AtomicUsize::new(0);
        let stop_after_three = || polls.fetch_add(1, Ordering::SeqCst) >= 3;

        let out = convolve_rows(&img, &SHARPEN, &stop_after_three);
        let stride = img.width() as usize * 4;
        let convolved = out
            .as_raw()
            .chunks(stride)
            .zip(img.as_raw().chunks(stride))
            .filter(|(a, b)| a != b)
            .count();
        assert!(convolved <= 3, "{convolved} rows convolved after stop");
        assert_eq!(polls.load(Ordering::SeqCst), 38);

        polls.store(0, Ordering::SeqCst);
        assert!(convolve_until(&img, &SHARPEN, &stop_after_three).is_none());
    }
}
