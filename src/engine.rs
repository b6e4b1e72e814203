//! Core enhancement engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::blending;
use crate::codec::{self, EncodedImage, OutputFormat, DEFAULT_MAX_INPUT_BYTES};
use crate::color::{self, SATURATION_GAIN};
use crate::error::{Error, Result};
use crate::kernel::{self, SHARPEN};
use crate::metrics::{QualityEstimator, QualityMetrics, SimulatedEstimator};
use crate::task::{CancelToken, EnhanceTask};
use crate::RasterImage;

/// Smallest width or height the pipeline accepts.
pub const MIN_DIMENSION: u32 = 3;

/// Options controlling input validation and output encoding.
#[derive(Debug, Clone)]
pub struct EnhanceOptions {
    /// Encoding for the enhanced image.
    pub output_format: OutputFormat,
    /// Inputs larger than this many bytes are rejected.
    pub max_input_bytes: usize,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

/// Output of a full decode-enhance-encode run.
#[derive(Debug, Clone)]
pub struct EnhancementResult {
    /// The enhanced raster, before encoding.
    pub image: RasterImage,
    /// The enhanced raster, encoded per [`EnhanceOptions::output_format`].
    pub encoded: EncodedImage,
    /// Illustrative quality metrics.
    pub metrics: QualityMetrics,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Metrics of the enhancement, when it succeeded.
    pub metrics: Option<QualityMetrics>,
    /// Human-readable status message.
    pub message: String,
}

/// The enhancement engine.
///
/// Holds the options and the metrics estimator; the pixel pipeline itself
/// is stateless, so one engine can serve any number of threads.
pub struct EnhanceEngine {
    options: EnhanceOptions,
    estimator: Box<dyn QualityEstimator>,
}

impl Default for EnhanceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EnhanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhanceEngine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl EnhanceEngine {
    /// Create an engine with default options and simulated metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(EnhanceOptions::default())
    }

    /// Create an engine with the given options and simulated metrics.
    #[must_use]
    pub fn with_options(options: EnhanceOptions) -> Self {
        Self {
            options,
            estimator: Box::new(SimulatedEstimator::new()),
        }
    }

    /// Replace the metrics estimator.
    #[must_use]
    pub fn with_estimator(mut self, estimator: impl QualityEstimator + 'static) -> Self {
        self.estimator = Box::new(estimator);
        self
    }

    /// The options this engine was built with.
    #[must_use]
    pub fn options(&self) -> &EnhanceOptions {
        &self.options
    }

    /// Run the pixel pipeline: contrast pre-pass, sharpen, saturation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] if either side is shorter than
    /// [`MIN_DIMENSION`].
    pub fn enhance(&self, image: &RasterImage) -> Result<RasterImage> {
        self.enhance_with_cancel(image, &|| false)
    }

    /// Like [`Self::enhance`], polling `should_stop` between steps and once
    /// per convolution row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dimension`] for undersized images and
    /// [`Error::Cancelled`] once `should_stop` reports `true`.
    #[allow(clippy::unused_self)] // method on `self` for API consistency
    pub fn enhance_with_cancel(
        &self,
        image: &RasterImage,
        should_stop: &(dyn Fn() -> bool + Sync),
    ) -> Result<RasterImage> {
        let (width, height) = image.dimensions();
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(Error::Dimension { width, height });
        }

        let check = || {
            if should_stop() {
                log::warn!("Enhancement of {width}x{height} image cancelled");
                Err(Error::Cancelled)
            } else {
                Ok(())
            }
        };

        check()?;
        let started = Instant::now();
        let lifted = blending::lift_contrast(image);
        log::debug!("Contrast pre-pass done in {:?}", started.elapsed());

        check()?;
        let started = Instant::now();
        let Some(sharpened) = kernel::convolve_until(&lifted, &SHARPEN, should_stop) else {
            log::warn!("Enhancement of {width}x{height} image cancelled during sharpen pass");
            return Err(Error::Cancelled);
        };
        log::debug!("Sharpen pass done in {:?}", started.elapsed());

        check()?;
        let started = Instant::now();
        let saturated = color::saturate(sharpened, SATURATION_GAIN);
        log::debug!("Saturation pass done in {:?}", started.elapsed());

        Ok(saturated)
    }

    /// Validate, decode, enhance and encode an uploaded image.
    ///
    /// # Errors
    ///
    /// See [`codec::decode`], [`Self::enhance`] and [`codec::encode`].
    pub fn enhance_bytes(&self, bytes: &[u8]) -> Result<EnhancementResult> {
        self.enhance_bytes_with_cancel(bytes, &|| false)
    }

    /// Like [`Self::enhance_bytes`], polling `should_stop` throughout.
    ///
    /// # Errors
    ///
    /// As [`Self::enhance_bytes`], plus [`Error::Cancelled`].
    pub fn enhance_bytes_with_cancel(
        &self,
        bytes: &[u8],
        should_stop: &(dyn Fn() -> bool + Sync),
    ) -> Result<EnhancementResult> {
        let original = codec::decode(bytes, self.options.max_input_bytes)?;
        log::debug!(
            "Decoded {} bytes into {}x{} raster",
            bytes.len(),
            original.width(),
            original.height()
        );

        let image = self.enhance_with_cancel(&original, should_stop)?;
        if should_stop() {
            return Err(Error::Cancelled);
        }

        let encoded = codec::encode(&image, self.options.output_format)?;
        let metrics = self.estimator.estimate(&original, &image);

        Ok(EnhancementResult {
            image,
            encoded,
            metrics,
        })
    }

    /// Start enhancing `bytes` on a background thread.
    ///
    /// The returned task can be cancelled through its [`CancelToken`].
    #[must_use]
    pub fn spawn(self: &Arc<Self>, bytes: Vec<u8>) -> EnhanceTask {
        let engine = Arc::clone(self);
        let token = CancelToken::new();
        let worker_token = token.clone();
        EnhanceTask::spawn(token, move || {
            engine.enhance_bytes_with_cancel(&bytes, &|| worker_token.is_cancelled())
        })
    }

    /// Process a single image file: read, enhance, write.
    ///
    /// Returns a [`ProcessResult`] indicating success or failure.
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path) -> ProcessResult {
        let mut result = ProcessResult {
            path: input.to_path_buf(),
            success: false,
            metrics: None,
            message: String::new(),
        };

        let bytes = match std::fs::read(input) {
            Ok(b) => b,
            Err(e) => {
                result.message = format!("Failed to read: {e}");
                return result;
            }
        };

        let enhanced = match self.enhance_bytes(&bytes) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Failed to enhance {}: {e}", input.display());
                result.message = format!("Failed to enhance: {e}");
                return result;
            }
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match std::fs::write(output, &enhanced.encoded.bytes) {
            Ok(()) => {
                log::info!("Enhanced {} -> {}", input.display(), output.display());
                result.success = true;
                result.metrics = Some(enhanced.metrics);
                result.message = "Image enhanced".to_string();
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Files are processed in parallel when the `parallel` feature is
    /// enabled. Outputs keep the full input file name with the output
    /// format's extension appended, so `photo.png` and `photo.jpg` never
    /// share an output. An output that would land on one of the inputs is
    /// reported as a failure. Returns a [`ProcessResult`] for each image found.
    #[must_use]
    pub fn process_directory(&self, input_dir: &Path, output_dir: &Path) -> Vec<ProcessResult> {
        let mut entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![ProcessResult {
                    path: input_dir.to_path_buf(),
                    success: false,
                    metrics: None,
                    message: format!("Failed to read directory: {e}"),
                }];
            }
        };
        entries.sort();
        log::info!(
            "Found {} images in {}",
            entries.len(),
            input_dir.display()
        );

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult {
                    path: output_dir.to_path_buf(),
                    success: false,
                    metrics: None,
                    message: format!("Failed to create output directory: {e}"),
                }];
            }
        }

        let format = self.options.output_format;
        let run = |input_path: &PathBuf| {
            let output_path = batch_output_path(input_path, output_dir, format);
            if entries.contains(&output_path) {
                log::warn!(
                    "Refusing to overwrite input {} with output",
                    output_path.display()
                );
                return ProcessResult {
                    path: input_path.clone(),
                    success: false,
                    metrics: None,
                    message: format!("Output would overwrite input {}", output_path.display()),
                };
            }
            self.process_file(input_path, &output_path)
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            entries.par_iter().map(run).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            entries.iter().map(run).collect()
        }
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp"
        ),
        None => false,
    }
}

/// Output path for `input` inside a batch `output_dir`.
///
/// Example: `"photo.png"` with JPEG output becomes `"photo.png.jpg"`.
#[must_use]
pub fn batch_output_path(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    let name = input.file_name().unwrap_or_default().to_string_lossy();
    output_dir.join(format!("{name}.{}", format.extension()))
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.png"` with JPEG output becomes `"enhanced-photo.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("enhanced-{stem}.{}", format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn noisy(width: u32, height: u32) -> RasterImage {
        RasterImage::from_fn(width, height, |x, y| {
            let v = u8::try_from((x * 53 + y * 29) % 256).unwrap_or(0);
            Rgba([v, v.wrapping_mul(3), 255 - v, 255])
        })
    }

    #[test]
    fn enhance_preserves_dimensions() {
        let engine = EnhanceEngine::new();
        for (w, h) in [(3, 3), (4, 7), (17, 5)] {
            let out = engine.enhance(&noisy(w, h)).unwrap();
            assert_eq!(out.dimensions(), (w, h));
        }
    }

    #[test]
    fn enhance_rejects_two_pixel_sides() {
        let engine = EnhanceEngine::new();
        for (w, h) in [(2, 10), (10, 2), (1, 1)] {
            let err = engine.enhance(&noisy(w, h)).unwrap_err();
            assert!(
                matches!(err, Error::Dimension { width, height } if width == w && height == h)
            );
        }
    }

    #[test]
    fn gray_scenario_matches_contrast_value_everywhere() {
        let engine = EnhanceEngine::new();
        let img = RasterImage::from_pixel(4, 4, Rgba([128, 128, 128, 255]));
        let out = engine.enhance(&img).unwrap();
        for px in out.pixels() {
            assert_eq!(px, &Rgba([141, 141, 141, 255]));
        }
    }

    #[test]
    fn enhance_leaves_input_untouched() {
        let engine = EnhanceEngine::new();
        let img = noisy(6, 6);
        let copy = img.clone();
        engine.enhance(&img).unwrap();
        assert_eq!(img, copy);
    }

    #[test]
    fn cancelled_enhance_returns_cancelled() {
        let engine = EnhanceEngine::new();
        let err = engine.enhance_with_cancel(&noisy(8, 8), &|| true).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn default_output_path_prefixes_enhanced() {
        let p = default_output_path(Path::new("/tmp/photo.png"), OutputFormat::default());
        assert_eq!(p, PathBuf::from("/tmp/enhanced-photo.jpg"));

        let p = default_output_path(Path::new("image.webp"), OutputFormat::Png);
        assert_eq!(
            p.file_name().unwrap().to_str().unwrap(),
            "enhanced-image.png"
        );
    }

    #[test]
    fn batch_output_path_keeps_full_file_name() {
        let out = Path::new("/out");
        let png = batch_output_path(Path::new("/in/photo.png"), out, OutputFormat::default());
        let jpg = batch_output_path(Path::new("/in/photo.jpg"), out, OutputFormat::default());
        assert_eq!(png, PathBuf::from("/out/photo.png.jpg"));
        assert_eq!(jpg, PathBuf::from("/out/photo.jpg.jpg"));
        assert_ne!(png, jpg);
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.webp")));
    }

    #[test]
    fn is_supported_image_rejects_unsupported_formats() {
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo.bmp")));
        assert!(!is_supported_image(Path::new("photo")));
    }
}
