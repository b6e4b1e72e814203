//! Deterministic image enhancement: contrast lift, sharpen, saturation.
//!
//! The pipeline runs three fixed steps over an RGBA raster, each producing a
//! new buffer from the previous one:
//!
//! 1. a 10% white overlay (source-over) that lifts shadows,
//! 2. a 3x3 Laplacian sharpen over interior pixels, borders copied as-is,
//! 3. an HSL saturation gain of 1.2.
//!
//! The result is re-encoded (JPEG at quality 95 by default) and returned
//! with a set of quality metrics. The metrics are placeholders drawn from
//! fixed ranges, not measurements; see [`metrics`].
//!
//! # Quick Start
//!
//! ```no_run
//! use pixel_enhance::EnhanceEngine;
//!
//! let engine = EnhanceEngine::new();
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let result = engine.enhance_bytes(&bytes).unwrap();
//! std::fs::write("enhanced-photo.jpg", &result.encoded.bytes).unwrap();
//! println!("sharpness: {}%", result.metrics.sharpness);
//! ```
//!
//! # Cancellation
//!
//! Long-running work can be moved to a background thread and abandoned:
//!
//! ```no_run
//! use std::sync::Arc;
//! use pixel_enhance::EnhanceEngine;
//!
//! let engine = Arc::new(EnhanceEngine::new());
//! let task = engine.spawn(std::fs::read("large.png").unwrap());
//! // A newer upload arrived, drop this one.
//! task.cancel();
//! assert!(task.join().is_err());
//! ```

#![deny(missing_docs)]

pub mod blending;
pub mod codec;
pub mod color;
mod engine;
pub mod error;
pub mod kernel;
pub mod metrics;
mod task;

pub use codec::{EncodedImage, OutputFormat};
pub use engine::{
    batch_output_path, default_output_path, is_supported_image, EnhanceEngine, EnhanceOptions,
    EnhancementResult, ProcessResult, MIN_DIMENSION,
};
pub use error::{Error, Result};
pub use kernel::ConvolutionKernel;
pub use metrics::{QualityEstimator, QualityMetrics, SimulatedEstimator};
pub use task::{CancelToken, EnhanceTask};

/// An 8-bit RGBA raster: `width * height * 4` interleaved samples.
pub type RasterImage = image::RgbaImage;
