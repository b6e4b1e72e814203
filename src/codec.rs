//! Upload validation, decoding and encoding.

use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, Rgb, RgbImage};

use crate::blending::blend_channel;
use crate::error::{Error, Result};
use crate::RasterImage;

/// Default upload size limit: 5 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Default JPEG quality for enhanced output.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Input formats accepted for enhancement.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

/// Encoding used for enhanced output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Lossy JPEG at the given quality (1-100). Translucent pixels are
    /// flattened onto opaque black first, as a canvas JPEG export does.
    Jpeg {
        /// Encoder quality, 1-100.
        quality: u8,
    },
    /// Lossless PNG, alpha preserved.
    Png,
    /// Lossless WebP, alpha preserved.
    WebP,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl OutputFormat {
    /// File extension without the leading dot.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    /// MIME type of the encoded bytes.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }
}

/// An encoded image ready for display or download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Format the bytes are encoded in.
    pub format: OutputFormat,
}

impl EncodedImage {
    /// MIME type of [`Self::bytes`].
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Render as a `data:` URL suitable for an `<img src>` attribute.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Identify the format of `bytes` and check it against [`ALLOWED_FORMATS`].
///
/// # Errors
///
/// Returns [`Error::Decode`] if the bytes match no known image signature and
/// [`Error::UnsupportedFormat`] if they match one outside the allow-list.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat> {
    let format = image::guess_format(bytes).map_err(Error::Decode)?;
    if !ALLOWED_FORMATS.contains(&format) {
        return Err(Error::UnsupportedFormat(format!("{format:?}")));
    }
    Ok(format)
}

/// Validate and decode an uploaded image into an RGBA raster.
///
/// # Errors
///
/// Returns [`Error::InputTooLarge`] when `bytes` exceeds `max_input_bytes`,
/// [`Error::UnsupportedFormat`] for formats outside the allow-list and
/// [`Error::Decode`] for anything the decoder rejects.
pub fn decode(bytes: &[u8], max_input_bytes: usize) -> Result<RasterImage> {
    if bytes.len() > max_input_bytes {
        return Err(Error::InputTooLarge {
            size: bytes.len(),
            limit: max_input_bytes,
        });
    }
    let format = detect_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format).map_err(Error::Decode)?;
    Ok(img.to_rgba8())
}

/// Composite `image` over opaque black, dropping the alpha channel.
fn flatten_onto_black(image: &RasterImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y);
        let coverage = 1.0 - f32::from(px[3]) / 255.0;
        Rgb([
            blend_channel(px[0], 0, coverage),
            blend_channel(px[1], 0, coverage),
            blend_channel(px[2], 0, coverage),
        ])
    })
}

/// Encode a raster in the requested output format.
///
/// # Errors
///
/// Returns [`Error::Encode`] if the encoder fails.
pub fn encode(image: &RasterImage, format: OutputFormat) -> Result<EncodedImage> {
    let (width, height) = image.dimensions();
    let mut bytes = Vec::with_capacity((width * height) as usize);

    match format {
        OutputFormat::Jpeg { quality } => {
            let rgb = flatten_onto_black(image);
            let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
            encoder.encode_image(&rgb).map_err(Error::Encode)?;
        }
        OutputFormat::Png => {
            PngEncoder::new(&mut bytes)
                .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(Error::Encode)?;
        }
        OutputFormat::WebP => {
            WebPEncoder::new_lossless(&mut bytes)
                .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(Error::Encode)?;
        }
    }

    Ok(EncodedImage { bytes, format })
}
