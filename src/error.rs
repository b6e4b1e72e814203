//! Error types for the pixel-enhance crate.

/// Errors that can occur while validating, enhancing or encoding an image.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The image is too small for the 3x3 convolution window.
    #[error("image too small ({width}x{height}); both sides must be at least 3 pixels")]
    Dimension {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// The input exceeds the configured upload size limit.
    #[error("input is {size} bytes, limit is {limit} bytes")]
    InputTooLarge {
        /// Size of the rejected input in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// The image format is not on the allow-list.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The encoder rejected the enhanced image.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// The caller cancelled the work before it completed.
    #[error("enhancement cancelled")]
    Cancelled,

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("Gif".to_string());
        assert!(unsupported.to_string().contains("Gif"));

        let too_small = Error::Dimension {
            width: 2,
            height: 40,
        };
        assert!(too_small.to_string().contains("2x40"));

        let too_large = Error::InputTooLarge {
            size: 6_000_000,
            limit: 5_242_880,
        };
        let msg = too_large.to_string();
        assert!(msg.contains("6000000"));
        assert!(msg.contains("5242880"));

        assert_eq!(Error::Cancelled.to_string(), "enhancement cancelled");
    }
}
