//! Intrinsic image dimension probing.
//!
//! ## Usage
//!
//! Implement [`ImageProbe`] to plug in the host's image loading facility,
//! or use [`DecodeProber`] to read dimensions from local sources.

use std::{io::Cursor, sync::Arc};

use image::ImageReader;
use thiserror::Error;

/// Specifies where image data comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    /// Load image data from a file path.
    Path(String),
    /// Load image data from a byte slice, shared via `Arc`.
    Bytes(Arc<[u8]>),
    /// A remote locator. The built-in prober does not fetch over the
    /// network; hosts that need this supply their own [`ImageProbe`].
    Remote(String),
}

/// Intrinsic pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    /// Intrinsic width in pixels.
    pub width: u32,
    /// Intrinsic height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// Height the image would have when scaled to `width` layout units,
    /// preserving aspect ratio. `None` when the intrinsic width is zero.
    pub fn height_at_width(&self, width: f32) -> Option<f32> {
        if self.width == 0 {
            return None;
        }
        Some(self.height as f32 * (width / self.width as f32))
    }
}

/// Errors that can occur while probing image dimensions.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Failed to read the source from disk.
    #[error("failed to read image from {path}: {source}")]
    Io {
        /// Failing path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The image header could not be decoded.
    #[error("failed to decode image metadata: {0}")]
    Decode(#[from] image::ImageError),
    /// The prober cannot handle this kind of source.
    #[error("unsupported image source: {0}")]
    Unsupported(String),
}

/// Yields intrinsic dimensions for an [`ImageSource`].
///
/// This is the seam between the layout engine and whatever image loading
/// facility the host provides. Probes may run concurrently from worker
/// threads, so implementations must be `Send + Sync`.
pub trait ImageProbe: Send + Sync {
    /// Probes the intrinsic width and height of `source`.
    fn probe(&self, source: &ImageSource) -> Result<ImageDimensions, ProbeError>;
}

/// Probes dimensions by decoding image headers with the `image` crate.
///
/// Only the header is read; pixel data is never decoded. Remote sources
/// are reported as [`ProbeError::Unsupported`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DecodeProber;

impl ImageProbe for DecodeProber {
    fn probe(&self, source: &ImageSource) -> Result<ImageDimensions, ProbeError> {
        let (width, height) = match source {
            ImageSource::Path(path) => ImageReader::open(path)
                .map_err(|source| ProbeError::Io {
                    path: path.clone(),
                    source,
                })?
                .into_dimensions()?,
            ImageSource::Bytes(bytes) => ImageReader::new(Cursor::new(&bytes[..]))
                .with_guessed_format()
                .map_err(|source| ProbeError::Io {
                    path: "<bytes>".to_string(),
                    source,
                })?
                .into_dimensions()?,
            ImageSource::Remote(url) => return Err(ProbeError::Unsupported(url.clone())),
        };
        Ok(ImageDimensions { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Arc<[u8]> {
        let mut buf = Vec::new();
        image::DynamicImage::new_rgba8(width, height)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        Arc::from(buf.into_boxed_slice())
    }

    #[test]
    fn test_probe_bytes_reads_dimensions() {
        let dims = DecodeProber
            .probe(&ImageSource::Bytes(png_bytes(4, 2)))
            .unwrap();
        assert_eq!(
            dims,
            ImageDimensions {
                width: 4,
                height: 2
            }
        );
    }

    #[test]
    fn test_probe_missing_file_is_io_error() {
        let err = DecodeProber
            .probe(&ImageSource::Path("/definitely/not/here.png".to_string()))
            .unwrap_err();
        assert!(matches!(err, ProbeError::Io { .. }));
    }

    #[test]
    fn test_probe_garbage_bytes_is_decode_error() {
        let bytes: Arc<[u8]> = Arc::from(vec![0u8; 16].into_boxed_slice());
        let err = DecodeProber
            .probe(&ImageSource::Bytes(bytes))
            .unwrap_err();
        assert!(matches!(err, ProbeError::Decode(_)));
    }

    #[test]
    fn test_probe_remote_is_unsupported() {
        let err = DecodeProber
            .probe(&ImageSource::Remote("https://cdn.example.com/a.jpg".into()))
            .unwrap_err();
        assert!(matches!(err, ProbeError::Unsupported(_)));
    }

    #[test]
    fn test_height_at_width_scales_aspect_ratio() {
        let dims = ImageDimensions {
            width: 400,
            height: 800,
        };
        assert_eq!(dims.height_at_width(180.0), Some(360.0));

        let degenerate = ImageDimensions {
            width: 0,
            height: 800,
        };
        assert_eq!(degenerate.height_at_width(180.0), None);
    }
}
