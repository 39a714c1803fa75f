//! Downsampling of oversized images before detection.

use image::imageops::FilterType;
use tracing::debug;

use crate::codec;
use crate::error::{MediaError, MediaResult};

/// Largest side handed to a detection provider.
pub const MAX_DETECTION_DIMENSION: u32 = 2048;

/// JPEG quality used when re-encoding a downsampled image.
pub const PREPROCESS_JPEG_QUALITY: u8 = 85;

/// Image prepared for detection.
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    /// Buffer to send to providers (original bytes when no resize was needed)
    pub buffer: Vec<u8>,
    /// Factor applied to the original dimensions (1.0 = unchanged)
    pub scale: f64,
    /// Original width
    pub width: u32,
    /// Original height
    pub height: u32,
    /// Whether `buffer` was re-encoded as JPEG
    pub reencoded: bool,
}

/// Downsample so that neither side exceeds [`MAX_DETECTION_DIMENSION`].
pub fn preprocess(buffer: &[u8]) -> MediaResult<PreprocessedImage> {
    let header = codec::read_header(buffer);
    if header.width == 0 || header.height == 0 {
        return Err(MediaError::invalid_image(
            "Could not determine image dimensions",
        ));
    }

    let max_dim = header.width.max(header.height);
    if max_dim <= MAX_DETECTION_DIMENSION {
        return Ok(PreprocessedImage {
            buffer: buffer.to_vec(),
            scale: 1.0,
            width: header.width,
            height: header.height,
            reencoded: false,
        });
    }

    let scale = MAX_DETECTION_DIMENSION as f64 / max_dim as f64;
    let new_width = ((header.width as f64 * scale).round() as u32).max(1);
    let new_height = ((header.height as f64 * scale).round() as u32).max(1);

    let decoded = codec::decode(buffer)?;
    let resized = decoded
        .image
        .resize(new_width, new_height, FilterType::Triangle);
    let reencoded = codec::encode_jpeg(&resized, PREPROCESS_JPEG_QUALITY, None, None)?;

    debug!(
        original_width = header.width,
        original_height = header.height,
        width = resized.width(),
        height = resized.height(),
        scale,
        "Downsampled image for detection"
    );

    Ok(PreprocessedImage {
        buffer: reencoded,
        scale,
        width: header.width,
        height: header.height,
        reencoded: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::test_images;

    #[test]
    fn test_small_image_unchanged() {
        let bytes = test_images::png(300, 200);
        let pre = preprocess(&bytes).unwrap();
        assert_eq!(pre.scale, 1.0);
        assert_eq!(pre.buffer, bytes);
        assert_eq!((pre.width, pre.height), (300, 200));
        assert!(!pre.reencoded);
    }

    #[test]
    fn test_large_image_downsampled() {
        let bytes = test_images::jpeg(4096, 1024);
        let pre = preprocess(&bytes).unwrap();
        assert!((pre.scale - 0.5).abs() < 1e-9);
        assert_eq!((pre.width, pre.height), (4096, 1024));
        assert!(pre.reencoded);

        let header = codec::read_header(&pre.buffer);
        assert_eq!((header.width, header.height), (2048, 512));
    }

    #[test]
    fn test_unreadable_dimensions() {
        assert!(matches!(
            preprocess(b"not an image"),
            Err(MediaError::InvalidImage(_))
        ));
    }
}
