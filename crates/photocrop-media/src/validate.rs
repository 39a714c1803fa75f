//! Upload validation and header metadata.

use photocrop_models::{
    ImageFormat, ImageMetadata, ImageValidation, ValidationCode, MAX_FILE_SIZE,
    SUPPORTED_MIME_TYPES,
};

use crate::codec;
use crate::error::{MediaError, MediaResult};

/// Validate an upload against size and declared MIME type.
pub fn validate_image(buffer: &[u8], mime_type: &str) -> ImageValidation {
    if buffer.is_empty() {
        return ImageValidation::rejected(ValidationCode::EmptyFile, "Empty file provided");
    }

    if buffer.len() > MAX_FILE_SIZE {
        return ImageValidation::rejected(
            ValidationCode::FileTooLarge,
            format!(
                "File size ({:.2}MB) exceeds maximum allowed size (20MB)",
                buffer.len() as f64 / (1024.0 * 1024.0)
            ),
        );
    }

    let normalized = mime_type.to_ascii_lowercase();
    if !SUPPORTED_MIME_TYPES.contains(&normalized.as_str()) {
        return ImageValidation::rejected(
            ValidationCode::UnsupportedType,
            format!(
                "Unsupported file type: {}. Allowed types: JPEG, PNG, HEIC, WebP",
                mime_type
            ),
        );
    }

    let format = normalized.trim_start_matches("image/");
    ImageValidation::ok(format)
}

/// Sniff the image format from content.
pub fn detect_format(buffer: &[u8]) -> Option<ImageFormat> {
    codec::sniff_format(buffer)
}

/// Classify a buffer by its content rather than a declared MIME type.
pub fn validate_image_format(buffer: &[u8]) -> ImageValidation {
    if buffer.is_empty() {
        return ImageValidation::rejected(ValidationCode::EmptyFile, "Empty file provided");
    }

    match detect_format(buffer) {
        None => ImageValidation::rejected(
            ValidationCode::InvalidImage,
            "Could not determine image format",
        ),
        Some(format) if !format.is_supported() => ImageValidation::rejected(
            ValidationCode::UnsupportedType,
            format!(
                "Unsupported format: {}. Supported: jpeg, png, heic, webp",
                format
            ),
        ),
        Some(format) => ImageValidation::ok(format.as_str()),
    }
}

/// Like [`validate_image_format`], but as a `Result` for pipeline use.
pub(crate) fn ensure_supported_format(buffer: &[u8]) -> MediaResult<ImageFormat> {
    if buffer.is_empty() {
        return Err(MediaError::EmptyBuffer);
    }
    match detect_format(buffer) {
        None => Err(MediaError::invalid_image("Could not determine image format")),
        Some(format) if !format.is_supported() => Err(MediaError::UnsupportedFormat(format!(
            "{}. Supported: jpeg, png, heic, webp",
            format
        ))),
        Some(format) => Ok(format),
    }
}

/// Read header metadata; fields that cannot be read fall back to defaults.
pub fn get_image_metadata(buffer: &[u8]) -> ImageMetadata {
    let mut metadata = ImageMetadata::unknown(buffer.len());
    if buffer.is_empty() {
        return metadata;
    }

    let header = codec::read_header(buffer);
    metadata.width = header.width;
    metadata.height = header.height;
    if let Some(format) = header.format {
        metadata.format = format.as_str().to_string();
    }
    if let Some(color_type) = header.color_type {
        metadata.color_space = codec::color_space_name(color_type).to_string();
    }
    if let Some(density) = header.density {
        metadata.density = density;
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::test_images;

    #[test]
    fn test_empty_buffer() {
        let v = validate_image(&[], "image/jpeg");
        assert!(!v.valid);
        assert_eq!(v.code, Some(ValidationCode::EmptyFile));
    }

    #[test]
    fn test_size_boundary() {
        let exact = vec![0u8; MAX_FILE_SIZE];
        assert!(validate_image(&exact, "image/jpeg").valid);

        let over = vec![0u8; MAX_FILE_SIZE + 1];
        let v = validate_image(&over, "image/jpeg");
        assert_eq!(v.code, Some(ValidationCode::FileTooLarge));
        assert!(v.error.unwrap().contains("20.00MB"));
    }

    #[test]
    fn test_mime_type_case_insensitive() {
        let v = validate_image(b"x", "IMAGE/PNG");
        assert!(v.valid);
        assert_eq!(v.format.as_deref(), Some("png"));
        assert_eq!(validate_image(b"x", "image/heic").format.as_deref(), Some("heic"));

        let padded = validate_image(b"x", " image/png ");
        assert_eq!(padded.code, Some(ValidationCode::UnsupportedType));
    }

    #[test]
    fn test_unsupported_mime_type() {
        let v = validate_image(b"x", "image/gif");
        assert_eq!(v.code, Some(ValidationCode::UnsupportedType));
        assert!(v.error.unwrap().contains("image/gif"));
    }

    #[test]
    fn test_validate_format_by_content() {
        assert!(validate_image_format(&test_images::jpeg(10, 10)).valid);
        assert_eq!(
            validate_image_format(b"plain text").code,
            Some(ValidationCode::InvalidImage)
        );

        let mut gif = Vec::new();
        image::DynamicImage::new_rgb8(4, 4)
            .write_to(&mut std::io::Cursor::new(&mut gif), image::ImageFormat::Gif)
            .unwrap();
        assert_eq!(
            validate_image_format(&gif).code,
            Some(ValidationCode::UnsupportedType)
        );
    }

    #[test]
    fn test_metadata_from_png() {
        let bytes = test_images::png(64, 48);
        let meta = get_image_metadata(&bytes);
        assert_eq!((meta.width, meta.height), (64, 48));
        assert_eq!(meta.format, "png");
        assert_eq!(meta.color_space, "srgb");
        assert_eq!(meta.density, 72);
        assert_eq!(meta.size, bytes.len());
    }

    #[test]
    fn test_metadata_defaults_for_garbage() {
        let meta = get_image_metadata(b"garbage");
        assert_eq!((meta.width, meta.height), (0, 0));
        assert_eq!(meta.format, "unknown");
        assert_eq!(meta.color_space, "unknown");
        assert_eq!(meta.size, 7);
    }
}
