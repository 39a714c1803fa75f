//! Print preparation: resizing, DPI metadata, format conversion and crop
//! application.

use std::time::Instant;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use photocrop_models::{BoundingBox, OutputFormat, PrintOptions, PrintSize};
use tracing::{debug, info};

use crate::codec;
use crate::crop_calculator::adjust_crop_to_fit;
use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Default quality for [`convert_to_jpeg`] and print-size presets.
pub const DEFAULT_PRINT_QUALITY: u8 = 90;

/// JPEG quality used by [`apply_crop`].
const CROP_JPEG_QUALITY: u8 = 95;

/// Dimensions fitting `width` x `height` inside the box, never upscaling.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    (
        ((width as f64 * scale).round() as u32).clamp(1, max_width.max(1)),
        ((height as f64 * scale).round() as u32).clamp(1, max_height.max(1)),
    )
}

/// Resize and encode an image for printing.
///
/// The output fits inside `max_width` x `max_height` and carries
/// `target_dpi` in its density metadata. JPEG output keeps the source ICC
/// profile. WebP output is lossless and ignores `quality`.
pub async fn optimize_for_print(buffer: &[u8], options: &PrintOptions) -> MediaResult<Vec<u8>> {
    if buffer.is_empty() {
        return Err(MediaError::EmptyBuffer);
    }
    if options.max_width == 0 || options.max_height == 0 {
        return Err(MediaError::internal(format!(
            "print size must be positive, got {}x{}",
            options.max_width, options.max_height
        )));
    }

    let start = Instant::now();
    let owned = buffer.to_vec();
    let options = *options;

    let out = tokio::task::spawn_blocking(move || -> MediaResult<Vec<u8>> {
        let decoded = codec::decode(&owned)?;
        let (width, height) = decoded.image.dimensions();
        let (new_width, new_height) =
            fit_within(width, height, options.max_width, options.max_height);

        let image = if (new_width, new_height) == (width, height) {
            decoded.image
        } else {
            decoded
                .image
                .resize_exact(new_width, new_height, FilterType::Lanczos3)
        };

        debug!(
            width,
            height,
            new_width,
            new_height,
            format = options.format.as_str(),
            "Encoding print image"
        );

        let dpi = Some(options.target_dpi);
        match options.format {
            OutputFormat::Jpeg => codec::encode_jpeg(&image, options.quality, dpi, decoded.icc_profile),
            OutputFormat::Png => codec::encode_png(&image, dpi),
            OutputFormat::Webp => codec::encode_webp(&image),
        }
    })
    .await??;

    let elapsed = start.elapsed();
    metrics::record_print_optimize(options.format.as_str(), elapsed.as_secs_f64());
    info!(
        format = options.format.as_str(),
        dpi = options.target_dpi,
        bytes = out.len(),
        duration_ms = elapsed.as_millis() as u64,
        "Print image ready"
    );
    Ok(out)
}

/// Re-encode as JPEG at `quality`, keeping dimensions, density and ICC profile.
///
/// EXIF is carried over from JPEG sources only; the PNG and WebP decoders do
/// not expose it.
pub async fn convert_to_jpeg(buffer: &[u8], quality: u8) -> MediaResult<Vec<u8>> {
    if buffer.is_empty() {
        return Err(MediaError::EmptyBuffer);
    }
    let owned = buffer.to_vec();
    tokio::task::spawn_blocking(move || -> MediaResult<Vec<u8>> {
        let decoded = codec::decode(&owned)?;
        let out = codec::encode_jpeg(&decoded.image, quality, decoded.density, decoded.icc_profile)?;
        match decoded.exif {
            Some(exif) => codec::insert_jpeg_exif(&out, &exif),
            None => Ok(out),
        }
    })
    .await?
}

/// Ready-made JPEG print options for an A-series paper size at 300 DPI.
pub fn get_options_for_print_size(size: PrintSize, quality: u8) -> PrintOptions {
    let (max_width, max_height) = size.pixels_at_300_dpi();
    PrintOptions {
        target_dpi: 300,
        max_width,
        max_height,
        quality,
        format: OutputFormat::Jpeg,
    }
}

/// Cut `region` out of the image and level it by `rotation` degrees
/// (positive = clockwise). The region is first clamped into the image;
/// uncovered corners after rotation are white. Returns JPEG bytes.
pub async fn apply_crop(buffer: &[u8], region: BoundingBox, rotation: f64) -> MediaResult<Vec<u8>> {
    if buffer.is_empty() {
        return Err(MediaError::EmptyBuffer);
    }
    let owned = buffer.to_vec();
    tokio::task::spawn_blocking(move || -> MediaResult<Vec<u8>> {
        let decoded = codec::decode(&owned)?;
        let (width, height) = decoded.image.dimensions();
        let region = adjust_crop_to_fit(&region, width, height);

        let x = region.x.max(0.0).round() as u32;
        let y = region.y.max(0.0).round() as u32;
        let w = (region.width.round() as u32).clamp(1, width.saturating_sub(x).max(1));
        let h = (region.height.round() as u32).clamp(1, height.saturating_sub(y).max(1));
        let cropped = decoded.image.crop_imm(x, y, w, h);

        let leveled = if rotation.abs() > f64::EPSILON {
            let rgb = cropped.to_rgb8();
            let rotated = rotate_about_center(
                &rgb,
                rotation.to_radians() as f32,
                Interpolation::Bilinear,
                Rgb([255u8, 255, 255]),
            );
            DynamicImage::ImageRgb8(rotated)
        } else {
            cropped
        };

        codec::encode_jpeg(
            &leveled,
            CROP_JPEG_QUALITY,
            decoded.density,
            decoded.icc_profile,
        )
    })
    .await?
}
