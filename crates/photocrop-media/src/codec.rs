//! Thin layer over the `image` and `png` codecs.
//!
//! Everything here is synchronous and CPU-bound; async callers wrap it in
//! `spawn_blocking`.

use std::io::Cursor;

use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader};
use photocrop_models::ImageFormat;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

const INCHES_PER_METER: f64 = 39.3701;
const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// Header-level facts about an encoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHeader {
    pub format: Option<ImageFormat>,
    pub width: u32,
    pub height: u32,
    pub color_type: Option<ColorType>,
    pub density: Option<u32>,
}

/// Decoded pixels plus the metadata worth carrying into a re-encode.
pub struct DecodedImage {
    pub image: DynamicImage,
    pub icc_profile: Option<Vec<u8>>,
    pub density: Option<u32>,
    /// EXIF APP1 body, JPEG sources only
    pub exif: Option<Vec<u8>>,
}

/// Sniff the container format from magic bytes.
pub fn sniff_format(buffer: &[u8]) -> Option<ImageFormat> {
    if is_heif(buffer) {
        return Some(ImageFormat::Heic);
    }
    match image::guess_format(buffer).ok()? {
        image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
        image::ImageFormat::Png => Some(ImageFormat::Png),
        image::ImageFormat::WebP => Some(ImageFormat::Webp),
        image::ImageFormat::Gif => Some(ImageFormat::Gif),
        image::ImageFormat::Bmp => Some(ImageFormat::Bmp),
        image::ImageFormat::Tiff => Some(ImageFormat::Tiff),
        _ => None,
    }
}

/// ISO-BMFF `ftyp` box with a HEIF-family brand.
fn is_heif(buffer: &[u8]) -> bool {
    const BRANDS: [&[u8; 4]; 8] = [
        b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
    ];
    buffer.len() >= 12 && &buffer[4..8] == b"ftyp" && BRANDS.iter().any(|b| &buffer[8..12] == *b)
}

/// Read dimensions and color type without decoding pixel data.
pub fn read_header(buffer: &[u8]) -> ImageHeader {
    let format = sniff_format(buffer);
    let density = match format {
        Some(ImageFormat::Jpeg) => jfif_density(buffer),
        Some(ImageFormat::Png) => png_density(buffer),
        _ => None,
    };

    let mut header = ImageHeader {
        format,
        width: 0,
        height: 0,
        color_type: None,
        density,
    };

    let decoder = ImageReader::new(Cursor::new(buffer))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_decoder().ok());

    if let Some(decoder) = decoder {
        let (width, height) = decoder.dimensions();
        header.width = width;
        header.height = height;
        header.color_type = Some(decoder.color_type());
    }

    header
}

/// Decode pixels, keeping the ICC profile and density for later re-encoding.
pub fn decode(buffer: &[u8]) -> MediaResult<DecodedImage> {
    let reader = ImageReader::new(Cursor::new(buffer))
        .with_guessed_format()
        .map_err(|e| MediaError::decode(e.to_string()))?;

    let (density, exif) = match reader.format() {
        Some(image::ImageFormat::Jpeg) => (jfif_density(buffer), jpeg_exif(buffer)),
        Some(image::ImageFormat::Png) => (png_density(buffer), None),
        _ => (None, None),
    };

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| MediaError::decode(e.to_string()))?;
    let icc_profile = decoder.icc_profile().ok().flatten();
    let image = DynamicImage::from_decoder(decoder).map_err(|e| MediaError::decode(e.to_string()))?;

    Ok(DecodedImage {
        image,
        icc_profile,
        density,
        exif,
    })
}

/// Name for a color type, in the vocabulary of colour spaces.
pub fn color_space_name(color_type: ColorType) -> &'static str {
    match color_type {
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => "b-w",
        ColorType::Rgb16 | ColorType::Rgba16 => "rgb16",
        _ => "srgb",
    }
}

/// Encode as baseline JPEG with JFIF density and an optional ICC profile.
pub fn encode_jpeg(
    image: &DynamicImage,
    quality: u8,
    dpi: Option<u32>,
    icc_profile: Option<Vec<u8>>,
) -> MediaResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));

    if let Some(dpi) = dpi {
        encoder.set_pixel_density(PixelDensity::dpi(dpi.min(u16::MAX as u32) as u16));
    }
    if let Some(icc) = icc_profile {
        if let Err(e) = encoder.set_icc_profile(icc) {
            debug!(error = %e, "JPEG encoder rejected ICC profile");
        }
    }

    encoder
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| MediaError::encode("jpeg", e.to_string()))?;
    Ok(out)
}

/// Encode as 8-bit RGBA PNG with a pHYs chunk when `dpi` is set.
pub fn encode_png(image: &DynamicImage, dpi: Option<u32>) -> MediaResult<Vec<u8>> {
    let rgba = image.to_rgba8();
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, rgba.width(), rgba.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        if let Some(dpi) = dpi {
            let ppm = (dpi as f64 * INCHES_PER_METER).round() as u32;
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: ppm,
                yppu: ppm,
                unit: png::Unit::Meter,
            }));
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| MediaError::encode("png", e.to_string()))?;
        writer
            .write_image_data(rgba.as_raw())
            .map_err(|e| MediaError::encode("png", e.to_string()))?;
        writer
            .finish()
            .map_err(|e| MediaError::encode("png", e.to_string()))?;
    }
    Ok(out)
}

/// Encode as lossless WebP.
pub fn encode_webp(image: &DynamicImage) -> MediaResult<Vec<u8>> {
    let rgba = image.to_rgba8();
    let mut out = Vec::new();
    WebPEncoder::new_lossless(&mut out)
        .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
        .map_err(|e| MediaError::encode("webp", e.to_string()))?;
    Ok(out)
}

/// Header segments `(marker, body)` of a JPEG, up to the start of scan.
fn jpeg_segments(buffer: &[u8]) -> impl Iterator<Item = (u8, &[u8])> + '_ {
    let mut pos = if buffer.starts_with(&[0xFF, 0xD8]) {
        2
    } else {
        buffer.len()
    };
    std::iter::from_fn(move || {
        if pos + 4 > buffer.len() || buffer[pos] != 0xFF {
            return None;
        }
        let marker = buffer[pos + 1];
        // Start of scan: no more headers.
        if marker == 0xDA {
            return None;
        }
        let len = u16::from_be_bytes([buffer[pos + 2], buffer[pos + 3]]) as usize;
        let body = buffer.get(pos + 4..pos + 2 + len)?;
        pos += 2 + len;
        Some((marker, body))
    })
}

/// Density from the JFIF APP0 segment, converted to DPI.
pub fn jfif_density(buffer: &[u8]) -> Option<u32> {
    let (_, body) = jpeg_segments(buffer)
        .find(|(marker, body)| *marker == 0xE0 && body.len() >= 12 && body.starts_with(b"JFIF\0"))?;
    let units = body[7];
    let x_density = u16::from_be_bytes([body[8], body[9]]) as f64;
    match units {
        1 if x_density > 0.0 => Some(x_density as u32),
        2 if x_density > 0.0 => Some((x_density * 2.54).round() as u32),
        _ => None,
    }
}

/// Body of the EXIF APP1 segment, including its `Exif\0\0` prefix.
pub fn jpeg_exif(buffer: &[u8]) -> Option<Vec<u8>> {
    jpeg_segments(buffer)
        .find(|(marker, body)| *marker == 0xE1 && body.starts_with(EXIF_PREFIX))
        .map(|(_, body)| body.to_vec())
}

/// Insert an EXIF APP1 segment after SOI and any JFIF APP0 segment.
pub fn insert_jpeg_exif(jpeg: &[u8], exif: &[u8]) -> MediaResult<Vec<u8>> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return Err(MediaError::encode("jpeg", "output is not a JPEG stream"));
    }
    if !exif.starts_with(EXIF_PREFIX) || exif.len() + 2 > u16::MAX as usize {
        return Err(MediaError::encode("jpeg", "EXIF segment is malformed or too large"));
    }

    let mut at = 2;
    if let Some((0xE0, body)) = jpeg_segments(jpeg).next() {
        at += 4 + body.len();
    }

    let mut out = Vec::with_capacity(jpeg.len() + exif.len() + 4);
    out.extend_from_slice(&jpeg[..at]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((exif.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(exif);
    out.extend_from_slice(&jpeg[at..]);
    Ok(out)
}

/// Density from the PNG pHYs chunk, converted to DPI.
pub fn png_density(buffer: &[u8]) -> Option<u32> {
    let decoder = png::Decoder::new(Cursor::new(buffer));
    let reader = decoder.read_info().ok()?;
    let dims = reader.info().pixel_dims?;
    match dims.unit {
        png::Unit::Meter if dims.xppu > 0 => {
            Some((dims.xppu as f64 / INCHES_PER_METER).round() as u32)
        }
        _ => None,
    }
}
