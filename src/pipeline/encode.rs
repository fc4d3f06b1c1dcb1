//! Output encoders.
//!
//! One function per format, dispatched from the encode descriptor. JPEG
//! is always emitted baseline; the progressive flag is accepted for
//! compatibility but the encoder does not support interlaced output.
//! TIFF is written uncompressed for the same reason.

use std::io::Cursor;

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::{ColorType, DynamicImage, ImageEncoder};

use super::plan::EncodeSpec;
use crate::error::ServiceError;
use crate::params::OutputFormat;

/// Encode `image` according to the descriptor.
pub fn encode(image: &DynamicImage, spec: &EncodeSpec) -> Result<Vec<u8>, ServiceError> {
    match spec.format {
        OutputFormat::Jpeg => encode_jpeg(image, spec.quality),
        OutputFormat::Png => encode_png(image, spec.png_compression),
        OutputFormat::Webp => encode_webp(image, spec.quality),
        OutputFormat::Tiff => encode_tiff(image),
        OutputFormat::Gif => encode_gif(image),
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ServiceError> {
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .encode_image(&image.to_rgb8())
        .map_err(|e| ServiceError::encode_failed("jpeg", e.to_string()))?;
    Ok(buffer)
}

fn encode_png(image: &DynamicImage, compression: u8) -> Result<Vec<u8>, ServiceError> {
    // The encoder only exposes coarse levels; bucket the 0-9 scale.
    let compression = match compression {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    };
    let rgba = image.to_rgba8();
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buffer, compression, FilterType::Adaptive);
    encoder
        .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)
        .map_err(|e| ServiceError::encode_failed("png", e.to_string()))?;
    Ok(buffer)
}

fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ServiceError> {
    let rgba = image.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    Ok(encoder.encode(quality as f32).to_vec())
}

fn encode_tiff(image: &DynamicImage) -> Result<Vec<u8>, ServiceError> {
    let rgba = image.to_rgba8();
    let mut buffer = Cursor::new(Vec::new());
    let encoder = TiffEncoder::new(&mut buffer);
    encoder
        .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)
        .map_err(|e| ServiceError::encode_failed("tiff", e.to_string()))?;
    Ok(buffer.into_inner())
}

fn encode_gif(image: &DynamicImage) -> Result<Vec<u8>, ServiceError> {
    let rgba = image.to_rgba8();
    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buffer);
        encoder
            .encode(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)
            .map_err(|e| ServiceError::encode_failed("gif", e.to_string()))?;
    }
    Ok(buffer)
}
