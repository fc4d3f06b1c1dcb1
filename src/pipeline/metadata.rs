//! Metadata extraction for the `output=json` response mode.

use serde::Serialize;

use crate::error::ServiceError;

/// Decoded image properties, serialized as the JSON response body.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub space: String,
    pub channels: u8,
    pub depth: String,
    pub has_alpha: bool,
    /// Size of the source bytes, not of any re-encoded output.
    pub size: usize,
}

pub fn read_metadata(data: &[u8]) -> Result<ImageMetadata, ServiceError> {
    let format = image::guess_format(data)
        .map_err(|e| ServiceError::decode_failed(e.to_string()))?;
    let image = image::load_from_memory_with_format(data, format)
        .map_err(|e| ServiceError::decode_failed(e.to_string()))?;
    let color = image.color();

    let space = match color {
        image::ColorType::L8 | image::ColorType::La8 | image::ColorType::L16
        | image::ColorType::La16 => "b-w",
        _ => "srgb",
    };
    let depth = if color.bytes_per_pixel() / color.channel_count() > 1 {
        "ushort"
    } else {
        "uchar"
    };

    Ok(ImageMetadata {
        format: format.extensions_str().first().copied().unwrap_or("unknown").to_string(),
        width: image.width(),
        height: image.height(),
        space: space.to_string(),
        channels: color.channel_count(),
        depth: depth.to_string(),
        has_alpha: color.has_alpha(),
        size: data.len(),
    })
}
