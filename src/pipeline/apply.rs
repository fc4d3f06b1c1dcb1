//! Pipeline application: decode, fold the transform steps, encode.

use std::io::Cursor;

use image::io::Reader as ImageReader;
use image::{DynamicImage, Rgba, RgbaImage};

use super::encode;
use super::plan::{build_plan, EncodeSpec, ResizeSpec, TransformStep};
use crate::color;
use crate::error::ServiceError;
use crate::params::{FitMode, Modulate, Pages, RequestParams};

/// Result of running the pipeline: encoded bytes plus the format that
/// produced them (drives the Content-Type header and data URIs).
pub struct PipelineOutput {
    pub data: Vec<u8>,
    pub format: crate::params::OutputFormat,
}

/// Decode the input, apply the transform plan in order, and encode.
pub fn run(data: &[u8], params: &RequestParams) -> Result<PipelineOutput, ServiceError> {
    let mut image = decode(data, params.pages)?;
    let mut encode_spec = EncodeSpec::default();

    for step in build_plan(params) {
        match step {
            TransformStep::Resize(spec) => image = resize(image, &spec)?,
            // Encoding is lazy: remember the descriptor, materialize last.
            TransformStep::Encode(spec) => encode_spec = spec,
            TransformStep::Flatten { background } => image = flatten(image, &background)?,
            TransformStep::Blur { sigma } => image = image.blur(sigma),
            TransformStep::Gamma { value } => image = apply_gamma(image, value),
            TransformStep::Modulate(m) => image = modulate(image, m),
            TransformStep::Sharpen { sigma } => image = image.unsharpen(sigma as f32, 0),
        }
    }

    let format = encode_spec.format;
    let data = encode::encode(&image, &encode_spec)?;
    Ok(PipelineOutput { data, format })
}

/// Composite `overlay` centered over the encoded `base` image and return
/// the result as PNG bytes, ready to re-enter the pipeline.
pub fn composite_centered(base: &[u8], overlay: &RgbaImage) -> Result<Vec<u8>, ServiceError> {
    let mut canvas = decode(base, Pages::First)?.to_rgba8();
    let x = (canvas.width() as i64 - overlay.width() as i64) / 2;
    let y = (canvas.height() as i64 - overlay.height() as i64) / 2;
    image::imageops::overlay(&mut canvas, overlay, x, y);

    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| ServiceError::encode_failed("png", e.to_string()))?;
    Ok(bytes)
}

fn decode(data: &[u8], pages: Pages) -> Result<DynamicImage, ServiceError> {
    match pages {
        Pages::First => decode_single(data),
        Pages::All => decode_all_pages(data),
        Pages::Single(index) => decode_page(data, index),
    }
}

fn decode_single(data: &[u8]) -> Result<DynamicImage, ServiceError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ServiceError::decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| ServiceError::decode_failed(e.to_string()))
}

fn decode_frames(data: &[u8]) -> Result<Option<Vec<RgbaImage>>, ServiceError> {
    use image::codecs::gif::GifDecoder;
    use image::AnimationDecoder;

    if !matches!(image::guess_format(data), Ok(image::ImageFormat::Gif)) {
        return Ok(None);
    }
    let decoder = GifDecoder::new(Cursor::new(data))
        .map_err(|e| ServiceError::decode_failed(e.to_string()))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| ServiceError::decode_failed(e.to_string()))?;
    Ok(Some(frames.into_iter().map(|f| f.into_buffer()).collect()))
}

/// `n=-1`: every frame of a multi-frame input, stacked vertically in the
/// engine's multi-page representation. Single-frame formats decode as-is.
fn decode_all_pages(data: &[u8]) -> Result<DynamicImage, ServiceError> {
    let Some(frames) = decode_frames(data)? else {
        return decode_single(data);
    };
    if frames.is_empty() {
        return Err(ServiceError::decode_failed("animation has no frames"));
    }
    if frames.len() == 1 {
        let mut frames = frames;
        return Ok(DynamicImage::ImageRgba8(frames.remove(0)));
    }

    let width = frames.iter().map(|f| f.width()).max().unwrap_or(1);
    let height: u32 = frames.iter().map(|f| f.height()).sum();
    let mut stacked = RgbaImage::new(width.max(1), height.max(1));
    let mut offset = 0i64;
    for frame in &frames {
        image::imageops::overlay(&mut stacked, frame, 0, offset);
        offset += frame.height() as i64;
    }
    Ok(DynamicImage::ImageRgba8(stacked))
}

fn decode_page(data: &[u8], index: u32) -> Result<DynamicImage, ServiceError> {
    let Some(mut frames) = decode_frames(data)? else {
        // Single-page formats only have page 0.
        if index == 0 {
            return decode_single(data);
        }
        return Err(ServiceError::engine_failed(format!(
            "page {index} out of range for single-page image"
        )));
    };
    if (index as usize) < frames.len() {
        Ok(DynamicImage::ImageRgba8(frames.swap_remove(index as usize)))
    } else {
        Err(ServiceError::engine_failed(format!(
            "page {index} out of range ({} pages)",
            frames.len()
        )))
    }
}

fn resize(image: DynamicImage, spec: &ResizeSpec) -> Result<DynamicImage, ServiceError> {
    let src_w = image.width();
    let src_h = image.height();
    if src_w == 0 || src_h == 0 {
        return Err(ServiceError::engine_failed("source image is empty"));
    }

    let (target_w, target_h) = match (spec.width, spec.height) {
        (None, None) => return Ok(image),
        (Some(w), None) => {
            let ratio = gated_ratio(w as f64 / src_w as f64, spec.without_enlargement);
            return resample(image, scale(src_w, ratio), scale(src_h, ratio));
        }
        (None, Some(h)) => {
            let ratio = gated_ratio(h as f64 / src_h as f64, spec.without_enlargement);
            return resample(image, scale(src_w, ratio), scale(src_h, ratio));
        }
        (Some(w), Some(h)) => (w.max(1), h.max(1)),
    };

    if spec.fit == FitMode::Fill {
        let (w, h) = if spec.without_enlargement {
            (target_w.min(src_w), target_h.min(src_h))
        } else {
            (target_w, target_h)
        };
        return resample(image, w, h);
    }

    let ratio_w = target_w as f64 / src_w as f64;
    let ratio_h = target_h as f64 / src_h as f64;
    let ratio = match spec.fit {
        FitMode::Inside | FitMode::Contain => ratio_w.min(ratio_h),
        FitMode::Outside | FitMode::Cover => ratio_w.max(ratio_h),
        FitMode::Fill => unreachable!("handled above"),
    };
    let ratio = gated_ratio(ratio, spec.without_enlargement);
    let scaled = resample(image, scale(src_w, ratio), scale(src_h, ratio))?;

    match spec.fit {
        FitMode::Cover => {
            let crop_w = target_w.min(scaled.width());
            let crop_h = target_h.min(scaled.height());
            let x = (scaled.width() - crop_w) / 2;
            let y = (scaled.height() - crop_h) / 2;
            Ok(scaled.crop_imm(x, y, crop_w, crop_h))
        }
        FitMode::Contain => {
            let fill = match spec.contain_background.as_deref() {
                Some(bg) => color::to_rgba(bg)?,
                None => Rgba([0, 0, 0, 0]),
            };
            let mut canvas = RgbaImage::from_pixel(target_w, target_h, fill);
            let x = (target_w as i64 - scaled.width() as i64) / 2;
            let y = (target_h as i64 - scaled.height() as i64) / 2;
            image::imageops::overlay(&mut canvas, &scaled.to_rgba8(), x, y);
            Ok(DynamicImage::ImageRgba8(canvas))
        }
        _ => Ok(scaled),
    }
}

fn gated_ratio(ratio: f64, without_enlargement: bool) -> f64 {
    if without_enlargement {
        ratio.min(1.0)
    } else {
        ratio
    }
}

fn scale(dim: u32, ratio: f64) -> u32 {
    ((dim as f64 * ratio).round() as u32).max(1)
}

/// Lanczos3 resampling via fast_image_resize.
fn resample(image: DynamicImage, target_w: u32, target_h: u32) -> Result<DynamicImage, ServiceError> {
    use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
    use std::num::NonZeroU32;

    if image.width() == target_w && image.height() == target_h {
        return Ok(image);
    }

    let src_width = NonZeroU32::new(image.width())
        .ok_or_else(|| ServiceError::engine_failed("source width is 0"))?;
    let src_height = NonZeroU32::new(image.height())
        .ok_or_else(|| ServiceError::engine_failed("source height is 0"))?;
    let dst_width = NonZeroU32::new(target_w)
        .ok_or_else(|| ServiceError::engine_failed("target width is 0"))?;
    let dst_height = NonZeroU32::new(target_h)
        .ok_or_else(|| ServiceError::engine_failed("target height is 0"))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        image.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| ServiceError::engine_failed(format!("resize setup failed: {e:?}")))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| ServiceError::engine_failed(format!("resize failed: {e:?}")))?;

    let buffer = RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| ServiceError::engine_failed("resize produced a bad buffer"))?;
    Ok(DynamicImage::ImageRgba8(buffer))
}

/// Alpha-composite the image over a solid background, discarding alpha.
fn flatten(image: DynamicImage, background: &str) -> Result<DynamicImage, ServiceError> {
    let bg = color::to_rgba(background)?;
    let mut rgba = image.into_rgba8();
    for pixel in rgba.pixels_mut() {
        let alpha = pixel[3] as f32 / 255.0;
        for c in 0..3 {
            let blended = pixel[c] as f32 * alpha + bg[c] as f32 * (1.0 - alpha);
            pixel[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
        pixel[3] = 255;
    }
    Ok(DynamicImage::ImageRgba8(rgba))
}

/// Gamma correction with exponent 1/gamma, applied per channel via a
/// lookup table. Alpha is untouched.
fn apply_gamma(image: DynamicImage, gamma: f32) -> DynamicImage {
    let exponent = 1.0 / gamma;
    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        *entry = ((i as f32 / 255.0).powf(exponent) * 255.0).round() as u8;
    }

    let mut rgba = image.into_rgba8();
    for pixel in rgba.pixels_mut() {
        for c in 0..3 {
            pixel[c] = lut[pixel[c] as usize];
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

/// Brightness and saturation multipliers with hue rotation, in HSL space.
fn modulate(image: DynamicImage, m: Modulate) -> DynamicImage {
    let mut rgba = image.into_rgba8();
    for pixel in rgba.pixels_mut() {
        let (h, s, l) = rgb_to_hsl(pixel[0], pixel[1], pixel[2]);
        let h = (h + m.hue).rem_euclid(360.0);
        let s = (s * m.saturation).clamp(0.0, 1.0);
        let l = (l * m.brightness).clamp(0.0, 1.0);
        let (r, g, b) = hsl_to_rgb(h, s, l);
        pixel[0] = r;
        pixel[1] = g;
        pixel[2] = b;
    }
    DynamicImage::ImageRgba8(rgba)
}

fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f32::EPSILON {
        return (0.0, 0.0, l);
    }

    let delta = max - min;
    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };
    let h = if (max - r).abs() < f32::EPSILON {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if (max - g).abs() < f32::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    (h.rem_euclid(360.0), s, l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}
