//! Text canvas rendering.
//!
//! Renders a text string onto a fixed-size RGBA canvas with canvas-style
//! alignment semantics: the anchor point sits at the canvas center, the
//! `align` value decides how the measured text extends from it
//! horizontally and the `baseline` value decides where the glyph baseline
//! sits relative to it vertically.

use std::io::Cursor;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{DynamicImage, Rgba, RgbaImage};

use super::fonts;
use crate::color;
use crate::error::ServiceError;
use crate::params::{RequestParams, TextAlign, TextBaseline};

const DEFAULT_CANVAS_WIDTH: u32 = 800;
const DEFAULT_CANVAS_HEIGHT: u32 = 800;

/// Canvas and typography settings for one text render.
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub width: u32,
    pub height: u32,
    /// Canvas fill; `None` leaves the canvas transparent.
    pub background: Option<String>,
    pub color: String,
    pub font_size: f32,
    pub font_family: String,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    pub rounded_corners: bool,
    pub corner_radius: f32,
}

impl TextStyle {
    /// Style for a standalone text canvas. The canvas is opaque white
    /// unless a background color was requested.
    pub fn standalone(params: &RequestParams) -> Self {
        Self::from_params(
            params,
            Some(params.background.clone().unwrap_or_else(|| "#ffffff".to_string())),
        )
    }

    /// Style for a text layer composited over an image. The canvas stays
    /// transparent so only the glyphs land on the base image.
    pub fn overlay(params: &RequestParams) -> Self {
        Self::from_params(params, None)
    }

    fn from_params(params: &RequestParams, background: Option<String>) -> Self {
        Self {
            width: params.width.unwrap_or(DEFAULT_CANVAS_WIDTH).max(1),
            height: params.height.unwrap_or(DEFAULT_CANVAS_HEIGHT).max(1),
            background,
            color: params.text_color.clone(),
            font_size: params.font_size,
            font_family: params.font_family.clone(),
            align: params.text_align,
            baseline: params.text_baseline,
            rounded_corners: params.rounded_corners,
            corner_radius: params.corner_radius,
        }
    }
}

/// Render `text` onto a canvas described by `style`.
pub fn render_text(text: &str, style: &TextStyle) -> Result<RgbaImage, ServiceError> {
    let mut canvas = RgbaImage::new(style.width, style.height);
    if let Some(bg) = style.background.as_deref() {
        fill_background(&mut canvas, bg, style)?;
    }

    // An empty string still produces the canvas; no font needed.
    if text.is_empty() {
        return Ok(canvas);
    }

    let font = fonts::resolve(&style.font_family)?;
    let scale = PxScale::from(style.font_size);
    let scaled_font = font.as_scaled(scale);

    let text_width = measure_width(&*font, scale, text);
    let cx = style.width as f32 / 2.0;
    let start_x = match style.align {
        TextAlign::Left => cx,
        TextAlign::Center => cx - text_width / 2.0,
        TextAlign::Right => cx - text_width,
    };

    let cy = style.height as f32 / 2.0;
    let ascent = scaled_font.ascent();
    let descent = scaled_font.descent();
    let baseline_y = match style.baseline {
        TextBaseline::Top => cy + ascent,
        TextBaseline::Hanging => cy + ascent * 0.8,
        TextBaseline::Middle => cy + (ascent + descent) / 2.0,
        TextBaseline::Alphabetic => cy,
        TextBaseline::Ideographic | TextBaseline::Bottom => cy + descent,
    };

    // txtColor is permissive like every other parameter: unusable values
    // render in the default black.
    let fill = color::to_rgba(&color::parse_color(&style.color)).unwrap_or(Rgba([0, 0, 0, 255]));

    let mut cursor_x = start_x;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;
    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;
                if x >= 0 && y >= 0 && x < style.width as i32 && y < style.height as i32 {
                    let pixel = Rgba([fill[0], fill[1], fill[2], (coverage * 255.0) as u8]);
                    let existing = canvas.get_pixel(x as u32, y as u32);
                    let blended = blend_pixels(*existing, pixel);
                    canvas.put_pixel(x as u32, y as u32, blended);
                }
            });
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    Ok(canvas)
}

/// Render `text` and PNG-encode the canvas, ready to enter the pipeline.
pub fn render_text_png(text: &str, style: &TextStyle) -> Result<Vec<u8>, ServiceError> {
    let canvas = render_text(text, style)?;
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| ServiceError::encode_failed("png", e.to_string()))?;
    Ok(bytes)
}

fn measure_width(font: &FontVec, scale: PxScale, text: &str) -> f32 {
    let scaled_font = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut prev_glyph: Option<ab_glyph::GlyphId> = None;
    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);
        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }
        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }
    width
}

/// Fill the canvas with the background color, leaving the corners
/// transparent when rounded corners are requested.
fn fill_background(
    canvas: &mut RgbaImage,
    background: &str,
    style: &TextStyle,
) -> Result<(), ServiceError> {
    let bg = color::to_rgba(&color::parse_color(background))
        .unwrap_or(Rgba([255, 255, 255, 255]));
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;
    let radius = if style.rounded_corners {
        style.corner_radius.min(width / 2.0).min(height / 2.0)
    } else {
        0.0
    };

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        if radius > 0.0 && !inside_rounded_rect(x as f32, y as f32, width, height, radius) {
            continue;
        }
        *pixel = bg;
    }
    Ok(())
}

fn inside_rounded_rect(x: f32, y: f32, width: f32, height: f32, radius: f32) -> bool {
    let px = x + 0.5;
    let py = y + 0.5;
    let corner_x = if px < radius {
        Some(radius)
    } else if px > width - radius {
        Some(width - radius)
    } else {
        None
    };
    let corner_y = if py < radius {
        Some(radius)
    } else if py > height - radius {
        Some(height - radius)
    } else {
        None
    };
    match (corner_x, corner_y) {
        (Some(cx), Some(cy)) => {
            let dx = px - cx;
            let dy = py - cy;
            dx * dx + dy * dy <= radius * radius
        }
        _ => true,
    }
}

fn blend_pixels(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_alpha = top[3] as f32 / 255.0;
    let bottom_alpha = bottom[3] as f32 / 255.0;
    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);
    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |t: u8, b: u8| -> u8 {
        let t = t as f32 / 255.0;
        let b = b as f32 / 255.0;
        let result = (t * top_alpha + b * bottom_alpha * (1.0 - top_alpha)) / out_alpha;
        (result * 255.0) as u8
    };

    Rgba([
        blend(top[0], bottom[0]),
        blend(top[1], bottom[1]),
        blend(top[2], bottom[2]),
        (out_alpha * 255.0) as u8,
    ])
}
