//! Request parameter parsing.
//!
//! All query input arrives as a flat map of optional strings. This module
//! coerces it once, up front, into a typed [`RequestParams`] with every
//! field given a default and a documented range. Coercion is permissive
//! throughout: a malformed numeric value silently falls back to its
//! default and an out-of-range value is clamped, never rejected. Turning
//! these into validation errors would change observable behavior.

use std::collections::HashMap;
use std::str::FromStr;

/// Upper bound on any effective pixel dimension. Values above it clamp
/// rather than reject, like every other range here; without a ceiling a
/// single request could ask the engine for a multi-gigabyte buffer.
pub const MAX_DIMENSION: u32 = 10_000;

/// Output image format selected by the `output` parameter.
///
/// `json` is not an encode format; it is handled separately as the
/// metadata-only response mode. Unknown values fall back to JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
    Tiff,
    Gif,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
            Self::Gif => "gif",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Tiff => "image/tiff",
            Self::Gif => "image/gif",
        }
    }
}

/// How to fit the image within target dimensions when both are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Preserve aspect ratio, fit within the box (default).
    #[default]
    Inside,
    /// Preserve aspect ratio, cover the box from outside.
    Outside,
    /// Cover the box, then center-crop to the exact dimensions.
    Cover,
    /// Stretch to the exact dimensions, ignoring aspect ratio.
    Fill,
    /// Fit within the box, then letterbox to the exact dimensions.
    Contain,
}

impl FromStr for FitMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inside" => Ok(FitMode::Inside),
            "outside" => Ok(FitMode::Outside),
            "cover" => Ok(FitMode::Cover),
            "fill" => Ok(FitMode::Fill),
            "contain" => Ok(FitMode::Contain),
            _ => Err(()),
        }
    }
}

/// Horizontal text alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl FromStr for TextAlign {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(TextAlign::Left),
            "center" => Ok(TextAlign::Center),
            "right" => Ok(TextAlign::Right),
            _ => Err(()),
        }
    }
}

/// Vertical text baseline relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    Top,
    Hanging,
    #[default]
    Middle,
    Alphabetic,
    Ideographic,
    Bottom,
}

impl FromStr for TextBaseline {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(TextBaseline::Top),
            "hanging" => Ok(TextBaseline::Hanging),
            "middle" => Ok(TextBaseline::Middle),
            "alphabetic" => Ok(TextBaseline::Alphabetic),
            "ideographic" => Ok(TextBaseline::Ideographic),
            "bottom" => Ok(TextBaseline::Bottom),
            _ => Err(()),
        }
    }
}

/// Page/frame selection for multi-page formats (`page`, `n`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pages {
    /// Decode the first page only (default).
    #[default]
    First,
    /// Decode every page (`n=-1`), stacked vertically.
    All,
    /// Decode a single page by index (`page=N`).
    Single(u32),
}

/// Brightness/saturation/hue adjustment from the `mod` parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modulate {
    /// Lightness multiplier. Default 1.
    pub brightness: f32,
    /// Saturation multiplier. Default 1.
    pub saturation: f32,
    /// Hue rotation in degrees. Default 0.
    pub hue: f32,
}

/// Typed view of the full query parameter bag.
#[derive(Debug, Clone)]
pub struct RequestParams {
    pub url: Option<String>,
    /// Fallback URL from `default`, still percent-encoded.
    pub fallback_url: Option<String>,

    // === Resize ===
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Device pixel ratio multiplier. Default 1.
    pub dpr: f32,
    pub fit: FitMode,
    /// Letterbox fill for `fit=contain` (`cbg`).
    pub contain_background: Option<String>,
    /// True only when `we` equals the literal string "true".
    pub without_enlargement: bool,

    // === Output ===
    pub output: OutputFormat,
    /// `output=json`: respond with decoded metadata instead of pixels.
    pub metadata_only: bool,
    /// Encode quality, clamped to 1..=100. Default 80.
    pub quality: u8,
    /// PNG compression level, clamped to 0..=9. Default 6.
    pub png_compression: u8,
    /// Progressive JPEG requested (`il=true`).
    pub progressive: bool,
    pub pages: Pages,
    /// Respond with a base64 data URI (`encoding=base64`).
    pub base64_encoding: bool,

    // === Effects ===
    pub background: Option<String>,
    /// Raw blur sigma; the planner applies it only within [0.3, 1000].
    pub blur: Option<f32>,
    /// Gamma value; presence of `gam` always triggers the operation,
    /// already normalized to the 2.2 fallback when out of [1.0, 3.0].
    pub gamma: Option<f32>,
    pub modulate: Option<Modulate>,
    /// Sharpen sigma; unparsable input skips the operation.
    pub sharpen: Option<i32>,

    // === Response headers ===
    /// Cache-Control max-age value. Default "31536000".
    pub max_age: String,
    pub filename: Option<String>,

    // === Text overlay ===
    pub text: Option<String>,
    /// Text fill color. Default black.
    pub text_color: String,
    /// Font size in pixels. Default 48.
    pub font_size: f32,
    /// Font family. Default Arial.
    pub font_family: String,
    pub text_align: TextAlign,
    pub text_baseline: TextBaseline,
    pub rounded_corners: bool,
    /// Corner radius when `roundedCorners=true`. Default 20.
    pub corner_radius: f32,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            url: None,
            fallback_url: None,
            width: None,
            height: None,
            dpr: 1.0,
            fit: FitMode::Inside,
            contain_background: None,
            without_enlargement: false,
            output: OutputFormat::Jpeg,
            metadata_only: false,
            quality: 80,
            png_compression: 6,
            progressive: false,
            pages: Pages::First,
            base64_encoding: false,
            background: None,
            blur: None,
            gamma: None,
            modulate: None,
            sharpen: None,
            max_age: "31536000".to_string(),
            filename: None,
            text: None,
            text_color: "#000000".to_string(),
            font_size: 48.0,
            font_family: "Arial".to_string(),
            text_align: TextAlign::Center,
            text_baseline: TextBaseline::Middle,
            rounded_corners: false,
            corner_radius: 20.0,
        }
    }
}

impl RequestParams {
    /// Parse the raw query map. Never fails: malformed values fall back
    /// to their documented defaults.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let mut params = Self::default();

        params.url = non_empty(query, "url");
        params.fallback_url = non_empty(query, "default");

        params.width = parse_opt::<u32>(query, "w").map(|w| w.clamp(1, MAX_DIMENSION));
        params.height = parse_opt::<u32>(query, "h").map(|h| h.clamp(1, MAX_DIMENSION));
        params.dpr = parse_opt::<f32>(query, "dpr")
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(1.0);
        params.fit = parse_enum(query, "fit");
        params.contain_background = non_empty(query, "cbg");
        params.without_enlargement = query.get("we").map(String::as_str) == Some("true");

        match query.get("output").map(String::as_str) {
            Some("json") => params.metadata_only = true,
            Some("jpeg") | Some("jpg") | None => params.output = OutputFormat::Jpeg,
            Some("png") => params.output = OutputFormat::Png,
            Some("webp") => params.output = OutputFormat::Webp,
            Some("tiff") => params.output = OutputFormat::Tiff,
            Some("gif") => params.output = OutputFormat::Gif,
            Some(_) => params.output = OutputFormat::Jpeg,
        }

        params.quality = parse_opt::<i64>(query, "q").unwrap_or(80).clamp(1, 100) as u8;
        params.png_compression = parse_opt::<i64>(query, "l").unwrap_or(6).clamp(0, 9) as u8;
        params.progressive = query.get("il").map(String::as_str) == Some("true");
        params.base64_encoding = query.get("encoding").map(String::as_str) == Some("base64");

        // `page` takes precedence over `n=-1`, matching the decode options
        // of the engine: a specific page index narrows an all-pages read.
        if query.get("n").map(String::as_str) == Some("-1") {
            params.pages = Pages::All;
        }
        if let Some(page) = parse_opt::<u32>(query, "page") {
            params.pages = Pages::Single(page);
        }

        params.background = non_empty(query, "bg");
        params.blur = parse_opt::<f32>(query, "blur").filter(|b| b.is_finite());
        if query.contains_key("gam") {
            let value = parse_opt::<f32>(query, "gam")
                .filter(|g| (1.0..=3.0).contains(g))
                .unwrap_or(2.2);
            params.gamma = Some(value);
        }
        if let Some(raw) = query.get("mod") {
            params.modulate = Some(parse_modulate(raw));
        }
        params.sharpen = parse_opt(query, "sharp");

        if let Some(maxage) = non_empty(query, "maxage") {
            params.max_age = maxage;
        }
        params.filename = non_empty(query, "filename");

        params.text = non_empty(query, "text");
        if let Some(color) = non_empty(query, "txtColor") {
            params.text_color = color;
        }
        params.font_size = parse_opt::<f32>(query, "fontSize")
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(48.0);
        if let Some(family) = non_empty(query, "fontFamily") {
            params.font_family = family;
        }
        params.text_align = parse_enum(query, "textAlign");
        params.text_baseline = parse_enum(query, "textBaseline");
        params.rounded_corners = query.get("roundedCorners").map(String::as_str) == Some("true");
        params.corner_radius = parse_opt::<f32>(query, "cornerRadius")
            .filter(|r| r.is_finite() && *r >= 0.0)
            .unwrap_or(20.0);

        params
    }

    /// Effective resize width after applying the device pixel ratio.
    pub fn scaled_width(&self) -> Option<u32> {
        self.width.map(|w| scale_dimension(w, self.dpr))
    }

    /// Effective resize height after applying the device pixel ratio.
    pub fn scaled_height(&self) -> Option<u32> {
        self.height.map(|h| scale_dimension(h, self.dpr))
    }
}

fn scale_dimension(dim: u32, dpr: f32) -> u32 {
    ((dim as f64 * dpr as f64).round() as u32).clamp(1, MAX_DIMENSION)
}

fn non_empty(query: &HashMap<String, String>, key: &str) -> Option<String> {
    query.get(key).filter(|v| !v.is_empty()).cloned()
}

fn parse_opt<T: FromStr>(query: &HashMap<String, String>, key: &str) -> Option<T> {
    query.get(key).and_then(|v| v.parse().ok())
}

fn parse_enum<T: FromStr + Default>(query: &HashMap<String, String>, key: &str) -> T {
    query
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

/// Parse `brightness,saturation,hue`. A component that fails to parse,
/// is non-finite, or is zero (the original treated zero as absent) falls
/// back to its default of 1 / 1 / 0.
fn parse_modulate(raw: &str) -> Modulate {
    let mut parts = raw.split(',');
    let mut multiplier = |default: f32| {
        parts
            .next()
            .and_then(|s| s.trim().parse::<f32>().ok())
            .filter(|v| v.is_finite() && *v != 0.0)
            .unwrap_or(default)
    };
    let brightness = multiplier(1.0);
    let saturation = multiplier(1.0);
    let hue = parts
        .next()
        .and_then(|s| s.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);
    Modulate {
        brightness,
        saturation,
        hue,
    }
}
