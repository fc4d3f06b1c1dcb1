//! Hex color normalization.
//!
//! Query parameters accept CSS-style hex colors in 3, 4, 6, and 8 digit
//! forms. Short forms are expanded by digit duplication (`#abc` becomes
//! `#aabbcc`); anything that is not recognizable hex passes through
//! unchanged. That pass-through is deliberate: a malformed color is not a
//! parameter error, it simply fails later at the engine boundary and
//! surfaces as a generic processing error.

use image::Rgba;

use crate::error::ServiceError;

/// Normalize a color string to canonical 6/8-digit hex where possible.
///
/// Unrecognized input is returned unchanged.
pub fn parse_color(input: &str) -> String {
    let Some(hex) = input.strip_prefix('#') else {
        return input.to_string();
    };

    let all_hex = hex.chars().all(|c| c.is_ascii_hexdigit());
    match hex.len() {
        3 | 4 if all_hex => {
            let mut expanded = String::with_capacity(1 + hex.len() * 2);
            expanded.push('#');
            for c in hex.chars() {
                expanded.push(c);
                expanded.push(c);
            }
            expanded
        }
        _ => input.to_string(),
    }
}

/// Convert a canonical `#RRGGBB` / `#RRGGBBAA` string to RGBA components.
///
/// This is the engine boundary: colors that survived [`parse_color`]
/// without normalizing to valid hex are rejected here.
pub fn to_rgba(color: &str) -> Result<Rgba<u8>, ServiceError> {
    let hex = color
        .strip_prefix('#')
        .ok_or_else(|| ServiceError::engine_failed(format!("unusable color: {color}")))?;

    let channel = |range: std::ops::Range<usize>| -> Result<u8, ServiceError> {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .ok_or_else(|| ServiceError::engine_failed(format!("unusable color: {color}")))
    };

    match hex.len() {
        6 => Ok(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255])),
        8 => Ok(Rgba([
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            channel(6..8)?,
        ])),
        _ => Err(ServiceError::engine_failed(format!(
            "unusable color: {color}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_expands_three_digit_hex() {
        assert_eq!(parse_color("#abc"), "#aabbcc");
        assert_eq!(parse_color("#f00"), "#ff0000");
        assert_eq!(parse_color("#FFF"), "#FFFFFF");
    }

    #[test]
    fn test_parse_color_expands_four_digit_hex() {
        assert_eq!(parse_color("#abcd"), "#aabbccdd");
        assert_eq!(parse_color("#f008"), "#ff000088");
    }

    #[test]
    fn test_parse_color_keeps_six_and_eight_digit_hex() {
        assert_eq!(parse_color("#aabbcc"), "#aabbcc");
        assert_eq!(parse_color("#aabbccdd"), "#aabbccdd");
    }

    #[test]
    fn test_parse_color_passes_through_malformed_input() {
        for input in ["red", "#xyz", "#12345", "", "#", "rgb(1,2,3)"] {
            assert_eq!(parse_color(input), input);
        }
    }

    #[test]
    fn test_to_rgba_six_digit() {
        assert_eq!(to_rgba("#ff8000").unwrap(), Rgba([255, 128, 0, 255]));
    }

    #[test]
    fn test_to_rgba_eight_digit() {
        assert_eq!(to_rgba("#ff800080").unwrap(), Rgba([255, 128, 0, 128]));
    }

    #[test]
    fn test_to_rgba_rejects_malformed() {
        assert!(to_rgba("red").is_err());
        assert!(to_rgba("#xyzxyz").is_err());
        assert!(to_rgba("#12345").is_err());
    }

    #[test]
    fn test_expanded_short_color_reaches_engine() {
        let rgba = to_rgba(&parse_color("#abc")).unwrap();
        assert_eq!(rgba, Rgba([170, 187, 204, 255]));
    }
}
