//! Transform planning.
//!
//! Builds the ordered step list for one request. Range gates live here
//! (blur outside [0.3, 1000] produces no step at all) so that the apply
//! stage can stay a straight fold.

use crate::color::parse_color;
use crate::params::{FitMode, Modulate, OutputFormat, RequestParams};

/// Pixel dimensions and fit behavior for the resize step. Dimensions
/// already include the device pixel ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: FitMode,
    /// Canonicalized letterbox fill for `fit=contain`; `None` letterboxes
    /// with transparent black.
    pub contain_background: Option<String>,
    pub without_enlargement: bool,
}

/// Output encode descriptor. Always present in a plan; collected during
/// the fold and materialized after every pixel step has run.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSpec {
    pub format: OutputFormat,
    pub quality: u8,
    pub progressive: bool,
    pub png_compression: u8,
}

impl Default for EncodeSpec {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 80,
            progressive: false,
            png_compression: 6,
        }
    }
}

/// One step of the transform pipeline, in application order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformStep {
    Resize(ResizeSpec),
    Encode(EncodeSpec),
    Flatten { background: String },
    Blur { sigma: f32 },
    Gamma { value: f32 },
    Modulate(Modulate),
    Sharpen { sigma: i32 },
}

/// Build the ordered transform plan for one request.
///
/// The order mirrors the service contract and must not change: resize,
/// encode selection, flatten, blur, gamma, modulate, sharpen.
pub fn build_plan(params: &RequestParams) -> Vec<TransformStep> {
    let mut plan = Vec::new();

    if params.width.is_some() || params.height.is_some() {
        plan.push(TransformStep::Resize(ResizeSpec {
            width: params.scaled_width(),
            height: params.scaled_height(),
            fit: params.fit,
            contain_background: params
                .contain_background
                .as_deref()
                .map(parse_color),
            without_enlargement: params.without_enlargement,
        }));
    }

    plan.push(TransformStep::Encode(EncodeSpec {
        format: params.output,
        quality: params.quality,
        progressive: params.progressive,
        png_compression: params.png_compression,
    }));

    if let Some(bg) = params.background.as_deref() {
        plan.push(TransformStep::Flatten {
            background: parse_color(bg),
        });
    }

    if let Some(sigma) = params.blur.filter(|b| (0.3..=1000.0).contains(b)) {
        plan.push(TransformStep::Blur { sigma });
    }

    if let Some(value) = params.gamma {
        plan.push(TransformStep::Gamma { value });
    }

    if let Some(modulate) = params.modulate {
        plan.push(TransformStep::Modulate(modulate));
    }

    if let Some(sigma) = params.sharpen {
        plan.push(TransformStep::Sharpen { sigma });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn params(pairs: &[(&str, &str)]) -> RequestParams {
        let query: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RequestParams::from_query(&query)
    }

    #[test]
    fn test_minimal_plan_is_encode_only() {
        let plan = build_plan(&params(&[]));
        assert_eq!(plan.len(), 1);
        assert!(matches!(
            &plan[0],
            TransformStep::Encode(spec) if spec.format == OutputFormat::Jpeg && spec.quality == 80
        ));
    }

    #[test]
    fn test_full_plan_preserves_order() {
        let plan = build_plan(&params(&[
            ("w", "300"),
            ("bg", "#fff"),
            ("blur", "2"),
            ("gam", "1.5"),
            ("mod", "1.1,1.2,30"),
            ("sharp", "3"),
            ("output", "png"),
        ]));
        let kinds: Vec<&str> = plan
            .iter()
            .map(|s| match s {
                TransformStep::Resize(_) => "resize",
                TransformStep::Encode(_) => "encode",
                TransformStep::Flatten { .. } => "flatten",
                TransformStep::Blur { .. } => "blur",
                TransformStep::Gamma { .. } => "gamma",
                TransformStep::Modulate(_) => "modulate",
                TransformStep::Sharpen { .. } => "sharpen",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["resize", "encode", "flatten", "blur", "gamma", "modulate", "sharpen"]
        );
    }

    #[test]
    fn test_blur_below_range_is_dropped() {
        let plan = build_plan(&params(&[("blur", "0.1")]));
        assert!(!plan.iter().any(|s| matches!(s, TransformStep::Blur { .. })));
    }

    #[test]
    fn test_blur_in_range_is_kept() {
        let plan = build_plan(&params(&[("blur", "500")]));
        assert!(plan
            .iter()
            .any(|s| matches!(s, TransformStep::Blur { sigma } if *sigma == 500.0)));
    }

    #[test]
    fn test_gamma_out_of_range_uses_fallback_value() {
        let plan = build_plan(&params(&[("gam", "10")]));
        assert!(plan
            .iter()
            .any(|s| matches!(s, TransformStep::Gamma { value } if *value == 2.2)));
    }

    #[test]
    fn test_flatten_uses_canonical_color() {
        let plan = build_plan(&params(&[("bg", "#abc")]));
        assert!(plan.iter().any(
            |s| matches!(s, TransformStep::Flatten { background } if background == "#aabbcc")
        ));
    }

    #[test]
    fn test_resize_spec_applies_dpr() {
        let plan = build_plan(&params(&[("w", "100"), ("h", "50"), ("dpr", "2")]));
        assert!(plan.iter().any(|s| matches!(
            s,
            TransformStep::Resize(spec) if spec.width == Some(200) && spec.height == Some(100)
        )));
    }
}
