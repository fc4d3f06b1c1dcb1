//! Image transformation pipeline.
//!
//! The planner builds an ordered list of transform steps from the parsed
//! request parameters; the apply stage folds that list over the pixel
//! engine. The step order is fixed and significant: resize happens before
//! format selection, background flatten after it but before blur, and the
//! encode descriptor collected during the fold is materialized last.

pub mod apply;
pub mod encode;
pub mod metadata;
pub mod plan;

pub use apply::{composite_centered, run, PipelineOutput};
pub use metadata::{read_metadata, ImageMetadata};
pub use plan::{build_plan, EncodeSpec, ResizeSpec, TransformStep};
