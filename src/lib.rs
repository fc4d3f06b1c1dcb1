//! kagami - HTTP image transformation service.
//!
//! Fetches a source image over HTTP, applies a fixed-order transform
//! pipeline (resize, flatten, blur, gamma, modulate, sharpen), and
//! re-encodes it into the requested format. Text can be rendered onto a
//! standalone canvas or composited over the fetched image.

pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod http;
pub mod logging;
pub mod params;
pub mod pipeline;
pub mod text;
