//! Text canvas generation.
//!
//! Standalone text canvases and transparent text layers for compositing
//! over fetched images. Fonts come from the host system via [`fonts`].

pub mod fonts;
pub mod renderer;

pub use renderer::{render_text, render_text_png, TextStyle};
