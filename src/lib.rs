//! # mathtext
//!
//! LaTeX math rendering for chat content, with recovery from OCR errors.
//!
//! ## Features
//!
//! - **Mixed content**: splits free text on `$...$` and `$$...$$` delimiters
//! - **Recovery ladder**: retries malformed formulas with progressively
//!   stronger sanitizers before falling back to an in-place error marker
//! - **Never throws**: every render call produces markup
//! - **Engines**: KaTeX HTML/MathML, or Typst math markup via mitex
//! - **Diagnostics**: explains which OCR artifacts a formula contains
//! - **WASM Support**: compiles to WebAssembly for browser usage
//!
//! ## Usage Examples
//!
//! ### Mixed Content
//!
//! ```rust
//! use mathtext::engine::TypstEngine;
//! use mathtext::MixedRenderer;
//!
//! let renderer = MixedRenderer::new(TypstEngine::new());
//! let typst = renderer.render_to_string(r"The area is $\pi r^2$.");
//! assert!(typst.starts_with("The area is $"));
//! ```
//!
//! ### Single Formula
//!
//! ```rust
//! use mathtext::engine::TypstEngine;
//! use mathtext::MathRenderer;
//!
//! let renderer = MathRenderer::new(TypstEngine::new());
//! // `\nonumber` outside an equation is an OCR artifact; it is repaired
//! let rendered = renderer.render(r"x^{2} \nonumber", true);
//! assert!(!rendered.markup.is_empty());
//! ```

/// Core rendering modules
pub mod core;

/// Typesetting engines
pub mod engine;

/// Utility modules
pub mod utils;

/// WASM bindings (feature-gated)
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export core modules
pub use crate::core::ladder;
pub use crate::core::mixed;
pub use crate::core::options;
pub use crate::core::sanitize;
pub use crate::core::splitter;

pub use crate::core::{
    fix_syntax, split_mixed_content, strip_layout, FallbackSource, MathRenderer, MixedOutput,
    MixedRenderer, OutputFormat, RenderAttempt, RenderLadder, RenderOptions, RenderReport,
    RenderStage, RenderTarget, Rendered, RenderedNode, Segment, SegmentKind, Split, StageKind,
    Transform,
};

pub use crate::engine::{DefaultEngine, EngineMode, MathEngine};

// Re-export utilities
pub use crate::utils::diagnostics;
pub use crate::utils::error::{EngineError, MathTextError, MathTextResult};

/// Render one formula with the default engine and options
///
/// # Arguments
/// * `latex` - LaTeX math source (without `$` delimiters)
/// * `display_mode` - block (`true`) or inline (`false`) layout
///
/// # Returns
/// Engine markup; an error marker when the formula cannot be repaired
pub fn render_math(latex: &str, display_mode: bool) -> String {
    MathRenderer::new(DefaultEngine::new())
        .render(latex, display_mode)
        .markup
}

/// Render free text with embedded formulas using the default engine
pub fn render_mixed(text: &str) -> String {
    render_mixed_with_options(text, &RenderOptions::default())
}

/// Render free text with embedded formulas using custom options
pub fn render_mixed_with_options(text: &str, options: &RenderOptions) -> String {
    MixedRenderer::with_options(DefaultEngine::from_options(options), options)
        .render_to_string(text)
}
