//! Core rendering modules
//!
//! - `splitter`: text/math segmentation of chat content
//! - `sanitize`: LaTeX repair transforms for OCR output
//! - `ladder`: single-formula rendering with staged recovery
//! - `mixed`: composition of splitting and rendering
//! - `options`: render options and config loading

pub mod ladder;
pub mod mixed;
pub mod options;
pub mod sanitize;
pub mod splitter;

pub use ladder::{
    MathRenderer, RenderAttempt, RenderLadder, RenderReport, RenderStage, RenderTarget, Rendered,
    StageKind,
};
pub use mixed::{MixedOutput, MixedRenderer, RenderedNode};
pub use options::{FallbackSource, OutputFormat, RenderOptions};
pub use sanitize::{fix_syntax, strip_layout, Transform};
pub use splitter::{split_mixed_content, Segment, SegmentKind, Split};
