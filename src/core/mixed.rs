//! Mixed text/math rendering
//!
//! Composes the splitter with the [`MathRenderer`]: text segments become
//! literal text nodes, math segments are rendered with their own display
//! mode, and the order of the source is kept. Content without any formula
//! never reaches the engine.
//!
//! ```rust
//! use mathtext::engine::TypstEngine;
//! use mathtext::mixed::{MixedRenderer, RenderedNode};
//!
//! let renderer = MixedRenderer::new(TypstEngine::new());
//! let output = renderer.render("just words");
//! assert_eq!(output.nodes, vec![RenderedNode::Text("just words".to_string())]);
//! ```

use crate::core::ladder::{MathRenderer, RenderReport, RenderTarget, Rendered};
use crate::core::options::RenderOptions;
use crate::core::splitter::{split_mixed_content, Segment, Split};
use crate::engine::MathEngine;

/// One piece of rendered output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedNode {
    /// Literal text, unescaped
    Text(String),
    /// Engine markup for one formula
    Math {
        markup: String,
        display_mode: bool,
        report: RenderReport,
    },
}

/// Rendered nodes in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MixedOutput {
    pub nodes: Vec<RenderedNode>,
}

impl MixedOutput {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn math_count(&self) -> usize {
        self.reports().count()
    }

    /// Reports of every math node, in order
    pub fn reports(&self) -> impl Iterator<Item = &RenderReport> {
        self.nodes.iter().filter_map(|node| match node {
            RenderedNode::Math { report, .. } => Some(report),
            RenderedNode::Text(_) => None,
        })
    }

    /// Serialize the nodes, escaping text for the engine's markup language
    pub fn to_markup<E: MathEngine + ?Sized>(&self, engine: &E) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                RenderedNode::Text(text) => out.push_str(&engine.escape_text(text)),
                RenderedNode::Math { markup, .. } => out.push_str(markup),
            }
        }
        out
    }
}

/// Renders free text containing `$...$` and `$$...$$` formulas
#[derive(Debug, Clone)]
pub struct MixedRenderer<E> {
    renderer: MathRenderer<E>,
}

impl<E: MathEngine> MixedRenderer<E> {
    pub fn new(engine: E) -> Self {
        Self {
            renderer: MathRenderer::new(engine),
        }
    }

    pub fn with_options(engine: E, options: &RenderOptions) -> Self {
        Self {
            renderer: MathRenderer::with_options(engine, options),
        }
    }

    pub fn math_renderer(&self) -> &MathRenderer<E> {
        &self.renderer
    }

    pub fn render(&self, text: &str) -> MixedOutput {
        let nodes = match split_mixed_content(text) {
            Split::Empty => Vec::new(),
            Split::Plain(plain) => vec![RenderedNode::Text(plain.to_string())],
            Split::Segments(segments) => segments
                .iter()
                .map(|segment| self.render_segment(segment))
                .collect(),
        };
        MixedOutput { nodes }
    }

    /// Render `text` and serialize it with the engine's escaping
    pub fn render_to_string(&self, text: &str) -> String {
        self.render(text).to_markup(self.renderer.engine())
    }

    /// Render `text`, replacing everything in `target`
    pub fn render_into<T: RenderTarget + ?Sized>(
        &self,
        target: &mut T,
        text: &str,
    ) -> MixedOutput {
        target.clear();
        let output = self.render(text);
        target.write_markup(&output.to_markup(self.renderer.engine()));
        output
    }

    fn render_segment(&self, segment: &Segment<'_>) -> RenderedNode {
        match *segment {
            Segment::Text(text) => RenderedNode::Text(text.to_string()),
            Segment::Math {
                latex,
                display_mode,
            } => {
                let Rendered { markup, report } = self.renderer.render(latex, display_mode);
                RenderedNode::Math {
                    markup,
                    display_mode,
                    report,
                }
            }
        }
    }
}

#[cfg(feature = "parallel")]
impl<E: MathEngine + Sync> MixedRenderer<E> {
    /// Like [`MixedRenderer::render`], with formulas rendered on the rayon
    /// pool. Output order matches the source.
    pub fn render_parallel(&self, text: &str) -> MixedOutput {
        use rayon::prelude::*;

        let nodes = match split_mixed_content(text) {
            Split::Empty => Vec::new(),
            Split::Plain(plain) => vec![RenderedNode::Text(plain.to_string())],
            Split::Segments(segments) => segments
                .par_iter()
                .map(|segment| self.render_segment(segment))
                .collect(),
        };
        MixedOutput { nodes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, EngineMode};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    /// Wraps input in a tag; rejects anything containing `!`
    #[derive(Default)]
    struct Tagging {
        calls: Cell<usize>,
    }

    impl MathEngine for Tagging {
        fn name(&self) -> &'static str {
            "tagging"
        }

        fn render(
            &self,
            latex: &str,
            display_mode: bool,
            mode: EngineMode,
        ) -> Result<String, EngineError> {
            self.calls.set(self.calls.get() + 1);
            if latex.contains('!') && mode == EngineMode::Strict {
                return Err(EngineError::parse("bang"));
            }
            let tag = if display_mode { "block" } else { "inline" };
            Ok(format!("<{tag}>{latex}</{tag}>"))
        }
    }

    #[test]
    fn test_plain_text_skips_engine() {
        let renderer = MixedRenderer::new(Tagging::default());
        let output = renderer.render("no math & no markup");
        assert_eq!(
            output.nodes,
            vec![RenderedNode::Text("no math & no markup".to_string())]
        );
        assert_eq!(renderer.math_renderer().engine().calls.get(), 0);
        assert_eq!(
            output.to_markup(renderer.math_renderer().engine()),
            "no math &amp; no markup"
        );
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        let renderer = MixedRenderer::new(Tagging::default());
        assert!(renderer.render("").is_empty());
        assert_eq!(renderer.render_to_string(""), "");
    }

    #[test]
    fn test_mixed_order_and_modes() {
        let renderer = MixedRenderer::new(Tagging::default());
        let html = renderer.render_to_string("a<b: $x$ then $$y$$.");
        assert_eq!(html, "a&lt;b: <inline>x</inline> then <block>y</block>.");
    }

    #[test]
    fn test_per_segment_recovery() {
        let renderer = MixedRenderer::new(Tagging::default());
        let output = renderer.render("$ok$ and $x!$");
        assert_eq!(output.math_count(), 2);
        let stages: Vec<_> = output.reports().map(|r| r.attempt_count()).collect();
        assert_eq!(stages, vec![1, 4]);
    }

    #[test]
    fn test_render_into_replaces_target() {
        let renderer = MixedRenderer::new(Tagging::default());
        let mut target = String::new();
        renderer.render_into(&mut target, "first $a$");
        renderer.render_into(&mut target, "second");
        assert_eq!(target, "second");
    }
}
