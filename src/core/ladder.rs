//! Math rendering with OCR-error recovery
//!
//! [`MathRenderer`] walks a fixed [`RenderLadder`] of stages. Each stage pairs
//! an input [`Transform`] with an [`EngineMode`]:
//!
//! | Stage | Transform | Mode |
//! |---|---|---|
//! | 1 | raw | strict |
//! | 2 | syntax fix | strict |
//! | 3 | layout strip | strict |
//! | 4 | raw | lenient |
//!
//! The first stage that renders wins. Stage 4 runs the engine with its own
//! error display enabled, so a render call always produces markup and never
//! fails. The display mode is the caller's and is never altered by recovery.
//!
//! ```rust
//! use mathtext::engine::TypstEngine;
//! use mathtext::ladder::MathRenderer;
//!
//! let renderer = MathRenderer::new(TypstEngine::new());
//! let mut target = String::new();
//! let report = renderer.render_into(&mut target, r"x^{2", false);
//! assert!(!target.is_empty());
//! assert!(report.attempt_count() > 1);
//! ```

use std::fmt;

use tracing::{debug, warn};

use crate::core::options::{FallbackSource, RenderOptions};
use crate::core::sanitize::Transform;
use crate::engine::{EngineMode, MathEngine};

/// Ladder stage identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Raw,
    SyntaxFix,
    LayoutStrip,
    /// Lenient engine call with error display
    Fallback,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Raw => write!(f, "raw"),
            StageKind::SyntaxFix => write!(f, "syntax-fix"),
            StageKind::LayoutStrip => write!(f, "layout-strip"),
            StageKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// One row of the ladder table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStage {
    /// 1-based position in the full ladder
    pub index: u8,
    pub kind: StageKind,
    pub transform: Transform,
    pub mode: EngineMode,
}

const RAW_STAGE: RenderStage = RenderStage {
    index: 1,
    kind: StageKind::Raw,
    transform: Transform::Raw,
    mode: EngineMode::Strict,
};

const SYNTAX_FIX_STAGE: RenderStage = RenderStage {
    index: 2,
    kind: StageKind::SyntaxFix,
    transform: Transform::SyntaxFix,
    mode: EngineMode::Strict,
};

const LAYOUT_STRIP_STAGE: RenderStage = RenderStage {
    index: 3,
    kind: StageKind::LayoutStrip,
    transform: Transform::LayoutStrip,
    mode: EngineMode::Strict,
};

const fn fallback_stage(source: FallbackSource) -> RenderStage {
    RenderStage {
        index: 4,
        kind: StageKind::Fallback,
        transform: match source {
            FallbackSource::Raw => Transform::Raw,
            FallbackSource::Sanitized => Transform::LayoutStrip,
        },
        mode: EngineMode::Lenient,
    }
}

/// Ordered stages; the last one is always lenient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderLadder {
    stages: Vec<RenderStage>,
}

impl Default for RenderLadder {
    fn default() -> Self {
        Self::standard()
    }
}

impl RenderLadder {
    /// Full four-stage ladder with a raw fallback
    pub fn standard() -> Self {
        Self::from_options(&RenderOptions::default())
    }

    pub fn from_options(options: &RenderOptions) -> Self {
        let mut stages = Vec::with_capacity(4);
        stages.push(RAW_STAGE);
        if options.repair {
            stages.push(SYNTAX_FIX_STAGE);
            stages.push(LAYOUT_STRIP_STAGE);
        }
        stages.push(fallback_stage(options.fallback_source));
        Self { stages }
    }

    pub fn stages(&self) -> &[RenderStage] {
        &self.stages
    }
}

/// Record of one engine call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderAttempt {
    /// The string handed to the renderer for this segment
    pub source_latex: String,
    /// Stage index, 1..=4
    pub attempt_index: u8,
    pub stage: StageKind,
    /// What the engine actually received after the stage transform
    pub engine_input: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

/// All attempts made by one render call, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    pub display_mode: bool,
    pub attempts: Vec<RenderAttempt>,
}

impl RenderReport {
    fn new(display_mode: bool) -> Self {
        Self {
            display_mode,
            attempts: Vec::with_capacity(4),
        }
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    /// Index of the stage that produced the markup, if the engine succeeded
    pub fn succeeded_stage(&self) -> Option<u8> {
        self.attempts
            .iter()
            .find(|a| a.succeeded)
            .map(|a| a.attempt_index)
    }

    /// Whether the error-displaying stage was reached
    pub fn used_fallback(&self) -> bool {
        self.attempts
            .last()
            .is_some_and(|a| a.stage == StageKind::Fallback)
    }
}

/// Markup plus the attempts that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub markup: String,
    pub report: RenderReport,
}

/// Destination for rendered markup
pub trait RenderTarget {
    /// Drop all existing content
    fn clear(&mut self);
    fn write_markup(&mut self, markup: &str);
}

impl RenderTarget for String {
    fn clear(&mut self) {
        String::clear(self);
    }

    fn write_markup(&mut self, markup: &str) {
        self.push_str(markup);
    }
}

/// Renders single formulas through the recovery ladder
#[derive(Debug, Clone)]
pub struct MathRenderer<E> {
    engine: E,
    ladder: RenderLadder,
}

impl<E: MathEngine> MathRenderer<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            ladder: RenderLadder::standard(),
        }
    }

    pub fn with_options(engine: E, options: &RenderOptions) -> Self {
        Self {
            engine,
            ladder: RenderLadder::from_options(options),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn ladder(&self) -> &RenderLadder {
        &self.ladder
    }

    /// Render `latex`, replacing everything in `target`
    pub fn render_into<T: RenderTarget + ?Sized>(
        &self,
        target: &mut T,
        latex: &str,
        display_mode: bool,
    ) -> RenderReport {
        target.clear();
        let Rendered { markup, report } = self.render(latex, display_mode);
        target.write_markup(&markup);
        report
    }

    /// Render `latex` to markup. Never fails.
    pub fn render(&self, latex: &str, display_mode: bool) -> Rendered {
        let mut report = RenderReport::new(display_mode);

        for stage in self.ladder.stages() {
            let input = stage.transform.apply(latex);

            if stage.mode == EngineMode::Lenient {
                warn!(
                    engine = self.engine.name(),
                    attempts = report.attempt_count(),
                    "math repair exhausted, rendering with error display"
                );
            }

            let outcome = self.engine.render(&input, display_mode, stage.mode);
            let mut attempt = RenderAttempt {
                source_latex: latex.to_string(),
                attempt_index: stage.index,
                stage: stage.kind,
                engine_input: input.to_string(),
                succeeded: outcome.is_ok(),
                error: None,
            };

            match outcome {
                Ok(markup) => {
                    report.attempts.push(attempt);
                    return Rendered { markup, report };
                }
                Err(err) => {
                    debug!(
                        engine = self.engine.name(),
                        stage = %stage.kind,
                        error = %err,
                        "math render stage failed"
                    );
                    let message = err.to_string();
                    attempt.error = Some(message.clone());
                    report.attempts.push(attempt);

                    if stage.mode == EngineMode::Lenient {
                        let markup = self.engine.error_markup(&input, &message, display_mode);
                        return Rendered { markup, report };
                    }
                }
            }
        }

        // Ladders always end in a lenient stage, so this only guards against
        // an empty table.
        let markup = self
            .engine
            .error_markup(latex, "no render stage available", display_mode);
        Rendered { markup, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sanitize::{fix_syntax, strip_layout};
    use crate::engine::EngineError;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Accepts input without the listed fragments; records every call
    struct Picky {
        rejects: Vec<&'static str>,
        lenient_fails: bool,
        calls: RefCell<Vec<(String, bool, EngineMode)>>,
    }

    impl Picky {
        fn new(rejects: &[&'static str]) -> Self {
            Self {
                rejects: rejects.to_vec(),
                lenient_fails: false,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl MathEngine for Picky {
        fn name(&self) -> &'static str {
            "picky"
        }

        fn render(
            &self,
            latex: &str,
            display_mode: bool,
            mode: EngineMode,
        ) -> Result<String, EngineError> {
            self.calls
                .borrow_mut()
                .push((latex.to_string(), display_mode, mode));
            let bad = self.rejects.iter().find(|r| latex.contains(*r));
            match (bad, mode) {
                (None, _) => Ok(format!("<m>{}</m>", latex)),
                (Some(r), EngineMode::Strict) => Err(EngineError::parse(format!("bad {}", r))),
                (Some(_), EngineMode::Lenient) if self.lenient_fails => {
                    Err(EngineError::backend("crashed"))
                }
                (Some(_), EngineMode::Lenient) => Ok(format!("<err>{}</err>", latex)),
            }
        }
    }

    #[test]
    fn test_standard_ladder_table() {
        let ladder = RenderLadder::standard();
        let rows: Vec<_> = ladder
            .stages()
            .iter()
            .map(|s| (s.index, s.transform, s.mode))
            .collect();
        assert_eq!(
            rows,
            vec![
                (1, Transform::Raw, EngineMode::Strict),
                (2, Transform::SyntaxFix, EngineMode::Strict),
                (3, Transform::LayoutStrip, EngineMode::Strict),
                (4, Transform::Raw, EngineMode::Lenient),
            ]
        );
    }

    #[test]
    fn test_ladder_without_repair() {
        let ladder = RenderLadder::from_options(&RenderOptions::strict_source());
        let kinds: Vec<_> = ladder.stages().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StageKind::Raw, StageKind::Fallback]);
    }

    #[test]
    fn test_first_stage_success_skips_rest() {
        let renderer = MathRenderer::new(Picky::new(&[]));
        let rendered = renderer.render("x^2", true);
        assert_eq!(rendered.markup, "<m>x^2</m>");
        assert_eq!(rendered.report.attempt_count(), 1);
        assert_eq!(rendered.report.succeeded_stage(), Some(1));
        assert!(!rendered.report.used_fallback());
    }

    #[test]
    fn test_recovers_after_syntax_fix() {
        let input = r"\left( a & b \right) \nonumber";
        let renderer = MathRenderer::new(Picky::new(&["&"]));
        let rendered = renderer.render(input, false);

        let direct = MathRenderer::new(Picky::new(&["&"])).render(&fix_syntax(input), false);
        assert_eq!(rendered.markup, direct.markup);
        assert_eq!(rendered.report.attempt_count(), 2);
        assert_eq!(rendered.report.succeeded_stage(), Some(2));
    }

    #[test]
    fn test_recovers_after_layout_strip() {
        let input = r"\underbrace{x}_{a}_{b}";
        let renderer = MathRenderer::new(Picky::new(&["underbrace"]));
        let rendered = renderer.render(input, false);
        assert_eq!(rendered.markup, format!("<m>{}</m>", strip_layout(input)));
        assert_eq!(rendered.report.succeeded_stage(), Some(3));
    }

    #[test]
    fn test_fallback_uses_raw_source_and_same_display_mode() {
        let engine = Picky::new(&["\\bad"]);
        let renderer = MathRenderer::new(engine);
        let rendered = renderer.render(r" \bad & x ", true);

        assert_eq!(rendered.markup, r"<err> \bad & x </err>");
        assert!(rendered.report.used_fallback());
        assert_eq!(rendered.report.succeeded_stage(), Some(4));

        let calls = renderer.engine().calls.borrow();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|(_, display, _)| *display));
        assert_eq!(calls[3].2, EngineMode::Lenient);
    }

    #[test]
    fn test_fallback_can_use_sanitized_source() {
        let renderer =
            MathRenderer::with_options(Picky::new(&["\\bad"]), &RenderOptions::forgiving());
        let rendered = renderer.render(r" \bad & x ", false);
        assert_eq!(rendered.markup, r"<err>\bad  x</err>");
    }

    #[test]
    fn test_lenient_failure_still_draws_marker() {
        let mut engine = Picky::new(&["\\bad"]);
        engine.lenient_fails = true;
        let renderer = MathRenderer::new(engine);
        let rendered = renderer.render(r"\bad", false);

        assert!(rendered.markup.contains("math-error"));
        assert!(rendered.markup.contains(r"\bad"));
        assert_eq!(rendered.report.succeeded_stage(), None);
        assert!(rendered.report.used_fallback());
        assert_eq!(
            rendered.report.attempts[3].error.as_deref(),
            Some("backend error: crashed")
        );
    }

    #[test]
    fn test_render_into_replaces_target() {
        let renderer = MathRenderer::new(Picky::new(&[]));
        let mut target = String::from("stale");
        renderer.render_into(&mut target, "a", false);
        renderer.render_into(&mut target, "b", false);
        assert_eq!(target, "<m>b</m>");
    }

    #[test]
    fn test_attempt_records() {
        let renderer = MathRenderer::new(Picky::new(&["&"]));
        let report = renderer.render(" a&b ", false).report;
        assert_eq!(report.attempts[0].source_latex, " a&b ");
        assert_eq!(report.attempts[0].engine_input, " a&b ");
        assert!(!report.attempts[0].succeeded);
        assert_eq!(report.attempts[0].error.as_deref(), Some("parse error: bad &"));
        assert_eq!(report.attempts[1].engine_input, "ab");
        assert!(report.attempts[1].succeeded);
    }
}
