//! Typesetting engines
//!
//! The render ladder treats the typesetting engine as a pure
//! `latex -> markup` function with two failure modes:
//!
//! - [`EngineMode::Strict`]: malformed input returns `Err`
//! - [`EngineMode::Lenient`]: malformed input renders an in-place error
//!   indicator instead
//!
//! Two backends are provided:
//!
//! - `KatexEngine`: KaTeX HTML/MathML (features `katex` or `katex-wasm`)
//! - [`TypstEngine`]: Typst math markup through mitex

#[cfg(any(feature = "katex", feature = "katex-wasm"))]
pub mod katex;
pub mod typst;

#[cfg(any(feature = "katex", feature = "katex-wasm"))]
pub use self::katex::KatexEngine;
pub use self::typst::TypstEngine;

pub use crate::utils::error::EngineError;

use std::fmt;

/// Engine used by the crate-level convenience functions
#[cfg(any(feature = "katex", feature = "katex-wasm"))]
pub type DefaultEngine = KatexEngine;

/// Engine used by the crate-level convenience functions
#[cfg(not(any(feature = "katex", feature = "katex-wasm")))]
pub type DefaultEngine = TypstEngine;

/// How an engine reports malformed input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineMode {
    /// Fail with an [`EngineError`]
    Strict,
    /// Draw an error indicator in place of the formula
    Lenient,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineMode::Strict => write!(f, "strict"),
            EngineMode::Lenient => write!(f, "lenient"),
        }
    }
}

/// A synchronous, in-memory typesetting engine
pub trait MathEngine {
    /// Short engine name for logs
    fn name(&self) -> &'static str;

    /// Render `latex` to markup.
    ///
    /// Implementations must not keep state between calls and must return
    /// markup only on success, never partial output.
    fn render(&self, latex: &str, display_mode: bool, mode: EngineMode)
        -> Result<String, EngineError>;

    /// Markup drawn when even lenient rendering failed
    fn error_markup(&self, latex: &str, message: &str, display_mode: bool) -> String {
        let tag = if display_mode { "div" } else { "span" };
        format!(
            r#"<{tag} class="math-error" title="{}">{}</{tag}>"#,
            escape_html(message),
            escape_html(latex),
        )
    }

    /// Escape literal text placed between formulas
    fn escape_text(&self, text: &str) -> String {
        escape_html(text)
    }
}

impl<E: MathEngine + ?Sized> MathEngine for &E {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn render(
        &self,
        latex: &str,
        display_mode: bool,
        mode: EngineMode,
    ) -> Result<String, EngineError> {
        (**self).render(latex, display_mode, mode)
    }

    fn error_markup(&self, latex: &str, message: &str, display_mode: bool) -> String {
        (**self).error_markup(latex, message, display_mode)
    }

    fn escape_text(&self, text: &str) -> String {
        (**self).escape_text(text)
    }
}

impl<E: MathEngine + ?Sized> MathEngine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn render(
        &self,
        latex: &str,
        display_mode: bool,
        mode: EngineMode,
    ) -> Result<String, EngineError> {
        (**self).render(latex, display_mode, mode)
    }

    fn error_markup(&self, latex: &str, message: &str, display_mode: bool) -> String {
        (**self).error_markup(latex, message, display_mode)
    }

    fn escape_text(&self, text: &str) -> String {
        (**self).escape_text(text)
    }
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
