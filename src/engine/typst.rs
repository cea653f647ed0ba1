//! Typst backend
//!
//! Converts LaTeX math into Typst math markup with mitex. The converter is
//! forgiving by nature, so strict mode first runs [`check_latex`] and
//! rejects any input with error-level diagnostics, including unpaired
//! `\left`/`\right` that mitex would turn into an unclosed `lr(`.
//!
//! ```rust
//! use mathtext::engine::{EngineMode, MathEngine, TypstEngine};
//!
//! let engine = TypstEngine::new();
//! assert!(engine.render(r"\frac{1}{2", false, EngineMode::Strict).is_err());
//! assert!(engine.render(r"\frac{1}{2", false, EngineMode::Lenient).is_ok());
//! assert!(engine.render(r"\left( x", false, EngineMode::Strict).is_err());
//! ```

use super::{EngineError, EngineMode, MathEngine};
use crate::core::options::RenderOptions;
use crate::utils::diagnostics::check_latex;

/// Typst math markup renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypstEngine {
    error_color: String,
}

impl Default for TypstEngine {
    fn default() -> Self {
        Self::from_options(&RenderOptions::default())
    }
}

impl TypstEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &RenderOptions) -> Self {
        Self {
            error_color: options.error_color.clone(),
        }
    }

    fn convert(&self, latex: &str, display_mode: bool) -> Result<String, EngineError> {
        let body = mitex::convert_math(latex, None)
            .map_err(|err| EngineError::parse(err.to_string()))?;
        let body = body.trim();

        // Typst treats `$ x $` (padded) as block math and `$x$` as inline
        Ok(if display_mode {
            format!("$ {} $", body)
        } else {
            format!("${}$", body)
        })
    }
}

impl MathEngine for TypstEngine {
    fn name(&self) -> &'static str {
        "typst"
    }

    fn render(
        &self,
        latex: &str,
        display_mode: bool,
        mode: EngineMode,
    ) -> Result<String, EngineError> {
        match mode {
            EngineMode::Strict => {
                if let Some(diag) = check_latex(latex).first_error() {
                    return Err(EngineError::parse(diag.message.clone()));
                }
                self.convert(latex, display_mode)
            }
            EngineMode::Lenient => match self.convert(latex, display_mode) {
                Ok(markup) => Ok(markup),
                Err(err) => Ok(self.error_markup(latex, &err.to_string(), display_mode)),
            },
        }
    }

    fn error_markup(&self, latex: &str, _message: &str, display_mode: bool) -> String {
        let marker = format!(
            "#text(fill: rgb(\"{}\"))[{}]",
            self.error_color,
            escape_typst(latex)
        );
        if display_mode {
            format!("#align(center)[{}]", marker)
        } else {
            marker
        }
    }

    fn escape_text(&self, text: &str) -> String {
        escape_typst(text)
    }
}

/// Escape characters with markup meaning in Typst
pub fn escape_typst(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(
            c,
            '\\' | '#' | '$' | '*' | '_' | '`' | '<' | '>' | '@' | '[' | ']' | '~' | '/'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst(r"a_b #x [y]"), r"a\_b \#x \[y\]");
        assert_eq!(escape_typst(r"\frac"), r"\\frac");
    }

    #[test]
    fn test_inline_and_display_wrapping() {
        let engine = TypstEngine::new();
        let inline = engine.render("x", false, EngineMode::Strict).unwrap();
        assert!(inline.starts_with('$') && !inline.starts_with("$ "));

        let display = engine.render("x", true, EngineMode::Strict).unwrap();
        assert!(display.starts_with("$ ") && display.ends_with(" $"));
    }

    #[test]
    fn test_strict_rejects_unbalanced_braces() {
        let err = TypstEngine::new()
            .render(r"x^{2", false, EngineMode::Strict)
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_strict_rejects_unpaired_sizing() {
        let engine = TypstEngine::new();
        assert!(engine
            .render(r"\left[ a", true, EngineMode::Strict)
            .is_err());
        assert!(engine
            .render(r"\left( a \right)", true, EngineMode::Strict)
            .is_ok());
    }

    #[test]
    fn test_error_markup_uses_color() {
        let engine = TypstEngine::from_options(&RenderOptions {
            error_color: "#0000ff".to_string(),
            ..RenderOptions::default()
        });
        assert_eq!(
            engine.error_markup("x_", "unused", false),
            "#text(fill: rgb(\"#0000ff\"))[x\\_]"
        );
        assert!(engine.error_markup("x", "unused", true).starts_with("#align"));
    }
}
