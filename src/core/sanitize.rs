//! LaTeX sanitizers for OCR-produced math
//!
//! Upstream OCR frequently emits LaTeX that a typesetting engine rejects:
//! equation-numbering commands outside an equation environment, unbalanced
//! `\left`/`\right` pairs, stray alignment markers, and structural wrappers
//! such as `\underbrace` or `array` that collide with neighbouring scripts.
//!
//! The sanitizers here are pure `&str -> String` transforms. They are applied
//! by the render ladder only after the raw string failed to render:
//!
//! - [`fix_syntax`]: drops `\nonumber`, `\left`, `\right` and `&`
//! - [`strip_layout`]: [`fix_syntax`] plus `\underbrace` collapse and
//!   `array` unwrapping
//!
//! ## Example
//!
//! ```rust
//! use mathtext::sanitize::{fix_syntax, strip_layout};
//!
//! assert_eq!(fix_syntax(r"\left( x \right) \nonumber"), "( x )");
//! assert_eq!(strip_layout(r"\underbrace{x+1}_{\text{sum}}"), "x+1");
//! ```

use std::borrow::Cow;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `\nonumber`, `\left`, `\right` as whole commands (`\leftarrow` survives)
    static ref SYNTAX_COMMANDS: Regex = Regex::new(r"\\(?:nonumber|left|right)\b").unwrap();

    /// `\underbrace{X}` with up to two trailing script groups
    static ref UNDERBRACE: Regex = Regex::new(
        r"\\underbrace\s*\{([^{}]*)\}(?:\s*[_^]\s*(?:\{(?:[^{}]|\{[^{}]*\})*\}|[^\s{}\\])){0,2}"
    ).unwrap();

    /// `\begin{array}{cols}`, optionally with a position argument
    static ref ARRAY_BEGIN: Regex = Regex::new(
        r"\\begin\s*\{array\}\s*(?:\[[^\]]*\]\s*)?\{[^{}]*\}"
    ).unwrap();

    static ref ARRAY_END: Regex = Regex::new(r"\\end\s*\{array\}").unwrap();
}

/// Repair the most common OCR artifacts without losing visible symbols.
///
/// Removes every `\nonumber`, `\left` and `\right` command and every `&`
/// alignment marker, then trims surrounding whitespace.
pub fn fix_syntax(input: &str) -> String {
    let without_commands = SYNTAX_COMMANDS.replace_all(input, "");
    without_commands.replace('&', "").trim().to_string()
}

/// Strip layout constructs that syntax fixing alone cannot repair.
///
/// Applies [`fix_syntax`] first, then collapses `\underbrace{X}` (with any
/// trailing sub/superscript) to `X` and removes `array` environment
/// wrappers while keeping their content.
pub fn strip_layout(input: &str) -> String {
    let fixed = fix_syntax(input);
    let collapsed = UNDERBRACE.replace_all(&fixed, "${1}");
    let unwrapped = ARRAY_BEGIN.replace_all(&collapsed, "");
    let unwrapped = ARRAY_END.replace_all(&unwrapped, "");
    unwrapped.trim().to_string()
}

/// Input transform applied by a ladder stage before calling the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    /// Hand the string to the engine unchanged
    Raw,
    /// [`fix_syntax`]
    SyntaxFix,
    /// [`strip_layout`]
    LayoutStrip,
}

impl Transform {
    /// Apply the transform, borrowing the input when nothing changes
    pub fn apply<'a>(&self, input: &'a str) -> Cow<'a, str> {
        match self {
            Transform::Raw => Cow::Borrowed(input),
            Transform::SyntaxFix => Cow::Owned(fix_syntax(input)),
            Transform::LayoutStrip => Cow::Owned(strip_layout(input)),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Raw => write!(f, "raw"),
            Transform::SyntaxFix => write!(f, "syntax-fix"),
            Transform::LayoutStrip => write!(f, "layout-strip"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fix_syntax_drops_numbering_and_sizing() {
        assert_eq!(
            fix_syntax(r"\left[ a+b \right] = c \nonumber"),
            "[ a+b ] = c"
        );
    }

    #[test]
    fn test_fix_syntax_drops_alignment_markers() {
        assert_eq!(fix_syntax(r"x &= 1 \\ y &= 2"), r"x = 1 \\ y = 2");
    }

    #[test]
    fn test_fix_syntax_keeps_arrow_commands() {
        assert_eq!(
            fix_syntax(r"a \leftarrow b \rightarrow c"),
            r"a \leftarrow b \rightarrow c"
        );
    }

    #[test]
    fn test_fix_syntax_trims() {
        assert_eq!(fix_syntax("  x^2 \n"), "x^2");
        assert_eq!(fix_syntax(r"\nonumber"), "");
    }

    #[test]
    fn test_strip_layout_underbrace_with_subscript() {
        assert_eq!(strip_layout(r"\underbrace{x+1}_{\text{sum}}"), "x+1");
    }

    #[test]
    fn test_strip_layout_underbrace_scripts() {
        assert_eq!(strip_layout(r"\underbrace{a}_{n}^{2} + b"), "a + b");
        assert_eq!(strip_layout(r"\underbrace{a}_n"), "a");
        assert_eq!(strip_layout(r"\underbrace{a}"), "a");
    }

    #[test]
    fn test_strip_layout_array() {
        assert_eq!(strip_layout(r"\begin{array}{cc}a&b\end{array}"), "ab");
        assert_eq!(
            strip_layout(r"\left\{\begin{array}[t]{l} x \end{array}\right."),
            r"\{ x ."
        );
    }

    #[test]
    fn test_strip_layout_includes_syntax_fix() {
        assert_eq!(
            strip_layout(r"\left( \underbrace{x}_{1} \right) \nonumber"),
            "( x )"
        );
    }

    #[test]
    fn test_strip_layout_leaves_nested_underbrace_content() {
        // content with braces is outside the collapse rule
        let input = r"\underbrace{\frac{a}{b}}_{c}";
        assert_eq!(strip_layout(input), input);
    }

    #[test]
    fn test_transform_apply() {
        assert!(matches!(Transform::Raw.apply(" a&b "), Cow::Borrowed(" a&b ")));
        assert_eq!(Transform::SyntaxFix.apply(" a&b "), "ab");
        assert_eq!(
            Transform::LayoutStrip.apply(r"\begin{array}{c}a\end{array}"),
            "a"
        );
    }
}
