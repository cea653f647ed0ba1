//! LaTeX diagnostics for OCR-produced math
//!
//! This module inspects a LaTeX math string using the mitex-parser's AST and
//! a few source scans. It reports:
//!
//! - Syntax errors (parser error tokens, unbalanced braces, unbalanced
//!   environments, unpaired `\left`/`\right`)
//! - OCR artifacts the render ladder repairs (`\nonumber`, stray `&`,
//!   `\underbrace`, `array`)
//! - Commands the browser engine does not support
//!
//! ## Example
//!
//! ```rust
//! use mathtext::diagnostics::check_latex;
//!
//! let result = check_latex(r"x &= y");
//! assert_eq!(result.warnings, 1);
//!
//! assert!(check_latex(r"\frac{1}{2").has_errors());
//! assert!(check_latex(r"\left( y").has_errors());
//! ```

use mitex_parser::syntax::{SyntaxElement, SyntaxKind, SyntaxNode};
use mitex_parser::CommandSpec;
use mitex_spec_gen::DEFAULT_SPEC;
use std::fmt;

use fxhash::FxHashMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Command specification for parsing
    static ref SPEC: CommandSpec = {
        let commands: FxHashMap<String, _> = DEFAULT_SPEC
            .items()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        CommandSpec::new(commands)
    };

    /// Commands with a known fate in the render ladder or the engine
    static ref ARTIFACT_COMMANDS: FxHashMap<&'static str, (DiagnosticLevel, &'static str)> = {
        let mut m = FxHashMap::default();
        m.insert(
            "nonumber",
            (DiagnosticLevel::Info, "'\\nonumber' is dropped by syntax repair"),
        );
        m.insert(
            "underbrace",
            (DiagnosticLevel::Info, "'\\underbrace' is collapsed to its body by layout stripping"),
        );
        m.insert(
            "label",
            (DiagnosticLevel::Warning, "'\\label' is not supported inside math"),
        );
        m.insert(
            "intertext",
            (DiagnosticLevel::Warning, "'\\intertext' is not supported inside math"),
        );
        m
    };

    static ref LEFT_CMD: Regex = Regex::new(r"\\left\b").unwrap();
    static ref RIGHT_CMD: Regex = Regex::new(r"\\right\b").unwrap();
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// Informational note
    Info,
    /// Warning - rendering may need a repair stage
    Warning,
    /// Error - strict rendering will fail
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level
    pub level: DiagnosticLevel,
    /// Human-readable message
    pub message: String,
    /// Line number (1-indexed)
    pub line: Option<usize>,
    /// Column number (1-indexed)
    pub column: Option<usize>,
    /// Relevant source text
    pub source_text: Option<String>,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            line: None,
            column: None,
            source_text: None,
            suggestion: None,
        }
    }

    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_source(mut self, text: impl Into<String>) -> Self {
        self.source_text = Some(text.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)?;

        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, "\n  --> line {}:{}", line, col)?;
        }

        if let Some(ref source) = self.source_text {
            write!(f, "\n  |\n  | {}", source)?;
        }

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  = help: {}", suggestion)?;
        }

        Ok(())
    }
}

/// Check result with summary
#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub diagnostics: Vec<Diagnostic>,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl CheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diag: Diagnostic) {
        match diag.level {
            DiagnosticLevel::Error => self.errors += 1,
            DiagnosticLevel::Warning => self.warnings += 1,
            DiagnosticLevel::Info => self.infos += 1,
        }
        self.diagnostics.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// First error-level diagnostic, if any
    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.diagnostics
            .iter()
            .find(|d| d.level == DiagnosticLevel::Error)
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.errors > 0 {
            parts.push(plural(self.errors, "error"));
        }
        if self.warnings > 0 {
            parts.push(plural(self.warnings, "warning"));
        }
        if self.infos > 0 {
            parts.push(plural(self.infos, "note"));
        }
        if parts.is_empty() {
            "no issues found".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn plural(count: usize, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" })
}

/// Check a LaTeX math string for issues
pub fn check_latex(input: &str) -> CheckResult {
    let mut result = CheckResult::new();
    let line_offsets = compute_line_offsets(input);

    let tree = mitex_parser::parse(input, SPEC.clone());
    check_node(&tree, &line_offsets, &mut result);

    check_brace_balance(input, &line_offsets, &mut result);
    check_environment_balance(input, &line_offsets, &mut result);
    check_sizing_pairs(input, &mut result);
    check_alignment_markers(input, &line_offsets, &mut result);

    result
}

/// Compute byte offsets for each line start
fn compute_line_offsets(input: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    for (i, c) in input.char_indices() {
        if c == '\n' {
            offsets.push(i + 1);
        }
    }
    offsets
}

/// Convert byte offset to 1-indexed line and column
fn offset_to_location(offset: usize, line_offsets: &[usize]) -> (usize, usize) {
    let line = line_offsets
        .iter()
        .position(|&o| o > offset)
        .unwrap_or(line_offsets.len())
        - 1;

    let column = offset - line_offsets.get(line).unwrap_or(&0) + 1;
    (line + 1, column)
}

fn check_node(node: &SyntaxNode, line_offsets: &[usize], result: &mut CheckResult) {
    for child in node.children_with_tokens() {
        match child.kind() {
            SyntaxKind::TokenError => {
                let text = match &child {
                    SyntaxElement::Token(t) => t.text().to_string(),
                    SyntaxElement::Node(n) => n.text().to_string(),
                };
                let offset = child.text_range().start().into();
                let (line, col) = offset_to_location(offset, line_offsets);

                result.add(
                    Diagnostic::new(
                        DiagnosticLevel::Error,
                        format!("syntax error: unexpected '{}'", text),
                    )
                    .with_location(line, col)
                    .with_source(text),
                );
            }
            SyntaxKind::ItemCmd => {
                if let SyntaxElement::Node(cmd_node) = &child {
                    check_command(cmd_node, line_offsets, result);
                }
            }
            SyntaxKind::ItemEnv => {
                if let SyntaxElement::Node(env_node) = &child {
                    check_environment(env_node, line_offsets, result);
                }
            }
            _ => {
                if let SyntaxElement::Node(n) = child {
                    check_node(&n, line_offsets, result);
                }
            }
        }
    }
}

fn check_command(node: &SyntaxNode, line_offsets: &[usize], result: &mut CheckResult) {
    let text = node.text().to_string();
    let cmd_name = text
        .trim_start_matches('\\')
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or("");

    if let Some((level, message)) = ARTIFACT_COMMANDS.get(cmd_name) {
        let offset: usize = node.text_range().start().into();
        let (line, col) = offset_to_location(offset, line_offsets);
        result.add(
            Diagnostic::new(*level, *message)
                .with_location(line, col)
                .with_source(format!("\\{}", cmd_name)),
        );
    }

    check_node(node, line_offsets, result);
}

fn check_environment(node: &SyntaxNode, line_offsets: &[usize], result: &mut CheckResult) {
    let text = node.text().to_string();

    let notes = [
        (
            "array",
            "'array' wrappers are removed by layout stripping, keeping the cells",
        ),
        (
            "eqnarray",
            "'eqnarray' is not supported; alignment markers are dropped by syntax repair",
        ),
    ];

    for (env_name, message) in notes {
        if text.contains(&format!("\\begin{{{}}}", env_name)) {
            let offset: usize = node.text_range().start().into();
            let (line, col) = offset_to_location(offset, line_offsets);
            result.add(
                Diagnostic::new(DiagnosticLevel::Info, message)
                    .with_location(line, col)
                    .with_source(format!("\\begin{{{}}}", env_name)),
            );
        }
    }

    check_node(node, line_offsets, result);
}

fn check_brace_balance(input: &str, line_offsets: &[usize], result: &mut CheckResult) {
    let mut depth = 0i32;
    let mut last_open_line = 0;
    let mut escaped = false;

    for (offset, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => {
                if depth == 0 {
                    last_open_line = offset_to_location(offset, line_offsets).0;
                }
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth < 0 {
                    let (line, col) = offset_to_location(offset, line_offsets);
                    result.add(
                        Diagnostic::new(DiagnosticLevel::Error, "unmatched closing brace '}'")
                            .with_location(line, col)
                            .with_suggestion("Check for missing opening brace"),
                    );
                    depth = 0;
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        result.add(
            Diagnostic::new(
                DiagnosticLevel::Error,
                format!(
                    "{} (opened around line {})",
                    plural(depth as usize, "unclosed brace"),
                    last_open_line
                ),
            )
            .with_suggestion("Check for missing closing brace '}'"),
        );
    }
}

fn check_environment_balance(input: &str, line_offsets: &[usize], result: &mut CheckResult) {
    let mut env_stack: Vec<(String, usize)> = Vec::new();

    let mut pos = 0;
    while pos < input.len() {
        let rest = &input[pos..];
        let next_begin = rest.find(r"\begin{");
        let next_end = rest.find(r"\end{");

        let (rel, is_begin) = match (next_begin, next_end) {
            (Some(b), Some(e)) if b < e => (b, true),
            (_, Some(e)) => (e, false),
            (Some(b), None) => (b, true),
            (None, None) => break,
        };

        let abs_pos = pos + rel;
        let name_start = abs_pos + if is_begin { 7 } else { 5 };
        let Some(close) = input[name_start..].find('}') else {
            break;
        };
        let env_name = &input[name_start..name_start + close];
        let (line, col) = offset_to_location(abs_pos, line_offsets);

        if is_begin {
            env_stack.push((env_name.to_string(), line));
        } else {
            match env_stack.pop() {
                Some((open_name, open_line)) if open_name != env_name => {
                    result.add(
                        Diagnostic::new(
                            DiagnosticLevel::Error,
                            format!(
                                "mismatched environment: opened '{}' at line {}, \
                                 closed '{}' at line {}",
                                open_name, open_line, env_name, line
                            ),
                        )
                        .with_location(line, col)
                        .with_suggestion(format!("Use \\end{{{}}}", open_name)),
                    );
                }
                Some(_) => {}
                None => {
                    result.add(
                        Diagnostic::new(
                            DiagnosticLevel::Error,
                            format!("unmatched \\end{{{}}}", env_name),
                        )
                        .with_location(line, col)
                        .with_suggestion("Check for missing \\begin"),
                    );
                }
            }
        }

        pos = name_start + close + 1;
    }

    for (env_name, line) in env_stack {
        result.add(
            Diagnostic::new(
                DiagnosticLevel::Error,
                format!(
                    "unclosed environment '{}' (opened at line {})",
                    env_name, line
                ),
            )
            .with_suggestion(format!("Add \\end{{{}}}", env_name)),
        );
    }
}

fn check_sizing_pairs(input: &str, result: &mut CheckResult) {
    let lefts = LEFT_CMD.find_iter(input).count();
    let rights = RIGHT_CMD.find_iter(input).count();

    if lefts != rights {
        result.add(
            Diagnostic::new(
                DiagnosticLevel::Error,
                format!(
                    "unpaired sizing commands: {} \\left, {} \\right",
                    lefts, rights
                ),
            )
            .with_suggestion("Syntax repair drops \\left and \\right"),
        );
    }
}

fn check_alignment_markers(input: &str, line_offsets: &[usize], result: &mut CheckResult) {
    if input.contains(r"\begin{") {
        return;
    }

    let mut prev = None;
    for (offset, c) in input.char_indices() {
        if c == '&' && prev != Some('\\') {
            let (line, col) = offset_to_location(offset, line_offsets);
            result.add(
                Diagnostic::new(
                    DiagnosticLevel::Warning,
                    "alignment marker '&' outside an alignment environment",
                )
                .with_location(line, col)
                .with_suggestion("Syntax repair drops '&'"),
            );
            return;
        }
        prev = Some(c);
    }
}

/// Format check results for terminal output
pub fn format_diagnostics(result: &CheckResult, use_color: bool) -> String {
    let mut output = String::new();

    for diag in &result.diagnostics {
        if use_color {
            let color = match diag.level {
                DiagnosticLevel::Error => "\x1b[31m",
                DiagnosticLevel::Warning => "\x1b[33m",
                DiagnosticLevel::Info => "\x1b[34m",
            };
            output.push_str(color);
            output.push_str(&diag.to_string());
            output.push_str("\x1b[0m\n\n");
        } else {
            output.push_str(&format!("{}\n\n", diag));
        }
    }

    if use_color {
        if result.has_errors() {
            output.push_str("\x1b[31m");
        } else if result.warnings > 0 {
            output.push_str("\x1b[33m");
        } else {
            output.push_str("\x1b[32m");
        }
    }

    output.push_str(&format!("Summary: {}", result.summary()));

    if use_color {
        output.push_str("\x1b[0m");
    }

    output
}
