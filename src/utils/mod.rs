//! Utility modules
//!
//! - Diagnostics and error reporting for LaTeX sources
//! - Error types and result types

pub mod diagnostics;
pub mod error;

pub use diagnostics::{check_latex, format_diagnostics, CheckResult, Diagnostic, DiagnosticLevel};
pub use error::{EngineError, MathTextError, MathTextResult};
