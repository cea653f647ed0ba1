//! KaTeX backend
//!
//! Runs the KaTeX bundle through the `katex` crate. Strict mode maps to
//! `throwOnError: true`; lenient mode lets KaTeX draw its own error span in
//! `error_color`.

use ::katex::{Opts, OptsBuilder, OutputType};

use super::{EngineError, EngineMode, MathEngine};
use crate::core::options::{OutputFormat, RenderOptions};

/// KaTeX HTML/MathML renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KatexEngine {
    output: OutputFormat,
    error_color: String,
}

impl Default for KatexEngine {
    fn default() -> Self {
        Self::from_options(&RenderOptions::default())
    }
}

impl KatexEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &RenderOptions) -> Self {
        Self {
            output: options.output,
            error_color: options.error_color.clone(),
        }
    }

    fn opts(&self, display_mode: bool, mode: EngineMode) -> Result<Opts, EngineError> {
        let mut builder = OptsBuilder::default();
        builder.display_mode(display_mode);
        builder.output_type(output_type(self.output));
        builder.throw_on_error(mode == EngineMode::Strict);
        if mode == EngineMode::Lenient {
            builder.error_color(self.error_color.clone());
        }

        builder
            .build()
            .map_err(|err| EngineError::backend(format!("failed to build KaTeX options: {err}")))
    }
}

impl MathEngine for KatexEngine {
    fn name(&self) -> &'static str {
        "katex"
    }

    fn render(
        &self,
        latex: &str,
        display_mode: bool,
        mode: EngineMode,
    ) -> Result<String, EngineError> {
        let opts = self.opts(display_mode, mode)?;
        ::katex::render_with_opts(latex, opts).map_err(|err| match err {
            ::katex::Error::JsExecError(message) => EngineError::parse(message),
            other => EngineError::backend(other.to_string()),
        })
    }
}

fn output_type(format: OutputFormat) -> OutputType {
    match format {
        OutputFormat::Html => OutputType::Html,
        OutputFormat::Mathml => OutputType::Mathml,
        OutputFormat::HtmlAndMathml => OutputType::HtmlAndMathml,
    }
}
