//! WASM bindings for mathtext
//!
//! JavaScript-accessible functions for rendering chat content in the
//! browser. Build with `--no-default-features --features wasm,katex-wasm` to
//! render through the page's KaTeX.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "wasm")]
use crate::{
    diagnostics::{check_latex, DiagnosticLevel},
    split_mixed_content, DefaultEngine, FallbackSource, MathRenderer, MixedRenderer, OutputFormat,
    RenderOptions,
};

/// Render options (exposed to WASM)
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize)]
pub struct WasmRenderOptions {
    /// Draw the layout-stripped source instead of the raw one on failure
    #[serde(default)]
    pub sanitized_fallback: bool,
    /// Run the repair stages before falling back
    #[serde(default = "default_true")]
    pub repair: bool,
    /// Include hidden MathML for screen readers
    #[serde(default)]
    pub mathml: bool,
    /// Error indicator color
    #[serde(default)]
    pub error_color: Option<String>,
}

#[cfg(feature = "wasm")]
fn default_true() -> bool {
    true
}

#[cfg(feature = "wasm")]
impl From<WasmRenderOptions> for RenderOptions {
    fn from(opts: WasmRenderOptions) -> Self {
        let defaults = RenderOptions::default();
        RenderOptions {
            fallback_source: if opts.sanitized_fallback {
                FallbackSource::Sanitized
            } else {
                FallbackSource::Raw
            },
            repair: opts.repair,
            output: if opts.mathml {
                OutputFormat::HtmlAndMathml
            } else {
                OutputFormat::Html
            },
            error_color: opts.error_color.unwrap_or(defaults.error_color),
        }
    }
}

/// Summary of LaTeX check results
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize)]
pub struct CheckSummary {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub infos: Vec<String>,
    pub has_errors: bool,
}

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Render chat content with embedded `$...$` / `$$...$$` formulas
///
/// # Arguments
/// * `input` - free text
/// * `options` - optional `WasmRenderOptions` object
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "renderMixed")]
pub fn render_mixed_wasm(input: &str, options: JsValue) -> String {
    let options: RenderOptions = if options.is_undefined() || options.is_null() {
        RenderOptions::default()
    } else {
        serde_wasm_bindgen::from_value::<WasmRenderOptions>(options)
            .map(RenderOptions::from)
            .unwrap_or_default()
    };
    MixedRenderer::with_options(DefaultEngine::from_options(&options), &options)
        .render_to_string(input)
}

/// Render a single formula (without `$` delimiters)
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "renderMath")]
pub fn render_math_wasm(input: &str, display_mode: bool) -> String {
    MathRenderer::new(DefaultEngine::new())
        .render(input, display_mode)
        .markup
}

/// Split content into text and math segments
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "splitContent")]
pub fn split_content_wasm(input: &str) -> JsValue {
    let segments = split_mixed_content(input).into_segments();
    serde_wasm_bindgen::to_value(&segments).unwrap_or(JsValue::NULL)
}

/// Check LaTeX for OCR artifacts and syntax errors
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "checkLatex")]
pub fn check_latex_wasm(input: &str) -> JsValue {
    let result = check_latex(input);

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut infos = Vec::new();

    for d in &result.diagnostics {
        match d.level {
            DiagnosticLevel::Error => errors.push(d.message.clone()),
            DiagnosticLevel::Warning => warnings.push(d.message.clone()),
            DiagnosticLevel::Info => infos.push(d.message.clone()),
        }
    }

    let summary = CheckSummary {
        errors,
        warnings,
        infos,
        has_errors: result.has_errors(),
    };
    serde_wasm_bindgen::to_value(&summary).unwrap_or(JsValue::NULL)
}

/// Get library version
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "getVersion")]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
