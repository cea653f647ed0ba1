//! Render options
//!
//! Options are plain data with sensible defaults. With the `config` feature
//! they can also be read from a TOML file:
//!
//! ```toml
//! fallback_source = "raw"
//! repair = true
//! output = "html"
//! error_color = "#cc0000"
//! ```

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::utils::error::MathTextError;

/// Source string drawn by the final, error-displaying ladder stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum FallbackSource {
    /// The original, unsanitized input (shows the user what was sent)
    #[default]
    Raw,
    /// The layout-stripped input
    Sanitized,
}

impl FromStr for FallbackSource {
    type Err = MathTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(FallbackSource::Raw),
            "sanitized" => Ok(FallbackSource::Sanitized),
            other => Err(MathTextError::invalid_option(format!(
                "unknown fallback source '{}' (expected raw or sanitized)",
                other
            ))),
        }
    }
}

/// Markup flavour requested from markup-producing engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OutputFormat {
    /// Visual HTML only
    #[default]
    Html,
    /// MathML only
    Mathml,
    /// HTML plus hidden MathML for accessibility
    HtmlAndMathml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Html => write!(f, "html"),
            OutputFormat::Mathml => write!(f, "mathml"),
            OutputFormat::HtmlAndMathml => write!(f, "html-and-mathml"),
        }
    }
}

/// Options for math rendering
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct RenderOptions {
    /// Source drawn by the error-displaying fallback stage
    /// Default: raw
    pub fallback_source: FallbackSource,

    /// Run the syntax-fix and layout-strip stages before falling back
    /// Default: true
    pub repair: bool,

    /// Markup flavour
    /// Default: html
    pub output: OutputFormat,

    /// Color of engine-drawn error indicators
    /// Default: `#cc0000`
    pub error_color: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            fallback_source: FallbackSource::Raw,
            repair: true,
            output: OutputFormat::Html,
            error_color: "#cc0000".to_string(),
        }
    }
}

impl RenderOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Render input as written: no repair stages, raw fallback
    pub fn strict_source() -> Self {
        Self {
            repair: false,
            ..Self::default()
        }
    }

    /// Prefer the repaired source even when drawing the error indicator
    pub fn forgiving() -> Self {
        Self {
            fallback_source: FallbackSource::Sanitized,
            ..Self::default()
        }
    }

    /// Parse options from TOML text
    #[cfg(feature = "config")]
    pub fn from_toml_str(input: &str) -> Result<Self, MathTextError> {
        toml::from_str(input).map_err(|err| MathTextError::config("<inline>", err.to_string()))
    }

    /// Load options from a TOML file
    #[cfg(feature = "config")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, MathTextError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|err| MathTextError::config(path, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = RenderOptions::new();
        assert_eq!(opts.fallback_source, FallbackSource::Raw);
        assert!(opts.repair);
        assert_eq!(opts.output, OutputFormat::Html);
        assert_eq!(opts.error_color, "#cc0000");
    }

    #[test]
    fn test_presets() {
        assert!(!RenderOptions::strict_source().repair);
        assert_eq!(
            RenderOptions::forgiving().fallback_source,
            FallbackSource::Sanitized
        );
    }

    #[test]
    fn test_fallback_source_from_str() {
        assert_eq!("raw".parse::<FallbackSource>().ok(), Some(FallbackSource::Raw));
        assert_eq!(
            "sanitized".parse::<FallbackSource>().ok(),
            Some(FallbackSource::Sanitized)
        );
        assert!("stripped".parse::<FallbackSource>().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_fallback_source_cli_values() {
        use clap::ValueEnum;

        let names: Vec<_> = FallbackSource::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["raw", "sanitized"]);
        assert_eq!(
            <FallbackSource as ValueEnum>::from_str("sanitized", false),
            Ok(FallbackSource::Sanitized)
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_toml_partial() {
        let opts = RenderOptions::from_toml_str(
            "fallback_source = \"sanitized\"\noutput = \"html-and-mathml\"\n",
        )
        .unwrap();
        assert_eq!(opts.fallback_source, FallbackSource::Sanitized);
        assert_eq!(opts.output, OutputFormat::HtmlAndMathml);
        assert!(opts.repair);
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_toml_rejects_unknown_fields() {
        let err = RenderOptions::from_toml_str("colour = \"red\"").unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }
}
