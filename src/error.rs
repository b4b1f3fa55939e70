//! Error types for notebook conversion.
//!
//! Failures fall into three tiers. [`NotebookError`] is raised while ingesting the
//! notebook JSON, before any rendering happens. [`CellError`] is scoped to a single
//! code cell: the pipeline logs it and leaves the cell out of the document. Everything
//! else surfaces as a [`ConvertError`], which aborts the conversion without returning
//! any bytes.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The notebook could not be read as an ipynb document.
#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("Failed to parse notebook JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A font source could not produce a usable face.
#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Font data in `{0}` is not a valid TrueType/OpenType font")]
    Invalid(String),

    #[error("No font with family `{family}` found in `{}`", dir.display())]
    NotFound { family: String, dir: PathBuf },

    #[error("None of the configured font sources could be loaded")]
    Exhausted,
}

/// A theme holds values the layout engine cannot work with.
#[derive(Error, Debug, PartialEq)]
pub enum ThemeError {
    #[error("Invalid value for theme field `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Invalid colour `{0}`, expected #RRGGBB or #RRGGBBAA")]
    InvalidColour(String),
}

/// Why a cell produced no image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Markdown and unknown cell kinds are never rasterised.
    NotCode,
    /// The joined source is empty once whitespace is trimmed.
    EmptySource,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotCode => write!(f, "not a code cell"),
            SkipReason::EmptySource => write!(f, "code cell has no content"),
        }
    }
}

/// Rasterising one cell failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Failed to allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    #[error("Failed to build {0} path")]
    Path(&'static str),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("{0}")]
    Other(String),
}

/// Outcome of a cell that did not yield an image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellError {
    #[error("Cell skipped: {0}")]
    Skipped(SkipReason),

    #[error("Failed to render cell: {0}")]
    Failed(#[from] RenderError),
}

impl CellError {
    pub fn is_skip(&self) -> bool {
        matches!(self, CellError::Skipped(_))
    }
}

/// Fatal conversion failure. No partial document is ever returned alongside one.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Conversion was cancelled")]
    Cancelled,

    #[error("Invalid theme: {0}")]
    Theme(#[from] ThemeError),

    #[error("Invalid syntax configuration: {0}")]
    Syntax(#[from] regex::Error),

    #[error("Invalid [{section}] configuration: {reason}")]
    Config {
        section: &'static str,
        reason: String,
    },

    #[error("Failed to write DOCX package: {0}")]
    Package(#[from] zip::result::ZipError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_reasons_are_distinguished_from_failures() {
        assert!(CellError::Skipped(SkipReason::EmptySource).is_skip());
        assert!(!CellError::Failed(RenderError::Path("panel")).is_skip());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = ThemeError::InvalidColour("#12".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid colour `#12`, expected #RRGGBB or #RRGGBBAA"
        );
        let err = ConvertError::Config {
            section: "pdf",
            reason: "at least one bucket is required".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid [pdf] configuration: at least one bucket is required"
        );
    }
}
