//! Output documents.
//!
//! [`convert`] is the single entry point: it validates the configuration, produces
//! every cell image through the pipeline and hands the ordered results to the PDF or
//! DOCX assembler. The caller gets back either complete document bytes or an error.

pub mod docx;
pub mod pdf;
pub mod sizing;

use crate::config::Configuration;
use crate::error::ConvertError;
use crate::fonts::TextFace;
use crate::notebook::Notebook;
use crate::pipeline::{self, ConvertOptions};
use crate::rendering::{CellImageProducer, CellImages};
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of document to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Pdf,
    Docx,
}

impl OutputKind {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputKind::Pdf => "pdf",
            OutputKind::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputKind::Pdf => "application/pdf",
            OutputKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputKind::Pdf),
            "docx" => Ok(OutputKind::Docx),
            other => Err(format!("unknown output format `{other}`, expected pdf or docx")),
        }
    }
}

/// Statistics from a conversion, used for user feedback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Code-cell images embedded in the document
    pub images: usize,
    /// Markdown paragraphs written (DOCX only)
    pub text_blocks: usize,
    /// Cells left out on purpose: blank code, and anything the format does not render
    pub skipped: usize,
    /// Cells left out because rendering or embedding failed
    pub failed: usize,
    /// Number of pages, when the format has fixed pages
    pub pages: Option<usize>,
}

/// A finished document.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub bytes: Vec<u8>,
    pub stats: RenderStats,
    /// Notebook index of the cell behind each embedded image, in document order.
    pub placements: Vec<usize>,
}

/// Convert a notebook using the standard cell image producer.
pub fn convert(
    notebook: &Notebook,
    kind: OutputKind,
    config: &Configuration,
    face: &TextFace,
    options: &ConvertOptions,
) -> Result<Assembled, ConvertError> {
    let tokenizer = Tokenizer::new(&config.syntax)?;
    let producer = CellImageProducer::new(&config.theme, face, &tokenizer);
    convert_with(notebook, kind, &producer, config, options)
}

/// Convert a notebook with a caller-supplied producer.
///
/// The configuration is validated before any cell is produced.
pub fn convert_with(
    notebook: &Notebook,
    kind: OutputKind,
    producer: &dyn CellImages,
    config: &Configuration,
    options: &ConvertOptions,
) -> Result<Assembled, ConvertError> {
    config.validate()?;
    let results = pipeline::produce_all(&notebook.cells, producer, options)?;
    match kind {
        OutputKind::Pdf => pdf::assemble(notebook, results, &config.pdf),
        OutputKind::Docx => docx::assemble(notebook, results, &config.docx),
    }
}
