//! Turn Jupyter notebooks into PDF or DOCX documents.
//!
//! Each code cell is tokenized, laid out and painted onto its own canvas as a
//! window-like panel with a header bar, line numbers and coloured code. The resulting
//! images are then stacked into a PDF, or interleaved with the notebook's markdown as
//! plain paragraphs in a DOCX package.
//!
//! ```no_run
//! use nb_book::{convert, fonts, Configuration, ConvertOptions, Notebook, OutputKind};
//!
//! # fn main() -> anyhow::Result<()> {
//! let notebook = Notebook::from_slice(&std::fs::read("analysis.ipynb")?)?;
//! let config = Configuration::default();
//! let face = fonts::resolve(&config.fonts, &config.theme.font_family)?;
//! let assembled = convert(&notebook, OutputKind::Pdf, &config, &face, &ConvertOptions::default())?;
//! std::fs::write("analysis.pdf", assembled.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fonts;
pub mod notebook;
pub mod pipeline;
pub mod rendering;
pub mod sinks;
pub mod theme;
pub mod tokenizer;

pub use config::Configuration;
pub use notebook::{Cell, CellKind, Notebook};
pub use pipeline::{CancelFlag, ConvertOptions};
pub use sinks::{convert, convert_with, Assembled, OutputKind, RenderStats};
