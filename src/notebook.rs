//! Notebook data model and ipynb ingestion.
//!
//! A notebook is an ordered list of cells and that order is document order. The
//! ipynb format stores a cell's source either as one string or as an array of
//! line-broken strings; both are accepted and kept as an array of fragments which
//! are joined with no separator before use.

use crate::error::NotebookError;
use serde::Deserialize;

/// Kind of a notebook cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellKind {
    Code,
    Markdown,
    /// Raw cells and anything newer than this tool knows about. Ignored downstream.
    Other(String),
}

impl From<&str> for CellKind {
    fn from(cell_type: &str) -> Self {
        match cell_type {
            "code" => CellKind::Code,
            "markdown" => CellKind::Markdown,
            other => CellKind::Other(other.to_string()),
        }
    }
}

/// One unit of notebook content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    /// Source fragments as stored in the notebook, usually one per line with the
    /// trailing newline included.
    pub source: Vec<String>,
}

impl Cell {
    pub fn code<I, S>(source: I) -> Cell
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Cell {
            kind: CellKind::Code,
            source: source.into_iter().map(Into::into).collect(),
        }
    }

    pub fn markdown<I, S>(source: I) -> Cell
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Cell {
            kind: CellKind::Markdown,
            source: source.into_iter().map(Into::into).collect(),
        }
    }

    /// The cell's source fragments joined into one block.
    pub fn text(&self) -> String {
        self.source.concat()
    }

    /// True for code cells whose joined source is empty or whitespace only.
    pub fn is_blank_code(&self) -> bool {
        self.kind == CellKind::Code && self.source.iter().all(|s| s.trim().is_empty())
    }
}

/// An ordered sequence of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    /// `metadata.title`, when the notebook carries one.
    pub title: Option<String>,
}

impl Notebook {
    pub fn new(cells: Vec<Cell>) -> Notebook {
        Notebook { cells, title: None }
    }

    /// Parse an ipynb document.
    ///
    /// Only `cells[].cell_type` and `cells[].source` are interpreted; outputs,
    /// execution counts and attachments are ignored.
    pub fn from_json(json: &str) -> Result<Notebook, NotebookError> {
        let raw: RawNotebook = serde_json::from_str(json)?;
        Ok(raw.into())
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Notebook, NotebookError> {
        let raw: RawNotebook = serde_json::from_slice(bytes)?;
        Ok(raw.into())
    }

    pub fn code_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| c.kind == CellKind::Code).count()
    }
}

#[derive(Deserialize)]
struct RawNotebook {
    cells: Vec<RawCell>,
    #[serde(default)]
    metadata: RawMetadata,
}

#[derive(Deserialize, Default)]
struct RawMetadata {
    #[serde(default)]
    title: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawCell {
    cell_type: String,
    #[serde(default)]
    source: RawSource,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSource {
    Lines(Vec<String>),
    Text(String),
}

impl Default for RawSource {
    fn default() -> Self {
        RawSource::Lines(Vec::new())
    }
}

impl From<RawNotebook> for Notebook {
    fn from(raw: RawNotebook) -> Self {
        let cells = raw
            .cells
            .into_iter()
            .map(|cell| Cell {
                kind: CellKind::from(cell.cell_type.as_str()),
                source: match cell.source {
                    RawSource::Lines(lines) => lines,
                    RawSource::Text(text) => vec![text],
                },
            })
            .collect();
        Notebook {
            cells,
            title: raw
                .metadata
                .title
                .as_ref()
                .and_then(serde_json::Value::as_str)
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string),
        }
    }
}
