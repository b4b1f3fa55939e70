//! Turning code cells into images.
//!
//! [`CellImageProducer`] runs the tokenizer over every line, lays the cell out once
//! and paints it once. It is also where a cell's failure is contained: anything that
//! goes wrong comes back as a [`CellError`] for that cell alone.

pub mod canvas;
pub mod layout;
pub mod raster;

pub use layout::Layout;
pub use raster::RasterImage;

use crate::error::{CellError, SkipReason};
use crate::fonts::TextFace;
use crate::notebook::{Cell, CellKind};
use crate::theme::Theme;
use crate::tokenizer::{Token, Tokenizer};

/// Width a tab is expanded to before tokenizing.
const TAB_WIDTH: usize = 4;

/// Something that can turn a cell into an image.
///
/// The sinks only see this trait, so a producer can be wrapped or swapped out.
pub trait CellImages: Sync {
    fn produce(&self, cell: &Cell) -> Result<RasterImage, CellError>;
}

/// The standard producer: tokenizer, layout engine and renderer over one theme and face.
pub struct CellImageProducer<'a> {
    theme: &'a Theme,
    face: &'a TextFace,
    tokenizer: &'a Tokenizer,
}

impl<'a> CellImageProducer<'a> {
    pub fn new(theme: &'a Theme, face: &'a TextFace, tokenizer: &'a Tokenizer) -> Self {
        CellImageProducer {
            theme,
            face,
            tokenizer,
        }
    }
}

/// Split a cell's joined source into display lines with tabs expanded.
pub fn source_lines(cell: &Cell) -> Vec<String> {
    cell.text()
        .lines()
        .map(|line| line.replace('\t', &" ".repeat(TAB_WIDTH)))
        .collect()
}

impl CellImages for CellImageProducer<'_> {
    fn produce(&self, cell: &Cell) -> Result<RasterImage, CellError> {
        if cell.kind != CellKind::Code {
            return Err(CellError::Skipped(SkipReason::NotCode));
        }
        if cell.is_blank_code() {
            return Err(CellError::Skipped(SkipReason::EmptySource));
        }

        let lines = source_lines(cell);
        let tokens: Vec<Vec<Token>> = lines
            .iter()
            .take(self.theme.line_cap)
            .map(|line| self.tokenizer.tokenize(line))
            .collect();
        let layout = Layout::compute(&lines, self.theme, self.face);
        log::debug!(
            "cell layout {}x{} for {} lines ({} drawn)",
            layout.canvas_width,
            layout.canvas_height,
            lines.len(),
            layout.visible_lines
        );

        let pixmap = canvas::render(&tokens, &layout, self.theme, self.face)?;
        Ok(RasterImage::new(pixmap, lines.len()))
    }
}
