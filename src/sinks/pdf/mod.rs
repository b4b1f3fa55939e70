//! PDF generation.
//!
//! A single pass over the cells in notebook order: a centred title at the top of the
//! first page, then every produced code-cell image stacked vertically, centred, and
//! sized from the PDF size buckets. Images that would run past the bottom margin start
//! a new page; images larger than the content box are scaled down to fit it.
//!
//! Bucket widths are upper bounds here. On the default Letter page the content box is
//! 512x692pt, so tall cells from the larger buckets end up narrower than their bucket
//! once their height is fitted to the page.
//!
//! Markdown cells are not rendered into the PDF. They are counted as skipped.

mod builder;
mod config;
mod text;

pub use builder::{DocumentInfo, ImageHandle, PdfBuilder};
pub use config::PdfConfig;

use super::{sizing, Assembled, RenderStats};
use crate::error::{CellError, ConvertError};
use crate::notebook::Notebook;
use crate::pipeline::CellResults;

/// Helvetica ascender, as a fraction of the em size.
const TITLE_ASCENT: f32 = 0.718;
const TITLE_LINE_HEIGHT: f32 = 1.2;

/// Build a PDF from the notebook and its produced cell images.
pub fn assemble(
    notebook: &Notebook,
    results: CellResults,
    config: &PdfConfig,
) -> Result<Assembled, ConvertError> {
    let mut builder = PdfBuilder::new(config.page_width_pt, config.page_height_pt);
    let (content_width, content_height) = config.content_size();
    let margin = config.margin_pt;
    let bottom = margin + content_height;
    let mut stats = RenderStats::default();
    let mut placements = Vec::new();

    builder.new_page();
    let mut cursor = margin;

    if !config.title.trim().is_empty() {
        let size = config.font_size_title_pt;
        let width = text::helvetica_width(&config.title, size);
        let x = margin + ((content_width - width) / 2.0).max(0.0);
        builder.draw_text(&config.title, size, x, cursor + size * TITLE_ASCENT);
        cursor += size * TITLE_LINE_HEIGHT + config.title_gap_pt;
    }

    for (index, result) in results.into_iter().enumerate() {
        let image = match result {
            Ok(image) => image,
            Err(CellError::Skipped(_)) => {
                stats.skipped += 1;
                continue;
            }
            Err(CellError::Failed(_)) => {
                stats.failed += 1;
                continue;
            }
        };

        let target = sizing::width_for(&config.size_buckets, image.source_line_count())
            .ok_or_else(|| ConvertError::Config {
                section: "pdf",
                reason: "no size buckets".to_string(),
            })?;
        let aspect = image.aspect_ratio();
        let mut width = target.min(content_width);
        let mut height = width / aspect;
        if height > content_height {
            height = content_height;
            width = height * aspect;
        }

        let handle = match builder.add_image(&image) {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!("skipping cell {index}: {e}");
                stats.failed += 1;
                continue;
            }
        };

        if cursor + height > bottom && cursor > margin {
            builder.new_page();
            cursor = margin;
        }
        let x = margin + (content_width - width) / 2.0;
        builder.draw_image(&handle, x, cursor, width, height);
        cursor += height + config.spacing_pt;

        placements.push(index);
        stats.images += 1;
    }

    stats.pages = Some(builder.page_count());
    let info = DocumentInfo {
        title: notebook.title.clone().or_else(|| Some(config.title.clone())),
        author: config.author.clone(),
        created: Some(chrono::Utc::now()),
    };
    let bytes = builder.finish(&info);
    log::info!(
        "assembled PDF: {} images on {} pages, {} skipped, {} failed",
        stats.images,
        stats.pages.unwrap_or_default(),
        stats.skipped,
        stats.failed
    );

    Ok(Assembled {
        bytes,
        stats,
        placements,
    })
}
