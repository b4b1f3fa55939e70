//! DOCX generation.
//!
//! Markdown cells become plain text paragraphs (no markdown is interpreted) and code
//! cells become image paragraphs, all in notebook order. Image width comes from the
//! DOCX size buckets and height follows the image's aspect ratio.

mod config;
mod package;

pub use config::{DocxConfig, MetadataConfig};
pub use package::{DocxPackage, EMU_PER_PIXEL};

use super::{sizing, Assembled, RenderStats};
use crate::error::{CellError, ConvertError, SkipReason};
use crate::notebook::{CellKind, Notebook};
use crate::pipeline::CellResults;

/// Build a DOCX package from the notebook and its produced cell images.
pub fn assemble(
    notebook: &Notebook,
    results: CellResults,
    config: &DocxConfig,
) -> Result<Assembled, ConvertError> {
    let mut package = DocxPackage::new(config);
    let mut stats = RenderStats::default();
    let mut placements = Vec::new();

    if let Some(title) = config.title.as_deref().filter(|t| !t.trim().is_empty()) {
        package.push_heading(title);
    }

    for (index, (cell, result)) in notebook.cells.iter().zip(results).enumerate() {
        match result {
            Ok(image) => {
                let width = sizing::width_for(&config.size_buckets, image.source_line_count())
                    .ok_or_else(|| ConvertError::Config {
                        section: "docx",
                        reason: "no size buckets".to_string(),
                    })?;
                let height = width / image.aspect_ratio();
                match image.encode_png() {
                    Ok(png) => {
                        package.push_image(png, width, height);
                        placements.push(index);
                        stats.images += 1;
                    }
                    Err(e) => {
                        log::warn!("skipping cell {index}: {e}");
                        stats.failed += 1;
                    }
                }
            }
            Err(CellError::Skipped(SkipReason::NotCode)) if cell.kind == CellKind::Markdown => {
                package.push_text(&cell.text());
                stats.text_blocks += 1;
            }
            Err(CellError::Skipped(_)) => stats.skipped += 1,
            Err(CellError::Failed(_)) => stats.failed += 1,
        }
    }

    let title = notebook.title.as_deref().or(config.title.as_deref());
    let bytes = package.finish(title, chrono::Utc::now())?;
    log::info!(
        "assembled DOCX: {} images, {} text paragraphs, {} skipped, {} failed",
        stats.images,
        stats.text_blocks,
        stats.skipped,
        stats.failed
    );
    Ok(Assembled {
        bytes,
        stats,
        placements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::TextFace;
    use crate::notebook::Cell;
    use crate::pipeline::{produce_all, ConvertOptions};
    use crate::rendering::CellImageProducer;
    use crate::theme::Theme;
    use crate::tokenizer::Tokenizer;
    use std::io::{Cursor, Read};

    fn build(notebook: &Notebook, config: &DocxConfig) -> Assembled {
        let theme = Theme::default();
        let face = TextFace::fallback();
        let tokenizer = Tokenizer::default();
        let producer = CellImageProducer::new(&theme, &face, &tokenizer);
        let results = produce_all(&notebook.cells, &producer, &ConvertOptions::default())
            .expect("can produce cells");
        assemble(notebook, results, config).expect("can assemble DOCX")
    }

    fn document_xml(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("can open package");
        let mut part = archive
            .by_name("word/document.xml")
            .expect("document part exists");
        let mut xml = String::new();
        part.read_to_string(&mut xml).expect("document is utf-8");
        xml
    }

    #[test]
    fn markdown_and_code_keep_notebook_order() {
        let notebook = Notebook::new(vec![
            Cell::markdown(["first note"]),
            Cell::code(["let a = 1;\n"]),
            Cell::markdown(["second note"]),
            Cell::code(["let b = 2;\n", "let c = 3;\n"]),
        ]);
        let assembled = build(&notebook, &DocxConfig::default());
        assert_eq!(assembled.placements, vec![1, 3]);
        assert_eq!(assembled.stats.images, 2);
        assert_eq!(assembled.stats.text_blocks, 2);

        let xml = document_xml(&assembled.bytes);
        let first = xml.find("first note").expect("first note present");
        let image1 = xml.find(r#"r:embed="rIdImage1""#).expect("image 1 present");
        let second = xml.find("second note").expect("second note present");
        let image2 = xml.find(r#"r:embed="rIdImage2""#).expect("image 2 present");
        assert!(first < image1 && image1 < second && second < image2);
        assert_eq!(xml.matches("<w:p>").count(), 4);
    }

    #[test]
    fn single_code_cell_gives_one_image_paragraph() {
        let notebook = Notebook::from_json(
            r##"{"cells": [{"cell_type": "code", "source": ["x = 1\n", "# comment\n"]}]}"##,
        )
        .expect("can parse notebook");
        let assembled = build(&notebook, &DocxConfig::default());

        let xml = document_xml(&assembled.bytes);
        assert_eq!(xml.matches("<w:p>").count(), 1);
        assert_eq!(xml.matches("<w:drawing>").count(), 1);
        assert_eq!(xml.matches("<w:t ").count(), 0);
        // small bucket: 500px wide
        assert!(xml.contains(&format!(r#"<wp:extent cx="{}""#, 500 * EMU_PER_PIXEL)));
    }

    #[test]
    fn blank_code_cells_leave_no_trace() {
        let notebook = Notebook::new(vec![
            Cell::code(["  \n", "\n"]),
            Cell::markdown(["kept"]),
        ]);
        let assembled = build(&notebook, &DocxConfig::default());
        assert_eq!(assembled.stats.images, 0);
        assert_eq!(assembled.stats.skipped, 1);
        let xml = document_xml(&assembled.bytes);
        assert_eq!(xml.matches("<w:p>").count(), 1);
        assert!(!xml.contains("<w:drawing>"));
    }

    #[test]
    fn title_heading_comes_first() {
        let notebook = Notebook::new(vec![Cell::markdown(["intro paragraph"])]);
        let config = DocxConfig {
            title: Some("My Notebook".to_string()),
            ..DocxConfig::default()
        };
        let xml = document_xml(&build(&notebook, &config).bytes);
        let title = xml.find("My Notebook").expect("title present");
        assert!(title < xml.find("intro paragraph").expect("paragraph present"));
        assert!(xml.contains(r#"<w:pStyle w:val="Title"/>"#));
    }
}
