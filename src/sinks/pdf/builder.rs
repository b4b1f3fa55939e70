//! A small page-stream builder over `pdf_writer`.
//!
//! The builder owns the whole document while it is being assembled. Pages are closed
//! as soon as the next one starts, and [`PdfBuilder::finish`] consumes the builder to
//! write the page tree, catalog and info dictionary, so a document can only ever be
//! finalised once. Dropping a builder without finishing it discards everything.

use super::text::to_winansi;
use crate::error::RenderError;
use crate::rendering::RasterImage;
use chrono::{DateTime, Datelike, Timelike, Utc};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, Str, TextStr};
use std::io::Write;

/// Resource name of the single text font.
const FONT_NAME: &[u8] = b"F1";

/// An image XObject that has been written to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    name: String,
    id: Ref,
}

/// Values for the document info dictionary.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

struct OpenPage {
    id: Ref,
    content: Content,
    images: Vec<ImageHandle>,
    uses_font: bool,
}

pub struct PdfBuilder {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    page_tree_id: Ref,
    font_id: Option<Ref>,
    page_size: (f32, f32),
    pages: Vec<Ref>,
    current: Option<OpenPage>,
    image_count: usize,
}

impl PdfBuilder {
    pub fn new(page_width: f32, page_height: f32) -> PdfBuilder {
        PdfBuilder {
            pdf: Pdf::new(),
            next_id: 3,
            catalog_id: Ref::new(1),
            page_tree_id: Ref::new(2),
            font_id: None,
            page_size: (page_width, page_height),
            pages: Vec::new(),
            current: None,
            image_count: 0,
        }
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Number of pages started so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Close the current page (if any) and start a fresh one.
    pub fn new_page(&mut self) {
        self.close_page();
        let page = self.open_page();
        self.current = Some(page);
    }

    fn open_page(&mut self) -> OpenPage {
        let id = self.alloc();
        self.pages.push(id);
        OpenPage {
            id,
            content: Content::new(),
            images: Vec::new(),
            uses_font: false,
        }
    }

    fn page(&mut self) -> &mut OpenPage {
        let page = match self.current.take() {
            Some(page) => page,
            None => self.open_page(),
        };
        self.current.insert(page)
    }

    fn close_page(&mut self) {
        let Some(page) = self.current.take() else {
            return;
        };
        let content_id = self.alloc();
        self.pdf.stream(content_id, &page.content.finish());

        let (width, height) = self.page_size;
        let mut writer = self.pdf.page(page.id);
        writer
            .media_box(Rect::new(0.0, 0.0, width, height))
            .parent(self.page_tree_id)
            .contents(content_id);
        let mut resources = writer.resources();
        if page.uses_font {
            if let Some(font_id) = self.font_id {
                resources.fonts().pair(Name(FONT_NAME), font_id);
            }
        }
        if !page.images.is_empty() {
            let mut x_objects = resources.x_objects();
            for image in &page.images {
                x_objects.pair(Name(image.name.as_bytes()), image.id);
            }
        }
    }

    /// Write `image` as a Flate-compressed RGB XObject with an alpha soft mask.
    pub fn add_image(&mut self, image: &RasterImage) -> Result<ImageHandle, RenderError> {
        let (rgb, alpha) = image.split_rgb_alpha();
        let rgb = deflate(&rgb)?;
        let alpha = deflate(&alpha)?;
        let (width, height) = (image.width() as i32, image.height() as i32);

        let mask_id = self.alloc();
        let mut mask = self.pdf.image_xobject(mask_id, &alpha);
        mask.filter(Filter::FlateDecode);
        mask.width(width);
        mask.height(height);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        drop(mask);

        let id = self.alloc();
        let mut xobject = self.pdf.image_xobject(id, &rgb);
        xobject.filter(Filter::FlateDecode);
        xobject.width(width);
        xobject.height(height);
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        xobject.s_mask(mask_id);
        drop(xobject);

        self.image_count += 1;
        Ok(ImageHandle {
            name: format!("Im{}", self.image_count),
            id,
        })
    }

    /// Place an image with its top-left corner `top` points below the top of the page.
    pub fn draw_image(&mut self, image: &ImageHandle, x: f32, top: f32, width: f32, height: f32) {
        let y = self.page_size.1 - top - height;
        let page = self.page();
        page.content.save_state();
        page.content.transform([width, 0.0, 0.0, height, x, y]);
        page.content.x_object(Name(image.name.as_bytes()));
        page.content.restore_state();
        if !page.images.contains(image) {
            page.images.push(image.clone());
        }
    }

    /// Show `text` in Helvetica with its baseline `baseline` points below the page top.
    pub fn draw_text(&mut self, text: &str, size: f32, x: f32, baseline: f32) {
        if self.font_id.is_none() {
            let id = self.alloc();
            self.pdf
                .type1_font(id)
                .base_font(Name(b"Helvetica"))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            self.font_id = Some(id);
        }
        let y = self.page_size.1 - baseline;
        let encoded = to_winansi(text);
        let page = self.page();
        page.content.begin_text();
        page.content.set_fill_gray(0.0);
        page.content.set_font(Name(FONT_NAME), size);
        page.content.next_line(x, y);
        page.content.show(Str(&encoded));
        page.content.end_text();
        page.uses_font = true;
    }

    /// Close the last page, write the document structure and return the bytes.
    pub fn finish(mut self, info: &DocumentInfo) -> Vec<u8> {
        if self.pages.is_empty() {
            self.new_page();
        }
        self.close_page();

        let page_count = self.pages.len() as i32;
        self.pdf
            .pages(self.page_tree_id)
            .kids(self.pages.iter().copied())
            .count(page_count);
        self.pdf.catalog(self.catalog_id).pages(self.page_tree_id);

        let info_id = self.alloc();
        let mut dict = self.pdf.document_info(info_id);
        if let Some(title) = &info.title {
            dict.title(TextStr(title));
        }
        if let Some(author) = &info.author {
            dict.author(TextStr(author));
        }
        dict.creator(TextStr(concat!("nb-book ", env!("CARGO_PKG_VERSION"))));
        if let Some(created) = info.created {
            dict.creation_date(pdf_date(created));
        }
        drop(dict);

        self.pdf.finish()
    }
}

fn pdf_date(at: DateTime<Utc>) -> Date {
    Date::new(at.year().clamp(0, 9999) as u16)
        .month(at.month() as u8)
        .day(at.day() as u8)
        .hour(at.hour() as u8)
        .minute(at.minute() as u8)
        .second(at.second() as u8)
        .utc_offset_hour(0)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, RenderError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| RenderError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::TextFace;
    use crate::notebook::Cell;
    use crate::rendering::{CellImageProducer, CellImages};
    use crate::theme::Theme;
    use crate::tokenizer::Tokenizer;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn empty_document_still_has_a_page() {
        let bytes = PdfBuilder::new(612.0, 792.0).finish(&DocumentInfo::default());
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(count(&bytes, b"/Type /Page\n"), 1);
    }

    #[test]
    fn can_place_images_across_pages() {
        let theme = Theme::default();
        let face = TextFace::fallback();
        let tokenizer = Tokenizer::default();
        let image = CellImageProducer::new(&theme, &face, &tokenizer)
            .produce(&Cell::code(["x = 1\n"]))
            .expect("can produce image");

        let mut builder = PdfBuilder::new(612.0, 792.0);
        builder.draw_text("Title", 24.0, 50.0, 74.0);
        let handle = builder.add_image(&image).expect("can add image");
        builder.draw_image(&handle, 50.0, 100.0, 400.0, 100.0);
        builder.new_page();
        builder.draw_image(&handle, 50.0, 50.0, 400.0, 100.0);
        assert_eq!(builder.page_count(), 2);

        let bytes = builder.finish(&DocumentInfo {
            title: Some("Title".to_string()),
            ..DocumentInfo::default()
        });
        assert_eq!(count(&bytes, b"/Subtype /Image"), 2);
        assert_eq!(count(&bytes, b"/Im1 Do"), 2);
        assert_eq!(count(&bytes, b"/BaseFont /Helvetica"), 1);
        assert!(bytes.ends_with(b"%%EOF") || bytes.ends_with(b"%%EOF\n"));
    }
}
