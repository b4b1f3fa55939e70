//! Writing the OOXML word-processing package.
//!
//! Paragraphs are collected in order and the whole body is serialised in one go when
//! the package is finished, since `word/document.xml` needs the complete section
//! before it can be written. The zip layout is the minimum Word and LibreOffice accept:
//! content types, package and document relationships, the document itself, styles,
//! core and app properties, and one PNG per image under `word/media`.

use super::config::DocxConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::{Cursor, Write};
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// English Metric Units per pixel at 96 dpi.
pub const EMU_PER_PIXEL: u64 = 9525;

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Heading(String),
    Text(String),
    Image {
        media: usize,
        width_emu: u64,
        height_emu: u64,
    },
}

/// An in-memory DOCX document under construction.
pub struct DocxPackage<'a> {
    config: &'a DocxConfig,
    blocks: Vec<Block>,
    media: Vec<Vec<u8>>,
}

impl<'a> DocxPackage<'a> {
    pub fn new(config: &'a DocxConfig) -> Self {
        DocxPackage {
            config,
            blocks: Vec::new(),
            media: Vec::new(),
        }
    }

    pub fn push_heading(&mut self, text: &str) {
        self.blocks.push(Block::Heading(text.to_string()));
    }

    /// Append a plain text paragraph. Line breaks inside `text` are kept.
    pub fn push_text(&mut self, text: &str) {
        self.blocks.push(Block::Text(text.to_string()));
    }

    /// Append a paragraph holding a PNG image shown at `width` x `height` pixels.
    pub fn push_image(&mut self, png: Vec<u8>, width: f32, height: f32) {
        self.media.push(png);
        self.blocks.push(Block::Image {
            media: self.media.len(),
            width_emu: to_emu(width),
            height_emu: to_emu(height),
        });
    }

    pub fn paragraph_count(&self) -> usize {
        self.blocks.len()
    }

    /// Serialise every part and return the zipped package.
    pub fn finish(self, title: Option<&str>, created: DateTime<Utc>) -> ZipResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        // PNG data is already compressed
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        zip.start_file("[Content_Types].xml", deflated)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;
        zip.start_file("_rels/.rels", deflated)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;
        zip.start_file("word/document.xml", deflated)?;
        zip.write_all(self.document_xml().as_bytes())?;
        zip.start_file("word/_rels/document.xml.rels", deflated)?;
        zip.write_all(self.document_rels().as_bytes())?;
        zip.start_file("word/styles.xml", deflated)?;
        zip.write_all(STYLES.as_bytes())?;
        for (i, png) in self.media.iter().enumerate() {
            zip.start_file(format!("word/media/image{}.png", i + 1), stored)?;
            zip.write_all(png)?;
        }
        zip.start_file("docProps/core.xml", deflated)?;
        zip.write_all(self.core_xml(title, created).as_bytes())?;
        zip.start_file("docProps/app.xml", deflated)?;
        zip.write_all(APP.as_bytes())?;

        Ok(zip.finish()?.into_inner())
    }

    fn paragraph_properties(&self, style: Option<&str>) -> String {
        let style = style
            .map(|s| format!(r#"<w:pStyle w:val="{s}"/>"#))
            .unwrap_or_default();
        format!(
            r#"<w:pPr>{style}<w:spacing w:before="{}" w:after="{}"/></w:pPr>"#,
            self.config.spacing_before, self.config.spacing_after
        )
    }

    fn document_xml(&self) -> String {
        let mut body = String::new();
        for block in &self.blocks {
            match block {
                Block::Heading(text) => {
                    body.push_str("<w:p>");
                    body.push_str(&self.paragraph_properties(Some("Title")));
                    body.push_str(&text_run(text));
                    body.push_str("</w:p>");
                }
                Block::Text(text) => {
                    body.push_str("<w:p>");
                    body.push_str(&self.paragraph_properties(None));
                    body.push_str(&text_run(text));
                    body.push_str("</w:p>");
                }
                Block::Image {
                    media,
                    width_emu,
                    height_emu,
                } => {
                    body.push_str("<w:p>");
                    body.push_str(&self.paragraph_properties(None));
                    body.push_str(&drawing_run(*media, *width_emu, *height_emu));
                    body.push_str("</w:p>");
                }
            }
        }

        let c = self.config;
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                "<w:body>{body}",
                r#"<w:sectPr><w:pgSz w:w="{w}" w:h="{h}"/>"#,
                r#"<w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="720" w:footer="720" w:gutter="0"/>"#,
                "</w:sectPr></w:body></w:document>"
            ),
            body = body,
            w = c.page_width_twips,
            h = c.page_height_twips,
            m = c.margin_twips,
        )
    }

    fn document_rels(&self) -> String {
        let mut rels = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        ));
        for i in 1..=self.media.len() {
            rels.push_str(&format!(
                r#"<Relationship Id="rIdImage{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image{i}.png"/>"#
            ));
        }
        rels.push_str("</Relationships>");
        rels
    }

    fn core_xml(&self, title: Option<&str>, created: DateTime<Utc>) -> String {
        let mut props = String::new();
        if let Some(title) = title {
            props.push_str(&format!("<dc:title>{}</dc:title>", escape(title)));
        }
        let creator = self.config.metadata.creator.trim();
        if !creator.is_empty() {
            props.push_str(&format!("<dc:creator>{}</dc:creator>", escape(creator)));
        }
        let language = self.config.metadata.language.trim();
        if !language.is_empty() {
            props.push_str(&format!("<dc:language>{}</dc:language>", escape(language)));
        }
        let created = created.to_rfc3339_opts(SecondsFormat::Secs, true);
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
                r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
                r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
                "{props}",
                r#"<dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created>"#,
                r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{created}</dcterms:modified>"#,
                "</cp:coreProperties>"
            ),
            props = props,
            created = created,
        )
    }
}

fn to_emu(px: f32) -> u64 {
    (px.max(1.0).round() as u64) * EMU_PER_PIXEL
}

/// Escape text for XML content, dropping characters XML 1.0 cannot carry.
fn escape(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|&c| (c == '\t' || !c.is_control()) && c != '\u{FFFE}' && c != '\u{FFFF}')
        .collect();
    html_escape::encode_text(&cleaned).into_owned()
}

fn text_run(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape(line)))
        .collect();
    format!("<w:r>{}</w:r>", lines.join("<w:br/>"))
}

fn drawing_run(media: usize, cx: u64, cy: u64) -> String {
    format!(
        concat!(
            "<w:r><w:drawing>",
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Code cell {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="image{id}.png"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="rIdImage{id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
            "</pic:pic></a:graphicData></a:graphic></wp:inline>",
            "</w:drawing></w:r>"
        ),
        id = media,
        cx = cx,
        cy = cy,
    )
}

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Default Extension="png" ContentType="image/png"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
    r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
    r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
    "</Types>"
);

const PACKAGE_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
    r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>"#,
    "</Relationships>"
);

const STYLES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/>"#,
    r#"<w:rPr><w:sz w:val="22"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/>"#,
    r#"<w:pPr><w:jc w:val="center"/></w:pPr><w:rPr><w:b/><w:sz w:val="48"/></w:rPr></w:style>"#,
    "</w:styles>"
);

const APP: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
    "<Application>nb-book</Application>",
    "</Properties>"
);
