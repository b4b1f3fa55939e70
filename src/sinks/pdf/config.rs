use crate::sinks::sizing::{self, SizeBucket, PDF_SIZE_BUCKETS};
use serde::{Deserialize, Serialize};

/// PDF output configuration.
///
/// Lengths are in points. The default page is US Letter with a uniform 50pt margin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Centred heading at the top of the first page
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_title_size")]
    pub font_size_title_pt: f32,
    /// Gap between the title and the first image
    #[serde(default = "default_title_gap")]
    pub title_gap_pt: f32,
    #[serde(default = "default_page_width")]
    pub page_width_pt: f32,
    #[serde(default = "default_page_height")]
    pub page_height_pt: f32,
    #[serde(default = "default_margin")]
    pub margin_pt: f32,
    /// Vertical gap left after each image
    #[serde(default = "default_spacing")]
    pub spacing_pt: f32,
    /// Author written to the document info dictionary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Display width by source line count
    #[serde(default = "default_size_buckets")]
    pub size_buckets: Vec<SizeBucket>,
}

fn default_title() -> String {
    "Notebook Code Cells".to_string()
}
fn default_title_size() -> f32 {
    24.0
}
fn default_title_gap() -> f32 {
    48.0
}
fn default_page_width() -> f32 {
    612.0
}
fn default_page_height() -> f32 {
    792.0
}
fn default_margin() -> f32 {
    50.0
}
fn default_spacing() -> f32 {
    24.0
}
fn default_size_buckets() -> Vec<SizeBucket> {
    PDF_SIZE_BUCKETS.to_vec()
}

impl Default for PdfConfig {
    fn default() -> Self {
        PdfConfig {
            title: default_title(),
            font_size_title_pt: default_title_size(),
            title_gap_pt: default_title_gap(),
            page_width_pt: default_page_width(),
            page_height_pt: default_page_height(),
            margin_pt: default_margin(),
            spacing_pt: default_spacing(),
            size_buckets: default_size_buckets(),
            author: None,
        }
    }
}

impl PdfConfig {
    /// Width and height of the area inside the margins.
    pub fn content_size(&self) -> (f32, f32) {
        (
            self.page_width_pt - 2.0 * self.margin_pt,
            self.page_height_pt - 2.0 * self.margin_pt,
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        let (w, h) = self.content_size();
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(format!(
                "margins of {}pt leave no room on a {}x{}pt page",
                self.margin_pt, self.page_width_pt, self.page_height_pt
            ));
        }
        sizing::validate(&self.size_buckets)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn can_serialize_pdf_config() {
        let pdf = PdfConfig::default();
        let toml_str = toml::to_string(&pdf).expect("can serialize PDF config to TOML");
        let back: PdfConfig = toml::from_str(&toml_str).expect("can deserialize PDF config");
        assert_eq!(back, pdf);
    }

    #[test]
    fn empty_table_gets_defaults() {
        let pdf: PdfConfig = toml::from_str("").expect("can deserialize empty PDF config");
        assert_eq!(pdf, PdfConfig::default());
        assert_eq!(pdf.content_size(), (512.0, 692.0));
    }

    #[test]
    fn rejects_oversized_margins() {
        let pdf = PdfConfig {
            margin_pt: 400.0,
            ..PdfConfig::default()
        };
        assert!(pdf.validate().is_err());
        PdfConfig::default().validate().expect("default config is valid");
    }
}
