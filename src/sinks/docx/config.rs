//! DOCX output configuration.
//!
//! Mirrors the PDF configuration where the two overlap. Page geometry is in twips
//! (1/1440 inch) because that is what the section properties are written in, and the
//! size buckets are in pixels at 96 dpi.

use crate::sinks::sizing::{self, SizeBucket, DOCX_SIZE_BUCKETS};
use serde::{Deserialize, Serialize};

/// Core properties written to `docProps/core.xml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Author recorded as the document creator. Empty string for none.
    pub creator: String,
    /// Language tag (BCP 47, e.g. "en", "en-GB").
    pub language: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            creator: String::new(),
            language: "en".to_string(),
        }
    }
}

/// DOCX output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocxConfig {
    /// Optional heading paragraph before the first cell
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Space before each paragraph, in twips
    pub spacing_before: u32,
    /// Space after each paragraph, in twips
    pub spacing_after: u32,
    pub page_width_twips: u32,
    pub page_height_twips: u32,
    pub margin_twips: u32,
    /// Display width by source line count, in pixels
    pub size_buckets: Vec<SizeBucket>,
    pub metadata: MetadataConfig,
}

impl Default for DocxConfig {
    fn default() -> Self {
        Self {
            title: None,
            spacing_before: 200,
            spacing_after: 200,
            // A4
            page_width_twips: 11906,
            page_height_twips: 16838,
            margin_twips: 1440,
            size_buckets: DOCX_SIZE_BUCKETS.to_vec(),
            metadata: MetadataConfig::default(),
        }
    }
}

impl DocxConfig {
    pub fn validate(&self) -> Result<(), String> {
        let margins = self.margin_twips.saturating_mul(2);
        if margins >= self.page_width_twips || margins >= self.page_height_twips {
            return Err(format!(
                "margins of {} twips leave no room on a {}x{} twip page",
                self.margin_twips, self.page_width_twips, self.page_height_twips
            ));
        }
        sizing::validate(&self.size_buckets)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn can_serialize_docx_config() {
        let docx = DocxConfig {
            title: Some("Report".to_string()),
            ..DocxConfig::default()
        };
        let toml_str = toml::to_string(&docx).expect("can serialize DOCX config to TOML");
        let back: DocxConfig = toml::from_str(&toml_str).expect("can deserialize DOCX config");
        assert_eq!(back, docx);
    }

    #[test]
    fn default_has_no_title() {
        let docx: DocxConfig = toml::from_str("").expect("can deserialize empty DOCX config");
        assert_eq!(docx.title, None);
        docx.validate().expect("default config is valid");
    }

    #[test]
    fn rejects_oversized_margins() {
        let docx = DocxConfig {
            margin_twips: 6000,
            ..DocxConfig::default()
        };
        assert!(docx.validate().is_err());
    }
}
