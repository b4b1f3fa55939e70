//! The `nb-book.toml` configuration file.
//!
//! Every section falls back to its defaults, so a file only needs the values it
//! changes. A missing file is the same as an empty one.

use crate::error::ConvertError;
use crate::fonts::FontSource;
use crate::sinks::docx::DocxConfig;
use crate::sinks::pdf::PdfConfig;
use crate::theme::Theme;
use crate::tokenizer::SyntaxConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "nb-book.toml";

/// Complete configuration for an nb-book run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Render cells on the rayon thread pool
    pub parallel: bool,
    /// Tried in order until one loads
    pub fonts: Vec<FontSource>,
    pub theme: Theme,
    pub syntax: SyntaxConfig,
    pub pdf: PdfConfig,
    pub docx: DocxConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            parallel: true,
            fonts: default_fonts(),
            theme: Theme::default(),
            syntax: SyntaxConfig::default(),
            pdf: PdfConfig::default(),
            docx: DocxConfig::default(),
        }
    }
}

fn default_fonts() -> Vec<FontSource> {
    vec![
        FontSource::Directory {
            path: PathBuf::from("fonts"),
        },
        FontSource::Fallback,
    ]
}

impl Configuration {
    /// Reject values that would make rendering or assembly impossible.
    pub fn validate(&self) -> Result<(), ConvertError> {
        self.theme.validate()?;
        self.pdf
            .validate()
            .map_err(|reason| ConvertError::Config {
                section: "pdf",
                reason,
            })?;
        self.docx
            .validate()
            .map_err(|reason| ConvertError::Config {
                section: "docx",
                reason,
            })?;
        Ok(())
    }

    /// Load a configuration file, using the defaults when it doesn't exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Configuration> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("{} not found, using default configuration", path.display());
            return Ok(Configuration::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to load {} contents", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .with_context(|| "Failed to convert configuration to TOML")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}
