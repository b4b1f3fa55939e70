//! Font resolution for measuring and drawing code.
//!
//! There is no process-wide font registry. The caller lists [`FontSource`]s in the
//! order it prefers them and [`resolve`] returns the first one that loads as a
//! [`TextFace`]. The built-in [`FontSource::Fallback`] face needs no font files at
//! all, which keeps rendering deterministic in tests and on bare machines.

use crate::error::FontError;
use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use owned_ttf_parser::name_id;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use unicode_width::UnicodeWidthChar;

/// Somewhere a code font can be loaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontSource {
    /// A single TrueType/OpenType file.
    File { path: PathBuf },
    /// A directory scanned for a face whose family matches the theme's font family.
    Directory { path: PathBuf },
    /// Font bytes supplied by the caller.
    #[serde(skip)]
    Embedded(Arc<[u8]>),
    /// Fixed-advance placeholder face that always loads.
    Fallback,
}

impl FontSource {
    /// Load this source as a face, matching `family` where the source is a directory.
    pub fn load(&self, family: &str) -> Result<TextFace, FontError> {
        match self {
            FontSource::File { path } => {
                let data = read_font(path)?;
                TextFace::from_bytes(data, &path.display().to_string())
            }
            FontSource::Directory { path } => load_from_directory(path, family),
            FontSource::Embedded(data) => TextFace::from_bytes(data.to_vec(), "embedded font"),
            FontSource::Fallback => Ok(TextFace::fallback()),
        }
    }
}

/// Try each source in order and return the first face that loads.
pub fn resolve(sources: &[FontSource], family: &str) -> Result<TextFace, FontError> {
    for source in sources {
        match source.load(family) {
            Ok(face) => {
                log::debug!("resolved font `{family}` using {source:?}");
                return Ok(face);
            }
            Err(e) => log::warn!("skipping font source: {e}"),
        }
    }
    Err(FontError::Exhausted)
}

fn read_font(path: &Path) -> Result<Vec<u8>, FontError> {
    std::fs::read(path).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(std::ffi::OsStr::to_str)
        .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
}

fn normalise_family(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// The family names a font file declares in its `name` table.
fn family_names(data: &[u8]) -> Vec<String> {
    match owned_ttf_parser::Face::parse(data, 0) {
        Ok(face) => face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::FAMILY)
            .filter_map(|name| name.to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn load_from_directory(dir: &Path, family: &str) -> Result<TextFace, FontError> {
    let entries = std::fs::read_dir(dir).map_err(|source| FontError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    // sorted so the same directory always yields the same face
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_font_file(p))
        .collect();
    paths.sort();

    let wanted = normalise_family(family);
    // regular weights first: "SourceCodePro-Regular.ttf" over "SourceCodePro-Bold.ttf"
    paths.sort_by_key(|p| {
        let stem = p
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        !stem.contains("regular")
    });

    for path in paths {
        let stem_matches = path
            .file_stem()
            .map(|s| normalise_family(&s.to_string_lossy()).starts_with(&wanted))
            .unwrap_or_default();

        let data = match read_font(&path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("{e}");
                continue;
            }
        };
        let family_matches = family_names(&data)
            .iter()
            .any(|name| normalise_family(name) == wanted);

        if family_matches || stem_matches {
            return TextFace::from_bytes(data, &path.display().to_string());
        }
    }

    Err(FontError::NotFound {
        family: family.to_string(),
        dir: dir.to_path_buf(),
    })
}

#[derive(Debug)]
enum FaceKind {
    Outline(FontVec),
    Fallback,
}

/// A loaded face used for both measurement and glyph coverage.
///
/// Sizes are em sizes in pixels, so a 14px face has 14px between em-square edges no
/// matter how the font's ascender and descender are balanced.
#[derive(Debug)]
pub struct TextFace {
    kind: FaceKind,
}

/// Advance of one fallback cell, as a fraction of the em size.
const FALLBACK_ADVANCE: f32 = 0.6;
/// Fallback ascent, as a fraction of the em size.
const FALLBACK_ASCENT: f32 = 0.8;

impl TextFace {
    pub fn fallback() -> TextFace {
        TextFace {
            kind: FaceKind::Fallback,
        }
    }

    pub fn from_bytes(data: Vec<u8>, origin: &str) -> Result<TextFace, FontError> {
        let font = FontVec::try_from_vec(data).map_err(|_| FontError::Invalid(origin.to_string()))?;
        Ok(TextFace {
            kind: FaceKind::Outline(font),
        })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.kind, FaceKind::Fallback)
    }

    fn px_scale(font: &FontVec, size: f32) -> PxScale {
        let upem = font.units_per_em().unwrap_or(1000.0);
        PxScale::from(size * font.height_unscaled() / upem)
    }

    /// Horizontal advance of `text` set at `size`.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        match &self.kind {
            FaceKind::Outline(font) => {
                let scaled = font.as_scaled(Self::px_scale(font, size));
                let mut width = 0.0;
                let mut previous = None;
                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(prev) = previous {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    previous = Some(id);
                }
                width
            }
            FaceKind::Fallback => {
                let cells: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
                cells as f32 * FALLBACK_ADVANCE * size
            }
        }
    }

    /// Distance from the top of a line box to the baseline at `size`.
    pub fn ascent(&self, size: f32) -> f32 {
        match &self.kind {
            FaceKind::Outline(font) => font.as_scaled(Self::px_scale(font, size)).ascent(),
            FaceKind::Fallback => FALLBACK_ASCENT * size,
        }
    }

    /// Rasterise `text` with its line box top-left at (`x`, `top`).
    ///
    /// `plot` receives absolute pixel coordinates and a coverage in `0.0..=1.0`. It may
    /// be called with coordinates outside any canvas. Returns the advance width.
    pub fn draw_text<F>(&self, text: &str, size: f32, x: f32, top: f32, mut plot: F) -> f32
    where
        F: FnMut(i32, i32, f32),
    {
        let baseline = top + self.ascent(size);
        match &self.kind {
            FaceKind::Outline(font) => {
                let scale = Self::px_scale(font, size);
                let scaled = font.as_scaled(scale);
                let mut caret = x;
                let mut previous = None;
                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(prev) = previous {
                        caret += scaled.kern(prev, id);
                    }
                    let glyph = id.with_scale_and_position(scale, point(caret, baseline));
                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();
                        let (left, upper) = (bounds.min.x as i32, bounds.min.y as i32);
                        outlined.draw(|gx, gy, coverage| {
                            plot(left + gx as i32, upper + gy as i32, coverage)
                        });
                    }
                    caret += scaled.h_advance(id);
                    previous = Some(id);
                }
                caret - x
            }
            FaceKind::Fallback => {
                let advance = FALLBACK_ADVANCE * size;
                let glyph_top = (baseline - 0.7 * size).round() as i32;
                let glyph_bottom = baseline.round() as i32;
                let mut caret = x;
                for c in text.chars() {
                    let cells = c.width().unwrap_or(0) as f32;
                    if !c.is_whitespace() && cells > 0.0 {
                        let left = (caret + 0.1 * advance).round() as i32;
                        let right = (caret + cells * advance - 0.1 * advance).round() as i32;
                        for py in glyph_top..glyph_bottom {
                            for px in left..right {
                                plot(px, py, 1.0);
                            }
                        }
                    }
                    caret += cells * advance;
                }
                caret - x
            }
        }
    }
}

impl Default for TextFace {
    fn default() -> Self {
        TextFace::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_face_measures_by_cell_width() {
        let face = TextFace::fallback();
        assert_eq!(face.text_width("", 14.0), 0.0);
        assert!((face.text_width("abcd", 10.0) - 24.0).abs() < 1e-4);
        // wide characters occupy two cells
        assert!((face.text_width("漢", 10.0) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn fallback_draw_matches_measurement() {
        let face = TextFace::fallback();
        let mut plotted = 0;
        let advance = face.draw_text("a b", 10.0, 5.0, 0.0, |_, _, _| plotted += 1);
        assert!((advance - face.text_width("a b", 10.0)).abs() < 1e-4);
        assert!(plotted > 0);

        let mut plotted = 0;
        face.draw_text("   ", 10.0, 0.0, 0.0, |_, _, _| plotted += 1);
        assert_eq!(plotted, 0);
    }

    #[test]
    fn resolve_walks_sources_in_order() {
        let missing = FontSource::File {
            path: PathBuf::from("/definitely/not/here.ttf"),
        };
        let face = resolve(&[missing.clone(), FontSource::Fallback], "SourceCodePro")
            .expect("can resolve with fallback");
        assert!(face.is_fallback());

        assert!(matches!(
            resolve(&[missing], "SourceCodePro"),
            Err(FontError::Exhausted)
        ));
        assert!(matches!(resolve(&[], "x"), Err(FontError::Exhausted)));
    }

    #[test]
    fn rejects_garbage_font_data() {
        let source = FontSource::Embedded(Arc::from(&b"not a font"[..]));
        assert!(matches!(source.load("x"), Err(FontError::Invalid(_))));
    }

    #[test]
    fn directory_without_match_reports_family() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        std::fs::write(dir.path().join("notes.txt"), "not a font").expect("can write file");
        std::fs::write(dir.path().join("Broken-Regular.ttf"), "junk").expect("can write file");

        let err = FontSource::Directory {
            path: dir.path().to_path_buf(),
        }
        .load("SourceCodePro")
        .expect_err("no matching face");
        assert!(matches!(err, FontError::NotFound { ref family, .. } if family == "SourceCodePro"));
    }

    #[test]
    fn can_serialize_font_sources() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            fonts: Vec<FontSource>,
        }
        let wrapper = Wrapper {
            fonts: vec![
                FontSource::Directory {
                    path: PathBuf::from("fonts"),
                },
                FontSource::Fallback,
            ],
        };
        let toml_str = toml::to_string(&wrapper).expect("can serialize font sources");
        let back: Wrapper = toml::from_str(&toml_str).expect("can deserialize font sources");
        assert_eq!(back.fonts, wrapper.fonts);
    }

    #[test]
    fn family_names_normalise() {
        assert_eq!(normalise_family("Source Code Pro"), "sourcecodepro");
        assert_eq!(normalise_family("SourceCodePro"), "sourcecodepro");
        assert_eq!(normalise_family("Fira_Mono-Regular"), "firamonoregular");
    }
}
