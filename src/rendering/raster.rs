//! The rendered bitmap of one code cell.

use crate::error::RenderError;
use tiny_skia::Pixmap;

/// A finished code-cell image.
///
/// Pixels are premultiplied RGBA as painted. The sinks consume the image: PDF takes
/// straight RGB plus an alpha mask, DOCX takes PNG bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixmap: Pixmap,
    source_line_count: usize,
}

impl RasterImage {
    pub(crate) fn new(pixmap: Pixmap, source_line_count: usize) -> RasterImage {
        RasterImage {
            pixmap,
            source_line_count,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Number of lines in the cell's source, including lines past the line cap.
    pub fn source_line_count(&self) -> usize {
        self.source_line_count
    }

    /// Raw premultiplied RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(e.to_string()))
    }

    /// Split into straight RGB samples and a separate 8-bit alpha channel.
    pub fn split_rgb_alpha(&self) -> (Vec<u8>, Vec<u8>) {
        let count = (self.width() * self.height()) as usize;
        let mut rgb = Vec::with_capacity(count * 3);
        let mut alpha = Vec::with_capacity(count);
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            rgb.extend_from_slice(&[c.red(), c.green(), c.blue()]);
            alpha.push(c.alpha());
        }
        (rgb, alpha)
    }
}
