//! Canvas geometry for one code cell.

use crate::fonts::TextFace;
use crate::theme::Theme;

/// Dimensions and column positions computed from a cell's lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Width of the gutter: the widest line number plus the theme margin.
    pub line_number_width: f32,
    /// Left edge of the code column.
    pub code_start_x: f32,
    /// Number of lines actually drawn, after the line cap.
    pub visible_lines: usize,
}

impl Layout {
    /// Lay out `lines` with `face` metrics.
    ///
    /// Over-long lines never widen the canvas past `max_width`; they are clipped at the
    /// canvas edge instead of wrapped.
    pub fn compute<S: AsRef<str>>(lines: &[S], theme: &Theme, face: &TextFace) -> Layout {
        let line_count = lines.len();
        let number_label = line_count.max(1).to_string();
        let line_number_width =
            finite_or_zero(face.text_width(&number_label, theme.font_size)) + theme.line_number_margin;

        let content_width = lines
            .iter()
            .map(|line| finite_or_zero(face.text_width(line.as_ref(), theme.font_size)))
            .fold(0.0f32, f32::max)
            .max(theme.min_content_width);

        let natural = 2.0 * theme.padding + line_number_width + content_width;
        // max then min rather than clamp, which panics on inverted bounds
        let canvas_width = natural
            .max(theme.min_width as f32)
            .min(theme.max_width as f32)
            .ceil() as u32;

        let visible_lines = line_count.min(theme.line_cap);
        let canvas_height = (2.0 * theme.padding
            + theme.header_height
            + visible_lines as f32 * theme.line_height)
            .ceil()
            .max(1.0) as u32;

        Layout {
            canvas_width,
            canvas_height,
            line_number_width,
            code_start_x: theme.padding + line_number_width,
            visible_lines,
        }
    }

    /// Top edge of the line box for the zero-based line `index`.
    pub fn line_top(&self, index: usize, theme: &Theme) -> f32 {
        theme.header_height + theme.padding + index as f32 * theme.line_height
    }
}

fn finite_or_zero(width: f32) -> f32 {
    if width.is_finite() && width >= 0.0 {
        width
    } else {
        0.0
    }
}
