//! Painting a laid-out code cell onto a raster canvas.
//!
//! Back to front: rounded panel, header bar, header label, window-control dots,
//! gutter separator, then per line the line number followed by each token in its
//! category colour. Glyph coverage is blended straight into the pixmap, so the same
//! inputs always give the same bytes.

use super::layout::Layout;
use crate::error::RenderError;
use crate::fonts::TextFace;
use crate::theme::{Colour, Theme};
use crate::tokenizer::Token;
use tiny_skia::{
    FillRule, Paint, Path, PathBuilder, Pixmap, PremultipliedColorU8, Rect, Transform,
};

/// Paint one cell. `tokens` holds one token list per source line; only the first
/// `layout.visible_lines` are drawn.
pub fn render(
    tokens: &[Vec<Token<'_>>],
    layout: &Layout,
    theme: &Theme,
    face: &TextFace,
) -> Result<Pixmap, RenderError> {
    let (width, height) = (layout.canvas_width, layout.canvas_height);
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Canvas { width, height })?;
    let (w, h) = (width as f32, height as f32);

    let panel = rounded_rect(0.0, 0.0, w, h, theme.corner_radius, false)
        .ok_or(RenderError::Path("panel"))?;
    fill(&mut pixmap, &panel, theme.background);

    if theme.header_height > 0.0 {
        let header = rounded_rect(0.0, 0.0, w, theme.header_height, theme.corner_radius, true)
            .ok_or(RenderError::Path("header"))?;
        fill(&mut pixmap, &header, theme.header_background);
    }

    if !theme.header_label.is_empty() {
        let size = theme.label_font_size();
        let label_width = face.text_width(&theme.header_label, size);
        if label_width.is_finite() {
            let baseline = theme.header_height / 2.0 + 4.0;
            let x = (w - label_width) / 2.0;
            draw_run(
                &mut pixmap,
                face,
                &theme.header_label,
                size,
                x,
                baseline - face.ascent(size),
                theme.header_label_colour,
            );
        }
    }

    let dot = theme.window_control_size;
    if dot > 0.0 {
        for (i, colour) in theme.window_controls.iter().enumerate() {
            let cx = theme.padding + i as f32 * dot * 2.0;
            let circle = PathBuilder::from_circle(cx, theme.header_height / 2.0, dot / 2.0)
                .ok_or(RenderError::Path("window control"))?;
            fill(&mut pixmap, &circle, *colour);
        }
    }

    // whole pixel, not anti-aliased: tiny-skia asserts on sub-pixel hairline rects
    let separator_x = (theme.padding + layout.line_number_width - 15.0).floor();
    if let Some(rect) = Rect::from_xywh(
        separator_x,
        theme.header_height,
        1.0,
        h - theme.header_height,
    ) {
        let mut separator = paint(theme.separator);
        separator.anti_alias = false;
        pixmap.fill_rect(rect, &separator, Transform::identity(), None);
    }

    let number_x = theme.padding + (layout.line_number_width - theme.line_number_margin) / 2.0;
    for (index, line) in tokens.iter().take(layout.visible_lines).enumerate() {
        let top = layout.line_top(index, theme);
        draw_run(
            &mut pixmap,
            face,
            &(index + 1).to_string(),
            theme.font_size,
            number_x,
            top,
            theme.line_number,
        );
        draw_line(&mut pixmap, face, theme, line, layout.code_start_x, top, index);
    }

    Ok(pixmap)
}

fn draw_line(
    pixmap: &mut Pixmap,
    face: &TextFace,
    theme: &Theme,
    line: &[Token<'_>],
    x: f32,
    top: f32,
    index: usize,
) {
    if let Some(text) = plain_fallback(line, |text| face.text_width(text, theme.font_size)) {
        log::warn!("line {} could not be measured, drawing it as plain text", index + 1);
        if face.text_width(&text, theme.font_size).is_finite() {
            draw_shadowed(pixmap, face, theme, &text, x, top, theme.text);
        }
        return;
    }

    let mut caret = x;
    for token in line {
        let colour = theme.colour_for(token.category);
        caret += draw_shadowed(pixmap, face, theme, token.text, caret, top, colour);
    }
}

/// The whole line as one plain run when any of its tokens has no finite width.
fn plain_fallback<F>(line: &[Token<'_>], width: F) -> Option<String>
where
    F: Fn(&str) -> f32,
{
    if line.iter().all(|t| width(t.text).is_finite()) {
        None
    } else {
        Some(line.iter().map(|t| t.text).collect())
    }
}

fn draw_shadowed(
    pixmap: &mut Pixmap,
    face: &TextFace,
    theme: &Theme,
    text: &str,
    x: f32,
    top: f32,
    colour: Colour,
) -> f32 {
    if let Some(shadow) = &theme.shadow {
        draw_run(
            pixmap,
            face,
            text,
            theme.font_size,
            x + shadow.offset_x,
            top + shadow.offset_y,
            shadow.colour,
        );
    }
    draw_run(pixmap, face, text, theme.font_size, x, top, colour)
}

fn draw_run(
    pixmap: &mut Pixmap,
    face: &TextFace,
    text: &str,
    size: f32,
    x: f32,
    top: f32,
    colour: Colour,
) -> f32 {
    let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);
    let pixels = pixmap.pixels_mut();
    face.draw_text(text, size, x, top, |px, py, coverage| {
        if px < 0 || py < 0 || px >= width || py >= height {
            return;
        }
        let i = (py * width + px) as usize;
        pixels[i] = blend(pixels[i], colour, coverage);
    })
}

/// Source-over of a straight-alpha colour scaled by `coverage` onto a premultiplied pixel.
fn blend(dst: PremultipliedColorU8, colour: Colour, coverage: f32) -> PremultipliedColorU8 {
    let sa = (colour.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    let inv = 1.0 - sa;
    let channel = |src: u8, d: u8| (src as f32 * sa + d as f32 * inv).round();
    let a = (255.0 * sa + dst.alpha() as f32 * inv).round().min(255.0);
    let r = channel(colour.r, dst.red()).min(a);
    let g = channel(colour.g, dst.green()).min(a);
    let b = channel(colour.b, dst.blue()).min(a);
    PremultipliedColorU8::from_rgba(r as u8, g as u8, b as u8, a as u8).unwrap_or(dst)
}

fn paint(colour: Colour) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(colour.r, colour.g, colour.b, colour.a);
    paint.anti_alias = true;
    paint
}

fn fill(pixmap: &mut Pixmap, path: &Path, colour: Colour) {
    pixmap.fill_path(
        path,
        &paint(colour),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
}

/// A rectangle with rounded corners; `top_only` leaves the bottom corners square.
fn rounded_rect(x: f32, y: f32, w: f32, h: f32, radius: f32, top_only: bool) -> Option<Path> {
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    let bottom_r = if top_only { 0.0 } else { r };
    let (right, bottom) = (x + w, y + h);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.quad_to(right, y, right, y + r);
    pb.line_to(right, bottom - bottom_r);
    pb.quad_to(right, bottom, right - bottom_r, bottom);
    pb.line_to(x + bottom_r, bottom);
    pb.quad_to(x, bottom, x, bottom - bottom_r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn paint_lines(lines: &[&str], theme: &Theme) -> Pixmap {
        let face = TextFace::fallback();
        let tokenizer = Tokenizer::default();
        let tokens: Vec<Vec<Token>> = lines.iter().map(|l| tokenizer.tokenize(l)).collect();
        let layout = Layout::compute(lines, theme, &face);
        render(&tokens, &layout, theme, &face).expect("can render")
    }

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> PremultipliedColorU8 {
        pixmap.pixels()[(y * pixmap.width() + x) as usize]
    }

    #[test]
    fn can_paint_panel_and_header() {
        let theme = Theme::default();
        let pixmap = paint_lines(&["let x = 1;"], &theme);

        // corners stay transparent
        assert_eq!(pixel(&pixmap, 0, 0).alpha(), 0);
        let bottom = pixmap.height() - 1;
        assert_eq!(pixel(&pixmap, 0, bottom).alpha(), 0);

        let header = pixel(&pixmap, pixmap.width() - 20, 5);
        assert_eq!(
            (header.red(), header.green(), header.blue(), header.alpha()),
            (0x1A, 0x1E, 0x30, 255)
        );
        let body = pixel(&pixmap, pixmap.width() - 5, bottom - 15);
        assert_eq!(
            (body.red(), body.green(), body.blue(), body.alpha()),
            (0x17, 0x1C, 0x2E, 255)
        );
    }

    #[test]
    fn draws_window_controls_in_order() {
        let theme = Theme::default();
        let pixmap = paint_lines(&["x"], &theme);
        let cy = (theme.header_height / 2.0) as u32;
        for (i, colour) in theme.window_controls.iter().enumerate() {
            let cx = (theme.padding + i as f32 * theme.window_control_size * 2.0) as u32;
            let p = pixel(&pixmap, cx, cy);
            assert_eq!((p.red(), p.green(), p.blue()), (colour.r, colour.g, colour.b));
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let theme = Theme::default();
        let lines = ["const s = 'hi'; // greet", "return s"];
        let a = paint_lines(&lines, &theme);
        let b = paint_lines(&lines, &theme);
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn tokens_use_category_colours() {
        let theme = Theme {
            shadow: None,
            ..Theme::default()
        };
        let pixmap = paint_lines(&["return"], &theme);
        let keyword = theme.tokens.keyword;
        let found = pixmap.pixels().iter().any(|p| {
            p.alpha() == 255 && (p.red(), p.green(), p.blue()) == (keyword.r, keyword.g, keyword.b)
        });
        assert!(found);
    }

    #[test]
    fn lines_past_the_cap_are_not_drawn() {
        let theme = Theme {
            line_cap: 2,
            shadow: None,
            ..Theme::default()
        };
        let lines = ["a", "b", "return"];
        let pixmap = paint_lines(&lines, &theme);
        assert_eq!(
            pixmap.height(),
            (2.0 * theme.padding + theme.header_height + 2.0 * theme.line_height) as u32
        );
        let keyword = theme.tokens.keyword;
        assert!(!pixmap.pixels().iter().any(|p| {
            p.alpha() == 255 && (p.red(), p.green(), p.blue()) == (keyword.r, keyword.g, keyword.b)
        }));
    }

    #[test]
    fn separator_is_drawn_between_gutter_and_code() {
        let theme = Theme {
            shadow: None,
            ..Theme::default()
        };
        let face = TextFace::fallback();
        let pixmap = paint_lines(&["x"], &theme);
        let layout = Layout::compute(&["x"], &theme, &face);
        let x = (theme.padding + layout.line_number_width - 15.0).floor() as u32;
        let y = pixmap.height() - 5;

        let separator = pixel(&pixmap, x, y);
        let background = pixel(&pixmap, x + 3, y);
        assert_eq!(
            (background.red(), background.green(), background.blue()),
            (0x17, 0x1C, 0x2E)
        );
        assert!(separator.red() > background.red());
        assert!(separator.blue() > background.blue());
        assert_eq!(separator.alpha(), 255);
    }

    #[test]
    fn unmeasurable_tokens_fall_back_to_plain_text() {
        let tokenizer = Tokenizer::default();
        let line = tokenizer.tokenize("let s = 'x'");
        let finite = plain_fallback(&line, |text| text.len() as f32);
        assert_eq!(finite, None);

        let broken = plain_fallback(&line, |text| {
            if text.starts_with('\'') {
                f32::NAN
            } else {
                text.len() as f32
            }
        });
        assert_eq!(broken.as_deref(), Some("let s = 'x'"));
        assert_eq!(plain_fallback(&[], |_| f32::INFINITY), None);
    }

    #[test]
    fn zero_width_line_does_not_hide_its_neighbours() {
        let theme = Theme {
            shadow: None,
            ..Theme::default()
        };
        let pixmap = paint_lines(&["\u{200B}\u{0301}", "let x = 1"], &theme);
        let face = TextFace::fallback();
        let layout = Layout::compute(&["\u{200B}\u{0301}", "let x = 1"], &theme, &face);
        let second_top = layout.line_top(1, &theme) as u32;
        let second_bottom = layout.line_top(2, &theme) as u32;

        let keyword = theme.tokens.keyword;
        let painted = (second_top..second_bottom).any(|y| {
            (0..pixmap.width()).any(|x| {
                let p = pixel(&pixmap, x, y);
                (p.red(), p.green(), p.blue()) == (keyword.r, keyword.g, keyword.b)
            })
        });
        assert!(painted);
    }

    #[test]
    fn blending_keeps_premultiplied_invariant() {
        let dst = PremultipliedColorU8::from_rgba(10, 10, 10, 20).expect("valid colour");
        for coverage in [0.0, 0.25, 0.5, 1.0] {
            let out = blend(dst, Colour::rgba(255, 255, 255, 128), coverage);
            assert!(out.red() <= out.alpha());
        }
        let out = blend(dst, Colour::rgb(1, 2, 3), 1.0);
        assert_eq!((out.red(), out.green(), out.blue(), out.alpha()), (1, 2, 3, 255));
    }
}
