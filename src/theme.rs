//! Visual parameters for rendered code cells.
//!
//! The defaults reproduce a dark, Carbon-style code window: a rounded panel, a
//! slightly lighter header bar with three window-control dots and a short label,
//! a line-number gutter and token colours for comments, strings and keywords.
//!
//! A [`Theme`] is plain data owned by the caller and passed by reference into every
//! layout and render call.

use crate::error::ThemeError;
use crate::tokenizer::TokenCategory;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An sRGB colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Colour {
        Colour { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Colour {
        Colour { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }
}

impl FromStr for Colour {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ThemeError::InvalidColour(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 { byte(6)? } else { 255 };
        Ok(Colour::rgba(byte(0)?, byte(2)?, byte(4)?, a))
    }
}

impl TryFrom<String> for Colour {
    type Error = ThemeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Colour> for String {
    fn from(c: Colour) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Colours for the highlighted token categories. Plain text uses [`Theme::text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenColours {
    pub keyword: Colour,
    pub string: Colour,
    pub comment: Colour,
}

impl Default for TokenColours {
    fn default() -> Self {
        TokenColours {
            keyword: Colour::rgb(0xFF, 0x79, 0xC6),
            string: Colour::rgb(0xF1, 0xFA, 0x8C),
            comment: Colour::rgb(0x62, 0x72, 0xA4),
        }
    }
}

/// Hard drop shadow painted under every glyph run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shadow {
    pub colour: Colour,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for Shadow {
    fn default() -> Self {
        Shadow {
            colour: Colour::rgba(0, 0, 0, 128),
            offset_x: 1.0,
            offset_y: 1.0,
        }
    }
}

/// Full set of parameters controlling how a code cell is painted.
///
/// Lengths are in canvas pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Font family used to pick a face from a font directory ("SourceCodePro").
    pub font_family: String,
    pub font_size: f32,
    pub line_height: f32,
    pub background: Colour,
    pub header_background: Colour,
    pub text: Colour,
    pub line_number: Colour,
    pub separator: Colour,
    pub tokens: TokenColours,
    /// Label drawn in the header bar. Empty string for none.
    pub header_label: String,
    pub header_label_colour: Colour,
    pub padding: f32,
    pub header_height: f32,
    pub corner_radius: f32,
    /// Diameter of each window-control dot; dots are spaced at twice this.
    pub window_control_size: f32,
    pub window_controls: [Colour; 3],
    /// Space reserved around the widest line number in the gutter.
    pub line_number_margin: f32,
    /// Code column is never narrower than this, so one-liners don't make slivers.
    pub min_content_width: f32,
    pub min_width: u32,
    pub max_width: u32,
    /// Lines past this count are not drawn.
    pub line_cap: usize,
    pub shadow: Option<Shadow>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            font_family: "SourceCodePro".to_string(),
            font_size: 14.0,
            line_height: 22.0,
            background: Colour::rgb(0x17, 0x1C, 0x2E),
            header_background: Colour::rgb(0x1A, 0x1E, 0x30),
            text: Colour::rgb(0xFF, 0xFF, 0xFF),
            line_number: Colour::rgb(0x62, 0x72, 0xA4),
            separator: Colour::rgba(255, 255, 255, 26),
            tokens: TokenColours::default(),
            header_label: "ipynb".to_string(),
            header_label_colour: Colour::rgb(0x62, 0x72, 0xA4),
            padding: 32.0,
            header_height: 40.0,
            corner_radius: 10.0,
            window_control_size: 12.0,
            window_controls: [
                Colour::rgb(0xFF, 0x5F, 0x56),
                Colour::rgb(0xFF, 0xBD, 0x2E),
                Colour::rgb(0x27, 0xC9, 0x3F),
            ],
            line_number_margin: 40.0,
            min_content_width: 300.0,
            min_width: 400,
            max_width: 1200,
            line_cap: 50,
            shadow: Some(Shadow::default()),
        }
    }
}

impl Theme {
    /// Colour used to paint a token of the given category.
    pub fn colour_for(&self, category: TokenCategory) -> Colour {
        match category {
            TokenCategory::Comment => self.tokens.comment,
            TokenCategory::String => self.tokens.string,
            TokenCategory::Keyword => self.tokens.keyword,
            TokenCategory::Plain => self.text,
        }
    }

    /// Font size of the header label, two pixels under the code size.
    pub fn label_font_size(&self) -> f32 {
        (self.font_size - 2.0).max(1.0)
    }

    /// Check that the layout engine can work with these values.
    pub fn validate(&self) -> Result<(), ThemeError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ThemeError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ThemeError::InvalidValue {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        }
        fn non_negative(field: &'static str, value: f32) -> Result<(), ThemeError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ThemeError::InvalidValue {
                    field,
                    reason: format!("must be zero or more, got {value}"),
                })
            }
        }

        positive("font_size", self.font_size)?;
        positive("line_height", self.line_height)?;
        non_negative("padding", self.padding)?;
        non_negative("header_height", self.header_height)?;
        non_negative("corner_radius", self.corner_radius)?;
        non_negative("window_control_size", self.window_control_size)?;
        non_negative("line_number_margin", self.line_number_margin)?;
        non_negative("min_content_width", self.min_content_width)?;
        if let Some(shadow) = &self.shadow {
            if !shadow.offset_x.is_finite() || !shadow.offset_y.is_finite() {
                return Err(ThemeError::InvalidValue {
                    field: "shadow",
                    reason: "offsets must be finite".to_string(),
                });
            }
        }

        if self.min_width == 0 {
            return Err(ThemeError::InvalidValue {
                field: "min_width",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.min_width > self.max_width {
            return Err(ThemeError::InvalidValue {
                field: "max_width",
                reason: format!(
                    "must not be less than min_width ({} < {})",
                    self.max_width, self.min_width
                ),
            });
        }
        if self.line_cap == 0 {
            return Err(ThemeError::InvalidValue {
                field: "line_cap",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
