//! Line-count size buckets for placing cell images.
//!
//! Each output format maps a cell's source line count to a fixed display width. The
//! two tables are kept separate on purpose: a PDF page and a DOCX page have different
//! usable widths and units.

use serde::{Deserialize, Serialize};

/// One step of a bucket table: cells with at most `max_lines` lines get `width`.
/// A bucket without `max_lines` catches everything longer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeBucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<usize>,
    pub width: f32,
}

impl SizeBucket {
    pub const fn up_to(max_lines: usize, width: f32) -> SizeBucket {
        SizeBucket {
            max_lines: Some(max_lines),
            width,
        }
    }

    pub const fn rest(width: f32) -> SizeBucket {
        SizeBucket {
            max_lines: None,
            width,
        }
    }
}

/// PDF display widths, in points.
pub const PDF_SIZE_BUCKETS: [SizeBucket; 4] = [
    SizeBucket::up_to(5, 400.0),
    SizeBucket::up_to(15, 450.0),
    SizeBucket::up_to(30, 500.0),
    SizeBucket::rest(550.0),
];

/// DOCX display widths, in pixels at 96 dpi.
pub const DOCX_SIZE_BUCKETS: [SizeBucket; 3] = [
    SizeBucket::up_to(5, 500.0),
    SizeBucket::up_to(30, 600.0),
    SizeBucket::rest(650.0),
];

/// Width for a cell of `line_count` lines: the first bucket whose limit is not exceeded.
///
/// Falls back to the last bucket's width; `None` only for an empty table.
pub fn width_for(buckets: &[SizeBucket], line_count: usize) -> Option<f32> {
    buckets
        .iter()
        .find(|b| b.max_lines.map_or(true, |max| line_count <= max))
        .or_else(|| buckets.last())
        .map(|b| b.width)
}

/// Check a table is usable: non-empty, strictly increasing limits, positive widths and
/// only the last bucket open-ended.
pub fn validate(buckets: &[SizeBucket]) -> Result<(), String> {
    if buckets.is_empty() {
        return Err("at least one bucket is required".to_string());
    }
    let mut previous: Option<usize> = None;
    for (i, bucket) in buckets.iter().enumerate() {
        if !(bucket.width.is_finite() && bucket.width > 0.0) {
            return Err(format!("bucket {} has non-positive width {}", i + 1, bucket.width));
        }
        match bucket.max_lines {
            Some(max) => {
                if previous.is_some_and(|p| max <= p) {
                    return Err(format!(
                        "bucket {} limit {max} does not increase on the one before",
                        i + 1
                    ));
                }
                previous = Some(max);
            }
            None if i + 1 != buckets.len() => {
                return Err(format!("only the last bucket may omit max_lines (bucket {})", i + 1));
            }
            None => {}
        }
    }
    Ok(())
}
