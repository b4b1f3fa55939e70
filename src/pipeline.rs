//! Producing every cell's image ahead of assembly.
//!
//! Cells have no dependencies on each other, so production may run on the rayon pool.
//! Results land in a vector indexed like the notebook, which the assemblers then walk
//! in order; parallelism never changes what order things are emitted in.

use crate::error::{CellError, ConvertError};
use crate::notebook::Cell;
use crate::rendering::{CellImages, RasterImage};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag a caller can set to stop a conversion between cells.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> CancelFlag {
        CancelFlag::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Knobs for a single conversion run.
#[derive(Clone, Default)]
pub struct ConvertOptions {
    /// Produce cell images on the rayon thread pool.
    pub parallel: bool,
    pub cancel: Option<CancelFlag>,
    /// Ticked once per cell.
    pub progress: Option<ProgressBar>,
}

impl ConvertOptions {
    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// One entry per notebook cell, in notebook order.
pub type CellResults = Vec<Result<RasterImage, CellError>>;

/// Produce images for all cells.
///
/// Per-cell failures stay in the returned vector and are logged; only cancellation
/// fails the whole run.
pub fn produce_all(
    cells: &[Cell],
    producer: &dyn CellImages,
    options: &ConvertOptions,
) -> Result<CellResults, ConvertError> {
    let produce_one = |(index, cell): (usize, &Cell)| -> Option<Result<RasterImage, CellError>> {
        if options.cancelled() {
            return None;
        }
        let result = producer.produce(cell);
        match &result {
            Err(CellError::Failed(e)) => log::warn!("skipping cell {index}: {e}"),
            Err(CellError::Skipped(reason)) => log::debug!("cell {index} skipped: {reason}"),
            Ok(image) => log::debug!(
                "cell {index} rendered at {}x{}",
                image.width(),
                image.height()
            ),
        }
        if let Some(progress) = &options.progress {
            progress.inc(1);
        }
        Some(result)
    };

    let results: Vec<Option<Result<RasterImage, CellError>>> = if options.parallel {
        cells.par_iter().enumerate().map(produce_one).collect()
    } else {
        let mut results = Vec::with_capacity(cells.len());
        for entry in cells.iter().enumerate() {
            let result = produce_one(entry);
            let stop = result.is_none();
            results.push(result);
            if stop {
                break;
            }
        }
        results
    };

    if options.cancelled() {
        return Err(ConvertError::Cancelled);
    }
    results
        .into_iter()
        .collect::<Option<CellResults>>()
        .ok_or(ConvertError::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RenderError, SkipReason};
    use crate::fonts::TextFace;
    use crate::rendering::CellImageProducer;
    use crate::theme::Theme;
    use crate::tokenizer::Tokenizer;

    struct FailOn<'a> {
        inner: CellImageProducer<'a>,
        marker: &'static str,
    }

    impl CellImages for FailOn<'_> {
        fn produce(&self, cell: &Cell) -> Result<RasterImage, CellError> {
            if cell.text().contains(self.marker) {
                return Err(RenderError::Other("forced failure".to_string()).into());
            }
            self.inner.produce(cell)
        }
    }

    fn cells() -> Vec<Cell> {
        vec![
            Cell::code(["let a = 1;\n"]),
            Cell::markdown(["notes"]),
            Cell::code(["let boom = 2;\n"]),
            Cell::code(["   \n"]),
            Cell::code(["let c = 3;\n", "let d = 4;\n"]),
        ]
    }

    fn run(parallel: bool) -> CellResults {
        let theme = Theme::default();
        let face = TextFace::fallback();
        let tokenizer = Tokenizer::default();
        let producer = FailOn {
            inner: CellImageProducer::new(&theme, &face, &tokenizer),
            marker: "boom",
        };
        let options = ConvertOptions {
            parallel,
            ..ConvertOptions::default()
        };
        produce_all(&cells(), &producer, &options).expect("can produce cells")
    }

    #[test]
    fn results_follow_cell_order() {
        for parallel in [false, true] {
            let results = run(parallel);
            assert_eq!(results.len(), 5);
            assert_eq!(
                results[0].as_ref().map(RasterImage::source_line_count),
                Ok(1)
            );
            assert_eq!(
                results[1].as_ref().map(|_| ()),
                Err(&CellError::Skipped(SkipReason::NotCode))
            );
            assert!(matches!(results[2], Err(CellError::Failed(_))));
            assert_eq!(
                results[3].as_ref().map(|_| ()),
                Err(&CellError::Skipped(SkipReason::EmptySource))
            );
            assert_eq!(
                results[4].as_ref().map(RasterImage::source_line_count),
                Ok(2)
            );
        }
    }

    #[test]
    fn parallel_and_sequential_agree() {
        assert_eq!(run(false), run(true));
    }

    #[test]
    fn cancelled_run_returns_error() {
        let theme = Theme::default();
        let face = TextFace::fallback();
        let tokenizer = Tokenizer::default();
        let producer = CellImageProducer::new(&theme, &face, &tokenizer);
        let cancel = CancelFlag::new();
        cancel.cancel();
        for parallel in [false, true] {
            let options = ConvertOptions {
                parallel,
                cancel: Some(cancel.clone()),
                progress: None,
            };
            assert!(matches!(
                produce_all(&cells(), &producer, &options),
                Err(ConvertError::Cancelled)
            ));
        }
    }

    #[test]
    fn progress_ticks_once_per_cell() {
        let theme = Theme::default();
        let face = TextFace::fallback();
        let tokenizer = Tokenizer::default();
        let producer = CellImageProducer::new(&theme, &face, &tokenizer);
        let progress = ProgressBar::hidden();
        let options = ConvertOptions {
            progress: Some(progress.clone()),
            ..ConvertOptions::default()
        };
        produce_all(&cells(), &producer, &options).expect("can produce cells");
        assert_eq!(progress.position(), 5);
    }
}
