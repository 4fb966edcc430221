//! dataset
//!
//! Turns expanded rows into modeling-ready splits.
//!
//! # Pipeline
//!
//! ```text
//! Podcast(s) ─► expand ─► window ─► partition ─► training / validation / test
//! ```
//!
//! - [`window`] keeps the days around each mention and aligns them on a
//!   shared calendar
//! - [`partition`] holds out the most recent episodes per podcast

pub mod partition;
pub mod window;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::core::model::Podcast;
use crate::expand::{expand, ExpandOptions, Notice};
use crate::export::{ExportError, Format, RecordWriter};

pub use partition::{partition, Split, Splits, DEFAULT_HOLDOUT_FRACTION};
pub use window::{Window, WindowOptions, WindowedRow, MAX_WINDOW_DAYS};

/// Errors from dataset preparation.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("holdout fraction must be in [0, 0.5), got {0}")]
    InvalidFraction(f64),

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to export '{path}': {source}")]
    Export { path: PathBuf, source: ExportError },
}

/// Everything needed to build a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOptions {
    pub expand: ExpandOptions,
    pub window: WindowOptions,
    pub holdout_fraction: f64,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            expand: ExpandOptions::default(),
            window: WindowOptions::default(),
            holdout_fraction: DEFAULT_HOLDOUT_FRACTION,
        }
    }
}

/// The result of [`prepare`].
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub splits: Splits,
    /// Rows produced by expansion, before windowing
    pub rows_expanded: usize,
    /// Notices from every podcast's expansion
    pub notices: Vec<Notice>,
}

/// Expand, window and partition a set of podcasts.
///
/// `cutoff` is the date recency is measured from, normally today.
pub fn prepare(
    podcasts: &[Podcast],
    options: &DatasetOptions,
    cutoff: NaiveDate,
) -> Result<Dataset, DatasetError> {
    partition::validate_fraction(options.holdout_fraction)?;
    let window = Window::new(options.window.clone(), cutoff)?;

    let mut windowed = Vec::new();
    let mut rows_expanded = 0;
    let mut notices = Vec::new();

    for podcast in podcasts {
        let mut stream = expand(podcast, &options.expand);
        windowed.extend(window::window(stream.by_ref(), &window));
        rows_expanded += stream.rows_emitted();
        notices.extend(stream.into_notices());
    }

    info!(
        podcasts = podcasts.len(),
        rows_expanded,
        rows_windowed = windowed.len(),
        %cutoff,
        "windowed dataset"
    );

    let splits = partition(windowed, options.holdout_fraction)?;
    Ok(Dataset {
        splits,
        rows_expanded,
        notices,
    })
}

/// Write each split to `<dir>/<split>.<ext>`, creating `dir` if needed.
///
/// Returns the written paths with their row counts.
pub fn write_splits(
    splits: &Splits,
    dir: &Path,
    format: Format,
) -> Result<Vec<(PathBuf, usize)>, DatasetError> {
    fs::create_dir_all(dir).map_err(|e| DatasetError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut written = Vec::with_capacity(Split::ALL.len());
    for split in Split::ALL {
        let path = dir.join(format!("{}.{}", split, format.extension()));
        let file = File::create(&path).map_err(|e| DatasetError::Io {
            path: path.clone(),
            source: e,
        })?;

        let rows = splits.get(split);
        write_rows(file, format, rows).map_err(|e| DatasetError::Export {
            path: path.clone(),
            source: e,
        })?;

        info!(split = %split, rows = rows.len(), path = %path.display(), "wrote split");
        written.push((path, rows.len()));
    }

    Ok(written)
}

fn write_rows(file: File, format: Format, rows: &[WindowedRow]) -> Result<(), ExportError> {
    let mut writer = RecordWriter::new(BufWriter::new(file), format);
    writer.write_all(rows)?;
    writer.finish()?;
    Ok(())
}
