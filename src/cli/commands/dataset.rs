//! dataset command - Expand, window and split podcasts into training tables

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::{NaiveDate, Utc};

use crate::cli::Context;
use crate::core::model::Podcast;
use crate::dataset::{prepare, write_splits};
use crate::export::Format;
use crate::ui::output;

/// Build the dataset from `inputs` and write the splits into `out_dir`.
pub fn dataset(
    ctx: &Context,
    inputs: &[PathBuf],
    out_dir: &Path,
    format: Format,
    cutoff: Option<NaiveDate>,
    holdout_fraction: Option<f64>,
) -> Result<()> {
    let verbosity = ctx.verbosity();
    let config = ctx.load_config()?;

    let mut options = config.dataset_options();
    if let Some(fraction) = holdout_fraction {
        options.holdout_fraction = fraction;
    }

    let podcasts = inputs
        .iter()
        .map(|input| {
            let path = ctx.resolve(input)?;
            Podcast::read_from(&path)
                .with_context(|| format!("Failed to read podcast from '{}'", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let cutoff = cutoff.unwrap_or_else(|| Utc::now().date_naive());
    let dataset = prepare(&podcasts, &options, cutoff).context("Failed to prepare dataset")?;

    let skipped = dataset.notices.iter().filter(|n| n.is_skip()).count();
    output::debug(
        format!(
            "{} expanded, {} skipped references",
            output::format_count(dataset.rows_expanded, "row"),
            skipped
        ),
        verbosity,
    );

    let out_dir = ctx.resolve(out_dir)?;
    let written = write_splits(&dataset.splits, &out_dir, format)
        .with_context(|| format!("Failed to write dataset to '{}'", out_dir.display()))?;

    let lines: Vec<String> = written
        .iter()
        .map(|(path, rows)| format!("{} ({})", path.display(), output::format_count(*rows, "row")))
        .collect();
    output::success(
        format!(
            "Wrote {} windowed rows:\n{}",
            dataset.splits.len(),
            output::format_list(&lines, "  ")
        ),
        verbosity,
    );

    Ok(())
}
