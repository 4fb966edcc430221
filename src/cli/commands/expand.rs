//! expand command - Flatten a podcast file into a daily table

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::model::Podcast;
use crate::expand;
use crate::export::{Format, RecordWriter};
use crate::ui::output;

/// Expand `input` and write the table to `output_path` or stdout.
pub fn expand(
    ctx: &Context,
    input: &Path,
    output_path: Option<&Path>,
    format: Format,
    backfill_days: Option<i64>,
    unknown_language: Option<String>,
) -> Result<()> {
    let verbosity = ctx.verbosity();
    let config = ctx.load_config()?;

    let mut options = config.expand_options();
    if let Some(days) = backfill_days {
        anyhow::ensure!(days >= 0, "--backfill-days must not be negative, got {}", days);
        anyhow::ensure!(
            days <= expand::MAX_BACKFILL_DAYS,
            "--backfill-days must be at most {}, got {}",
            expand::MAX_BACKFILL_DAYS,
            days
        );
        options.backfill_days = days;
    }
    if let Some(language) = unknown_language {
        options.unknown_language = language;
    }

    let input = ctx.resolve(input)?;
    let podcast = Podcast::read_from(&input)
        .with_context(|| format!("Failed to read podcast from '{}'", input.display()))?;
    output::debug(
        format!(
            "{}: {} episodes, {} repositories",
            podcast.name,
            podcast.episodes.len(),
            podcast.repository_count()
        ),
        verbosity,
    );

    let sink: Box<dyn Write> = match output_path {
        Some(path) => {
            let path = ctx.resolve(path)?;
            let file = File::create(&path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut stream = expand::expand(&podcast, &options);
    let mut writer = RecordWriter::new(sink, format);
    writer
        .write_all(stream.by_ref())
        .context("Failed to write rows")?;
    let rows = writer.rows_written();
    writer.finish().context("Failed to flush output")?;

    let skipped = stream.notices().iter().filter(|n| n.is_skip()).count();
    output::success(
        format!(
            "Wrote {} for {}",
            output::format_count(rows, "row"),
            output::format_count(stream.repositories_expanded(), "repository mention"),
        ),
        verbosity,
    );
    if skipped > 0 {
        output::warn(
            format!("skipped {}", output::format_count(skipped, "reference")),
            verbosity,
        );
    }

    Ok(())
}
