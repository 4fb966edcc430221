//! cli::commands::fetch
//!
//! Resolve a podcast's GitHub references through the GraphQL API.
//!
//! # Design
//!
//! The handler is sync; it builds a tokio runtime and blocks on
//! [`fetch_async`]. Failed references are reported, not fatal, unless
//! `--strict` is given. The podcast file is written even when some
//! references failed, so a rerun only fetches what is still missing.

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use chrono::{NaiveDate, Utc};

use crate::cli::Context;
use crate::core::model::Podcast;
use crate::forge::github::GitHubForge;
use crate::forge::{resolve_podcast, Forge};
use crate::ui::output;

/// Arguments for [`fetch`].
#[derive(Debug, Clone, Default)]
pub struct FetchArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub requested_on: Option<NaiveDate>,
    pub endpoint: Option<String>,
    pub strict: bool,
}

/// Fetch repository data for every unresolved GitHub reference.
pub fn fetch(ctx: &Context, args: FetchArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(fetch_async(ctx, args))
}

async fn fetch_async(ctx: &Context, args: FetchArgs) -> Result<()> {
    let verbosity = ctx.verbosity();
    let config = ctx.load_config()?;

    let token_env = config.token_env();
    let token = match std::env::var(&token_env) {
        Ok(token) if !token.trim().is_empty() => token,
        _ => bail!(
            "No GitHub token found. Set {} or configure github.token_env.",
            token_env
        ),
    };

    let forge = GitHubForge::new(Some(token))
        .with_endpoint(args.endpoint.unwrap_or_else(|| config.api_endpoint()))
        .with_page_size(config.page_size());
    output::debug(format!("using {:?}", forge), verbosity);

    let input = ctx.resolve(&args.input)?;
    let podcast = Podcast::read_from(&input)
        .with_context(|| format!("Failed to read podcast from '{}'", input.display()))?;

    let requested_on = args.requested_on.unwrap_or_else(|| Utc::now().date_naive());
    let (podcast, report) = resolve_podcast(podcast, &forge as &dyn Forge, requested_on).await;

    let target = match &args.output {
        Some(path) => ctx.resolve(path)?,
        None => input,
    };
    podcast
        .write_to(&target)
        .with_context(|| format!("Failed to write podcast to '{}'", target.display()))?;

    output::success(
        format!(
            "Resolved {} ({} fetched, {} already present) into {}",
            output::format_count(report.resolved, "reference"),
            report.fetched,
            report.already_resolved,
            target.display()
        ),
        verbosity,
    );

    if report.has_failures() {
        let lines: Vec<String> = report
            .failures
            .iter()
            .map(|f| format!("episode {}: {}: {}", f.episode, f.slug, f.error))
            .collect();
        output::warn(
            format!(
                "{} could not be resolved:\n{}",
                output::format_count(report.failures.len(), "reference"),
                output::format_list(&lines, "  ")
            ),
            verbosity,
        );
        if args.strict {
            bail!(
                "{} failed to resolve",
                output::format_count(report.failures.len(), "reference")
            );
        }
    }

    Ok(())
}
