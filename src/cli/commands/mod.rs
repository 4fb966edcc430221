//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls into the library to do the work
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! `fetch` talks to GitHub, so its handler builds a tokio runtime and blocks
//! on the async implementation.

mod config_cmd;
mod dataset;
mod expand;
mod fetch;

// Re-export command functions for testing and direct invocation
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use dataset::dataset;
pub use expand::expand;
pub use fetch::{fetch, FetchArgs};

use super::args::{Command, ConfigAction};
use super::Context;
use anyhow::Result;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Expand {
            input,
            output,
            format,
            backfill_days,
            unknown_language,
        } => expand::expand(
            ctx,
            &input,
            output.as_deref(),
            format,
            backfill_days,
            unknown_language,
        ),
        Command::Fetch {
            input,
            output,
            requested_on,
            endpoint,
            strict,
        } => fetch::fetch(
            ctx,
            FetchArgs {
                input,
                output,
                requested_on,
                endpoint,
                strict,
            },
        ),
        Command::Dataset {
            inputs,
            out_dir,
            format,
            cutoff,
            holdout_fraction,
        } => dataset::dataset(ctx, &inputs, &out_dir, format, cutoff, holdout_fraction),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value, global } => config_cmd::set(ctx, &key, &value, global),
            ConfigAction::List => config_cmd::list(ctx),
        },
    }
}
