//! config command - Get, set, or list configuration values

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::{Config, Scope, KEYS};
use crate::ui::output;

/// Print the effective value of a configuration key.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let config = ctx.load_config()?;
    let value = config.effective(key)?;
    println!("{}", value);
    Ok(())
}

/// Set a configuration value in the project or global file.
pub fn set(ctx: &Context, key: &str, value: &str, global: bool) -> Result<()> {
    let dir = ctx.working_dir()?;
    let config = ctx.load_config()?;

    let scope = if global { Scope::Global } else { Scope::Project };
    let mut file = match scope {
        Scope::Global => config.global.clone(),
        Scope::Project => config.project.clone().unwrap_or_default(),
    };
    file.set(key, value)?;

    let path = config.write_target(scope, &dir)?;
    Config::write_atomic(&path, &file).context("Failed to write config")?;

    output::success(
        format!("Set {} = {} in {}", key, value, path.display()),
        ctx.verbosity(),
    );
    Ok(())
}

/// List every configuration key with its effective value.
///
/// Values set in a file are marked with the scope they came from.
pub fn list(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let verbosity = ctx.verbosity();

    if let Some(path) = config.global_config_loaded_from() {
        output::debug(format!("global config: {}", path.display()), verbosity);
    }
    if let Some(path) = config.project_config_loaded_from() {
        output::debug(format!("project config: {}", path.display()), verbosity);
    }

    for key in KEYS {
        let value = config.effective(key)?;
        let source = match &config.project {
            Some(project) if project.get(key)?.is_some() => "  # project",
            _ if config.global.get(key)?.is_some() => "  # global",
            _ => "",
        };
        println!("{} = {}{}", key, value, source);
    }
    Ok(())
}
