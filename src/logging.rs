//! logging
//!
//! Installs the `tracing` subscriber used by the CLI.
//!
//! Library code only emits events. The binary calls [`init`] once, after
//! parsing flags. `RUST_LOG` takes precedence over the verbosity flags.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::ui::output::Verbosity;

/// Build the filter for `verbosity`, letting `RUST_LOG` override it.
pub fn filter_for(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("starcast={}", verbosity.filter_directive())))
}

/// Install a stderr fmt subscriber.
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place.
pub fn init(verbosity: Verbosity) {
    let _ = tracing_subscriber::registry()
        .with(filter_for(verbosity))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
