//! ui
//!
//! User-facing output.
//!
//! All command output goes through [`output`] so that `--quiet` and
//! `--debug` behave the same everywhere. Diagnostics from library code use
//! `tracing` instead; see [`crate::logging`].

pub mod output;
