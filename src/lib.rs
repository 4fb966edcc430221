//! starcast - Flatten podcast GitHub mentions into daily star-history tables
//!
//! starcast takes a podcast → episode → reference → repository graph, where
//! each repository carries its full list of star events, and turns it into
//! one row per (episode, repository, calendar day): cumulative stars, daily
//! new stars, relative growth, and the day offsets a model needs.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates)
//! - [`core`] - Domain model, strong types, configuration
//! - [`expand`] - Date axis, star aggregation, row materialization
//! - [`export`] - CSV and JSON-lines writers with a fixed schema
//! - [`forge`] - Star sources: GitHub GraphQL client and a mock
//! - [`dataset`] - Mention windows and episode-based splits
//! - [`logging`] - `tracing` subscriber setup
//! - [`ui`] - User-facing output
//!
//! # Invariants
//!
//! 1. Every repository series covers each day of its axis exactly once
//! 2. Accumulated counts never decrease along a series
//! 3. Every row of a table has the same columns in the same order

pub mod cli;
pub mod core;
pub mod dataset;
pub mod expand;
pub mod export;
pub mod forge;
pub mod logging;
pub mod ui;
