//! core
//!
//! Core domain types, schemas, and configuration for starcast.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RepoSlug, date arithmetic
//! - [`model`] - Podcast → episode → reference → repository tree
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod model;
pub mod types;
