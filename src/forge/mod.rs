//! forge
//!
//! Abstraction for remote forges that host the mentioned repositories.
//!
//! # Architecture
//!
//! The `Forge` trait defines the interface for reading repository metadata
//! and star history. Commands build a forge and hand it to [`resolve`],
//! which drives it over a whole podcast.
//!
//! Forge failures never compromise local data: an unresolved reference
//! simply produces no rows at expansion time.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and response types
//! - [`github`]: GitHub implementation using the GraphQL API
//! - [`mock`]: Mock implementation for deterministic testing
//! - [`resolve`]: Attach fetched repositories to a podcast

pub mod github;
pub mod mock;
pub mod resolve;
mod traits;

pub use resolve::{resolve_podcast, ResolveReport};
pub use traits::*;
