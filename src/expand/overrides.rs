//! expand::overrides
//!
//! Resolution of the `manually_modified` marker across the record tree.
//!
//! Every level (podcast, episode, reference, repository) may carry an
//! explicit `Some(true)` / `Some(false)`. Walking outermost to innermost,
//! each explicit value replaces the one before it, so the innermost explicit
//! value wins. With no explicit value anywhere the result is `false`.

use crate::core::model::{Episode, Podcast, Reference, Repository};

/// Resolve an override chain ordered outermost to innermost.
///
/// # Example
///
/// ```
/// use starcast::expand::overrides::resolve_override;
///
/// assert!(!resolve_override(&[None, None]));
/// assert!(resolve_override(&[Some(true), None]));
/// assert!(!resolve_override(&[Some(true), Some(false)]));
/// ```
pub fn resolve_override(chain: &[Option<bool>]) -> bool {
    chain
        .iter()
        .rev()
        .find_map(|value| *value)
        .unwrap_or(false)
}

/// Resolve `manually_modified` for one repository mention.
pub fn manually_modified(
    podcast: &Podcast,
    episode: &Episode,
    reference: &Reference,
    repository: &Repository,
) -> bool {
    resolve_override(&[
        podcast.manually_modified,
        episode.manually_modified,
        reference.manually_modified,
        repository.manually_modified,
    ])
}
