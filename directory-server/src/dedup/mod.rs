//! Duplicate resource resolution.
//!
//! Repeated ingestion leaves several records for one physical provider.
//! This module finds those records, folds each group into its lowest-id
//! member without losing information, and deletes the rest:
//!
//! 1. [`find_duplicate_groups`] normalizes the matching fields and closes the
//!    duplicate relation transitively.
//! 2. [`merge_group`] computes the surviving record's fields.
//! 3. [`Deduplicator`] applies every group to the store inside a single
//!    transaction and returns a [`DedupReport`].

mod matching;
mod merge;
mod runner;
mod union_find;

pub use matching::{DuplicateGroup, MatchKey, find_duplicate_groups, is_duplicate};
pub use merge::{MergedRecord, NOTES_SEPARATOR, merge_group};
pub use runner::{DedupError, DedupReport, Deduplicator, GroupOutcome};
pub use union_find::DisjointSet;
