//! Reconciliation of external tracker data into the catalog.
//!
//! # Components
//!
//! - [`merge`]/[`detect_conflicts`]/[`merge_person`] - pure field-level
//!   reconciliation under a [`MergePolicy`]
//! - [`ExternalSource`] - the adapter seam ([`JsonExportSource`],
//!   [`RestSource`])
//! - [`SyncRunner`] - best-effort batch driver producing a [`SyncReport`]
//!
//! Merge functions return diffs and never persist; the runner applies diffs
//! record by record, and the caller decides when (or whether) to save.

mod error;
mod merge;
mod record;
mod runner;
mod source;

pub use error::SyncError;
pub use merge::{
    apply_diff, apply_person_diff, detect_conflicts, merge, merge_person, merge_token_lists,
    ConflictMap, MergeDiff, MergePolicy, MERGE_FIELDS,
};
pub use record::{ExternalPersonRecord, ExternalRecord};
pub use runner::{SyncReport, SyncRunner};
pub use source::{ExternalSource, JsonExportSource, RestSource};
