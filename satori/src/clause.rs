//! Long clause storage.
pub mod activity;
pub mod alloc;

pub use activity::{bump_clause_activity, decay_clause_activities, ClauseActivity};
pub use alloc::{ClauseAlloc, ClauseRef};
