//! Swimlane ordering for client records.
//!
//! Every client lives in exactly one status bucket and carries a priority that ranks it within
//! that bucket. After any completed change, the priorities of a bucket's `k` members are exactly
//! `1..=k`.
//!
//! The functions here are pure: they take a snapshot of all clients and return a new one. Loading
//! and persisting snapshots is the repository's job.

mod change;
mod reorder;
mod types;

pub use change::{apply_change, changed_positions, ClientChange};
pub use reorder::{compact_bucket, reorder_bucket};
pub use types::{
    validate_priority, ClientRecord, Placement, Status, SwimlaneError, UnknownStatus,
};
