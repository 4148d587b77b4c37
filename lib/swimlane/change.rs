use std::collections::HashMap;

use super::reorder::{compact_bucket, reorder_bucket};
use super::types::{validate_priority, ClientRecord, Placement, Status, SwimlaneError};

/// A validated status and/or priority update for one client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientChange {
    pub status: Option<Status>,
    pub priority: Option<i64>,
}

impl ClientChange {
    /// Validates raw request values. An empty status label counts as "not supplied".
    pub fn new(status: Option<&str>, priority: Option<i64>) -> Result<Self, SwimlaneError> {
        let status = match status {
            None | Some("") => None,
            Some(label) => Some(label.parse::<Status>()?),
        };
        let priority = priority.map(validate_priority).transpose()?;
        Ok(Self { status, priority })
    }
}

/// Applies `change` to client `id` and returns the full resulting snapshot.
///
/// Cases:
/// - same bucket with a new priority: the bucket is reordered around the requested priority.
/// - bucket changed: the old bucket closes the vacated slot, then the client is inserted into the
///   new bucket just before the requested priority, or last when no priority was given.
/// - anything else leaves the snapshot unchanged.
///
/// Every bucket that was reordered is compacted back to `1..=k` before returning.
pub fn apply_change(
    records: &[ClientRecord],
    id: i64,
    change: &ClientChange,
) -> Result<Vec<ClientRecord>, SwimlaneError> {
    let current = records
        .iter()
        .find(|record| record.id == id)
        .ok_or(SwimlaneError::RecordNotFound { id })?;
    let old_status = current.status;
    let old_priority = current.priority;
    let new_status = change.status.unwrap_or(old_status);

    if new_status == old_status {
        return Ok(match change.priority {
            Some(priority) if priority != old_priority => {
                let reordered = reorder_bucket(records, old_status, Placement::At(priority), id);
                compact_bucket(&reordered, old_status)
            }
            _ => records.to_vec(),
        });
    }

    let placement = change.priority.map_or(Placement::Last, Placement::Before);
    let moved: Vec<ClientRecord> = records
        .iter()
        .map(|record| {
            if record.id != id {
                return record.clone();
            }
            ClientRecord {
                status: new_status,
                priority: placement.provisional_priority(),
                ..record.clone()
            }
        })
        .collect();

    let vacated = reorder_bucket(&moved, old_status, Placement::At(old_priority), id);
    let inserted = reorder_bucket(&vacated, new_status, placement, id);
    let compacted = compact_bucket(&inserted, old_status);
    Ok(compact_bucket(&compacted, new_status))
}

/// Returns the records of `after` whose status or priority differ from `before`.
///
/// Only these rows need to be written back for storage to match `after`.
pub fn changed_positions(before: &[ClientRecord], after: &[ClientRecord]) -> Vec<ClientRecord> {
    let previous: HashMap<i64, (Status, i64)> = before
        .iter()
        .map(|record| (record.id, (record.status, record.priority)))
        .collect();

    after
        .iter()
        .filter(|record| previous.get(&record.id) != Some(&(record.status, record.priority)))
        .cloned()
        .collect()
}
