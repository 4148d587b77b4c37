use super::types::{ClientRecord, Placement, Status};

/// Makes room for `moving_id` at `placement` inside `bucket`.
///
/// Single pass over the bucket: the moving client takes the placement's provisional priority,
/// every other member at or after the placement moves one step later and every member before
/// it moves one step earlier. Clients in other buckets are returned untouched.
///
/// When `moving_id` is not a member of `bucket` the shift still applies, which is how a
/// vacated slot is closed after a client leaves a bucket.
///
/// The result keeps relative order but not dense ranks; run [`compact_bucket`] afterwards.
pub fn reorder_bucket(
    records: &[ClientRecord],
    bucket: Status,
    placement: Placement,
    moving_id: i64,
) -> Vec<ClientRecord> {
    records
        .iter()
        .map(|record| {
            if record.status != bucket {
                return record.clone();
            }

            let priority = if record.id == moving_id {
                placement.provisional_priority()
            } else if placement.displaces(record.priority) {
                record.priority.saturating_add(1)
            } else {
                record.priority.saturating_sub(1)
            };

            ClientRecord {
                priority,
                ..record.clone()
            }
        })
        .collect()
}

/// Re-ranks the members of `bucket` to `1..=k`, keeping their current relative order.
///
/// Ties on priority are broken by id so the result is deterministic even for rows that were
/// already inconsistent in storage.
pub fn compact_bucket(records: &[ClientRecord], bucket: Status) -> Vec<ClientRecord> {
    let mut members: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.status == bucket)
        .map(|(index, _)| index)
        .collect();
    members.sort_by_key(|&index| (records[index].priority, records[index].id));

    let mut compacted = records.to_vec();
    for (rank, index) in members.into_iter().enumerate() {
        compacted[index].priority = rank as i64 + 1;
    }
    compacted
}
