use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use super::error::StoreError;
use crate::db::models::{ClientRow, SwimlanePosition};
use crate::db::schema::clients;
use crate::swimlane::{apply_change, changed_positions, ClientChange, ClientRecord, Status};

fn into_records(rows: Vec<ClientRow>) -> Result<Vec<ClientRecord>, StoreError> {
    rows.into_iter()
        .map(|row| {
            let id = row.id;
            row.into_record()
                .map_err(|err| StoreError::InvalidRow(format!("client {id}: {err}")))
        })
        .collect()
}

/// Loads every client ordered by id.
pub fn load_all(conn: &mut SqliteConnection) -> Result<Vec<ClientRecord>, StoreError> {
    let rows = clients::table
        .select(ClientRow::as_select())
        .order(clients::id.asc())
        .load(conn)?;
    into_records(rows)
}

/// Loads the clients of one bucket ordered by id.
pub fn load_by_status(
    conn: &mut SqliteConnection,
    status: Status,
) -> Result<Vec<ClientRecord>, StoreError> {
    let rows = clients::table
        .filter(clients::status.eq(status.as_db_str()))
        .select(ClientRow::as_select())
        .order(clients::id.asc())
        .load(conn)?;
    into_records(rows)
}

pub fn load_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<ClientRecord>, StoreError> {
    let row = clients::table
        .find(id)
        .select(ClientRow::as_select())
        .first(conn)
        .optional()?;
    row.map(|row| {
        row.into_record()
            .map_err(|err| StoreError::InvalidRow(format!("client {id}: {err}")))
    })
    .transpose()
}

/// Writes the status and priority of every record in one transaction.
///
/// Returns the number of rows written. A record whose row has vanished fails the whole batch.
pub fn persist_batch(
    conn: &mut SqliteConnection,
    records: &[ClientRecord],
) -> Result<usize, StoreError> {
    conn.transaction::<_, StoreError, _>(|conn| {
        let mut written = 0usize;
        for record in records {
            let updated = diesel::update(clients::table.find(record.id))
                .set(SwimlanePosition::from(record))
                .execute(conn)?;
            if updated == 0 {
                return Err(StoreError::ClientNotFound(record.id));
            }
            written += updated;
        }
        Ok(written)
    })
}

/// Loads the full board, applies `change` to client `id` and persists the rows that moved.
///
/// Runs as one immediate transaction so no other writer can interleave between the read and
/// the write. Returns the full resulting board and the number of rows rewritten.
pub fn apply_client_change(
    conn: &mut SqliteConnection,
    id: i64,
    change: &ClientChange,
) -> Result<(Vec<ClientRecord>, usize), StoreError> {
    conn.immediate_transaction::<_, StoreError, _>(|conn| {
        if load_by_id(conn, id)?.is_none() {
            return Err(StoreError::ClientNotFound(id));
        }

        let before = load_all(conn)?;
        let after = apply_change(&before, id, change)?;
        let changed = changed_positions(&before, &after);
        let written = persist_batch(conn, &changed)?;
        Ok((after, written))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite_test::{seed_clients, setup_in_memory_sqlite};

    fn positions(conn: &mut SqliteConnection, status: Status) -> Vec<(i64, i64)> {
        let mut positions: Vec<(i64, i64)> = load_by_status(conn, status)
            .expect("failed to load bucket")
            .into_iter()
            .map(|record| (record.id, record.priority))
            .collect();
        positions.sort_by_key(|&(_, priority)| priority);
        positions
    }

    #[test]
    fn loads_filter_by_status_and_id() {
        let mut conn = setup_in_memory_sqlite();
        seed_clients(
            &mut conn,
            &[(2, "backlog", 1), (1, "complete", 1), (3, "backlog", 2)],
        );

        let all = load_all(&mut conn).expect("failed to load clients");
        assert_eq!(
            all.iter().map(|record| record.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let backlog = load_by_status(&mut conn, Status::Backlog).expect("failed to load backlog");
        assert_eq!(backlog.len(), 2);
        assert!(backlog.iter().all(|record| record.status == Status::Backlog));

        let client = load_by_id(&mut conn, 1)
            .expect("failed to load client")
            .expect("client 1 should exist");
        assert_eq!(client.status, Status::Complete);
        assert_eq!(client.name.as_deref(), Some("client-1"));

        assert!(load_by_id(&mut conn, 999)
            .expect("lookup should succeed")
            .is_none());
    }

    #[test]
    fn change_is_persisted_and_buckets_stay_dense() {
        let mut conn = setup_in_memory_sqlite();
        seed_clients(
            &mut conn,
            &[
                (1, "backlog", 1),
                (2, "backlog", 2),
                (3, "backlog", 3),
                (4, "in-progress", 1),
            ],
        );

        let change = ClientChange::new(Some("in-progress"), None).expect("valid change");
        let (board, written) =
            apply_client_change(&mut conn, 1, &change).expect("change should apply");

        assert_eq!(board.len(), 4);
        assert_eq!(written, 3);
        assert_eq!(positions(&mut conn, Status::Backlog), vec![(2, 1), (3, 2)]);
        assert_eq!(positions(&mut conn, Status::InProgress), vec![(4, 1), (1, 2)]);
    }

    #[test]
    fn no_op_change_writes_nothing() {
        let mut conn = setup_in_memory_sqlite();
        seed_clients(&mut conn, &[(1, "backlog", 1), (2, "backlog", 2)]);

        let change = ClientChange::new(Some("backlog"), Some(2)).expect("valid change");
        let (_, written) = apply_client_change(&mut conn, 2, &change).expect("change should apply");

        assert_eq!(written, 0);
        assert_eq!(positions(&mut conn, Status::Backlog), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn change_for_missing_client_is_rejected() {
        let mut conn = setup_in_memory_sqlite();
        seed_clients(&mut conn, &[(1, "backlog", 1)]);

        let change = ClientChange::new(None, Some(1)).expect("valid change");
        let err = apply_client_change(&mut conn, 42, &change).expect_err("missing client");

        assert!(matches!(err, StoreError::ClientNotFound(42)));
    }

    #[test]
    fn failed_batch_leaves_previous_state_committed() {
        let mut conn = setup_in_memory_sqlite();
        seed_clients(&mut conn, &[(1, "backlog", 1), (2, "backlog", 2)]);

        let mut records = load_all(&mut conn).expect("failed to load clients");
        records[0].priority = 2;
        records[1].priority = 1;
        records.push(ClientRecord {
            id: 77,
            name: None,
            description: None,
            status: Status::Backlog,
            priority: 3,
        });

        let err = persist_batch(&mut conn, &records).expect_err("missing row should fail");
        assert!(matches!(err, StoreError::ClientNotFound(77)));
        assert_eq!(positions(&mut conn, Status::Backlog), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn rows_with_unknown_status_surface_as_invalid_rows() {
        use diesel::connection::SimpleConnection;

        let mut conn = setup_in_memory_sqlite();
        // Bypass the CHECK constraint to simulate a row written by an older schema.
        conn.batch_execute(
            "PRAGMA ignore_check_constraints = ON;
             INSERT INTO clients (id, name, description, status, priority)
             VALUES (5, NULL, NULL, 'archived', 1);",
        )
        .expect("failed to insert legacy row");

        let err = load_all(&mut conn).expect_err("unknown status should fail");
        assert!(matches!(err, StoreError::InvalidRow(_)));
    }
}
