use std::sync::{Arc, Mutex};

use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, warn};

use super::error::StoreError;
use super::ops;
use crate::db::establish_connection;
use crate::swimlane::{ClientChange, ClientRecord, Status};

/// Result of one applied client change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOutcome {
    /// Every client after the change.
    pub clients: Vec<ClientRecord>,
    /// Rows whose status or priority were rewritten.
    pub rows_written: usize,
}

/// Async handle over the service's single SQLite connection.
///
/// Cloning is cheap and shares the connection. Every operation takes the connection lock for
/// its whole duration, which serializes writers and keeps readers from observing a change that
/// is only partly written.
#[derive(Clone)]
pub struct ClientStore {
    conn: Arc<Mutex<SqliteConnection>>,
}

impl ClientStore {
    pub fn new(conn: SqliteConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Opens (and migrates) the database at `db_url`.
    pub fn open(db_url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(establish_connection(db_url)?))
    }

    pub async fn list(&self, status: Option<Status>) -> Result<Vec<ClientRecord>, StoreError> {
        self.run(move |conn| match status {
            Some(status) => ops::load_by_status(conn, status),
            None => ops::load_all(conn),
        })
        .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<ClientRecord>, StoreError> {
        self.run(move |conn| ops::load_by_id(conn, id)).await
    }

    pub async fn update(&self, id: i64, change: ClientChange) -> Result<ChangeOutcome, StoreError> {
        let outcome = self
            .run(move |conn| ops::apply_client_change(conn, id, &change))
            .await
            .map(|(clients, rows_written)| ChangeOutcome {
                clients,
                rows_written,
            })?;

        info!(
            event = "client_change_applied",
            client_id = id,
            status = ?change.status,
            priority = ?change.priority,
            rows_written = outcome.rows_written,
            "applied client change"
        );
        Ok(outcome)
    }

    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = match conn.lock() {
                Ok(guard) => guard,
                Err(poisoned) => {
                    warn!(
                        event = "store_lock_recovered",
                        "previous store operation panicked; recovering connection"
                    );
                    conn.clear_poison();
                    let mut guard = poisoned.into_inner();
                    roll_back_abandoned_transactions(&mut guard)?;
                    guard
                }
            };
            debug!(event = "store_lock_acquired", "acquired client store connection");
            op(&mut guard)
        })
        .await?
    }
}

/// Rolls back any transaction a panicking operation left open on the connection.
fn roll_back_abandoned_transactions(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    while let Some(depth) =
        AnsiTransactionManager::transaction_manager_status_mut(conn).transaction_depth()?
    {
        warn!(
            event = "store_abandoned_transaction_rolled_back",
            depth = depth.get(),
            "rolling back transaction left open by a panicked operation"
        );
        AnsiTransactionManager::rollback_transaction(conn)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite_test::{seed_clients, setup_in_memory_sqlite};

    fn seeded_store() -> ClientStore {
        let mut conn = setup_in_memory_sqlite();
        seed_clients(
            &mut conn,
            &[
                (1, "backlog", 1),
                (2, "backlog", 2),
                (3, "backlog", 3),
                (4, "complete", 1),
            ],
        );
        ClientStore::new(conn)
    }

    #[tokio::test]
    async fn update_returns_full_board_and_persists_it() {
        let store = seeded_store();
        let change = ClientChange::new(None, Some(1)).expect("valid change");

        let outcome = store.update(3, change).await.expect("update should succeed");

        assert_eq!(outcome.clients.len(), 4);
        assert_eq!(outcome.rows_written, 3);
        let backlog = store
            .list(Some(Status::Backlog))
            .await
            .expect("list should succeed");
        let mut order: Vec<(i64, i64)> = backlog
            .into_iter()
            .map(|record| (record.priority, record.id))
            .collect();
        order.sort_unstable();
        assert_eq!(order, vec![(1, 3), (2, 1), (3, 2)]);
    }

    #[tokio::test]
    async fn concurrent_updates_keep_every_bucket_dense() {
        let store = seeded_store();
        let changes = [
            (1, Some("complete"), None),
            (2, None, Some(3)),
            (4, Some("backlog"), Some(1)),
            (3, Some("in-progress"), None),
            (2, Some("complete"), Some(1)),
        ];

        let handles: Vec<_> = changes
            .into_iter()
            .map(|(id, status, priority)| {
                let store = store.clone();
                tokio::spawn(async move {
                    let change = ClientChange::new(status, priority).expect("valid change");
                    store.update(id, change).await
                })
            })
            .collect();
        for handle in handles {
            handle
                .await
                .expect("update task panicked")
                .expect("update should succeed");
        }

        for status in Status::ALL {
            let mut priorities: Vec<i64> = store
                .list(Some(status))
                .await
                .expect("list should succeed")
                .into_iter()
                .map(|record| record.priority)
                .collect();
            priorities.sort_unstable();
            let expected: Vec<i64> = (1..=priorities.len() as i64).collect();
            assert_eq!(priorities, expected, "bucket {status} is not dense");
        }
    }

    #[tokio::test]
    async fn store_recovers_after_an_operation_panics_mid_transaction() {
        use diesel::prelude::*;

        let store = seeded_store();
        let err = store
            .run(|conn| {
                conn.immediate_transaction::<(), StoreError, _>(|conn| {
                    diesel::sql_query("UPDATE clients SET priority = 99 WHERE id = 1")
                        .execute(conn)?;
                    panic!("store op failed mid-transaction");
                })
            })
            .await
            .expect_err("panicking op should surface as a join error");
        assert!(matches!(err, StoreError::TaskJoin(_)));

        let client = store
            .get(1)
            .await
            .expect("store should recover after a panic")
            .expect("client 1 should exist");
        assert_eq!(client.priority, 1);

        let change = ClientChange::new(None, Some(3)).expect("valid change");
        store
            .update(1, change)
            .await
            .expect("updates should work after recovery");
    }

    #[tokio::test]
    async fn get_reports_missing_clients_as_none() {
        let store = seeded_store();
        assert!(store.get(999).await.expect("get should succeed").is_none());
        assert_eq!(
            store
                .get(4)
                .await
                .expect("get should succeed")
                .map(|record| record.status),
            Some(Status::Complete)
        );
    }
}
