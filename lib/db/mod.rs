pub mod models;
pub mod schema;

use diesel::connection::SimpleConnection;
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::repository::StoreError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Opens the SQLite database at `db_url` and brings its schema up to date.
///
/// `":memory:"` yields a private in-memory database, which is what tests use.
pub fn establish_connection(db_url: &str) -> Result<SqliteConnection, StoreError> {
    let mut conn = SqliteConnection::establish(db_url)?;

    conn.batch_execute(
        r#"
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        "#,
    )?;

    let applied = run_migrations(&mut conn)?;
    info!(
        event = "database_ready",
        db_url,
        migrations_applied = applied,
        "database connection established"
    );
    Ok(conn)
}

/// Runs pending embedded migrations and returns how many were applied.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<usize, StoreError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| StoreError::Migration(err.to_string()))?;
    Ok(applied.len())
}
