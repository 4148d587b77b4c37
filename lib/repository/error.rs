use crate::swimlane::SwimlaneError;
use diesel::result::Error as DieselError;
use diesel::ConnectionError;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database operation failed: {0}")]
    Database(#[from] DieselError),

    #[error("failed to open database: {0}")]
    Connect(#[from] ConnectionError),

    #[error("failed to run migrations: {0}")]
    Migration(String),

    #[error("invalid client row in database: {0}")]
    InvalidRow(String),

    #[error("client {0} does not exist")]
    ClientNotFound(i64),

    #[error(transparent)]
    Swimlane(#[from] SwimlaneError),

    #[error("store task join error: {0}")]
    TaskJoin(#[from] JoinError),
}
