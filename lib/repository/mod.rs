//! Durable client storage.
//!
//! `ops` holds synchronous queries over a borrowed `SqliteConnection`; they are easy to test
//! against an in-memory database. `ClientStore` owns the single connection, serializes access
//! to it and runs every operation on Tokio's blocking pool.
//!
//! A change runs load, reorder and persist inside one immediate transaction while holding the
//! connection lock, so readers see either the state before the change or after it.

mod error;
mod ops;
mod store;

pub use error::StoreError;
pub use ops::{apply_client_change, load_all, load_by_id, load_by_status, persist_batch};
pub use store::{ChangeOutcome, ClientStore};
