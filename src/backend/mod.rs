//! Backend contract.
//!
//! The provider never talks to a database product directly. It goes through
//! three traits:
//!
//! - [`Connector`] opens a connection to a host/port,
//! - [`Backend`] is one open connection: database and table management,
//! - [`Table`] is a handle to one table: row-level operations.
//!
//! Every call returns a [`BackendResult`]. The only error kinds the provider
//! looks at are [`BackendError::AlreadyExists`] (collapsed into success when
//! ensuring schema) and the fatal connection kinds
//! ([`BackendError::is_connection_failure`]).
//!
//! [`MemoryServer`] is an in-process implementation shared by any number of
//! connections.

mod memory;

pub use memory::{MemoryConnection, MemoryServer, MemoryTable};

use crate::key::Key;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Result type for backend calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Errors a backend reports.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Host could not be reached or dropped the connection.
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    /// Credentials were refused.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// Database or table already exists.
    #[error("{0} already exists")]
    AlreadyExists(String),
    /// Database or table does not exist.
    #[error("{0} does not exist")]
    Missing(String),
    /// The connection was closed by its owner.
    #[error("connection closed")]
    Closed,
    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// `true` for errors that mean the backend cannot be used at all.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, BackendError::Unreachable(_) | BackendError::Auth(_))
    }
}

/// Persisted form of an entry.
///
/// `data` holds the raw primitive or the JSON text of a composite value; see
/// [`codec`](crate::codec).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Primary key.
    pub id: Key,
    /// Encoded payload.
    pub data: Value,
}

/// Opens connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `host:port`. Unreachable hosts and refused credentials
    /// must be reported as [`BackendError::Unreachable`] or
    /// [`BackendError::Auth`].
    async fn connect(&self, host: &str, port: u16) -> BackendResult<Arc<dyn Backend>>;
}

/// One open connection.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Names of all databases.
    async fn db_list(&self) -> BackendResult<Vec<String>>;

    /// Create a database. Fails with [`BackendError::AlreadyExists`] if it
    /// is already there.
    async fn db_create(&self, db: &str) -> BackendResult<()>;

    /// Names of all tables in `db`.
    async fn table_list(&self, db: &str) -> BackendResult<Vec<String>>;

    /// Create a table. Fails with [`BackendError::AlreadyExists`] if it is
    /// already there.
    async fn table_create(&self, db: &str, table: &str) -> BackendResult<()>;

    /// Drop a table and every row in it.
    async fn table_drop(&self, db: &str, table: &str) -> BackendResult<()>;

    /// Handle to a table. Does not check that the table exists.
    fn table(&self, db: &str, table: &str) -> Arc<dyn Table>;

    /// Release the connection. Later calls on it or its tables fail with
    /// [`BackendError::Closed`].
    async fn close(&self) -> BackendResult<()>;
}

/// Row-level operations on one table.
#[async_trait]
pub trait Table: Send + Sync {
    /// Insert the row, replacing any row with the same id.
    async fn upsert(&self, row: Row) -> BackendResult<()>;

    /// Row with this id, if any.
    async fn get(&self, id: &Key) -> BackendResult<Option<Row>>;

    /// Delete the row with this id. Returns the number of rows removed,
    /// which is zero for an absent id.
    async fn delete(&self, id: &Key) -> BackendResult<u64>;

    /// Delete every row. Returns the number of rows removed.
    async fn delete_all(&self) -> BackendResult<u64>;

    /// Every row, in no particular order.
    async fn read_all(&self) -> BackendResult<Vec<Row>>;
}
