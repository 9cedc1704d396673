//! In-process backend.
//!
//! A [`MemoryServer`] plays the part of a database server: every connection
//! opened from it (and every clone of it) sees the same databases, so several
//! providers connected to one server behave like several processes sharing
//! a real database. Host and port are accepted and ignored.

use super::{Backend, BackendError, BackendResult, Connector, Row, Table};
use crate::key::Key;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Rows = HashMap<Key, Value>;
type Databases = HashMap<String, HashMap<String, Rows>>;

/// Shared in-memory database server.
#[derive(Clone, Default)]
pub struct MemoryServer {
    state: Arc<RwLock<Databases>>,
}

impl MemoryServer {
    /// Empty server with no databases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in `db.table`, or `None` if the table does not exist.
    pub fn row_count(&self, db: &str, table: &str) -> Option<usize> {
        self.state
            .read()
            .get(db)
            .and_then(|tables| tables.get(table))
            .map(|rows| rows.len())
    }
}

impl std::fmt::Debug for MemoryServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryServer")
            .field("databases", &self.state.read().len())
            .finish()
    }
}

#[async_trait]
impl Connector for MemoryServer {
    async fn connect(&self, host: &str, port: u16) -> BackendResult<Arc<dyn Backend>> {
        tracing::debug!(host, port, "opening in-memory connection");
        Ok(Arc::new(MemoryConnection {
            state: Arc::clone(&self.state),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

/// One connection to a [`MemoryServer`].
pub struct MemoryConnection {
    state: Arc<RwLock<Databases>>,
    closed: Arc<AtomicBool>,
}

impl MemoryConnection {
    fn check_open(&self) -> BackendResult<()> {
        check_open(&self.closed)
    }
}

fn check_open(closed: &AtomicBool) -> BackendResult<()> {
    if closed.load(Ordering::Acquire) {
        Err(BackendError::Closed)
    } else {
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryConnection {
    async fn db_list(&self) -> BackendResult<Vec<String>> {
        self.check_open()?;
        Ok(self.state.read().keys().cloned().collect())
    }

    async fn db_create(&self, db: &str) -> BackendResult<()> {
        self.check_open()?;
        let mut state = self.state.write();
        if state.contains_key(db) {
            return Err(BackendError::AlreadyExists(format!("database `{db}`")));
        }
        state.insert(db.to_owned(), HashMap::new());
        Ok(())
    }

    async fn table_list(&self, db: &str) -> BackendResult<Vec<String>> {
        self.check_open()?;
        self.state
            .read()
            .get(db)
            .map(|tables| tables.keys().cloned().collect())
            .ok_or_else(|| BackendError::Missing(format!("database `{db}`")))
    }

    async fn table_create(&self, db: &str, table: &str) -> BackendResult<()> {
        self.check_open()?;
        let mut state = self.state.write();
        let tables = state
            .get_mut(db)
            .ok_or_else(|| BackendError::Missing(format!("database `{db}`")))?;
        if tables.contains_key(table) {
            return Err(BackendError::AlreadyExists(format!("table `{db}.{table}`")));
        }
        tables.insert(table.to_owned(), Rows::new());
        Ok(())
    }

    async fn table_drop(&self, db: &str, table: &str) -> BackendResult<()> {
        self.check_open()?;
        self.state
            .write()
            .get_mut(db)
            .and_then(|tables| tables.remove(table))
            .map(|_| ())
            .ok_or_else(|| BackendError::Missing(format!("table `{db}.{table}`")))
    }

    fn table(&self, db: &str, table: &str) -> Arc<dyn Table> {
        Arc::new(MemoryTable {
            state: Arc::clone(&self.state),
            closed: Arc::clone(&self.closed),
            db: db.to_owned(),
            name: table.to_owned(),
        })
    }

    async fn close(&self) -> BackendResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Handle to one table on a [`MemoryServer`].
pub struct MemoryTable {
    state: Arc<RwLock<Databases>>,
    closed: Arc<AtomicBool>,
    db: String,
    name: String,
}

impl MemoryTable {
    fn read_rows<T>(&self, f: impl FnOnce(&Rows) -> T) -> BackendResult<T> {
        check_open(&self.closed)?;
        let state = self.state.read();
        state
            .get(&self.db)
            .and_then(|tables| tables.get(&self.name))
            .map(f)
            .ok_or_else(|| self.missing())
    }

    fn write_rows<T>(&self, f: impl FnOnce(&mut Rows) -> T) -> BackendResult<T> {
        check_open(&self.closed)?;
        let mut state = self.state.write();
        match state
            .get_mut(&self.db)
            .and_then(|tables| tables.get_mut(&self.name))
        {
            Some(rows) => Ok(f(rows)),
            None => Err(self.missing()),
        }
    }

    fn missing(&self) -> BackendError {
        BackendError::Missing(format!("table `{}.{}`", self.db, self.name))
    }
}

#[async_trait]
impl Table for MemoryTable {
    async fn upsert(&self, row: Row) -> BackendResult<()> {
        self.write_rows(|rows| {
            rows.insert(row.id, row.data);
        })
    }

    async fn get(&self, id: &Key) -> BackendResult<Option<Row>> {
        self.read_rows(|rows| {
            rows.get(id).map(|data| Row {
                id: id.clone(),
                data: data.clone(),
            })
        })
    }

    async fn delete(&self, id: &Key) -> BackendResult<u64> {
        self.write_rows(|rows| u64::from(rows.remove(id).is_some()))
    }

    async fn delete_all(&self) -> BackendResult<u64> {
        self.write_rows(|rows| {
            let removed = rows.len() as u64;
            rows.clear();
            removed
        })
    }

    async fn read_all(&self) -> BackendResult<Vec<Row>> {
        self.read_rows(|rows| {
            rows.iter()
                .map(|(id, data)| Row {
                    id: id.clone(),
                    data: data.clone(),
                })
                .collect()
        })
    }
}
