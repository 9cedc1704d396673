//! Write-through operations: set, delete, fetch.
//!
//! Every operation validates its key first, so an invalid key never reaches
//! the backend. `set` and `delete` hand the write to a background worker and
//! only fail for local reasons; the `_async` variants wait for the backend
//! and return its error.

use crate::backend::Row;
use crate::codec;
use crate::error::{Error, Result};
use crate::hydrate;
use crate::key::validate_key;
use crate::provider::Provider;
use crate::writer::WriteOp;
use serde::Serialize;
use serde_json::Value;

impl Provider {
    // ---- writes ----

    /// Mirror a map insert. Returns once the write is queued; backend
    /// failures are logged, not returned.
    pub fn set<V: Serialize>(&self, key: impl Into<Value>, value: V) -> Result<()> {
        let row = prepare_row(key.into(), value)?;
        self.session()?.writer.submit(WriteOp::Upsert(row))
    }

    /// Mirror a map insert and wait for the backend to confirm it.
    pub async fn set_async<V: Serialize>(&self, key: impl Into<Value>, value: V) -> Result<()> {
        let row = prepare_row(key.into(), value)?;
        let session = self.session()?;
        session.table.upsert(row).await.map_err(Error::BackendWrite)
    }

    /// Mirror a map removal. Returns once the delete is queued.
    pub fn delete(&self, key: impl Into<Value>) -> Result<()> {
        let key = validate_key(&key.into())?;
        self.session()?.writer.submit(WriteOp::Delete(key))
    }

    /// Mirror a map removal and wait for the backend. Deleting a key that
    /// is not in the table succeeds.
    pub async fn delete_async(&self, key: impl Into<Value>) -> Result<()> {
        let key = validate_key(&key.into())?;
        let session = self.session()?;
        let removed = session
            .table
            .delete(&key)
            .await
            .map_err(Error::BackendWrite)?;
        tracing::debug!(table = self.name(), %key, removed, "deleted");
        Ok(())
    }

    /// Remove every row from the table. Returns how many were removed.
    /// The caller's map is left alone.
    pub async fn bulk_delete(&self) -> Result<u64> {
        let session = self.session()?;
        let removed = session
            .table
            .delete_all()
            .await
            .map_err(Error::BackendWrite)?;
        tracing::info!(table = self.name(), removed, "cleared table");
        Ok(removed)
    }

    /// Wait until every write queued by [`set`](Self::set) and
    /// [`delete`](Self::delete) so far has reached the backend (or failed
    /// and been logged).
    pub async fn flush(&self) -> Result<()> {
        let session = self.session()?;
        session.writer.flush().await
    }

    // ---- reads ----

    /// Load one key from the table into the map.
    ///
    /// Returns the decoded value, or `None` if the table has no such row (the
    /// map is not touched in that case).
    pub async fn fetch(&self, key: impl Into<Value>) -> Result<Option<Value>> {
        let key = validate_key(&key.into())?;
        let session = self.session()?;
        let Some(row) = session.table.get(&key).await.map_err(Error::BackendRead)? else {
            return Ok(None);
        };
        let (key, value) = hydrate::decode_row(row)?;
        session.map.insert(key, value.clone());
        Ok(Some(value))
    }

    /// Reload every row into the map. Safe to repeat. Returns the number of
    /// rows loaded.
    pub async fn fetch_everything(&self) -> Result<usize> {
        let session = self.session()?;
        let loaded = hydrate::load_all(session.table.as_ref(), session.map.as_ref()).await?;
        tracing::info!(table = self.name(), rows = loaded, "reloaded rows");
        Ok(loaded)
    }

    /// `true` if the table has a row for `key`. Does not touch the map.
    pub async fn has_async(&self, key: impl Into<Value>) -> Result<bool> {
        let key = validate_key(&key.into())?;
        let session = self.session()?;
        let row = session.table.get(&key).await.map_err(Error::BackendRead)?;
        Ok(row.is_some())
    }
}

fn prepare_row<V: Serialize>(raw_key: Value, value: V) -> Result<Row> {
    let id = validate_key(&raw_key)?;
    let value = serde_json::to_value(value).map_err(|e| Error::Encode(e.to_string()))?;
    codec::check_storable(&value).map_err(Error::Encode)?;
    Ok(Row {
        id,
        data: codec::encode(&value),
    })
}
