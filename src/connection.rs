//! Opening the link to the backend and making sure the schema is there.

use crate::backend::{Backend, BackendError, BackendResult, Connector, Table};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use std::sync::Arc;

/// An open connection plus the provider's table on it.
pub(crate) struct Link {
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) table: Arc<dyn Table>,
}

/// Connect, ensure the database, then ensure the table, in that order.
pub(crate) async fn connect(connector: &dyn Connector, config: &ProviderConfig) -> Result<Link> {
    let backend = connector
        .connect(&config.host, config.port)
        .await
        .map_err(Error::Connection)?;

    if let Err(err) = ensure_schema(backend.as_ref(), config).await {
        if let Err(close_err) = backend.close().await {
            tracing::warn!(table = %config.name, error = %close_err, "closing after schema failure");
        }
        return Err(err);
    }

    let table = backend.table(&config.database, &config.name);
    Ok(Link { backend, table })
}

async fn ensure_schema(backend: &dyn Backend, config: &ProviderConfig) -> Result<()> {
    ensure_database(backend, &config.database).await?;
    ensure_table(backend, &config.database, &config.name).await
}

async fn ensure_database(backend: &dyn Backend, db: &str) -> Result<()> {
    let existing = backend.db_list().await.map_err(Error::Connection)?;
    if existing.iter().any(|name| name == db) {
        return Ok(());
    }
    let created = backend.db_create(db).await;
    if settle(created, "database", db)? {
        tracing::info!(database = db, "created database");
    }
    Ok(())
}

async fn ensure_table(backend: &dyn Backend, db: &str, table: &str) -> Result<()> {
    let existing = backend.table_list(db).await.map_err(Error::Connection)?;
    if existing.iter().any(|name| name == table) {
        return Ok(());
    }
    let created = backend.table_create(db, table).await;
    if settle(created, "table", table)? {
        tracing::info!(database = db, table, "initialized new table");
    }
    Ok(())
}

/// Map a create result. `Ok(true)` if we created it, `Ok(false)` if someone
/// else got there first.
fn settle(result: BackendResult<()>, kind: &'static str, name: &str) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(BackendError::AlreadyExists(_)) => {
            tracing::debug!(kind, name, "created concurrently by another client");
            Ok(false)
        }
        Err(err) if err.is_connection_failure() => Err(Error::Connection(err)),
        Err(source) => Err(Error::SchemaEnsure {
            kind,
            name: name.to_owned(),
            source,
        }),
    }
}
