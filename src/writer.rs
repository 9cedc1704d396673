//! Background worker for fire-and-forget writes.
//!
//! Synchronous `set`/`delete` calls hand their write to this worker and
//! return. Each write runs as its own task, so writes are not ordered with
//! respect to each other; the backend's last-write-wins decides. Failures
//! go to the log, never back to the caller.

use crate::backend::{Row, Table};
use crate::error::{Error, Result};
use crate::key::Key;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

/// A write to mirror into the table.
#[derive(Debug)]
pub(crate) enum WriteOp {
    Upsert(Row),
    Delete(Key),
}

enum Command {
    Write(WriteOp),
    /// Reply once every write submitted before this one has finished.
    Barrier(oneshot::Sender<()>),
}

/// Owns the worker task. Shut it down with [`shutdown`](Self::shutdown) to
/// wait for writes still in flight.
pub(crate) struct WriteWorker {
    tx: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
}

impl WriteWorker {
    /// Spawn the worker on `runtime`.
    pub(crate) fn start(runtime: &Handle, table: Arc<dyn Table>, table_name: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let join_handle = runtime.spawn(run(table, table_name, rx));
        Self {
            tx: Mutex::new(Some(tx)),
            join_handle: Mutex::new(Some(join_handle)),
        }
    }

    /// Queue a write. Never blocks and does not need a runtime.
    pub(crate) fn submit(&self, op: WriteOp) -> Result<()> {
        self.send(Command::Write(op))
    }

    /// Wait until every write submitted so far has finished.
    pub(crate) async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Command::Barrier(done_tx))?;
        done_rx.await.map_err(|_| Error::Closed)
    }

    /// Stop accepting writes, then wait for the ones in flight.
    pub(crate) async fn shutdown(&self) {
        drop(self.tx.lock().take());
        let handle = self.join_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "write worker did not shut down cleanly");
            }
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        match self.tx.lock().as_ref() {
            Some(tx) => tx.send(command).map_err(|_| Error::Closed),
            None => Err(Error::Closed),
        }
    }
}

async fn run(
    table: Arc<dyn Table>,
    table_name: String,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut in_flight = JoinSet::new();
    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Write(op)) => {
                    let table = Arc::clone(&table);
                    let table_name = table_name.clone();
                    in_flight.spawn(async move { apply(table.as_ref(), &table_name, op).await });
                }
                Some(Command::Barrier(done)) => {
                    drain(&mut in_flight).await;
                    let _ = done.send(());
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_join(joined);
            }
        }
    }
    drain(&mut in_flight).await;
}

async fn drain(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.join_next().await {
        log_join(joined);
    }
}

fn log_join(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(err) = joined {
        tracing::error!(error = %err, "write task panicked");
    }
}

async fn apply(table: &dyn Table, table_name: &str, op: WriteOp) {
    match op {
        WriteOp::Upsert(row) => {
            let key = row.id.to_string();
            match table.upsert(row).await {
                Ok(()) => tracing::debug!(table = table_name, %key, "upserted"),
                Err(err) => {
                    tracing::error!(table = table_name, %key, error = %err, "write-through upsert failed")
                }
            }
        }
        WriteOp::Delete(key) => match table.delete(&key).await {
            Ok(removed) => tracing::debug!(table = table_name, %key, removed, "deleted"),
            Err(err) => {
                tracing::error!(table = table_name, %key, error = %err, "write-through delete failed")
            }
        },
    }
}
