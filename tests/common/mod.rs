#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use table_sync::backend::BackendResult;
use table_sync::{
    Backend, BackendError, Connector, DefaultMap, Key, MemoryServer, Provider, Row, Table,
};

/// Switches and counters shared by a [`ProbeConnector`] and everything it hands out.
#[derive(Default)]
pub struct Probe {
    calls: AtomicUsize,
    pub unreachable: AtomicBool,
    pub fail_writes: AtomicBool,
    pub lose_create_race: AtomicBool,
    pub refuse_create: AtomicBool,
}

impl Probe {
    /// Backend calls seen so far, connects included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn set(flag: &AtomicBool, on: bool) {
        flag.store(on, Ordering::SeqCst);
    }
}

/// Wraps a [`MemoryServer`], counts every call and injects failures.
#[derive(Clone)]
pub struct ProbeConnector {
    server: MemoryServer,
    pub probe: Arc<Probe>,
}

impl ProbeConnector {
    pub fn new(server: MemoryServer) -> Self {
        Self {
            server,
            probe: Arc::new(Probe::default()),
        }
    }
}

#[async_trait]
impl Connector for ProbeConnector {
    async fn connect(&self, host: &str, port: u16) -> BackendResult<Arc<dyn Backend>> {
        self.probe.hit();
        if self.probe.unreachable.load(Ordering::SeqCst) {
            return Err(BackendError::Unreachable(format!("{host}:{port} refused")));
        }
        let inner = self.server.connect(host, port).await?;
        Ok(Arc::new(ProbeBackend {
            inner,
            probe: Arc::clone(&self.probe),
        }))
    }
}

struct ProbeBackend {
    inner: Arc<dyn Backend>,
    probe: Arc<Probe>,
}

impl ProbeBackend {
    /// Create through `create`, then pretend another client beat us to it.
    async fn create<F>(&self, what: String, create: F) -> BackendResult<()>
    where
        F: std::future::Future<Output = BackendResult<()>>,
    {
        self.probe.hit();
        if self.probe.refuse_create.load(Ordering::SeqCst) {
            return Err(BackendError::Other("permission denied".into()));
        }
        create.await?;
        if self.probe.lose_create_race.load(Ordering::SeqCst) {
            return Err(BackendError::AlreadyExists(what));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for ProbeBackend {
    async fn db_list(&self) -> BackendResult<Vec<String>> {
        self.probe.hit();
        self.inner.db_list().await
    }

    async fn db_create(&self, db: &str) -> BackendResult<()> {
        self.create(db.to_owned(), self.inner.db_create(db)).await
    }

    async fn table_list(&self, db: &str) -> BackendResult<Vec<String>> {
        self.probe.hit();
        self.inner.table_list(db).await
    }

    async fn table_create(&self, db: &str, table: &str) -> BackendResult<()> {
        self.create(table.to_owned(), self.inner.table_create(db, table))
            .await
    }

    async fn table_drop(&self, db: &str, table: &str) -> BackendResult<()> {
        self.probe.hit();
        self.inner.table_drop(db, table).await
    }

    fn table(&self, db: &str, table: &str) -> Arc<dyn Table> {
        Arc::new(ProbeTable {
            inner: self.inner.table(db, table),
            probe: Arc::clone(&self.probe),
        })
    }

    async fn close(&self) -> BackendResult<()> {
        self.probe.hit();
        self.inner.close().await
    }
}

struct ProbeTable {
    inner: Arc<dyn Table>,
    probe: Arc<Probe>,
}

impl ProbeTable {
    fn write_gate(&self) -> BackendResult<()> {
        self.probe.hit();
        if self.probe.fail_writes.load(Ordering::SeqCst) {
            Err(BackendError::Other("disk full".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Table for ProbeTable {
    async fn upsert(&self, row: Row) -> BackendResult<()> {
        self.write_gate()?;
        self.inner.upsert(row).await
    }

    async fn get(&self, id: &Key) -> BackendResult<Option<Row>> {
        self.probe.hit();
        self.inner.get(id).await
    }

    async fn delete(&self, id: &Key) -> BackendResult<u64> {
        self.write_gate()?;
        self.inner.delete(id).await
    }

    async fn delete_all(&self) -> BackendResult<u64> {
        self.write_gate()?;
        self.inner.delete_all().await
    }

    async fn read_all(&self) -> BackendResult<Vec<Row>> {
        self.probe.hit();
        self.inner.read_all().await
    }
}

// ---- helpers ----------------------------------------------------------------

pub fn new_map() -> Arc<DefaultMap> {
    Arc::new(DefaultMap::default())
}

pub fn provider(server: &MemoryServer, name: &str) -> Provider {
    Provider::builder(name)
        .connector(server.clone())
        .build()
        .unwrap()
}

pub fn lazy_provider(server: &MemoryServer, name: &str) -> Provider {
    Provider::builder(name)
        .fetch_all(false)
        .connector(server.clone())
        .build()
        .unwrap()
}

/// Write raw rows straight into `enmap.<table>`, creating it if needed.
pub async fn seed(server: &MemoryServer, table: &str, rows: Vec<(Key, Value)>) {
    let conn = server.connect("localhost", 28015).await.unwrap();
    let _ = conn.db_create("enmap").await;
    let _ = conn.table_create("enmap", table).await;
    let handle = conn.table("enmap", table);
    for (id, data) in rows {
        handle.upsert(Row { id, data }).await.unwrap();
    }
}
