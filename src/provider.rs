//! Provider type, builder, and lifecycle (init / close).
//!
//! The row-level operations (set, delete, fetch, ...) are in `gateway.rs`.

use crate::backend::{Backend, Connector, Table};
use crate::config::ProviderConfig;
use crate::connection;
use crate::error::{Error, Result};
use crate::hydrate::{self, FetchMode};
use crate::map::MapBackend;
use crate::ready::{Ready, ReadySignal};
use crate::writer::WriteWorker;
use parking_lot::RwLock;
use std::sync::Arc;

/// What this provider offers to the map it persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// Several processes may share the same table.
    pub multi_process: bool,
    /// Objects and arrays can be stored, not just primitives.
    pub complex_types: bool,
    /// Both string and number keys are accepted.
    pub multiple_key_types: bool,
}

/// Persistence provider that mirrors a caller-owned map into a table.
///
/// Build one with [`builder`](Self::builder) or [`new`](Self::new), call
/// [`init`](Self::init) once with the map, then mirror every map mutation
/// through [`set`](Self::set) / [`delete`](Self::delete) (or their `_async`
/// variants). [`close`](Self::close) when done.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use table_sync::{Key, MemoryServer, Provider};
/// use shardmap::ShardMap;
///
/// # async fn demo() -> table_sync::Result<()> {
/// let provider = Provider::builder("settings")
///     .connector(MemoryServer::new())
///     .build()?;
/// let map = Arc::new(ShardMap::<Key, serde_json::Value>::default());
/// provider.init(map.clone()).await?;
///
/// provider.set_async("theme", serde_json::json!({ "dark": true })).await?;
/// provider.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Provider {
    config: ProviderConfig,
    connector: Arc<dyn Connector>,
    signal: ReadySignal,
    init_lock: tokio::sync::Mutex<()>,
    state: RwLock<State>,
}

enum State {
    Idle,
    Open(Arc<Session>),
    Closed,
}

/// Everything that exists only between a successful `init` and `close`.
pub(crate) struct Session {
    pub(crate) map: Arc<dyn MapBackend>,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) table: Arc<dyn Table>,
    pub(crate) writer: WriteWorker,
}

impl Provider {
    /// Capabilities advertised to the host map.
    pub const FEATURES: Features = Features {
        multi_process: true,
        complex_types: true,
        multiple_key_types: true,
    };

    /// Build a provider from a config. The name is sanitized here; an empty
    /// name is a [`Error::Config`]. No I/O happens until [`init`](Self::init).
    pub fn new(config: ProviderConfig, connector: impl Connector + 'static) -> Result<Self> {
        Self::with_connector(config, Arc::new(connector))
    }

    /// Start configuring a provider for the table `name`.
    pub fn builder(name: impl Into<String>) -> ProviderBuilder {
        ProviderBuilder::new(name)
    }

    fn with_connector(config: ProviderConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        Ok(Self {
            config: config.normalized()?,
            connector,
            signal: ReadySignal::new(),
            init_lock: tokio::sync::Mutex::new(()),
            state: RwLock::new(State::Idle),
        })
    }

    // ---- accessors ----

    /// Sanitized table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration after sanitizing.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Hydration mode picked from the config.
    #[must_use]
    pub fn fetch_mode(&self) -> FetchMode {
        self.config.fetch_mode()
    }

    /// Readiness signal. Available before `init`; resolves when it completes.
    #[must_use]
    pub fn ready(&self) -> Ready {
        self.signal.subscribe()
    }

    /// `true` after [`close`](Self::close).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(*self.state.read(), State::Closed)
    }

    // ---- lifecycle ----

    /// Connect, make sure the database and table exist, hydrate `map`
    /// according to the fetch mode, then resolve the readiness signal.
    ///
    /// Runs once. Later calls return the same signal without touching the
    /// backend. If it fails the signal stays unresolved and `init` may be
    /// called again.
    ///
    /// Must be polled inside a Tokio runtime, which also runs the
    /// fire-and-forget writes. Elsewhere it fails with [`Error::Config`]
    /// before the backend is contacted.
    pub async fn init(&self, map: Arc<dyn MapBackend>) -> Result<Ready> {
        let _guard = self.init_lock.lock().await;
        match self.session() {
            Ok(_) => return Ok(self.ready()),
            Err(Error::NotInitialized) => {}
            Err(err) => return Err(err),
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Config(format!("init needs a Tokio runtime: {e}")))?;

        let link = connection::connect(self.connector.as_ref(), &self.config).await?;
        let mode = self.fetch_mode();
        if let Err(err) = hydrate::hydrate(link.table.as_ref(), map.as_ref(), mode, self.name()).await
        {
            if let Err(close_err) = link.backend.close().await {
                tracing::warn!(table = self.name(), error = %close_err, "closing after failed init");
            }
            return Err(err);
        }

        let writer = WriteWorker::start(&runtime, Arc::clone(&link.table), self.config.name.clone());
        let session = Session {
            map,
            backend: link.backend,
            table: link.table,
            writer,
        };
        *self.state.write() = State::Open(Arc::new(session));
        self.signal.resolve();
        Ok(self.ready())
    }

    /// Wait for pending fire-and-forget writes, then release the connection.
    ///
    /// Every operation afterwards fails with [`Error::Closed`]. Closing an
    /// already closed provider does nothing.
    pub async fn close(&self) -> Result<()> {
        let _guard = self.init_lock.lock().await;
        let previous = std::mem::replace(&mut *self.state.write(), State::Closed);
        let State::Open(session) = previous else {
            return Ok(());
        };

        session.writer.shutdown().await;
        session.backend.close().await.map_err(Error::Connection)?;
        tracing::info!(table = self.name(), "closed");
        Ok(())
    }

    /// Current session, or why there is none.
    pub(crate) fn session(&self) -> Result<Arc<Session>> {
        match &*self.state.read() {
            State::Open(session) => Ok(Arc::clone(session)),
            State::Idle => Err(Error::NotInitialized),
            State::Closed => Err(Error::Closed),
        }
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("config", &self.config)
            .field("ready", &self.ready().is_ready())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures a [`Provider`].
///
/// ```rust
/// use table_sync::{MemoryServer, Provider};
///
/// let provider = Provider::builder("My Test!!")
///     .host("db.internal")
///     .fetch_all(false)
///     .connector(MemoryServer::new())
///     .build()
///     .unwrap();
/// assert_eq!(provider.name(), "my_test__");
/// ```
pub struct ProviderBuilder {
    config: ProviderConfig,
    connector: Option<Arc<dyn Connector>>,
}

impl ProviderBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            config: ProviderConfig::new(name),
            connector: None,
        }
    }

    /// Backend host (default `localhost`).
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Backend port (default `28015`).
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Database holding the table (default `enmap`).
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    /// Load every row on `init` (default) or fetch on demand.
    pub fn fetch_all(mut self, yes: bool) -> Self {
        self.config.fetch_all = yes;
        self
    }

    /// How to reach the backend. Required.
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Validate the configuration and create the provider.
    pub fn build(self) -> Result<Provider> {
        let connector = self
            .connector
            .ok_or_else(|| Error::Config("a connector is required".into()))?;
        Provider::with_connector(self.config, connector)
    }
}

impl std::fmt::Debug for ProviderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBuilder")
            .field("config", &self.config)
            .field("connector", &self.connector.is_some())
            .finish()
    }
}
