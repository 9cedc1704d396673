//! Write-through persistence for in-memory key-value maps.
//!
//! A [`Provider`] keeps a caller-owned map (ShardMap, `RwLock<HashMap>`,
//! DashMap, or your own [`MapBackend`]) in sync with one table of a
//! database reached through the [`backend`] traits:
//!
//! - `init` connects, creates the database and table if needed, and loads
//!   every row into the map (or, with `fetch_all(false)`, nothing until you
//!   [`fetch`](Provider::fetch) it);
//! - every mutation of the map is mirrored with [`set`](Provider::set) /
//!   [`delete`](Provider::delete) (fire-and-forget) or
//!   [`set_async`](Provider::set_async) / [`delete_async`](Provider::delete_async)
//!   (awaited);
//! - objects and arrays are stored as JSON text, primitives as they are.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use shardmap::ShardMap;
//! use table_sync::{Key, MemoryServer, Provider};
//!
//! # #[tokio::main]
//! # async fn main() -> table_sync::Result<()> {
//! let provider = Provider::builder("sessions")
//!     .connector(MemoryServer::new())
//!     .build()?;
//! let map = Arc::new(ShardMap::<Key, serde_json::Value>::default());
//! provider.init(map.clone()).await?;
//!
//! map.insert(Key::from("alice"), json!({ "visits": 1 }));
//! provider.set("alice", json!({ "visits": 1 }))?;
//! provider.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Several providers (in one process or many) can share a table; concurrent
//! writes to one key resolve last-write-wins in the backend. Nothing is
//! transactional.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod codec;
pub mod config;
mod connection;
pub mod error;
mod gateway;
pub mod hydrate;
pub mod key;
pub mod map;
pub mod provider;
pub mod ready;
mod writer;

pub use backend::{Backend, BackendError, Connector, MemoryServer, Row, Table};
pub use config::ProviderConfig;
pub use error::{Error, Result};
pub use hydrate::FetchMode;
pub use key::{sanitize_name, validate_key, Key};
pub use map::MapBackend;
pub use provider::{Features, Provider, ProviderBuilder};
pub use ready::Ready;

/// Default map: ShardMap.
pub type DefaultMap = shardmap::ShardMap<Key, serde_json::Value>;
