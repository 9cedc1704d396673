//! Unified error type for all provider operations.

use crate::backend::BackendError;

/// Things that can go wrong when using the provider.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Bad configuration (missing name, missing connector, ...).
    #[error("config error: {0}")]
    Config(String),
    /// Key is null, an empty string, or not a string/number.
    #[error("invalid key type: {0}")]
    InvalidKeyType(String),
    /// Value could not be turned into JSON.
    #[error("encode error: {0}")]
    Encode(String),
    /// Backend unreachable or refused the credentials.
    #[error("connection error: {0}")]
    Connection(#[source] BackendError),
    /// Creating the database or table failed for a reason other than
    /// "already exists".
    #[error("could not create {kind} `{name}`: {source}")]
    SchemaEnsure {
        /// `"database"` or `"table"`.
        kind: &'static str,
        /// Name of the object that could not be created.
        name: String,
        /// What the backend said.
        #[source]
        source: BackendError,
    },
    /// The full-table read failed while hydrating.
    #[error("hydration failed: {0}")]
    Hydration(#[source] BackendError),
    /// A single-row read failed.
    #[error("backend read error: {0}")]
    BackendRead(#[source] BackendError),
    /// An upsert or delete failed after validation passed.
    #[error("backend write error: {0}")]
    BackendWrite(#[source] BackendError),
    /// A stored payload looks like JSON but does not parse.
    #[error("cannot decode payload for key `{key}`: {message}")]
    Decode {
        /// Row id the payload belongs to.
        key: String,
        /// Parser message.
        message: String,
    },
    /// Operation attempted before `init`.
    #[error("provider is not initialized")]
    NotInitialized,
    /// Operation attempted after `close`.
    #[error("provider is closed")]
    Closed,
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
