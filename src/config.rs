//! Provider configuration.

use crate::error::{Error, Result};
use crate::hydrate::FetchMode;
use crate::key::sanitize_name;
use serde::{Deserialize, Serialize};

/// Host used when none is given.
pub const DEFAULT_HOST: &str = "localhost";
/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 28015;
/// Database used when none is given.
pub const DEFAULT_DATABASE: &str = "enmap";

/// Where the table lives and how it is loaded.
///
/// Every field except `name` has a default, so a config can be read from a
/// JSON document as small as `{"name": "settings"}`:
///
/// ```rust
/// use table_sync::ProviderConfig;
///
/// let config: ProviderConfig = serde_json::from_str(r#"{"name": "settings"}"#).unwrap();
/// assert_eq!(config.port, 28015);
/// assert!(config.fetch_all);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Table name. Sanitized to `[a-z0-9_]+` when the provider is built.
    pub name: String,
    /// Backend host.
    pub host: String,
    /// Backend port.
    pub port: u16,
    /// Database holding the table.
    pub database: String,
    /// Load the whole table on `init` (`true`) or fetch keys on demand.
    pub fetch_all: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_owned(),
            fetch_all: true,
        }
    }
}

impl ProviderConfig {
    /// Defaults plus the given table name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Hydration mode selected by [`fetch_all`](Self::fetch_all).
    pub fn fetch_mode(&self) -> FetchMode {
        FetchMode::from_fetch_all(self.fetch_all)
    }

    /// Validate and sanitize. Called once by the provider at construction.
    pub(crate) fn normalized(mut self) -> Result<Self> {
        if self.name.is_empty() {
            return Err(Error::Config("a provider name is required".into()));
        }
        if self.database.is_empty() {
            return Err(Error::Config("database name must not be empty".into()));
        }
        self.name = sanitize_name(&self.name);
        Ok(self)
    }
}
