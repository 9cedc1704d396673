//! Loading table rows into the caller's map.

use crate::backend::{Row, Table};
use crate::codec;
use crate::error::{Error, Result};
use crate::key::{canonical_number, Key};
use crate::map::MapBackend;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Controls how the map gets filled on `init`.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Read every row on `init`. Readiness waits for the load.
    #[default]
    Eager,
    /// Read nothing on `init`; keys are loaded with
    /// [`fetch`](crate::Provider::fetch).
    Lazy,
}

impl FetchMode {
    /// `Eager` for `true`, `Lazy` for `false`.
    pub fn from_fetch_all(fetch_all: bool) -> Self {
        if fetch_all {
            FetchMode::Eager
        } else {
            FetchMode::Lazy
        }
    }
}

/// Run the initial load for `mode`. Returns the number of rows inserted.
pub(crate) async fn hydrate(
    table: &dyn Table,
    map: &dyn MapBackend,
    mode: FetchMode,
    table_name: &str,
) -> Result<usize> {
    match mode {
        FetchMode::Eager => {
            let loaded = load_all(table, map).await?;
            tracing::info!(table = table_name, rows = loaded, "loaded rows");
            Ok(loaded)
        }
        FetchMode::Lazy => {
            tracing::info!(table = table_name, "lazy mode, rows are fetched on demand");
            Ok(0)
        }
    }
}

/// Read every row and insert it into `map`.
///
/// All payloads are decoded before the first insert, so a corrupt row leaves
/// the map untouched.
pub(crate) async fn load_all(table: &dyn Table, map: &dyn MapBackend) -> Result<usize> {
    let rows = table.read_all().await.map_err(Error::Hydration)?;
    let decoded = rows
        .into_iter()
        .map(decode_row)
        .collect::<Result<Vec<_>>>()?;

    let count = decoded.len();
    for (key, value) in decoded {
        map.insert(key, value);
    }
    Ok(count)
}

/// Decode a row's payload into a map entry.
pub(crate) fn decode_row(row: Row) -> Result<(Key, Value)> {
    let id = match row.id {
        Key::Num(n) => Key::Num(canonical_number(&n)),
        key => key,
    };
    match codec::decode(row.data) {
        Ok(value) => Ok((id, value)),
        Err(e) => Err(Error::Decode {
            key: id.to_string(),
            message: e.to_string(),
        }),
    }
}
