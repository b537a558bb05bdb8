mod config;
pub mod database;
pub mod keys;
pub mod migrations;

pub use config::{Config, LoggingConfig, ScheduleConfig, ShieldConfig, StorageConfig};
pub use database::Database;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::{EncodeError, StoreError};

/// Process-agnostic key/value persistence shared by the app and the
/// trigger handler.
///
/// Each key holds one self-contained entity. Writes are last-writer-wins
/// per key and must be durable when `put` returns: the calling process may
/// be torn down immediately afterwards.
pub trait KvStore {
    /// Write `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Read the value under `key`. Read failures are logged and reported
    /// as absent.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Serialize `value` as JSON and write it under `key`.
pub fn put_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: KvStore + ?Sized,
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec(value).map_err(|source| EncodeError {
        key: key.to_string(),
        source,
    })?;
    store.put(key, &bytes)
}

/// Read and decode a JSON value. Missing keys and corrupt payloads are both
/// `None`; the latter is logged.
pub fn get_json<S, T>(store: &S, key: &str) -> Option<T>
where
    S: KvStore + ?Sized,
    T: DeserializeOwned,
{
    let bytes = store.get(key)?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding undecodable value");
            None
        }
    }
}

/// Returns the data directory shared by every versegate process.
///
/// `VERSEGATE_DATA_DIR` overrides the location entirely. Otherwise this is
/// `~/.config/versegate[-dev]/`, with `VERSEGATE_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let dir = match std::env::var_os("VERSEGATE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env =
                std::env::var("VERSEGATE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("versegate-dev")
            } else {
                base_dir.join("versegate")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StoreError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_helpers_fail_open_on_garbage() {
        let db = Database::open_memory().unwrap();
        db.put("thing", b"\xff\x00not json").unwrap();
        let value: Option<Vec<u32>> = get_json(&db, "thing");
        assert!(value.is_none());
    }

    #[test]
    fn json_helpers_store_values() {
        let db = Database::open_memory().unwrap();
        put_json(&db, "numbers", &vec![1u32, 2, 3]).unwrap();
        let value: Option<Vec<u32>> = get_json(&db, "numbers");
        assert_eq!(value, Some(vec![1, 2, 3]));
    }
}
