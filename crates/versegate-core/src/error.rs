//! Core error types for versegate-core.
//!
//! Errors are layered: each concern (storage, scheduling, shielding,
//! configuration) owns a small enum, and [`CoreError`] wraps them for
//! callers that only want to report. Decode failures on read paths are
//! deliberately absent from this hierarchy -- those fail open to "absent".

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for versegate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Durable store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Arming or disarming the daily interval failed
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Blocking capability provider errors
    #[error("Shield error: {0}")]
    Shield(#[from] ShieldError),

    /// Unlock ritual errors
    #[error("Unlock error: {0}")]
    Unlock(#[from] UnlockError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Durable shared store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Could not resolve the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Store migration failed: {0}")]
    MigrationFailed(String),

    /// Another process holds the write lock past the busy timeout
    #[error("Store is locked by another process")]
    Locked,

    /// Entity could not be serialized before writing
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Failure to serialize an entity before writing it.
#[derive(Error, Debug)]
#[error("Failed to encode '{key}': {source}")]
pub struct EncodeError {
    pub key: String,
    #[source]
    pub source: serde_json::Error,
}

/// Errors from the schedule controller.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Start time outside the valid daily window
    #[error("Invalid start time {hour:02}:{minute:02}: must be before 23:59")]
    InvalidStart { hour: u32, minute: u32 },

    /// The OS scheduler refused to register the interval
    #[error("Scheduler refused to arm '{activity}': {reason}")]
    Refused { activity: String, reason: String },

    /// Missing authorization to monitor device activity
    #[error("Permission denied for '{activity}'")]
    PermissionDenied { activity: String },

    /// The schedule could not be persisted
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScheduleError {
    /// Whether retrying the same arm request can succeed without user action
    /// beyond granting permission.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ScheduleError::InvalidStart { .. })
    }
}

/// Errors from the blocking capability provider.
#[derive(Error, Debug)]
pub enum ShieldError {
    /// Provider rejected the request
    #[error("Shield provider '{policy_store}' failed: {message}")]
    Provider {
        policy_store: String,
        message: String,
    },

    /// Provider state could not be persisted
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the unlock state machine.
#[derive(Error, Debug)]
pub enum UnlockError {
    /// Devotional acknowledged before the verse on the regular path
    #[error("Verse has not been read today")]
    VerseNotRead,

    /// Reading state could not be persisted
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Clearing the block failed after the devotional was recorded
    #[error(transparent)]
    Shield(#[from] ShieldError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
