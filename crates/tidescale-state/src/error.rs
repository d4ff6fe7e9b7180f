//! Error types for the local state store.

use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("group not found: {0}")]
    NotFound(String),

    #[error("invalid group {group}: {reason}")]
    InvalidGroup { group: String, reason: String },

    #[error("desired capacity {desired} for {group} is outside [{min}, {max}]")]
    OutOfBounds {
        group: String,
        desired: i64,
        min: i64,
        max: i64,
    },

    #[error("scaling activity in progress for {group}: cooldown ends in {remaining_secs}s")]
    CooldownActive { group: String, remaining_secs: u64 },
}
