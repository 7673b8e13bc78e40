//! Error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by an `Application` state machine.
///
/// Serializable so a remote application can report them verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateError {
    /// Block index is not exactly one past the last committed index.
    #[error("block {got} out of order, expected {expected}")]
    OutOfOrder { expected: u64, got: u64 },
    /// No snapshot retained for this index.
    #[error("no snapshot for block {0}")]
    SnapshotNotFound(u64),
    /// Snapshot bytes could not be decoded into state.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    /// Block carries the last representable index; nothing could follow it.
    #[error("block index {0} leaves no room for a successor")]
    IndexExhausted(u64),
    /// Application-defined failure.
    #[error("rejected by application: {0}")]
    Rejected(String),
}

pub type StateResult<T> = core::result::Result<T, StateError>;
