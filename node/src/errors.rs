// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::time::Duration;

use lachesis_proxy::StateError;
use thiserror::Error;

/// Everything a proxy call can fail with.
///
/// Sequencing, transport, application and encoding failures stay distinct so
/// the consensus core can pick its own retry or resync policy. Nothing here is
/// retried internally, apart from the single reconnect of `RpcClient`.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("block {got} out of order, expected {expected}")]
    Sequencing { expected: u64, got: u64 },
    #[error("application error: {0}")]
    Application(StateError),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{method} timed out after {after:?}")]
    Timeout { method: &'static str, after: Duration },
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("submit queue full for {0:?}")]
    SubmitTimeout(Duration),
    #[error("submit queue closed")]
    SubmitClosed,
}

impl ProxyError {
    /// Network-level failure; the operation may not have reached the application.
    pub fn is_transport(&self) -> bool {
        matches!(self, ProxyError::Transport(_) | ProxyError::Timeout { .. })
    }
}

impl From<StateError> for ProxyError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::OutOfOrder { expected, got } => ProxyError::Sequencing { expected, got },
            other => ProxyError::Application(other),
        }
    }
}

impl From<std::io::Error> for ProxyError {
    fn from(e: std::io::Error) -> Self {
        ProxyError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(e: serde_json::Error) -> Self {
        ProxyError::Encoding(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
