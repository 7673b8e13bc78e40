// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! RPC envelope.
//!
//! One JSON document per line. Every request carries a correlation id that
//! the response echoes, so a client can drop responses to calls it has
//! already given up on.

use std::time::Duration;

use lachesis_proxy::{Block, Snapshot, StateError, StateHash, Transaction};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};

use crate::errors::{ProxyError, Result};

pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub type Connection = Framed<TcpStream, LinesCodec>;

pub fn framed(stream: TcpStream) -> Connection {
    Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_LEN))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    CommitBlock(Block),
    GetSnapshot(u64),
    Restore(Snapshot),
    SubmitTx(Transaction),
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::CommitBlock(_) => "CommitBlock",
            Method::GetSnapshot(_) => "GetSnapshot",
            Method::Restore(_) => "Restore",
            Method::SubmitTx(_) => "SubmitTx",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub method: Method,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    StateHash(StateHash),
    Snapshot(Snapshot),
    Ack,
}

/// Error as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireError {
    State(StateError),
    Malformed(String),
    SubmitTimeout { after_ms: u64 },
    SubmitClosed,
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    pub result: std::result::Result<Reply, WireError>,
}

impl Response {
    pub fn into_result(self) -> Result<Reply> {
        self.result.map_err(ProxyError::from)
    }
}

impl From<WireError> for ProxyError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::State(state) => ProxyError::from(state),
            WireError::Malformed(msg) => ProxyError::Encoding(msg),
            WireError::SubmitTimeout { after_ms } => {
                ProxyError::SubmitTimeout(Duration::from_millis(after_ms))
            }
            WireError::SubmitClosed => ProxyError::SubmitClosed,
            WireError::Internal(msg) => ProxyError::Application(StateError::Rejected(msg)),
        }
    }
}

impl From<ProxyError> for WireError {
    fn from(e: ProxyError) -> Self {
        match e {
            ProxyError::Sequencing { expected, got } => {
                WireError::State(StateError::OutOfOrder { expected, got })
            }
            ProxyError::Application(state) => WireError::State(state),
            ProxyError::Encoding(msg) => WireError::Malformed(msg),
            ProxyError::SubmitTimeout(after) => WireError::SubmitTimeout {
                after_ms: after.as_millis() as u64,
            },
            ProxyError::SubmitClosed => WireError::SubmitClosed,
            other => WireError::Internal(other.to_string()),
        }
    }
}

impl From<LinesCodecError> for ProxyError {
    fn from(e: LinesCodecError) -> Self {
        match e {
            LinesCodecError::MaxLineLengthExceeded => {
                ProxyError::Encoding(format!("frame exceeds {} bytes", MAX_FRAME_LEN))
            }
            LinesCodecError::Io(io) => ProxyError::Transport(io.to_string()),
        }
    }
}

pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T> {
    Ok(serde_json::from_str(line)?)
}

/// Unwraps the reply a given method is expected to produce.
pub fn expect_state_hash(reply: Reply) -> Result<StateHash> {
    match reply {
        Reply::StateHash(hash) => Ok(hash),
        other => Err(ProxyError::Encoding(format!("expected state hash, got {:?}", other))),
    }
}

pub fn expect_snapshot(reply: Reply) -> Result<Snapshot> {
    match reply {
        Reply::Snapshot(snapshot) => Ok(snapshot),
        other => Err(ProxyError::Encoding(format!("expected snapshot, got {:?}", other))),
    }
}

pub fn expect_ack(reply: Reply) -> Result<()> {
    match reply {
        Reply::Ack => Ok(()),
        other => Err(ProxyError::Encoding(format!("expected ack, got {:?}", other))),
    }
}
