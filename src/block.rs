// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde::{Deserialize, Serialize};

/// Opaque transaction payload.
pub type Transaction = Vec<u8>;

/// An ordered, indexed batch of transactions finalized by consensus.
///
/// Produced by the consensus core, consumed exactly once by `commit_block`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    round_received: u64,
    /// Consensus-internal linkage, passed through verbatim.
    frame_hash: Vec<u8>,
    transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(
        index: u64,
        round_received: u64,
        frame_hash: Vec<u8>,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            index,
            round_received,
            frame_hash,
            transactions,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn round_received(&self) -> u64 {
        self.round_received
    }

    pub fn frame_hash(&self) -> &[u8] {
        &self.frame_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }
}

/// Application-defined capture of state at a committed block index.
///
/// For `ChainState` this is exactly the 32 bytes of the `StateHash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot(pub Vec<u8>);

impl Snapshot {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Snapshot {
    fn from(bytes: Vec<u8>) -> Self {
        Snapshot(bytes)
    }
}
