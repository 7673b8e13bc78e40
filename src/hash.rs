// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Hash Chain
//!
//! BLAKE3 is the canonical primitive. The chain is a left fold over the
//! transactions of each block:
//!
//! ```text
//! h' = BLAKE3(h || BLAKE3(tx))
//! ```
//!
//! Two replicas that commit the same blocks in the same order end with the
//! same `StateHash`, byte for byte. Cross-node fork detection relies on this.

use core::fmt;
use serde::{Deserialize, Serialize};

pub const HASH_LEN: usize = 32;

/// Digest of the application state after a prefix of committed blocks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StateHash(pub [u8; HASH_LEN]);

impl StateHash {
    /// The digest before any block has been committed.
    pub const GENESIS: StateHash = StateHash([0u8; HASH_LEN]);

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Option<StateHash> {
        let arr: [u8; HASH_LEN] = bytes.try_into().ok()?;
        Some(StateHash(arr))
    }

    /// Fold one transaction into the chain.
    pub fn advance(self, tx: &[u8]) -> StateHash {
        chain(&self, &StateHash(hash_bytes(tx)))
    }

    /// Fold every transaction of a block, left to right.
    pub fn fold<'a, I>(self, txs: I) -> StateHash
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        txs.into_iter().fold(self, StateHash::advance)
    }
}

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.iter() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateHash({})", self)
    }
}

/// BLAKE3 of a byte slice.
pub fn hash_bytes(data: &[u8]) -> [u8; HASH_LEN] {
    *blake3::hash(data).as_bytes()
}

/// Combine the prior state digest with a transaction digest.
///
/// Order matters: `chain(a, b) != chain(b, a)`.
pub fn chain(prev: &StateHash, tx_hash: &StateHash) -> StateHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&prev.0);
    hasher.update(&tx_hash.0);
    StateHash(*hasher.finalize().as_bytes())
}
