// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Reference application: a bare hash chain.
//!
//! # Semantics
//! - `state_hash` advances only through `commit_block`
//! - every committed index keeps its resulting digest (full history)
//! - a snapshot is exactly the 32 bytes of that digest
//! - out-of-order commits, and a commit at `u64::MAX`, are rejected before any mutation

use std::collections::BTreeMap;

use crate::app::Application;
use crate::block::{Block, Snapshot};
use crate::error::{StateError, StateResult};
use crate::hash::StateHash;

#[derive(Debug, Clone)]
pub struct ChainState {
    state_hash: StateHash,
    /// Index the next commit must carry.
    next_index: u64,
    /// Digest after each committed block.
    history: BTreeMap<u64, StateHash>,
}

impl ChainState {
    pub fn new(initial_index: u64) -> Self {
        Self {
            state_hash: StateHash::GENESIS,
            next_index: initial_index,
            history: BTreeMap::new(),
        }
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Last committed index, if any block has been committed since genesis or restore.
    pub fn committed_height(&self) -> Option<u64> {
        self.history.keys().next_back().copied()
    }
}

impl Default for ChainState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Application for ChainState {
    fn commit_block(&mut self, block: &Block) -> StateResult<StateHash> {
        if block.index() != self.next_index {
            return Err(StateError::OutOfOrder {
                expected: self.next_index,
                got: block.index(),
            });
        }

        let next_index = block
            .index()
            .checked_add(1)
            .ok_or(StateError::IndexExhausted(block.index()))?;
        let hash = self
            .state_hash
            .fold(block.transactions().iter().map(Vec::as_slice));

        self.state_hash = hash;
        self.history.insert(block.index(), hash);
        self.next_index = next_index;
        Ok(hash)
    }

    fn snapshot(&self, index: u64) -> StateResult<Snapshot> {
        self.history
            .get(&index)
            .map(|hash| Snapshot(hash.as_bytes().to_vec()))
            .ok_or(StateError::SnapshotNotFound(index))
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StateResult<()> {
        let hash = StateHash::from_slice(snapshot.as_bytes()).ok_or_else(|| {
            StateError::InvalidSnapshot(format!(
                "expected 32 bytes, got {}",
                snapshot.as_bytes().len()
            ))
        })?;

        // Rollback to a point we have seen: rewind the cursor and drop newer history.
        let known = self
            .history
            .iter()
            .rev()
            .find(|(_, h)| **h == hash)
            .map(|(idx, _)| *idx);

        if let Some(idx) = known {
            self.history.retain(|i, _| *i <= idx);
            self.next_index = idx + 1;
        }

        self.state_hash = hash;
        Ok(())
    }

    fn state_hash(&self) -> StateHash {
        self.state_hash
    }
}
