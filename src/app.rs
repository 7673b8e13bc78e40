// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::block::{Block, Snapshot};
use crate::error::StateResult;
use crate::hash::StateHash;

/// State machine that consumes consensus-ordered blocks.
///
/// Calls arrive strictly sequentially from a single commit loop, so
/// implementations take `&mut self` and need no internal locking.
pub trait Application: Send + Sync + 'static {
    /// Apply every transaction of `block` in order and return the new digest.
    ///
    /// Must reject a non-contiguous index without touching state.
    fn commit_block(&mut self, block: &Block) -> StateResult<StateHash>;

    /// Read-only capture of the state committed at `index`.
    fn snapshot(&self, index: u64) -> StateResult<Snapshot>;

    /// Replace current state with the one encoded in `snapshot`. Idempotent.
    fn restore(&mut self, snapshot: &Snapshot) -> StateResult<()>;

    fn state_hash(&self) -> StateHash;
}
