// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use async_trait::async_trait;
use lachesis_proxy::{Block, Snapshot, StateHash};

use crate::errors::Result;
use crate::submit::SubmitStream;

/// The replication boundary between the consensus core and an application.
///
/// The core calls `commit_block` once per finalized block, in gap-free index
/// order, from a single task. Errors are returned as-is and never retried here.
#[async_trait]
pub trait AppProxy: Send + Sync {
    /// Hands the submit sequence to its single consumer. `None` once taken.
    fn take_submit_stream(&self) -> Option<SubmitStream>;

    async fn commit_block(&self, block: Block) -> Result<StateHash>;

    async fn get_snapshot(&self, block_index: u64) -> Result<Snapshot>;

    async fn restore(&self, snapshot: Snapshot) -> Result<()>;
}
