// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-process adapter.
//!
//! Direct calls into an `Application` living in the same address space.
//! Reference oracle for the socket adapter: both must produce the same
//! `StateHash` sequence for the same blocks.

use std::time::Instant;

use async_trait::async_trait;
use lachesis_proxy::{Application, Block, ChainState, Snapshot, StateHash, Transaction};
use tokio::sync::RwLock;

use crate::config::ProxyConfig;
use crate::errors::Result;
use crate::proxy::AppProxy;
use crate::submit::{SubmitHandle, SubmitQueue, SubmitStream};

struct Inner<A> {
    app: A,
    committed: Vec<Transaction>,
}

pub struct InmemAppProxy<A: Application = ChainState> {
    inner: RwLock<Inner<A>>,
    submit: SubmitQueue,
}

impl InmemAppProxy<ChainState> {
    pub fn new(cfg: &ProxyConfig) -> Self {
        Self::with_app(ChainState::new(cfg.initial_index), cfg)
    }
}

impl<A: Application> InmemAppProxy<A> {
    pub fn with_app(app: A, cfg: &ProxyConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                app,
                committed: Vec::new(),
            }),
            submit: SubmitQueue::new(cfg.submit_capacity, cfg.submit_timeout),
        }
    }

    /// Queue a transaction from an in-process producer.
    pub async fn submit_tx(&self, tx: Transaction) -> Result<()> {
        self.submit.handle().submit(tx).await
    }

    pub fn submitter(&self) -> SubmitHandle {
        self.submit.handle()
    }

    /// Every transaction committed so far, in commit order.
    pub async fn committed_transactions(&self) -> Vec<Transaction> {
        self.inner.read().await.committed.clone()
    }

    pub async fn state_hash(&self) -> StateHash {
        self.inner.read().await.app.state_hash()
    }
}

#[async_trait]
impl<A: Application> AppProxy for InmemAppProxy<A> {
    fn take_submit_stream(&self) -> Option<SubmitStream> {
        self.submit.take_stream()
    }

    async fn commit_block(&self, block: Block) -> Result<StateHash> {
        let start = Instant::now();
        let mut inner = self.inner.write().await;
        let hash = inner.app.commit_block(&block)?;

        tracing::debug!("Committed block {} -> {}", block.index(), hash);
        inner.committed.extend(block.into_transactions());

        metrics::counter!("lachesis_blocks_committed_total", 1);
        metrics::histogram!("lachesis_commit_duration_seconds", start.elapsed().as_secs_f64());
        Ok(hash)
    }

    async fn get_snapshot(&self, block_index: u64) -> Result<Snapshot> {
        Ok(self.inner.read().await.app.snapshot(block_index)?)
    }

    async fn restore(&self, snapshot: Snapshot) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.app.restore(&snapshot)?;
        tracing::info!("Restored snapshot, state hash now {}", inner.app.state_hash());
        Ok(())
    }
}
