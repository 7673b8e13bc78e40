use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use lachesis_node::config::ProxyConfig;
use lachesis_node::errors::ProxyError;
use lachesis_node::proxy::AppProxy;
use lachesis_node::socket::SocketAppProxy;
use lachesis_proxy::{Block, StateHash, Transaction};
use tokio_stream::StreamExt;

/// Stand-in for the consensus core: turns submitted transactions into
/// gap-free blocks.
#[derive(Debug)]
pub struct Sequencer {
    pending: VecDeque<Transaction>,
    next_index: u64,
    round: u64,
    /// Block whose commit failed on the transport and will be resent as-is.
    retry: Option<Block>,
}

impl Sequencer {
    pub fn new(initial_index: u64) -> Self {
        Self {
            pending: VecDeque::new(),
            next_index: initial_index,
            round: 0,
            retry: None,
        }
    }

    pub fn push(&mut self, tx: Transaction) {
        self.pending.push_back(tx);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Next block to commit, if there is anything to commit.
    pub fn next_block(&mut self, max_txs: usize) -> Option<Block> {
        if let Some(block) = self.retry.take() {
            return Some(block);
        }
        if self.pending.is_empty() {
            return None;
        }

        let take = self.pending.len().min(max_txs.max(1));
        let txs: Vec<Transaction> = self.pending.drain(..take).collect();
        let block = Block::new(self.next_index, self.round, vec![], txs);
        self.next_index += 1;
        self.round += 1;
        Some(block)
    }

    pub fn requeue(&mut self, block: Block) {
        self.retry = Some(block);
    }

    /// True when the next block handed out is a resend.
    pub fn has_retry(&self) -> bool {
        self.retry.is_some()
    }
}

/// A resent block `index` rejected because the application already expects
/// `index + 1`: the attempt that timed out did land.
pub fn already_applied(err: &ProxyError, index: u64) -> bool {
    matches!(
        err,
        ProxyError::Sequencing { expected, got } if *got == index && index.checked_add(1) == Some(*expected)
    )
}

async fn applied_hash(proxy: &SocketAppProxy, index: u64) -> Option<StateHash> {
    match proxy.get_snapshot(index).await {
        Ok(snapshot) => StateHash::from_slice(snapshot.as_bytes()),
        Err(e) => {
            tracing::warn!("Could not read back block {}: {}", index, e);
            None
        }
    }
}

/// Drains the submit stream of a `SocketAppProxy` and commits a block every
/// `block_interval` until `shutdown` resolves.
///
/// Transport failures keep the block for the next tick. If the resend is
/// refused because the application is already past it, the earlier attempt
/// counts as committed. Any other sequencing or application error stops the
/// sequencer.
pub async fn run<F>(
    cfg: &ProxyConfig,
    block_interval: Duration,
    max_block_txs: usize,
    shutdown: F,
) -> anyhow::Result<u64>
where
    F: Future<Output = ()>,
{
    let proxy = SocketAppProxy::bind(cfg).await?;
    let mut submissions = proxy
        .take_submit_stream()
        .context("submit stream already taken")?;
    let mut sequencer = Sequencer::new(cfg.initial_index);
    let mut ticker = tokio::time::interval(block_interval);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            tx = submissions.next() => match tx {
                Some(tx) => sequencer.push(tx),
                None => break,
            },
            _ = ticker.tick() => {
                let resent = sequencer.has_retry();
                let Some(block) = sequencer.next_block(max_block_txs) else { continue };
                let index = block.index();
                let tx_count = block.transactions().len();

                match proxy.commit_block(block.clone()).await {
                    Ok(hash) => tracing::info!("Block {} ({} txs) -> {}", index, tx_count, hash),
                    Err(e) if resent && already_applied(&e, index) => match applied_hash(&proxy, index).await {
                        Some(hash) => tracing::info!("Block {} ({} txs) already applied -> {}", index, tx_count, hash),
                        None => tracing::info!("Block {} ({} txs) already applied", index, tx_count),
                    },
                    Err(e) if e.is_transport() => {
                        tracing::warn!("Block {} not committed: {}. Retrying next tick", index, e);
                        sequencer.requeue(block);
                    }
                    Err(e) => {
                        proxy.shutdown();
                        return Err(e).with_context(|| format!("commit of block {} failed", index));
                    }
                }
            }
        }
    }

    proxy.shutdown();
    tracing::info!(
        "Sequencer stopped at index {} with {} pending transactions",
        sequencer.next_index(),
        sequencer.pending()
    );
    Ok(sequencer.next_index())
}
