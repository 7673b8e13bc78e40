// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use lachesis_proxy::{Block, Snapshot, StateHash};

use crate::config::ProxyConfig;
use crate::errors::{ProxyError, Result};
use crate::proxy::AppProxy;
use crate::rpc::{RpcClient, RpcHandler, RpcServer};
use crate::submit::{SubmitHandle, SubmitQueue, SubmitStream};
use crate::wire::{self, Method, Reply};

/// Consensus-side adapter for an application running in another process.
///
/// Serves `SubmitTx` on `proxy_addr` and calls the application on
/// `client_addr` for commit, snapshot and restore.
pub struct SocketAppProxy {
    client: RpcClient,
    server: RpcServer,
    submit: SubmitQueue,
}

impl SocketAppProxy {
    pub async fn bind(cfg: &ProxyConfig) -> Result<Self> {
        let submit = SubmitQueue::new(cfg.submit_capacity, cfg.submit_timeout);
        let service = Arc::new(SubmitService {
            submit: submit.handle(),
        });
        let server = RpcServer::bind(cfg.proxy_addr, service).await?;
        let client = RpcClient::new(cfg.client_addr, cfg.timeout);

        tracing::info!(
            "SocketAppProxy serving submissions on {}, application at {}",
            server.local_addr(),
            cfg.client_addr
        );

        Ok(Self {
            client,
            server,
            submit,
        })
    }

    pub fn proxy_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    pub fn client_addr(&self) -> SocketAddr {
        self.client.addr()
    }

    pub fn shutdown(&self) {
        self.server.shutdown();
    }
}

#[async_trait]
impl AppProxy for SocketAppProxy {
    fn take_submit_stream(&self) -> Option<SubmitStream> {
        self.submit.take_stream()
    }

    async fn commit_block(&self, block: Block) -> Result<StateHash> {
        let start = Instant::now();
        let index = block.index();
        let hash = wire::expect_state_hash(self.client.call(Method::CommitBlock(block)).await?)?;

        tracing::debug!("Application committed block {} -> {}", index, hash);
        metrics::counter!("lachesis_blocks_committed_total", 1);
        metrics::histogram!("lachesis_commit_duration_seconds", start.elapsed().as_secs_f64());
        Ok(hash)
    }

    async fn get_snapshot(&self, block_index: u64) -> Result<Snapshot> {
        wire::expect_snapshot(self.client.call(Method::GetSnapshot(block_index)).await?)
    }

    async fn restore(&self, snapshot: Snapshot) -> Result<()> {
        wire::expect_ack(self.client.call(Method::Restore(snapshot)).await?)
    }
}

struct SubmitService {
    submit: SubmitHandle,
}

#[async_trait]
impl RpcHandler for SubmitService {
    async fn handle(&self, method: Method) -> Result<Reply> {
        match method {
            Method::SubmitTx(tx) => {
                self.submit.submit(tx).await?;
                Ok(Reply::Ack)
            }
            other => Err(ProxyError::Encoding(format!(
                "{} is not served on the proxy address",
                other.name()
            ))),
        }
    }
}
