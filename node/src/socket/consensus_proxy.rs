// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use lachesis_proxy::{Application, ChainState, StateHash, Transaction};
use tokio::sync::RwLock;

use crate::config::ProxyConfig;
use crate::errors::{ProxyError, Result};
use crate::rpc::{RpcClient, RpcHandler, RpcServer};
use crate::wire::{self, Method, Reply};

/// Application-side mirror of `SocketAppProxy`.
///
/// Serves commit, snapshot and restore on `client_addr` by delegating to the
/// embedded `Application`, and submits transactions to the core on `proxy_addr`.
pub struct SocketConsensusProxy<A: Application = ChainState> {
    service: Arc<AppService<A>>,
    server: RpcServer,
    client: RpcClient,
}

impl<A: Application> SocketConsensusProxy<A> {
    pub async fn bind(app: A, cfg: &ProxyConfig) -> Result<Self> {
        let service = Arc::new(AppService {
            app: RwLock::new(app),
        });
        let server = RpcServer::bind(cfg.client_addr, service.clone()).await?;
        let client = RpcClient::new(cfg.proxy_addr, cfg.timeout);

        tracing::info!(
            "SocketConsensusProxy serving application on {}, consensus at {}",
            server.local_addr(),
            cfg.proxy_addr
        );

        Ok(Self {
            service,
            server,
            client,
        })
    }

    /// Send a transaction to the consensus core.
    pub async fn submit_tx(&self, tx: Transaction) -> Result<()> {
        wire::expect_ack(self.client.call(Method::SubmitTx(tx)).await?)
    }

    pub async fn state_hash(&self) -> StateHash {
        self.service.app.read().await.state_hash()
    }

    pub fn client_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    pub fn proxy_addr(&self) -> SocketAddr {
        self.client.addr()
    }

    pub fn shutdown(&self) {
        self.server.shutdown();
    }
}

struct AppService<A> {
    app: RwLock<A>,
}

#[async_trait]
impl<A: Application> RpcHandler for AppService<A> {
    async fn handle(&self, method: Method) -> Result<Reply> {
        match method {
            Method::CommitBlock(block) => {
                let hash = self.app.write().await.commit_block(&block)?;
                tracing::info!(
                    "Committed block {} ({} txs, round {}) -> {}",
                    block.index(),
                    block.transactions().len(),
                    block.round_received(),
                    hash
                );
                Ok(Reply::StateHash(hash))
            }
            Method::GetSnapshot(index) => Ok(Reply::Snapshot(self.app.read().await.snapshot(index)?)),
            Method::Restore(snapshot) => {
                let mut app = self.app.write().await;
                app.restore(&snapshot)?;
                tracing::info!("Restored snapshot, state hash now {}", app.state_hash());
                Ok(Reply::Ack)
            }
            other => Err(ProxyError::Encoding(format!(
                "{} is not served on the client address",
                other.name()
            ))),
        }
    }
}
