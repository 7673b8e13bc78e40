// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Request/response transport over TCP.
//!
//! # Server
//! One task per accepted connection; requests on a connection are served in
//! arrival order, connections run concurrently.
//!
//! # Client
//! - connection opened lazily on first call, then reused
//! - every call bounded by the configured timeout
//! - on a transport failure over a reused connection: reconnect once and
//!   resend that call, then give up
//! - responses whose id does not match the in-flight call are late answers
//!   to timed-out calls and are discarded

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::errors::{ProxyError, Result};
use crate::wire::{self, Connection, Method, Reply, Request, Response, WireError};

/// Id used when a request was too broken to recover its own id.
pub const UNCORRELATED: u64 = 0;

#[async_trait]
pub trait RpcHandler: Send + Sync + 'static {
    async fn handle(&self, method: Method) -> Result<Reply>;
}

pub struct RpcServer {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl RpcServer {
    pub async fn bind<H: RpcHandler>(addr: SocketAddr, handler: Arc<H>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ProxyError::Transport(format!("bind {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();

        tokio::spawn(accept_loop(listener, handler, shutdown.clone()));
        tracing::info!("RPC server listening on {}", local_addr);

        Ok(Self {
            local_addr,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and close every open connection.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for RpcServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn accept_loop<H: RpcHandler>(
    listener: TcpListener,
    handler: Arc<H>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("RPC server on {:?} stopped", listener.local_addr().ok());
                return;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!("Accepted connection from {}", peer);
                        if let Err(e) = stream.set_nodelay(true) {
                            tracing::warn!("set_nodelay failed for {}: {}", peer, e);
                        }
                        tokio::spawn(serve_connection(
                            wire::framed(stream),
                            peer,
                            handler.clone(),
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => tracing::warn!("Accept failed: {}", e),
                }
            }
        }
    }
}

async fn serve_connection<H: RpcHandler>(
    mut conn: Connection,
    peer: SocketAddr,
    handler: Arc<H>,
    shutdown: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => return,
            frame = conn.next() => frame,
        };

        let line = match frame {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                tracing::warn!("Dropping connection from {}: {}", peer, e);
                return;
            }
            None => {
                tracing::debug!("Connection from {} closed", peer);
                return;
            }
        };

        let response = match wire::decode::<Request>(&line) {
            Ok(request) => {
                tracing::debug!("{} #{} from {}", request.method.name(), request.id, peer);
                Response {
                    id: request.id,
                    result: handler.handle(request.method).await.map_err(WireError::from),
                }
            }
            Err(e) => {
                tracing::warn!("Malformed request from {}: {}", peer, e);
                Response {
                    id: recover_id(&line),
                    result: Err(WireError::Malformed(e.to_string())),
                }
            }
        };

        let encoded = match wire::encode(&response) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!("Failed to encode response for {}: {}", peer, e);
                return;
            }
        };

        if let Err(e) = conn.send(encoded).await {
            tracing::warn!("Failed to reply to {}: {}", peer, e);
            return;
        }
    }
}

fn recover_id(line: &str) -> u64 {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|v| v.get("id")?.as_u64())
        .unwrap_or(UNCORRELATED)
}

pub struct RpcClient {
    addr: SocketAddr,
    timeout: Duration,
    next_id: AtomicU64,
    conn: Mutex<Option<Connection>>,
}

impl RpcClient {
    /// Does not connect; the first call does.
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            addr,
            timeout,
            next_id: AtomicU64::new(UNCORRELATED + 1),
            conn: Mutex::new(None),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn call(&self, method: Method) -> Result<Reply> {
        let name = method.name();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = wire::encode(&Request { id, method })?;

        match tokio::time::timeout(self.timeout, self.exchange(id, &line)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("{} #{} to {} timed out after {:?}", name, id, self.addr, self.timeout);
                metrics::counter!("lachesis_rpc_timeouts_total", 1);
                Err(ProxyError::Timeout {
                    method: name,
                    after: self.timeout,
                })
            }
        }
    }

    async fn exchange(&self, id: u64, line: &str) -> Result<Reply> {
        let mut slot = self.conn.lock().await;
        let reused = slot.is_some();

        match self.attempt(&mut slot, id, line).await {
            Err(e) if reused && e.is_transport() => {
                tracing::warn!("Connection to {} lost ({}), reconnecting", self.addr, e);
                metrics::counter!("lachesis_rpc_reconnects_total", 1);
                self.attempt(&mut slot, id, line).await
            }
            result => result,
        }
    }

    async fn attempt(&self, slot: &mut Option<Connection>, id: u64, line: &str) -> Result<Reply> {
        if slot.is_none() {
            let stream = TcpStream::connect(self.addr)
                .await
                .map_err(|e| ProxyError::Transport(format!("connect {}: {}", self.addr, e)))?;
            stream.set_nodelay(true)?;
            tracing::debug!("Connected to {}", self.addr);
            *slot = Some(wire::framed(stream));
        }

        let Some(conn) = slot.as_mut() else {
            return Err(ProxyError::Transport(format!("no connection to {}", self.addr)));
        };

        let result = round_trip(conn, id, line).await;
        if matches!(&result, Err(e) if e.is_transport()) {
            *slot = None;
        }
        result
    }
}

async fn round_trip(conn: &mut Connection, id: u64, line: &str) -> Result<Reply> {
    conn.send(line).await?;

    loop {
        let frame = conn
            .next()
            .await
            .ok_or_else(|| ProxyError::Transport("connection closed by peer".to_string()))??;

        let response: Response = wire::decode(&frame)?;
        if response.id == id || response.id == UNCORRELATED {
            return response.into_result();
        }

        tracing::warn!("Discarding stale response #{} while waiting for #{}", response.id, id);
        metrics::counter!("lachesis_stale_responses_total", 1);
    }
}
