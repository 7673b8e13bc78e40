// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Application-hosted service: commit, snapshot, restore.
    pub client_addr: SocketAddr,
    /// Core-hosted service: transaction submission.
    pub proxy_addr: SocketAddr,
    /// Deadline applied uniformly to every outbound call.
    pub timeout: Duration,
    pub submit_capacity: usize,
    /// How long a producer may wait for room in the submit queue.
    ///
    /// Keep this below `timeout`: a remote producer only sees `SubmitTimeout`
    /// if the queue gives up before its own RPC deadline does.
    pub submit_timeout: Duration,
    /// Index of the first block the core will commit.
    pub initial_index: u64,
    pub log_level: String,
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            client_addr: SocketAddr::from(([127, 0, 0, 1], 1339)),
            proxy_addr: SocketAddr::from(([127, 0, 0, 1], 1338)),
            timeout: Duration::from_secs(1),
            submit_capacity: 256,
            submit_timeout: Duration::from_millis(500),
            initial_index: 0,
            log_level: "info".to_string(),
            metrics_addr: None,
        }
    }
}
