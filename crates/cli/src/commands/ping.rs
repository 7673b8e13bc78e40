use std::time::Duration;

use lachesis_node::config::ProxyConfig;
use lachesis_node::rpc::RpcClient;
use lachesis_node::wire::{self, Method};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingSummary {
    pub sent: u64,
    pub failed: u64,
}

pub fn payload(node_id: u64, tx_id: u64) -> Vec<u8> {
    format!("Node{} Tx{}", node_id, tx_id).into_bytes()
}

/// Submits `count` numbered transactions to the consensus proxy address.
///
/// Failures are logged and counted, never retried.
pub async fn run(
    cfg: &ProxyConfig,
    count: u64,
    interval: Duration,
    node_id: u64,
) -> anyhow::Result<PingSummary> {
    let client = RpcClient::new(cfg.proxy_addr, cfg.timeout);
    let mut summary = PingSummary { sent: 0, failed: 0 };

    for tx_id in 1..=count {
        let tx = payload(node_id, tx_id);
        match client.call(Method::SubmitTx(tx)).await.and_then(wire::expect_ack) {
            Ok(()) => {
                summary.sent += 1;
                tracing::info!("Submitted Node{} Tx{} to {}", node_id, tx_id, cfg.proxy_addr);
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!("Tx{} failed: {}", tx_id, e);
            }
        }
        if tx_id < count {
            tokio::time::sleep(interval).await;
        }
    }

    tracing::info!("Pinging stopped: {} sent, {} failed", summary.sent, summary.failed);
    Ok(summary)
}
