use std::future::Future;

use lachesis_node::config::ProxyConfig;
use lachesis_node::socket::SocketConsensusProxy;
use lachesis_proxy::{ChainState, StateHash};

/// Runs the reference hash-chain application until `shutdown` resolves.
///
/// Returns the final state hash.
pub async fn run<F>(cfg: &ProxyConfig, shutdown: F) -> anyhow::Result<StateHash>
where
    F: Future<Output = ()>,
{
    let app = SocketConsensusProxy::bind(ChainState::new(cfg.initial_index), cfg).await?;
    tracing::info!(
        "Dummy application ready on {}, initial state hash {}",
        app.client_addr(),
        app.state_hash().await
    );

    shutdown.await;
    app.shutdown();

    let hash = app.state_hash().await;
    tracing::info!("Dummy application stopped at state hash {}", hash);
    Ok(hash)
}
