use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use lachesis_cli::commands::{app, ping, solo};
use lachesis_node::config::ProxyConfig;
use lachesis_node::telemetry;

#[derive(Parser)]
#[command(name = "lachesis")]
#[command(about = "Application proxy tools: dummy application, transaction tester, solo sequencer", long_about = None)]
struct Cli {
    #[command(flatten)]
    net: NetArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct NetArgs {
    /// Application-hosted address (commit, snapshot, restore)
    #[arg(long, env = "LACHESIS_CLIENT_ADDR", default_value = "127.0.0.1:1339", global = true)]
    client_addr: SocketAddr,

    /// Consensus-hosted address (transaction submission)
    #[arg(long, env = "LACHESIS_PROXY_ADDR", default_value = "127.0.0.1:1338", global = true)]
    proxy_addr: SocketAddr,

    /// Deadline for every outbound call, in milliseconds
    #[arg(long, env = "LACHESIS_TIMEOUT_MS", default_value_t = 1000, global = true)]
    timeout_ms: u64,

    #[arg(long, env = "LACHESIS_SUBMIT_CAPACITY", default_value_t = 256, global = true)]
    submit_capacity: usize,

    /// How long a submission may wait for queue space, in milliseconds (below --timeout-ms)
    #[arg(long, env = "LACHESIS_SUBMIT_TIMEOUT_MS", default_value_t = 500, global = true)]
    submit_timeout_ms: u64,

    /// Index of the first block
    #[arg(long, env = "LACHESIS_INITIAL_INDEX", default_value_t = 0, global = true)]
    initial_index: u64,

    /// debug, info, warn, error, fatal, panic
    #[arg(long = "log", env = "LACHESIS_LOG", default_value = "info", global = true)]
    log_level: String,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "LACHESIS_METRICS_ADDR", global = true)]
    metrics_addr: Option<SocketAddr>,
}

impl NetArgs {
    fn to_config(&self) -> ProxyConfig {
        ProxyConfig {
            client_addr: self.client_addr,
            proxy_addr: self.proxy_addr,
            timeout: Duration::from_millis(self.timeout_ms),
            submit_capacity: self.submit_capacity,
            submit_timeout: Duration::from_millis(self.submit_timeout_ms),
            initial_index: self.initial_index,
            log_level: self.log_level.clone(),
            metrics_addr: self.metrics_addr,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dummy hash-chain application behind a socket proxy
    App,
    /// Submit numbered test transactions to the consensus proxy address
    Ping {
        #[arg(long, short, default_value_t = 10)]
        count: u64,

        /// Pause between transactions, in milliseconds
        #[arg(long, short, default_value_t = 1600)]
        interval_ms: u64,

        /// Node number embedded in each payload
        #[arg(long, default_value_t = 900000000000000)]
        node_id: u64,
    },
    /// Single-node sequencer standing in for the consensus core
    Solo {
        /// Block interval, in milliseconds
        #[arg(long, default_value_t = 1000)]
        block_ms: u64,

        #[arg(long, default_value_t = 100)]
        max_block_txs: usize,
    },
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.net.to_config();

    telemetry::init_telemetry(&cfg.log_level, cfg.metrics_addr);
    tracing::debug!("Configuration: {:?}", cfg);

    let result = match cli.command {
        Commands::App => app::run(&cfg, ctrl_c()).await.map(|_| ()),
        Commands::Ping {
            count,
            interval_ms,
            node_id,
        } => ping::run(&cfg, count, Duration::from_millis(interval_ms), node_id)
            .await
            .and_then(|summary| match summary.failed {
                0 => Ok(()),
                failed => Err(anyhow::anyhow!("{} of {} transactions failed", failed, count)),
            }),
        Commands::Solo {
            block_ms,
            max_block_txs,
        } => solo::run(&cfg, Duration::from_millis(block_ms), max_block_txs, ctrl_c())
            .await
            .map(|_| ()),
    };

    if cfg.metrics_addr.is_none() {
        tracing::debug!("Metrics at exit:\n{}", telemetry::render_metrics());
    }
    result
}
