//! Line-delimited JSON server for live crossword sessions.

use anyhow::{Context, Result};
use clap::Parser;
use crossword_server::config::Config;
use crossword_server::server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "crossword-server")]
#[clap(about = "Real-time session server for collaborative crosswords")]
struct Cli {
    /// Address to bind (overrides CROSSWORD_BIND_ADDR)
    #[clap(short, long)]
    bind: Option<String>,

    /// Port to listen on (overrides CROSSWORD_PORT)
    #[clap(short, long)]
    port: Option<u16>,

    /// Maximum simultaneous connections
    #[clap(long)]
    max_clients: Option<usize>,

    /// Game length in seconds
    #[clap(long)]
    session_duration: Option<i64>,

    /// Milliseconds between timer ticks
    #[clap(long)]
    tick_ms: Option<u64>,

    /// Longest accepted inbound frame, in bytes
    #[clap(long)]
    max_frame_len: Option<usize>,

    /// Log filter used when RUST_LOG is unset
    #[clap(short, long)]
    log: Option<String>,
}

impl Cli {
    fn apply(self, mut config: Config) -> Config {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(max_clients) = self.max_clients {
            config.max_clients = max_clients;
        }
        if let Some(secs) = self.session_duration {
            config.session_duration_secs = secs;
        }
        if let Some(ms) = self.tick_ms {
            config.tick_interval_ms = ms;
        }
        if let Some(len) = self.max_frame_len {
            config.max_frame_len = len;
        }
        if let Some(log) = self.log {
            config.log_level = log;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.apply(Config::from_env().context("reading environment")?);
    config.validate().context("validating configuration")?;

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("building log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        addr = %config.socket_addr_string(),
        max_clients = config.max_clients,
        session_duration_secs = config.session_duration_secs,
        "starting crossword-server"
    );

    server::run(config).await?;
    Ok(())
}
