use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pulsar_keys::cli::{self, Cli};
use pulsar_keys::config::PulsarConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match PulsarConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level; logs go to stderr so stdout stays JSON
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.node.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!(node = %config.node.url, config = %cli.config, "Configuration loaded");

    if let Err(e) = cli::run(cli, &config).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
