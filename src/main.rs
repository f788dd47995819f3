mod app;
mod browser;
mod builder;
mod cli;
mod config;
mod error;
mod page;
mod rebuild;
mod server;
mod watcher;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::DevConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command() {
        Commands::Dev {
            root,
            port,
            no_open,
        } => {
            let root = root.canonicalize()?;
            let mut config = DevConfig::load(&root);
            if let Some(port) = port {
                config.server.port = port;
            }
            if no_open {
                config.server.open_browser = false;
            }
            runtime.block_on(app::run_dev(&root, config))?;
        }
        Commands::Serve { root, port } => {
            let root = root.canonicalize()?;
            let mut config = DevConfig::load(&root);
            if let Some(port) = port {
                config.server.port = port;
            }
            runtime.block_on(app::run_serve(&root, config))?;
        }
    }

    Ok(())
}
