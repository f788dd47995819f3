use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Development server for WASM projects.
///
/// Serves the build output with cross-origin isolation headers and rebuilds
/// on source changes, reloading the open page after every successful build.
#[derive(Parser, Debug)]
#[command(
    name = "wasm-dev",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Build once, then serve, watch sources and live-reload the page (default).
    Dev {
        /// Project root containing the sources, the build manifest and wasm-dev.toml.
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Port to listen on (overrides wasm-dev.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not open the default browser.
        #[arg(long)]
        no_open: bool,
    },

    /// Only serve the public directory with cross-origin isolation headers.
    Serve {
        /// Project root containing the public directory and wasm-dev.toml.
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Port to listen on (overrides wasm-dev.toml).
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// The requested command; a bare invocation runs `dev` with defaults.
    pub fn command(self) -> Commands {
        self.command.unwrap_or(Commands::Dev {
            root: PathBuf::from("."),
            port: None,
            no_open: false,
        })
    }
}
