use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Name of the optional configuration file at the project root.
pub const CONFIG_FILE: &str = "wasm-dev.toml";

/// Configuration loaded from `wasm-dev.toml` at the project root.
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DevConfig {
    pub server: ServerConfig,
    pub build: BuildConfig,
    pub watch: WatchConfig,
    pub page: PageConfig,
}

/// Static server settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served over HTTP, relative to the project root.
    pub public_dir: PathBuf,
    /// Open the default browser once the server is listening (`dev` only).
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            public_dir: PathBuf::from("public"),
            open_browser: true,
        }
    }
}

/// External build command, run from the project root.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program: "make".to_string(),
            args: vec!["wasm-dev".to_string()],
        }
    }
}

/// What to watch and how to filter it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    /// Directories watched recursively.
    pub recursive: Vec<PathBuf>,
    /// Directories watched without descending (catches `Cargo.toml` at the root).
    pub shallow: Vec<PathBuf>,
    /// File extensions (without the dot) that trigger a rebuild.
    pub extensions: Vec<String>,
    /// Minimum interval between two accepted rebuilds.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            recursive: vec![PathBuf::from("src")],
            shallow: vec![PathBuf::from(".")],
            extensions: vec!["rs".to_string(), "toml".to_string()],
            debounce_ms: 500,
        }
    }
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Content of the generated `index.html`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    /// Module imported by the page; its default export initializes the WASM build.
    pub module: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Ant Farm Simulation".to_string(),
            module: "./pkg/ant.js".to_string(),
        }
    }
}

impl DevConfig {
    /// Load configuration from `wasm-dev.toml` in the given root directory.
    ///
    /// Returns the default configuration if the file does not exist or cannot be parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!("failed to parse {CONFIG_FILE}: {err}. Using defaults.");
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!("failed to read {CONFIG_FILE}: {err}. Using defaults.");
                Self::default()
            }
        }
    }

    /// Absolute path of the served directory.
    pub fn public_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.server.public_dir)
    }
}
