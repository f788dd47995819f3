//! Top-level flows for the two subcommands.
//!
//! `dev` bootstrap order: public dir, initial build, page, watcher, server,
//! browser, then wait for Ctrl-C and shut everything down in reverse.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::browser;
use crate::builder::CommandBuilder;
use crate::config::DevConfig;
use crate::error::DevError;
use crate::page;
use crate::rebuild::RebuildLoop;
use crate::server;
use crate::watcher;

/// Build, serve, watch and live-reload until interrupted.
pub async fn run_dev(root: &Path, config: DevConfig) -> anyhow::Result<()> {
    let public_dir = config.public_dir(root);
    std::fs::create_dir_all(&public_dir)
        .with_context(|| format!("failed to create {}", public_dir.display()))?;

    let builder = CommandBuilder::new(&config.build, root);
    info!("performing initial build: {}", builder.display());
    let initial = builder.clone();
    let outcome = tokio::task::spawn_blocking(move || initial.build_inherited()).await??;
    if !outcome.success() {
        return Err(DevError::InitialBuild { code: outcome.code }.into());
    }

    if page::ensure_page(&public_dir, &config.page)
        .with_context(|| format!("failed to write {}", page::page_path(&public_dir).display()))?
    {
        info!("created {}", page::page_path(&public_dir).display());
    }

    let (watcher, events) = watcher::start_watcher(root, &config.watch)?;
    let listener = server::bind(&config.server.host, config.server.port).await?;

    let cancel = CancellationToken::new();

    let rebuild = RebuildLoop::new(
        Arc::new(builder),
        &config.watch,
        page::page_path(&public_dir),
    );
    let rebuild_task = tokio::spawn({
        let cancel = cancel.clone();
        async move { rebuild.run(events, cancel).await }
    });

    let mut server_task = spawn_server(listener, &public_dir, &cancel);

    let url = format!("http://localhost:{}", config.server.port);
    info!("serving at {url}");
    info!("press Ctrl+C to stop");
    if config.server.open_browser {
        tokio::task::spawn_blocking(move || {
            if let Err(err) = browser::open(&url) {
                warn!("could not open browser: {err}");
            }
        });
    }

    let early_exit = wait_for_shutdown(&mut server_task).await;
    cancel.cancel();

    rebuild_task.await.context("rebuild loop panicked")?;
    watcher.stop().await;
    finish_server(server_task, early_exit).await
}

/// Serve the public directory until interrupted.
pub async fn run_serve(root: &Path, config: DevConfig) -> anyhow::Result<()> {
    let public_dir = config.public_dir(root);
    if !public_dir.is_dir() {
        return Err(DevError::MissingServeDir(public_dir).into());
    }

    let listener = server::bind(&config.server.host, config.server.port).await?;
    let cancel = CancellationToken::new();
    let mut server_task = spawn_server(listener, &public_dir, &cancel);

    info!("serving at http://localhost:{}", config.server.port);
    info!("press Ctrl+C to stop");

    let early_exit = wait_for_shutdown(&mut server_task).await;
    cancel.cancel();
    finish_server(server_task, early_exit).await
}

type ServerTask = JoinHandle<Result<(), DevError>>;
type ServerExit = Result<Result<(), DevError>, JoinError>;

fn spawn_server(
    listener: tokio::net::TcpListener,
    public_dir: &Path,
    cancel: &CancellationToken,
) -> ServerTask {
    let public_dir = public_dir.to_path_buf();
    let cancel = cancel.clone();
    tokio::spawn(async move { server::serve(listener, &public_dir, cancel).await })
}

/// Wait for Ctrl-C, or for the server to stop on its own (in which case its
/// exit is returned, since a finished task cannot be awaited again).
async fn wait_for_shutdown(server_task: &mut ServerTask) -> Option<ServerExit> {
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                warn!("failed to listen for Ctrl+C: {err}");
            }
            info!("stopping server...");
            None
        }
        exit = server_task => Some(exit),
    }
}

async fn finish_server(
    server_task: ServerTask,
    early_exit: Option<ServerExit>,
) -> anyhow::Result<()> {
    let exit = match early_exit {
        Some(exit) => exit,
        None => server_task.await,
    };
    exit.context("server task panicked")??;
    Ok(())
}
