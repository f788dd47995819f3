pub mod debounce;
pub mod event;

use std::path::{Path, PathBuf};
use std::time::Instant;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as tokio_mpsc;
use tokio::task::JoinHandle;

use crate::config::WatchConfig;
use crate::error::DevError;
use event::{ChangeKind, WatchEvent};

/// Capacity of the channel between the bridge task and the rebuild loop.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Handle to a running watcher. Dropping it stops watching; `stop` also waits
/// for the bridge task to drain.
pub struct WatcherHandle {
    watcher: RecommendedWatcher,
    bridge_task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Stop the OS watcher and wait for the bridge task to finish.
    pub async fn stop(self) {
        // The notify callback owns the std sender; dropping the watcher drops it,
        // which ends the bridge loop.
        drop(self.watcher);
        if let Err(err) = self.bridge_task.await {
            tracing::warn!("watcher bridge task failed: {err}");
        }
    }
}

/// Start watching the configured roots under `project_root`.
///
/// `config.recursive` directories are watched with all their descendants,
/// `config.shallow` directories only for their direct entries. Returns a
/// `WatcherHandle` (must be kept alive) and a receiver of classified events.
///
/// Must be called from within a tokio runtime.
pub fn start_watcher(
    project_root: &Path,
    config: &WatchConfig,
) -> Result<(WatcherHandle, tokio_mpsc::Receiver<WatchEvent>), DevError> {
    let (std_tx, std_rx) = std::sync::mpsc::channel::<notify::Result<notify::Event>>();

    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = std_tx.send(res);
    })
    .map_err(|source| DevError::Watch {
        path: project_root.to_path_buf(),
        source,
    })?;

    for (dir, mode) in watch_targets(project_root, config) {
        watcher
            .watch(&dir, mode)
            .map_err(|source| DevError::Watch {
                path: dir.clone(),
                source,
            })?;
        tracing::debug!(path = %dir.display(), ?mode, "watching");
    }

    let (tokio_tx, tokio_rx) = tokio_mpsc::channel::<WatchEvent>(EVENT_CHANNEL_CAPACITY);

    // Bridge: notify delivers on its own thread through a std channel; classify
    // here and forward to the async side.
    let bridge_task = tokio::task::spawn_blocking(move || {
        while let Ok(result) = std_rx.recv() {
            match result {
                Ok(event) => {
                    let at = Instant::now();
                    let kind = ChangeKind::from(&event.kind);
                    if kind == ChangeKind::Other {
                        tracing::trace!(?event, "ignoring event");
                        continue;
                    }
                    for path in event.paths {
                        let watch_event = WatchEvent {
                            is_dir: path.is_dir(),
                            path,
                            kind,
                            at,
                        };
                        if tokio_tx.blocking_send(watch_event).is_err() {
                            return; // receiver dropped, shutdown
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!("watcher error: {err}");
                }
            }
        }
    });

    Ok((
        WatcherHandle {
            watcher,
            bridge_task,
        },
        tokio_rx,
    ))
}

/// Absolute watch targets with their recursion mode.
fn watch_targets(project_root: &Path, config: &WatchConfig) -> Vec<(PathBuf, RecursiveMode)> {
    let recursive = config
        .recursive
        .iter()
        .map(|dir| (project_root.join(dir), RecursiveMode::Recursive));
    let shallow = config
        .shallow
        .iter()
        .map(|dir| (project_root.join(dir), RecursiveMode::NonRecursive));
    recursive.chain(shallow).collect()
}
