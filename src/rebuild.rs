use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::builder::Builder;
use crate::config::WatchConfig;
use crate::error::exit_label;
use crate::page;
use crate::watcher::debounce::Debounce;
use crate::watcher::event::WatchEvent;

/// What the loop did with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebuild {
    /// Not a source modification.
    Ignored,
    /// Arrived inside the debounce window of the previous accepted build.
    Debounced,
    Succeeded,
    Failed,
}

/// Consumes watch events one at a time: filter, debounce, build, touch the page.
///
/// Builds run on the blocking pool but are awaited before the next event is
/// read, so two builds never overlap.
pub struct RebuildLoop<B: Builder> {
    builder: Arc<B>,
    debounce: Debounce,
    extensions: Vec<String>,
    sentinel: PathBuf,
}

impl<B: Builder> RebuildLoop<B> {
    pub fn new(builder: Arc<B>, config: &WatchConfig, sentinel: PathBuf) -> Self {
        Self {
            builder,
            debounce: Debounce::new(config.debounce()),
            extensions: config.extensions.clone(),
            sentinel,
        }
    }

    /// Process events until the channel closes or `cancel` fires.
    ///
    /// Cancellation is only observed between events; an accepted build always
    /// runs to completion.
    pub async fn run(&self, mut events: mpsc::Receiver<WatchEvent>, cancel: CancellationToken) {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            self.handle(&event, event.at).await;
        }
        debug!("rebuild loop stopped");
    }

    /// Handle a single event received at `now`.
    ///
    /// `now` is the arrival time, so events queued behind a running build are
    /// still measured against the window of the build they arrived during.
    pub async fn handle(&self, event: &WatchEvent, now: Instant) -> Rebuild {
        if !event.is_trigger(&self.extensions) {
            trace!(path = %event.path.display(), kind = ?event.kind, "ignored");
            return Rebuild::Ignored;
        }
        if !self.debounce.try_accept(now) {
            debug!(
                path = %event.path.display(),
                window_ms = self.debounce.window().as_millis() as u64,
                "debounced"
            );
            return Rebuild::Debounced;
        }

        info!("change detected in {}", event.path.display());
        info!("rebuilding WASM...");

        let builder = Arc::clone(&self.builder);
        let outcome = match tokio::task::spawn_blocking(move || builder.build()).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                error!("build failed: {err}");
                return Rebuild::Failed;
            }
            Err(err) => {
                error!("build task failed: {err}");
                return Rebuild::Failed;
            }
        };

        if !outcome.success() {
            error!(
                "build failed ({}):\n{}",
                exit_label(&outcome.code),
                outcome.stderr.trim_end()
            );
            return Rebuild::Failed;
        }

        match page::touch(&self.sentinel) {
            Ok(true) => info!("build successful, reloading page"),
            Ok(false) => info!("build successful"),
            Err(err) => warn!(
                "build successful, but touching {} failed: {err}",
                self.sentinel.display()
            ),
        }
        Rebuild::Succeeded
    }
}
