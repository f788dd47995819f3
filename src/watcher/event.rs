use std::path::{Path, PathBuf};
use std::time::Instant;

use notify::EventKind;
use notify::event::ModifyKind;

/// What happened to a watched path, reduced from notify's event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    /// Content or metadata changed in place.
    Modified,
    Renamed,
    Removed,
    Other,
}

impl From<&EventKind> for ChangeKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => Self::Created,
            EventKind::Modify(ModifyKind::Name(_)) => Self::Renamed,
            EventKind::Modify(_) => Self::Modified,
            EventKind::Remove(_) => Self::Removed,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => Self::Other,
        }
    }
}

/// A single filesystem notification, consumed once by the rebuild loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub is_dir: bool,
    pub kind: ChangeKind,
    /// When the notification was received. Debouncing is measured from here,
    /// not from when the event is read off the channel.
    pub at: Instant,
}

impl WatchEvent {
    #[cfg(test)]
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            kind: ChangeKind::Modified,
            at: Instant::now(),
        }
    }

    /// Whether this event should start a rebuild: an in-place modification of
    /// a file whose extension is in `extensions`.
    pub fn is_trigger(&self, extensions: &[String]) -> bool {
        if self.is_dir || self.kind != ChangeKind::Modified {
            return false;
        }
        has_extension(&self.path, extensions)
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}
