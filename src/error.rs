use std::path::PathBuf;

/// Failures surfaced by the dev server, the build runner and the watcher.
#[derive(Debug, thiserror::Error)]
pub enum DevError {
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("directory to serve does not exist: {}", .0.display())]
    MissingServeDir(PathBuf),

    #[error("failed to run build command `{command}`: {source}")]
    BuildSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("initial build failed ({})", exit_label(.code))]
    InitialBuild { code: Option<i32> },

    #[error("failed to watch {}: {source}", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Human-readable exit status: `exit code 1`, or `terminated by signal`.
pub fn exit_label(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}
