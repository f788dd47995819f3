use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::BuildConfig;
use crate::error::DevError;

/// Result of one build attempt. Logged, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Exit code; `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

impl BuildOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Something that can produce a fresh WASM build, synchronously.
pub trait Builder: Send + Sync + 'static {
    fn build(&self) -> Result<BuildOutcome, DevError>;
}

/// Runs the configured external command from the project root.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandBuilder {
    pub fn new(config: &BuildConfig, working_dir: &Path) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// The command line, for log messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the build with its output going straight to the terminal.
    ///
    /// Used for the initial build, where progress is worth seeing. Stderr is
    /// not captured, so a failure reports only the exit status.
    pub fn build_inherited(&self) -> Result<BuildOutcome, DevError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .status()
            .map_err(|source| DevError::BuildSpawn {
                command: self.display(),
                source,
            })?;
        Ok(BuildOutcome {
            code: status.code(),
            stderr: String::new(),
        })
    }
}

impl Builder for CommandBuilder {
    fn build(&self) -> Result<BuildOutcome, DevError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| DevError::BuildSpawn {
                command: self.display(),
                source,
            })?;
        Ok(BuildOutcome {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str, dir: &Path) -> CommandBuilder {
        CommandBuilder::new(
            &BuildConfig {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string()],
            },
            dir,
        )
    }

    #[test]
    fn display_joins_program_and_args() {
        let builder = CommandBuilder::new(&BuildConfig::default(), Path::new("."));
        assert_eq!(builder.display(), "make wasm-dev");
    }

    #[cfg(unix)]
    #[test]
    fn successful_command_reports_zero() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = shell("exit 0", dir.path()).build().unwrap();
        assert!(outcome.success());
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_captures_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = shell("echo 'syntax error' >&2; exit 1", dir.path())
            .build()
            .unwrap();
        assert!(!outcome.success());
        assert_eq!(outcome.code, Some(1));
        assert_eq!(outcome.stderr.trim(), "syntax error");
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        shell("touch built.marker", dir.path()).build().unwrap();
        assert!(dir.path().join("built.marker").exists());
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let builder = CommandBuilder::new(
            &BuildConfig {
                program: "wasm-dev-no-such-build-tool".to_string(),
                args: vec![],
            },
            dir.path(),
        );
        assert!(matches!(builder.build(), Err(DevError::BuildSpawn { .. })));
    }
}
