//! Asynchronous runner for the wrapped CLI.
//!
//! Every invocation spawns exactly one OS process: the configured
//! executable with a single verb argument ("status", "connect",
//! "disconnect"). No shell is involved, so nothing in the output or the
//! verb is ever interpolated into a command line.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use warptoggle_protocol::ToggleIntent;

/// A boxed future for async trait methods, keeping [`VpnControl`]
/// object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors from a single CLI invocation.
///
/// These are reportable, recoverable conditions: the reconciler logs
/// them and counts them toward its failure threshold, it never crashes
/// on them.
#[derive(Debug, Error)]
pub enum CliError {
    /// The process could not be started.
    #[error("failed to spawn process: {0}")]
    Spawn(#[from] std::io::Error),

    /// The process ran but exited nonzero.
    #[error("process exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    /// Stdout was not valid UTF-8.
    #[error("process output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Control surface over the external VPN CLI.
///
/// The daemon only ever needs two operations: a status query and a
/// connect/disconnect command. Implementations must be `Send + Sync`;
/// test doubles implement this without spawning anything.
pub trait VpnControl: Send + Sync {
    /// Runs the status query, yielding trimmed stdout.
    fn query_status(&self) -> BoxFuture<'_, Result<String, CliError>>;

    /// Issues a connect or disconnect command, yielding trimmed stdout.
    fn apply_intent(&self, intent: ToggleIntent) -> BoxFuture<'_, Result<String, CliError>>;
}

/// The production runner: shells out to `warp-cli`.
#[derive(Debug, Clone)]
pub struct WarpCli {
    program: PathBuf,
}

impl WarpCli {
    /// Creates a runner for the given executable path or name.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The wrapped executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Spawns `<program> <verb>` and captures its output.
    ///
    /// Success requires both a successful spawn and exit status 0; the
    /// result is stdout trimmed of surrounding whitespace (empty string
    /// allowed). Stderr is only surfaced inside the error.
    async fn run(&self, verb: &str) -> Result<String, CliError> {
        debug!(program = %self.program.display(), verb = verb, "spawning CLI");

        let output = Command::new(&self.program).arg(verb).output().await?;

        if !output.status.success() {
            return Err(CliError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout)?;
        Ok(stdout.trim().to_string())
    }
}

impl VpnControl for WarpCli {
    fn query_status(&self) -> BoxFuture<'_, Result<String, CliError>> {
        Box::pin(self.run("status"))
    }

    fn apply_intent(&self, intent: ToggleIntent) -> BoxFuture<'_, Result<String, CliError>> {
        Box::pin(self.run(intent.verb()))
    }
}

/// Looks up an executable on `PATH`.
///
/// Pre-flight presence check: the daemon refuses to start when the
/// wrapped CLI is absent, instead of failing on every poll.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_trims_stdout() {
        // `echo status` prints the verb back with a trailing newline.
        let cli = WarpCli::new("echo");
        let out = cli.run("status").await.unwrap();
        assert_eq!(out, "status");
    }

    #[tokio::test]
    async fn empty_stdout_is_success() {
        let cli = WarpCli::new("true");
        let out = cli.run("status").await.unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn nonzero_exit_is_failure() {
        let cli = WarpCli::new("false");
        let err = cli.run("status").await.unwrap_err();
        assert!(matches!(err, CliError::Failed { code: Some(1), .. }));
    }

    #[tokio::test]
    async fn spawn_failure_is_failure() {
        let cli = WarpCli::new("/nonexistent/warptoggle-test-binary");
        let err = cli.run("status").await.unwrap_err();
        assert!(matches!(err, CliError::Spawn(_)));
    }

    #[tokio::test]
    async fn trait_dispatch_uses_intent_verbs() {
        let cli = WarpCli::new("echo");
        let out = cli.apply_intent(ToggleIntent::Disconnect).await.unwrap();
        assert_eq!(out, "disconnect");
    }

    #[test]
    fn find_in_path_hits_and_misses() {
        assert!(find_in_path("sh").is_some());
        assert!(find_in_path("warptoggle-definitely-not-installed").is_none());
    }
}
