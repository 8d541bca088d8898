//! PID file management.
//!
//! One daemon per user: the PID file is created on startup and removed
//! on drop. A leftover file from a crashed daemon is recovered by
//! probing whether its PID is still alive.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use tracing::{debug, info, warn};

use crate::error::{ServerError, ServerResult};

/// PID file guard. Removes the file on drop.
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Creates the PID file, refusing if another daemon is alive.
    pub fn create(path: impl Into<PathBuf>) -> ServerResult<Self> {
        let path = path.into();

        if path.exists() {
            match Self::read_pid(&path) {
                Ok(pid) if Self::is_process_running(pid) => {
                    return Err(ServerError::already_running(path.to_string_lossy()));
                }
                Ok(pid) => {
                    warn!(path = %path.display(), pid = pid, "removing stale PID file");
                    fs::remove_file(&path)?;
                }
                Err(_) => {
                    warn!(path = %path.display(), "removing invalid PID file");
                    fs::remove_file(&path)?;
                }
            }
        }

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let pid = process::id();
        fs::write(&path, format!("{}\n", pid))?;
        info!(path = %path.display(), pid = pid, "created PID file");

        Ok(Self { path })
    }

    /// Returns the path to the PID file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_pid(path: &Path) -> ServerResult<u32> {
        let contents = fs::read_to_string(path)?;
        contents
            .trim()
            .parse::<u32>()
            .map_err(|_| ServerError::config(format!("invalid PID in file: {}", contents.trim())))
    }

    /// Signal 0 probes for process existence without touching it.
    #[cfg(unix)]
    fn is_process_running(pid: u32) -> bool {
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }

    #[cfg(not(unix))]
    fn is_process_running(_pid: u32) -> bool {
        true
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove PID file");
            } else {
                debug!(path = %self.path.display(), "removed PID file");
            }
        }
    }
}

/// Returns the default PID file path.
///
/// Uses `$XDG_RUNTIME_DIR/warptoggle.pid` if available, otherwise falls
/// back to `/tmp/warptoggle-$UID.pid`.
pub fn default_pid_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(runtime_dir).join("warptoggle.pid")
    } else {
        #[cfg(unix)]
        let uid = unsafe { libc::getuid() };
        #[cfg(not(unix))]
        let uid = 0;
        PathBuf::from(format!("/tmp/warptoggle-{}.pid", uid))
    }
}
