//! pacman process wrapper
//!
//! Everything that talks to the system package manager lives here, behind
//! two small traits so the session can be driven by fakes in tests.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::graph;
use crate::types::PackageEntry;

pub const PACMAN_LOCK: &str = "/var/lib/pacman/db.lck";

#[derive(Error, Debug)]
pub enum PacmanError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("unexpected pacman output: {0}")]
    Parse(String),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Source of the packages offered for removal
pub trait PackageIndex {
    /// Stable for the whole session; called once at startup.
    fn list_removable_packages(&self) -> Result<Vec<PackageEntry>, PacmanError>;
}

/// Per-package details and the final removal
pub trait PackageManager {
    /// Raw `pacman -Qi` text, laid out for `width` columns. A non-zero exit
    /// still yields whatever was printed.
    fn query_info(&self, name: &str, width: u16) -> Result<String, PacmanError>;

    /// Remove `names` and their unneeded dependencies. Only call this after
    /// the user confirmed.
    fn remove(&self, names: &[String]) -> Result<(), PacmanError>;
}

/// The real thing: shells out to `pacman`
pub struct Pacman {
    program: PathBuf,
}

impl Default for Pacman {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pacman"),
        }
    }
}

impl Pacman {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        // Field names are parsed, so they must not be translated
        cmd.env("LC_ALL", "C");
        cmd
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl PackageIndex for Pacman {
    fn list_removable_packages(&self) -> Result<Vec<PackageEntry>, PacmanError> {
        let start = Instant::now();
        let output = self
            .command()
            .arg("-Qi")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| PacmanError::Spawn {
                program: self.program_name(),
                source,
            })?;

        if !output.status.success() {
            return Err(PacmanError::Failed {
                command: format!("{} -Qi", self.program_name()),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let installed = graph::parse_query_info(&String::from_utf8_lossy(&output.stdout))?;
        let packages = graph::removable_packages(&installed);
        info!(
            installed = installed.len(),
            removable = packages.len(),
            elapsed = ?start.elapsed(),
            "package index loaded"
        );
        Ok(packages)
    }
}

impl PackageManager for Pacman {
    fn query_info(&self, name: &str, width: u16) -> Result<String, PacmanError> {
        debug!(package = name, width, "querying package info");
        let output = self
            .command()
            .env("COLUMNS", width.to_string())
            .args(["-Qi", name])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| PacmanError::Spawn {
                program: self.program_name(),
                source,
            })?;

        if !output.status.success() {
            warn!(package = name, status = %output.status, "pacman -Qi failed");
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn remove(&self, names: &[String]) -> Result<(), PacmanError> {
        let mut cmd = if is_root() {
            Command::new(&self.program)
        } else {
            let mut sudo = Command::new("sudo");
            sudo.arg(&self.program);
            sudo
        };
        cmd.arg("-Rs").args(names);

        let command = format!("{cmd:?}");
        info!(%command, count = names.len(), "removing packages");

        // Inherited stdio: pacman asks its own questions
        let status = cmd.status().map_err(|source| PacmanError::Spawn {
            program: command.clone(),
            source,
        })?;

        info!(%status, "removal finished");
        if status.success() {
            Ok(())
        } else {
            Err(PacmanError::Failed {
                command,
                status,
                stderr: String::new(),
            })
        }
    }
}

// ============================================================================
// Standalone utility functions
// ============================================================================

/// Check if running as root
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Message for the user if another pacman instance holds `lock`
pub fn lock_message(lock: &Path) -> Option<String> {
    lock.exists().then(|| {
        format!(
            "Another package manager is running ({}). Close it and try again.",
            lock.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_message_only_when_lock_exists() {
        let dir = tempfile::tempdir().unwrap();
        let lock = dir.path().join("db.lck");
        assert_eq!(lock_message(&lock), None);

        std::fs::write(&lock, "").unwrap();
        let msg = lock_message(&lock).unwrap();
        assert!(msg.contains("db.lck"));
    }

    #[test]
    fn spawn_failure_is_reported() {
        let pacman = Pacman {
            program: PathBuf::from("/nonexistent/pacman"),
        };
        let err = pacman.query_info("bash", 40).unwrap_err();
        assert!(matches!(err, PacmanError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/pacman"));
    }
}
