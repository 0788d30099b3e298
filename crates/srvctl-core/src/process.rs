//! Instance liveness probing and stop scripts.

use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{InstallerError, Result};

/// Process-level control over an installed instance.
pub trait InstanceControl {
    /// Whether a process belonging to the instance at `install_path` is alive.
    fn is_running(&self, install_path: &Path) -> Result<bool>;

    /// Run the instance's stop script and wait for it to finish.
    fn stop(&self, install_path: &Path) -> Result<()>;
}

/// Probes `ps` and runs `stop.sh` / `stop.bat` inside the instance directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessControl;

impl ProcessControl {
    pub fn new() -> Self {
        Self
    }

    fn stop_script(install_path: &Path) -> std::path::PathBuf {
        if cfg!(windows) {
            install_path.join("stop.bat")
        } else {
            install_path.join("stop.sh")
        }
    }
}

/// Whether `line` contains `path` as a whole path or as a prefix of a
/// deeper path, so `/srv/was-80` does not match `/srv/was-8080/bin`.
#[cfg_attr(not(unix), allow(dead_code))]
fn mentions_path(line: &str, path: &str) -> bool {
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return false;
    }
    line.match_indices(path).any(|(at, _)| {
        line[at + path.len()..]
            .chars()
            .next()
            .is_none_or(|c| c == '/' || c.is_whitespace())
    })
}

impl InstanceControl for ProcessControl {
    #[cfg(unix)]
    fn is_running(&self, install_path: &Path) -> Result<bool> {
        let output = Command::new("ps")
            .arg("-ef")
            .output()
            .map_err(|e| InstallerError::Process {
                command: "ps -ef".to_string(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(InstallerError::Process {
                command: "ps -ef".to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let needle = install_path.to_string_lossy();
        let stdout = String::from_utf8_lossy(&output.stdout);
        let running = stdout
            .lines()
            .filter(|line| !line.contains("ps -ef"))
            .any(|line| mentions_path(line, needle.as_ref()));
        debug!(path = %install_path.display(), running, "liveness probe");
        Ok(running)
    }

    #[cfg(not(unix))]
    fn is_running(&self, install_path: &Path) -> Result<bool> {
        debug!(path = %install_path.display(), "liveness probe unsupported on this platform");
        Ok(false)
    }

    fn stop(&self, install_path: &Path) -> Result<()> {
        let script = Self::stop_script(install_path);
        let command = script.display().to_string();
        if !script.is_file() {
            return Err(InstallerError::Process {
                command,
                message: "stop script not found".to_string(),
            });
        }

        let output = Command::new(&script)
            .current_dir(install_path)
            .output()
            .map_err(|e| InstallerError::Process {
                command: command.clone(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InstallerError::Process {
                command,
                message: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        info!(path = %install_path.display(), "instance stopped");
        Ok(())
    }
}
