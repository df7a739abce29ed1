// src/vcs/mod.rs
use crate::utils::error::VcsError;
use std::path::{Path, PathBuf};
use std::process::Command;

const GITIGNORE: &str = "*.swp\n*~\n";

/// Records checkpoints of the workspace after each change.
pub trait Checkpoint {
    /// Starts history for a fresh workspace and records everything in it.
    fn init(&self, root: &Path, message: &str) -> Result<(), VcsError>;

    /// Records the given workspace-relative paths.
    fn commit(&self, root: &Path, paths: &[PathBuf], message: &str) -> Result<(), VcsError>;
}

/// Checkpoints through the `git` command line.
#[derive(Debug, Default)]
pub struct GitCli;

impl GitCli {
    fn run(&self, root: &Path, args: &[&str]) -> Result<std::process::Output, VcsError> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!("Running '{}' in {}", command, root.display());
        Command::new("git")
            .args(args)
            .current_dir(root)
            .output()
            .map_err(|source| VcsError::Spawn { command, source })
    }

    fn run_checked(&self, root: &Path, args: &[&str]) -> Result<(), VcsError> {
        let output = self.run(root, args)?;
        if output.status.success() {
            return Ok(());
        }
        Err(VcsError::CommandFailed {
            command: format!("git {}", args.join(" ")),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// `git diff --cached --quiet` exits 1 when something is staged.
    fn has_staged_changes(&self, root: &Path) -> Result<bool, VcsError> {
        let output = self.run(root, &["diff", "--cached", "--quiet"])?;
        Ok(!output.status.success())
    }

    fn commit_staged(&self, root: &Path, message: &str) -> Result<(), VcsError> {
        if !self.has_staged_changes(root)? {
            tracing::info!("Nothing changed, skipping commit '{}'", message);
            return Ok(());
        }
        self.run_checked(root, &["commit", "-m", message])?;
        tracing::info!("Committed: {}", message);
        Ok(())
    }
}

impl Checkpoint for GitCli {
    fn init(&self, root: &Path, message: &str) -> Result<(), VcsError> {
        self.run_checked(root, &["init"])?;
        let gitignore = root.join(".gitignore");
        if !gitignore.exists() {
            std::fs::write(&gitignore, GITIGNORE)?;
        }
        self.run_checked(root, &["add", "."])?;
        self.commit_staged(root, message)
    }

    fn commit(&self, root: &Path, paths: &[PathBuf], message: &str) -> Result<(), VcsError> {
        let mut args: Vec<String> = vec!["add".to_string(), "--".to_string()];
        args.extend(paths.iter().map(|p| p.to_string_lossy().into_owned()));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run_checked(root, &args)?;
        self.commit_staged(root, message)
    }
}

/// Used with `--no-git`: changes are only written to disk.
#[derive(Debug, Default)]
pub struct NoCheckpoint;

impl Checkpoint for NoCheckpoint {
    fn init(&self, root: &Path, _message: &str) -> Result<(), VcsError> {
        tracing::debug!("Version control disabled, not initializing {}", root.display());
        Ok(())
    }

    fn commit(&self, _root: &Path, paths: &[PathBuf], message: &str) -> Result<(), VcsError> {
        tracing::debug!("Version control disabled, skipping '{}' ({} paths)", message, paths.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_checkpoint_never_fails() {
        let vcs = NoCheckpoint;
        assert!(vcs.init(Path::new("/definitely/not/here"), "init").is_ok());
        assert!(vcs.commit(Path::new("."), &[PathBuf::from("working.pine")], "msg").is_ok());
    }

    #[test]
    fn test_git_failure_is_reported() {
        // A missing working directory makes the spawn itself fail
        let err = GitCli.run_checked(Path::new("/definitely/not/here"), &["status"]).unwrap_err();
        assert!(err.to_string().contains("git status"));
    }
}
