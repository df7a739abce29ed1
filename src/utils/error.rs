// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application

/// Conditions raised by the section core. None of them are fatal: the
/// document handed to the core is never modified, so the caller decides
/// whether to report and stop or carry on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Section '{query}' is ambiguous, it matches: {}", candidates.join(", "))]
    AmbiguousMatch {
        query: String,
        candidates: Vec<String>,
    },

    #[error("Section '{name}' has drifted: {reason}")]
    DriftedSection { name: String, reason: String },

    #[error("Replacement for section '{name}' does not start with its own header")]
    HeaderMissing { name: String },

    // Divider lines without a valid NAME line are skipped by the splitter.
    // This variant only ever shows up as a warning, never as a failed call.
    #[error("Malformed section header at byte {offset}: divider without a 'SECTION <n>: <NAME>' line")]
    MalformedHeader { offset: usize },

    #[error("Duplicate section header '{0}': the last occurrence wins")]
    DuplicateHeader(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Workspace not initialized at {0} (run 'init' first)")]
    NotInitialized(PathBuf),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum VcsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not run '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Section error: {0}")]
    Section(#[from] SectionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Version control failed: {0}")]
    Vcs(#[from] VcsError),

    #[error("Validation failed: {0}")]
    Validation(String),
}
