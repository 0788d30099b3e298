//! Error types for installer operations.
//!
//! Every failure is fatal to the current invocation. Callers that need to
//! branch on the failure category use [`InstallerError::kind`].

use std::path::PathBuf;

use thiserror::Error;

/// Broad failure categories surfaced to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input: non-numeric port, blank field, root policy, version guard.
    Validation,
    /// Target id or path already taken, or the instance is busy.
    Conflict,
    /// Referenced server, path, manifest entry or engine is missing.
    NotFound,
    /// Filesystem or child-process failure.
    Io,
    /// A configuration document lacks an expected anchor or is malformed.
    ConfigFormat,
}

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Server id already exists: '{id}'")]
    DuplicateId { id: String },

    #[error("{id} is running")]
    InstanceRunning { id: String },

    #[error("{0}")]
    NotFound(String),

    #[error("There is no release manifest: {}", path.display())]
    ManifestMissing { path: PathBuf },

    #[error("Module version for '{server_type}' is missing in the release manifest")]
    InvalidModule { server_type: String },

    #[error("Failed to copy {} to {}: {message}", src.display(), dst.display())]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Fail to find variable '{name}' in {}", path.display())]
    VariableNotFound { name: String, path: PathBuf },

    #[error("Malformed document {}: {message}", path.display())]
    MalformedDocument { path: PathBuf, message: String },

    #[error("Command '{command}' failed: {message}")]
    Process { command: String, message: String },

    #[error("{0}")]
    Unsupported(String),
}

impl InstallerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Unsupported(_) => ErrorKind::Validation,
            Self::Conflict(_) | Self::DuplicateId { .. } | Self::InstanceRunning { .. } => {
                ErrorKind::Conflict
            }
            Self::NotFound(_) | Self::ManifestMissing { .. } | Self::InvalidModule { .. } => {
                ErrorKind::NotFound
            }
            Self::Copy { .. } | Self::Io { .. } | Self::Process { .. } => ErrorKind::Io,
            Self::VariableNotFound { .. } | Self::MalformedDocument { .. } => {
                ErrorKind::ConfigFormat
            }
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Attach a human-readable context to an `io::Result`.
pub(crate) trait IoContext<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| InstallerError::io(f(), source))
    }
}

pub type Result<T> = std::result::Result<T, InstallerError>;
