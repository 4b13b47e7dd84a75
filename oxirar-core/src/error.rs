//! Error types for OxiRAR operations.
//!
//! Every error carries exactly one [`ErrorKind`] from the taxonomy in
//! [`crate::status`], plus the decoder's numeric status when one exists.

use crate::status::{ErrorKind, Status};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for OxiRAR operations.
#[derive(Debug, Error)]
pub enum RarError {
    /// A failure status reported by the decoder.
    #[error("{kind} (decoder status {code})")]
    Decoder {
        /// Translated taxonomy member.
        kind: ErrorKind,
        /// Raw decoder status.
        code: i32,
    },

    /// The archive path does not resolve to a readable file.
    #[error("Archive not found: {}", path.display())]
    ArchiveNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// No entry with the requested name exists in the archive.
    #[error("Entry not found: {name}")]
    EntryNotFound {
        /// Name that was requested.
        name: String,
    },

    /// An encrypted entry was reached and no password was supplied.
    #[error("Password required for entry: {name}")]
    MissingPassword {
        /// Name of the encrypted entry.
        name: String,
    },

    /// The destination could not accept extracted data.
    #[error("Failed to write {name}: {source}")]
    Write {
        /// Entry being written.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The destination file or directory could not be created.
    #[error("Failed to create destination for {name}: {source}")]
    Create {
        /// Entry being created.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A path or password could not be passed to the decoder.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// The session was used after its handle was released.
    #[error("Archive session is closed")]
    SessionClosed,

    /// I/O error outside the decoder.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for OxiRAR operations.
pub type Result<T> = std::result::Result<T, RarError>;

impl RarError {
    /// Create an error from a failing decoder status.
    ///
    /// Success and end-of-archive are not errors; passing them yields an
    /// `Unknown` error so that no status is silently accepted.
    pub fn from_code(code: i32) -> Self {
        let kind = Status::from_code(code)
            .error_kind()
            .unwrap_or(ErrorKind::Unknown);
        Self::Decoder { kind, code }
    }

    /// Create an archive-not-found error.
    pub fn archive_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ArchiveNotFound { path: path.into() }
    }

    /// Create an entry-not-found error.
    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }

    /// Create a missing-password error.
    pub fn missing_password(name: impl Into<String>) -> Self {
        Self::MissingPassword { name: name.into() }
    }

    /// Create a write error.
    pub fn write(name: impl Into<String>, source: io::Error) -> Self {
        Self::Write {
            name: name.into(),
            source,
        }
    }

    /// Create a destination-create error.
    pub fn create(name: impl Into<String>, source: io::Error) -> Self {
        Self::Create {
            name: name.into(),
            source,
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// The taxonomy member for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decoder { kind, .. } => *kind,
            Self::ArchiveNotFound { .. } => ErrorKind::ArchiveNotFound,
            Self::EntryNotFound { .. } => ErrorKind::EntryNotFound,
            Self::MissingPassword { .. } => ErrorKind::MissingPassword,
            Self::Write { .. } => ErrorKind::WriteFailed,
            Self::Create { .. } => ErrorKind::CreateFailed,
            Self::InvalidArgument { .. } => ErrorKind::OpenFailed,
            Self::SessionClosed => ErrorKind::Unknown,
            Self::Io(_) => ErrorKind::ReadFailed,
        }
    }

    /// The decoder status for diagnostics.
    ///
    /// Errors raised by the decoder report the exact status it returned.
    /// Locally raised errors report the status of the equivalent decoder
    /// failure, or `None` when there is none.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Decoder { code, .. } => Some(*code),
            other => other.kind().native_code(),
        }
    }

    /// Whether this error must abort a multi-entry operation.
    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }
}
