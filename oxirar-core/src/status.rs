//! Decoder status codes and their translation.
//!
//! The UnRAR decoder reports every outcome as a small integer. This module
//! names those integers and maps each one onto a [`Status`]: plain success,
//! the end-of-archive signal, or a failure carrying an [`ErrorKind`].
//!
//! Translation is total. A code that has no dedicated taxonomy member maps to
//! [`ErrorKind::Unknown`] instead of being dropped.

use std::fmt;

/// Operation completed.
pub const ERAR_SUCCESS: i32 = 0;
/// No more headers in the archive.
pub const ERAR_END_ARCHIVE: i32 = 10;
/// Not enough memory.
pub const ERAR_NO_MEMORY: i32 = 11;
/// Broken header or checksum failure.
pub const ERAR_BAD_DATA: i32 = 12;
/// Not a RAR archive.
pub const ERAR_BAD_ARCHIVE: i32 = 13;
/// Unsupported archive format or version.
pub const ERAR_UNKNOWN_FORMAT: i32 = 14;
/// Volume or archive open error.
pub const ERAR_EOPEN: i32 = 15;
/// File create error.
pub const ERAR_ECREATE: i32 = 16;
/// File close error.
pub const ERAR_ECLOSE: i32 = 17;
/// Read error.
pub const ERAR_EREAD: i32 = 18;
/// Write error.
pub const ERAR_EWRITE: i32 = 19;
/// Buffer too small (archive comment).
pub const ERAR_SMALL_BUF: i32 = 20;
/// Unspecified decoder error.
pub const ERAR_UNKNOWN: i32 = 21;
/// A password is required and none was supplied.
pub const ERAR_MISSING_PASSWORD: i32 = 22;
/// Cannot open the file referenced by a reference record.
pub const ERAR_EREFERENCE: i32 = 23;
/// The supplied password is incorrect.
pub const ERAR_BAD_PASSWORD: i32 = 24;

/// Error taxonomy for archive operations.
///
/// Most members correspond one-to-one with a decoder status. `ArchiveNotFound`
/// and `EntryNotFound` are synthesized locally and have no decoder code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The decoder ran out of memory.
    NoMemory,
    /// A header or the packed data is corrupt (includes checksum failures).
    BadData,
    /// The file is not a valid RAR archive.
    BadArchive,
    /// The archive uses an unsupported format or version.
    UnknownFormat,
    /// The archive (or one of its volumes) could not be opened.
    OpenFailed,
    /// A destination file or directory could not be created.
    CreateFailed,
    /// The archive could not be closed.
    CloseFailed,
    /// Reading from the archive failed.
    ReadFailed,
    /// Writing extracted data failed.
    WriteFailed,
    /// The archive comment does not fit the comment buffer.
    SmallBuffer,
    /// An encrypted entry was reached without a password.
    MissingPassword,
    /// The supplied password is wrong.
    BadPassword,
    /// A reference record points at a file that cannot be opened.
    ReferenceFailed,
    /// The archive path does not resolve to a readable file.
    ArchiveNotFound,
    /// No entry with the requested name exists in the archive.
    EntryNotFound,
    /// Anything the decoder reports that has no dedicated member.
    Unknown,
}

impl ErrorKind {
    /// Short human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoMemory => "out of memory",
            Self::BadData => "corrupt header or data",
            Self::BadArchive => "not a valid RAR archive",
            Self::UnknownFormat => "unsupported archive format or version",
            Self::OpenFailed => "failed to open archive",
            Self::CreateFailed => "failed to create destination",
            Self::CloseFailed => "failed to close archive",
            Self::ReadFailed => "failed to read archive",
            Self::WriteFailed => "failed to write extracted data",
            Self::SmallBuffer => "archive comment larger than buffer",
            Self::MissingPassword => "password required",
            Self::BadPassword => "incorrect password",
            Self::ReferenceFailed => "referenced file could not be opened",
            Self::ArchiveNotFound => "archive not found",
            Self::EntryNotFound => "entry not found",
            Self::Unknown => "unknown error",
        }
    }

    /// The decoder status this kind corresponds to, if any.
    pub fn native_code(&self) -> Option<i32> {
        match self {
            Self::NoMemory => Some(ERAR_NO_MEMORY),
            Self::BadData => Some(ERAR_BAD_DATA),
            Self::BadArchive => Some(ERAR_BAD_ARCHIVE),
            Self::UnknownFormat => Some(ERAR_UNKNOWN_FORMAT),
            Self::OpenFailed => Some(ERAR_EOPEN),
            Self::CreateFailed => Some(ERAR_ECREATE),
            Self::CloseFailed => Some(ERAR_ECLOSE),
            Self::ReadFailed => Some(ERAR_EREAD),
            Self::WriteFailed => Some(ERAR_EWRITE),
            Self::SmallBuffer => Some(ERAR_SMALL_BUF),
            Self::MissingPassword => Some(ERAR_MISSING_PASSWORD),
            Self::BadPassword => Some(ERAR_BAD_PASSWORD),
            Self::ReferenceFailed => Some(ERAR_EREFERENCE),
            Self::Unknown => Some(ERAR_UNKNOWN),
            Self::ArchiveNotFound | Self::EntryNotFound => None,
        }
    }

    /// Whether an error of this kind must abort a multi-entry operation.
    ///
    /// Archive-level failures, credential failures and resource failures
    /// recur for every following entry. Only `BadData` is confined to the
    /// entry that produced it.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::BadData)
    }

    /// Whether this kind describes the archive as a whole rather than one entry.
    pub fn is_archive_level(&self) -> bool {
        matches!(
            self,
            Self::BadArchive | Self::UnknownFormat | Self::OpenFailed | Self::ArchiveNotFound
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of one decoder call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The call succeeded.
    Success,
    /// The header chain is exhausted. Not an error.
    EndOfArchive,
    /// The call failed.
    Failed(ErrorKind),
}

impl Status {
    /// Translate a decoder status code.
    pub fn from_code(code: i32) -> Self {
        let kind = match code {
            ERAR_SUCCESS => return Self::Success,
            ERAR_END_ARCHIVE => return Self::EndOfArchive,
            ERAR_NO_MEMORY => ErrorKind::NoMemory,
            ERAR_BAD_DATA => ErrorKind::BadData,
            ERAR_BAD_ARCHIVE => ErrorKind::BadArchive,
            ERAR_UNKNOWN_FORMAT => ErrorKind::UnknownFormat,
            ERAR_EOPEN => ErrorKind::OpenFailed,
            ERAR_ECREATE => ErrorKind::CreateFailed,
            ERAR_ECLOSE => ErrorKind::CloseFailed,
            ERAR_EREAD => ErrorKind::ReadFailed,
            ERAR_EWRITE => ErrorKind::WriteFailed,
            ERAR_SMALL_BUF => ErrorKind::SmallBuffer,
            ERAR_MISSING_PASSWORD => ErrorKind::MissingPassword,
            ERAR_EREFERENCE => ErrorKind::ReferenceFailed,
            ERAR_BAD_PASSWORD => ErrorKind::BadPassword,
            _ => ErrorKind::Unknown,
        };
        Self::Failed(kind)
    }

    /// Check if this is the success status.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Check if this is the end-of-archive signal.
    pub fn is_end(&self) -> bool {
        matches!(self, Self::EndOfArchive)
    }

    /// Get the failure kind, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed(kind) => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_and_end() {
        assert_eq!(Status::from_code(ERAR_SUCCESS), Status::Success);
        assert_eq!(Status::from_code(ERAR_END_ARCHIVE), Status::EndOfArchive);
        assert!(Status::from_code(ERAR_END_ARCHIVE).error_kind().is_none());
    }

    #[test]
    fn test_every_native_code_round_trips() {
        for code in 11..=24 {
            let kind = Status::from_code(code)
                .error_kind()
                .expect("non-zero, non-end code must be a failure");
            assert_eq!(kind.native_code(), Some(code), "code {code}");
        }
    }

    #[test]
    fn test_unmapped_codes_are_unknown() {
        for code in [-1, 1, 9, 25, 101, i32::MAX] {
            assert_eq!(
                Status::from_code(code),
                Status::Failed(ErrorKind::Unknown),
                "code {code}"
            );
        }
    }

    #[test]
    fn test_local_kinds_have_no_code() {
        assert_eq!(ErrorKind::ArchiveNotFound.native_code(), None);
        assert_eq!(ErrorKind::EntryNotFound.native_code(), None);
        assert_ne!(ErrorKind::ArchiveNotFound, ErrorKind::EntryNotFound);
    }

    #[test]
    fn test_terminal_classification() {
        assert!(!ErrorKind::BadData.is_terminal());
        assert!(ErrorKind::WriteFailed.is_terminal());
        assert!(ErrorKind::MissingPassword.is_terminal());
        assert!(ErrorKind::NoMemory.is_terminal());
        assert!(ErrorKind::BadArchive.is_archive_level());
        assert!(!ErrorKind::WriteFailed.is_archive_level());
    }
}
