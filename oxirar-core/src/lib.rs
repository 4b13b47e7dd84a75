//! # OxiRAR Core
//!
//! Core types shared by the OxiRAR crates:
//!
//! - [`status`]: Decoder status codes and their translation
//! - [`error`]: Error types
//! - [`entry`]: Archive entry metadata
//! - [`info`]: Archive-level flags and comment
//! - [`crc`]: CRC-32 checksum
//! - [`password`]: Password wrapper with redacted debug output
//!
//! ## Example
//!
//! ```rust
//! use oxirar_core::status::{ErrorKind, Status};
//! use oxirar_core::RarError;
//!
//! assert_eq!(Status::from_code(10), Status::EndOfArchive);
//!
//! let err = RarError::from_code(24);
//! assert_eq!(err.kind(), ErrorKind::BadPassword);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod crc;
pub mod entry;
pub mod error;
pub mod info;
pub mod password;
pub mod status;

// Re-exports for convenience
pub use crc::Crc32;
pub use entry::{Entry, EntryFlags, HostOs, PackingMethod};
pub use error::{RarError, Result};
pub use info::{ArchiveFlags, ArchiveInfo};
pub use password::Password;
pub use status::{ErrorKind, Status};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::entry::{Entry, EntryFlags};
    pub use crate::error::{RarError, Result};
    pub use crate::info::ArchiveInfo;
    pub use crate::password::Password;
    pub use crate::status::ErrorKind;
}
