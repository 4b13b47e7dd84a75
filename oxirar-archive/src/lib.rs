//! # OxiRAR Archive
//!
//! Read access to RAR archives through the UnRAR decoder.
//!
//! The crate is layered:
//!
//! - [`decoder`]: the decoder capability seam ([`Decoder`], [`DecoderHandle`])
//! - [`native`]: the UnRAR-backed implementation ([`NativeDecoder`])
//! - [`session`]: one open handle walking the header chain ([`ArchiveSession`])
//! - [`archive`]: one-shot operations on an archive path ([`RarArchive`])
//! - [`dest`]: where bulk extraction writes ([`Destination`], [`DirectoryWriter`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxirar_archive::{OverwritePolicy, RarArchive};
//!
//! let archive = RarArchive::with_password("photos.rar", "s3cret");
//! for name in archive.list_names()? {
//!     println!("{}", name);
//! }
//! let summary = archive.extract_all("out", OverwritePolicy::Skip)?;
//! println!("{}", summary);
//! # Ok::<(), oxirar_core::RarError>(())
//! ```
//!
//! ## Sessions
//!
//! For finer control, drive an [`ArchiveSession`] directly:
//!
//! ```rust,no_run
//! use oxirar_archive::NativeDecoder;
//! use oxirar_archive::session::{ArchiveSession, Extract};
//!
//! let mut session = ArchiveSession::<NativeDecoder, Extract>::open("data.rar", None)?;
//! while let Some(current) = session.next_header()? {
//!     if current.entry().name.ends_with(".csv") {
//!         let bytes = current.read()?;
//!         println!("{} bytes", bytes.len());
//!     } else {
//!         current.skip()?;
//!     }
//! }
//! session.close()?;
//! # Ok::<(), oxirar_core::RarError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod decoder;
pub mod dest;
pub mod native;
pub mod session;

#[cfg(test)]
pub(crate) mod mock;

// Re-exports
pub use archive::{ExtractSummary, RarArchive};
pub use decoder::{Decoder, DecoderHandle, OpenMode, Operation};
pub use dest::{Destination, DirectoryWriter, OverwritePolicy, PartialFile};
pub use native::{NativeDecoder, NativeHandle};
pub use session::{ArchiveSession, CurrentEntry, Extract, List, ListSplit};
pub use oxirar_core::{ArchiveInfo, Entry, ErrorKind, Password, RarError, Result};
