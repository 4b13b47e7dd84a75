//! The decoder capability.
//!
//! Decompression is delegated to an external engine. Sessions talk to it
//! through two small traits: a [`Decoder`] opens archives and hands back a
//! [`DecoderHandle`] positioned before the first header. Every call reports a
//! raw decoder status; translation into [`oxirar_core::RarError`] happens in
//! the session layer.

use oxirar_core::{ArchiveInfo, Entry};
use std::path::Path;

/// How the decoder should open an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Walk headers only.
    List,
    /// Walk headers, reporting every volume part of split entries.
    ListSplit,
    /// Walk headers and decode payloads.
    Extract,
}

/// What to do with the entry at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Move past the entry without decoding its payload.
    Skip,
    /// Decode the payload, verify its checksum and hand it to the data sink.
    Test,
}

/// Receiver for decoded payload chunks. Returning `false` aborts decoding.
pub type DataSink<'a> = &'a mut dyn FnMut(&[u8]) -> bool;

/// An engine able to open RAR archives.
pub trait Decoder {
    /// The open-archive handle type.
    type Handle: DecoderHandle;

    /// Open `path` in `mode`.
    ///
    /// On failure the raw status is returned and no handle is left open.
    /// When `read_comment` is set, the archive comment is loaded into the
    /// returned [`ArchiveInfo`].
    fn open(
        &self,
        path: &Path,
        mode: OpenMode,
        password: Option<&str>,
        read_comment: bool,
    ) -> Result<(Self::Handle, ArchiveInfo), i32>;
}

/// An open archive with a forward-only header cursor.
pub trait DecoderHandle {
    /// Decode the next header.
    ///
    /// `Err(10)` signals end of archive.
    fn read_header(&mut self) -> Result<Entry, i32>;

    /// Process the entry whose header was read last, returning the status.
    fn process(&mut self, op: Operation, sink: Option<DataSink<'_>>) -> i32;

    /// Release the handle, returning the status.
    ///
    /// Closing twice is a no-op reporting success.
    fn close(&mut self) -> i32;
}
