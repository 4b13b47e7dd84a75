//! Archive sessions.
//!
//! An [`ArchiveSession`] owns exactly one open decoder handle and walks the
//! archive's header chain forward, one entry at a time:
//!
//! ```text
//! open ──► next_header ──► CurrentEntry ──► skip / read / extract_to / test
//!               ▲                                     │
//!               └─────────────────────────────────────┘
//!          None at end of archive ──► close
//! ```
//!
//! The open mode is a type parameter. Payload operations exist only on
//! [`Extract`] sessions, so a [`List`] session can never allocate output
//! buffers. The header chain cannot be rewound; walking it again takes a
//! fresh session.
//!
//! Any error other than [`BadData`](ErrorKind::BadData)
//! releases the handle before it is returned. The handle is also released
//! on drop.

use crate::decoder::{Decoder, DecoderHandle, OpenMode, Operation};
use crate::native::NativeDecoder;
use oxirar_core::status::ERAR_NO_MEMORY;
use oxirar_core::{ArchiveInfo, Entry, ErrorKind, Password, RarError, Result, Status};
use std::fs::File;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

mod sealed {
    pub trait Sealed {}
}

/// Open mode of a session, fixed at the type level.
pub trait Mode: sealed::Sealed {
    /// The decoder mode this marker opens with.
    const OPEN_MODE: OpenMode;
}

/// Header-only session.
#[derive(Debug)]
pub struct List;

/// Header-only session that reports each volume part of split entries.
#[derive(Debug)]
pub struct ListSplit;

/// Session able to decode payloads.
#[derive(Debug)]
pub struct Extract;

impl sealed::Sealed for List {}
impl sealed::Sealed for ListSplit {}
impl sealed::Sealed for Extract {}

impl Mode for List {
    const OPEN_MODE: OpenMode = OpenMode::List;
}

impl Mode for ListSplit {
    const OPEN_MODE: OpenMode = OpenMode::ListSplit;
}

impl Mode for Extract {
    const OPEN_MODE: OpenMode = OpenMode::Extract;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Ready to read the next header.
    Idle,
    /// A header was read and its entry not yet processed.
    Pending,
    /// End of archive reached; the handle has been released.
    Finished,
    /// Closed by the caller or by an error.
    Closed,
}

/// One open archive handle and its header cursor.
pub struct ArchiveSession<D: Decoder, M: Mode> {
    path: PathBuf,
    password: Option<Password>,
    handle: Option<D::Handle>,
    info: ArchiveInfo,
    cursor: Cursor,
    _mode: PhantomData<M>,
}

impl<M: Mode> ArchiveSession<NativeDecoder, M> {
    /// Open `path` with the UnRAR decoder.
    pub fn open(path: impl AsRef<Path>, password: Option<Password>) -> Result<Self> {
        Self::open_with(&NativeDecoder, path, password)
    }
}

impl<D: Decoder, M: Mode> ArchiveSession<D, M> {
    /// Open `path` with a specific decoder.
    ///
    /// Fails with `ArchiveNotFound` if the path is not a readable file,
    /// before the decoder is involved.
    pub fn open_with(decoder: &D, path: impl AsRef<Path>, password: Option<Password>) -> Result<Self> {
        Self::open_inner(decoder, path.as_ref(), password, false)
    }

    pub(crate) fn open_inner(
        decoder: &D,
        path: &Path,
        password: Option<Password>,
        read_comment: bool,
    ) -> Result<Self> {
        check_readable(path)?;
        if password.as_ref().is_some_and(|pw| pw.expose().contains('\0')) {
            return Err(RarError::invalid_argument("password contains a NUL character"));
        }

        let (handle, info) = decoder
            .open(
                path,
                M::OPEN_MODE,
                password.as_ref().map(Password::expose),
                read_comment,
            )
            .map_err(|code| {
                debug!(path = %path.display(), code, "failed to open archive");
                RarError::from_code(code)
            })?;

        debug!(
            path = %path.display(),
            mode = ?M::OPEN_MODE,
            encrypted = password.is_some(),
            "opened archive session"
        );

        Ok(Self {
            path: path.to_path_buf(),
            password,
            handle: Some(handle),
            info,
            cursor: Cursor::Idle,
            _mode: PhantomData,
        })
    }

    /// Path of the archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive-level metadata reported at open.
    pub fn info(&self) -> &ArchiveInfo {
        &self.info
    }

    /// Whether a password was supplied at open.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Whether the native handle is still held.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Advance to the next header.
    ///
    /// An entry left unprocessed by the previous [`CurrentEntry`] is skipped
    /// first. Returns `None` at end of archive, and keeps returning `None`
    /// on later calls.
    pub fn next_header(&mut self) -> Result<Option<CurrentEntry<'_, D, M>>> {
        match self.cursor {
            Cursor::Finished => return Ok(None),
            Cursor::Closed => return Err(RarError::SessionClosed),
            Cursor::Pending => {
                let status = self.run(Operation::Skip, None)?;
                self.check(status)?;
            }
            Cursor::Idle => {}
        }

        let handle = self.handle.as_mut().ok_or(RarError::SessionClosed)?;
        match handle.read_header() {
            Ok(entry) => {
                trace!(
                    name = %entry.name,
                    size = entry.size,
                    encrypted = entry.is_encrypted(),
                    "read header"
                );
                self.cursor = Cursor::Pending;
                Ok(Some(CurrentEntry {
                    session: self,
                    entry,
                }))
            }
            Err(code) if Status::from_code(code).is_end() => {
                debug!(path = %self.path.display(), "end of archive");
                self.release()?;
                self.cursor = Cursor::Finished;
                Ok(None)
            }
            Err(code) => Err(self.abort(RarError::from_code(code))),
        }
    }

    /// Release the native handle.
    ///
    /// Closing an already closed session is a no-op.
    pub fn close(&mut self) -> Result<()> {
        self.cursor = Cursor::Closed;
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };
        let code = handle.close();
        debug!(path = %self.path.display(), code, "closed archive session");
        if Status::from_code(code).is_success() {
            Ok(())
        } else {
            Err(RarError::from_code(code))
        }
    }

    /// Run `op` on the pending entry and return the raw status.
    fn run(&mut self, op: Operation, sink: Option<&mut dyn FnMut(&[u8]) -> bool>) -> Result<i32> {
        self.cursor = Cursor::Idle;
        let handle = self.handle.as_mut().ok_or(RarError::SessionClosed)?;
        Ok(handle.process(op, sink))
    }

    fn check(&mut self, status: i32) -> Result<()> {
        if Status::from_code(status).is_success() {
            Ok(())
        } else {
            Err(self.abort(RarError::from_code(status)))
        }
    }

    /// Close the handle for an operation-aborting error and hand it back.
    fn abort(&mut self, err: RarError) -> RarError {
        if err.is_terminal() {
            if let Err(close_err) = self.release() {
                warn!(path = %self.path.display(), error = %close_err, "failed to close archive after error");
            }
            self.cursor = Cursor::Closed;
        }
        debug!(path = %self.path.display(), error = %err, "archive operation failed");
        err
    }
}

impl<D: Decoder, M: Mode> Drop for ArchiveSession<D, M> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!(path = %self.path.display(), error = %err, "failed to close archive session");
        }
    }
}

impl<D: Decoder, M: Mode> std::fmt::Debug for ArchiveSession<D, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveSession")
            .field("path", &self.path)
            .field("mode", &M::OPEN_MODE)
            .field("cursor", &self.cursor)
            .field("password", &self.password)
            .finish()
    }
}

/// The session positioned at one header.
///
/// Every processing method consumes the cursor, so an entry is decoded at
/// most once. Dropping it unprocessed leaves the entry to be skipped by the
/// next [`ArchiveSession::next_header`] call.
pub struct CurrentEntry<'a, D: Decoder, M: Mode> {
    session: &'a mut ArchiveSession<D, M>,
    entry: Entry,
}

impl<'a, D: Decoder, M: Mode> CurrentEntry<'a, D, M> {
    /// The decoded header.
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Take the header, leaving the entry to be skipped later.
    pub fn into_entry(self) -> Entry {
        self.entry
    }

    /// True when the entry is encrypted and needs a password to decode.
    pub fn requires_password(&self) -> bool {
        self.entry.is_encrypted()
    }

    /// Move past the entry without decoding its payload.
    pub fn skip(self) -> Result<Entry> {
        let status = self.session.run(Operation::Skip, None)?;
        self.session.check(status)?;
        Ok(self.entry)
    }

    /// Fail with `MissingPassword` when the entry is encrypted and the
    /// session has no password.
    ///
    /// Only the header is consulted. On failure the session is closed.
    pub fn check_password(&mut self) -> Result<()> {
        if self.entry.is_encrypted() && !self.session.has_password() {
            return Err(self
                .session
                .abort(RarError::missing_password(&self.entry.name)));
        }
        Ok(())
    }
}

impl<'a, D: Decoder> CurrentEntry<'a, D, Extract> {
    /// Decode the entry into memory.
    ///
    /// The buffer is sized from the header's uncompressed size. No bytes are
    /// returned unless the whole entry decoded and verified.
    pub fn read(mut self) -> Result<Vec<u8>> {
        self.check_password()?;

        let mut buf = Vec::new();
        let capacity = usize::try_from(self.entry.size).unwrap_or(usize::MAX);
        if buf.try_reserve_exact(capacity).is_err() {
            return Err(self.session.abort(RarError::from_code(ERAR_NO_MEMORY)));
        }

        let status = self.session.run(
            Operation::Test,
            Some(&mut |chunk: &[u8]| {
                buf.extend_from_slice(chunk);
                true
            }),
        )?;
        self.conclude(status)?;
        Ok(buf)
    }

    /// Decode the entry into `writer`, returning the number of bytes written.
    ///
    /// A write failure aborts the whole session; whatever reached `writer`
    /// for this entry must be treated as invalid.
    pub fn extract_to<W: Write + ?Sized>(self, writer: &mut W) -> Result<u64> {
        self.stream(|chunk| writer.write_all(chunk))
    }

    /// Decode the entry, handing each chunk to `callback` as it arrives.
    ///
    /// An error from `callback` stops decoding at once, closes the session
    /// and is returned as `WriteFailed`. Returns the total number of bytes
    /// delivered.
    pub fn stream<F>(mut self, mut callback: F) -> Result<u64>
    where
        F: FnMut(&[u8]) -> io::Result<()>,
    {
        self.check_password()?;

        let mut delivered = 0u64;
        let mut failure: Option<io::Error> = None;
        let status = self.session.run(
            Operation::Test,
            Some(&mut |chunk: &[u8]| match callback(chunk) {
                Ok(()) => {
                    delivered += chunk.len() as u64;
                    true
                }
                Err(err) => {
                    failure = Some(err);
                    false
                }
            }),
        )?;

        if let Some(err) = failure {
            return Err(self.session.abort(RarError::write(&self.entry.name, err)));
        }
        self.conclude(status)?;
        Ok(delivered)
    }

    /// Decode the entry and discard the output, verifying its checksum.
    pub fn test(mut self) -> Result<()> {
        self.check_password()?;
        let status = self.session.run(Operation::Test, None)?;
        self.conclude(status)
    }

    /// Translate the status of a decode.
    ///
    /// RAR 3.x and 4.x archives report a wrong password as a checksum
    /// failure, so `BadData` on an encrypted entry decoded with a password
    /// becomes `BadPassword` and ends the session.
    fn conclude(&mut self, status: i32) -> Result<()> {
        if Status::from_code(status).is_success() {
            return Ok(());
        }
        let mut err = RarError::from_code(status);
        if err.kind() == ErrorKind::BadData
            && self.entry.is_encrypted()
            && self.session.has_password()
        {
            err = RarError::Decoder {
                kind: ErrorKind::BadPassword,
                code: status,
            };
        }
        Err(self.session.abort(err))
    }
}

impl<D: Decoder, M: Mode> std::fmt::Debug for CurrentEntry<'_, D, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentEntry")
            .field("entry", &self.entry)
            .finish()
    }
}

fn check_readable(path: &Path) -> Result<()> {
    let readable = path.is_file() && File::open(path).is_ok();
    if readable {
        Ok(())
    } else {
        debug!(path = %path.display(), "archive path is not a readable file");
        Err(RarError::archive_not_found(path))
    }
}
