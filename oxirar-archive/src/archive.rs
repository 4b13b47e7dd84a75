//! One-shot archive operations.
//!
//! [`RarArchive`] holds only a path, an optional password and a decoder.
//! Every operation opens a fresh [`ArchiveSession`] in the mode it needs,
//! walks the header chain, and closes the session before returning, on
//! success and on error alike. Repeated calls therefore produce identical
//! results for an unmodified archive.

use crate::decoder::Decoder;
use crate::dest::{Destination, DirectoryWriter, OverwritePolicy};
use crate::native::NativeDecoder;
use crate::session::{ArchiveSession, Extract, List, Mode};
use oxirar_core::entry::normalize_name;
use oxirar_core::{ArchiveInfo, Entry, ErrorKind, Password, RarError, Result};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Counts from a bulk extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Files written.
    pub files: usize,
    /// Directory entries created.
    pub directories: usize,
    /// Entries skipped because the destination declined them.
    pub skipped: usize,
    /// Total decoded bytes written.
    pub bytes: u64,
}

impl fmt::Display for ExtractSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} directories, {} skipped, {} bytes",
            self.files, self.directories, self.skipped, self.bytes
        )
    }
}

/// A RAR archive on disk.
///
/// # Example
///
/// ```rust,no_run
/// use oxirar_archive::RarArchive;
///
/// let archive = RarArchive::new("backup.rar");
/// for entry in archive.list_entries()? {
///     println!("{} ({} bytes)", entry.name, entry.size);
/// }
/// let readme = archive.extract_entry("docs/README.txt")?;
/// # Ok::<(), oxirar_core::RarError>(())
/// ```
pub struct RarArchive<D: Decoder = NativeDecoder> {
    path: PathBuf,
    password: Option<Password>,
    decoder: D,
}

impl RarArchive {
    /// Open-on-demand handle for the archive at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_decoder(path, NativeDecoder)
    }

    /// Same as [`RarArchive::new`], with a password for encrypted content.
    pub fn with_password(path: impl Into<PathBuf>, password: impl Into<Password>) -> Self {
        Self::new(path).password(password)
    }
}

impl<D: Decoder> RarArchive<D> {
    /// Use a specific decoder.
    pub fn with_decoder(path: impl Into<PathBuf>, decoder: D) -> Self {
        Self {
            path: path.into(),
            password: None,
            decoder,
        }
    }

    /// Builder method to set the password.
    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Path of the archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List all entries in physical header order.
    pub fn list_entries(&self) -> Result<Vec<Entry>> {
        let entries = self.with_session::<List, _>(false, |session| {
            let mut entries = Vec::new();
            while let Some(current) = session.next_header()? {
                entries.push(current.skip()?);
            }
            Ok(entries)
        })?;
        debug!(path = %self.path.display(), count = entries.len(), "listed entries");
        Ok(entries)
    }

    /// List entry names in physical header order.
    pub fn list_names(&self) -> Result<Vec<String>> {
        Ok(self
            .list_entries()?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    /// Decode one entry into memory.
    ///
    /// `name` is matched exactly and case-sensitively after `\` is
    /// normalised to `/`. Entries before the match are skipped, not decoded.
    pub fn extract_entry(&self, name: &str) -> Result<Vec<u8>> {
        let wanted = normalize_name(name);
        self.with_session::<Extract, _>(false, |session| {
            while let Some(current) = session.next_header()? {
                if current.entry().name == wanted {
                    return current.read();
                }
                current.skip()?;
            }
            Err(RarError::entry_not_found(&wanted))
        })
    }

    /// Decode one entry in chunks without materialising it.
    ///
    /// `action` receives each chunk and the fraction of the entry decoded so
    /// far, in `0.0..=1.0`. An error from `action` stops decoding and is
    /// returned as `WriteFailed`.
    pub fn extract_buffered<F>(&self, name: &str, mut action: F) -> Result<()>
    where
        F: FnMut(&[u8], f32) -> io::Result<()>,
    {
        let wanted = normalize_name(name);
        self.with_session::<Extract, _>(false, |session| {
            while let Some(current) = session.next_header()? {
                if current.entry().name != wanted {
                    current.skip()?;
                    continue;
                }
                let total = current.entry().size;
                let mut done = 0u64;
                current.stream(|chunk| {
                    done += chunk.len() as u64;
                    let progress = if total == 0 {
                        1.0
                    } else {
                        (done as f64 / total as f64).min(1.0) as f32
                    };
                    action(chunk, progress)
                })?;
                return Ok(());
            }
            Err(RarError::entry_not_found(&wanted))
        })
    }

    /// Extract every entry into `dir`.
    pub fn extract_all(
        &self,
        dir: impl AsRef<Path>,
        policy: OverwritePolicy,
    ) -> Result<ExtractSummary> {
        let mut writer = DirectoryWriter::new(dir.as_ref(), policy);
        self.extract_all_to(&mut writer)
    }

    /// Extract every entry into an injected destination.
    ///
    /// The destination is only asked for a sink once the entry is known to
    /// be decodable with the session's password. A corrupt entry is
    /// abandoned and extraction carries on with the next one; the first
    /// such error is returned once the archive is exhausted.
    /// Every other failure aborts immediately. Files already written stay in
    /// place either way.
    pub fn extract_all_to<T: Destination>(&self, dest: &mut T) -> Result<ExtractSummary> {
        let summary = self.with_session::<Extract, _>(false, |session| {
            let mut summary = ExtractSummary::default();
            let mut first_error: Option<RarError> = None;

            while let Some(mut current) = session.next_header()? {
                let entry = current.entry().clone();

                if entry.is_dir() {
                    dest.create_dir(&entry)
                        .map_err(|e| RarError::create(&entry.name, e))?;
                    current.skip()?;
                    summary.directories += 1;
                    continue;
                }

                current.check_password()?;
                let Some(mut sink) = dest
                    .create(&entry)
                    .map_err(|e| RarError::create(&entry.name, e))?
                else {
                    current.skip()?;
                    summary.skipped += 1;
                    continue;
                };

                match current.extract_to(&mut sink) {
                    Ok(bytes) => {
                        dest.finish(&entry, sink)
                            .map_err(|e| RarError::write(&entry.name, e))?;
                        summary.files += 1;
                        summary.bytes += bytes;
                    }
                    Err(err) => {
                        dest.abandon(&entry, sink);
                        if err.is_terminal() {
                            return Err(err);
                        }
                        warn!(name = %entry.name, error = %err, "entry failed, continuing");
                        first_error.get_or_insert(err);
                    }
                }
            }

            match first_error {
                Some(err) => Err(err),
                None => Ok(summary),
            }
        })?;
        debug!(path = %self.path.display(), %summary, "extracted archive");
        Ok(summary)
    }

    /// Whether any content needs a password.
    ///
    /// True when headers are encrypted or any entry carries the encrypted
    /// flag.
    pub fn is_password_protected(&self) -> Result<bool> {
        let scan = self.with_session::<List, _>(false, |session| {
            if session.info().has_encrypted_headers() {
                return Ok(true);
            }
            while let Some(current) = session.next_header()? {
                if current.requires_password() {
                    return Ok(true);
                }
                current.skip()?;
            }
            Ok(false)
        });
        match scan {
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::MissingPassword | ErrorKind::BadPassword
                ) =>
            {
                Ok(true)
            }
            other => other,
        }
    }

    /// Archive-level flags and comment.
    pub fn info(&self) -> Result<ArchiveInfo> {
        self.with_session::<List, _>(true, |session| Ok(session.info().clone()))
    }

    /// Decode every file entry without writing it, verifying checksums.
    ///
    /// Returns the number of entries checked.
    pub fn test(&self) -> Result<usize> {
        self.with_session::<Extract, _>(false, |session| {
            let mut checked = 0;
            while let Some(current) = session.next_header()? {
                if current.entry().is_dir() {
                    current.skip()?;
                    continue;
                }
                current.test()?;
                checked += 1;
            }
            Ok(checked)
        })
    }

    /// Open a session, run `op`, and close the session on every path.
    ///
    /// A success is only reported if the close succeeded too.
    fn with_session<M, T>(
        &self,
        read_comment: bool,
        op: impl FnOnce(&mut ArchiveSession<D, M>) -> Result<T>,
    ) -> Result<T>
    where
        M: Mode,
    {
        let mut session =
            ArchiveSession::open_inner(&self.decoder, &self.path, self.password.clone(), read_comment)?;
        let result = op(&mut session);
        let closed = session.close();
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    warn!(path = %self.path.display(), error = %close_err, "failed to close archive after error");
                }
                Err(err)
            }
        }
    }
}

impl<D: Decoder> fmt::Debug for RarArchive<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RarArchive")
            .field("path", &self.path)
            .field("password", &self.password)
            .finish()
    }
}
