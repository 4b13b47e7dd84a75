//! Extraction destinations.
//!
//! Bulk extraction hands each entry to a [`Destination`], which owns every
//! filesystem decision: where an entry lands, whether an existing file may
//! be replaced and what happens to a half-written file after a failure.
//! [`DirectoryWriter`] is the on-disk implementation. It writes each entry to
//! a partial file beside its target and renames it into place only once the
//! entry has decoded completely, so a failed entry never disturbs a file
//! that was already there.

use filetime::FileTime;
use oxirar_core::Entry;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What to do when an entry's destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Replace existing files.
    Overwrite,
    /// Leave existing files alone and skip the entry.
    #[default]
    Skip,
}

/// Receiver for extracted entries.
pub trait Destination {
    /// Writer for one entry's content.
    type Sink: Write;

    /// Prepare to receive `entry`.
    ///
    /// Returns `Ok(None)` when the overwrite policy declines the entry.
    fn create(&mut self, entry: &Entry) -> io::Result<Option<Self::Sink>>;

    /// Materialise a directory entry.
    fn create_dir(&mut self, entry: &Entry) -> io::Result<()>;

    /// Commit a fully written entry.
    fn finish(&mut self, entry: &Entry, sink: Self::Sink) -> io::Result<()>;

    /// Discard a partially written entry.
    fn abandon(&mut self, entry: &Entry, sink: Self::Sink);
}

/// An entry being written to a partial file beside its target.
#[derive(Debug)]
pub struct PartialFile {
    writer: BufWriter<File>,
    partial: PathBuf,
    target: PathBuf,
}

impl PartialFile {
    fn create(target: PathBuf) -> io::Result<Self> {
        let partial = partial_path(&target);
        let file = File::create(&partial)?;
        Ok(Self {
            writer: BufWriter::new(file),
            partial,
            target,
        })
    }

    /// Final location of the entry.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Flush, sync and move the partial file over the target.
    fn commit(self) -> io::Result<PathBuf> {
        let Self {
            writer,
            partial,
            target,
        } = self;
        let result = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| file.sync_all())
            .and_then(|()| fs::rename(&partial, &target));
        match result {
            Ok(()) => Ok(target),
            Err(err) => {
                remove_partial(&partial);
                Err(err)
            }
        }
    }

    fn discard(self) {
        let Self { writer, partial, .. } = self;
        drop(writer);
        remove_partial(&partial);
    }
}

impl Write for PartialFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// `dir/name` becomes `dir/.name.part`.
fn partial_path(target: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    if let Some(file_name) = target.file_name() {
        name.push(file_name);
    }
    name.push(".part");
    target.with_file_name(name)
}

fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed partial file"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "failed to remove partial file"),
    }
}

/// Writes entries as files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryWriter {
    root: PathBuf,
    policy: OverwritePolicy,
    preserve_mtime: bool,
}

impl DirectoryWriter {
    /// Create a writer rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, policy: OverwritePolicy) -> Self {
        Self {
            root: root.into(),
            policy,
            preserve_mtime: true,
        }
    }

    /// Restore entry modification times on written files (default: on).
    pub fn preserve_mtime(mut self, preserve: bool) -> Self {
        self.preserve_mtime = preserve;
        self
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the on-disk path for `entry`, refusing names that escape the root.
    pub fn target(&self, entry: &Entry) -> io::Result<PathBuf> {
        entry
            .validate_path()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let relative = entry.sanitized_name();
        if relative.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("entry has an empty path: {:?}", entry.name),
            ));
        }
        Ok(self.root.join(relative))
    }

    fn apply_mtime(&self, entry: &Entry, path: &Path) {
        if !self.preserve_mtime {
            return;
        }
        if let Some(modified) = entry.modified {
            let mtime = FileTime::from_system_time(modified);
            if let Err(err) = filetime::set_file_mtime(path, mtime) {
                warn!(path = %path.display(), error = %err, "failed to restore modification time");
            }
        }
    }
}

impl Destination for DirectoryWriter {
    type Sink = PartialFile;

    fn create(&mut self, entry: &Entry) -> io::Result<Option<Self::Sink>> {
        let path = self.target(entry)?;
        if self.policy == OverwritePolicy::Skip && path.exists() {
            debug!(path = %path.display(), "destination exists, skipping");
            return Ok(None);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        PartialFile::create(path).map(Some)
    }

    fn create_dir(&mut self, entry: &Entry) -> io::Result<()> {
        let path = self.target(entry)?;
        fs::create_dir_all(&path)?;
        self.apply_mtime(entry, &path);
        Ok(())
    }

    fn finish(&mut self, entry: &Entry, sink: Self::Sink) -> io::Result<()> {
        let path = sink.commit()?;
        self.apply_mtime(entry, &path);
        Ok(())
    }

    fn abandon(&mut self, _entry: &Entry, sink: Self::Sink) {
        sink.discard();
    }
}
