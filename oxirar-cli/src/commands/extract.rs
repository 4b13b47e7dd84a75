//! Extract command implementation.

use crate::utils::{create_progress_bar, format_size, matches_filters};
use indicatif::ProgressBar;
use oxirar_archive::{Destination, DirectoryWriter, OverwritePolicy, PartialFile, RarArchive};
use oxirar_core::entry::normalize_name;
use oxirar_core::{Entry, Password};
use std::io;
use std::path::Path;
use tracing::debug;

/// Options for extracting archive contents.
pub struct ExtractOptions<'a> {
    pub files: &'a [String],
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub overwrite: bool,
    pub verbose: bool,
    pub progress: bool,
}

impl ExtractOptions<'_> {
    fn selects(&self, entry: &Entry) -> bool {
        let named = self.files.is_empty()
            || self
                .files
                .iter()
                .any(|f| normalize_name(f) == entry.name);
        named && matches_filters(&entry.name, self.include, self.exclude)
    }
}

/// Directory writer that applies the command-line selection and reports progress.
struct SelectingWriter<'a> {
    inner: DirectoryWriter,
    options: &'a ExtractOptions<'a>,
    progress: ProgressBar,
    unselected: usize,
}

impl Destination for SelectingWriter<'_> {
    type Sink = PartialFile;

    fn create(&mut self, entry: &Entry) -> io::Result<Option<Self::Sink>> {
        if !self.options.selects(entry) {
            self.unselected += 1;
            return Ok(None);
        }
        let sink = self.inner.create(entry)?;
        if sink.is_none() {
            self.progress.inc(1);
            if self.options.verbose {
                self.progress.println(format!("  skipped (exists): {}", entry.name));
            }
        }
        Ok(sink)
    }

    fn create_dir(&mut self, entry: &Entry) -> io::Result<()> {
        if self.options.selects(entry) {
            self.inner.create_dir(entry)?;
        }
        Ok(())
    }

    fn finish(&mut self, entry: &Entry, sink: Self::Sink) -> io::Result<()> {
        self.inner.finish(entry, sink)?;
        self.progress.set_message(entry.name.clone());
        self.progress.inc(1);
        if self.options.verbose {
            self.progress
                .println(format!("  extracted: {} ({})", entry.name, format_size(entry.size)));
        }
        Ok(())
    }

    fn abandon(&mut self, entry: &Entry, sink: Self::Sink) {
        self.progress.println(format!("  FAILED: {}", entry.name));
        self.inner.abandon(entry, sink);
    }
}

pub fn cmd_extract(
    archive: &Path,
    output: &Path,
    password: Option<Password>,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let rar = match password {
        Some(pw) => RarArchive::with_password(archive, pw),
        None => RarArchive::new(archive),
    };

    let selected = rar
        .list_entries()?
        .iter()
        .filter(|e| e.is_file() && options.selects(e))
        .count();
    if selected == 0 {
        return Err("no entries match the selection".into());
    }
    debug!(archive = %archive.display(), selected, "extracting");

    let policy = if options.overwrite {
        OverwritePolicy::Overwrite
    } else {
        OverwritePolicy::Skip
    };
    let mut writer = SelectingWriter {
        inner: DirectoryWriter::new(output, policy),
        options,
        progress: create_progress_bar(selected as u64, options.progress),
        unselected: 0,
    };

    let result = rar.extract_all_to(&mut writer);
    writer.progress.finish_and_clear();
    let summary = result?;

    println!(
        "Extracted {} files ({}) to {}",
        summary.files,
        format_size(summary.bytes),
        output.display()
    );
    let existing = summary.skipped - writer.unselected;
    if existing > 0 {
        println!("Skipped {} existing files (use --overwrite to replace)", existing);
    }
    Ok(())
}
