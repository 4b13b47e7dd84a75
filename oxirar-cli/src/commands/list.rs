//! List command implementation.

use crate::utils::{filter_entries, print_entries, unix_seconds};
use oxirar_archive::RarArchive;
use oxirar_core::{Entry, Password};
use serde::Serialize;
use std::path::Path;

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize)]
struct EntryJson {
    name: String,
    size: u64,
    compressed_size: u64,
    ratio: f64,
    method: String,
    host_os: String,
    crc: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    mtime: Option<i64>,
    is_dir: bool,
    encrypted: bool,
    split: bool,
}

impl EntryJson {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.size,
            compressed_size: entry.compressed_size,
            ratio: entry.compression_ratio(),
            method: entry.method.name().to_string(),
            host_os: entry.host_os.name().to_string(),
            crc: entry.crc32,
            mtime: entry.modified.and_then(unix_seconds),
            is_dir: entry.is_dir(),
            encrypted: entry.is_encrypted(),
            split: entry.is_split(),
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize)]
struct ArchiveListJson {
    archive: String,
    entries: Vec<EntryJson>,
}

/// Options for listing archive contents.
pub struct ListOptions<'a> {
    pub verbose: bool,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(
    archive: &Path,
    password: Option<Password>,
    options: &ListOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let rar = match password {
        Some(pw) => RarArchive::with_password(archive, pw),
        None => RarArchive::new(archive),
    };
    let entries = filter_entries(&rar.list_entries()?, options.include, options.exclude);

    if options.json {
        let listing = ArchiveListJson {
            archive: archive.display().to_string(),
            entries: entries.iter().map(EntryJson::from_entry).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if options.verbose {
        println!("Archive: {}", archive.display());
        println!();
    }
    print_entries(&entries, options.verbose);
    Ok(())
}
