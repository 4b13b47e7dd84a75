mod common;

use common::{RarBuilder, sample_archive};
use oxirar_archive::session::{ArchiveSession, Extract};
use oxirar_archive::{NativeDecoder, OverwritePolicy, RarArchive};
use oxirar_core::{Crc32, ErrorKind};
use std::fs;

#[test]
fn test_every_listed_entry_extracts_with_matching_crc() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample_archive();
    let archive = RarArchive::new(&path);

    for entry in archive.list_entries()?.iter().filter(|e| e.is_file()) {
        let data = archive.extract_entry(&entry.name)?;
        assert_eq!(data.len() as u64, entry.size, "{}", entry.name);
        assert_eq!(Crc32::compute(&data), entry.crc32, "{}", entry.name);
        assert!(entry.matches_crc(&data));
    }
    Ok(())
}

#[test]
fn test_extract_entry_content() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample_archive();
    let archive = RarArchive::new(&path);

    assert_eq!(archive.extract_entry("docs/guide.md")?, b"# Guide\n\nStep one.\n");
    assert_eq!(archive.extract_entry("docs\\guide.md")?, b"# Guide\n\nStep one.\n");
    assert!(archive.extract_entry("empty.bin")?.is_empty());
    Ok(())
}

#[test]
fn test_extract_missing_entry_touches_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let (dir, path) = sample_archive();
    let before: Vec<_> = fs::read_dir(dir.path())?.collect::<Result<_, _>>()?;

    let err = RarArchive::new(&path).extract_entry("nonexistent").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EntryNotFound);

    let after: Vec<_> = fs::read_dir(dir.path())?.collect::<Result<_, _>>()?;
    assert_eq!(before.len(), after.len());
    Ok(())
}

#[test]
fn test_extract_all_matches_extract_entry() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample_archive();
    let out = tempfile::tempdir()?;
    let archive = RarArchive::new(&path);

    let summary = archive.extract_all(out.path(), OverwritePolicy::Skip)?;
    assert_eq!(summary.files, 3);
    assert_eq!(summary.directories, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.bytes, 12 + 19);

    for entry in archive.list_entries()? {
        let target = out.path().join(&entry.name);
        if entry.is_dir() {
            assert!(target.is_dir());
        } else {
            assert_eq!(fs::read(&target)?, archive.extract_entry(&entry.name)?);
        }
    }
    Ok(())
}

#[test]
fn test_extract_all_respects_overwrite_policy() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample_archive();
    let out = tempfile::tempdir()?;
    fs::write(out.path().join("hello.txt"), b"local edit")?;
    let archive = RarArchive::new(&path);

    let summary = archive.extract_all(out.path(), OverwritePolicy::Skip)?;
    assert_eq!(summary.skipped, 1);
    assert_eq!(fs::read(out.path().join("hello.txt"))?, b"local edit");

    archive.extract_all(out.path(), OverwritePolicy::Overwrite)?;
    assert_eq!(fs::read(out.path().join("hello.txt"))?, b"Hello, RAR!\n");
    Ok(())
}

#[test]
fn test_corrupt_entry_reports_bad_data_and_continues() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = RarBuilder::new()
        .file("first.txt", b"first")
        .corrupt_file("broken.txt", b"this content fails its checksum")
        .file("last.txt", b"last")
        .write_to(dir.path(), "corrupt.rar");
    let archive = RarArchive::new(&path);

    let err = archive.extract_entry("broken.txt").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadData);

    let out = tempfile::tempdir()?;
    let err = archive.extract_all(out.path(), OverwritePolicy::Skip).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadData);
    assert_eq!(fs::read(out.path().join("first.txt"))?, b"first");
    assert_eq!(fs::read(out.path().join("last.txt"))?, b"last");
    assert!(!out.path().join("broken.txt").exists());

    assert_eq!(archive.test().unwrap_err().kind(), ErrorKind::BadData);
    Ok(())
}

#[test]
fn test_extract_buffered_streams_whole_entry() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let path = RarBuilder::new()
        .file("big.bin", &payload)
        .write_to(dir.path(), "big.rar");

    let mut collected = Vec::new();
    let mut last = 0.0f32;
    RarArchive::new(&path).extract_buffered("big.bin", |chunk, progress| {
        collected.extend_from_slice(chunk);
        assert!(progress >= last);
        last = progress;
        Ok(())
    })?;

    assert_eq!(collected, payload);
    assert_eq!(last, 1.0);
    Ok(())
}

#[test]
fn test_session_extract_to_writer() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample_archive();
    let mut session = ArchiveSession::<NativeDecoder, Extract>::open(&path, None)?;

    let mut out = Vec::new();
    while let Some(current) = session.next_header()? {
        if current.entry().name == "hello.txt" {
            current.extract_to(&mut out)?;
        } else {
            current.skip()?;
        }
    }
    session.close()?;
    assert_eq!(out, b"Hello, RAR!\n");
    Ok(())
}

#[test]
fn test_test_counts_files() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample_archive();
    assert_eq!(RarArchive::new(&path).test()?, 3);
    Ok(())
}

#[test]
fn test_corrupt_entry_does_not_replace_existing_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = RarBuilder::new()
        .corrupt_file("broken.txt", b"this content fails its checksum")
        .file("fine.txt", b"fine")
        .write_to(dir.path(), "corrupt.rar");
    let out = tempfile::tempdir()?;
    fs::write(out.path().join("broken.txt"), b"previous version")?;

    let err = RarArchive::new(&path)
        .extract_all(out.path(), OverwritePolicy::Overwrite)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadData);
    assert_eq!(fs::read(out.path().join("broken.txt"))?, b"previous version");
    assert_eq!(fs::read(out.path().join("fine.txt"))?, b"fine");
    assert_eq!(fs::read_dir(out.path())?.count(), 2);
    Ok(())
}
