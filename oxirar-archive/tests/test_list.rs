mod common;

use common::{MARKER, RarBuilder, sample_archive};
use oxirar_archive::session::{ArchiveSession, List};
use oxirar_archive::{NativeDecoder, RarArchive};
use oxirar_core::{Crc32, HostOs, PackingMethod};

#[test]
fn test_fixture_blocks_match_known_bytes() {
    let bytes = RarBuilder::new().build();
    assert_eq!(&bytes[..7], &MARKER);
    assert_eq!(
        &bytes[7..20],
        &[0xCF, 0x90, 0x73, 0x00, 0x00, 0x0D, 0x00, 0, 0, 0, 0, 0, 0]
    );
    assert_eq!(&bytes[20..], &[0xC4, 0x3D, 0x7B, 0x00, 0x40, 0x07, 0x00]);
}

#[test]
fn test_list_entries() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample_archive();
    let archive = RarArchive::new(&path);

    let entries = archive.list_entries()?;
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["hello.txt", "docs", "docs/guide.md", "empty.bin"]);

    let hello = &entries[0];
    assert_eq!(hello.size, 12);
    assert_eq!(hello.compressed_size, 12);
    assert_eq!(hello.crc32, Crc32::compute(b"Hello, RAR!\n"));
    assert_eq!(hello.method, PackingMethod::Store);
    assert_eq!(hello.host_os, HostOs::Unix);
    assert!(hello.modified.is_some());
    assert!(!hello.is_encrypted());
    assert!(!hello.is_split());

    assert!(entries[1].is_dir());
    assert_eq!(entries[3].size, 0);
    Ok(())
}

#[test]
fn test_list_names_twice_is_identical() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample_archive();
    let archive = RarArchive::new(&path);

    let first = archive.list_entries()?;
    let second = archive.list_entries()?;
    assert_eq!(first, second);
    assert_eq!(
        archive.list_names()?,
        first.iter().map(|e| e.name.clone()).collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn test_session_walk_is_fused() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample_archive();
    let mut session = ArchiveSession::<NativeDecoder, List>::open(&path, None)?;

    let mut count = 0;
    while let Some(current) = session.next_header()? {
        current.skip()?;
        count += 1;
    }
    assert_eq!(count, 4);
    assert!(session.next_header()?.is_none());
    session.close()?;
    session.close()?;
    Ok(())
}

#[test]
fn test_info_of_plain_archive() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample_archive();
    let info = RarArchive::new(&path).info()?;

    assert!(!info.is_volume());
    assert!(!info.is_solid());
    assert!(!info.has_encrypted_headers());
    assert!(info.comment.is_none());
    Ok(())
}

#[test]
fn test_unencrypted_archive_is_not_protected() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, path) = sample_archive();
    assert!(!RarArchive::new(&path).is_password_protected()?);
    Ok(())
}
