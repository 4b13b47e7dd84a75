//! Builds small RAR 4.x archives for integration tests.
//!
//! Entries are stored (method 0x30) so no compressor is needed; header and
//! file CRCs are computed so the real decoder accepts the result.

#![allow(dead_code)]

use oxirar_core::Crc32;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const MARKER: [u8; 7] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00];
const MAIN_HEAD: u8 = 0x73;
const FILE_HEAD: u8 = 0x74;
const ENDARC_HEAD: u8 = 0x7B;

const LONG_BLOCK: u16 = 0x8000;
const DIRECTORY_WINDOW: u16 = 0x00E0;
const SKIP_IF_UNKNOWN: u16 = 0x4000;

/// 2024-01-01 12:00:00 as an MS-DOS timestamp.
pub const DOS_TIME: u32 = (((44 << 9) | (1 << 5) | 1) << 16) | (12 << 11);

enum Item {
    File { name: String, data: Vec<u8>, corrupt: bool },
    Dir { name: String },
}

/// Accumulates entries and renders them as a RAR 4.x archive.
#[derive(Default)]
pub struct RarBuilder {
    items: Vec<Item>,
}

impl RarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, data: &[u8]) -> Self {
        self.items.push(Item::File {
            name: name.to_owned(),
            data: data.to_vec(),
            corrupt: false,
        });
        self
    }

    /// A file whose stored CRC does not match its content.
    pub fn corrupt_file(mut self, name: &str, data: &[u8]) -> Self {
        self.items.push(Item::File {
            name: name.to_owned(),
            data: data.to_vec(),
            corrupt: true,
        });
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.items.push(Item::Dir {
            name: name.to_owned(),
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = MARKER.to_vec();
        push_block(&mut out, MAIN_HEAD, 0, &[0u8; 6]);

        for item in &self.items {
            match item {
                Item::File {
                    name,
                    data,
                    corrupt,
                } => {
                    let mut crc = Crc32::compute(data);
                    if *corrupt {
                        crc ^= 0xFFFF_FFFF;
                    }
                    let body = file_header_body(name, data.len() as u32, crc, 0o100644);
                    push_block(&mut out, FILE_HEAD, LONG_BLOCK, &body);
                    out.extend_from_slice(data);
                }
                Item::Dir { name } => {
                    let body = file_header_body(name, 0, 0, 0o040755);
                    push_block(&mut out, FILE_HEAD, LONG_BLOCK | DIRECTORY_WINDOW, &body);
                }
            }
        }

        push_block(&mut out, ENDARC_HEAD, SKIP_IF_UNKNOWN, &[]);
        out
    }

    /// Write the archive to `dir/name` and return its path.
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).expect("write archive");
        path
    }
}

fn file_header_body(name: &str, size: u32, crc: u32, attr: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&size.to_le_bytes()); // PACK_SIZE
    body.extend_from_slice(&size.to_le_bytes()); // UNP_SIZE
    body.push(3); // HOST_OS: Unix
    body.extend_from_slice(&crc.to_le_bytes());
    body.extend_from_slice(&DOS_TIME.to_le_bytes());
    body.push(29); // UNP_VER
    body.push(0x30); // METHOD: store
    body.extend_from_slice(&(name.len() as u16).to_le_bytes());
    body.extend_from_slice(&attr.to_le_bytes());
    body.extend_from_slice(name.as_bytes());
    body
}

/// Append HEAD_CRC, HEAD_TYPE, HEAD_FLAGS, HEAD_SIZE and `body`.
fn push_block(out: &mut Vec<u8>, kind: u8, flags: u16, body: &[u8]) {
    let size = (7 + body.len()) as u16;
    let mut header = vec![kind];
    header.extend_from_slice(&flags.to_le_bytes());
    header.extend_from_slice(&size.to_le_bytes());
    header.extend_from_slice(body);

    let crc = (Crc32::compute(&header) & 0xFFFF) as u16;
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&header);
}

/// The archive most tests share.
pub fn sample_archive() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = RarBuilder::new()
        .file("hello.txt", b"Hello, RAR!\n")
        .dir("docs")
        .file("docs/guide.md", b"# Guide\n\nStep one.\n")
        .file("empty.bin", b"")
        .write_to(dir.path(), "sample.rar");
    (dir, path)
}
