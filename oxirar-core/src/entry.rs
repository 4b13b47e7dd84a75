//! Archive entry metadata.
//!
//! This module defines the [`Entry`] struct, the decoded header of one file
//! or directory stored in a RAR archive, along with its flag set, packing
//! method and host operating system.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

bitflags::bitflags! {
    /// Per-entry header flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntryFlags: u32 {
        /// Entry data continues from the previous volume.
        const SPLIT_BEFORE = 0x01;
        /// Entry data continues on the next volume.
        const SPLIT_AFTER = 0x02;
        /// Entry is encrypted with a password.
        const ENCRYPTED = 0x04;
        /// Entry carries a file comment.
        const COMMENT = 0x08;
        /// Entry is part of a solid stream.
        const SOLID = 0x10;
        /// Entry is a directory.
        const DIRECTORY = 0x20;
    }
}

/// Packing method recorded in the entry header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackingMethod {
    /// No compression.
    #[default]
    Store,
    /// Fastest compression.
    Fastest,
    /// Fast compression.
    Fast,
    /// Normal compression.
    Normal,
    /// Good compression.
    Good,
    /// Best compression.
    Best,
    /// Unrecognised method byte.
    Unknown(u32),
}

impl PackingMethod {
    /// Decode the method byte (`0x30`..=`0x35`).
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0x30 => Self::Store,
            0x31 => Self::Fastest,
            0x32 => Self::Fast,
            0x33 => Self::Normal,
            0x34 => Self::Good,
            0x35 => Self::Best,
            other => Self::Unknown(other),
        }
    }

    /// Check if this method is "store" (no compression).
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Store)
    }

    /// Get the method name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Store => "Store",
            Self::Fastest => "Fastest",
            Self::Fast => "Fast",
            Self::Normal => "Normal",
            Self::Good => "Good",
            Self::Best => "Best",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl std::fmt::Display for PackingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(id) => write!(f, "Unknown({:#x})", id),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Operating system the entry was archived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HostOs {
    /// MS-DOS.
    MsDos,
    /// OS/2.
    Os2,
    /// Windows.
    #[default]
    Windows,
    /// Unix and Unix-like systems.
    Unix,
    /// Classic Mac OS.
    MacOs,
    /// BeOS.
    BeOs,
    /// Unrecognised host identifier.
    Unknown(u32),
}

impl HostOs {
    /// Decode the host OS identifier.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::MsDos,
            1 => Self::Os2,
            2 => Self::Windows,
            3 => Self::Unix,
            4 => Self::MacOs,
            5 => Self::BeOs,
            other => Self::Unknown(other),
        }
    }

    /// Get the OS name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MsDos => "MS-DOS",
            Self::Os2 => "OS/2",
            Self::Windows => "Windows",
            Self::Unix => "Unix",
            Self::MacOs => "Mac OS",
            Self::BeOs => "BeOS",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl std::fmt::Display for HostOs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An entry in a RAR archive.
///
/// Produced by walking the header chain; immutable once decoded. Entries from
/// one session arrive in physical header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path within the archive, `/`-separated.
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Packed size in bytes (this volume only for split entries).
    pub compressed_size: u64,
    /// Last modification time.
    pub modified: Option<SystemTime>,
    /// CRC-32 of the decompressed content.
    pub crc32: u32,
    /// Dictionary (window) size in bytes.
    pub dictionary_size: u64,
    /// Header flags.
    pub flags: EntryFlags,
    /// Packing method.
    pub method: PackingMethod,
    /// Host operating system.
    pub host_os: HostOs,
    /// Raw host file attributes.
    pub attributes: u32,
    /// RAR version needed to unpack, times ten (e.g. 29 for 2.9).
    pub unpack_version: u32,
    /// Byte offset of the header within the archive, when the decoder reports it.
    pub header_offset: Option<u64>,
}

impl Entry {
    /// Create a new file entry.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: normalize_name(&name.into()),
            size,
            compressed_size: size,
            modified: None,
            crc32: 0,
            dictionary_size: 0,
            flags: EntryFlags::empty(),
            method: PackingMethod::Store,
            host_os: HostOs::default(),
            attributes: 0,
            unpack_version: 29,
            header_offset: None,
        }
    }

    /// Create a new directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        let mut entry = Self::file(name, 0);
        entry.flags |= EntryFlags::DIRECTORY;
        entry
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.flags.contains(EntryFlags::DIRECTORY)
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    /// Check if the entry is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(EntryFlags::ENCRYPTED)
    }

    /// Check if the entry spans more than one volume.
    pub fn is_split(&self) -> bool {
        self.flags
            .intersects(EntryFlags::SPLIT_BEFORE | EntryFlags::SPLIT_AFTER)
    }

    /// Check if the entry belongs to a solid stream.
    pub fn is_solid(&self) -> bool {
        self.flags.contains(EntryFlags::SOLID)
    }

    /// Get the compression ratio (compressed/uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.size as f64
        }
    }

    /// Get the space savings as a percentage.
    pub fn space_savings(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            (1.0 - self.compression_ratio()) * 100.0
        }
    }

    /// Check decoded content against the stored CRC-32.
    pub fn matches_crc(&self, data: &[u8]) -> bool {
        crate::crc::Crc32::compute(data) == self.crc32
    }

    /// Builder method to set compressed size.
    pub fn with_compressed_size(mut self, size: u64) -> Self {
        self.compressed_size = size;
        self
    }

    /// Builder method to set the CRC-32.
    pub fn with_crc32(mut self, crc: u32) -> Self {
        self.crc32 = crc;
        self
    }

    /// Builder method to set the packing method.
    pub fn with_method(mut self, method: PackingMethod) -> Self {
        self.method = method;
        self
    }

    /// Builder method to set modification time.
    pub fn with_modified(mut self, time: SystemTime) -> Self {
        self.modified = Some(time);
        self
    }

    /// Builder method to add flags.
    pub fn with_flags(mut self, flags: EntryFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Validate the entry path for security.
    ///
    /// Returns an error if the path contains potentially dangerous components
    /// like ".." (parent directory traversal) or absolute paths.
    pub fn validate_path(&self) -> crate::error::Result<()> {
        use crate::error::RarError;
        use std::path::{Component, Path};

        let reject = || {
            RarError::invalid_argument(format!("entry path escapes destination: {}", self.name))
        };

        if self.name.starts_with('/') || Path::new(&self.name).is_absolute() {
            return Err(reject());
        }

        for component in Path::new(&self.name).components() {
            match component {
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(reject());
                }
                Component::Normal(s) if s.to_string_lossy().contains('\0') => {
                    return Err(reject());
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Get a sanitized path that's safe for extraction.
    ///
    /// Drops "..", "." and root components and replaces NUL bytes.
    pub fn sanitized_name(&self) -> String {
        self.name
            .split('/')
            .filter(|part| !part.is_empty() && *part != "." && *part != "..")
            .map(|part| part.replace('\0', "_"))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::file("", 0)
    }
}

impl std::fmt::Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let type_char = if self.is_dir() { 'd' } else { '-' };
        let lock_char = if self.is_encrypted() { '*' } else { ' ' };
        write!(
            f,
            "{}{}{:>10} {:>10} {:>6.1}% {:08X} {}",
            type_char,
            lock_char,
            self.size,
            self.compressed_size,
            self.space_savings(),
            self.crc32,
            self.name
        )
    }
}

/// Normalise an archive path: backslashes become `/`.
pub fn normalize_name(name: &str) -> String {
    name.replace('\\', "/")
}

/// Convert a packed MS-DOS date/time (date in the high word) to `SystemTime`.
pub fn dos_time_to_system(dos: u32) -> Option<SystemTime> {
    let date = (dos >> 16) as u16;
    let time = (dos & 0xFFFF) as u16;

    // DOS date: bits 0-4 = day, 5-8 = month, 9-15 = year since 1980
    let day = (date & 0x1F) as u32;
    let month = ((date >> 5) & 0x0F) as u32;
    let year = ((date >> 9) & 0x7F) as u32 + 1980;

    // DOS time: bits 0-4 = seconds/2, 5-10 = minutes, 11-15 = hours
    let seconds = ((time & 0x1F) as u64) * 2;
    let minutes = ((time >> 5) & 0x3F) as u64;
    let hours = ((time >> 11) & 0x1F) as u64;

    if day == 0 || month == 0 || month > 12 || hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }

    let mut days = 0u64;
    for y in 1970..year {
        days += if is_leap_year(y) { 366 } else { 365 };
    }

    let month_days = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    days += month_days[month as usize - 1];
    if month > 2 && is_leap_year(year) {
        days += 1;
    }
    days += (day - 1) as u64;

    let secs = days * 86400 + hours * 3600 + minutes * 60 + seconds;
    Some(UNIX_EPOCH + Duration::from_secs(secs))
}

/// Seconds between 1601-01-01 and the Unix epoch.
const FILETIME_EPOCH_OFFSET: u64 = 11_644_473_600;

/// Convert a Windows FILETIME (100ns ticks since 1601) to `SystemTime`.
///
/// Returns `None` for zero and for times before the Unix epoch.
pub fn filetime_to_system(ticks: u64) -> Option<SystemTime> {
    if ticks == 0 {
        return None;
    }
    let secs = (ticks / 10_000_000).checked_sub(FILETIME_EPOCH_OFFSET)?;
    let nanos = (ticks % 10_000_000) as u32 * 100;
    Some(UNIX_EPOCH + Duration::new(secs, nanos))
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
