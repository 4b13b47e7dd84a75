//! Archive-level metadata.

use std::fmt;

bitflags::bitflags! {
    /// Flags reported for the archive as a whole when it is opened.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ArchiveFlags: u32 {
        /// Archive is one volume of a multi-volume set.
        const VOLUME = 0x0001;
        /// Archive carries a comment.
        const COMMENT = 0x0002;
        /// Archive is locked against modification.
        const LOCKED = 0x0004;
        /// Archive is solid.
        const SOLID = 0x0008;
        /// Volumes use the `name.partN.rar` naming scheme.
        const NEW_NUMBERING = 0x0010;
        /// Archive carries an authenticity signature.
        const SIGNED = 0x0020;
        /// Archive carries a recovery record.
        const RECOVERY = 0x0040;
        /// File headers are encrypted.
        const ENCRYPTED_HEADERS = 0x0080;
        /// This is the first volume of a set.
        const FIRST_VOLUME = 0x0100;
    }
}

/// Metadata about an opened archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveInfo {
    /// Archive flags.
    pub flags: ArchiveFlags,
    /// Archive comment, when requested and present.
    pub comment: Option<String>,
}

impl ArchiveInfo {
    /// Create archive info from raw flags.
    pub fn new(flags: ArchiveFlags) -> Self {
        Self {
            flags,
            comment: None,
        }
    }

    /// Check if the archive is part of a volume set.
    pub fn is_volume(&self) -> bool {
        self.flags.contains(ArchiveFlags::VOLUME)
    }

    /// Check if this is the first volume (or a single-volume archive).
    pub fn is_first_volume(&self) -> bool {
        !self.is_volume() || self.flags.contains(ArchiveFlags::FIRST_VOLUME)
    }

    /// Check if the archive is solid.
    pub fn is_solid(&self) -> bool {
        self.flags.contains(ArchiveFlags::SOLID)
    }

    /// Check if header encryption is in use.
    ///
    /// Such archives cannot even be listed without a password.
    pub fn has_encrypted_headers(&self) -> bool {
        self.flags.contains(ArchiveFlags::ENCRYPTED_HEADERS)
    }

    /// Check if the archive carries a recovery record.
    pub fn has_recovery_record(&self) -> bool {
        self.flags.contains(ArchiveFlags::RECOVERY)
    }

    /// Check if the archive is locked.
    pub fn is_locked(&self) -> bool {
        self.flags.contains(ArchiveFlags::LOCKED)
    }
}

impl fmt::Display for ArchiveInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut attrs = Vec::new();
        if self.is_volume() {
            attrs.push("volume");
        }
        if self.is_solid() {
            attrs.push("solid");
        }
        if self.is_locked() {
            attrs.push("locked");
        }
        if self.has_encrypted_headers() {
            attrs.push("encrypted headers");
        }
        if self.has_recovery_record() {
            attrs.push("recovery record");
        }
        if attrs.is_empty() {
            f.write_str("plain")
        } else {
            f.write_str(&attrs.join(", "))
        }
    }
}
