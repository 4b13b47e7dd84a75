//! Scripted in-memory decoder for exercising sessions without UnRAR.

use crate::decoder::{DataSink, Decoder, DecoderHandle, OpenMode, Operation};
use oxirar_core::status::{
    ERAR_BAD_PASSWORD, ERAR_END_ARCHIVE, ERAR_MISSING_PASSWORD, ERAR_SUCCESS, ERAR_UNKNOWN,
};
use oxirar_core::{ArchiveFlags, ArchiveInfo, Crc32, Entry, EntryFlags};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

/// One scripted entry.
#[derive(Debug, Clone)]
pub(crate) struct MockEntry {
    pub entry: Entry,
    pub data: Vec<u8>,
    /// Status returned by `read_header` instead of this entry.
    pub header_status: Option<i32>,
    /// Status returned by `process` after the payload has been delivered.
    pub process_status: Option<i32>,
}

impl MockEntry {
    pub fn file(name: &str, data: &[u8]) -> Self {
        let entry = Entry::file(name, data.len() as u64).with_crc32(Crc32::compute(data));
        Self {
            entry,
            data: data.to_vec(),
            header_status: None,
            process_status: None,
        }
    }

    pub fn dir(name: &str) -> Self {
        Self {
            entry: Entry::directory(name),
            data: Vec::new(),
            header_status: None,
            process_status: None,
        }
    }

    pub fn encrypted(mut self) -> Self {
        self.entry.flags |= EntryFlags::ENCRYPTED;
        self
    }

    pub fn failing(mut self, status: i32) -> Self {
        self.process_status = Some(status);
        self
    }

    pub fn broken_header(mut self, status: i32) -> Self {
        self.header_status = Some(status);
        self
    }
}

/// Shared handle accounting.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub opens: Cell<usize>,
    pub closes: Cell<usize>,
    pub decoded: Cell<usize>,
    pub modes: std::cell::RefCell<Vec<OpenMode>>,
}

impl Counters {
    /// Handles opened successfully and not yet closed.
    pub fn live(&self) -> usize {
        self.opens.get() - self.closes.get()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockDecoder {
    pub entries: Vec<MockEntry>,
    pub flags: ArchiveFlags,
    pub comment: Option<String>,
    pub open_status: Option<i32>,
    pub close_status: Option<i32>,
    pub password: Option<String>,
    pub chunk_size: usize,
    pub counters: Rc<Counters>,
}

impl MockDecoder {
    pub fn new(entries: Vec<MockEntry>) -> Self {
        Self {
            entries,
            chunk_size: 4,
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_owned());
        self
    }

    pub fn failing_open(mut self, status: i32) -> Self {
        self.open_status = Some(status);
        self
    }

    fn check_password(&self, supplied: Option<&str>) -> i32 {
        match (self.password.as_deref(), supplied) {
            (Some(_), None) => ERAR_MISSING_PASSWORD,
            (Some(expected), Some(given)) if expected != given => ERAR_BAD_PASSWORD,
            _ => ERAR_SUCCESS,
        }
    }
}

impl Decoder for MockDecoder {
    type Handle = MockHandle;

    fn open(
        &self,
        _path: &Path,
        mode: OpenMode,
        password: Option<&str>,
        read_comment: bool,
    ) -> Result<(MockHandle, ArchiveInfo), i32> {
        if let Some(status) = self.open_status {
            return Err(status);
        }
        if self.flags.contains(ArchiveFlags::ENCRYPTED_HEADERS) {
            let status = self.check_password(password);
            if status != ERAR_SUCCESS {
                return Err(status);
            }
        }

        self.counters.opens.set(self.counters.opens.get() + 1);
        self.counters.modes.borrow_mut().push(mode);

        let mut info = ArchiveInfo::new(self.flags);
        if read_comment {
            info.comment = self.comment.clone();
        }
        let handle = MockHandle {
            decoder: self.clone(),
            password: password.map(str::to_owned),
            cursor: 0,
            open: true,
        };
        Ok((handle, info))
    }
}

#[derive(Debug)]
pub(crate) struct MockHandle {
    decoder: MockDecoder,
    password: Option<String>,
    cursor: usize,
    open: bool,
}

impl MockHandle {
    fn current(&self) -> Option<&MockEntry> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.decoder.entries.get(i))
    }
}

impl DecoderHandle for MockHandle {
    fn read_header(&mut self) -> Result<Entry, i32> {
        assert!(self.open, "read_header on closed handle");
        let Some(next) = self.decoder.entries.get(self.cursor) else {
            return Err(ERAR_END_ARCHIVE);
        };
        self.cursor += 1;
        match next.header_status {
            Some(status) => Err(status),
            None => Ok(next.entry.clone()),
        }
    }

    fn process(&mut self, op: Operation, mut sink: Option<DataSink<'_>>) -> i32 {
        assert!(self.open, "process on closed handle");
        let Some(current) = self.current().cloned() else {
            return ERAR_UNKNOWN;
        };
        if op == Operation::Skip {
            return ERAR_SUCCESS;
        }

        if current.entry.is_encrypted() {
            let status = self.decoder.check_password(self.password.as_deref());
            if status != ERAR_SUCCESS {
                return status;
            }
        }

        self.decoder
            .counters
            .decoded
            .set(self.decoder.counters.decoded.get() + 1);
        if let Some(sink) = sink.as_mut() {
            for chunk in current.data.chunks(self.decoder.chunk_size.max(1)) {
                if !sink(chunk) {
                    return ERAR_UNKNOWN;
                }
            }
        }
        current.process_status.unwrap_or(ERAR_SUCCESS)
    }

    fn close(&mut self) -> i32 {
        if !self.open {
            return ERAR_SUCCESS;
        }
        self.open = false;
        let counters = &self.decoder.counters;
        counters.closes.set(counters.closes.get() + 1);
        self.decoder.close_status.unwrap_or(ERAR_SUCCESS)
    }
}
