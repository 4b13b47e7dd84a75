//! UnRAR-backed implementation of the decoder capability.
//!
//! Payloads are never written to disk by the library: extraction runs the
//! decoder in test mode and collects the decoded bytes from its
//! `UCM_PROCESSDATA` callback.

mod ffi;

use crate::decoder::{DataSink, Decoder, DecoderHandle, OpenMode, Operation};
use oxirar_core::entry::{dos_time_to_system, filetime_to_system, normalize_name};
use oxirar_core::status::{ERAR_EOPEN, ERAR_SMALL_BUF, ERAR_SUCCESS};
use oxirar_core::{ArchiveFlags, ArchiveInfo, Entry, EntryFlags, HostOs, PackingMethod};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use tracing::debug;
use widestring::{WideCStr, WideCString, WideChar};

// Pull in the compiled UnRAR library.
use unrar_sys as _;

/// Decoder backed by the UnRAR library.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDecoder;

impl Decoder for NativeDecoder {
    type Handle = NativeHandle;

    fn open(
        &self,
        path: &Path,
        mode: OpenMode,
        password: Option<&str>,
        read_comment: bool,
    ) -> Result<(NativeHandle, ArchiveInfo), i32> {
        let wide_path = WideCString::from_os_str(path).map_err(|_| ERAR_EOPEN)?;
        let mut state = Box::new(CallbackState {
            password: match password {
                Some(pw) => Some(WideCString::from_str(pw).map_err(|_| ERAR_EOPEN)?),
                None => None,
            },
            sink: std::ptr::null_mut(),
        });
        let user_data = &mut *state as *mut CallbackState as ffi::LParam;

        let raw_mode = match mode {
            OpenMode::List => ffi::RAR_OM_LIST,
            OpenMode::ListSplit => ffi::RAR_OM_LIST_INCSPLIT,
            OpenMode::Extract => ffi::RAR_OM_EXTRACT,
        };
        let mut data = ffi::RAROpenArchiveDataEx::new(wide_path.as_ptr(), raw_mode);
        data.Callback = Some(unrar_callback);
        data.UserData = user_data;

        let mut comment_w: Vec<WideChar> = Vec::new();
        let mut comment_n: Vec<c_char> = Vec::new();
        if read_comment {
            comment_w.resize(ffi::COMMENT_BUFFER_LEN, 0);
            comment_n.resize(ffi::COMMENT_BUFFER_LEN, 0);
            data.CmtBufW = comment_w.as_mut_ptr();
            data.CmtBuf = comment_n.as_mut_ptr();
            data.CmtBufSize = ffi::COMMENT_BUFFER_LEN as c_uint;
        }

        // SAFETY: `data` and the buffers it points into outlive the call.
        let raw = unsafe { ffi::RAROpenArchiveEx(&mut data) };
        let result = data.OpenResult as i32;
        if raw.is_null() || result != ERAR_SUCCESS {
            if !raw.is_null() {
                // SAFETY: `raw` was returned by RAROpenArchiveEx and is closed once.
                unsafe { ffi::RARCloseArchive(raw) };
            }
            debug!(path = %path.display(), status = result, "UnRAR open failed");
            return Err(if result == ERAR_SUCCESS { ERAR_EOPEN } else { result });
        }

        let mut handle = NativeHandle {
            raw,
            state,
            header: ffi::RARHeaderDataEx::boxed(),
        };

        // The password is only ever handed over as a wide string through
        // `UCM_NEEDPASSWORDW`; the narrow setter would pass it through the C
        // locale and mangle anything outside ASCII.
        // SAFETY: `raw` is open and `state` is boxed, so its address is
        // stable for the lifetime of the handle.
        unsafe { ffi::RARSetCallback(raw, Some(unrar_callback), user_data) };

        let mut info = ArchiveInfo::new(ArchiveFlags::from_bits_truncate(data.Flags));
        if read_comment {
            match data.CmtState as i32 {
                0 => {}
                1 => info.comment = Some(decode_comment(&comment_w, &comment_n, data.CmtSize)),
                ERAR_SMALL_BUF => {
                    handle.close();
                    return Err(ERAR_SMALL_BUF);
                }
                failure => {
                    handle.close();
                    return Err(failure);
                }
            }
        }

        Ok((handle, info))
    }
}

/// An open UnRAR archive.
///
/// Holds raw pointers and is therefore neither `Send` nor `Sync`.
pub struct NativeHandle {
    raw: ffi::Handle,
    state: Box<CallbackState>,
    header: Box<ffi::RARHeaderDataEx>,
}

impl DecoderHandle for NativeHandle {
    fn read_header(&mut self) -> Result<Entry, i32> {
        if self.raw.is_null() {
            return Err(ERAR_EOPEN);
        }
        // SAFETY: the handle is open and the header block is owned by us.
        let status = unsafe { ffi::RARReadHeaderEx(self.raw, &mut *self.header) };
        if status != ERAR_SUCCESS {
            return Err(status);
        }
        Ok(convert_header(&self.header))
    }

    fn process(&mut self, op: Operation, sink: Option<DataSink<'_>>) -> i32 {
        if self.raw.is_null() {
            return ERAR_EOPEN;
        }
        let operation = match op {
            Operation::Skip => ffi::RAR_SKIP,
            Operation::Test => ffi::RAR_TEST,
        };

        let mut sink = sink;
        if let Some(sink) = sink.as_mut() {
            self.state.sink = sink as *mut DataSink<'_> as *mut c_void;
        }
        // SAFETY: the handle is open; `sink` lives on this stack frame until
        // the call returns and is detached right after.
        let status = unsafe {
            ffi::RARProcessFileW(self.raw, operation, std::ptr::null(), std::ptr::null())
        };
        self.state.sink = std::ptr::null_mut();
        status
    }

    fn close(&mut self) -> i32 {
        if self.raw.is_null() {
            return ERAR_SUCCESS;
        }
        let raw = std::mem::replace(&mut self.raw, std::ptr::null_mut());
        // SAFETY: `raw` is open and is nulled above so it is closed only once.
        unsafe { ffi::RARCloseArchive(raw) }
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// State reachable from the UnRAR callback through `UserData`.
struct CallbackState {
    password: Option<WideCString>,
    /// Points at a `DataSink` while a `process` call is running.
    sink: *mut c_void,
}

extern "system" fn unrar_callback(
    msg: c_uint,
    user_data: ffi::LParam,
    p1: ffi::LParam,
    p2: ffi::LParam,
) -> c_int {
    if user_data == 0 {
        return -1;
    }
    // SAFETY: `user_data` is the boxed `CallbackState` of a live handle.
    let state = unsafe { &mut *(user_data as *mut CallbackState) };

    match msg {
        ffi::UCM_PROCESSDATA => {
            if state.sink.is_null() {
                return 1;
            }
            // SAFETY: the decoder passes a buffer of `p2` bytes at `p1`; `sink`
            // points at the `DataSink` installed by `process`.
            let (chunk, sink) = unsafe {
                (
                    std::slice::from_raw_parts(p1 as *const u8, p2 as usize),
                    &mut *(state.sink as *mut DataSink<'_>),
                )
            };
            match catch_unwind(AssertUnwindSafe(|| sink(chunk))) {
                Ok(true) => 1,
                _ => -1,
            }
        }
        ffi::UCM_NEEDPASSWORDW => match &state.password {
            Some(pw) => {
                // SAFETY: the decoder passes a buffer of `p2` wide characters.
                let buf = unsafe { std::slice::from_raw_parts_mut(p1 as *mut WideChar, p2 as usize) };
                copy_terminated(pw.as_slice(), buf)
            }
            None => -1,
        },
        ffi::UCM_NEEDPASSWORD => match &state.password {
            Some(pw) => {
                let narrow: Vec<u8> = pw.to_string_lossy().into_bytes();
                // SAFETY: the decoder passes a buffer of `p2` bytes.
                let buf = unsafe { std::slice::from_raw_parts_mut(p1 as *mut u8, p2 as usize) };
                copy_terminated(&narrow, buf)
            }
            None => -1,
        },
        ffi::UCM_CHANGEVOLUME | ffi::UCM_CHANGEVOLUMEW => {
            if p2 == ffi::RAR_VOL_ASK {
                -1
            } else {
                1
            }
        }
        _ => 0,
    }
}

/// Copy `src` into `dst` with a terminating zero, truncating if needed.
fn copy_terminated<T: Copy + Default>(src: &[T], dst: &mut [T]) -> c_int {
    let Some(room) = dst.len().checked_sub(1) else {
        return -1;
    };
    let n = src.len().min(room);
    dst[..n].copy_from_slice(&src[..n]);
    dst[n] = T::default();
    1
}

fn convert_header(h: &ffi::RARHeaderDataEx) -> Entry {
    let name = match WideCStr::from_slice_truncate(&h.FileNameW) {
        Ok(wide) if !wide.is_empty() => wide.to_string_lossy(),
        _ => narrow_string(&h.FileName),
    };

    let mtime = (u64::from(h.MtimeHigh) << 32) | u64::from(h.MtimeLow);
    let modified = filetime_to_system(mtime).or_else(|| dos_time_to_system(h.FileTime));

    Entry {
        name: normalize_name(&name),
        size: (u64::from(h.UnpSizeHigh) << 32) | u64::from(h.UnpSize),
        compressed_size: (u64::from(h.PackSizeHigh) << 32) | u64::from(h.PackSize),
        modified,
        crc32: h.FileCRC,
        dictionary_size: u64::from(h.DictSize) * 1024,
        flags: EntryFlags::from_bits_truncate(h.Flags),
        method: PackingMethod::from_raw(h.Method),
        host_os: HostOs::from_raw(h.HostOS),
        attributes: h.FileAttr,
        unpack_version: h.UnpVer,
        header_offset: None,
    }
}

fn narrow_string(buf: &[c_char]) -> String {
    // SAFETY: `c_char` and `u8` have the same size and alignment.
    let bytes = unsafe { std::slice::from_raw_parts(buf.as_ptr() as *const u8, buf.len()) };
    match CStr::from_bytes_until_nul(bytes) {
        Ok(s) => s.to_string_lossy().into_owned(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn decode_comment(wide: &[WideChar], narrow: &[c_char], size: c_uint) -> String {
    let len = (size as usize).min(wide.len());
    match WideCStr::from_slice_truncate(&wide[..len]) {
        Ok(text) if !text.is_empty() => text.to_string_lossy(),
        _ => narrow_string(&narrow[..len.min(narrow.len())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback_state(password: Option<&str>) -> Box<CallbackState> {
        Box::new(CallbackState {
            password: password.map(|pw| WideCString::from_str(pw).unwrap()),
            sink: std::ptr::null_mut(),
        })
    }

    #[test]
    fn test_callback_refuses_to_ask_for_volume() {
        let mut state = callback_state(None);
        let user_data = &mut *state as *mut CallbackState as ffi::LParam;
        let mut name = [0 as WideChar; 16];
        let p1 = name.as_mut_ptr() as ffi::LParam;

        let asked = unrar_callback(ffi::UCM_CHANGEVOLUMEW, user_data, p1, ffi::RAR_VOL_ASK);
        assert_eq!(asked, -1);
        let notified = unrar_callback(ffi::UCM_CHANGEVOLUMEW, user_data, p1, ffi::RAR_VOL_NOTIFY);
        assert_eq!(notified, 1);
        assert_eq!(unrar_callback(ffi::UCM_CHANGEVOLUME, user_data, p1, ffi::RAR_VOL_ASK), -1);
        assert_eq!(unrar_callback(ffi::UCM_CHANGEVOLUMEW, 0, p1, ffi::RAR_VOL_NOTIFY), -1);
    }

    #[test]
    fn test_callback_supplies_wide_password() {
        let password = "pässwörd-密码";
        let mut state = callback_state(Some(password));
        let user_data = &mut *state as *mut CallbackState as ffi::LParam;
        let mut buf = [0 as WideChar; 64];

        let status = unrar_callback(
            ffi::UCM_NEEDPASSWORDW,
            user_data,
            buf.as_mut_ptr() as ffi::LParam,
            buf.len() as ffi::LParam,
        );
        assert_eq!(status, 1);
        let answered = WideCStr::from_slice_truncate(&buf).unwrap();
        assert_eq!(answered.to_string_lossy(), password);
    }

    #[test]
    fn test_callback_without_password_declines() {
        let mut state = callback_state(None);
        let user_data = &mut *state as *mut CallbackState as ffi::LParam;
        let mut buf = [7 as WideChar; 8];

        let status = unrar_callback(
            ffi::UCM_NEEDPASSWORDW,
            user_data,
            buf.as_mut_ptr() as ffi::LParam,
            buf.len() as ffi::LParam,
        );
        assert_eq!(status, -1);
        assert_eq!(buf, [7 as WideChar; 8]);
    }

    #[test]
    fn test_copy_terminated() {
        let mut buf = [9u16; 4];
        assert_eq!(copy_terminated(&[1u16, 2], &mut buf), 1);
        assert_eq!(buf, [1, 2, 0, 9]);

        let mut small = [9u16; 2];
        copy_terminated(&[1u16, 2, 3], &mut small);
        assert_eq!(small, [1, 0]);

        let mut empty: [u16; 0] = [];
        assert_eq!(copy_terminated(&[1u16], &mut empty), -1);
    }

    #[test]
    fn test_convert_header() {
        let mut h = ffi::RARHeaderDataEx::boxed();
        for (dst, src) in h.FileNameW.iter_mut().zip("dir\\file.txt".chars()) {
            *dst = src as WideChar;
        }
        h.UnpSize = 10;
        h.UnpSizeHigh = 1;
        h.PackSize = 7;
        h.Flags = 0x04 | 0x20;
        h.Method = 0x33;
        h.HostOS = 3;
        h.DictSize = 4096;
        h.FileTime = (((44u32 << 9) | (1 << 5) | 1) << 16) | (12 << 11);

        let entry = convert_header(&h);
        assert_eq!(entry.name, "dir/file.txt");
        assert_eq!(entry.size, (1u64 << 32) + 10);
        assert_eq!(entry.compressed_size, 7);
        assert!(entry.is_encrypted());
        assert!(entry.is_dir());
        assert_eq!(entry.method, PackingMethod::Normal);
        assert_eq!(entry.host_os, HostOs::Unix);
        assert_eq!(entry.dictionary_size, 4 * 1024 * 1024);
        assert!(entry.modified.is_some());
        assert_eq!(entry.header_offset, None);
    }

    #[test]
    fn test_convert_header_narrow_fallback() {
        let mut h = ffi::RARHeaderDataEx::boxed();
        for (dst, src) in h.FileName.iter_mut().zip(b"plain.txt") {
            *dst = *src as c_char;
        }
        assert_eq!(convert_header(&h).name, "plain.txt");
    }

    #[test]
    fn test_open_missing_file() {
        let err = NativeDecoder
            .open(Path::new("/nonexistent/archive.rar"), OpenMode::List, None, false)
            .err();
        assert!(matches!(err, Some(code) if code != ERAR_SUCCESS));
    }
}
