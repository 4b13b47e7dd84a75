//! Raw declarations for the UnRAR DLL interface.
//!
//! Layouts follow `dll.hpp`. The library itself is built and linked by the
//! `unrar_sys` crate; trailing reserved words are always zeroed so newer
//! library versions see their extension fields as unset.

#![allow(non_snake_case)]

use std::os::raw::{c_char, c_int, c_uint, c_void};
use widestring::WideChar;

pub type Handle = *mut c_void;
pub type LParam = isize;
pub type Callback = extern "system" fn(msg: c_uint, user_data: LParam, p1: LParam, p2: LParam) -> c_int;

pub const RAR_OM_LIST: c_uint = 0;
pub const RAR_OM_EXTRACT: c_uint = 1;
pub const RAR_OM_LIST_INCSPLIT: c_uint = 2;

pub const RAR_SKIP: c_int = 0;
pub const RAR_TEST: c_int = 1;

pub const RAR_VOL_ASK: LParam = 0;
pub const RAR_VOL_NOTIFY: LParam = 1;

pub const UCM_CHANGEVOLUME: c_uint = 0;
pub const UCM_PROCESSDATA: c_uint = 1;
pub const UCM_NEEDPASSWORD: c_uint = 2;
pub const UCM_CHANGEVOLUMEW: c_uint = 3;
pub const UCM_NEEDPASSWORDW: c_uint = 4;

/// Comment buffer capacity in characters.
pub const COMMENT_BUFFER_LEN: usize = 64 * 1024;

#[repr(C)]
pub struct RAROpenArchiveDataEx {
    pub ArcName: *const c_char,
    pub ArcNameW: *const WideChar,
    pub OpenMode: c_uint,
    pub OpenResult: c_uint,
    pub CmtBuf: *mut c_char,
    pub CmtBufSize: c_uint,
    pub CmtSize: c_uint,
    pub CmtState: c_uint,
    pub Flags: c_uint,
    pub Callback: Option<Callback>,
    pub UserData: LParam,
    pub OpFlags: c_uint,
    pub CmtBufW: *mut WideChar,
    pub Reserved: [c_uint; 25],
}

impl RAROpenArchiveDataEx {
    pub fn new(path: *const WideChar, mode: c_uint) -> Self {
        Self {
            ArcName: std::ptr::null(),
            ArcNameW: path,
            OpenMode: mode,
            OpenResult: 0,
            CmtBuf: std::ptr::null_mut(),
            CmtBufSize: 0,
            CmtSize: 0,
            CmtState: 0,
            Flags: 0,
            Callback: None,
            UserData: 0,
            OpFlags: 0,
            CmtBufW: std::ptr::null_mut(),
            Reserved: [0; 25],
        }
    }
}

#[repr(C)]
pub struct RARHeaderDataEx {
    pub ArcName: [c_char; 1024],
    pub ArcNameW: [WideChar; 1024],
    pub FileName: [c_char; 1024],
    pub FileNameW: [WideChar; 1024],
    pub Flags: c_uint,
    pub PackSize: c_uint,
    pub PackSizeHigh: c_uint,
    pub UnpSize: c_uint,
    pub UnpSizeHigh: c_uint,
    pub HostOS: c_uint,
    pub FileCRC: c_uint,
    pub FileTime: c_uint,
    pub UnpVer: c_uint,
    pub Method: c_uint,
    pub FileAttr: c_uint,
    pub CmtBuf: *mut c_char,
    pub CmtBufSize: c_uint,
    pub CmtSize: c_uint,
    pub CmtState: c_uint,
    pub DictSize: c_uint,
    pub HashType: c_uint,
    pub Hash: [c_char; 32],
    pub RedirType: c_uint,
    pub RedirName: *mut WideChar,
    pub RedirNameSize: c_uint,
    pub DirTarget: c_uint,
    pub MtimeLow: c_uint,
    pub MtimeHigh: c_uint,
    pub CtimeLow: c_uint,
    pub CtimeHigh: c_uint,
    pub AtimeLow: c_uint,
    pub AtimeHigh: c_uint,
    pub Reserved: [c_uint; 988],
}

impl RARHeaderDataEx {
    /// A zeroed header block, boxed since it is several kilobytes.
    pub fn boxed() -> Box<Self> {
        // SAFETY: every field is an integer, an array of integers or a raw
        // pointer, for all of which the all-zero bit pattern is valid.
        Box::new(unsafe { std::mem::zeroed() })
    }
}

unsafe extern "system" {
    pub fn RAROpenArchiveEx(data: *mut RAROpenArchiveDataEx) -> Handle;
    pub fn RARCloseArchive(handle: Handle) -> c_int;
    pub fn RARReadHeaderEx(handle: Handle, header: *mut RARHeaderDataEx) -> c_int;
    pub fn RARProcessFileW(
        handle: Handle,
        operation: c_int,
        dest_path: *const WideChar,
        dest_name: *const WideChar,
    ) -> c_int;
    pub fn RARSetCallback(handle: Handle, callback: Option<Callback>, user_data: LParam);
}
