/*
   Suffix driven compressed file writer, in pure Rust.
   Copyright (C) 2022 Matheus Xavier <mxavier@neonimp.com>

   This program is free software: you can redistribute it and/or modify
   it under the terms of the GNU Lesser General Public License as published by
   the Free Software Foundation, either version 3 of the License, or
   (at your option) any later version.

   This program is distributed in the hope that it will be useful,
   but WITHOUT ANY WARRANTY; without even the implied warranty of
   MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
   GNU General Public License for more details.

   You should have received a copy of the GNU Lesser General Public License
   along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

//! This module contains the C interface for the library.
//! the functions are exported as C symbols and can be used from C/C++.
//! this is an inherently unsafe module, as it is interfacing with C code.

use std::ptr::null;

use libc::{c_char, c_int, c_uchar, size_t};

use crate::writer::CompressedWriter;
use crate::{Result, WriterError};

#[repr(C)]
pub struct ICompressedWriter {
    writer: Option<CompressedWriter>,
    error: Option<WriterError>,
}

impl ICompressedWriter {
    /// Record the outcome of an operation, returning 0 or the error code.
    fn record(&mut self, result: Result<()>) -> c_int {
        match result {
            Ok(()) => {
                self.error = None;
                0
            }
            // keep the cause of a failed open
            Err(WriterError::Finished) if self.writer.is_none() && self.error.is_some() => {
                self.error.as_ref().map_or(0, |e| e.error_code() as c_int)
            }
            Err(e) => {
                let code = e.error_code() as c_int;
                self.error = Some(e);
                code
            }
        }
    }
}

fn open(path: &[u8]) -> Result<CompressedWriter> {
    let path = std::str::from_utf8(path)?;
    CompressedWriter::new(path)
}

/// Opens a compressed writer for the UTF-8 path passed in from C.
/// The codec is chosen from the path suffix with the default configuration.
/// A handle is always returned, even on failure; the C code must check it
/// with `cw_get_error` and release it with `cw_close`.
/// Returns null only when `path` is null.
#[no_mangle]
pub unsafe extern "C" fn cw_open(path: *const c_uchar, path_len: size_t) -> *mut ICompressedWriter {
    if path.is_null() {
        return std::ptr::null_mut();
    }
    let path = std::slice::from_raw_parts(path, path_len);
    let handle = match open(path) {
        Ok(writer) => Box::new(ICompressedWriter {
            writer: Some(writer),
            error: None,
        }),
        Err(e) => Box::new(ICompressedWriter {
            writer: None,
            error: Some(e),
        }),
    };
    Box::into_raw(handle)
}

/// Writes `buf_len` bytes from `buf`.
/// Returns 0 on success, otherwise the error code; the error stays
/// available through `cw_get_error`.
#[no_mangle]
pub unsafe extern "C" fn cw_write(
    handle: *mut ICompressedWriter,
    buf: *const c_uchar,
    buf_len: size_t,
) -> c_int {
    let handle = if !handle.is_null() {
        &mut *handle
    } else {
        return -1;
    };
    let data: &[u8] = if buf_len == 0 {
        &[]
    } else if !buf.is_null() {
        std::slice::from_raw_parts(buf, buf_len)
    } else {
        return -1;
    };

    let result = match handle.writer.as_mut() {
        Some(writer) => writer.write(data),
        None => Err(WriterError::Finished),
    };
    handle.record(result)
}

/// Terminates the stream and closes the file, reporting any failure.
/// The handle must still be released with `cw_close`.
#[no_mangle]
pub unsafe extern "C" fn cw_finish(handle: *mut ICompressedWriter) -> c_int {
    let handle = if !handle.is_null() {
        &mut *handle
    } else {
        return -1;
    };
    let result = match handle.writer.take() {
        Some(writer) => writer.finish(),
        None => Err(WriterError::Finished),
    };
    handle.record(result)
}

/// Releases the handle. An unfinished writer is finished first.
#[no_mangle]
pub unsafe extern "C" fn cw_close(handle: *mut ICompressedWriter) {
    let handle = if !handle.is_null() {
        Box::from_raw(handle)
    } else {
        return;
    };

    // Drop the writer
    drop(handle);
}

#[no_mangle]
#[inline]
pub unsafe extern "C" fn cw_get_error(handle: *const ICompressedWriter) -> *const WriterError {
    let handle = if !handle.is_null() {
        &*handle
    } else {
        return null();
    };

    if let Some(error) = &handle.error {
        error
    } else {
        null()
    }
}

#[no_mangle]
#[inline]
pub unsafe extern "C" fn cw_error_code(error: *const WriterError) -> u32 {
    if error.is_null() {
        return 0;
    }
    (*error).error_code()
}

/// Gets the error message from a WriterError.
/// The error message is copied to the buffer passed in from C, without a
/// terminating NUL.
///
/// If the buffer is not large enough, nothing is copied and the function
/// returns the required size.
///
/// If the message is successfully copied, the function returns the size of the message.
///
/// On error the function returns usize::MAX.
#[no_mangle]
#[inline]
pub unsafe extern "C" fn cw_error_get_message(
    error: *const WriterError,
    out_buf: *mut c_char,
    out_max: size_t,
) -> size_t {
    let error = if !error.is_null() {
        &*error
    } else {
        return !0;
    };
    let error_str = error.to_string();
    let error = error_str.as_bytes();
    if out_buf.is_null() {
        return !0;
    }

    if error.len() > out_max {
        return error.len();
    }

    let out_buf = std::slice::from_raw_parts_mut(out_buf, out_max);
    for (i, b) in error.iter().enumerate() {
        out_buf[i] = *b as c_char;
    }

    error.len()
}
