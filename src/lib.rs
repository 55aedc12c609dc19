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

//! Output files that compress themselves according to their name.
//!
//! A [`CompressedWriter`] looks at the last three characters of the destination
//! path once, when it is created: `.gz` gets a gzip filter, `.xz` gets an xz filter
//! (when the `xz_codec` feature is built and the codec is enabled in the
//! [`WriterConfig`]), anything else is written as is.

use std::io;
use std::path::PathBuf;
use std::str::Utf8Error;
use thiserror::Error;

pub mod compression_codecs;
pub mod config;
pub mod registry;
pub mod writer;

pub mod codecs {
    pub mod gzip_codec;
    #[cfg(feature = "xz_codec")]
    pub mod xz_codec;
}

#[cfg(feature = "ffi")]
pub mod ffi;

pub use compression_codecs::Format;
pub use config::{CodecSet, Unavailable, WriterConfig};
pub use writer::CompressedWriter;

/// Highest compression level accepted by every codec, also the default.
pub const MAX_LEVEL: u32 = 9;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("Destination path is empty")]
    EmptyPath,
    #[error("Destination path is not valid UTF-8: {0}")]
    InvalidPath(#[from] Utf8Error),
    #[error("Cannot open {path:?} for writing: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("Codec {0} is not available in this configuration")]
    CodecUnavailable(Format),
    #[error("Invalid compression level: {0}")]
    InvalidCompressionLevel(u32),
    #[error("Write failed: {0}")]
    Write(#[source] io::Error),
    #[error("Finalizing the output failed: {0}")]
    Finish(#[source] io::Error),
    #[error("Writer was already finished")]
    Finished,
}

impl WriterError {
    /// Stable numeric code for the error kind, used across the C interface.
    pub fn error_code(&self) -> u32 {
        match self {
            WriterError::EmptyPath => 0x01,
            WriterError::InvalidPath(_) => 0x02,
            WriterError::Open { .. } => 0x03,
            WriterError::CodecUnavailable(_) => 0x04,
            WriterError::InvalidCompressionLevel(_) => 0x05,
            WriterError::Write(_) => 0x06,
            WriterError::Finish(_) => 0x07,
            WriterError::Finished => 0x08,
        }
    }
}

impl PartialEq for WriterError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (WriterError::EmptyPath, WriterError::EmptyPath) => true,
            (WriterError::InvalidPath(a), WriterError::InvalidPath(b)) => a == b,
            (
                WriterError::Open { path: a, source: x },
                WriterError::Open { path: b, source: y },
            ) => a == b && x.kind() == y.kind(),
            (WriterError::CodecUnavailable(a), WriterError::CodecUnavailable(b)) => a == b,
            (WriterError::InvalidCompressionLevel(a), WriterError::InvalidCompressionLevel(b)) => {
                a == b
            }
            (WriterError::Write(a), WriterError::Write(b)) => a.kind() == b.kind(),
            (WriterError::Finish(a), WriterError::Finish(b)) => a.kind() == b.kind(),
            (WriterError::Finished, WriterError::Finished) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, WriterError>;
