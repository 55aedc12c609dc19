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

//! Maps destination suffixes to the codec that should sit in front of the file.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use crate::codecs::gzip_codec::GzipCodec;
#[cfg(feature = "xz_codec")]
use crate::codecs::xz_codec::XzCodec;
use crate::compression_codecs::{CompressionCodec, Format, NoCompressionCodec};
use crate::config::{Unavailable, WriterConfig};
use crate::{Result, WriterError, MAX_LEVEL};

pub struct CodecRegistry {
    codecs: BTreeMap<Format, Box<dyn CompressionCodec>>,
    unavailable: Unavailable,
}

/// Build the codec for `format` at `level`, `None` when it is not compiled in.
fn make_codec(format: Format, level: u32) -> Result<Option<Box<dyn CompressionCodec>>> {
    let codec: Box<dyn CompressionCodec> = match format {
        Format::Plain => Box::new(NoCompressionCodec),
        Format::Gzip => Box::new(GzipCodec::new(level)?),
        #[cfg(feature = "xz_codec")]
        Format::Xz => Box::new(XzCodec::new(level)?),
        #[cfg(not(feature = "xz_codec"))]
        Format::Xz => return Ok(None),
    };
    Ok(Some(codec))
}

impl CodecRegistry {
    /// Register every codec that is both compiled in and enabled in `config`.
    pub fn from_config(config: &WriterConfig) -> Result<Self> {
        if config.level > MAX_LEVEL {
            return Err(WriterError::InvalidCompressionLevel(config.level));
        }
        let mut codecs = BTreeMap::new();
        for format in config.codecs.iter() {
            if let Some(codec) = make_codec(format, config.level)? {
                codecs.insert(format, codec);
            }
        }
        Ok(CodecRegistry {
            codecs,
            unavailable: config.unavailable,
        })
    }

    /// Pick the codec for a destination.
    ///
    /// Unrecognised suffixes get the passthrough codec. A recognised suffix whose
    /// codec is missing is handled according to the [`Unavailable`] policy.
    pub fn select<P: AsRef<Path>>(&self, path: P) -> Result<&dyn CompressionCodec> {
        let wanted = Format::from_suffix(&path);
        if wanted == Format::Plain {
            return Ok(&NoCompressionCodec);
        }
        match self.codecs.get(&wanted) {
            Some(codec) => Ok(codec.as_ref()),
            None => match self.unavailable {
                Unavailable::Reject => Err(WriterError::CodecUnavailable(wanted)),
                Unavailable::Passthrough => {
                    warn!(
                        path = %path.as_ref().display(),
                        format = %wanted,
                        "codec not available, writing uncompressed output"
                    );
                    Ok(&NoCompressionCodec)
                }
            },
        }
    }
}
