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

use crate::{Result, WriterError};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;

/// Terminal byte sink of a pipeline.
pub type Sink<'a> = Box<dyn Write + Send + 'a>;

/// A filter installed ahead of a sink.
pub type Stage<'a> = Box<dyn Filter<'a> + 'a>;

/// Output byte format of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    /// Bytes reach the sink untouched.
    Plain,
    Gzip,
    Xz,
}

impl Format {
    /// Formats that are selected by a suffix.
    pub const COMPRESSED: [Format; 2] = [Format::Gzip, Format::Xz];

    /// Number of trailing characters inspected when classifying a path.
    pub const SUFFIX_LEN: usize = 3;

    pub fn int_id(self) -> u16 {
        match self {
            Format::Plain => 0,
            Format::Gzip => 1,
            Format::Xz => 2,
        }
    }

    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Format::Plain => None,
            Format::Gzip => Some(".gz"),
            Format::Xz => Some(".xz"),
        }
    }

    /// Whether a codec for this format was built into the library.
    pub fn is_compiled(self) -> bool {
        match self {
            Format::Plain | Format::Gzip => true,
            Format::Xz => cfg!(feature = "xz_codec"),
        }
    }

    /// Classify a destination by its last three characters.
    ///
    /// Matching is exact and case sensitive, `out.GZ` is [`Format::Plain`].
    /// Nothing on disk is touched. A path that is exactly a suffix, such as
    /// `.gz`, is classified too; only shorter paths are always plain.
    pub fn from_suffix<P: AsRef<Path>>(path: P) -> Format {
        let name = path.as_ref().to_string_lossy();
        if name.len() < Self::SUFFIX_LEN {
            return Format::Plain;
        }
        Self::COMPRESSED
            .into_iter()
            .find(|format| format.suffix().is_some_and(|suffix| name.ends_with(suffix)))
            .unwrap_or(Format::Plain)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Plain => write!(f, "plain"),
            Format::Gzip => write!(f, "gzip"),
            Format::Xz => write!(f, "xz"),
        }
    }
}

/// A pipeline stage: bytes written to it end up, possibly transformed, in its sink.
pub trait Filter<'a>: Write + Send {
    /// Terminate the stream (writing any trailer) and hand back the sink.
    fn finish(self: Box<Self>) -> io::Result<Sink<'a>>;
}

/// Trait for valid compression codecs.
/// A codec installs itself as a filter in front of a sink.
pub trait CompressionCodec: Sync + Send {
    fn format(&self) -> Format;

    fn level(&self) -> u32;

    /// Build a filter stage that compresses into `sink`.
    fn attach<'a>(&self, sink: Sink<'a>) -> Result<Stage<'a>>;

    fn compress_to_writer(&self, data: &[u8], writer: &mut (dyn Write + Send)) -> Result<()> {
        let mut stage = self.attach(Box::new(writer))?;
        stage.write_all(data).map_err(WriterError::Write)?;
        stage
            .finish()
            .map_err(WriterError::Finish)?
            .flush()
            .map_err(WriterError::Finish)
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.compress_to_writer(data, &mut out)?;
        Ok(out)
    }
}

/// No compression codec.
/// Just passes the data through.
pub struct NoCompressionCodec;

impl CompressionCodec for NoCompressionCodec {
    fn format(&self) -> Format {
        Format::Plain
    }

    fn level(&self) -> u32 {
        0
    }

    fn attach<'a>(&self, sink: Sink<'a>) -> Result<Stage<'a>> {
        Ok(Box::new(Passthrough(sink)))
    }
}

pub struct Passthrough<'a>(Sink<'a>);

impl Write for Passthrough<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<'a> Filter<'a> for Passthrough<'a> {
    fn finish(self: Box<Self>) -> io::Result<Sink<'a>> {
        Ok(self.0)
    }
}
