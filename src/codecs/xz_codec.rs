use crate::compression_codecs::{CompressionCodec, Filter, Format, Sink, Stage};
use crate::{Result, WriterError, MAX_LEVEL};
use std::io;
use xz2::write::XzEncoder;

/// LZMA2 in an `.xz` container.
pub struct XzCodec {
    level: u32,
}

impl XzCodec {
    pub fn new(level: u32) -> Result<Self> {
        if level > MAX_LEVEL {
            return Err(WriterError::InvalidCompressionLevel(level));
        }
        Ok(Self { level })
    }
}

impl CompressionCodec for XzCodec {
    fn format(&self) -> Format {
        Format::Xz
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn attach<'a>(&self, sink: Sink<'a>) -> Result<Stage<'a>> {
        Ok(Box::new(XzEncoder::new(sink, self.level)))
    }
}

impl<'a> Filter<'a> for XzEncoder<Sink<'a>> {
    fn finish(self: Box<Self>) -> io::Result<Sink<'a>> {
        XzEncoder::finish(*self)
    }
}
