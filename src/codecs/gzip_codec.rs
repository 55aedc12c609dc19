use crate::compression_codecs::{CompressionCodec, Filter, Format, Sink, Stage};
use crate::{Result, WriterError, MAX_LEVEL};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io;

pub struct GzipCodec {
    level: u32,
}

impl GzipCodec {
    pub fn new(level: u32) -> Result<Self> {
        if level > MAX_LEVEL {
            return Err(WriterError::InvalidCompressionLevel(level));
        }
        Ok(Self { level })
    }
}

impl CompressionCodec for GzipCodec {
    fn format(&self) -> Format {
        Format::Gzip
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn attach<'a>(&self, sink: Sink<'a>) -> Result<Stage<'a>> {
        Ok(Box::new(GzEncoder::new(sink, Compression::new(self.level))))
    }
}

impl<'a> Filter<'a> for GzEncoder<Sink<'a>> {
    fn finish(self: Box<Self>) -> io::Result<Sink<'a>> {
        GzEncoder::finish(*self)
    }
}
