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

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::compression_codecs::{Format, Stage};
use crate::config::WriterConfig;
use crate::registry::CodecRegistry;
use crate::{Result, WriterError};

/// A file whose contents are compressed according to its name.
///
/// The codec is chosen once, in [`CompressedWriter::new`], and cannot change
/// afterwards. The compressed stream is terminated by [`CompressedWriter::finish`],
/// or when the writer is dropped.
pub struct CompressedWriter {
    path: PathBuf,
    format: Format,
    level: u32,
    pipeline: Option<Stage<'static>>,
    bytes_in: u64,
}

impl CompressedWriter {
    /// Create (or truncate) `path` with the default configuration.
    ///
    /// The default configuration rejects a suffix whose codec is not available:
    /// without the `xz_codec` feature, `new("x.xz")` fails with
    /// [`WriterError::CodecUnavailable`] instead of writing plain bytes. Use
    /// [`Unavailable::Passthrough`](crate::config::Unavailable::Passthrough)
    /// through [`CompressedWriter::with_config`] to get plain output instead.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<CompressedWriter> {
        Self::with_config(path, &WriterConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: &WriterConfig) -> Result<CompressedWriter> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(WriterError::EmptyPath);
        }

        // Resolve the codec first so a rejected destination is left untouched.
        let registry = CodecRegistry::from_config(config)?;
        let codec = registry.select(path)?;

        let file = File::create(path).map_err(|source| WriterError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let pipeline = codec.attach(Box::new(BufWriter::new(file)))?;

        debug!(
            path = %path.display(),
            format = %codec.format(),
            level = codec.level(),
            "opened compressed writer"
        );

        Ok(CompressedWriter {
            path: path.to_path_buf(),
            format: codec.format(),
            level: codec.level(),
            pipeline: Some(pipeline),
            bytes_in: 0,
        })
    }

    /// Push `text` through the pipeline.
    pub fn write<T: AsRef<[u8]>>(&mut self, text: T) -> Result<()> {
        let data = text.as_ref();
        let pipeline = self.pipeline.as_mut().ok_or(WriterError::Finished)?;
        pipeline.write_all(data).map_err(WriterError::Write)?;
        self.bytes_in += data.len() as u64;
        Ok(())
    }

    /// Terminate the compressed stream and close the file.
    pub fn finish(mut self) -> Result<()> {
        self.finalize()
    }

    pub fn is_finished(&self) -> bool {
        self.pipeline.is_none()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Compression level of the installed codec, 0 for plain output.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Uncompressed bytes accepted so far.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    pub(crate) fn finalize(&mut self) -> Result<()> {
        let pipeline = self.pipeline.take().ok_or(WriterError::Finished)?;
        let mut sink = pipeline.finish().map_err(WriterError::Finish)?;
        sink.flush().map_err(WriterError::Finish)?;
        debug!(
            path = %self.path.display(),
            format = %self.format,
            bytes_in = self.bytes_in,
            "finished compressed writer"
        );
        Ok(())
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let pipeline = self
            .pipeline
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, WriterError::Finished))?;
        let n = pipeline.write(buf)?;
        self.bytes_in += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.pipeline.as_mut() {
            Some(pipeline) => pipeline.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for CompressedWriter {
    fn drop(&mut self) {
        if self.is_finished() {
            return;
        }
        if let Err(e) = self.finalize() {
            error!(path = %self.path.display(), error = %e, "failed to finish compressed writer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CodecSet, Unavailable};
    use flate2::read::GzDecoder;
    use proptest::prelude::*;
    use std::fs;
    use std::io::Read;
    use tempfile::tempdir;

    fn gunzip(path: &Path) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[cfg(feature = "xz_codec")]
    fn unxz(path: &Path) -> Vec<u8> {
        let mut out = Vec::new();
        xz2::read::XzDecoder::new(File::open(path).unwrap())
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_gzip_two_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("align.txt.gz");
        let mut writer = CompressedWriter::new(&path).unwrap();
        assert_eq!(writer.format(), Format::Gzip);
        assert_eq!(writer.level(), 9);
        writer.write("hello ").unwrap();
        writer.write("world").unwrap();
        writer.finish().unwrap();
        assert_eq!(gunzip(&path), b"hello world");
    }

    #[test]
    fn test_plain_is_byte_exact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("align.txt");
        let mut writer = CompressedWriter::new(&path).unwrap();
        writer.write("abc").unwrap();
        writer.finish().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"abc");
    }

    #[test]
    fn test_uppercase_suffix_is_plain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.GZ");
        let mut writer = CompressedWriter::new(&path).unwrap();
        assert_eq!(writer.format(), Format::Plain);
        writer.write("hello").unwrap();
        drop(writer);
        assert_eq!(fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn test_drop_finalizes_stream() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dropped.gz");
        {
            let mut writer = CompressedWriter::new(&path).unwrap();
            writer.write(vec![b'x'; 100_000]).unwrap();
        }
        assert_eq!(gunzip(&path), vec![b'x'; 100_000]);
    }

    #[test]
    fn test_empty_gzip_is_valid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.gz");
        let mut writer = CompressedWriter::new(&path).unwrap();
        writer.write("").unwrap();
        writer.finish().unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);
        assert!(gunzip(&path).is_empty());
    }

    #[cfg(feature = "xz_codec")]
    #[test]
    fn test_xz_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("align.txt.xz");
        let mut writer = CompressedWriter::new(&path).unwrap();
        assert_eq!(writer.format(), Format::Xz);
        writer.write(b"hello ".as_slice()).unwrap();
        writer.write(String::from("world")).unwrap();
        writer.finish().unwrap();
        assert_eq!(unxz(&path), b"hello world");
    }

    #[cfg(feature = "xz_codec")]
    #[test]
    fn test_empty_xz_is_valid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.xz");
        CompressedWriter::new(&path).unwrap().finish().unwrap();
        assert!(unxz(&path).is_empty());
    }

    #[test]
    fn test_unavailable_codec_rejected_and_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keep.xz");
        fs::write(&path, b"previous").unwrap();
        let config = WriterConfig::default().with_codecs(CodecSet::none().with(Format::Gzip));
        let err = CompressedWriter::with_config(&path, &config).err();
        assert_eq!(err, Some(WriterError::CodecUnavailable(Format::Xz)));
        assert_eq!(fs::read(&path).unwrap(), b"previous");
    }

    #[test]
    fn test_unavailable_codec_passthrough() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.xz");
        let config = WriterConfig::default()
            .with_codecs(CodecSet::none())
            .on_unavailable(Unavailable::Passthrough);
        let mut writer = CompressedWriter::with_config(&path, &config).unwrap();
        assert_eq!(writer.format(), Format::Plain);
        writer.write("abc").unwrap();
        writer.finish().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"abc");
    }

    #[test]
    fn test_open_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.gz");
        match CompressedWriter::new(&path) {
            Err(WriterError::Open { path: p, source }) => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected open failure, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_empty_path() {
        assert_eq!(CompressedWriter::new("").err(), Some(WriterError::EmptyPath));
    }

    #[test]
    fn test_io_write_impl() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fmt.txt.gz");
        let mut writer = CompressedWriter::new(&path).unwrap();
        writeln!(writer, "{}\t{}", 1, "two").unwrap();
        assert_eq!(writer.bytes_in(), 6);
        writer.finish().unwrap();
        assert_eq!(gunzip(&path), b"1\ttwo\n");
    }

    #[test]
    fn test_lower_level_still_gzip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fast.gz");
        let config = WriterConfig::default().with_level(1);
        let mut writer = CompressedWriter::with_config(&path, &config).unwrap();
        assert_eq!(writer.level(), 1);
        writer.write("quick").unwrap();
        writer.finish().unwrap();
        assert_eq!(gunzip(&path), b"quick");
    }

    #[test]
    fn test_write_after_finalize() {
        let dir = tempdir().unwrap();
        let mut writer = CompressedWriter::new(dir.path().join("twice.gz")).unwrap();
        writer.finalize().unwrap();
        assert_eq!(writer.write("late").err(), Some(WriterError::Finished));
        assert_eq!(writer.finalize().err(), Some(WriterError::Finished));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_sink_failure_on_write() {
        let mut writer = CompressedWriter::new("/dev/full").unwrap();
        assert_eq!(writer.format(), Format::Plain);
        // larger than the BufWriter capacity, so it reaches the device
        let err = writer.write(vec![0u8; 100_000]).err();
        assert_eq!(
            err,
            Some(WriterError::Write(io::Error::from(io::ErrorKind::StorageFull)))
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_sink_failure_on_finish() {
        let mut writer = CompressedWriter::new("/dev/full").unwrap();
        writer.write("abc").unwrap();
        match writer.finish() {
            Err(WriterError::Finish(e)) => assert_eq!(e.kind(), io::ErrorKind::StorageFull),
            other => panic!("expected finish failure, got {:?}", other),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_gzip_writes_concatenate(chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 0..8)) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("prop.gz");
            let mut writer = CompressedWriter::new(&path).unwrap();
            for chunk in &chunks {
                writer.write(chunk).unwrap();
            }
            writer.finish().unwrap();
            prop_assert_eq!(gunzip(&path), chunks.concat());
        }

        #[test]
        fn prop_plain_writes_concatenate(chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 0..8)) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("prop.bin");
            let mut writer = CompressedWriter::new(&path).unwrap();
            for chunk in &chunks {
                writer.write(chunk).unwrap();
            }
            writer.finish().unwrap();
            prop_assert_eq!(fs::read(&path).unwrap(), chunks.concat());
        }
    }
}
