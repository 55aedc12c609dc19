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

use crate::compression_codecs::Format;
use crate::MAX_LEVEL;

/// Set of codecs a writer may install.
///
/// [`Format::Plain`] needs no codec and is always a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecSet(u8);

impl CodecSet {
    fn bit(format: Format) -> u8 {
        1 << format.int_id()
    }

    /// Only plain output.
    pub const fn none() -> Self {
        CodecSet(0)
    }

    /// Every codec built into this library.
    pub fn compiled() -> Self {
        Format::COMPRESSED
            .into_iter()
            .filter(|format| format.is_compiled())
            .fold(Self::none(), Self::with)
    }

    pub fn with(self, format: Format) -> Self {
        CodecSet(self.0 | Self::bit(format))
    }

    pub fn without(self, format: Format) -> Self {
        CodecSet(self.0 & !Self::bit(format))
    }

    pub fn contains(&self, format: Format) -> bool {
        format == Format::Plain || self.0 & Self::bit(format) != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Format> + '_ {
        Format::COMPRESSED
            .into_iter()
            .filter(move |format| self.contains(*format))
    }
}

impl Default for CodecSet {
    fn default() -> Self {
        Self::compiled()
    }
}

/// What to do when a destination names a codec that is not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unavailable {
    /// Fail construction with [`WriterError::CodecUnavailable`](crate::WriterError::CodecUnavailable).
    #[default]
    Reject,
    /// Write plain bytes under the compressed name.
    Passthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    pub codecs: CodecSet,
    /// Compression level, 0 to [`MAX_LEVEL`].
    pub level: u32,
    pub unavailable: Unavailable,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            codecs: CodecSet::compiled(),
            level: MAX_LEVEL,
            unavailable: Unavailable::default(),
        }
    }
}

impl WriterConfig {
    pub fn with_codecs(mut self, codecs: CodecSet) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn on_unavailable(mut self, policy: Unavailable) -> Self {
        self.unavailable = policy;
        self
    }
}
