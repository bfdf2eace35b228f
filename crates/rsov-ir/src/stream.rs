//! Word streams: the raw reader/writer under the module codec.

use crate::error::IrError;
use crate::inst::Word;

/// The SPIR-V magic number.
pub const MAGIC: Word = 0x0723_0203;

/// Number of words in the module header.
pub const HEADER_WORDS: usize = 5;

/// Largest header bound accepted on decode, the SPIR-V universal id limit.
pub const MAX_ID_BOUND: u32 = 0x3f_ffff;

/// Largest word count of a single instruction record.
pub const MAX_RECORD_WORDS: usize = 0xffff;

/// Converts a byte buffer into words, detecting endianness from the magic number.
pub fn words_from_bytes(bytes: &[u8]) -> Result<Vec<Word>, IrError> {
    if bytes.len() % 4 != 0 {
        return Err(IrError::Unaligned(bytes.len()));
    }
    let big_endian = bytes.len() >= 4
        && u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) == MAGIC;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| {
            let b = [c[0], c[1], c[2], c[3]];
            if big_endian {
                u32::from_be_bytes(b)
            } else {
                u32::from_le_bytes(b)
            }
        })
        .collect())
}

/// Serializes words as little-endian bytes.
pub fn words_to_bytes(words: &[Word]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// A cursor over a slice of words.
#[derive(Debug)]
pub struct WordReader<'a> {
    words: &'a [Word],
    pos: usize,
    /// Absolute position of `words[0]` in the whole stream, for error reporting.
    base: usize,
}

impl<'a> WordReader<'a> {
    pub fn new(words: &'a [Word]) -> Self {
        Self::with_base(words, 0)
    }

    pub(crate) fn with_base(words: &'a [Word], base: usize) -> Self {
        Self {
            words,
            pos: 0,
            base,
        }
    }

    /// Absolute word offset of the cursor.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.words.len()
    }

    pub fn remaining(&self) -> usize {
        self.words.len().saturating_sub(self.pos)
    }

    pub fn read_word(&mut self) -> Result<Word, IrError> {
        let word = self.words.get(self.pos).copied().ok_or(IrError::Truncated {
            offset: self.offset(),
            needed: 1,
            available: 0,
        })?;
        self.pos += 1;
        Ok(word)
    }

    /// Takes the next `count` words as a sub-slice.
    pub fn read_slice(&mut self, count: usize) -> Result<&'a [Word], IrError> {
        if count > self.remaining() {
            return Err(IrError::Truncated {
                offset: self.offset(),
                needed: count,
                available: self.remaining(),
            });
        }
        let slice = &self.words[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Takes every remaining word.
    pub fn read_rest(&mut self) -> Vec<Word> {
        let rest = self.words[self.pos.min(self.words.len())..].to_vec();
        self.pos = self.words.len();
        rest
    }

    /// Reads a nul-terminated UTF-8 string packed little-endian into words.
    pub fn read_string(&mut self) -> Result<String, IrError> {
        let start = self.offset();
        let mut bytes = Vec::new();
        loop {
            let word = self
                .read_word()
                .map_err(|_| IrError::BadString { offset: start })?;
            for byte in word.to_le_bytes() {
                if byte == 0 {
                    return String::from_utf8(bytes).map_err(|_| IrError::BadString { offset: start });
                }
                bytes.push(byte);
            }
        }
    }
}

/// An append-only word buffer.
#[derive(Debug, Default)]
pub struct WordWriter {
    words: Vec<Word>,
}

impl WordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_word(&mut self, word: Word) {
        self.words.push(word);
    }

    pub fn write_words(&mut self, words: &[Word]) {
        self.words.extend_from_slice(words);
    }

    /// Writes a string with its nul terminator, zero padded to a word boundary.
    pub fn write_string(&mut self, s: &str) {
        self.words.extend(string_words(s));
    }

    pub fn into_words(self) -> Vec<Word> {
        self.words
    }
}

/// Packs a literal string into words.
pub fn string_words(s: &str) -> Vec<Word> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
