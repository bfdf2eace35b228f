//! Error types for the SPIR-V module IR.

use crate::inst::Id;

/// Errors raised while decoding, resolving, or building a module.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// The byte stream cannot be split into whole words.
    #[error("byte stream length {0} is not a multiple of 4")]
    Unaligned(usize),

    /// The stream is shorter than the header or an instruction claims more words than remain.
    #[error("truncated word stream at word {offset}: need {needed} words, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The first word is not the SPIR-V magic number.
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    /// An instruction record declares a word count of zero.
    #[error("instruction at word {offset} has a word count of zero")]
    ZeroWordCount { offset: usize },

    /// An instruction's operands do not match its opcode's layout.
    #[error("malformed {opname} at word {offset}: {reason}")]
    Malformed {
        opname: String,
        offset: usize,
        reason: String,
    },

    /// A literal string is not valid UTF-8 or lacks a terminator.
    #[error("invalid literal string at word {offset}")]
    BadString { offset: usize },

    /// Two instructions define the same result id.
    #[error("result id %{0} is defined more than once")]
    DuplicateId(Id),

    /// A result id is zero or not below the header bound.
    #[error("id %{id} is outside the header bound {bound}")]
    IdOutOfBound { id: Id, bound: Id },

    /// The header declares a bound beyond what any consumer accepts.
    #[error("header bound {0} exceeds the id limit {limit}", limit = crate::stream::MAX_ID_BOUND)]
    BoundTooLarge(Id),

    /// An operand references an id that no instruction defines.
    #[error("id %{0} is referenced but never defined")]
    UnresolvedId(Id),

    /// A builder call needs a selected function or block.
    #[error("no {0} selected in builder")]
    Detached(&'static str),

    /// A type has no statically known byte size.
    #[error("type %{0} has no static size")]
    Unsized(Id),

    /// A type's byte size does not fit in 32 bits.
    #[error("size of type %{0} overflows")]
    SizeOverflow(Id),

    /// An instruction has more operand words than a record can hold.
    #[error("{opname} needs {words} words, more than a record can hold")]
    RecordTooLong { opname: String, words: usize },
}
