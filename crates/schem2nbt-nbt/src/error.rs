//! NBT error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NbtError {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("expected TAG_Compound (10) at root, got {got}")]
    ExpectedCompound { got: u8 },

    #[error("unknown tag type: {0}")]
    UnknownTagType(u8),

    #[error("invalid UTF-8 in NBT string")]
    InvalidUtf8,

    #[error("nesting too deep (limit: {limit})")]
    NestingTooDeep { limit: usize },

    #[error("negative array length: {0}")]
    NegativeLength(i32),

    #[error("list of TAG_End declares {0} elements")]
    EndListWithItems(i32),

    #[error("list of {expected:?} cannot hold a {got:?}")]
    MixedList {
        expected: crate::tag::TagKind,
        got: crate::tag::TagKind,
    },

    #[error("string of {0} bytes exceeds the 65535 byte limit")]
    StringTooLong(usize),

    #[error("{0} elements exceed the i32 length limit")]
    LengthOverflow(usize),

    #[error("{0} trailing bytes after root compound")]
    TrailingBytes(usize),

    #[error("unrecognized compression envelope (first byte 0x{0:02X})")]
    UnknownCompression(u8),

    #[error("decompression error: {0}")]
    Decompress(String),

    #[error("compression error: {0}")]
    Compress(String),
}
