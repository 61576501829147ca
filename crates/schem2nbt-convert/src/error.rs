//! Conversion errors.

use schem2nbt_nbt::{NbtError, TagKind};
use thiserror::Error;

/// The tag tree is valid NBT but not a valid schematic.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required key `{0}`")]
    MissingKey(String),

    #[error("`{key}` is a {got:?}, expected {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        got: TagKind,
    },

    #[error("negative {axis}: {value}")]
    NegativeDimension { axis: &'static str, value: i32 },

    #[error("region volume {width}x{height}x{length} does not fit in memory")]
    VolumeOverflow { width: u32, height: u32, length: u32 },

    #[error("block data holds {got} entries, expected {expected}")]
    BlockCountMismatch { expected: usize, got: usize },

    #[error("malformed varint in block data at byte {offset}")]
    MalformedVarInt { offset: usize },

    #[error("cell {cell} references palette index {index}, which has no entry")]
    UnknownPaletteIndex { index: u32, cell: usize },

    #[error("palette index {index} is used by both `{first}` and `{second}`")]
    DuplicatePaletteIndex {
        index: u32,
        first: String,
        second: String,
    },

    #[error("palette entry `{state}` has negative index {index}")]
    NegativePaletteIndex { state: String, index: i32 },

    #[error("invalid block state `{state}`: {reason}")]
    InvalidBlockState { state: String, reason: &'static str },

    #[error("`{key}` must hold 3 coordinates, found {len}")]
    BadPosition { key: &'static str, len: usize },

    #[error("{what} at {pos:?} lies outside the {size:?} region")]
    OutOfBounds {
        what: &'static str,
        pos: [i32; 3],
        size: [u32; 3],
    },
}

/// Everything [`crate::convert`] can fail with.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("malformed NBT: {0}")]
    Format(#[from] NbtError),

    #[error("invalid schematic: {0}")]
    Schema(#[from] SchemaError),

    #[error("unsupported schematic version {version} (supported: 1-3)")]
    UnsupportedVersion { version: i32 },
}
