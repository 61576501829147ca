//! NBT (Named Binary Tag) implementation for Minecraft Java Edition files.
//!
//! All numbers are big-endian, string lengths are u16, array and list
//! lengths are i32. Files are usually wrapped in gzip; zlib and bare
//! payloads are also accepted on read.

mod compression;
pub mod error;
mod io;
pub mod tag;

pub use compression::{compress, decompress, Compression};
pub use error::NbtError;
pub use tag::{NbtCompound, NbtList, NbtRoot, NbtTag, TagKind};

use bytes::{Buf, BufMut};
use tracing::trace;

/// Read uncompressed NBT from a buffer.
pub fn read_nbt(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    io::read_nbt(buf)
}

/// Write uncompressed NBT to a buffer.
pub fn write_nbt(buf: &mut impl BufMut, root: &NbtRoot) -> Result<(), NbtError> {
    io::write_nbt(buf, root)
}

/// Decode a complete file: detect the envelope, decompress, parse.
///
/// The whole payload must be consumed by the root compound.
pub fn decode(data: &[u8]) -> Result<NbtRoot, NbtError> {
    let compression = Compression::detect(data)?;
    let payload = decompress(data, compression)?;
    trace!(
        "decoding {} bytes ({:?}, {} uncompressed)",
        data.len(),
        compression,
        payload.len()
    );
    let mut buf = &payload[..];
    let root = read_nbt(&mut buf)?;
    if buf.has_remaining() {
        return Err(NbtError::TrailingBytes(buf.remaining()));
    }
    Ok(root)
}

/// Encode a complete file with the given envelope.
pub fn encode(root: &NbtRoot, compression: Compression) -> Result<Vec<u8>, NbtError> {
    let mut raw = Vec::new();
    write_nbt(&mut raw, root)?;
    compress(&raw, compression)
}
