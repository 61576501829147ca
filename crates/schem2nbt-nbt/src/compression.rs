//! Compression envelopes around an NBT payload.

use std::borrow::Cow;
use std::io::{Read, Write};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};

use crate::error::NbtError;
use crate::tag::TagKind;

/// Envelopes found around schematic and structure files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Gzip,
    Zlib,
    None,
}

impl Compression {
    /// Detect the envelope from the leading magic bytes.
    pub fn detect(data: &[u8]) -> Result<Self, NbtError> {
        match data {
            [] => Err(NbtError::UnexpectedEof),
            [0x1F, 0x8B, ..] => Ok(Self::Gzip),
            [cmf, flg, ..] if is_zlib_header(*cmf, *flg) => Ok(Self::Zlib),
            [first, ..] if *first == TagKind::Compound.id() => Ok(Self::None),
            [first, ..] => Err(NbtError::UnknownCompression(*first)),
        }
    }
}

/// RFC 1950 header: deflate method, and CMF/FLG as a big-endian u16 is a multiple of 31.
fn is_zlib_header(cmf: u8, flg: u8) -> bool {
    cmf & 0x0F == 8 && (u16::from(cmf) << 8 | u16::from(flg)) % 31 == 0
}

/// Compress data with the given envelope.
pub fn compress(data: &[u8], compression: Compression) -> Result<Vec<u8>, NbtError> {
    match compression {
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder
                .write_all(data)
                .map_err(|e| NbtError::Compress(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| NbtError::Compress(e.to_string()))
        }
        Compression::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder
                .write_all(data)
                .map_err(|e| NbtError::Compress(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| NbtError::Compress(e.to_string()))
        }
        Compression::None => Ok(data.to_vec()),
    }
}

/// Strip the given envelope. Uncompressed input is borrowed as-is.
pub fn decompress(data: &[u8], compression: Compression) -> Result<Cow<'_, [u8]>, NbtError> {
    let mut output = Vec::new();
    match compression {
        Compression::Gzip => {
            GzDecoder::new(data)
                .read_to_end(&mut output)
                .map_err(|e| NbtError::Decompress(e.to_string()))?;
        }
        Compression::Zlib => {
            ZlibDecoder::new(data)
                .read_to_end(&mut output)
                .map_err(|e| NbtError::Decompress(e.to_string()))?;
        }
        Compression::None => return Ok(Cow::Borrowed(data)),
    }
    Ok(Cow::Owned(output))
}
