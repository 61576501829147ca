//! Unsigned LEB128 varints, as packed into a schematic's block data array.

use crate::error::SchemaError;

/// Maximum bytes a u32 varint can occupy.
const MAX_BYTES: usize = 5;

/// Decode a packed varint stream into palette indices.
pub fn decode_varints(data: &[u8]) -> Result<Vec<u32>, SchemaError> {
    let mut values = Vec::with_capacity(data.len());
    let mut value: u32 = 0;
    let mut shift: u32 = 0;
    let mut start = 0;

    for (offset, &byte) in data.iter().enumerate() {
        if shift == 0 {
            start = offset;
        }
        let bits = u32::from(byte & 0x7F);
        // The fifth byte may only carry the top four bits of a u32.
        if offset - start == MAX_BYTES - 1 && bits > 0x0F {
            return Err(SchemaError::MalformedVarInt { offset: start });
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            values.push(value);
            value = 0;
            shift = 0;
        } else {
            shift += 7;
            if offset - start + 1 >= MAX_BYTES {
                return Err(SchemaError::MalformedVarInt { offset: start });
            }
        }
    }

    if shift != 0 {
        return Err(SchemaError::MalformedVarInt { offset: start });
    }
    Ok(values)
}

/// Pack palette indices into a varint stream.
#[cfg(test)]
pub(crate) fn encode_varints(values: &[u32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len());
    for &v in values {
        let mut value = v;
        loop {
            if value & !0x7F == 0 {
                buf.push(value as u8);
                break;
            }
            buf.push((value & 0x7F | 0x80) as u8);
            value >>= 7;
        }
    }
    buf
}
