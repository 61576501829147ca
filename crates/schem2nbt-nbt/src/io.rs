//! Big-endian NBT read/write engine (Java Edition layout).

use std::borrow::Cow;

use bytes::{Buf, BufMut};

use crate::error::NbtError;
use crate::tag::{NbtCompound, NbtList, NbtRoot, NbtTag, TagKind};

/// Maximum nesting depth to prevent stack overflow.
const MAX_DEPTH: usize = 512;

// -----------------------------------------------------------------------
// Reading
// -----------------------------------------------------------------------

pub(crate) fn read_nbt(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    ensure_remaining(buf, 1)?;
    let tag_type = buf.get_u8();
    if tag_type != TagKind::Compound.id() {
        return Err(NbtError::ExpectedCompound { got: tag_type });
    }
    let name = read_string(buf)?;
    let compound = read_compound(buf, 0)?;
    Ok(NbtRoot { name, compound })
}

fn read_tag(buf: &mut impl Buf, kind: TagKind, depth: usize) -> Result<NbtTag, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
    }

    match kind {
        // Only reachable through a list of TAG_End with a non-zero count,
        // which read_list rejects before recursing.
        TagKind::End => Err(NbtError::UnknownTagType(0)),
        TagKind::Byte => {
            ensure_remaining(buf, 1)?;
            Ok(NbtTag::Byte(buf.get_i8()))
        }
        TagKind::Short => {
            ensure_remaining(buf, 2)?;
            Ok(NbtTag::Short(buf.get_i16()))
        }
        TagKind::Int => {
            ensure_remaining(buf, 4)?;
            Ok(NbtTag::Int(buf.get_i32()))
        }
        TagKind::Long => {
            ensure_remaining(buf, 8)?;
            Ok(NbtTag::Long(buf.get_i64()))
        }
        TagKind::Float => {
            ensure_remaining(buf, 4)?;
            Ok(NbtTag::Float(buf.get_f32()))
        }
        TagKind::Double => {
            ensure_remaining(buf, 8)?;
            Ok(NbtTag::Double(buf.get_f64()))
        }
        TagKind::ByteArray => {
            let len = read_array_len(buf, 1)?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(buf.get_i8());
            }
            Ok(NbtTag::ByteArray(arr))
        }
        TagKind::String => Ok(NbtTag::String(read_string(buf)?)),
        TagKind::List => Ok(NbtTag::List(read_list(buf, depth + 1)?)),
        TagKind::Compound => Ok(NbtTag::Compound(read_compound(buf, depth + 1)?)),
        TagKind::IntArray => {
            let len = read_array_len(buf, 4)?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(buf.get_i32());
            }
            Ok(NbtTag::IntArray(arr))
        }
        TagKind::LongArray => {
            let len = read_array_len(buf, 8)?;
            let mut arr = Vec::with_capacity(len);
            for _ in 0..len {
                arr.push(buf.get_i64());
            }
            Ok(NbtTag::LongArray(arr))
        }
    }
}

fn read_list(buf: &mut impl Buf, depth: usize) -> Result<NbtList, NbtError> {
    ensure_remaining(buf, 5)?;
    let element_kind = TagKind::from_id(buf.get_u8())?;
    let len = buf.get_i32();
    if len < 0 {
        return Err(NbtError::NegativeLength(len));
    }
    if element_kind == TagKind::End && len > 0 {
        return Err(NbtError::EndListWithItems(len));
    }
    // Every element takes at least one byte, so a count above the remaining
    // input is already known to be truncated.
    let len = len as usize;
    if element_kind != TagKind::Compound && element_kind != TagKind::List {
        ensure_remaining(buf, len)?;
    }
    let mut items = Vec::with_capacity(len.min(buf.remaining()));
    for _ in 0..len {
        items.push(read_tag(buf, element_kind, depth)?);
    }
    NbtList::new(element_kind, items)
}

fn read_compound(buf: &mut impl Buf, depth: usize) -> Result<NbtCompound, NbtError> {
    if depth > MAX_DEPTH {
        return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
    }
    let mut map = NbtCompound::new();
    loop {
        ensure_remaining(buf, 1)?;
        let kind = TagKind::from_id(buf.get_u8())?;
        if kind == TagKind::End {
            break;
        }
        let name = read_string(buf)?;
        let tag = read_tag(buf, kind, depth)?;
        map.insert(name, tag);
    }
    Ok(map)
}

fn read_string(buf: &mut impl Buf) -> Result<String, NbtError> {
    ensure_remaining(buf, 2)?;
    let len = buf.get_u16() as usize;
    ensure_remaining(buf, len)?;
    let data = buf.copy_to_bytes(len);
    // Java writes modified UTF-8: NUL as C0 80, astral chars as surrogate pairs.
    cesu8::from_java_cesu8(&data)
        .map(Cow::into_owned)
        .map_err(|_| NbtError::InvalidUtf8)
}

/// Read an i32 array length and check that `len * width` bytes follow.
fn read_array_len(buf: &mut impl Buf, width: usize) -> Result<usize, NbtError> {
    ensure_remaining(buf, 4)?;
    let len = buf.get_i32();
    if len < 0 {
        return Err(NbtError::NegativeLength(len));
    }
    let len = len as usize;
    ensure_remaining(buf, len.saturating_mul(width))?;
    Ok(len)
}

fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), NbtError> {
    if buf.remaining() < needed {
        Err(NbtError::UnexpectedEof)
    } else {
        Ok(())
    }
}

// -----------------------------------------------------------------------
// Writing
// -----------------------------------------------------------------------

pub(crate) fn write_nbt(buf: &mut impl BufMut, root: &NbtRoot) -> Result<(), NbtError> {
    buf.put_u8(TagKind::Compound.id());
    write_string(buf, &root.name)?;
    write_compound(buf, &root.compound)
}

fn write_tag(buf: &mut impl BufMut, tag: &NbtTag) -> Result<(), NbtError> {
    match tag {
        NbtTag::Byte(v) => buf.put_i8(*v),
        NbtTag::Short(v) => buf.put_i16(*v),
        NbtTag::Int(v) => buf.put_i32(*v),
        NbtTag::Long(v) => buf.put_i64(*v),
        NbtTag::Float(v) => buf.put_f32(*v),
        NbtTag::Double(v) => buf.put_f64(*v),
        NbtTag::ByteArray(arr) => {
            write_len(buf, arr.len())?;
            for &b in arr {
                buf.put_i8(b);
            }
        }
        NbtTag::String(s) => write_string(buf, s)?,
        NbtTag::List(list) => {
            buf.put_u8(list.kind().id());
            write_len(buf, list.len())?;
            for item in list {
                write_tag(buf, item)?;
            }
        }
        NbtTag::Compound(map) => write_compound(buf, map)?,
        NbtTag::IntArray(arr) => {
            write_len(buf, arr.len())?;
            for &v in arr {
                buf.put_i32(v);
            }
        }
        NbtTag::LongArray(arr) => {
            write_len(buf, arr.len())?;
            for &v in arr {
                buf.put_i64(v);
            }
        }
    }
    Ok(())
}

fn write_compound(buf: &mut impl BufMut, map: &NbtCompound) -> Result<(), NbtError> {
    for (name, tag) in map {
        buf.put_u8(tag.tag_type_id());
        write_string(buf, name)?;
        write_tag(buf, tag)?;
    }
    buf.put_u8(TagKind::End.id());
    Ok(())
}

fn write_string(buf: &mut impl BufMut, s: &str) -> Result<(), NbtError> {
    let encoded = cesu8::to_java_cesu8(s);
    let len =
        u16::try_from(encoded.len()).map_err(|_| NbtError::StringTooLong(encoded.len()))?;
    buf.put_u16(len);
    buf.put_slice(&encoded);
    Ok(())
}

fn write_len(buf: &mut impl BufMut, len: usize) -> Result<(), NbtError> {
    let len = i32::try_from(len).map_err(|_| NbtError::LengthOverflow(len))?;
    buf.put_i32(len);
    Ok(())
}
