//! NBT tag types.

use indexmap::IndexMap;

use crate::error::NbtError;

/// A compound tag: insertion-ordered map of name -> tag.
pub type NbtCompound = IndexMap<String, NbtTag>;

/// A named root compound (the root always has a name, often empty string).
#[derive(Debug, Clone, PartialEq)]
pub struct NbtRoot {
    pub name: String,
    pub compound: NbtCompound,
}

impl NbtRoot {
    pub fn new(name: impl Into<String>, compound: NbtCompound) -> Self {
        Self {
            name: name.into(),
            compound,
        }
    }
}

/// The on-disk tag type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagKind {
    pub fn from_id(id: u8) -> Result<Self, NbtError> {
        Ok(match id {
            0 => Self::End,
            1 => Self::Byte,
            2 => Self::Short,
            3 => Self::Int,
            4 => Self::Long,
            5 => Self::Float,
            6 => Self::Double,
            7 => Self::ByteArray,
            8 => Self::String,
            9 => Self::List,
            10 => Self::Compound,
            11 => Self::IntArray,
            12 => Self::LongArray,
            other => return Err(NbtError::UnknownTagType(other)),
        })
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// A homogeneous list. Every element has the declared kind; an empty list
/// keeps whatever kind it was declared with.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtList {
    kind: TagKind,
    items: Vec<NbtTag>,
}

impl NbtList {
    /// An empty list declared as holding `kind`.
    pub fn empty(kind: TagKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    /// Build a list of `kind`, rejecting any element of another kind.
    pub fn new(kind: TagKind, items: Vec<NbtTag>) -> Result<Self, NbtError> {
        if let Some(bad) = items.iter().find(|t| t.kind() != kind) {
            return Err(NbtError::MixedList {
                expected: kind,
                got: bad.kind(),
            });
        }
        Ok(Self { kind, items })
    }

    /// Build a list whose kind is taken from the first element (`End` when empty).
    pub fn from_items(items: Vec<NbtTag>) -> Result<Self, NbtError> {
        let kind = items.first().map_or(TagKind::End, NbtTag::kind);
        Self::new(kind, items)
    }

    /// Append an element. An empty `End` list adopts the element's kind.
    pub fn push(&mut self, tag: NbtTag) -> Result<(), NbtError> {
        if self.items.is_empty() && self.kind == TagKind::End {
            self.kind = tag.kind();
        }
        if tag.kind() != self.kind {
            return Err(NbtError::MixedList {
                expected: self.kind,
                got: tag.kind(),
            });
        }
        self.items.push(tag);
        Ok(())
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn items(&self) -> &[NbtTag] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NbtTag> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a NbtList {
    type Item = &'a NbtTag;
    type IntoIter = std::slice::Iter<'a, NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Represents any NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(NbtList),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtTag {
    pub fn kind(&self) -> TagKind {
        match self {
            NbtTag::Byte(_) => TagKind::Byte,
            NbtTag::Short(_) => TagKind::Short,
            NbtTag::Int(_) => TagKind::Int,
            NbtTag::Long(_) => TagKind::Long,
            NbtTag::Float(_) => TagKind::Float,
            NbtTag::Double(_) => TagKind::Double,
            NbtTag::ByteArray(_) => TagKind::ByteArray,
            NbtTag::String(_) => TagKind::String,
            NbtTag::List(_) => TagKind::List,
            NbtTag::Compound(_) => TagKind::Compound,
            NbtTag::IntArray(_) => TagKind::IntArray,
            NbtTag::LongArray(_) => TagKind::LongArray,
        }
    }

    /// Returns the numeric tag type ID (1-12). TAG_End is 0 but not representable here.
    pub fn tag_type_id(&self) -> u8 {
        self.kind().id()
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            NbtTag::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            NbtTag::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            NbtTag::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&NbtCompound> {
        match self {
            NbtTag::Compound(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&NbtList> {
        match self {
            NbtTag::List(v) => Some(v),
            _ => None,
        }
    }

    /// Build a list of ints, e.g. a position or size vector.
    pub fn int_list(values: impl IntoIterator<Item = i32>) -> Self {
        NbtTag::List(NbtList {
            kind: TagKind::Int,
            items: values.into_iter().map(NbtTag::Int).collect(),
        })
    }

    /// Build a list of compounds. Empty input still declares `Compound`.
    pub fn compound_list(values: impl IntoIterator<Item = NbtCompound>) -> Self {
        NbtTag::List(NbtList {
            kind: TagKind::Compound,
            items: values.into_iter().map(NbtTag::Compound).collect(),
        })
    }

    /// Build a list of doubles, e.g. an entity position.
    pub fn double_list(values: impl IntoIterator<Item = f64>) -> Self {
        NbtTag::List(NbtList {
            kind: TagKind::Double,
            items: values.into_iter().map(NbtTag::Double).collect(),
        })
    }
}
