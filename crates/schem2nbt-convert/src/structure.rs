//! Structure block file (`.nbt`) model and its tag tree.

use schem2nbt_nbt::{NbtCompound, NbtRoot, NbtTag};

use crate::block_state::BlockState;

/// Lowest game data version (1.16.5) the written layout is known to load in.
pub const MIN_DATA_VERSION: i32 = 2586;

/// A converted region, ready to serialize.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetStructure {
    pub size: [i32; 3],
    /// Minimal palette in first-seen order.
    pub palette: Vec<BlockState>,
    pub blocks: Vec<StructureBlock>,
    pub entities: Vec<StructureEntity>,
    pub data_version: i32,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureBlock {
    pub pos: [i32; 3],
    /// Index into [`TargetStructure::palette`].
    pub state: u32,
    pub nbt: Option<NbtCompound>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureEntity {
    pub pos: [f64; 3],
    pub block_pos: [i32; 3],
    pub nbt: NbtCompound,
}

/// Build the structure's root tag.
pub fn build(structure: &TargetStructure) -> NbtRoot {
    let mut root = NbtCompound::new();
    root.insert("DataVersion".into(), NbtTag::Int(structure.data_version));
    if let Some(author) = &structure.author {
        root.insert("author".into(), NbtTag::String(author.clone()));
    }
    root.insert("size".into(), NbtTag::int_list(structure.size));
    root.insert(
        "palette".into(),
        NbtTag::compound_list(structure.palette.iter().map(palette_entry)),
    );
    root.insert(
        "blocks".into(),
        NbtTag::compound_list(structure.blocks.iter().map(block_entry)),
    );
    root.insert(
        "entities".into(),
        NbtTag::compound_list(structure.entities.iter().map(entity_entry)),
    );
    NbtRoot::new("", root)
}

fn palette_entry(state: &BlockState) -> NbtCompound {
    let mut entry = NbtCompound::new();
    entry.insert("Name".into(), NbtTag::String(state.name.clone()));
    if !state.properties.is_empty() {
        let properties = state
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), NbtTag::String(v.clone())))
            .collect();
        entry.insert("Properties".into(), NbtTag::Compound(properties));
    }
    entry
}

fn block_entry(block: &StructureBlock) -> NbtCompound {
    let mut entry = NbtCompound::new();
    // Palette indices never exceed the palette length, which is far below i32::MAX.
    entry.insert("state".into(), NbtTag::Int(block.state as i32));
    entry.insert("pos".into(), NbtTag::int_list(block.pos));
    if let Some(nbt) = &block.nbt {
        entry.insert("nbt".into(), NbtTag::Compound(nbt.clone()));
    }
    entry
}

fn entity_entry(entity: &StructureEntity) -> NbtCompound {
    let mut entry = NbtCompound::new();
    entry.insert("pos".into(), NbtTag::double_list(entity.pos));
    entry.insert("blockPos".into(), NbtTag::int_list(entity.block_pos));
    entry.insert("nbt".into(), NbtTag::Compound(entity.nbt.clone()));
    entry
}
