//! Schematic tag trees for tests.

use schem2nbt_nbt::{NbtCompound, NbtRoot, NbtTag};

use crate::varint::encode_varints;

/// Builds a Sponge schematic of a given version.
pub struct SchematicBuilder {
    version: i32,
    size: [u32; 3],
    palette: Vec<(String, i32)>,
    data: Vec<u32>,
    block_entities: Vec<NbtCompound>,
    entities: Vec<NbtCompound>,
}

impl SchematicBuilder {
    pub fn new(version: i32, width: u32, height: u32, length: u32) -> Self {
        Self {
            version,
            size: [width, height, length],
            palette: Vec::new(),
            data: Vec::new(),
            block_entities: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn palette(mut self, entries: &[(&str, i32)]) -> Self {
        self.palette = entries.iter().map(|(s, i)| (s.to_string(), *i)).collect();
        self
    }

    pub fn data(mut self, cells: &[u32]) -> Self {
        self.data = cells.to_vec();
        self
    }

    pub fn block_entity(mut self, compound: NbtCompound) -> Self {
        self.block_entities.push(compound);
        self
    }

    pub fn entity(mut self, compound: NbtCompound) -> Self {
        self.entities.push(compound);
        self
    }

    pub fn build(self) -> NbtRoot {
        let palette: NbtCompound = self
            .palette
            .iter()
            .map(|(s, i)| (s.clone(), NbtTag::Int(*i)))
            .collect();
        let data = NbtTag::ByteArray(
            encode_varints(&self.data)
                .into_iter()
                .map(|b| b as i8)
                .collect(),
        );

        let mut schematic = NbtCompound::new();
        schematic.insert("Version".into(), NbtTag::Int(self.version));
        schematic.insert("DataVersion".into(), NbtTag::Int(2586));
        for (key, value) in ["Width", "Height", "Length"].into_iter().zip(self.size) {
            schematic.insert(key.into(), NbtTag::Short(value as u16 as i16));
        }

        if self.version >= 3 {
            let mut blocks = NbtCompound::new();
            blocks.insert("Palette".into(), NbtTag::Compound(palette));
            blocks.insert("Data".into(), data);
            blocks.insert(
                "BlockEntities".into(),
                NbtTag::compound_list(self.block_entities),
            );
            schematic.insert("Blocks".into(), NbtTag::Compound(blocks));
            schematic.insert("Entities".into(), NbtTag::compound_list(self.entities));

            let mut root = NbtCompound::new();
            root.insert("Schematic".into(), NbtTag::Compound(schematic));
            return NbtRoot::new("", root);
        }

        schematic.insert(
            "PaletteMax".into(),
            NbtTag::Int(self.palette.len() as i32),
        );
        schematic.insert("Palette".into(), NbtTag::Compound(palette));
        schematic.insert("BlockData".into(), data);
        let tile_key = if self.version == 1 {
            "TileEntities"
        } else {
            "BlockEntities"
        };
        schematic.insert(tile_key.into(), NbtTag::compound_list(self.block_entities));
        if self.version >= 2 {
            schematic.insert("Entities".into(), NbtTag::compound_list(self.entities));
        }
        NbtRoot::new("Schematic", schematic)
    }
}

/// A chest-like block entity. `nested` puts the payload under `Data`.
pub fn tile_compound(pos: [i32; 3], id: &str, nested: bool) -> NbtCompound {
    let mut payload = NbtCompound::new();
    payload.insert("Lock".into(), NbtTag::String(String::new()));

    let mut c = NbtCompound::new();
    c.insert("Pos".into(), NbtTag::IntArray(pos.to_vec()));
    c.insert("Id".into(), NbtTag::String(id.into()));
    if nested {
        c.insert("Data".into(), NbtTag::Compound(payload));
    } else {
        c.extend(payload);
    }
    c
}

/// A mob-like entity. `nested` puts the payload under `Data`.
pub fn entity_compound(pos: [f64; 3], id: &str, nested: bool) -> NbtCompound {
    let mut payload = NbtCompound::new();
    payload.insert("Health".into(), NbtTag::Float(10.0));

    let mut c = NbtCompound::new();
    c.insert("Pos".into(), NbtTag::double_list(pos));
    c.insert("Id".into(), NbtTag::String(id.into()));
    if nested {
        c.insert("Data".into(), NbtTag::Compound(payload));
    } else {
        c.extend(payload);
    }
    c
}
