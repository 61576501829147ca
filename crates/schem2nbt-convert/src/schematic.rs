//! Sponge schematic (`.schem`) extraction into a normalized voxel grid.
//!
//! Versions 1 and 2 keep everything at the root compound; version 3 nests
//! the schematic under a `Schematic` compound and moves palette, data and
//! block entities into a `Blocks` container. Cells are stored in
//! `x + z * width + y * width * length` order.

use std::collections::BTreeMap;

use schem2nbt_nbt::{NbtCompound, NbtRoot, NbtTag, TagKind};
use tracing::{debug, warn};

use crate::block_state::BlockState;
use crate::error::{ConversionError, SchemaError};
use crate::varint::decode_varints;

/// Normalized region: dimensions, dense palette indices, palette, and the
/// block entities and entities that sit inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    pub width: u32,
    pub height: u32,
    pub length: u32,
    /// One palette index per cell, `x + z * width + y * width * length`.
    pub blocks: Vec<u32>,
    pub palette: BTreeMap<u32, BlockState>,
    pub block_entities: Vec<BlockEntity>,
    pub entities: Vec<Entity>,
    /// `DataVersion` recorded by the editor that wrote the schematic, if any.
    pub data_version: Option<i32>,
}

impl VoxelGrid {
    pub fn volume(&self) -> usize {
        self.width as usize * self.height as usize * self.length as usize
    }

    /// Flat index of a cell. The caller keeps the coordinates in bounds.
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        let (w, l) = (self.width as usize, self.length as usize);
        x as usize + z as usize * w + y as usize * w * l
    }

    pub fn contains(&self, pos: [i32; 3]) -> bool {
        let [x, y, z] = pos;
        (0..self.width as i64).contains(&i64::from(x))
            && (0..self.height as i64).contains(&i64::from(y))
            && (0..self.length as i64).contains(&i64::from(z))
    }

    pub fn size(&self) -> [u32; 3] {
        [self.width, self.height, self.length]
    }

    /// The block state at a cell, if the cell is in bounds.
    #[cfg(test)]
    pub fn state_at(&self, x: u32, y: u32, z: u32) -> Option<&BlockState> {
        if x >= self.width || y >= self.height || z >= self.length {
            return None;
        }
        let index = self.blocks.get(self.index(x, y, z))?;
        self.palette.get(index)
    }
}

/// A block entity: the tile data attached to one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntity {
    pub pos: [i32; 3],
    pub id: String,
    /// Everything except the position and id wrapper keys, verbatim.
    pub data: NbtCompound,
}

/// A free entity with a fractional position relative to the region origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub pos: [f64; 3],
    pub id: String,
    pub data: NbtCompound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
    /// Data sits next to `Pos`/`Id` in the same compound.
    Flat,
    /// Data sits in a nested `Data` compound.
    Nested,
}

/// Where one schematic version keeps its pieces.
#[derive(Debug)]
struct SchemaLayout {
    version: i32,
    /// Sub-compound holding palette, data and block entities, if any.
    blocks_container: Option<&'static str>,
    data_key: &'static str,
    block_entities_key: &'static str,
    payload: Payload,
    has_entities: bool,
}

const LAYOUTS: [SchemaLayout; 3] = [
    SchemaLayout {
        version: 1,
        blocks_container: None,
        data_key: "BlockData",
        block_entities_key: "TileEntities",
        payload: Payload::Flat,
        has_entities: false,
    },
    SchemaLayout {
        version: 2,
        blocks_container: None,
        data_key: "BlockData",
        block_entities_key: "BlockEntities",
        payload: Payload::Flat,
        has_entities: true,
    },
    SchemaLayout {
        version: 3,
        blocks_container: Some("Blocks"),
        data_key: "Data",
        block_entities_key: "BlockEntities",
        payload: Payload::Nested,
        has_entities: true,
    },
];

fn layout_for(version: i32) -> Result<&'static SchemaLayout, ConversionError> {
    LAYOUTS
        .iter()
        .find(|layout| layout.version == version)
        .ok_or(ConversionError::UnsupportedVersion { version })
}

/// Interpret a decoded schematic.
pub fn extract(root: NbtRoot) -> Result<VoxelGrid, ConversionError> {
    let mut schematic = root.compound;
    // Version 3 wraps everything in a `Schematic` compound.
    if let Some(NbtTag::Compound(inner)) = schematic.shift_remove("Schematic") {
        schematic = inner;
    }

    let version = match schematic.get("Version") {
        Some(NbtTag::Int(v)) => *v,
        Some(other) => return Err(wrong_type("Version", "Int", other).into()),
        None => {
            warn!("schematic has no Version field, reading it as version 1");
            1
        }
    };
    let layout = layout_for(version)?;

    let width = read_dimension(&schematic, "Width")?;
    let height = read_dimension(&schematic, "Height")?;
    let length = read_dimension(&schematic, "Length")?;
    let data_version = match schematic.get("DataVersion") {
        Some(NbtTag::Int(v)) => Some(*v),
        _ => None,
    };
    debug!(
        "schematic v{version}: {width}x{height}x{length}, data version {:?}",
        data_version
    );

    let volume = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(length as usize))
        .ok_or(SchemaError::VolumeOverflow {
            width,
            height,
            length,
        })?;

    let container = match layout.blocks_container {
        Some(key) => require_compound(&schematic, key)?,
        None => &schematic,
    };

    let palette = read_palette(container)?;
    if let Some(NbtTag::Int(max)) = container.get("PaletteMax") {
        if (*max as i64) < palette.len() as i64 {
            warn!(
                "PaletteMax {max} is smaller than the {} palette entries",
                palette.len()
            );
        }
    }

    let blocks = read_block_data(container, layout.data_key, volume)?;
    if let Some((cell, &index)) = blocks
        .iter()
        .enumerate()
        .find(|(_, index)| !palette.contains_key(*index))
    {
        return Err(SchemaError::UnknownPaletteIndex { index, cell }.into());
    }

    let mut grid = VoxelGrid {
        width,
        height,
        length,
        blocks,
        palette,
        block_entities: Vec::new(),
        entities: Vec::new(),
        data_version,
    };

    for compound in compound_list(container, layout.block_entities_key)? {
        let block_entity = read_block_entity(compound, layout.payload)?;
        if !grid.contains(block_entity.pos) {
            return Err(SchemaError::OutOfBounds {
                what: "block entity",
                pos: block_entity.pos,
                size: grid.size(),
            }
            .into());
        }
        grid.block_entities.push(block_entity);
    }

    if layout.has_entities {
        for compound in compound_list(&schematic, "Entities")? {
            let entity = read_entity(compound, layout.payload)?;
            let [x, y, z] = entity.pos;
            if x < 0.0
                || y < 0.0
                || z < 0.0
                || x >= f64::from(width)
                || y >= f64::from(height)
                || z >= f64::from(length)
            {
                warn!("entity {} at {:?} lies outside the region", entity.id, entity.pos);
            }
            grid.entities.push(entity);
        }
    }

    debug!(
        "extracted {} palette entries, {} block entities, {} entities",
        grid.palette.len(),
        grid.block_entities.len(),
        grid.entities.len()
    );
    Ok(grid)
}

fn read_dimension(c: &NbtCompound, key: &'static str) -> Result<u32, SchemaError> {
    match c.get(key) {
        // Sponge stores dimensions as unsigned shorts.
        Some(NbtTag::Short(v)) => Ok(u32::from(*v as u16)),
        Some(NbtTag::Int(v)) if *v >= 0 => Ok(*v as u32),
        Some(NbtTag::Int(v)) => Err(SchemaError::NegativeDimension {
            axis: key,
            value: *v,
        }),
        Some(other) => Err(wrong_type(key, "Short", other)),
        None => Err(SchemaError::MissingKey(key.to_owned())),
    }
}

/// Invert the `state -> index` palette compound.
fn read_palette(c: &NbtCompound) -> Result<BTreeMap<u32, BlockState>, SchemaError> {
    let compound = require_compound(c, "Palette")?;
    let mut palette: BTreeMap<u32, BlockState> = BTreeMap::new();
    for (state, tag) in compound {
        let index = tag
            .as_int()
            .ok_or_else(|| wrong_type(&format!("Palette.{state}"), "Int", tag))?;
        let index = u32::try_from(index).map_err(|_| SchemaError::NegativePaletteIndex {
            state: state.clone(),
            index,
        })?;
        let parsed = BlockState::parse(state)?;
        if let Some(existing) = palette.get(&index) {
            return Err(SchemaError::DuplicatePaletteIndex {
                index,
                first: existing.to_string(),
                second: state.clone(),
            });
        }
        palette.insert(index, parsed);
    }
    Ok(palette)
}

fn read_block_data(
    c: &NbtCompound,
    key: &'static str,
    volume: usize,
) -> Result<Vec<u32>, SchemaError> {
    let data = match c.get(key) {
        Some(NbtTag::ByteArray(bytes)) => bytes,
        Some(other) => return Err(wrong_type(key, "ByteArray", other)),
        None => return Err(SchemaError::MissingKey(key.to_owned())),
    };
    let bytes: Vec<u8> = data.iter().map(|&b| b as u8).collect();
    let blocks = decode_varints(&bytes)?;
    if blocks.len() != volume {
        return Err(SchemaError::BlockCountMismatch {
            expected: volume,
            got: blocks.len(),
        });
    }
    Ok(blocks)
}

fn read_block_entity(mut c: NbtCompound, payload: Payload) -> Result<BlockEntity, SchemaError> {
    let pos = read_int_triple(c.shift_remove("Pos"), "Pos")?;
    let id = take_id(&mut c)?;
    let data = match payload {
        Payload::Flat => c,
        Payload::Nested => take_data(c)?,
    };
    Ok(BlockEntity { pos, id, data })
}

fn read_entity(mut c: NbtCompound, payload: Payload) -> Result<Entity, SchemaError> {
    let pos = match c.shift_remove("Pos") {
        Some(NbtTag::List(list)) if list.kind() == TagKind::Double || list.is_empty() => {
            let coords: Vec<f64> = list.iter().filter_map(NbtTag::as_double).collect();
            <[f64; 3]>::try_from(coords).map_err(|v| SchemaError::BadPosition {
                key: "Pos",
                len: v.len(),
            })?
        }
        Some(other) => return Err(wrong_type("Pos", "List of Double", &other)),
        None => return Err(SchemaError::MissingKey("Pos".to_owned())),
    };
    let id = take_id(&mut c)?;
    let data = match payload {
        Payload::Flat => c,
        Payload::Nested => take_data(c)?,
    };
    Ok(Entity { pos, id, data })
}

/// Accepts an `IntArray` or a `List` of `Int`.
fn read_int_triple(tag: Option<NbtTag>, key: &'static str) -> Result<[i32; 3], SchemaError> {
    let coords: Vec<i32> = match tag {
        Some(NbtTag::IntArray(v)) => v,
        Some(NbtTag::List(list)) if list.kind() == TagKind::Int || list.is_empty() => {
            list.iter().filter_map(NbtTag::as_int).collect()
        }
        Some(other) => return Err(wrong_type(key, "IntArray", &other)),
        None => return Err(SchemaError::MissingKey(key.to_owned())),
    };
    <[i32; 3]>::try_from(coords).map_err(|v| SchemaError::BadPosition { key, len: v.len() })
}

/// Remove the `Id` wrapper key (older writers use `id`).
fn take_id(c: &mut NbtCompound) -> Result<String, SchemaError> {
    let tag = c
        .shift_remove("Id")
        .or_else(|| c.shift_remove("id"))
        .ok_or_else(|| SchemaError::MissingKey("Id".to_owned()))?;
    match tag {
        NbtTag::String(id) => Ok(id),
        other => Err(wrong_type("Id", "String", &other)),
    }
}

fn take_data(mut c: NbtCompound) -> Result<NbtCompound, SchemaError> {
    match c.shift_remove("Data") {
        Some(NbtTag::Compound(data)) => Ok(data),
        Some(other) => Err(wrong_type("Data", "Compound", &other)),
        None => Ok(NbtCompound::new()),
    }
}

fn require_compound<'a>(c: &'a NbtCompound, key: &str) -> Result<&'a NbtCompound, SchemaError> {
    match c.get(key) {
        Some(NbtTag::Compound(inner)) => Ok(inner),
        Some(other) => Err(wrong_type(key, "Compound", other)),
        None => Err(SchemaError::MissingKey(key.to_owned())),
    }
}

/// An optional list of compounds; absent means empty.
fn compound_list(c: &NbtCompound, key: &str) -> Result<Vec<NbtCompound>, SchemaError> {
    let list = match c.get(key) {
        Some(NbtTag::List(list)) => list,
        Some(other) => return Err(wrong_type(key, "List", other)),
        None => return Ok(Vec::new()),
    };
    list.iter()
        .map(|tag| match tag {
            NbtTag::Compound(inner) => Ok(inner.clone()),
            other => Err(wrong_type(key, "List of Compound", other)),
        })
        .collect()
}

fn wrong_type(key: &str, expected: &'static str, got: &NbtTag) -> SchemaError {
    SchemaError::WrongType {
        key: key.to_owned(),
        expected,
        got: got.kind(),
    }
}
