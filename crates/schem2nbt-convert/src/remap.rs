//! Palette and coordinate remapping from a voxel grid to a structure.

use std::collections::HashMap;

use schem2nbt_nbt::{NbtCompound, NbtTag};
use tracing::{debug, warn};

use crate::block_state::BlockState;
use crate::schematic::{BlockEntity, Entity, VoxelGrid};
use crate::structure::{StructureBlock, StructureEntity, TargetStructure};
use crate::ConvertOptions;

/// Builds the structure palette in first-seen order.
///
/// Source indices are resolved once. Two source entries that print to the
/// same canonical state share one target index.
#[derive(Default)]
struct PaletteBuilder {
    states: Vec<BlockState>,
    by_key: HashMap<String, u32>,
    /// Source palette index -> target index, `None` for air.
    resolved: HashMap<u32, Option<u32>>,
}

impl PaletteBuilder {
    fn resolve(&mut self, source: u32, state: &BlockState) -> Option<u32> {
        if let Some(&target) = self.resolved.get(&source) {
            return target;
        }
        let target = if state.is_air() {
            None
        } else {
            let key = state.to_string();
            let next = self.states.len() as u32;
            let index = *self.by_key.entry(key).or_insert_with(|| {
                self.states.push(state.clone());
                next
            });
            Some(index)
        };
        self.resolved.insert(source, target);
        target
    }
}

/// Walk the grid in y, z, x order and build the structure.
pub fn remap(mut grid: VoxelGrid, options: &ConvertOptions) -> TargetStructure {
    let mut tiles: HashMap<[i32; 3], NbtCompound> = HashMap::new();
    for be in std::mem::take(&mut grid.block_entities) {
        let pos = be.pos;
        if let Some(earlier) = tiles.insert(pos, block_entity_nbt(be)) {
            let id = earlier.get("id").and_then(NbtTag::as_string).unwrap_or("?");
            warn!("block entity {id} at {pos:?} is replaced by a later one at the same cell");
        }
    }

    let mut builder = PaletteBuilder::default();
    let mut blocks = Vec::new();
    for y in 0..grid.height {
        for z in 0..grid.length {
            for x in 0..grid.width {
                let index = grid.index(x, y, z);
                let Some(&source) = grid.blocks.get(index) else {
                    continue;
                };
                let Some(state) = grid.palette.get(&source) else {
                    warn!("cell {index} references missing palette index {source}, skipping");
                    continue;
                };
                let Some(target) = builder.resolve(source, state) else {
                    continue;
                };
                let pos = [to_i32(x), to_i32(y), to_i32(z)];
                blocks.push(StructureBlock {
                    pos,
                    state: target,
                    nbt: tiles.remove(&pos),
                });
            }
        }
    }

    for (pos, nbt) in &tiles {
        let id = nbt.get("id").and_then(NbtTag::as_string).unwrap_or("?");
        warn!("dropping block entity {id} at {pos:?}: its cell is air");
    }

    let size = grid.size().map(to_i32);
    let entities: Vec<StructureEntity> = grid.entities.into_iter().map(remap_entity).collect();

    debug!(
        "remapped {} blocks over {} palette states, {} entities",
        blocks.len(),
        builder.states.len(),
        entities.len()
    );

    TargetStructure {
        size,
        palette: builder.states,
        blocks,
        entities,
        data_version: options.data_version,
        author: options.author.clone(),
    }
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// `id` first, then the payload. The wrapper id wins over a payload `id`.
fn block_entity_nbt(be: BlockEntity) -> NbtCompound {
    let mut nbt = NbtCompound::with_capacity(be.data.len() + 1);
    nbt.insert("id".into(), NbtTag::String(be.id));
    for (key, value) in be.data {
        if key != "id" && key != "Pos" {
            nbt.insert(key, value);
        }
    }
    nbt
}

fn remap_entity(entity: Entity) -> StructureEntity {
    let [x, y, z] = entity.pos;
    let block_pos = [x.floor() as i32, y.floor() as i32, z.floor() as i32];

    let mut nbt = NbtCompound::with_capacity(entity.data.len() + 2);
    nbt.insert("id".into(), NbtTag::String(entity.id));
    for (key, value) in entity.data {
        if key != "id" && key != "Pos" {
            nbt.insert(key, value);
        }
    }
    nbt.insert("Pos".into(), NbtTag::double_list(entity.pos));

    StructureEntity {
        pos: entity.pos,
        block_pos,
        nbt,
    }
}
