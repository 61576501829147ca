//! Sponge schematic to structure block file conversion.
//!
//! ```text
//! bytes -> decode -> extract -> remap -> build -> encode -> bytes
//! ```
//!
//! Nothing here touches the filesystem.

pub mod block_state;
pub mod error;
pub mod remap;
pub mod schematic;
pub mod structure;
pub mod varint;

#[cfg(test)]
mod test_util;

pub use block_state::BlockState;
pub use error::{ConversionError, SchemaError};
pub use remap::remap;
pub use schematic::{extract, VoxelGrid};
pub use structure::{build, TargetStructure, MIN_DATA_VERSION};

use schem2nbt_nbt::{Compression, NbtRoot};
use tracing::debug;

/// Knobs for a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Written as the structure's `author` when set.
    pub author: Option<String>,
    pub data_version: i32,
    /// Envelope for the output file.
    pub compression: Compression,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            author: None,
            data_version: MIN_DATA_VERSION,
            compression: Compression::Gzip,
        }
    }
}

/// Convert schematic file bytes into structure file bytes with default options.
pub fn convert(input: &[u8]) -> Result<Vec<u8>, ConversionError> {
    convert_with(input, &ConvertOptions::default())
}

pub fn convert_with(input: &[u8], options: &ConvertOptions) -> Result<Vec<u8>, ConversionError> {
    let root = schem2nbt_nbt::decode(input)?;
    let structure = convert_root(root, options)?;
    Ok(schem2nbt_nbt::encode(&structure, options.compression)?)
}

/// Convert an already decoded schematic tree into a structure tree.
pub fn convert_root(root: NbtRoot, options: &ConvertOptions) -> Result<NbtRoot, ConversionError> {
    let grid = extract(root)?;
    if let Some(source) = grid.data_version {
        if source != options.data_version {
            debug!(
                "schematic data version {source}, writing {}",
                options.data_version
            );
        }
    }
    let structure = remap(grid, options);
    Ok(build(&structure))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use schem2nbt_nbt::{decode, encode, NbtError, NbtTag, TagKind};

    use super::*;
    use crate::test_util::{entity_compound, tile_compound, SchematicBuilder};

    fn schematic_bytes(builder: SchematicBuilder) -> Vec<u8> {
        encode(&builder.build(), Compression::Gzip).unwrap()
    }

    fn convert_to_root(builder: SchematicBuilder) -> NbtRoot {
        let bytes = convert(&schematic_bytes(builder)).unwrap();
        decode(&bytes).unwrap()
    }

    fn block_list(root: &NbtRoot) -> Vec<(i32, [i32; 3])> {
        root.compound["blocks"]
            .as_list()
            .unwrap()
            .iter()
            .map(|tag| {
                let c = tag.as_compound().unwrap();
                let pos: Vec<i32> = c["pos"]
                    .as_list()
                    .unwrap()
                    .iter()
                    .map(|v| v.as_int().unwrap())
                    .collect();
                (c["state"].as_int().unwrap(), [pos[0], pos[1], pos[2]])
            })
            .collect()
    }

    fn palette_names(root: &NbtRoot) -> Vec<String> {
        root.compound["palette"]
            .as_list()
            .unwrap()
            .iter()
            .map(|tag| tag.as_compound().unwrap()["Name"].as_string().unwrap().to_owned())
            .collect()
    }

    #[test]
    fn single_stone_block() {
        let root = convert_to_root(
            SchematicBuilder::new(2, 1, 1, 1)
                .palette(&[("minecraft:stone", 0)])
                .data(&[0]),
        );
        assert_eq!(root.compound["size"], NbtTag::int_list([1, 1, 1]));
        assert_eq!(palette_names(&root), ["minecraft:stone"]);
        assert_eq!(block_list(&root), vec![(0, [0, 0, 0])]);
        assert_eq!(root.compound["DataVersion"], NbtTag::Int(MIN_DATA_VERSION));
        assert!(root.compound["entities"].as_list().unwrap().is_empty());
    }

    #[test]
    fn all_air_grid() {
        let root = convert_to_root(
            SchematicBuilder::new(2, 2, 2, 2)
                .palette(&[("minecraft:air", 0)])
                .data(&[0; 8]),
        );
        assert_eq!(root.compound["size"], NbtTag::int_list([2, 2, 2]));
        let palette = root.compound["palette"].as_list().unwrap();
        assert!(palette.is_empty());
        assert_eq!(palette.kind(), TagKind::Compound);
        assert!(block_list(&root).is_empty());
    }

    #[test]
    fn zero_volume_grid() {
        let root = convert_to_root(
            SchematicBuilder::new(2, 0, 5, 0)
                .palette(&[("minecraft:air", 0)])
                .data(&[]),
        );
        assert_eq!(root.compound["size"], NbtTag::int_list([0, 5, 0]));
        assert!(block_list(&root).is_empty());
    }

    #[test]
    fn truncated_input_is_a_format_error() {
        let bytes = schematic_bytes(
            SchematicBuilder::new(2, 2, 1, 1)
                .palette(&[("minecraft:stone", 0)])
                .data(&[0, 0]),
        );
        for cut in [0, 1, 2, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                matches!(convert(&bytes[..cut]), Err(ConversionError::Format(_))),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn unknown_envelope() {
        assert!(matches!(
            convert(b"PK\x03\x04"),
            Err(ConversionError::Format(NbtError::UnknownCompression(b'P')))
        ));
    }

    #[test]
    fn out_of_range_palette_index() {
        let bytes = schematic_bytes(
            SchematicBuilder::new(2, 2, 1, 1)
                .palette(&[("minecraft:stone", 0)])
                .data(&[0, 3]),
        );
        assert!(matches!(
            convert(&bytes),
            Err(ConversionError::Schema(SchemaError::UnknownPaletteIndex { index: 3, .. }))
        ));
    }

    #[test]
    fn idempotent_output() {
        let builder = || {
            SchematicBuilder::new(2, 3, 2, 2)
                .palette(&[
                    ("minecraft:air", 0),
                    ("minecraft:oak_log[axis=y]", 1),
                    ("minecraft:chest[facing=north,type=single]", 2),
                ])
                .data(&[1, 0, 2, 1, 1, 0, 0, 0, 1, 2, 1, 0])
                .block_entity(tile_compound([2, 0, 0], "minecraft:chest", false))
                .entity(entity_compound([1.5, 1.0, 0.5], "minecraft:sheep", false))
        };
        let first = convert(&schematic_bytes(builder())).unwrap();
        let second = convert(&schematic_bytes(builder())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn palette_is_minimal_and_blocks_conserved() {
        let data = [1, 2, 0, 2, 3, 3, 1, 0, 2, 2, 0, 4];
        let root = convert_to_root(
            SchematicBuilder::new(2, 3, 2, 2)
                .palette(&[
                    ("minecraft:air", 0),
                    ("minecraft:stone", 1),
                    ("minecraft:dirt", 2),
                    ("minecraft:cave_air", 3),
                    ("minecraft:glass", 4),
                ])
                .data(&data),
        );
        let names = palette_names(&root);
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());

        let blocks = block_list(&root);
        let used: HashSet<i32> = blocks.iter().map(|(state, _)| *state).collect();
        assert_eq!(used.len(), names.len());

        let solid = data.iter().filter(|&&i| i != 0 && i != 3).count();
        assert_eq!(blocks.len(), solid);

        for (_, [x, y, z]) in &blocks {
            assert!((0..3).contains(x));
            assert!((0..2).contains(y));
            assert!((0..2).contains(z));
        }
        assert_eq!(names, ["minecraft:stone", "minecraft:dirt", "minecraft:glass"]);
    }

    #[test]
    fn properties_survive() {
        let root = convert_to_root(
            SchematicBuilder::new(2, 1, 1, 1)
                .palette(&[("minecraft:oak_stairs[half=top,facing=east]", 0)])
                .data(&[0]),
        );
        let palette = root.compound["palette"].as_list().unwrap();
        let entry = palette.items()[0].as_compound().unwrap();
        let props = entry["Properties"].as_compound().unwrap();
        let keys: Vec<&str> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, ["facing", "half"]);
        assert_eq!(props["half"], NbtTag::String("top".into()));
    }

    #[test]
    fn v1_block_entity_becomes_block_nbt() {
        let root = convert_to_root(
            SchematicBuilder::new(1, 2, 1, 1)
                .palette(&[("minecraft:stone", 0), ("minecraft:chest", 1)])
                .data(&[0, 1])
                .block_entity(tile_compound([1, 0, 0], "minecraft:chest", false)),
        );
        let blocks = root.compound["blocks"].as_list().unwrap();
        let chest = blocks.items()[1].as_compound().unwrap();
        let nbt = chest["nbt"].as_compound().unwrap();
        assert_eq!(nbt["id"], NbtTag::String("minecraft:chest".into()));
        assert!(!nbt.contains_key("Id"));
        assert!(!nbt.contains_key("Pos"));
        assert!(nbt.contains_key("Lock"));
        assert!(!blocks.items()[0].as_compound().unwrap().contains_key("nbt"));
    }

    #[test]
    fn v3_schematic_with_entities() {
        let root = convert_to_root(
            SchematicBuilder::new(3, 2, 1, 1)
                .palette(&[("minecraft:barrel[facing=up]", 0), ("minecraft:air", 1)])
                .data(&[0, 1])
                .block_entity(tile_compound([0, 0, 0], "minecraft:barrel", true))
                .entity(entity_compound([1.25, 0.0, 0.5], "minecraft:pig", true)),
        );
        assert_eq!(block_list(&root), vec![(0, [0, 0, 0])]);

        let entities = root.compound["entities"].as_list().unwrap();
        let pig = entities.items()[0].as_compound().unwrap();
        assert_eq!(pig["pos"], NbtTag::double_list([1.25, 0.0, 0.5]));
        assert_eq!(pig["blockPos"], NbtTag::int_list([1, 0, 0]));
        let nbt = pig["nbt"].as_compound().unwrap();
        assert_eq!(nbt["id"], NbtTag::String("minecraft:pig".into()));
        assert_eq!(nbt["Health"], NbtTag::Float(10.0));
        assert_eq!(nbt["Pos"], NbtTag::double_list([1.25, 0.0, 0.5]));
    }

    #[test]
    fn author_and_data_version() {
        let options = ConvertOptions {
            author: Some("someone".into()),
            data_version: 3700,
            compression: Compression::Zlib,
        };
        let input = schematic_bytes(
            SchematicBuilder::new(2, 1, 1, 1)
                .palette(&[("minecraft:stone", 0)])
                .data(&[0]),
        );
        let bytes = convert_with(&input, &options).unwrap();
        assert_eq!(Compression::detect(&bytes).unwrap(), Compression::Zlib);
        let root = decode(&bytes).unwrap();
        assert_eq!(root.compound["author"], NbtTag::String("someone".into()));
        assert_eq!(root.compound["DataVersion"], NbtTag::Int(3700));
    }

    #[test]
    fn output_is_gzip_by_default() {
        let bytes = convert(&schematic_bytes(
            SchematicBuilder::new(2, 1, 1, 1)
                .palette(&[("minecraft:stone", 0)])
                .data(&[0]),
        ))
        .unwrap();
        assert_eq!(&bytes[..2], &[0x1F, 0x8B]);
    }

    #[test]
    fn uncompressed_input_is_accepted() {
        let root = SchematicBuilder::new(2, 1, 1, 1)
            .palette(&[("minecraft:stone", 0)])
            .data(&[0])
            .build();
        let raw = encode(&root, Compression::None).unwrap();
        assert!(convert(&raw).is_ok());
    }

    #[test]
    fn convert_root_keeps_tree_shape() {
        let root = SchematicBuilder::new(2, 1, 1, 1)
            .palette(&[("minecraft:stone", 0)])
            .data(&[0])
            .build();
        let out = convert_root(root, &ConvertOptions::default()).unwrap();
        assert_eq!(out.name, "");
        assert!(!out.compound.contains_key("author"));
        assert_eq!(block_list(&out), vec![(0, [0, 0, 0])]);
    }
}
