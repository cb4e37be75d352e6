use crate::block_entity::BlockEntity;
use crate::block_position::BlockPosition;
use crate::block_state::BlockState;
use crate::entity::Entity;
use crate::error::{Result, SchematicError};
use crate::palette::Palette;
use crate::region::Region;
use crate::schematic::Schematic;
use crate::tick::{BlockTick, FluidTick};
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use std::io::Read;

/// Level 3 balances encode speed against output size; matches the
/// reference tool's default.
pub(crate) const DEFAULT_COMPRESSION: flate2::Compression = flate2::Compression::new(3);

pub fn is_litematic(data: &[u8]) -> bool {
    let Ok(root) = decode_root(data) else {
        return false;
    };
    root.get::<_, i32>("Version").is_ok()
        && root.get::<_, &NbtCompound>("Metadata").is_ok()
        && root.get::<_, &NbtCompound>("Regions").is_ok()
}

pub(crate) fn decode_root(data: &[u8]) -> Result<NbtCompound> {
    let reader = std::io::BufReader::with_capacity(1 << 16, data);
    let mut gz = flate2::read::GzDecoder::new(reader);
    let mut buf = Vec::new();
    gz.read_to_end(&mut buf)
        .map_err(|e| SchematicError::CorruptedSchematic(format!("gzip decode failed: {e}")))?;
    let (root, _) = quartz_nbt::io::read_nbt(&mut std::io::Cursor::new(buf), Flavor::Uncompressed)?;
    Ok(root)
}

pub fn to_litematic(schematic: &Schematic) -> Result<Vec<u8>> {
    to_litematic_with_compression(schematic, DEFAULT_COMPRESSION)
}

pub fn to_litematic_with_compression(
    schematic: &Schematic,
    compression: flate2::Compression,
) -> Result<Vec<u8>> {
    let version = schematic.metadata.lm_version;
    if version != 6 && version != 7 {
        return Err(SchematicError::UnsupportedVersion(version));
    }

    let mut root = NbtCompound::new();
    root.insert("Version", NbtTag::Int(version));
    root.insert("SubVersion", NbtTag::Int(schematic.metadata.lm_subversion));
    root.insert(
        "MinecraftDataVersion",
        NbtTag::Int(schematic.metadata.mc_data_version.unwrap_or(3700)),
    );
    root.insert("Metadata", NbtTag::Compound(create_metadata(schematic)));
    root.insert("Regions", NbtTag::Compound(create_regions(schematic, version)?));

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), compression);
    quartz_nbt::io::write_nbt(&mut encoder, None, &root, Flavor::Uncompressed)?;
    Ok(encoder.finish()?)
}

pub fn from_litematic(data: &[u8]) -> Result<Schematic> {
    let root = decode_root(data)?;

    let version = root
        .get::<_, i32>("Version")
        .map_err(|_| SchematicError::RequiredKeyMissing("Version".to_string()))?;
    if version != 6 && version != 7 {
        return Err(SchematicError::UnsupportedVersion(version));
    }

    let mut schematic = Schematic::new("Unnamed");
    schematic.metadata.lm_version = version;
    schematic.metadata.lm_subversion = root.get::<_, i32>("SubVersion").unwrap_or(1);
    schematic.metadata.mc_data_version = root.get::<_, i32>("MinecraftDataVersion").ok();

    parse_metadata(&root, &mut schematic)?;
    parse_regions(&root, &mut schematic, version)?;

    Ok(schematic)
}

fn create_metadata(schematic: &Schematic) -> NbtCompound {
    let metadata = &schematic.metadata;
    let mut out = NbtCompound::new();

    out.insert("Name", metadata.name.clone().unwrap_or_default());
    out.insert("Author", metadata.author.clone().unwrap_or_default());
    out.insert("Description", metadata.description.clone().unwrap_or_default());
    out.insert("TimeCreated", NbtTag::Long(metadata.time_created.unwrap_or(0)));
    out.insert(
        "TimeModified",
        NbtTag::Long(metadata.time_modified.unwrap_or(metadata.time_created.unwrap_or(0))),
    );

    let (width, height, length) = schematic.dimensions();
    let mut enclosing_size = NbtCompound::new();
    enclosing_size.insert("x", NbtTag::Int(width));
    enclosing_size.insert("y", NbtTag::Int(height));
    enclosing_size.insert("z", NbtTag::Int(length));
    out.insert("EnclosingSize", NbtTag::Compound(enclosing_size));

    out.insert("TotalVolume", NbtTag::Int(schematic.total_volume() as i32));
    out.insert("TotalBlocks", NbtTag::Int(schematic.total_blocks() as i32));
    out.insert("RegionCount", NbtTag::Int(schematic.region_count() as i32));
    out.insert("Software", "litematica-core".to_string());

    if let Some(preview) = &metadata.preview {
        out.insert("PreviewImageData", NbtTag::IntArray(preview.iter().map(|&p| p as i32).collect()));
    }

    out
}

pub(crate) fn parse_metadata(root: &NbtCompound, schematic: &mut Schematic) -> Result<()> {
    let metadata = root
        .get::<_, &NbtCompound>("Metadata")
        .map_err(|_| SchematicError::RequiredKeyMissing("Metadata".to_string()))?;

    schematic.metadata.name = metadata.get::<_, &str>("Name").ok().map(String::from);
    schematic.metadata.author = metadata.get::<_, &str>("Author").ok().map(String::from);
    schematic.metadata.description = metadata.get::<_, &str>("Description").ok().map(String::from);
    schematic.metadata.time_created = metadata.get::<_, i64>("TimeCreated").ok();
    schematic.metadata.time_modified = metadata.get::<_, i64>("TimeModified").ok();
    if let Ok(preview) = metadata.get::<_, &[i32]>("PreviewImageData") {
        schematic.metadata.preview = Some(preview.iter().map(|&p| p as u32).collect());
    }

    schematic.metadata.region_count = metadata.get::<_, i32>("RegionCount").ok();
    schematic.metadata.total_volume = metadata.get::<_, i32>("TotalVolume").ok();
    schematic.metadata.total_blocks = metadata.get::<_, i32>("TotalBlocks").ok();
    if let Ok(size) = metadata.get::<_, &NbtCompound>("EnclosingSize") {
        schematic.metadata.enclosing_size = Some((
            size.get::<_, i32>("x").unwrap_or(0),
            size.get::<_, i32>("y").unwrap_or(0),
            size.get::<_, i32>("z").unwrap_or(0),
        ));
    }

    Ok(())
}

fn create_regions(schematic: &Schematic, version: i32) -> Result<NbtCompound> {
    let mut regions = NbtCompound::new();

    for (name, region) in schematic.regions() {
        let mut region_nbt = NbtCompound::new();

        let (px, py, pz) = region.position();
        let mut position = NbtCompound::new();
        position.insert("x", NbtTag::Int(px));
        position.insert("y", NbtTag::Int(py));
        position.insert("z", NbtTag::Int(pz));
        region_nbt.insert("Position", NbtTag::Compound(position));

        let (sx, sy, sz) = region.size();
        let mut size = NbtCompound::new();
        size.insert("x", NbtTag::Int(sx));
        size.insert("y", NbtTag::Int(sy));
        size.insert("z", NbtTag::Int(sz));
        region_nbt.insert("Size", NbtTag::Compound(size));

        let palette_list = NbtList::from(
            region
                .palette()
                .iter()
                .map(|state| state.to_nbt())
                .collect::<Vec<NbtTag>>(),
        );
        region_nbt.insert("BlockStatePalette", NbtTag::List(palette_list));

        let block_states = match version {
            6 => region.blocks_word_list().into_iter().map(|w| w as i64).collect(),
            7 => pack_v7(region.blocks_values(), region.volume(), region.blocks_bits()),
            v => return Err(SchematicError::UnsupportedVersion(v)),
        };
        region_nbt.insert("BlockStates", NbtTag::LongArray(block_states));

        let entities = NbtList::from(
            region
                .entities()
                .iter()
                .map(|entity| {
                    let mut entity_nbt = match entity.to_nbt() {
                        NbtTag::Compound(c) => c,
                        _ => NbtCompound::new(),
                    };
                    let rel_x = entity.position.0 - px as f64;
                    let rel_y = entity.position.1 - py as f64;
                    let rel_z = entity.position.2 - pz as f64;
                    entity_nbt.insert(
                        "Pos",
                        NbtTag::List(NbtList::from(vec![
                            NbtTag::Double(rel_x),
                            NbtTag::Double(rel_y),
                            NbtTag::Double(rel_z),
                        ])),
                    );
                    NbtTag::Compound(entity_nbt)
                })
                .collect::<Vec<NbtTag>>(),
        );
        region_nbt.insert("Entities", NbtTag::List(entities));

        let tile_entities = NbtList::from(
            region
                .block_entities()
                .map(|(&(x, y, z), block_entity)| {
                    let local = (x - px, y - py, z - pz);
                    block_entity.to_nbt(local)
                })
                .collect::<Vec<NbtTag>>(),
        );
        region_nbt.insert("TileEntities", NbtTag::List(tile_entities));

        let block_ticks = NbtList::from(
            region
                .block_ticks()
                .iter()
                .map(BlockTick::to_nbt)
                .collect::<Vec<NbtTag>>(),
        );
        region_nbt.insert("PendingBlockTicks", NbtTag::List(block_ticks));

        let fluid_ticks = NbtList::from(
            region
                .fluid_ticks()
                .iter()
                .map(FluidTick::to_nbt)
                .collect::<Vec<NbtTag>>(),
        );
        region_nbt.insert("PendingFluidTicks", NbtTag::List(fluid_ticks));

        regions.insert(name, NbtTag::Compound(region_nbt));
    }

    Ok(regions)
}

fn parse_regions(root: &NbtCompound, schematic: &mut Schematic, version: i32) -> Result<()> {
    let regions = root
        .get::<_, &NbtCompound>("Regions")
        .map_err(|_| SchematicError::RequiredKeyMissing("Regions".to_string()))?;

    for (name, region_tag) in regions.inner() {
        let NbtTag::Compound(region_nbt) = region_tag else {
            continue;
        };

        let position_nbt = region_nbt
            .get::<_, &NbtCompound>("Position")
            .map_err(|_| SchematicError::RequiredKeyMissing("Position".to_string()))?;
        let size_nbt = region_nbt
            .get::<_, &NbtCompound>("Size")
            .map_err(|_| SchematicError::RequiredKeyMissing("Size".to_string()))?;

        let position = (
            position_nbt.get::<_, i32>("x").unwrap_or(0),
            position_nbt.get::<_, i32>("y").unwrap_or(0),
            position_nbt.get::<_, i32>("z").unwrap_or(0),
        );
        let size = (
            size_nbt.get::<_, i32>("x").unwrap_or(0),
            size_nbt.get::<_, i32>("y").unwrap_or(0),
            size_nbt.get::<_, i32>("z").unwrap_or(0),
        );
        if size.0 == 0 || size.1 == 0 || size.2 == 0 {
            return Err(SchematicError::CorruptedSchematic(
                "region size component cannot be zero".to_string(),
            ));
        }

        let mut region = Region::new(name.clone(), position, size);

        let palette_tag = region_nbt
            .get::<_, &NbtList>("BlockStatePalette")
            .map_err(|_| SchematicError::RequiredKeyMissing("BlockStatePalette".to_string()))?;
        let mut palette = Palette::new();
        for tag in palette_tag.iter() {
            if let NbtTag::Compound(compound) = tag {
                let state = BlockState::from_nbt(compound)?;
                palette.index_of(&state);
            }
        }
        region.set_palette(palette);

        let block_states = region_nbt
            .get::<_, &[i64]>("BlockStates")
            .map_err(|_| SchematicError::RequiredKeyMissing("BlockStates".to_string()))?;
        let bits = region.palette().required_bit_width();
        let volume = region.volume();
        match version {
            6 => {
                let words: Vec<u64> = block_states.iter().map(|&w| w as u64).collect();
                region.set_blocks_from_words(words, bits)?;
            }
            7 => {
                let values = unpack_v7(block_states, volume, bits);
                region.set_blocks_from_values(&values)?;
            }
            v => return Err(SchematicError::UnsupportedVersion(v)),
        }

        if let Ok(entities_list) = region_nbt.get::<_, &NbtList>("Entities") {
            for tag in entities_list.iter() {
                if let NbtTag::Compound(compound) = tag {
                    let mut entity = Entity::from_nbt(compound)?;
                    entity.position.0 += position.0 as f64;
                    entity.position.1 += position.1 as f64;
                    entity.position.2 += position.2 as f64;
                    region.add_entity(entity);
                }
            }
        }

        if let Ok(tile_entities_list) = region_nbt.get::<_, &NbtList>("TileEntities") {
            for tag in tile_entities_list.iter() {
                if let NbtTag::Compound(compound) = tag {
                    let (block_entity, local) = BlockEntity::from_nbt(compound)?;
                    let absolute = BlockPosition::new(
                        local.0 + position.0,
                        local.1 + position.1,
                        local.2 + position.2,
                    );
                    region.set_block_entity(absolute, block_entity);
                }
            }
        }

        if let Ok(ticks) = region_nbt.get::<_, &NbtList>("PendingBlockTicks") {
            for tag in ticks.iter() {
                if let NbtTag::Compound(compound) = tag {
                    match BlockTick::from_nbt(compound) {
                        Some(tick) => region.add_block_tick(tick),
                        None => log::warn!("skipping block tick entry missing a required field"),
                    }
                }
            }
        }
        if let Ok(ticks) = region_nbt.get::<_, &NbtList>("PendingFluidTicks") {
            for tag in ticks.iter() {
                if let NbtTag::Compound(compound) = tag {
                    match FluidTick::from_nbt(compound) {
                        Some(tick) => region.add_fluid_tick(tick),
                        None => log::warn!("skipping fluid tick entry missing a required field"),
                    }
                }
            }
        }

        schematic.add_region(region)?;
    }

    Ok(())
}

/// Packs cell values into v7's non-straddling layout: each word holds
/// exactly `floor(64/bits)` whole cells, high bits left unused.
fn pack_v7(values: impl Iterator<Item = u64>, len: usize, bits: u32) -> Vec<i64> {
    let cells_per_word = (64 / bits) as usize;
    let word_count = (len + cells_per_word - 1) / cells_per_word.max(1);
    let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    let mut words = vec![0u64; word_count.max(1)];
    for (i, value) in values.enumerate() {
        let word_index = i / cells_per_word;
        let slot = i % cells_per_word;
        words[word_index] |= (value & mask) << (slot as u32 * bits);
    }
    words.into_iter().map(|w| w as i64).collect()
}

fn unpack_v7(words: &[i64], len: usize, bits: u32) -> Vec<u64> {
    let cells_per_word = (64 / bits) as usize;
    let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    let mut values = Vec::with_capacity(len);
    for i in 0..len {
        let word_index = i / cells_per_word;
        let slot = i % cells_per_word;
        let word = words.get(word_index).copied().unwrap_or(0) as u64;
        values.push((word >> (slot as u32 * bits)) & mask);
    }
    values
}
