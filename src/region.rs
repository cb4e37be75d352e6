use crate::bit_array::BitArray;
use crate::block_entity::BlockEntity;
use crate::block_position::BlockPosition;
use crate::bounding_box::BoundingBox;
use crate::coord_system::CoordSystem;
use crate::entity::Entity;
use crate::error::{Result, SchematicError};
use crate::palette::Palette;
use crate::tick::{BlockTick, FluidTick};
use crate::BlockState;
use std::collections::{HashMap, HashSet};

/// A named, fixed-size volume of blocks: a palette-compressed,
/// bit-packed voxel grid plus the entities and tile entities that live
/// inside it. `position`/`size` are in schematic (absolute) space;
/// `size` components may be negative, meaning the region extends in
/// the negative direction from `position`.
#[derive(Debug, Clone)]
pub struct Region {
    name: String,
    coords: CoordSystem,
    palette: Palette,
    blocks: BitArray,
    entities: Vec<Entity>,
    block_entities: HashMap<(i32, i32, i32), BlockEntity>,
    block_ticks: Vec<BlockTick>,
    fluid_ticks: Vec<FluidTick>,
}

impl Region {
    pub fn new(name: impl Into<String>, position: (i32, i32, i32), size: (i32, i32, i32)) -> Self {
        let coords = CoordSystem::new(position, size);
        let palette = Palette::new();
        let blocks = BitArray::new(coords.volume(), palette.required_bit_width());
        Region {
            name: name.into(),
            coords,
            palette,
            blocks,
            entities: Vec::new(),
            block_entities: HashMap::new(),
            block_ticks: Vec::new(),
            fluid_ticks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn position(&self) -> (i32, i32, i32) {
        self.coords.position()
    }

    pub fn size(&self) -> (i32, i32, i32) {
        self.coords.size()
    }

    pub fn dimensions(&self) -> (i32, i32, i32) {
        self.coords.dimensions()
    }

    pub fn volume(&self) -> usize {
        self.coords.volume()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.coords.bounding_box()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Replaces the palette wholesale. Used by the codec when decoding
    /// a `BlockStatePalette` tag; callers must also install matching
    /// block indices via [`Region::set_blocks_from_words`] or
    /// [`Region::set_blocks_from_values`].
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Current bit width of a cell in the backing bit array.
    pub fn blocks_bits(&self) -> u32 {
        self.blocks.bits()
    }

    /// The backing words in v6 (straddling) layout, for direct
    /// serialization into a `BlockStates` long array.
    pub fn blocks_word_list(&self) -> Vec<u64> {
        self.blocks.to_word_list()
    }

    /// Every cell's palette index, in ascending local-index order.
    pub fn blocks_values(&self) -> impl Iterator<Item = u64> + '_ {
        self.blocks.iter()
    }

    /// Installs block indices decoded from a v6 (straddling) long
    /// array, replacing the current bit array entirely.
    pub fn set_blocks_from_words(&mut self, words: Vec<u64>, bits: u32) -> Result<()> {
        self.blocks = BitArray::from_words(words, self.coords.volume(), bits)?;
        Ok(())
    }

    /// Installs block indices decoded from a v7 (non-straddling) long
    /// array, already unpacked into one value per cell.
    pub fn set_blocks_from_values(&mut self, values: &[u64]) -> Result<()> {
        self.blocks = BitArray::from_values(values, self.palette.required_bit_width())?;
        Ok(())
    }

    /// True iff `(x, y, z)`, given in the same sign-dependent local space
    /// as [`Region::get_block`]/[`Region::set_block`], falls inside this
    /// region.
    pub fn is_in_region(&self, x: i32, y: i32, z: i32) -> bool {
        self.coords.local_to_dense((x, y, z)).is_some()
    }

    /// Local-space bound on X: `0..=size.x-1` for a positive-sized
    /// region, or `size.x+1..=0` (running backward) for a negative one.
    pub fn min_x(&self) -> i32 {
        self.coords.min_x()
    }
    pub fn max_x(&self) -> i32 {
        self.coords.max_x()
    }
    pub fn min_y(&self) -> i32 {
        self.coords.min_y()
    }
    pub fn max_y(&self) -> i32 {
        self.coords.max_y()
    }
    pub fn min_z(&self) -> i32 {
        self.coords.min_z()
    }
    pub fn max_z(&self) -> i32 {
        self.coords.max_z()
    }

    /// Schematic-space (absolute) bounds, always `min <= max`.
    pub fn min_schem_x(&self) -> i32 {
        self.coords.min_schem_x()
    }
    pub fn max_schem_x(&self) -> i32 {
        self.coords.max_schem_x()
    }
    pub fn min_schem_y(&self) -> i32 {
        self.coords.min_schem_y()
    }
    pub fn max_schem_y(&self) -> i32 {
        self.coords.max_schem_y()
    }
    pub fn min_schem_z(&self) -> i32 {
        self.coords.min_schem_z()
    }
    pub fn max_schem_z(&self) -> i32 {
        self.coords.max_schem_z()
    }

    pub fn range_x(&self) -> i32 {
        self.coords.range_x()
    }
    pub fn range_y(&self) -> i32 {
        self.coords.range_y()
    }
    pub fn range_z(&self) -> i32 {
        self.coords.range_z()
    }

    /// Every local-space block position in this region, in the same
    /// sign-dependent coordinates as [`Region::get_block`].
    pub fn block_positions(&self) -> impl Iterator<Item = BlockPosition> + '_ {
        let (min_x, max_x) = (self.min_x(), self.max_x());
        let (min_y, max_y) = (self.min_y(), self.max_y());
        let (min_z, max_z) = (self.min_z(), self.max_z());
        (min_y..=max_y).flat_map(move |y| {
            (min_z..=max_z)
                .flat_map(move |z| (min_x..=max_x).map(move |x| BlockPosition::new(x, y, z)))
        })
    }

    /// Alias for [`Region::block_positions`] matching the reference
    /// tool's naming.
    pub fn allblockpos(&self) -> impl Iterator<Item = BlockPosition> + '_ {
        self.block_positions()
    }

    /// `(x, y, z)` are in local, sign-dependent space (see
    /// [`Region::min_x`]/[`Region::max_x`] and friends), matching how a
    /// negative-size region is addressed.
    fn local_index(&self, x: i32, y: i32, z: i32) -> Result<usize> {
        let dense = self
            .coords
            .local_to_dense((x, y, z))
            .ok_or(SchematicError::IndexOutOfRange {
                index: 0,
                len: self.coords.volume(),
            })?;
        Ok(self.coords.local_to_index(dense))
    }

    /// Grows the backing bit array in place if the palette now needs
    /// more bits per cell than the array currently allocates.
    fn widen_if_needed(&mut self) {
        let required = self.palette.required_bit_width();
        if required <= self.blocks.bits() {
            return;
        }
        log::debug!(
            "region '{}' widening block storage from {} to {} bits per cell",
            self.name,
            self.blocks.bits(),
            required
        );
        let mut widened = BitArray::new(self.blocks.len(), required);
        for i in 0..self.blocks.len() {
            let value = self.blocks.get(i).expect("index within bounds");
            widened.set(i, value).expect("value fits widened cell");
        }
        self.blocks = widened;
    }

    /// `(x, y, z)` is in local, sign-dependent space: `0..size` for a
    /// positive-sized region on that axis, or `size+1..=0` for a
    /// negative one.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Result<&BlockState> {
        let index = self.local_index(x, y, z)?;
        let palette_index = self.blocks.get(index)? as usize;
        self.palette.get(palette_index)
    }

    /// `(x, y, z)` is in local, sign-dependent space; see [`Region::get_block`].
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: &BlockState) -> Result<()> {
        let index = self.local_index(x, y, z)?;
        let palette_index = self.palette.index_of(block);
        self.widen_if_needed();
        self.blocks.set(index, palette_index as u64)
    }

    pub fn count_non_air_blocks(&self) -> usize {
        let air_index = self
            .palette
            .position_of(&BlockState::air())
            .unwrap_or(usize::MAX);
        self.blocks.iter().filter(|&v| v as usize != air_index).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count_non_air_blocks() == 0
    }

    /// Counts how many cells hold each palette entry actually present
    /// in the region (AIR included if any cell still references it).
    pub fn count_block_types(&self) -> HashMap<BlockState, usize> {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for value in self.blocks.iter() {
            *counts.entry(value as usize).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .filter_map(|(idx, count)| self.palette.get(idx).ok().map(|state| (state.clone(), count)))
            .collect()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn block_entities(&self) -> impl Iterator<Item = (&(i32, i32, i32), &BlockEntity)> {
        self.block_entities.iter()
    }

    pub fn set_block_entity(&mut self, position: BlockPosition, block_entity: BlockEntity) {
        self.block_entities
            .insert(position.as_tuple(), block_entity);
    }

    pub fn get_block_entity(&self, position: BlockPosition) -> Option<&BlockEntity> {
        self.block_entities.get(&position.as_tuple())
    }

    pub fn remove_block_entity(&mut self, position: BlockPosition) -> Option<BlockEntity> {
        self.block_entities.remove(&position.as_tuple())
    }

    pub fn block_ticks(&self) -> &[BlockTick] {
        &self.block_ticks
    }

    pub fn fluid_ticks(&self) -> &[FluidTick] {
        &self.fluid_ticks
    }

    pub fn add_block_tick(&mut self, tick: BlockTick) {
        self.block_ticks.push(tick);
    }

    pub fn add_fluid_tick(&mut self, tick: FluidTick) {
        self.fluid_ticks.push(tick);
    }

    /// Rewrites every block through `f`. When `f` maps AIR to a
    /// non-AIR state, AIR itself stays pinned at palette index 0 and
    /// every cell that used to reference it is rewritten to whatever
    /// palette entry `f(AIR)` resolves to.
    pub fn filter(&mut self, f: impl Fn(&BlockState) -> BlockState) {
        let remap: Vec<usize> = (0..self.palette.len())
            .map(|old_idx| {
                let old_state = self.palette.get(old_idx).expect("index within bounds").clone();
                let new_state = f(&old_state);
                self.palette.index_of(&new_state)
            })
            .collect();
        self.widen_if_needed();

        for i in 0..self.blocks.len() {
            let old = self.blocks.get(i).expect("index within bounds") as usize;
            let new = remap[old];
            if new != old {
                self.blocks.set(i, new as u64).expect("remapped index fits");
            }
        }
    }

    /// Replaces every occurrence of `old` with `new`, leaving all
    /// other block states untouched.
    pub fn replace(&mut self, old: &BlockState, new: &BlockState) {
        let old = old.clone();
        let new = new.clone();
        self.filter(move |state| if state == &old { new.clone() } else { state.clone() });
    }

    /// Drops palette entries no cell references (AIR is always kept),
    /// shrinking the backing bit array's cell width where possible.
    pub fn prune(&mut self) {
        let used: HashSet<usize> = self.blocks.iter().map(|v| v as usize).collect();
        let remap = self.palette.prune(&used);

        let required = self.palette.required_bit_width();
        let mut rebuilt = BitArray::new(self.blocks.len(), required);
        for i in 0..self.blocks.len() {
            let old_idx = self.blocks.get(i).expect("index within bounds") as usize;
            let new_idx = remap[old_idx].expect("referenced entries always survive prune");
            rebuilt.set(i, new_idx as u64).expect("value fits after prune");
        }
        self.blocks = rebuilt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_region_is_all_air() {
        let region = Region::new("main", (0, 0, 0), (2, 2, 2));
        assert!(region.is_empty());
        assert_eq!(region.get_block(0, 0, 0).unwrap(), &BlockState::air());
    }

    #[test]
    fn set_and_get_block_round_trips() {
        let mut region = Region::new("main", (0, 0, 0), (4, 4, 4));
        let stone = BlockState::new("minecraft:stone");
        region.set_block(1, 2, 3, &stone).unwrap();
        assert_eq!(region.get_block(1, 2, 3).unwrap(), &stone);
        assert_eq!(region.count_non_air_blocks(), 1);
    }

    #[test]
    fn out_of_bounds_access_rejected() {
        let region = Region::new("main", (0, 0, 0), (2, 2, 2));
        assert!(region.get_block(5, 5, 5).is_err());
    }

    #[test]
    fn palette_widens_as_distinct_blocks_grow() {
        let mut region = Region::new("main", (0, 0, 0), (4, 4, 4));
        assert_eq!(region.blocks.bits(), 2);
        for i in 0..20 {
            let state = BlockState::new(format!("modid:block_{i}"));
            region.set_block(i % 4, 0, 0, &state).unwrap();
        }
        assert!(region.blocks.bits() >= 5);
        // last write should still be correctly retrievable after widening
        let last = BlockState::new("modid:block_19");
        assert_eq!(region.get_block(19 % 4, 0, 0).unwrap(), &last);
    }

    #[test]
    fn negative_size_region_round_trips() {
        let mut region = Region::new("main", (10, 10, 10), (-4, -4, -4));
        let stone = BlockState::new("minecraft:stone");
        region.set_block(-3, -3, -3, &stone).unwrap();
        assert_eq!(region.get_block(-3, -3, -3).unwrap(), &stone);
    }

    #[test]
    fn negative_size_local_bounds_match_expected_range() {
        let region = Region::new("main", (-10, -10, -10), (-10, -10, -10));
        assert_eq!(region.min_x(), -9);
        assert_eq!(region.max_x(), 0);
        assert_eq!(region.min_schem_x(), -19);
        assert_eq!(region.max_schem_x(), -10);
        assert_eq!(region.range_x(), 10);
    }

    #[test]
    fn block_positions_cover_every_cell_exactly_once() {
        let region = Region::new("main", (10, 10, 10), (-3, -3, -3));
        let positions: Vec<_> = region.block_positions().collect();
        assert_eq!(positions.len(), 27);
        assert!(positions.contains(&BlockPosition::new(-2, -2, -2)));
        assert!(positions.contains(&BlockPosition::new(0, 0, 0)));
    }

    #[test]
    fn filter_mapping_air_to_non_air_rewrites_all_air_cells() {
        let mut region = Region::new("main", (0, 0, 0), (2, 2, 2));
        let stone = BlockState::new("minecraft:stone");
        region.set_block(0, 0, 0, &stone).unwrap();

        let glass = BlockState::new("minecraft:glass");
        let glass_clone = glass.clone();
        region.filter(move |state| {
            if state.is_air() {
                glass_clone.clone()
            } else {
                state.clone()
            }
        });

        assert_eq!(region.get_block(1, 1, 1).unwrap(), &glass);
        assert_eq!(region.get_block(0, 0, 0).unwrap(), &stone);
        // AIR must still be pinned at index 0
        assert_eq!(region.palette().get(0).unwrap(), &BlockState::air());
    }

    #[test]
    fn replace_only_touches_matching_state() {
        let mut region = Region::new("main", (0, 0, 0), (2, 1, 1));
        let stone = BlockState::new("minecraft:stone");
        let dirt = BlockState::new("minecraft:dirt");
        region.set_block(0, 0, 0, &stone).unwrap();
        region.set_block(1, 0, 0, &dirt).unwrap();

        region.replace(&stone, &BlockState::new("minecraft:granite"));
        assert_eq!(region.get_block(0, 0, 0).unwrap().identifier(), "minecraft:granite");
        assert_eq!(region.get_block(1, 0, 0).unwrap(), &dirt);
    }

    #[test]
    fn prune_drops_unreferenced_palette_entries() {
        let mut region = Region::new("main", (0, 0, 0), (2, 1, 1));
        let stone = BlockState::new("minecraft:stone");
        let dirt = BlockState::new("minecraft:dirt");
        region.set_block(0, 0, 0, &stone).unwrap();
        region.set_block(0, 0, 0, &dirt).unwrap();
        assert_eq!(region.palette().len(), 3); // air, stone, dirt

        region.prune();
        assert_eq!(region.palette().len(), 2); // air, dirt
        assert_eq!(region.get_block(0, 0, 0).unwrap(), &dirt);
    }

    #[test]
    fn count_block_types_counts_every_distinct_state() {
        let mut region = Region::new("main", (0, 0, 0), (2, 1, 1));
        let stone = BlockState::new("minecraft:stone");
        region.set_block(0, 0, 0, &stone).unwrap();
        let counts = region.count_block_types();
        assert_eq!(counts.get(&stone), Some(&1));
        assert_eq!(counts.get(&BlockState::air()), Some(&1));
    }
}
