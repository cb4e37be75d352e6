use crate::bounding_box::BoundingBox;
use crate::discriminating_map::DiscriminatingMap;
use crate::error::Result;
use crate::formats::{litematic, metadata};
use crate::region::Region;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Descriptive, non-geometric information about a schematic: name,
/// authorship, the Litematica format/subversion, Minecraft data
/// version, timestamps and an optional 140x140 ARGB preview image.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub mc_data_version: Option<i32>,
    pub lm_version: i32,
    pub lm_subversion: i32,
    pub time_created: Option<i64>,
    pub time_modified: Option<i64>,
    pub preview: Option<Vec<u32>>,
    /// Region count recorded in the file at save time, readable via
    /// [`Schematic::load_metadata`] without decoding any region.
    pub region_count: Option<i32>,
    pub total_volume: Option<i32>,
    pub total_blocks: Option<i32>,
    pub enclosing_size: Option<(i32, i32, i32)>,
}

impl Metadata {
    pub fn new() -> Self {
        Metadata {
            lm_version: 6,
            lm_subversion: 1,
            ..Default::default()
        }
    }
}

/// An aggregate of named [`Region`]s plus [`Metadata`], the unit a
/// `.litematic` file round-trips.
pub struct Schematic {
    regions: DiscriminatingMap<String, Region>,
    pub metadata: Metadata,
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

impl Schematic {
    pub fn new(name: impl Into<String>) -> Self {
        let mut metadata = Metadata::new();
        metadata.name = Some(name.into());
        Schematic {
            regions: DiscriminatingMap::new(|_, _: &Region| (true, String::new())),
            metadata,
        }
    }

    pub fn add_region(&mut self, region: Region) -> Result<()> {
        self.regions.insert(region.name().to_string(), region)?;
        Ok(())
    }

    pub fn remove_region(&mut self, name: &str) -> Option<Region> {
        self.regions.remove(&name.to_string())
    }

    pub fn get_region(&self, name: &str) -> Option<&Region> {
        self.regions.get(&name.to_string())
    }

    pub fn get_region_mut(&mut self, name: &str) -> Option<&mut Region> {
        self.regions.get_mut(&name.to_string())
    }

    pub fn region_names(&self) -> impl Iterator<Item = &String> {
        self.regions.keys()
    }

    pub fn regions(&self) -> impl Iterator<Item = (&String, &Region)> {
        self.regions.iter()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn total_blocks(&self) -> usize {
        self.regions.iter().map(|(_, r)| r.count_non_air_blocks()).sum()
    }

    pub fn total_volume(&self) -> usize {
        self.regions.iter().map(|(_, r)| r.volume()).sum()
    }

    /// The union bounding box of every region's schematic-space
    /// extent, or `None` when there are no regions.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.regions
            .iter()
            .map(|(_, r)| r.bounding_box())
            .reduce(|a, b| a.union(&b))
    }

    /// `(width, height, length)` of the union bounding box, `(0, 0, 0)`
    /// when there are no regions.
    pub fn dimensions(&self) -> (i32, i32, i32) {
        self.bounding_box()
            .map(|bbox| bbox.get_dimensions())
            .unwrap_or((0, 0, 0))
    }

    pub fn prune(&mut self) {
        for name in self.regions.keys().cloned().collect::<Vec<_>>() {
            if let Some(region) = self.regions.get_mut(&name) {
                region.prune();
            }
        }
    }

    /// Encodes and gzip-compresses to `path` at the default compression
    /// level, writing through a `.tmp` sibling and renaming over the
    /// destination so a crash mid-write never leaves a half-written
    /// file in place.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.save_with_compression(path, litematic::DEFAULT_COMPRESSION)
    }

    pub fn save_with_compression(
        &mut self,
        path: impl AsRef<Path>,
        compression: flate2::Compression,
    ) -> Result<()> {
        let path = path.as_ref();
        log::debug!("saving schematic to {}", path.display());
        self.prune();

        let now = now_millis();
        if self.metadata.time_created.is_none() {
            self.metadata.time_created = Some(now);
        }
        self.metadata.time_modified = Some(now);

        let bytes = litematic::to_litematic_with_compression(self, compression)?;

        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, &bytes)?;
        std::fs::rename(&tmp_path, path)?;
        log::debug!("saved schematic to {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading schematic from {}", path.display());
        let bytes = std::fs::read(path)?;
        let schematic = litematic::from_litematic(&bytes)?;
        log::debug!("loaded schematic from {}", path.display());
        Ok(schematic)
    }

    /// Reads only the metadata block of a `.litematic` file, skipping
    /// region construction entirely.
    pub fn load_metadata(path: impl AsRef<Path>) -> Result<Metadata> {
        let bytes = std::fs::read(path.as_ref())?;
        metadata::read_metadata(&bytes)
    }
}

impl std::fmt::Debug for Schematic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schematic")
            .field("name", &self.metadata.name)
            .field("region_count", &self.region_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_state::BlockState;

    #[test]
    fn new_schematic_has_no_regions() {
        let schematic = Schematic::new("test");
        assert_eq!(schematic.region_count(), 0);
        assert_eq!(schematic.dimensions(), (0, 0, 0));
    }

    #[test]
    fn dimensions_reflect_union_of_regions() {
        let mut schematic = Schematic::new("test");
        schematic.add_region(Region::new("a", (0, 0, 0), (4, 4, 4))).unwrap();
        schematic.add_region(Region::new("b", (10, 0, 0), (2, 2, 2))).unwrap();
        // union spans x: 0..=11
        assert_eq!(schematic.dimensions(), (12, 4, 4));
    }

    #[test]
    fn total_blocks_sums_across_regions() {
        let mut schematic = Schematic::new("test");
        let mut region = Region::new("a", (0, 0, 0), (2, 2, 2));
        region.set_block(0, 0, 0, &BlockState::new("minecraft:stone")).unwrap();
        schematic.add_region(region).unwrap();
        assert_eq!(schematic.total_blocks(), 1);
    }
}
