use crate::error::{Result, SchematicError};
use crate::formats::litematic::{decode_root, parse_metadata};
use crate::schematic::{Metadata, Schematic};

/// Reads just the `Version`/`SubVersion`/`MinecraftDataVersion`/`Metadata`
/// tags of a `.litematic` file without decoding `Regions`, for callers
/// that only want name/author/preview plus the region count, totals and
/// enclosing size recorded at save time, and don't need the block data.
pub fn read_metadata(data: &[u8]) -> Result<Metadata> {
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

    Ok(schematic.metadata)
}
