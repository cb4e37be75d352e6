use crate::entity::NbtValue;
use crate::error::{Result, SchematicError};
use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A "tile entity": arbitrary NBT data attached to a single block
/// position (chests, signs, spawners, ...). Position is stored
/// separately by the owning region; this struct only carries the
/// identifier and the payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockEntity {
    pub id: String,
    pub nbt: HashMap<String, NbtValue>,
}

impl BlockEntity {
    pub fn new(id: impl Into<String>) -> Self {
        BlockEntity {
            id: id.into(),
            nbt: HashMap::new(),
        }
    }

    pub fn with_nbt_data(mut self, key: impl Into<String>, value: String) -> Self {
        self.nbt.insert(key.into(), NbtValue::String(value));
        self
    }

    /// Serializes `id` plus `nbt` fields, and `x`/`y`/`z` at the given
    /// local position (already relative to the owning region's origin).
    pub fn to_nbt(&self, local: (i32, i32, i32)) -> NbtTag {
        let mut compound = NbtCompound::new();
        let full_id = if self.id.starts_with("minecraft:") {
            self.id.clone()
        } else {
            format!("minecraft:{}", self.id)
        };
        compound.insert("id", NbtTag::String(full_id));
        compound.insert("x", NbtTag::Int(local.0));
        compound.insert("y", NbtTag::Int(local.1));
        compound.insert("z", NbtTag::Int(local.2));
        for (key, value) in &self.nbt {
            compound.insert(key, crate::entity::value_to_nbt_tag(value));
        }
        NbtTag::Compound(compound)
    }

    /// Returns the decoded entity together with its local position.
    pub fn from_nbt(nbt: &NbtCompound) -> Result<(Self, (i32, i32, i32))> {
        let id = nbt
            .get::<_, &str>("id")
            .map_err(|_| SchematicError::RequiredKeyMissing("id".to_string()))?
            .to_string();
        let id = if id.starts_with("minecraft:") {
            id
        } else {
            format!("minecraft:{}", id)
        };

        let x = nbt
            .get::<_, i32>("x")
            .map_err(|_| SchematicError::RequiredKeyMissing("x".to_string()))?;
        let y = nbt
            .get::<_, i32>("y")
            .map_err(|_| SchematicError::RequiredKeyMissing("y".to_string()))?;
        let z = nbt
            .get::<_, i32>("z")
            .map_err(|_| SchematicError::RequiredKeyMissing("z".to_string()))?;

        let mut nbt_map = HashMap::new();
        for (key, value) in nbt.inner() {
            match key.as_str() {
                "id" | "x" | "y" | "z" => continue,
                _ => {
                    nbt_map.insert(key.clone(), crate::entity::nbt_tag_to_value(value));
                }
            }
        }

        Ok((
            BlockEntity {
                id,
                nbt: nbt_map,
            },
            (x, y, z),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_position_and_fields() {
        let entity = BlockEntity::new("minecraft:chest").with_nbt_data("CustomName", "Loot".to_string());
        let nbt = entity.to_nbt((1, 2, 3));
        if let NbtTag::Compound(compound) = nbt {
            let (decoded, pos) = BlockEntity::from_nbt(&compound).unwrap();
            assert_eq!(decoded, entity);
            assert_eq!(pos, (1, 2, 3));
        } else {
            panic!("expected compound");
        }
    }

    #[test]
    fn missing_id_rejected() {
        let mut compound = NbtCompound::new();
        compound.insert("x", NbtTag::Int(0));
        compound.insert("y", NbtTag::Int(0));
        compound.insert("z", NbtTag::Int(0));
        assert!(BlockEntity::from_nbt(&compound).is_err());
    }
}
