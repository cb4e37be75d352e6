use quartz_nbt::{NbtCompound, NbtTag};

/// A pending scheduled block update, carried through in the NBT
/// compound's `PendingBlockTicks` list even though the owning game
/// still has to re-derive most tick behavior on load. `block` is the
/// block state's identifier string (e.g. `minecraft:redstone_wire`),
/// matching how Litematica itself records the scheduled block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTick {
    pub block: String,
    pub priority: i32,
    pub sub_tick: i64,
    pub time: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// A pending scheduled fluid update, `PendingFluidTicks`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FluidTick {
    pub fluid: String,
    pub priority: i32,
    pub sub_tick: i64,
    pub time: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockTick {
    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("block", self.block.clone());
        compound.insert("priority", self.priority);
        compound.insert("sub_tick", self.sub_tick);
        compound.insert("time", self.time);
        compound.insert("x", self.x);
        compound.insert("y", self.y);
        compound.insert("z", self.z);
        NbtTag::Compound(compound)
    }

    pub fn from_nbt(compound: &NbtCompound) -> Option<Self> {
        Some(BlockTick {
            block: compound.get::<_, &str>("block").ok()?.to_string(),
            priority: compound.get::<_, i32>("priority").unwrap_or(0),
            sub_tick: compound.get::<_, i64>("sub_tick").unwrap_or(0),
            time: compound.get::<_, i32>("time").unwrap_or(0),
            x: compound.get::<_, i32>("x").ok()?,
            y: compound.get::<_, i32>("y").ok()?,
            z: compound.get::<_, i32>("z").ok()?,
        })
    }
}

impl FluidTick {
    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("fluid", self.fluid.clone());
        compound.insert("priority", self.priority);
        compound.insert("sub_tick", self.sub_tick);
        compound.insert("time", self.time);
        compound.insert("x", self.x);
        compound.insert("y", self.y);
        compound.insert("z", self.z);
        NbtTag::Compound(compound)
    }

    pub fn from_nbt(compound: &NbtCompound) -> Option<Self> {
        Some(FluidTick {
            fluid: compound.get::<_, &str>("fluid").ok()?.to_string(),
            priority: compound.get::<_, i32>("priority").unwrap_or(0),
            sub_tick: compound.get::<_, i64>("sub_tick").unwrap_or(0),
            time: compound.get::<_, i32>("time").unwrap_or(0),
            x: compound.get::<_, i32>("x").ok()?,
            y: compound.get::<_, i32>("y").ok()?,
            z: compound.get::<_, i32>("z").ok()?,
        })
    }
}
