//! Read/write engine for the Litematica `.litematic` schematic format:
//! palette-compressed, bit-packed block storage organized into named
//! regions, wrapped in a gzip-compressed NBT document.

pub mod bit_array;
pub mod block_entity;
pub mod block_position;
pub mod block_state;
pub mod bounding_box;
pub mod coord_system;
pub mod discriminating_map;
pub mod entity;
pub mod error;
pub mod formats;
pub mod palette;
pub mod region;
pub mod schematic;
pub mod tick;

pub use bit_array::BitArray;
pub use block_entity::BlockEntity;
pub use block_position::BlockPosition;
pub use block_state::BlockState;
pub use bounding_box::BoundingBox;
pub use coord_system::CoordSystem;
pub use discriminating_map::DiscriminatingMap;
pub use entity::{Entity, NbtValue};
pub use error::{Result, SchematicError};
pub use palette::Palette;
pub use region::Region;
pub use schematic::{Metadata, Schematic};
pub use tick::{BlockTick, FluidTick};
