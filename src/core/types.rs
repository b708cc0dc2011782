//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Game turn counter
pub type Turn = u32;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn new(id: u32) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Unique identifier for factions (European players)
    FactionId,
    "faction"
);
id_type!(
    /// Unique identifier for map tiles
    TileId,
    "tile"
);
id_type!(
    /// Unique identifier for units
    UnitId,
    "unit"
);
id_type!(
    /// Unique identifier for player settlements
    SettlementId,
    "colony"
);
id_type!(NativeSettlementId, "native");
id_type!(
    /// Handle of a wish inside a faction's planning registry
    WishId,
    "wish"
);
id_type!(
    /// Handle of a tile improvement plan
    PlanId,
    "tileimprovementplan"
);
id_type!(
    /// Handle of a goods parcel in transit
    GoodsId,
    "goods"
);

/// Index of a goods type in the rules catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoodsTypeId(pub u16);

/// Index of a building type in the rules catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingTypeId(pub u16);

/// Index of a unit type in the rules catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitTypeId(pub u16);

/// Index of a tile type in the rules catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileTypeId(pub u16);

/// Index of a natural resource type in the rules catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceTypeId(pub u16);

/// Index of a tile improvement type in the rules catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImprovementTypeId(pub u16);

/// Where a worker produces goods inside a settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkLocation {
    /// A single-occupant colony tile
    Tile(TileId),
    /// A building slot, identified by the building's current type
    Building(BuildingTypeId),
}

impl WorkLocation {
    pub fn is_tile(&self) -> bool {
        matches!(self, WorkLocation::Tile(_))
    }

    pub fn tile(&self) -> Option<TileId> {
        match self {
            WorkLocation::Tile(t) => Some(*t),
            WorkLocation::Building(_) => None,
        }
    }
}

/// Something a wish, treasure or unit can travel towards
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Destination {
    Settlement(SettlementId),
    Tile(TileId),
    /// Off-map market; has no physical tile
    Europe,
}
