//! Static rules catalog: goods, buildings, units, tiles and improvements

pub mod catalog;
mod defaults;
mod loader;

pub use catalog::{
    BuildingKind, BuildingType, GoodsType, ImprovementType, ResourceType, Rules, TileType,
    TypeRef, UnitType, WellKnownGoods,
};
pub use loader::{load_rules_file, load_rules_toml, RulesLoadError};
