//! Static type catalog - goods, buildings, units, tiles and improvements
//!
//! The catalog is read-only during planning. Types are resolved from their
//! identifier strings once (`goods_by_name`, `unit_by_name`, ...) and then
//! referenced by small copyable indices.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{
    BuildingTypeId, GoodsTypeId, ImprovementTypeId, ResourceTypeId, TileTypeId, UnitTypeId,
};

/// A kind of goods
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoodsType {
    pub id: String,
    pub name: String,
    pub is_food: bool,
    /// Produced on tiles rather than in buildings
    pub is_farmed: bool,
    pub is_storable: bool,
    /// Liberty bells
    pub is_liberty: bool,
    /// Consumed by construction (hammers)
    pub is_building_material: bool,
    pub is_military: bool,
    /// Raw input this good is manufactured from
    pub made_from: Option<GoodsTypeId>,
    /// Market value of one unit
    pub price: i32,
}

/// Fixed structure categories the colony planner reasons about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    TownHall,
    Carpentry,
    Blacksmith,
    Armory,
    Docks,
    CustomsHouse,
    Stable,
    Stockade,
    Schoolhouse,
    Warehouse,
    Manufacture,
    #[default]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingType {
    pub id: String,
    pub name: String,
    pub kind: BuildingKind,
    pub level: u8,
    pub upgrades_to: Option<BuildingTypeId>,
    pub upgrades_from: Option<BuildingTypeId>,
    pub produces: Option<GoodsTypeId>,
    pub consumes: Option<GoodsTypeId>,
    /// Number of worker slots
    pub workplaces: u32,
    /// Output of one non-expert worker per turn
    pub production_per_worker: i32,
    pub required_population: u32,
    pub required_goods: Vec<(GoodsTypeId, i32)>,
    /// Only buildable in a coastal settlement
    pub requires_coast: bool,
    /// Extra warehouse capacity granted
    pub storage_bonus: i32,
    /// Present in every newly founded settlement
    pub automatic: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitType {
    pub id: String,
    pub name: String,
    pub expert_production: Option<GoodsTypeId>,
    /// Can be promoted to the matching expert by working
    pub learns_by_experience: bool,
    /// This expert can be reached by experience
    pub learnable_by_experience: bool,
    pub offence: i32,
    pub defence: i32,
    pub can_found_colony: bool,
    pub carries_treasure: bool,
    /// Expert scouting ability independent of equipment
    pub expert_scout: bool,
    pub expert_soldier: bool,
    pub naval: bool,
    pub cargo_slots: u32,
    pub moves_per_turn: u32,
    pub required_goods: Vec<(GoodsTypeId, i32)>,
    /// The plain colonist type
    pub is_default: bool,
}

impl UnitType {
    pub fn is_expert(&self) -> bool {
        self.expert_production.is_some()
    }

    pub fn is_expert_for(&self, goods: GoodsTypeId) -> bool {
        self.expert_production == Some(goods)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileType {
    pub id: String,
    pub name: String,
    /// Base production per goods type for a non-expert worker
    pub potentials: Vec<(GoodsTypeId, i32)>,
    pub is_water: bool,
    pub is_arctic: bool,
    pub can_settle: bool,
    pub is_forest: bool,
}

impl TileType {
    pub fn base_potential(&self, goods: GoodsTypeId) -> i32 {
        self.potentials
            .iter()
            .find(|(g, _)| *g == goods)
            .map(|(_, amount)| *amount)
            .unwrap_or(0)
    }
}

/// A natural resource bound to a tile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: String,
    pub name: String,
    pub bonuses: Vec<(GoodsTypeId, i32)>,
}

impl ResourceType {
    pub fn bonus(&self, goods: GoodsTypeId) -> i32 {
        self.bonuses
            .iter()
            .find(|(g, _)| *g == goods)
            .map(|(_, b)| *b)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImprovementType {
    pub id: String,
    pub name: String,
    pub bonuses: Vec<(GoodsTypeId, i32)>,
    /// Empty means any land tile
    pub allowed_on: Vec<TileTypeId>,
    pub is_road: bool,
    pub expended_tools: i32,
}

impl ImprovementType {
    pub fn bonus(&self, goods: GoodsTypeId) -> i32 {
        self.bonuses
            .iter()
            .find(|(g, _)| *g == goods)
            .map(|(_, b)| *b)
            .unwrap_or(0)
    }

    pub fn allowed(&self, tile_type: TileTypeId, tile: &TileType) -> bool {
        if tile.is_water {
            return false;
        }
        self.allowed_on.is_empty() || self.allowed_on.contains(&tile_type)
    }
}

/// Reference to any catalog entry, used by the name index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    Goods(GoodsTypeId),
    Building(BuildingTypeId),
    Unit(UnitTypeId),
    Tile(TileTypeId),
    Resource(ResourceTypeId),
    Improvement(ImprovementTypeId),
}

/// Goods types the planner treats specially, resolved once per catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct WellKnownGoods {
    pub food: Option<GoodsTypeId>,
    pub bells: Option<GoodsTypeId>,
    pub lumber: Option<GoodsTypeId>,
    pub hammers: Option<GoodsTypeId>,
    pub ore: Option<GoodsTypeId>,
    pub tools: Option<GoodsTypeId>,
    pub muskets: Option<GoodsTypeId>,
    pub silver: Option<GoodsTypeId>,
    pub horses: Option<GoodsTypeId>,
}

/// The rules catalog
#[derive(Debug, Clone, Default)]
pub struct Rules {
    goods: Vec<GoodsType>,
    buildings: Vec<BuildingType>,
    units: Vec<UnitType>,
    tiles: Vec<TileType>,
    resources: Vec<ResourceType>,
    improvements: Vec<ImprovementType>,
    by_name: AHashMap<String, TypeRef>,
    well_known: WellKnownGoods,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_goods(&mut self, goods: GoodsType) -> GoodsTypeId {
        let id = GoodsTypeId(self.goods.len() as u16);
        self.by_name.insert(goods.id.clone(), TypeRef::Goods(id));
        self.goods.push(goods);
        self.refresh_well_known();
        id
    }

    /// Set the raw input of an already registered goods type
    pub fn set_made_from(&mut self, id: GoodsTypeId, from: Option<GoodsTypeId>) {
        self.goods[id.0 as usize].made_from = from;
    }

    /// Register a building type; links `upgrades_from` on its predecessor chain
    pub fn add_building(&mut self, building: BuildingType) -> BuildingTypeId {
        let id = BuildingTypeId(self.buildings.len() as u16);
        self.by_name.insert(building.id.clone(), TypeRef::Building(id));
        let from = building.upgrades_from;
        self.buildings.push(building);
        if let Some(prev) = from {
            self.buildings[prev.0 as usize].upgrades_to = Some(id);
        }
        id
    }

    pub fn add_unit(&mut self, unit: UnitType) -> UnitTypeId {
        let id = UnitTypeId(self.units.len() as u16);
        self.by_name.insert(unit.id.clone(), TypeRef::Unit(id));
        self.units.push(unit);
        id
    }

    pub fn add_tile(&mut self, tile: TileType) -> TileTypeId {
        let id = TileTypeId(self.tiles.len() as u16);
        self.by_name.insert(tile.id.clone(), TypeRef::Tile(id));
        self.tiles.push(tile);
        id
    }

    pub fn add_resource(&mut self, resource: ResourceType) -> ResourceTypeId {
        let id = ResourceTypeId(self.resources.len() as u16);
        self.by_name.insert(resource.id.clone(), TypeRef::Resource(id));
        self.resources.push(resource);
        id
    }

    pub fn add_improvement(&mut self, improvement: ImprovementType) -> ImprovementTypeId {
        let id = ImprovementTypeId(self.improvements.len() as u16);
        self.by_name.insert(improvement.id.clone(), TypeRef::Improvement(id));
        self.improvements.push(improvement);
        id
    }

    fn refresh_well_known(&mut self) {
        let find = |name: &str| match self.by_name.get(name) {
            Some(TypeRef::Goods(id)) => Some(*id),
            _ => None,
        };
        let flagged = |pred: fn(&GoodsType) -> bool| {
            self.goods
                .iter()
                .position(pred)
                .map(|i| GoodsTypeId(i as u16))
        };
        self.well_known = WellKnownGoods {
            food: flagged(|g| g.is_food),
            bells: flagged(|g| g.is_liberty),
            hammers: flagged(|g| g.is_building_material),
            muskets: flagged(|g| g.is_military),
            lumber: find("model.goods.lumber"),
            ore: find("model.goods.ore"),
            tools: find("model.goods.tools"),
            silver: find("model.goods.silver"),
            horses: find("model.goods.horses"),
        };
    }

    pub fn well_known(&self) -> &WellKnownGoods {
        &self.well_known
    }

    // === LOOKUPS ===

    pub fn lookup(&self, name: &str) -> Option<TypeRef> {
        self.by_name.get(name).copied()
    }

    pub fn goods_by_name(&self, name: &str) -> Option<GoodsTypeId> {
        match self.lookup(name) {
            Some(TypeRef::Goods(id)) => Some(id),
            _ => None,
        }
    }

    pub fn building_by_name(&self, name: &str) -> Option<BuildingTypeId> {
        match self.lookup(name) {
            Some(TypeRef::Building(id)) => Some(id),
            _ => None,
        }
    }

    pub fn unit_by_name(&self, name: &str) -> Option<UnitTypeId> {
        match self.lookup(name) {
            Some(TypeRef::Unit(id)) => Some(id),
            _ => None,
        }
    }

    pub fn tile_by_name(&self, name: &str) -> Option<TileTypeId> {
        match self.lookup(name) {
            Some(TypeRef::Tile(id)) => Some(id),
            _ => None,
        }
    }

    pub fn resource_by_name(&self, name: &str) -> Option<ResourceTypeId> {
        match self.lookup(name) {
            Some(TypeRef::Resource(id)) => Some(id),
            _ => None,
        }
    }

    pub fn improvement_by_name(&self, name: &str) -> Option<ImprovementTypeId> {
        match self.lookup(name) {
            Some(TypeRef::Improvement(id)) => Some(id),
            _ => None,
        }
    }

    pub fn goods(&self, id: GoodsTypeId) -> &GoodsType {
        &self.goods[id.0 as usize]
    }

    pub fn building(&self, id: BuildingTypeId) -> &BuildingType {
        &self.buildings[id.0 as usize]
    }

    pub fn unit(&self, id: UnitTypeId) -> &UnitType {
        &self.units[id.0 as usize]
    }

    pub fn tile(&self, id: TileTypeId) -> &TileType {
        &self.tiles[id.0 as usize]
    }

    pub fn resource(&self, id: ResourceTypeId) -> &ResourceType {
        &self.resources[id.0 as usize]
    }

    pub fn improvement(&self, id: ImprovementTypeId) -> &ImprovementType {
        &self.improvements[id.0 as usize]
    }

    pub fn goods_ids(&self) -> impl Iterator<Item = GoodsTypeId> {
        (0..self.goods.len()).map(|i| GoodsTypeId(i as u16))
    }

    pub fn building_ids(&self) -> impl Iterator<Item = BuildingTypeId> {
        (0..self.buildings.len()).map(|i| BuildingTypeId(i as u16))
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = UnitTypeId> {
        (0..self.units.len()).map(|i| UnitTypeId(i as u16))
    }

    pub fn improvement_ids(&self) -> impl Iterator<Item = ImprovementTypeId> {
        (0..self.improvements.len()).map(|i| ImprovementTypeId(i as u16))
    }

    // === DERIVED QUERIES ===

    /// The goods manufactured from `raw`, if any
    pub fn made_into(&self, raw: GoodsTypeId) -> Option<GoodsTypeId> {
        self.goods
            .iter()
            .position(|g| g.made_from == Some(raw))
            .map(|i| GoodsTypeId(i as u16))
    }

    /// Raw goods that some other goods type is manufactured from
    pub fn is_transformable(&self, raw: GoodsTypeId) -> bool {
        self.made_into(raw).is_some()
    }

    /// The plain colonist type used to estimate potentials
    pub fn default_unit_type(&self) -> Option<UnitTypeId> {
        self.units
            .iter()
            .position(|u| u.is_default)
            .map(|i| UnitTypeId(i as u16))
    }

    /// The expert for a goods type
    pub fn expert_for(&self, goods: GoodsTypeId) -> Option<UnitTypeId> {
        self.units
            .iter()
            .position(|u| u.expert_production == Some(goods))
            .map(|i| UnitTypeId(i as u16))
    }

    /// Whether `unit` is one experience upgrade away from being an expert at `goods`
    pub fn upgrades_to_expert(&self, unit: UnitTypeId, goods: GoodsTypeId) -> bool {
        if !self.unit(unit).learns_by_experience {
            return false;
        }
        self.expert_for(goods)
            .map(|expert| self.unit(expert).learnable_by_experience)
            .unwrap_or(false)
    }

    /// Level-one building types of a kind (roots of upgrade chains)
    pub fn base_building_of_kind(&self, kind: BuildingKind) -> Option<BuildingTypeId> {
        self.buildings
            .iter()
            .position(|b| b.kind == kind && b.upgrades_from.is_none())
            .map(|i| BuildingTypeId(i as u16))
    }

    /// Base building type producing `goods`
    pub fn building_producing(&self, goods: GoodsTypeId) -> Option<BuildingTypeId> {
        self.buildings
            .iter()
            .position(|b| b.produces == Some(goods) && b.upgrades_from.is_none())
            .map(|i| BuildingTypeId(i as u16))
    }

    /// Whether `later` is `earlier` or one of its upgrades
    pub fn is_same_chain(&self, earlier: BuildingTypeId, later: BuildingTypeId) -> bool {
        let mut current = Some(earlier);
        while let Some(id) = current {
            if id == later {
                return true;
            }
            current = self.building(id).upgrades_to;
        }
        false
    }

    /// Root of the upgrade chain containing `id`
    pub fn chain_root(&self, id: BuildingTypeId) -> BuildingTypeId {
        let mut current = id;
        while let Some(prev) = self.building(current).upgrades_from {
            current = prev;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup_is_typed() {
        let rules = Rules::with_defaults();
        assert!(rules.goods_by_name("model.goods.food").is_some());
        assert!(rules.unit_by_name("model.goods.food").is_none());
        assert!(rules.unit_by_name("model.unit.freeColonist").is_some());
        assert!(rules.goods_by_name("model.goods.unobtainium").is_none());
    }

    #[test]
    fn test_well_known_goods_resolved() {
        let rules = Rules::with_defaults();
        let wk = rules.well_known();
        assert!(wk.food.is_some());
        assert!(wk.bells.is_some());
        assert_eq!(wk.hammers.map(|h| rules.goods(h).made_from), Some(wk.lumber));
        assert_eq!(wk.tools.map(|t| rules.goods(t).made_from), Some(wk.ore));
        assert_eq!(wk.muskets.map(|m| rules.goods(m).made_from), Some(wk.tools));
    }

    #[test]
    fn test_upgrade_chain_links_both_ways() {
        let rules = Rules::with_defaults();
        let stockade = rules.building_by_name("model.building.stockade").unwrap();
        let fort = rules.building_by_name("model.building.fort").unwrap();
        let fortress = rules.building_by_name("model.building.fortress").unwrap();
        assert_eq!(rules.building(stockade).upgrades_to, Some(fort));
        assert_eq!(rules.building(fortress).upgrades_from, Some(fort));
        assert!(rules.is_same_chain(stockade, fortress));
        assert!(!rules.is_same_chain(fortress, stockade));
        assert_eq!(rules.chain_root(fortress), stockade);
    }

    #[test]
    fn test_experience_upgrade() {
        let rules = Rules::with_defaults();
        let colonist = rules.unit_by_name("model.unit.freeColonist").unwrap();
        let farmer = rules.unit_by_name("model.unit.expertFarmer").unwrap();
        let food = rules.well_known().food.unwrap();
        let bells = rules.well_known().bells.unwrap();
        assert!(rules.upgrades_to_expert(colonist, food));
        assert!(!rules.upgrades_to_expert(colonist, bells));
        assert!(!rules.upgrades_to_expert(farmer, food));
    }

    #[test]
    fn test_made_into() {
        let rules = Rules::with_defaults();
        let sugar = rules.goods_by_name("model.goods.sugar").unwrap();
        let rum = rules.goods_by_name("model.goods.rum").unwrap();
        let silver = rules.goods_by_name("model.goods.silver").unwrap();
        assert_eq!(rules.made_into(sugar), Some(rum));
        assert!(!rules.is_transformable(silver));
    }
}
