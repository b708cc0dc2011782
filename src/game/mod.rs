//! In-memory game state the planner queries
//!
//! Everything here is read by the AI core and never mutated by it; worker
//! moves and construction orders are left to whoever consumes the plans.

pub mod map;
pub mod scenario;
pub mod settlement;
pub mod stockpile;
pub mod unit;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::{
    BuildingTypeId, Destination, FactionId, GoodsTypeId, NativeSettlementId, SettlementId, TileId,
    Turn, UnitId, UnitTypeId,
};
use crate::rules::{BuildingKind, Rules};

pub use map::{Map, Tile};
pub use scenario::ScenarioBuilder;
pub use settlement::{Buildable, Settlement};
pub use stockpile::Stockpile;
pub use unit::{Role, Unit, UnitLocation};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub can_found_colonies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeSettlement {
    pub id: NativeSettlementId,
    pub tile: TileId,
    /// Factions whose scouts already visited
    pub visited_by: BTreeSet<FactionId>,
}

/// Production of a tile for one goods type by one worker type
///
/// Base potential plus resource and improvement bonuses. Experts double the
/// output of the farmed goods they specialise in. A tile that cannot yield
/// the goods at all stays at zero whatever improvements it carries.
pub fn tile_potential(
    rules: &Rules,
    tile: &Tile,
    goods: GoodsTypeId,
    unit_type: Option<UnitTypeId>,
) -> i32 {
    let base = rules.tile(tile.tile_type).base_potential(goods);
    let resource = tile
        .resource
        .map(|r| rules.resource(r).bonus(goods))
        .unwrap_or(0);
    if base == 0 && resource == 0 {
        return 0;
    }
    let improvements: i32 = tile
        .improvements
        .iter()
        .map(|i| rules.improvement(*i).bonus(goods))
        .sum();
    let total = base + resource + improvements;
    match unit_type {
        Some(ut) if rules.unit(ut).is_expert_for(goods) && rules.goods(goods).is_farmed => total * 2,
        _ => total,
    }
}

/// Output of one worker in a building
pub fn building_potential(rules: &Rules, building: BuildingTypeId, unit_type: Option<UnitTypeId>) -> i32 {
    let b = rules.building(building);
    let Some(goods) = b.produces else {
        return 0;
    };
    match unit_type {
        Some(ut) if rules.unit(ut).is_expert_for(goods) => b.production_per_worker * 2,
        _ => b.production_per_worker,
    }
}

/// Travel-time estimation
pub trait TravelEstimator {
    /// Whole turns for `unit` to reach `tile`, or `None` when unreachable
    fn turns_to_reach(&self, unit: UnitId, tile: TileId) -> Option<u32>;
}

/// The whole world as seen by one turn of planning
#[derive(Debug, Clone)]
pub struct GameState {
    pub rules: Rules,
    pub map: Map,
    pub turn: Turn,
    pub factions: BTreeMap<FactionId, Faction>,
    pub settlements: BTreeMap<SettlementId, Settlement>,
    pub units: BTreeMap<UnitId, Unit>,
    pub natives: BTreeMap<NativeSettlementId, NativeSettlement>,
}

impl GameState {
    pub fn new(rules: Rules, map: Map) -> Self {
        Self {
            rules,
            map,
            turn: 1,
            factions: BTreeMap::new(),
            settlements: BTreeMap::new(),
            units: BTreeMap::new(),
            natives: BTreeMap::new(),
        }
    }

    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(&id)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn settlement(&self, id: SettlementId) -> Option<&Settlement> {
        self.settlements.get(&id)
    }

    /// Units of a faction in ascending id order
    pub fn units_of(&self, faction: FactionId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.owner == faction)
    }

    pub fn settlements_of(&self, faction: FactionId) -> impl Iterator<Item = &Settlement> {
        self.settlements.values().filter(move |s| s.owner == faction)
    }

    /// Map position of a unit; units aboard a carrier share its tile
    pub fn unit_tile(&self, id: UnitId) -> Option<TileId> {
        let mut current = self.unit(id)?;
        // Carriers do not nest, but bound the walk anyway
        for _ in 0..4 {
            match current.location {
                UnitLocation::Tile(t) => return Some(t),
                UnitLocation::Settlement(s, _) => return self.settlement(s).map(|s| s.tile),
                UnitLocation::Europe => return None,
                UnitLocation::Aboard(carrier) => current = self.unit(carrier)?,
            }
        }
        None
    }

    pub fn destination_tile(&self, destination: Destination) -> Option<TileId> {
        match destination {
            Destination::Settlement(s) => self.settlement(s).map(|s| s.tile),
            Destination::Tile(t) => self.map.tile(t).map(|t| t.id),
            Destination::Europe => None,
        }
    }

    /// Units working inside a settlement, ascending id
    pub fn settlement_workers(&self, id: SettlementId) -> Vec<&Unit> {
        self.units
            .values()
            .filter(|u| matches!(u.location, UnitLocation::Settlement(s, _) if s == id))
            .collect()
    }

    pub fn population(&self, id: SettlementId) -> u32 {
        self.settlement_workers(id).len() as u32
    }

    /// Tiles a settlement may work: adjacent, unclaimed or its own, water only with docks
    pub fn work_tiles(&self, id: SettlementId) -> Vec<TileId> {
        let Some(settlement) = self.settlement(id) else {
            return Vec::new();
        };
        let has_docks = settlement
            .building_of_kind(&self.rules, BuildingKind::Docks)
            .is_some();
        self.map
            .neighbours(settlement.tile)
            .into_iter()
            .filter(|t| {
                let Some(tile) = self.map.tile(*t) else {
                    return false;
                };
                tile.settlement.is_none()
                    && tile.native_settlement.is_none()
                    && tile.owner.map_or(true, |o| o == id)
                    && (has_docks || !self.rules.tile(tile.tile_type).is_water)
            })
            .collect()
    }

    /// Goods the centre tile yields without a worker
    pub fn center_production(&self, id: SettlementId, goods: GoodsTypeId) -> i32 {
        self.settlement(id)
            .and_then(|s| self.map.tile(s.tile))
            .map(|tile| tile_potential(&self.rules, tile, goods, None))
            .unwrap_or(0)
    }

    /// Whether `building` is the next buildable step for a settlement
    pub fn can_build(&self, id: SettlementId, building: BuildingTypeId) -> bool {
        let Some(settlement) = self.settlement(id) else {
            return false;
        };
        let bt = self.rules.building(building);
        if settlement.has_building(building) {
            return false;
        }
        let chain_ok = match bt.upgrades_from {
            Some(prev) => settlement.has_building(prev),
            None => settlement
                .building_in_chain(&self.rules, building)
                .is_none(),
        };
        chain_ok
            && self.population(id) >= bt.required_population
            && (!bt.requires_coast || settlement.coastal)
    }

    pub fn is_visited(&self, native: NativeSettlementId, faction: FactionId) -> bool {
        self.natives
            .get(&native)
            .map_or(false, |n| n.visited_by.contains(&faction))
    }
}

impl TravelEstimator for GameState {
    fn turns_to_reach(&self, unit: UnitId, tile: TileId) -> Option<u32> {
        let u = self.unit(unit)?;
        let (mover, naval) = match u.location {
            UnitLocation::Aboard(carrier) => (self.unit(carrier)?, true),
            _ => (u, u.is_naval(&self.rules)),
        };
        let start = self.unit_tile(mover.id)?;
        let steps = if naval {
            self.map.sea_steps(start, tile, &self.rules)?
        } else {
            self.map.land_steps(start, tile, &self.rules)?
        };
        let moves = self.rules.unit(mover.unit_type).moves_per_turn.max(1);
        Some(steps.div_ceil(moves))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_potential_expert_doubles_farmed() {
        let rules = Rules::with_defaults();
        let plains = rules.tile_by_name("model.tile.plains").unwrap();
        let map = Map::new(1, 1, plains);
        let tile = map.tile(TileId(0)).unwrap();
        let food = rules.well_known().food.unwrap();
        let farmer = rules.unit_by_name("model.unit.expertFarmer").unwrap();
        let colonist = rules.default_unit_type().unwrap();
        assert_eq!(tile_potential(&rules, tile, food, Some(colonist)), 5);
        assert_eq!(tile_potential(&rules, tile, food, Some(farmer)), 10);
    }

    #[test]
    fn test_improvement_does_not_create_potential() {
        let rules = Rules::with_defaults();
        let plains = rules.tile_by_name("model.tile.plains").unwrap();
        let plow = rules.improvement_by_name("model.improvement.plow").unwrap();
        let sugar = rules.goods_by_name("model.goods.sugar").unwrap();
        let food = rules.well_known().food.unwrap();
        let mut map = Map::new(1, 1, plains);
        map.tile_mut(TileId(0)).unwrap().improvements.push(plow);
        let tile = map.tile(TileId(0)).unwrap();
        assert_eq!(tile_potential(&rules, tile, sugar, None), 0);
        assert_eq!(tile_potential(&rules, tile, food, None), 6);
    }

    #[test]
    fn test_resource_grants_potential() {
        let rules = Rules::with_defaults();
        let hills = rules.tile_by_name("model.tile.hills").unwrap();
        let silver_deposit = rules.resource_by_name("model.resource.silver").unwrap();
        let silver = rules.well_known().silver.unwrap();
        let mut map = Map::new(1, 1, hills);
        map.tile_mut(TileId(0)).unwrap().resource = Some(silver_deposit);
        let tile = map.tile(TileId(0)).unwrap();
        assert_eq!(tile_potential(&rules, tile, silver, None), 2);
    }

    #[test]
    fn test_building_potential() {
        let rules = Rules::with_defaults();
        let carpenter = rules.building_by_name("model.building.carpenterHouse").unwrap();
        let master = rules.unit_by_name("model.unit.masterCarpenter").unwrap();
        let depot = rules.building_by_name("model.building.depot").unwrap();
        assert_eq!(building_potential(&rules, carpenter, None), 3);
        assert_eq!(building_potential(&rules, carpenter, Some(master)), 6);
        assert_eq!(building_potential(&rules, depot, None), 0);
    }

    #[test]
    fn test_travel_aboard_uses_carrier() {
        let mut b = ScenarioBuilder::new(8, 3, "model.tile.plains").unwrap();
        for x in 0..8 {
            b.tile(x, 0, "model.tile.ocean").unwrap();
        }
        let dutch = b.faction("Dutch", true);
        let ship = b
            .unit(dutch, "model.unit.caravel", UnitLocation::Tile(TileId(0)))
            .unwrap();
        let colonist = b
            .unit(dutch, "model.unit.freeColonist", UnitLocation::Aboard(ship))
            .unwrap();
        let walker = b
            .unit(dutch, "model.unit.freeColonist", UnitLocation::Tile(TileId(8)))
            .unwrap();
        let game = b.build();
        let port = game.map.tile_at(7, 1).unwrap();
        // Seven sea steps at four moves per turn
        assert_eq!(game.turns_to_reach(colonist, port), Some(2));
        assert_eq!(game.turns_to_reach(walker, port), Some(7));
        assert_eq!(game.unit_tile(colonist), Some(TileId(0)));
    }

    #[test]
    fn test_work_tiles_skip_water_without_docks() {
        let mut b = ScenarioBuilder::new(3, 3, "model.tile.plains").unwrap();
        b.tile(0, 0, "model.tile.ocean").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Fort Orange", 1, 1).unwrap();
        let game = b.build();
        assert_eq!(game.work_tiles(colony).len(), 7);
        assert!(game.settlement(colony).unwrap().coastal);
    }

    #[test]
    fn test_can_build_follows_chain_and_population() {
        let mut b = ScenarioBuilder::new(3, 3, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Fort Orange", 1, 1).unwrap();
        b.building(colony, "model.building.stockade").unwrap();
        let game = b.build();
        let rules = &game.rules;
        let stockade = rules.building_by_name("model.building.stockade").unwrap();
        let fort = rules.building_by_name("model.building.fort").unwrap();
        let fortress = rules.building_by_name("model.building.fortress").unwrap();
        assert!(!game.can_build(colony, stockade));
        assert!(!game.can_build(colony, fortress));
        // Fort needs four colonists
        assert!(!game.can_build(colony, fort));
    }
}
