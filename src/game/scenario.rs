//! Small hand-built or seeded random worlds

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

use crate::core::error::{AiError, Result};
use crate::core::types::{
    FactionId, NativeSettlementId, SettlementId, TileId, UnitId, WorkLocation,
};
use crate::game::{
    Buildable, Faction, GameState, Map, NativeSettlement, Role, Settlement, Unit, UnitLocation,
};
use crate::rules::Rules;

/// Builds a `GameState` by name, resolving every type identifier through the rules
pub struct ScenarioBuilder {
    game: GameState,
    next_faction: u32,
    next_settlement: u32,
    next_unit: u32,
    next_native: u32,
}

impl ScenarioBuilder {
    /// A map of `width` x `height` filled with one tile type, using the default rules
    pub fn new(width: i32, height: i32, fill: &str) -> Result<Self> {
        Self::with_rules(Rules::with_defaults(), width, height, fill)
    }

    pub fn with_rules(rules: Rules, width: i32, height: i32, fill: &str) -> Result<Self> {
        let fill = rules
            .tile_by_name(fill)
            .ok_or_else(|| AiError::UnknownType(fill.to_string()))?;
        let map = Map::new(width, height, fill);
        Ok(Self {
            game: GameState::new(rules, map),
            next_faction: 1,
            next_settlement: 1,
            next_unit: 1,
            next_native: 1,
        })
    }

    pub fn rules(&self) -> &Rules {
        &self.game.rules
    }

    fn tile_id(&self, x: i32, y: i32) -> Result<TileId> {
        self.game
            .map
            .tile_at(x, y)
            .ok_or_else(|| AiError::UnknownType(format!("tile ({}, {})", x, y)))
    }

    pub fn turn(&mut self, turn: u32) -> &mut Self {
        self.game.turn = turn;
        self
    }

    pub fn tile(&mut self, x: i32, y: i32, tile_type: &str) -> Result<TileId> {
        let id = self.tile_id(x, y)?;
        let tt = self
            .game
            .rules
            .tile_by_name(tile_type)
            .ok_or_else(|| AiError::UnknownType(tile_type.to_string()))?;
        if let Some(tile) = self.game.map.tile_mut(id) {
            tile.tile_type = tt;
        }
        Ok(id)
    }

    pub fn resource(&mut self, x: i32, y: i32, resource: &str) -> Result<TileId> {
        let id = self.tile_id(x, y)?;
        let r = self
            .game
            .rules
            .resource_by_name(resource)
            .ok_or_else(|| AiError::UnknownType(resource.to_string()))?;
        if let Some(tile) = self.game.map.tile_mut(id) {
            tile.resource = Some(r);
        }
        Ok(id)
    }

    pub fn improvement(&mut self, x: i32, y: i32, improvement: &str) -> Result<TileId> {
        let id = self.tile_id(x, y)?;
        let i = self
            .game
            .rules
            .improvement_by_name(improvement)
            .ok_or_else(|| AiError::UnknownType(improvement.to_string()))?;
        if let Some(tile) = self.game.map.tile_mut(id) {
            if !tile.improvements.contains(&i) {
                tile.improvements.push(i);
            }
        }
        Ok(id)
    }

    pub fn faction(&mut self, name: &str, can_found_colonies: bool) -> FactionId {
        let id = FactionId(self.next_faction);
        self.next_faction += 1;
        self.game.factions.insert(
            id,
            Faction {
                id,
                name: name.to_string(),
                can_found_colonies,
            },
        );
        id
    }

    /// Found a settlement without buildings and claim the surrounding land
    pub fn settlement(&mut self, owner: FactionId, name: &str, x: i32, y: i32) -> Result<SettlementId> {
        let tile = self.tile_id(x, y)?;
        let id = SettlementId(self.next_settlement);
        self.next_settlement += 1;
        let mut settlement = Settlement::new(id, name, owner, tile);
        settlement.coastal = self.game.map.is_coastal(tile, &self.game.rules);
        for t in std::iter::once(tile).chain(self.game.map.neighbours(tile)) {
            if let Some(tile) = self.game.map.tile_mut(t) {
                if tile.owner.is_none() {
                    tile.owner = Some(id);
                }
            }
        }
        if let Some(center) = self.game.map.tile_mut(tile) {
            center.settlement = Some(id);
        }
        self.game.settlements.insert(id, settlement);
        Ok(id)
    }

    fn settlement_mut(&mut self, id: SettlementId) -> Result<&mut Settlement> {
        self.game
            .settlements
            .get_mut(&id)
            .ok_or_else(|| AiError::UnknownType(id.to_string()))
    }

    pub fn building(&mut self, settlement: SettlementId, building: &str) -> Result<&mut Self> {
        let b = self
            .game
            .rules
            .building_by_name(building)
            .ok_or_else(|| AiError::UnknownType(building.to_string()))?;
        let rules = self.game.rules.clone();
        self.settlement_mut(settlement)?.add_building(&rules, b);
        Ok(self)
    }

    /// Give a settlement every building a new colony starts with
    pub fn starting_buildings(&mut self, settlement: SettlementId) -> Result<&mut Self> {
        let rules = self.game.rules.clone();
        let automatic: Vec<_> = rules
            .building_ids()
            .filter(|b| rules.building(*b).automatic)
            .collect();
        let s = self.settlement_mut(settlement)?;
        for b in automatic {
            s.add_building(&rules, b);
        }
        Ok(self)
    }

    pub fn stock(&mut self, settlement: SettlementId, goods: &str, amount: i32) -> Result<&mut Self> {
        let g = self
            .game
            .rules
            .goods_by_name(goods)
            .ok_or_else(|| AiError::UnknownType(goods.to_string()))?;
        self.settlement_mut(settlement)?.stockpile.set(g, amount);
        Ok(self)
    }

    pub fn build_target(&mut self, settlement: SettlementId, target: &str) -> Result<&mut Self> {
        let buildable = match (
            self.game.rules.building_by_name(target),
            self.game.rules.unit_by_name(target),
        ) {
            (Some(b), _) => Buildable::Building(b),
            (None, Some(u)) => Buildable::Unit(u),
            (None, None) => return Err(AiError::UnknownType(target.to_string())),
        };
        self.settlement_mut(settlement)?.current_build = Some(buildable);
        Ok(self)
    }

    pub fn unit(&mut self, owner: FactionId, unit_type: &str, location: UnitLocation) -> Result<UnitId> {
        let ut = self
            .game
            .rules
            .unit_by_name(unit_type)
            .ok_or_else(|| AiError::UnknownType(unit_type.to_string()))?;
        let id = UnitId(self.next_unit);
        self.next_unit += 1;
        self.game.units.insert(id, Unit::new(id, owner, ut, location));
        Ok(id)
    }

    /// A unit already working inside a settlement
    pub fn worker(&mut self, settlement: SettlementId, unit_type: &str, at: WorkLocation) -> Result<UnitId> {
        let owner = self.settlement_mut(settlement)?.owner;
        self.unit(owner, unit_type, UnitLocation::Settlement(settlement, at))
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.game
            .units
            .get_mut(&id)
            .ok_or_else(|| AiError::UnknownType(id.to_string()))
    }

    pub fn equip(&mut self, id: UnitId, role: Role) -> Result<&mut Self> {
        let unit = self.unit_mut(id)?;
        unit.role = role;
        if role == Role::Pioneer && unit.tools == 0 {
            unit.tools = 20;
        }
        Ok(self)
    }

    pub fn native_settlement(&mut self, x: i32, y: i32) -> Result<NativeSettlementId> {
        let tile = self.tile_id(x, y)?;
        let id = NativeSettlementId(self.next_native);
        self.next_native += 1;
        if let Some(t) = self.game.map.tile_mut(tile) {
            t.native_settlement = Some(id);
        }
        self.game.natives.insert(
            id,
            NativeSettlement {
                id,
                tile,
                visited_by: BTreeSet::new(),
            },
        );
        Ok(id)
    }

    pub fn build(self) -> GameState {
        self.game
    }

    /// Seeded random world with one faction, an ocean along the west edge,
    /// a few settlements with workers and a mix of free units
    pub fn random(seed: u64, settlements: usize, units: usize) -> Result<(GameState, FactionId)> {
        Self::random_with_rules(Rules::with_defaults(), seed, settlements, units)
    }

    /// As [`ScenarioBuilder::random`], with a custom rules catalog that
    /// still names the classic tile, goods and unit types
    pub fn random_with_rules(
        rules: Rules,
        seed: u64,
        settlements: usize,
        units: usize,
    ) -> Result<(GameState, FactionId)> {
        const LAND: [&str; 10] = [
            "model.tile.plains",
            "model.tile.grassland",
            "model.tile.prairie",
            "model.tile.savannah",
            "model.tile.marsh",
            "model.tile.hills",
            "model.tile.mountains",
            "model.tile.mixedForest",
            "model.tile.coniferForest",
            "model.tile.tundra",
        ];
        const RESOURCES: [&str; 5] = [
            "model.resource.grain",
            "model.resource.ore",
            "model.resource.timber",
            "model.resource.silver",
            "model.resource.game",
        ];
        const FREE_UNITS: [&str; 7] = [
            "model.unit.freeColonist",
            "model.unit.expertFarmer",
            "model.unit.hardyPioneer",
            "model.unit.seasonedScout",
            "model.unit.veteranSoldier",
            "model.unit.indenturedServant",
            "model.unit.expertOreMiner",
        ];
        const TARGETS: [&str; 3] = [
            "model.building.docks",
            "model.building.stockade",
            "model.building.schoolhouse",
        ];

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (width, height) = (24, 16);
        let mut b = ScenarioBuilder::with_rules(rules, width, height, "model.tile.plains")?;
        for y in 0..height {
            for x in 0..width {
                if x < 2 {
                    b.tile(x, y, "model.tile.ocean")?;
                } else if y == 0 || y == height - 1 {
                    b.tile(x, y, "model.tile.arctic")?;
                } else {
                    let land = LAND.choose(&mut rng).copied().unwrap_or(LAND[0]);
                    b.tile(x, y, land)?;
                    if rng.gen_bool(0.08) {
                        let resource = RESOURCES.choose(&mut rng).copied().unwrap_or(RESOURCES[0]);
                        b.resource(x, y, resource)?;
                    }
                }
            }
        }

        let faction = b.faction("Dutch", true);

        let mut sites: Vec<(i32, i32)> = Vec::new();
        let mut attempts = 0;
        while sites.len() < settlements && attempts < 500 {
            attempts += 1;
            let (x, y) = (rng.gen_range(2..width - 1), rng.gen_range(2..height - 2));
            if sites.iter().any(|(sx, sy)| (sx - x).abs().max((sy - y).abs()) < 4) {
                continue;
            }
            sites.push((x, y));
        }
        for (i, (x, y)) in sites.iter().enumerate() {
            b.tile(*x, *y, "model.tile.plains")?;
            let colony = b.settlement(faction, &format!("Colony {}", i + 1), *x, *y)?;
            b.starting_buildings(colony)?;
            b.stock(colony, "model.goods.food", rng.gen_range(0..60))?;
            b.stock(colony, "model.goods.lumber", rng.gen_range(0..80))?;
            b.stock(colony, "model.goods.horses", rng.gen_range(0..30))?;
            if rng.gen_bool(0.7) {
                let target = TARGETS.choose(&mut rng).copied().unwrap_or(TARGETS[0]);
                b.build_target(colony, target)?;
            }
            let mut tiles = b.game.work_tiles(colony);
            tiles.shuffle(&mut rng);
            let workers = rng.gen_range(1..=3).min(tiles.len());
            for tile in tiles.into_iter().take(workers) {
                b.worker(colony, "model.unit.freeColonist", WorkLocation::Tile(tile))?;
            }
        }

        for _ in 0..units {
            let (x, y) = (rng.gen_range(2..width), rng.gen_range(1..height - 1));
            let unit_type = FREE_UNITS.choose(&mut rng).copied().unwrap_or(FREE_UNITS[0]);
            let tile = b.tile_id(x, y)?;
            let id = b.unit(faction, unit_type, UnitLocation::Tile(tile))?;
            match unit_type {
                "model.unit.hardyPioneer" => {
                    b.equip(id, Role::Pioneer)?;
                }
                "model.unit.seasonedScout" => {
                    b.equip(id, Role::Scout)?;
                }
                "model.unit.veteranSoldier" => {
                    b.equip(id, Role::Soldier)?;
                }
                _ => {}
            }
        }

        let sea = b.tile_id(0, rng.gen_range(1..height - 1))?;
        let ship = b.unit(faction, "model.unit.caravel", UnitLocation::Tile(sea))?;
        b.unit(faction, "model.unit.freeColonist", UnitLocation::Aboard(ship))?;

        let (nx, ny) = (width - 3, height / 2);
        b.native_settlement(nx, ny)?;

        Ok((b.build(), faction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_names_are_errors() {
        let mut b = ScenarioBuilder::new(2, 2, "model.tile.plains").unwrap();
        assert!(matches!(
            b.tile(0, 0, "model.tile.lava"),
            Err(AiError::UnknownType(_))
        ));
        assert!(b.tile(5, 5, "model.tile.plains").is_err());
        let dutch = b.faction("Dutch", true);
        assert!(b
            .unit(dutch, "model.unit.dragon", UnitLocation::Europe)
            .is_err());
        assert!(ScenarioBuilder::new(2, 2, "model.tile.nothing").is_err());
    }

    #[test]
    fn test_settlement_claims_neighbours() {
        let mut b = ScenarioBuilder::new(5, 5, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "New Amsterdam", 2, 2).unwrap();
        let game = b.build();
        let center = game.settlement(colony).unwrap().tile;
        for t in game.map.neighbours(center) {
            assert_eq!(game.map.tile(t).unwrap().owner, Some(colony));
        }
        assert_eq!(game.map.tile(center).unwrap().settlement, Some(colony));
        assert_eq!(game.map.tile(TileId(0)).unwrap().owner, None);
    }

    #[test]
    fn test_random_is_seeded() {
        let (a, fa) = ScenarioBuilder::random(7, 3, 6).unwrap();
        let (b, fb) = ScenarioBuilder::random(7, 3, 6).unwrap();
        assert_eq!(fa, fb);
        assert_eq!(a.units.len(), b.units.len());
        assert_eq!(a.settlements.len(), b.settlements.len());
        let ta: Vec<_> = a.map.tiles().map(|t| t.tile_type).collect();
        let tb: Vec<_> = b.map.tiles().map(|t| t.tile_type).collect();
        assert_eq!(ta, tb);
        assert!(!a.settlements.is_empty());
    }
}
