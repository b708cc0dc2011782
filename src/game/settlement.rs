//! Settlements owned by a faction

use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingTypeId, FactionId, GoodsTypeId, SettlementId, TileId, UnitTypeId};
use crate::game::stockpile::Stockpile;
use crate::rules::{BuildingKind, Rules};

/// Something a settlement can construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Buildable {
    Building(BuildingTypeId),
    Unit(UnitTypeId),
}

impl Buildable {
    pub fn required_goods<'a>(&self, rules: &'a Rules) -> &'a [(GoodsTypeId, i32)] {
        match self {
            Buildable::Building(b) => &rules.building(*b).required_goods,
            Buildable::Unit(u) => &rules.unit(*u).required_goods,
        }
    }

    pub fn name<'a>(&self, rules: &'a Rules) -> &'a str {
        match self {
            Buildable::Building(b) => &rules.building(*b).name,
            Buildable::Unit(u) => &rules.unit(*u).name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,
    pub name: String,
    pub owner: FactionId,
    /// Centre tile
    pub tile: TileId,
    /// Every building level present, one entry per upgrade chain
    pub buildings: Vec<BuildingTypeId>,
    pub stockpile: Stockpile,
    pub current_build: Option<Buildable>,
    pub coastal: bool,
}

impl Settlement {
    pub fn new(id: SettlementId, name: impl Into<String>, owner: FactionId, tile: TileId) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            tile,
            buildings: Vec::new(),
            stockpile: Stockpile::new(),
            current_build: None,
            coastal: false,
        }
    }

    pub fn has_building(&self, building: BuildingTypeId) -> bool {
        self.buildings.contains(&building)
    }

    /// The present level of the upgrade chain rooted at `root`
    pub fn building_in_chain(&self, rules: &Rules, root: BuildingTypeId) -> Option<BuildingTypeId> {
        self.buildings
            .iter()
            .copied()
            .find(|b| rules.chain_root(*b) == root)
    }

    pub fn building_of_kind(&self, rules: &Rules, kind: BuildingKind) -> Option<BuildingTypeId> {
        self.buildings
            .iter()
            .copied()
            .find(|b| rules.building(*b).kind == kind)
    }

    /// A building present here that produces `goods`
    pub fn building_for(&self, rules: &Rules, goods: GoodsTypeId) -> Option<BuildingTypeId> {
        self.buildings
            .iter()
            .copied()
            .find(|b| rules.building(*b).produces == Some(goods))
    }

    /// Add a building, replacing the lower level of its chain
    pub fn add_building(&mut self, rules: &Rules, building: BuildingTypeId) {
        let root = rules.chain_root(building);
        self.buildings.retain(|b| rules.chain_root(*b) != root);
        self.buildings.push(building);
        self.buildings.sort();
        self.refresh_capacity(rules);
    }

    /// Recompute warehouse capacity from storage buildings
    pub fn refresh_capacity(&mut self, rules: &Rules) {
        let capacity = self
            .buildings
            .iter()
            .map(|b| rules.building(*b).storage_bonus)
            .sum();
        self.stockpile.set_capacity(capacity);
    }

    /// Horses bred per turn; breeding needs a pair
    pub fn horse_production(&self, rules: &Rules) -> i32 {
        let Some(horses) = rules.well_known().horses else {
            return 0;
        };
        let stock = self.stockpile.get(horses);
        if stock < 2 {
            0
        } else {
            1 + stock / 25
        }
    }

    /// Goods still missing for the current construction target
    pub fn build_shortfall(&self, rules: &Rules) -> Vec<(GoodsTypeId, i32)> {
        self.current_build
            .map(|target| self.stockpile.missing(target.required_goods(rules)))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settlement() -> Settlement {
        Settlement::new(SettlementId(1), "Jamestown", FactionId(1), TileId(0))
    }

    #[test]
    fn test_add_building_replaces_lower_level() {
        let rules = Rules::with_defaults();
        let depot = rules.building_by_name("model.building.depot").unwrap();
        let warehouse = rules.building_by_name("model.building.warehouse").unwrap();
        let mut s = settlement();
        s.add_building(&rules, depot);
        assert_eq!(s.stockpile.capacity(), 100);
        s.add_building(&rules, warehouse);
        assert_eq!(s.buildings, vec![warehouse]);
        assert_eq!(s.stockpile.capacity(), 200);
        assert_eq!(s.building_in_chain(&rules, depot), Some(warehouse));
        assert_eq!(s.building_of_kind(&rules, BuildingKind::Warehouse), Some(warehouse));
    }

    #[test]
    fn test_horse_breeding_needs_pair() {
        let rules = Rules::with_defaults();
        let horses = rules.well_known().horses.unwrap();
        let mut s = settlement();
        s.stockpile.set(horses, 1);
        assert_eq!(s.horse_production(&rules), 0);
        s.stockpile.set(horses, 50);
        assert_eq!(s.horse_production(&rules), 3);
    }

    #[test]
    fn test_build_shortfall() {
        let rules = Rules::with_defaults();
        let hammers = rules.well_known().hammers.unwrap();
        let tools = rules.well_known().tools.unwrap();
        let school = rules.building_by_name("model.building.schoolhouse").unwrap();
        let mut s = settlement();
        assert!(s.build_shortfall(&rules).is_empty());
        s.current_build = Some(Buildable::Building(school));
        s.stockpile.set(hammers, 64);
        assert_eq!(s.build_shortfall(&rules), vec![(tools, 30)]);
    }
}
