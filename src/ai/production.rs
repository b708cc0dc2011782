//! Production candidate pool for one settlement
//!
//! Ranks every (goods type, work location, worker) triple by yield and
//! supports greedy assignment. Each `assign` removes the candidates it has
//! made impossible, so the committed entries never share a worker or a
//! tile. The pool is built fresh for each planning pass and owned by it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::types::{BuildingTypeId, GoodsTypeId, SettlementId, TileId, UnitId, UnitTypeId, WorkLocation};
use crate::game::{building_potential, tile_potential, GameState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductionEntry {
    pub goods: GoodsTypeId,
    pub location: WorkLocation,
    pub unit: UnitId,
    pub unit_type: UnitTypeId,
    pub production: i32,
    /// The worker is the expert for this goods type
    pub is_expert: bool,
    /// The worker is an expert at some other goods type
    pub is_other_expert: bool,
    /// One experience upgrade away from being the expert
    pub upgrades_to_expert: bool,
}

/// Default ranking: yield, then experts, then handle order
pub fn by_production(a: &ProductionEntry, b: &ProductionEntry) -> Ordering {
    b.production
        .cmp(&a.production)
        .then(b.is_expert.cmp(&a.is_expert))
        .then(a.is_other_expert.cmp(&b.is_other_expert))
        .then(b.upgrades_to_expert.cmp(&a.upgrades_to_expert))
        .then(a.unit.cmp(&b.unit))
        .then(a.location.cmp(&b.location))
}

pub struct ProductionCache<'a> {
    game: &'a GameState,
    settlement: SettlementId,
    units: BTreeSet<UnitId>,
    tiles: Vec<TileId>,
    buildings: Vec<BuildingTypeId>,
    entries: BTreeMap<GoodsTypeId, Vec<ProductionEntry>>,
    assigned: Vec<ProductionEntry>,
    reserved: Vec<ProductionEntry>,
    reserved_buildings: BTreeSet<BuildingTypeId>,
    unit_count: usize,
}

impl<'a> ProductionCache<'a> {
    /// Pool over the settlement's current workers and work locations
    pub fn new(game: &'a GameState, settlement: SettlementId) -> Self {
        let units = game
            .settlement_workers(settlement)
            .iter()
            .map(|u| u.id)
            .collect();
        Self::with_units(game, settlement, units)
    }

    pub fn with_units(game: &'a GameState, settlement: SettlementId, units: BTreeSet<UnitId>) -> Self {
        let buildings = game
            .settlement(settlement)
            .map(|s| s.buildings.clone())
            .unwrap_or_default();
        let unit_count = units.len();
        Self {
            game,
            settlement,
            units,
            tiles: game.work_tiles(settlement),
            buildings,
            entries: BTreeMap::new(),
            assigned: Vec::new(),
            reserved: Vec::new(),
            reserved_buildings: BTreeSet::new(),
            unit_count,
        }
    }

    pub fn settlement(&self) -> SettlementId {
        self.settlement
    }

    /// Workers not yet committed
    pub fn unit_count(&self) -> usize {
        self.unit_count
    }

    pub fn available_units(&self) -> &BTreeSet<UnitId> {
        &self.units
    }

    pub fn assigned(&self) -> &[ProductionEntry] {
        &self.assigned
    }

    pub fn reserved(&self) -> &[ProductionEntry] {
        &self.reserved
    }

    /// Ranked candidates for one goods type, built on first request
    pub fn entries_for(&mut self, goods: GoodsTypeId) -> &[ProductionEntry] {
        if !self.entries.contains_key(&goods) {
            let mut list = self.build_entries(goods);
            list.sort_by(by_production);
            self.entries.insert(goods, list);
        }
        self.entries.get(&goods).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Candidates for one goods type ranked by a caller-supplied comparator
    pub fn entries_with(
        &mut self,
        goods: GoodsTypeId,
        compare: impl Fn(&ProductionEntry, &ProductionEntry) -> Ordering,
    ) -> Vec<ProductionEntry> {
        let mut list = self.entries_for(goods).to_vec();
        list.sort_by(compare);
        list
    }

    fn build_entries(&self, goods: GoodsTypeId) -> Vec<ProductionEntry> {
        let rules = &self.game.rules;
        let mut list = Vec::new();
        if rules.goods(goods).is_farmed {
            for tile_id in &self.tiles {
                let Some(tile) = self.game.map.tile(*tile_id) else {
                    continue;
                };
                for unit in &self.units {
                    let Some(u) = self.game.unit(*unit) else {
                        continue;
                    };
                    let production = tile_potential(rules, tile, goods, Some(u.unit_type));
                    if production > 0 {
                        list.push(self.entry(goods, WorkLocation::Tile(*tile_id), *unit, u.unit_type, production));
                    }
                }
            }
        } else {
            for building in &self.buildings {
                if rules.building(*building).produces != Some(goods) || self.free_slots(*building) == 0 {
                    continue;
                }
                for unit in &self.units {
                    let Some(u) = self.game.unit(*unit) else {
                        continue;
                    };
                    let production = building_potential(rules, *building, Some(u.unit_type));
                    list.push(self.entry(goods, WorkLocation::Building(*building), *unit, u.unit_type, production));
                }
            }
        }
        list
    }

    fn entry(
        &self,
        goods: GoodsTypeId,
        location: WorkLocation,
        unit: UnitId,
        unit_type: UnitTypeId,
        production: i32,
    ) -> ProductionEntry {
        let rules = &self.game.rules;
        let ut = rules.unit(unit_type);
        let is_expert = ut.is_expert_for(goods);
        ProductionEntry {
            goods,
            location,
            unit,
            unit_type,
            production,
            is_expert,
            is_other_expert: ut.is_expert() && !is_expert,
            upgrades_to_expert: rules.upgrades_to_expert(unit_type, goods),
        }
    }

    fn free_slots(&self, building: BuildingTypeId) -> u32 {
        let used = self
            .assigned
            .iter()
            .filter(|e| e.location == WorkLocation::Building(building))
            .count() as u32;
        self.game
            .rules
            .building(building)
            .workplaces
            .saturating_sub(used)
    }

    fn remove_where(&mut self, pred: impl Fn(&ProductionEntry) -> bool) -> Vec<ProductionEntry> {
        let mut removed = Vec::new();
        for list in self.entries.values_mut() {
            let (gone, kept): (Vec<_>, Vec<_>) = list.drain(..).partition(|e| pred(e));
            removed.extend(gone);
            *list = kept;
        }
        removed
    }

    /// Commit an entry; returns false if it is no longer possible
    ///
    /// A worker who is an expert at something else is not used up. A tile
    /// taken this way is removed from every list. A building taken this way
    /// has all its remaining candidates set aside as reserved, once per
    /// building.
    pub fn assign(&mut self, entry: &ProductionEntry) -> bool {
        if !self.units.contains(&entry.unit) {
            return false;
        }
        match entry.location {
            WorkLocation::Tile(t) => {
                let taken = self
                    .assigned
                    .iter()
                    .chain(self.reserved.iter())
                    .any(|e| e.location == WorkLocation::Tile(t));
                if taken {
                    return false;
                }
            }
            WorkLocation::Building(b) => {
                if self.free_slots(b) == 0 || self.reserved_buildings.contains(&b) {
                    return false;
                }
            }
        }

        if entry.is_other_expert {
            match entry.location {
                WorkLocation::Tile(_) => {
                    let location = entry.location;
                    self.remove_where(|e| e.location == location);
                    self.reserved.push(entry.clone());
                }
                WorkLocation::Building(b) => {
                    if self.reserved_buildings.insert(b) {
                        let location = entry.location;
                        let set_aside = self.remove_where(|e| e.location == location);
                        self.reserved.extend(set_aside);
                        if !self.reserved.contains(entry) {
                            self.reserved.push(entry.clone());
                        }
                    }
                }
            }
            return true;
        }

        self.units.remove(&entry.unit);
        self.assigned.push(entry.clone());
        let unit = entry.unit;
        self.remove_where(|e| e.unit == unit);
        match entry.location {
            WorkLocation::Tile(_) => {
                let location = entry.location;
                self.remove_where(|e| e.location == location);
            }
            WorkLocation::Building(b) => {
                if self.free_slots(b) == 0 {
                    let location = entry.location;
                    self.remove_where(|e| e.location == location);
                }
            }
        }
        self.unit_count = self.unit_count.saturating_sub(1);
        true
    }
}
