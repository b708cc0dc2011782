//! Colony plan - target work assignment and build queue for one settlement
//!
//! The plan is computed in phases, each allowed to revise earlier ones:
//!
//! 1. every workable tile gets its single best goods type
//! 2. the raw material of the current construction is guaranteed a tile
//! 3. primary and secondary raw materials are chosen
//! 4. tiles producing nothing useful go to food or are dropped
//! 5. bells and the primary material's derivative get a worker
//! 6. workers are removed until the colony can feed itself
//! 7. spare food buys extra manufacturing workers
//! 8. the build queue is assembled
//!
//! Planned yields are those of a non-expert worker. Actual workers are
//! bound afterwards by [`ColonyPlan::assign_workers`].

use serde::Serialize;
use tracing::{debug, warn};

use crate::ai::production::ProductionCache;
use crate::ai::wish::WishKind;
use crate::core::config::{ColonyPlanConfig, WishConfig};
use crate::core::types::{
    BuildingTypeId, GoodsTypeId, SettlementId, TileId, UnitId, UnitTypeId, WorkLocation,
};
use crate::game::{building_potential, tile_potential, Buildable, GameState, Settlement};
use crate::rules::{BuildingKind, Rules};

/// One planned worker: where, and producing what
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkLocationPlan {
    pub location: WorkLocation,
    pub goods: GoodsTypeId,
    /// Expected output of a non-expert
    pub production: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerAssignment {
    pub unit: UnitId,
    pub location: WorkLocation,
    pub goods: GoodsTypeId,
}

/// A planned location nobody could staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vacancy {
    pub plan: WorkLocationPlan,
    /// Only the expert is wanted here
    pub expert_wanted: bool,
}

/// A wish the settlement wants in its pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WishRequest {
    pub kind: WishKind,
    pub value: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColonyPlan {
    settlement: SettlementId,
    plans: Vec<WorkLocationPlan>,
    build_queue: Vec<Buildable>,
    primary: Option<GoodsTypeId>,
    secondary: Option<GoodsTypeId>,
    /// Raw and refined goods of the current construction
    construction: Option<(GoodsTypeId, GoodsTypeId)>,
    food: Option<GoodsTypeId>,
    center_food: i32,
    food_consumption_per_worker: i32,
    assignments: Vec<WorkerAssignment>,
    vacancies: Vec<Vacancy>,
}

impl ColonyPlan {
    fn empty(settlement: SettlementId, config: &ColonyPlanConfig) -> Self {
        Self {
            settlement,
            plans: Vec::new(),
            build_queue: Vec::new(),
            primary: None,
            secondary: None,
            construction: None,
            food: None,
            center_food: 0,
            food_consumption_per_worker: config.food_consumption_per_worker,
            assignments: Vec::new(),
            vacancies: Vec::new(),
        }
    }

    /// Plan a settlement; an unknown settlement yields an empty plan
    pub fn new(game: &GameState, settlement: SettlementId, config: &ColonyPlanConfig) -> Self {
        let mut plan = Self::empty(settlement, config);
        let Some(s) = game.settlement(settlement) else {
            warn!("Cannot plan unknown settlement {}", settlement);
            return plan;
        };
        plan.food = game.rules.well_known().food;
        plan.center_food = plan
            .food
            .map(|f| game.center_production(settlement, f))
            .unwrap_or(0);

        plan.assign_tiles(game);
        plan.secure_construction(game, s);
        plan.choose_materials(&game.rules);
        plan.drop_useless_tiles(game, config);
        plan.reserve_buildings(&game.rules, s);
        plan.correct_food(game, s, config);
        plan.use_headroom(&game.rules, s, config);
        plan.build_queue = plan.compute_build_queue(game, s);
        debug!(
            settlement = %settlement,
            workers = plan.plans.len(),
            food = plan.food_production(),
            queue = plan.build_queue.len(),
            "Colony plan complete"
        );
        plan
    }

    // === PHASE 1 ===

    fn assign_tiles(&mut self, game: &GameState) {
        for tile_id in game.work_tiles(self.settlement) {
            if let Some((goods, production)) = best_tile_goods(game, tile_id) {
                self.plans.push(WorkLocationPlan {
                    location: WorkLocation::Tile(tile_id),
                    goods,
                    production,
                });
            }
        }
        debug!(settlement = %self.settlement, tiles = self.plans.len(), "Initial tile plans");
    }

    // === PHASE 2 ===

    fn secure_construction(&mut self, game: &GameState, settlement: &Settlement) {
        let rules = &game.rules;
        let wk = rules.well_known();
        let shortfall = settlement.build_shortfall(rules);
        let short_of = |g: Option<GoodsTypeId>| {
            g.filter(|g| shortfall.iter().any(|(s, _)| s == g))
        };
        let refined = short_of(wk.hammers).or_else(|| short_of(wk.tools));
        let Some(refined) = refined else {
            return;
        };
        let Some(raw) = rules.goods(refined).made_from else {
            return;
        };
        self.construction = Some((raw, refined));

        if self.production_of(raw) == 0 {
            let best = self
                .plans
                .iter()
                .enumerate()
                .filter_map(|(i, p)| {
                    let tile = game.map.tile(p.location.tile()?)?;
                    let potential = tile_potential(rules, tile, raw, None);
                    (potential > 0).then_some((i, potential))
                })
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)));
            if let Some((i, potential)) = best {
                debug!(goods = %rules.goods(raw).name, "Reassigning tile to construction material");
                self.plans[i].goods = raw;
                self.plans[i].production = potential;
            }
        }

        if let Some(building) = settlement.building_for(rules, refined) {
            self.plans.push(WorkLocationPlan {
                location: WorkLocation::Building(building),
                goods: refined,
                production: building_potential(rules, building, None),
            });
        }
    }

    // === PHASE 3 ===

    fn choose_materials(&mut self, rules: &Rules) {
        let raw = self.construction.map(|(raw, _)| raw);
        let mut totals: Vec<(GoodsTypeId, i32)> = Vec::new();
        for p in self.plans.iter().filter(|p| p.location.is_tile()) {
            if Some(p.goods) == raw || Some(p.goods) == self.food || !rules.is_transformable(p.goods) {
                continue;
            }
            match totals.iter_mut().find(|(g, _)| *g == p.goods) {
                Some((_, total)) => *total += p.production,
                None => totals.push((p.goods, p.production)),
            }
        }
        totals.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then(rules.goods(b.0).price.cmp(&rules.goods(a.0).price))
                .then(a.0.cmp(&b.0))
        });
        self.primary = totals.first().map(|(g, _)| *g);
        self.secondary = totals.get(1).map(|(g, _)| *g);
        debug!(primary = ?self.primary, secondary = ?self.secondary, "Materials chosen");
    }

    // === PHASE 4 ===

    fn drop_useless_tiles(&mut self, game: &GameState, config: &ColonyPlanConfig) {
        let wk = game.rules.well_known();
        let keep = [
            self.primary,
            self.secondary,
            self.construction.map(|(raw, _)| raw),
            wk.ore,
            wk.silver,
        ];
        let food = self.food;
        let mut kept = Vec::with_capacity(self.plans.len());
        for mut plan in self.plans.drain(..) {
            let Some(tile_id) = plan.location.tile() else {
                kept.push(plan);
                continue;
            };
            if keep.contains(&Some(plan.goods)) {
                kept.push(plan);
                continue;
            }
            let food_yield = match (food, game.map.tile(tile_id)) {
                (Some(f), Some(tile)) => tile_potential(&game.rules, tile, f, None),
                _ => 0,
            };
            if food_yield > config.useless_food_threshold {
                if let Some(f) = food {
                    plan.goods = f;
                    plan.production = food_yield;
                    kept.push(plan);
                }
            } else {
                debug!(tile = %tile_id, "Dropping useless tile");
            }
        }
        self.plans = kept;
    }

    // === PHASE 5 ===

    fn reserve_buildings(&mut self, rules: &Rules, settlement: &Settlement) {
        let derivative = self.primary.and_then(|p| rules.made_into(p));
        for goods in [rules.well_known().bells, derivative].into_iter().flatten() {
            if let Some(building) = settlement.building_for(rules, goods) {
                self.plans.push(WorkLocationPlan {
                    location: WorkLocation::Building(building),
                    goods,
                    production: building_potential(rules, building, None),
                });
            }
        }
    }

    // === PHASE 6 ===

    fn correct_food(&mut self, game: &GameState, settlement: &Settlement, config: &ColonyPlanConfig) {
        while self.food_production() < self.food_consumption() {
            if !self.reduce_once(game, settlement, config) {
                debug!(settlement = %self.settlement, "Plan is minimal and still short of food");
                break;
            }
        }
    }

    /// Lowest-yield tile plan producing `goods`, latest first on ties
    fn weakest_tile(&self, goods: Option<GoodsTypeId>) -> Option<usize> {
        let goods = goods?;
        self.plans
            .iter()
            .enumerate()
            .filter(|(_, p)| p.location.is_tile() && p.goods == goods)
            .min_by(|a, b| a.1.production.cmp(&b.1.production).then(b.0.cmp(&a.0)))
            .map(|(i, _)| i)
    }

    fn last_building(&self, pred: impl Fn(&WorkLocationPlan) -> bool) -> Option<usize> {
        self.plans
            .iter()
            .rposition(|p| !p.location.is_tile() && pred(p))
    }

    /// Remove or retarget one worker; false when nothing is left to give up
    fn reduce_once(&mut self, game: &GameState, settlement: &Settlement, config: &ColonyPlanConfig) -> bool {
        for material in [self.secondary, self.primary] {
            if let Some(i) = self.weakest_tile(material) {
                let food_yield = match (self.food, self.plans[i].location.tile()) {
                    (Some(f), Some(t)) => game
                        .map
                        .tile(t)
                        .map_or(0, |tile| tile_potential(&game.rules, tile, f, None)),
                    _ => 0,
                };
                match self.food {
                    Some(f) if food_yield > config.useless_food_threshold => {
                        self.plans[i].goods = f;
                        self.plans[i].production = food_yield;
                    }
                    _ => {
                        self.plans.remove(i);
                    }
                }
                return true;
            }
        }

        let refined = self.construction.map(|(_, refined)| refined);
        if let Some(i) = self.last_building(|p| Some(p.goods) != refined) {
            self.plans.remove(i);
            return true;
        }

        if let Some((raw, refined)) = self.construction {
            let raw_first = settlement.stockpile.get(raw) > 0;
            let raw_plan = self.weakest_tile(Some(raw));
            let refined_plan = self.last_building(|p| p.goods == refined);
            let pick = if raw_first {
                raw_plan.or(refined_plan)
            } else {
                refined_plan.or(raw_plan)
            };
            if let Some(i) = pick {
                self.plans.remove(i);
                return true;
            }
        }
        false
    }

    /// True when no further worker could be removed to save food
    pub fn is_minimal(&self) -> bool {
        let raw = self.construction.map(|(raw, _)| raw);
        !self.plans.iter().any(|p| match p.location {
            WorkLocation::Building(_) => true,
            WorkLocation::Tile(_) => {
                Some(p.goods) == self.primary || Some(p.goods) == self.secondary || Some(p.goods) == raw
            }
        })
    }

    // === PHASE 7 ===

    fn use_headroom(&mut self, rules: &Rules, settlement: &Settlement, config: &ColonyPlanConfig) {
        let wk = rules.well_known();
        let ore_is_material = wk.ore.is_some() && (self.primary == wk.ore || self.secondary == wk.ore);
        let targets = [
            self.secondary.and_then(|g| rules.made_into(g)),
            self.primary.and_then(|g| rules.made_into(g)),
            if ore_is_material { wk.muskets } else { None },
            wk.hammers,
        ];
        let mut headroom = self.food_production() - self.food_consumption();
        'targets: for goods in targets.into_iter().flatten() {
            let Some(building) = settlement.building_for(rules, goods) else {
                continue;
            };
            let per_worker = building_potential(rules, building, None);
            let workplaces = rules.building(building).workplaces as usize;
            for _ in 0..config.max_level {
                if headroom < config.food_headroom {
                    break 'targets;
                }
                if self.planned_in(building) >= workplaces {
                    break;
                }
                let supported = match rules.goods(goods).made_from {
                    Some(input) => self.production_of(input) >= self.production_of(goods) + per_worker,
                    None => true,
                };
                if !supported {
                    break;
                }
                self.plans.push(WorkLocationPlan {
                    location: WorkLocation::Building(building),
                    goods,
                    production: per_worker,
                });
                headroom -= config.food_consumption_per_worker;
            }
        }
    }

    fn planned_in(&self, building: BuildingTypeId) -> usize {
        self.plans
            .iter()
            .filter(|p| p.location == WorkLocation::Building(building))
            .count()
    }

    // === PHASE 8 ===

    fn compute_build_queue(&self, game: &GameState, settlement: &Settlement) -> Vec<Buildable> {
        let rules = &game.rules;
        let sid = self.settlement;
        let mut queue: Vec<Buildable> = Vec::new();
        let push = |queue: &mut Vec<Buildable>, b: BuildingTypeId| {
            if !queue.contains(&Buildable::Building(b)) {
                queue.push(Buildable::Building(b));
            }
        };
        let next_of_kind = |kind: BuildingKind| match settlement.building_of_kind(rules, kind) {
            Some(present) => rules.building(present).upgrades_to,
            None => rules.base_building_of_kind(kind),
        };
        let upgrade_of_kind = |kind: BuildingKind| {
            settlement
                .building_of_kind(rules, kind)
                .and_then(|present| rules.building(present).upgrades_to)
        };

        if settlement.building_of_kind(rules, BuildingKind::Docks).is_none() {
            let has_water = game
                .map
                .neighbours(settlement.tile)
                .into_iter()
                .any(|t| game.map.is_water(t, rules));
            if let Some(docks) = rules.base_building_of_kind(BuildingKind::Docks) {
                if has_water && game.can_build(sid, docks) {
                    push(&mut queue, docks);
                }
            }
        }

        for building in &settlement.buildings {
            let bt = rules.building(*building);
            if bt.workplaces == 0 || self.planned_in(*building) < bt.workplaces as usize {
                continue;
            }
            if let Some(upgrade) = bt.upgrades_to {
                if game.can_build(sid, upgrade) {
                    push(&mut queue, upgrade);
                }
            }
        }

        if settlement.stockpile.any_at_capacity(rules) {
            if let Some(next) = next_of_kind(BuildingKind::Warehouse) {
                if game.can_build(sid, next) {
                    push(&mut queue, next);
                }
            }
        }

        if self.primary.is_some() && settlement.building_of_kind(rules, BuildingKind::CustomsHouse).is_none() {
            if let Some(customs) = rules.base_building_of_kind(BuildingKind::CustomsHouse) {
                if game.can_build(sid, customs) {
                    push(&mut queue, customs);
                }
            }
        }

        if queue.len() > 3 {
            if let Some(next) = upgrade_of_kind(BuildingKind::Carpentry) {
                if game.can_build(sid, next) {
                    push(&mut queue, next);
                }
            }
        }

        if settlement.horse_production(rules) > 2 {
            if let Some(next) = next_of_kind(BuildingKind::Stable) {
                if game.can_build(sid, next) {
                    push(&mut queue, next);
                }
            }
        }

        for kind in [BuildingKind::Stockade, BuildingKind::Armory] {
            if let Some(next) = next_of_kind(kind) {
                push(&mut queue, next);
            }
        }

        if let Some(defender) = defensive_unit(rules) {
            queue.push(Buildable::Unit(defender));
        }

        if settlement.building_of_kind(rules, BuildingKind::Schoolhouse).is_none() {
            if let Some(school) = rules.base_building_of_kind(BuildingKind::Schoolhouse) {
                if game.can_build(sid, school) {
                    push(&mut queue, school);
                }
            }
        }
        queue
    }

    // === STAFFING ===

    /// Bind the settlement's workers to the planned locations
    ///
    /// Matching experts are placed first, then any worker who is not an
    /// expert at something else. Locations only an expert of another trade
    /// could take are reserved and left as vacancies wanting the expert.
    pub fn assign_workers(&mut self, game: &GameState) {
        self.assign_workers_with(ProductionCache::new(game, self.settlement));
    }

    pub fn assign_workers_with(&mut self, mut cache: ProductionCache<'_>) {
        #[derive(Clone, Copy, PartialEq)]
        enum Pass {
            Experts,
            Anyone,
            OtherExperts,
        }
        let mut staffed = vec![false; self.plans.len()];
        let mut reserved = vec![false; self.plans.len()];
        self.assignments.clear();

        for pass in [Pass::Experts, Pass::Anyone, Pass::OtherExperts] {
            for (i, plan) in self.plans.iter().enumerate() {
                if staffed[i] || reserved[i] {
                    continue;
                }
                let candidate = cache
                    .entries_for(plan.goods)
                    .iter()
                    .filter(|e| e.location == plan.location)
                    .find(|e| match pass {
                        Pass::Experts => e.is_expert,
                        Pass::Anyone => !e.is_other_expert,
                        Pass::OtherExperts => e.is_other_expert,
                    })
                    .cloned();
                let Some(entry) = candidate else {
                    continue;
                };
                if !cache.assign(&entry) {
                    continue;
                }
                if pass == Pass::OtherExperts {
                    reserved[i] = true;
                } else {
                    staffed[i] = true;
                    self.assignments.push(WorkerAssignment {
                        unit: entry.unit,
                        location: entry.location,
                        goods: entry.goods,
                    });
                }
            }
        }

        self.vacancies = self
            .plans
            .iter()
            .enumerate()
            .filter(|(i, _)| !staffed[*i])
            .map(|(i, plan)| Vacancy {
                plan: *plan,
                expert_wanted: reserved[i] || !plan.location.is_tile(),
            })
            .collect();
        debug!(
            settlement = %self.settlement,
            assigned = self.assignments.len(),
            vacancies = self.vacancies.len(),
            "Workers assigned"
        );
    }

    /// Wishes this plan raises: workers for vacancies, tools for construction
    pub fn wish_requests(&self, game: &GameState, config: &WishConfig) -> Vec<WishRequest> {
        let rules = &game.rules;
        let mut requests = Vec::new();
        let default_type = rules.default_unit_type();
        for vacancy in &self.vacancies {
            let expert = rules.expert_for(vacancy.plan.goods);
            let (unit_type, expert_needed) = match (vacancy.expert_wanted, expert, default_type) {
                (true, Some(e), _) => (e, true),
                (_, _, Some(d)) => (d, false),
                (false, Some(e), None) => (e, true),
                (true, None, None) | (false, None, None) => continue,
            };
            let mut value = config.worker_wish_value + config.value_per_production * vacancy.plan.production;
            if expert_needed {
                value += config.expert_wish_bonus;
            }
            requests.push(WishRequest {
                kind: WishKind::Worker {
                    unit_type,
                    expert_needed,
                },
                value,
            });
        }

        let wk = rules.well_known();
        if let (Some(tools), Some(ore)) = (wk.tools, wk.ore) {
            let shortfall = game
                .settlement(self.settlement)
                .map(|s| s.build_shortfall(rules))
                .unwrap_or_default();
            if let Some((_, amount)) = shortfall.iter().find(|(g, _)| *g == tools) {
                if self.production_of(ore) == 0 {
                    requests.push(WishRequest {
                        kind: WishKind::Goods {
                            goods_type: tools,
                            amount: *amount,
                        },
                        value: config.goods_wish_value,
                    });
                }
            }
        }
        requests
    }

    // === QUERIES ===

    pub fn settlement(&self) -> SettlementId {
        self.settlement
    }

    pub fn work_plans(&self) -> &[WorkLocationPlan] {
        &self.plans
    }

    pub fn build_queue(&self) -> &[Buildable] {
        &self.build_queue
    }

    pub fn assignments(&self) -> &[WorkerAssignment] {
        &self.assignments
    }

    pub fn vacancies(&self) -> &[Vacancy] {
        &self.vacancies
    }

    pub fn primary(&self) -> Option<GoodsTypeId> {
        self.primary
    }

    pub fn secondary(&self) -> Option<GoodsTypeId> {
        self.secondary
    }

    pub fn production_of(&self, goods: GoodsTypeId) -> i32 {
        self.plans
            .iter()
            .filter(|p| p.goods == goods)
            .map(|p| p.production)
            .sum()
    }

    /// Centre tile food plus everything planned
    pub fn food_production(&self) -> i32 {
        self.center_food + self.food.map_or(0, |f| self.production_of(f))
    }

    pub fn food_consumption(&self) -> i32 {
        self.plans.len() as i32 * self.food_consumption_per_worker
    }

    /// Tiles in the plan
    pub fn planned_tiles(&self) -> Vec<TileId> {
        self.plans.iter().filter_map(|p| p.location.tile()).collect()
    }
}

/// Best goods for a tile: a resource's goods first, then highest potential
fn best_tile_goods(game: &GameState, tile_id: TileId) -> Option<(GoodsTypeId, i32)> {
    let rules = &game.rules;
    let tile = game.map.tile(tile_id)?;
    let mut candidates: Vec<(GoodsTypeId, i32, i32)> = rules
        .goods_ids()
        .filter(|g| rules.goods(*g).is_farmed)
        .filter_map(|g| {
            let potential = tile_potential(rules, tile, g, None);
            let bonus = tile.resource.map_or(0, |r| rules.resource(r).bonus(g));
            (potential > 0).then_some((g, potential, bonus))
        })
        .collect();
    candidates.sort_by(|a, b| {
        (b.2 > 0)
            .cmp(&(a.2 > 0))
            .then(b.1.cmp(&a.1))
            .then(rules.goods(b.0).price.cmp(&rules.goods(a.0).price))
            .then(a.0.cmp(&b.0))
    });
    candidates.first().map(|(g, p, _)| (*g, *p))
}

/// The unit always queued for defence
fn defensive_unit(rules: &Rules) -> Option<UnitTypeId> {
    rules.unit_ids().find(|u| {
        let ut = rules.unit(*u);
        !ut.naval && ut.defence > 1 && !ut.required_goods.is_empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AiConfig;
    use crate::game::ScenarioBuilder;

    fn plan_of(game: &GameState, colony: SettlementId) -> ColonyPlan {
        ColonyPlan::new(game, colony, &AiConfig::default().colony)
    }

    #[test]
    fn test_unknown_settlement_gives_empty_plan() {
        let b = ScenarioBuilder::new(2, 2, "model.tile.plains").unwrap();
        let game = b.build();
        let plan = plan_of(&game, SettlementId(42));
        assert!(plan.work_plans().is_empty());
        assert!(plan.build_queue().is_empty());
    }

    #[test]
    fn test_resource_goods_wins_tile() {
        let mut b = ScenarioBuilder::new(2, 1, "model.tile.plains").unwrap();
        b.resource(1, 0, "model.resource.cotton").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Plymouth", 0, 0).unwrap();
        let game = b.build();
        let cotton = game.rules.goods_by_name("model.goods.cotton").unwrap();
        let plan = plan_of(&game, colony);
        assert_eq!(plan.work_plans().len(), 1);
        assert_eq!(plan.work_plans()[0].goods, cotton);
        assert_eq!(plan.work_plans()[0].production, 5);
        assert_eq!(plan.primary(), Some(cotton));
    }

    #[test]
    fn test_arctic_and_poor_tiles_dropped() {
        let mut b = ScenarioBuilder::new(3, 1, "model.tile.arctic").unwrap();
        b.tile(1, 0, "model.tile.plains").unwrap();
        b.tile(2, 0, "model.tile.mountains").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Nome", 1, 0).unwrap();
        let game = b.build();
        let plan = plan_of(&game, colony);
        // Mountains keep their ore; arctic never enters the plan
        let ore = game.rules.well_known().ore.unwrap();
        assert_eq!(plan.work_plans().len(), 1);
        assert_eq!(plan.work_plans()[0].goods, ore);
    }

    #[test]
    fn test_construction_material_gets_a_tile() {
        let mut b = ScenarioBuilder::new(3, 1, "model.tile.plains").unwrap();
        b.tile(0, 0, "model.tile.mixedForest").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Plymouth", 1, 0).unwrap();
        b.starting_buildings(colony).unwrap();
        b.build_target(colony, "model.building.stockade").unwrap();
        let game = b.build();
        let lumber = game.rules.well_known().lumber.unwrap();
        let hammers = game.rules.well_known().hammers.unwrap();
        let plan = plan_of(&game, colony);
        assert_eq!(plan.production_of(lumber), 6);
        // The spare food buys a second carpenter, which the lumber still supports
        assert_eq!(plan.production_of(hammers), 6);
    }

    #[test]
    fn test_food_shortage_removes_primary_before_buildings() {
        let mut b = ScenarioBuilder::new(2, 1, "model.tile.hills").unwrap();
        b.tile(0, 0, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Plymouth", 0, 0).unwrap();
        b.starting_buildings(colony).unwrap();
        let game = b.build();
        let plan = plan_of(&game, colony);
        // Ore on the hills is primary; the hills cannot feed anyone, so the
        // ore worker goes and the bells and tools workers stay
        assert_eq!(plan.primary(), game.rules.well_known().ore);
        assert_eq!(plan.work_plans().len(), 2);
        assert!(plan.work_plans().iter().all(|p| !p.location.is_tile()));
        assert_eq!(plan.food_production(), 5);
        assert_eq!(plan.food_consumption(), 4);
    }

    #[test]
    fn test_build_queue_defaults() {
        let mut b = ScenarioBuilder::new(2, 1, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Plymouth", 0, 0).unwrap();
        let game = b.build();
        let rules = &game.rules;
        let plan = plan_of(&game, colony);
        let stockade = rules.building_by_name("model.building.stockade").unwrap();
        let armory = rules.building_by_name("model.building.armory").unwrap();
        let artillery = rules.unit_by_name("model.unit.artillery").unwrap();
        assert_eq!(
            plan.build_queue(),
            &[
                Buildable::Building(stockade),
                Buildable::Building(armory),
                Buildable::Unit(artillery)
            ]
        );
    }

    #[test]
    fn test_docks_queued_on_coast() {
        let mut b = ScenarioBuilder::new(3, 1, "model.tile.plains").unwrap();
        b.tile(0, 0, "model.tile.ocean").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Plymouth", 1, 0).unwrap();
        b.worker(colony, "model.unit.freeColonist", WorkLocation::Tile(TileId(2)))
            .unwrap();
        let game = b.build();
        let docks = game.rules.building_by_name("model.building.docks").unwrap();
        let plan = plan_of(&game, colony);
        assert_eq!(plan.build_queue().first(), Some(&Buildable::Building(docks)));
    }

    #[test]
    fn test_assign_workers_and_vacancies() {
        let mut b = ScenarioBuilder::new(3, 1, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Plymouth", 1, 0).unwrap();
        b.starting_buildings(colony).unwrap();
        let farmer = b
            .worker(colony, "model.unit.expertFarmer", WorkLocation::Tile(TileId(0)))
            .unwrap();
        let game = b.build();
        let food = game.rules.well_known().food.unwrap();
        let mut plan = plan_of(&game, colony);
        plan.assign_workers(&game);

        assert_eq!(plan.assignments().len(), 1);
        assert_eq!(plan.assignments()[0].unit, farmer);
        assert_eq!(plan.assignments()[0].goods, food);
        let requests = plan.wish_requests(&game, &AiConfig::default().wishes);
        assert_eq!(requests.len(), plan.vacancies().len());
        assert!(requests.iter().all(|r| matches!(r.kind, WishKind::Worker { .. })));
    }

    #[test]
    fn test_tools_wish_without_ore() {
        let mut b = ScenarioBuilder::new(2, 1, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Plymouth", 0, 0).unwrap();
        b.starting_buildings(colony).unwrap();
        b.build_target(colony, "model.building.schoolhouse").unwrap();
        b.stock(colony, "model.goods.hammers", 64).unwrap();
        let game = b.build();
        let tools = game.rules.well_known().tools.unwrap();
        let mut plan = plan_of(&game, colony);
        plan.assign_workers(&game);
        let requests = plan.wish_requests(&game, &AiConfig::default().wishes);
        assert!(requests.contains(&WishRequest {
            kind: WishKind::Goods {
                goods_type: tools,
                amount: 30
            },
            value: 40
        }));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let (game, _) = ScenarioBuilder::random(11, 3, 4).unwrap();
        for colony in game.settlements.keys() {
            let a = plan_of(&game, *colony);
            let b = plan_of(&game, *colony);
            assert_eq!(a.work_plans(), b.work_plans());
            assert_eq!(a.build_queue(), b.build_queue());
        }
    }
}
