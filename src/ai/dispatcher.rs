//! Mission dispatcher - one pass over a faction's idle units
//!
//! Every unit without a valid mission is offered the task categories in a
//! fixed order and takes the first that applies:
//!
//! 1. cash in a treasure
//! 2. scout native settlements
//! 3. military duty (left to a [`MilitaryAdvisor`])
//! 4. transport (naval carriers)
//! 5. improve terrain (pioneers with tools)
//! 6. colonists: realize a wish or found a colony
//! 7. wander
//!
//! Carriers go first so that colonists aboard see their transport task.

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::ai::military::MilitaryAdvisor;
use crate::ai::mission::{passengers, MissionTask};
use crate::ai::registry::{ObjectId, Registry};
use crate::ai::site::{ColonySite, SiteFinder};
use crate::ai::wish::{travel_score, travel_turns, Fulfiller, WishKind};
use crate::core::config::DispatchConfig;
use crate::core::error::{AiError, Result};
use crate::core::types::{
    Destination, FactionId, GoodsId, NativeSettlementId, PlanId, TileId, UnitId, WishId,
};
use crate::game::{GameState, TravelEstimator, Unit, UnitLocation};

/// Outcome of one dispatch pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    /// Missions issued this pass
    pub missions: Vec<(UnitId, MissionTask)>,
    /// Units whose earlier mission is still valid
    pub kept: Vec<UnitId>,
    /// Forward-declared or unknown units
    pub skipped: Vec<UnitId>,
    /// Units left without a mission because a dispatch step failed
    pub errors: Vec<(UnitId, String)>,
}

/// Which worker wishes a colonist may take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WishScope {
    /// Wishes for the unit's own type
    Exact,
    /// Own type plus any wish that does not insist on an expert
    Widened,
}

pub struct Dispatcher<'a> {
    game: &'a GameState,
    faction: FactionId,
    config: &'a DispatchConfig,
    military: &'a dyn MilitaryAdvisor,
    sites: &'a dyn SiteFinder,
    travel: &'a dyn TravelEstimator,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        game: &'a GameState,
        faction: FactionId,
        config: &'a DispatchConfig,
        military: &'a dyn MilitaryAdvisor,
        sites: &'a dyn SiteFinder,
    ) -> Self {
        Self {
            game,
            faction,
            config,
            military,
            sites,
            travel: game,
        }
    }

    /// Replace the travel estimator
    pub fn with_travel(mut self, travel: &'a dyn TravelEstimator) -> Self {
        self.travel = travel;
        self
    }

    pub fn dispatch(&self, registry: &mut Registry) -> DispatchReport {
        let mut report = DispatchReport::default();
        let rules = &self.game.rules;
        let (carriers, others): (Vec<UnitId>, Vec<UnitId>) = registry
            .unit_ids()
            .into_iter()
            .partition(|id| self.game.unit(*id).map_or(false, |u| u.is_carrier(rules)));

        for id in carriers.into_iter().chain(others) {
            if registry.is_forward_declared(ObjectId::Unit(id)) {
                warn!(unit = %id, "Skipping unit that is not yet populated");
                report.skipped.push(id);
                continue;
            }
            let Some(unit) = self.game.unit(id) else {
                warn!(unit = %id, "Skipping unit missing from the game");
                report.skipped.push(id);
                continue;
            };
            if unit.owner != self.faction || matches!(unit.location, UnitLocation::Settlement(..)) {
                continue;
            }
            if self.keep_current(registry, id) {
                report.kept.push(id);
                continue;
            }

            match self.assign(registry, unit) {
                Ok(task) => {
                    debug!(unit = %id, mission = task.name(), "Mission assigned");
                    if let Ok(ai_unit) = registry.unit_mut(id) {
                        ai_unit.mission = Some(task.clone());
                    }
                    report.missions.push((id, task));
                }
                Err(e) => {
                    error!(unit = %id, "Dispatch failed: {}", e);
                    report.errors.push((id, e.to_string()));
                }
            }
        }
        report
    }

    /// Keep a still-valid mission; drop an invalid one and its bindings
    fn keep_current(&self, registry: &mut Registry, id: UnitId) -> bool {
        let Some(current) = registry.unit(id).ok().and_then(|u| u.mission.clone()) else {
            return false;
        };
        if current.is_valid(self.game, registry, self.faction, id) {
            return true;
        }
        match current {
            MissionTask::RealizeWish { wish, .. } => {
                if let Ok(w) = registry.wish_mut(wish) {
                    if w.is_fulfilled_by_unit(id) {
                        w.release();
                    }
                }
            }
            MissionTask::Pioneer { plan: Some(plan), .. } => {
                if let Ok(p) = registry.plan_mut(plan) {
                    if p.pioneer == Some(id) {
                        p.pioneer = None;
                    }
                }
            }
            _ => {}
        }
        if let Ok(u) = registry.unit_mut(id) {
            u.mission = None;
        }
        false
    }

    fn assign(&self, registry: &mut Registry, unit: &Unit) -> Result<MissionTask> {
        let rules = &self.game.rules;

        if unit.can_carry_treasure(rules) && unit.treasure > 0 {
            return Ok(MissionTask::CashInTreasure {
                destination: self.treasure_destination(unit),
            });
        }

        if unit.can_scout() {
            if let Some(target) = self.scout_target(unit) {
                return Ok(MissionTask::Scout { target });
            }
        }

        if (unit.is_offensive(rules) || unit.is_defensive(rules))
            && (!unit.is_colonist(rules)
                || unit.is_expert_soldier(rules)
                || self.game.turn > self.config.military_turn_threshold)
        {
            if let Some(order) = self.military.military_mission(self.game, unit.id) {
                return Ok(MissionTask::Military(order));
            }
        }

        if unit.is_carrier(rules) {
            return Ok(self.transport(registry, unit));
        }

        if unit.has_tools() {
            if let Some((plan, tile)) = self.pioneer_plan(registry, unit) {
                registry.plan_mut(plan)?.pioneer = Some(unit.id);
                return Ok(MissionTask::Pioneer {
                    plan: Some(plan),
                    tile,
                });
            }
        }

        if unit.is_colonist(rules) {
            if let Some(task) = self.colonist_mission(registry, unit)? {
                return Ok(task);
            }
        }

        Ok(MissionTask::Wander)
    }

    fn turns_to(&self, unit: UnitId, tile: Option<TileId>) -> u32 {
        let turns = tile.and_then(|t| self.travel.turns_to_reach(unit, t));
        travel_turns(turns, tile.is_some(), self.config)
    }

    fn treasure_destination(&self, unit: &Unit) -> Destination {
        self.game
            .settlements_of(self.faction)
            .filter(|s| s.coastal)
            .filter_map(|s| Some((self.travel.turns_to_reach(unit.id, s.tile)?, s.id)))
            .min()
            .map(|(_, s)| Destination::Settlement(s))
            .unwrap_or(Destination::Europe)
    }

    fn scout_target(&self, unit: &Unit) -> Option<NativeSettlementId> {
        self.game
            .natives
            .values()
            .filter(|n| !n.visited_by.contains(&self.faction))
            .filter_map(|n| Some((self.travel.turns_to_reach(unit.id, n.tile)?, n.id)))
            .min()
            .map(|(_, n)| n)
    }

    fn transport(&self, registry: &mut Registry, carrier: &Unit) -> MissionTask {
        let units = passengers(self.game, carrier.id);
        let slots = self.game.rules.unit(carrier.unit_type).cargo_slots as usize;
        let free = slots.saturating_sub(units.len());
        let open: Vec<GoodsId> = registry
            .parcels()
            .into_iter()
            .filter(|p| p.carrier.is_none())
            .map(|p| p.id)
            .take(free)
            .collect();
        for parcel in &open {
            if let Ok(p) = registry.goods_mut(*parcel) {
                p.carrier = Some(carrier.id);
            }
        }
        MissionTask::Transport { units, goods: open }
    }

    fn pioneer_plan(&self, registry: &Registry, unit: &Unit) -> Option<(PlanId, TileId)> {
        let mut best: Option<(i32, PlanId, TileId)> = None;
        for colony in registry.colony_ids() {
            let Ok(c) = registry.colony(colony) else {
                continue;
            };
            for plan_id in &c.tile_improvements {
                let plan = match registry.plan(*plan_id) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Skipping improvement plan: {}", e);
                        continue;
                    }
                };
                if plan.pioneer.is_some() || plan.is_complete(self.game) {
                    continue;
                }
                let score = travel_score(plan.value, self.turns_to(unit.id, Some(plan.tile)), self.config);
                if best.map_or(true, |(s, p, _)| score > s || (score == s && *plan_id < p)) {
                    best = Some((score, *plan_id, plan.tile));
                }
            }
        }
        best.map(|(_, plan, tile)| (plan, tile))
    }

    /// Best unbound worker wish for a unit with its travel-discounted score
    fn best_wish(&self, registry: &Registry, unit: &Unit, scope: WishScope) -> Option<(WishId, i32)> {
        let mut best: Option<(i32, WishId)> = None;
        for colony in registry.colony_ids() {
            let Ok(c) = registry.colony(colony) else {
                continue;
            };
            for wish_id in &c.wishes {
                let wish = match registry.wish(*wish_id) {
                    Ok(w) => w,
                    Err(e) => {
                        warn!("Skipping wish: {}", e);
                        continue;
                    }
                };
                if wish.is_bound() {
                    continue;
                }
                let WishKind::Worker {
                    unit_type,
                    expert_needed,
                } = wish.kind
                else {
                    continue;
                };
                let eligible = match scope {
                    WishScope::Exact => unit_type == unit.unit_type,
                    WishScope::Widened => unit_type == unit.unit_type || !expert_needed,
                };
                if !eligible {
                    continue;
                }
                let tile = self.game.destination_tile(wish.destination);
                let score = travel_score(wish.value, self.turns_to(unit.id, tile), self.config);
                if best.map_or(true, |(s, w)| score > s || (score == s && *wish_id < w)) {
                    best = Some((score, *wish_id));
                }
            }
        }
        best.map(|(score, wish)| (wish, score))
    }

    fn realize(&self, registry: &mut Registry, unit: &Unit, wish: WishId) -> Result<MissionTask> {
        let w = registry.wish_mut(wish)?;
        if !w.bind(Fulfiller::Unit(unit.id)) {
            return Err(AiError::MissingReference(ObjectId::Wish(wish)));
        }
        Ok(MissionTask::RealizeWish {
            wish,
            destination: w.destination,
        })
    }

    fn colonist_mission(&self, registry: &mut Registry, unit: &Unit) -> Result<Option<MissionTask>> {
        let can_found = self
            .game
            .faction(self.faction)
            .map_or(false, |f| f.can_found_colonies);
        let site: Option<(ColonySite, i32)> = if can_found {
            self.sites.find_site(self.game, unit.id).map(|site| {
                let score = travel_score(site.value, self.turns_to(unit.id, Some(site.tile)), self.config);
                (site, score)
            })
        } else {
            None
        };
        let site_score = site.map(|(_, s)| s);

        if let Some((wish, score)) = self.best_wish(registry, unit, WishScope::Exact) {
            if site_score.map_or(true, |s| score > s) {
                return self.realize(registry, unit, wish).map(Some);
            }
        }

        let widened = self.best_wish(registry, unit, WishScope::Widened);
        match (widened, site) {
            (Some((wish, score)), site) if site_score.map_or(true, |s| score > s) => {
                debug!(unit = %unit.id, score, site = ?site.map(|(s, _)| s.tile), "Taking widened wish");
                self.realize(registry, unit, wish).map(Some)
            }
            (_, Some((site, score))) => {
                if let Some(carrier) = unit.carrier() {
                    let transport = registry.unit_mut(carrier)?;
                    let registered = transport
                        .mission
                        .as_mut()
                        .map_or(false, |m| m.add_passenger(unit.id));
                    if !registered {
                        return Err(AiError::CarrierNotTransporting {
                            carrier,
                            unit: unit.id,
                        });
                    }
                }
                Ok(Some(MissionTask::FoundColony {
                    tile: site.tile,
                    value: score,
                }))
            }
            _ => Ok(None),
        }
    }
}
