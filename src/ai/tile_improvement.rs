//! Tile improvement planning
//!
//! Each settlement keeps at most one standing proposal per tile: the
//! improvement that adds the most to what the colony plan wants that tile
//! to produce. A proposal may have one pioneer bound to it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::ai::colony_plan::ColonyPlan;
use crate::ai::registry::{Disposal, ObjectId, Registry};
use crate::core::config::ImprovementConfig;
use crate::core::error::Result;
use crate::core::types::{ImprovementTypeId, PlanId, SettlementId, TileId, UnitId, WorkLocation};
use crate::game::{tile_potential, GameState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileImprovementPlan {
    pub id: PlanId,
    pub colony: SettlementId,
    pub tile: TileId,
    pub improvement: ImprovementTypeId,
    pub value: i32,
    pub pioneer: Option<UnitId>,
}

impl TileImprovementPlan {
    pub fn new(
        id: PlanId,
        colony: SettlementId,
        tile: TileId,
        improvement: ImprovementTypeId,
        value: i32,
    ) -> Self {
        Self {
            id,
            colony,
            tile,
            improvement,
            value,
            pioneer: None,
        }
    }

    /// The improvement is already in place
    pub fn is_complete(&self, game: &GameState) -> bool {
        game.map
            .tile(self.tile)
            .map_or(true, |t| t.has_improvement(self.improvement))
    }

    pub fn dispose(&self) -> Vec<Disposal> {
        let mut events = Vec::with_capacity(2);
        if let Some(unit) = self.pioneer {
            events.push(Disposal::ClearPioneerPlan { unit, plan: self.id });
        }
        events.push(Disposal::DetachPlan {
            colony: self.colony,
            plan: self.id,
        });
        events
    }
}

/// A candidate improvement before it becomes a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proposal {
    pub tile: TileId,
    pub improvement: ImprovementTypeId,
    pub value: i32,
}

/// Best improvement for every planned tile that can still be improved
pub fn proposals(game: &GameState, plan: &ColonyPlan, config: &ImprovementConfig) -> Vec<Proposal> {
    let rules = &game.rules;
    let mut result = Vec::new();
    for wlp in plan.work_plans() {
        let WorkLocation::Tile(tile_id) = wlp.location else {
            continue;
        };
        let Some(tile) = game.map.tile(tile_id) else {
            continue;
        };
        if tile_potential(rules, tile, wlp.goods, None) == 0 {
            continue;
        }
        let tile_type = rules.tile(tile.tile_type);
        let best = rules
            .improvement_ids()
            .filter(|i| !tile.has_improvement(*i))
            .filter(|i| rules.improvement(*i).allowed(tile.tile_type, tile_type))
            .filter_map(|i| {
                let improvement = rules.improvement(i);
                let bonus = improvement.bonus(wlp.goods);
                if bonus <= 0 {
                    return None;
                }
                let mut value = bonus * config.value_per_bonus;
                if improvement.is_road {
                    value += config.road_value;
                }
                Some(Proposal {
                    tile: tile_id,
                    improvement: i,
                    value,
                })
            })
            .max_by(|a, b| a.value.cmp(&b.value).then(b.improvement.cmp(&a.improvement)));
        if let Some(p) = best {
            result.push(p);
        }
    }
    result
}

/// Reconcile a settlement's standing plans with fresh proposals
///
/// Plans for tiles no longer proposed, already improved or superseded by a
/// different improvement are disposed. Returns the disposal events, which
/// have already been applied to the registry. Handles in the pool that no
/// longer resolve to a plan are dropped from it.
pub fn update_plans(
    registry: &mut Registry,
    game: &GameState,
    colony: SettlementId,
    proposals: &[Proposal],
) -> Result<Vec<Disposal>> {
    let wanted: BTreeMap<TileId, Proposal> = proposals.iter().map(|p| (p.tile, *p)).collect();
    let mut events = Vec::new();
    let mut covered = BTreeMap::new();

    for plan_id in registry.colony(colony)?.tile_improvements.clone() {
        let plan = match registry.plan(plan_id) {
            Ok(plan) => plan.clone(),
            Err(e) => {
                warn!(colony = %colony, "Dropping unusable plan handle: {}", e);
                registry.apply(vec![Disposal::DetachPlan { colony, plan: plan_id }]);
                continue;
            }
        };
        let keep = !plan.is_complete(game)
            && wanted
                .get(&plan.tile)
                .map_or(false, |p| p.improvement == plan.improvement);
        if keep {
            if let Some(p) = wanted.get(&plan.tile) {
                registry.plan_mut(plan_id)?.value = p.value;
            }
            covered.insert(plan.tile, plan_id);
        } else {
            debug!(plan = %plan.id, tile = %plan.tile, "Disposing tile improvement plan");
            let disposed = registry.dispose(ObjectId::TileImprovement(plan_id));
            events.extend(disposed.iter().copied());
            registry.apply(disposed);
        }
    }

    for proposal in wanted.values() {
        if covered.contains_key(&proposal.tile) {
            continue;
        }
        registry.create_plan(|id| {
            TileImprovementPlan::new(id, colony, proposal.tile, proposal.improvement, proposal.value)
        })?;
    }

    // Highest value first
    let mut plans = registry.colony(colony)?.tile_improvements.clone();
    plans.sort_by_key(|p| {
        let value = registry.plan(*p).map(|p| p.value).unwrap_or(i32::MIN);
        (std::cmp::Reverse(value), *p)
    });
    registry.colony_mut(colony)?.tile_improvements = plans;
    Ok(events)
}
