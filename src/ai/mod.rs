//! Faction AI - per-turn colony planning and mission dispatch
//!
//! [`FactionAi::run_turn`] is the entry point. A turn runs in four steps:
//! sync the registry with the game, plan every settlement and refresh its
//! wishes and improvement plans, offer stockpiled goods to goods wishes, then
//! dispatch idle units.

pub mod colony_plan;
pub mod dispatcher;
pub mod military;
pub mod mission;
pub mod production;
pub mod registry;
pub mod site;
pub mod tile_improvement;
pub mod wish;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::colony_plan::{ColonyPlan, WishRequest};
use crate::ai::dispatcher::{DispatchReport, Dispatcher};
use crate::ai::military::MilitaryAdvisor;
use crate::ai::mission::{passengers, MissionTask};
use crate::ai::registry::{AiColony, AiGoods, AiObject, AiUnit, ObjectId, Registry};
use crate::ai::site::SiteFinder;
use crate::ai::tile_improvement::{proposals, update_plans};
use crate::ai::wish::{Fulfiller, Wish, WishKind};
use crate::core::config::AiConfig;
use crate::core::error::Result;
use crate::core::types::{FactionId, SettlementId, Turn, UnitId, WishId};
use crate::game::{GameState, UnitLocation};

/// What one turn of planning decided
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub faction: FactionId,
    pub turn: Turn,
    pub colonies: Vec<ColonyPlan>,
    pub missions: Vec<(UnitId, MissionTask)>,
    pub kept: Vec<UnitId>,
    pub skipped: Vec<UnitId>,
    pub errors: Vec<(UnitId, String)>,
}

/// Planning state that persists between turns for one faction
#[derive(Debug, Clone)]
pub struct FactionAi {
    pub faction: FactionId,
    pub registry: Registry,
    pub config: AiConfig,
}

impl FactionAi {
    pub fn new(faction: FactionId, config: AiConfig) -> Self {
        Self {
            faction,
            registry: Registry::new(),
            config,
        }
    }

    pub fn run_turn(
        &mut self,
        game: &GameState,
        military: &dyn MilitaryAdvisor,
        sites: &dyn SiteFinder,
    ) -> Result<TurnReport> {
        self.sync(game);

        let mut colonies = Vec::new();
        let settlements: Vec<SettlementId> = game.settlements_of(self.faction).map(|s| s.id).collect();
        for sid in settlements {
            let mut plan = ColonyPlan::new(game, sid, &self.config.colony);
            plan.assign_workers(game);
            let requests = plan.wish_requests(game, &self.config.wishes);
            if let Err(e) = self.refresh_wishes(sid, &requests) {
                warn!(settlement = %sid, "Wish refresh skipped: {}", e);
            }
            let proposed = proposals(game, &plan, &self.config.improvements);
            if let Err(e) = update_plans(&mut self.registry, game, sid, &proposed) {
                warn!(settlement = %sid, "Tile improvement update skipped: {}", e);
            }
            colonies.push(plan);
        }

        if let Err(e) = self.offer_goods(game) {
            warn!(faction = %self.faction, "Goods offer skipped: {}", e);
        }

        let DispatchReport {
            missions,
            kept,
            skipped,
            errors,
        } = Dispatcher::new(game, self.faction, &self.config.dispatch, military, sites)
            .dispatch(&mut self.registry);

        info!(
            faction = %self.faction,
            turn = game.turn,
            colonies = colonies.len(),
            missions = missions.len(),
            kept = kept.len(),
            errors = errors.len(),
            "Turn planned"
        );

        Ok(TurnReport {
            faction: self.faction,
            turn: game.turn,
            colonies,
            missions,
            kept,
            skipped,
            errors,
        })
    }

    // === SYNC ===

    /// Bring the registry in line with the game's units and settlements
    fn sync(&mut self, game: &GameState) {
        let units: BTreeSet<UnitId> = game.units_of(self.faction).map(|u| u.id).collect();
        let settlements: BTreeSet<SettlementId> =
            game.settlements_of(self.faction).map(|s| s.id).collect();

        for id in self.registry.unit_ids() {
            if !units.contains(&id) && !self.registry.is_forward_declared(ObjectId::Unit(id)) {
                debug!(unit = %id, "Unit gone, disposing");
                self.registry.remove(ObjectId::Unit(id));
            }
        }
        for id in self.registry.colony_ids() {
            if !settlements.contains(&id) && !self.registry.is_forward_declared(ObjectId::Colony(id)) {
                debug!(settlement = %id, "Settlement gone, disposing");
                self.registry.remove(ObjectId::Colony(id));
            }
        }
        // New objects and forward declarations the game now backs
        for id in &units {
            let handle = ObjectId::Unit(*id);
            if !self.registry.contains(handle) || self.registry.is_forward_declared(handle) {
                self.registry.populate(AiObject::Unit(AiUnit::new(*id)));
            }
        }
        for id in &settlements {
            let handle = ObjectId::Colony(*id);
            if !self.registry.contains(handle) || self.registry.is_forward_declared(handle) {
                self.registry.populate(AiObject::Colony(AiColony::new(*id)));
            }
        }

        self.retire_fulfilled_wishes(game);

        // Manifests only list units still aboard
        for id in self.registry.unit_ids() {
            if let Ok(unit) = self.registry.unit_mut(id) {
                if let Some(MissionTask::Transport { units, .. }) = &mut unit.mission {
                    let aboard = passengers(game, id);
                    units.retain(|u| aboard.contains(u));
                }
            }
        }
    }

    /// Dispose wishes that are met: the worker has started work, or the
    /// settlement's construction no longer lacks the goods asked for
    fn retire_fulfilled_wishes(&mut self, game: &GameState) {
        let mut fulfilled = Vec::new();
        for colony in self.registry.colony_ids() {
            let Ok(c) = self.registry.colony(colony) else {
                continue;
            };
            for wish in &c.wishes {
                let Ok(w) = self.registry.wish(*wish) else {
                    continue;
                };
                let met = match (w.fulfiller(), w.kind) {
                    (Some(Fulfiller::Unit(unit)), _) => game
                        .unit(unit)
                        .map_or(false, |u| matches!(u.location, UnitLocation::Settlement(s, _) if s == colony)),
                    (Some(Fulfiller::Goods(_)), WishKind::Goods { goods_type, .. }) => game
                        .settlement(colony)
                        .map_or(false, |s| {
                            !s.build_shortfall(&game.rules).iter().any(|(g, _)| *g == goods_type)
                        }),
                    _ => false,
                };
                if met {
                    fulfilled.push(*wish);
                }
            }
        }
        for wish in fulfilled {
            debug!(wish = %wish, "Wish fulfilled");
            self.registry.remove(ObjectId::Wish(wish));
        }
    }

    // === WISHES ===

    /// Match a settlement's pool against what its plan asks for now
    ///
    /// Standing wishes of a requested kind are kept and revalued, pairing the
    /// pool and the requests highest value first. A wish bound to a unit is
    /// kept either way since the unit is already on its way. The rest are
    /// disposed, which also orphans their parcels, and requests left over
    /// become new wishes.
    fn refresh_wishes(&mut self, colony: SettlementId, requests: &[WishRequest]) -> Result<()> {
        let mut open: Vec<WishRequest> = requests.to_vec();
        open.sort_by_key(|r| std::cmp::Reverse(r.value));
        for wish_id in self.registry.colony(colony)?.wishes.clone() {
            let Ok(wish) = self.registry.wish(wish_id) else {
                warn!(wish = %wish_id, "Pool lists a wish the registry does not hold");
                continue;
            };
            let kind = wish.kind;
            let en_route = matches!(wish.fulfiller(), Some(Fulfiller::Unit(_)));
            if let Some(pos) = open.iter().position(|r| r.kind == kind) {
                let request = open.remove(pos);
                self.registry.wish_mut(wish_id)?.value = request.value;
            } else if !en_route {
                self.registry.remove(ObjectId::Wish(wish_id));
            }
        }

        for request in open {
            self.registry
                .create_wish(|id| Wish::new(id, colony, request.value, request.kind))?;
        }

        let mut pool = self.registry.colony(colony)?.wishes.clone();
        pool.sort_by_key(|w| {
            let value = self.registry.wish(*w).map(|w| w.value).unwrap_or(i32::MIN);
            (std::cmp::Reverse(value), *w)
        });
        self.registry.colony_mut(colony)?.wishes = pool;
        Ok(())
    }

    // === GOODS ===

    /// Drop orphaned parcels and cover open goods wishes from other stockpiles
    fn offer_goods(&mut self, game: &GameState) -> Result<()> {
        let orphaned: Vec<_> = self
            .registry
            .parcels()
            .into_iter()
            .filter(|p| p.wish.map_or(true, |w| self.registry.wish(w).is_err()))
            .map(|p| p.id)
            .collect();
        for parcel in orphaned {
            self.registry.remove(ObjectId::Goods(parcel));
        }

        let mut open: Vec<(WishId, SettlementId)> = Vec::new();
        for colony in self.registry.colony_ids() {
            let Ok(c) = self.registry.colony(colony) else {
                continue;
            };
            for wish in &c.wishes {
                if let Ok(w) = self.registry.wish(*wish) {
                    if !w.is_bound() && matches!(w.kind, WishKind::Goods { .. }) {
                        open.push((*wish, colony));
                    }
                }
            }
        }

        for (wish_id, colony) in open {
            let wish = self.registry.wish(wish_id)?.clone();
            let WishKind::Goods { goods_type, amount } = wish.kind else {
                continue;
            };
            let source = game
                .settlements_of(self.faction)
                .filter(|s| s.id != colony)
                .map(|s| (s.stockpile.get(goods_type), s.id))
                .filter(|(stock, _)| *stock > 0)
                .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
            let Some((stock, source)) = source else {
                continue;
            };
            let parcel = self.registry.create_goods(|id| AiGoods {
                id,
                goods_type,
                amount: stock.min(amount),
                source,
                destination: wish.destination,
                wish: Some(wish_id),
                carrier: None,
            });
            self.registry.wish_mut(wish_id)?.bind(Fulfiller::Goods(parcel));
            debug!(wish = %wish_id, parcel = %parcel, source = %source, "Goods offered");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::military::GarrisonAdvisor;
    use crate::ai::site::TerrainSiteFinder;
    use crate::core::types::{TileId, WorkLocation};
    use crate::game::ScenarioBuilder;

    #[test]
    fn test_turn_populates_registry() {
        let (game, faction) = ScenarioBuilder::random(7, 2, 4).unwrap();
        let mut ai = FactionAi::new(faction, AiConfig::default());
        let report = ai
            .run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
            .unwrap();
        assert_eq!(report.colonies.len(), 2);
        for unit in game.units_of(faction) {
            assert!(ai.registry.contains(ObjectId::Unit(unit.id)));
        }
        assert_eq!(ai.registry.colony_ids().len(), 2);
    }

    #[test]
    fn test_wishes_stable_across_turns() {
        let (game, faction) = ScenarioBuilder::random(11, 1, 0).unwrap();
        let mut ai = FactionAi::new(faction, AiConfig::default());
        ai.run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
            .unwrap();
        let colony = ai.registry.colony_ids()[0];
        let first = ai.registry.colony(colony).unwrap().wishes.clone();
        ai.run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
            .unwrap();
        let second = ai.registry.colony(colony).unwrap().wishes.clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_vanished_settlement_disposed() {
        let mut b = ScenarioBuilder::new(5, 3, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Plymouth", 2, 1).unwrap();
        b.worker(colony, "model.unit.freeColonist", WorkLocation::Tile(TileId(1)))
            .unwrap();
        let mut game = b.build();
        let mut ai = FactionAi::new(dutch, AiConfig::default());
        ai.run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
            .unwrap();
        assert!(ai.registry.contains(ObjectId::Colony(colony)));

        game.settlements.remove(&colony);
        ai.run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
            .unwrap();
        assert!(!ai.registry.contains(ObjectId::Colony(colony)));
    }

    #[test]
    fn test_arrived_worker_retires_wish() {
        let mut b = ScenarioBuilder::new(5, 3, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", false);
        let colony = b.settlement(dutch, "Plymouth", 2, 1).unwrap();
        let walker = b
            .unit(dutch, "model.unit.freeColonist", UnitLocation::Tile(TileId(0)))
            .unwrap();
        let mut game = b.build();
        let colonist_type = game.rules.default_unit_type().unwrap();
        let mut ai = FactionAi::new(dutch, AiConfig::default());
        ai.sync(&game);
        let wish = ai
            .registry
            .create_wish(|id| {
                Wish::new(id, colony, 60, WishKind::Worker { unit_type: colonist_type, expert_needed: false })
            })
            .unwrap();
        ai.registry.wish_mut(wish).unwrap().bind(Fulfiller::Unit(walker));

        if let Some(u) = game.units.get_mut(&walker) {
            u.location = UnitLocation::Settlement(colony, WorkLocation::Tile(TileId(1)));
        }
        ai.sync(&game);
        assert!(!ai.registry.contains(ObjectId::Wish(wish)));
    }

    #[test]
    fn test_goods_wish_served_from_other_stockpile() {
        let mut b = ScenarioBuilder::new(12, 3, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let needy = b.settlement(dutch, "Needy", 1, 1).unwrap();
        let rich = b.settlement(dutch, "Rich", 8, 1).unwrap();
        b.stock(rich, "model.goods.tools", 80).unwrap();
        let game = b.build();
        let tools = game.rules.well_known().tools.unwrap();
        let mut ai = FactionAi::new(dutch, AiConfig::default());
        ai.sync(&game);
        let wish = ai
            .registry
            .create_wish(|id| Wish::new(id, needy, 40, WishKind::Goods { goods_type: tools, amount: 50 }))
            .unwrap();
        ai.offer_goods(&game).unwrap();

        let parcels = ai.registry.parcels();
        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].source, rich);
        assert_eq!(parcels[0].amount, 50);
        assert_eq!(
            ai.registry.wish(wish).unwrap().fulfiller(),
            Some(Fulfiller::Goods(parcels[0].id))
        );
    }

    fn tools_wish_on_offer() -> (GameState, FactionAi, SettlementId, WishId) {
        let mut b = ScenarioBuilder::new(12, 3, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let needy = b.settlement(dutch, "Needy", 1, 1).unwrap();
        let rich = b.settlement(dutch, "Rich", 8, 1).unwrap();
        b.build_target(needy, "model.building.schoolhouse").unwrap();
        b.stock(needy, "model.goods.hammers", 64).unwrap();
        b.stock(rich, "model.goods.tools", 80).unwrap();
        let game = b.build();
        let tools = game.rules.well_known().tools.unwrap();
        let mut ai = FactionAi::new(dutch, AiConfig::default());
        ai.sync(&game);
        let wish = ai
            .registry
            .create_wish(|id| Wish::new(id, needy, 40, WishKind::Goods { goods_type: tools, amount: 30 }))
            .unwrap();
        ai.offer_goods(&game).unwrap();
        (game, ai, needy, wish)
    }

    #[test]
    fn test_unneeded_goods_wish_and_parcel_go() {
        let (game, mut ai, needy, wish) = tools_wish_on_offer();
        assert_eq!(ai.registry.parcels().len(), 1);

        ai.refresh_wishes(needy, &[]).unwrap();
        assert!(!ai.registry.contains(ObjectId::Wish(wish)));
        ai.offer_goods(&game).unwrap();
        assert!(ai.registry.parcels().is_empty());
    }

    #[test]
    fn test_delivered_goods_retire_wish() {
        let (mut game, mut ai, needy, wish) = tools_wish_on_offer();
        let tools = game.rules.well_known().tools.unwrap();
        ai.sync(&game);
        assert!(ai.registry.contains(ObjectId::Wish(wish)));

        if let Some(s) = game.settlements.get_mut(&needy) {
            s.stockpile.set(tools, 30);
        }
        ai.sync(&game);
        assert!(!ai.registry.contains(ObjectId::Wish(wish)));
    }

    #[test]
    fn test_refresh_keeps_values_on_their_wishes() {
        let mut b = ScenarioBuilder::new(5, 3, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let colony = b.settlement(dutch, "Plymouth", 2, 1).unwrap();
        let game = b.build();
        let kind = WishKind::Worker {
            unit_type: game.rules.default_unit_type().unwrap(),
            expert_needed: false,
        };
        let requests: Vec<WishRequest> = [20, 50, 35]
            .into_iter()
            .map(|value| WishRequest { kind, value })
            .collect();
        let mut ai = FactionAi::new(dutch, AiConfig::default());
        ai.sync(&game);

        let values = |ai: &FactionAi| -> Vec<(WishId, i32)> {
            let pool = &ai.registry.colony(colony).unwrap().wishes;
            pool.iter()
                .map(|w| (*w, ai.registry.wish(*w).unwrap().value))
                .collect()
        };
        ai.refresh_wishes(colony, &requests).unwrap();
        let first = values(&ai);
        assert_eq!(first.iter().map(|(_, v)| *v).collect::<Vec<_>>(), vec![50, 35, 20]);
        ai.refresh_wishes(colony, &requests).unwrap();
        assert_eq!(values(&ai), first);
    }

    #[test]
    fn test_forward_declared_colony_is_planned() {
        let mut b = ScenarioBuilder::new(12, 3, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let first = b.settlement(dutch, "Plymouth", 1, 1).unwrap();
        let second = b.settlement(dutch, "Jamestown", 8, 1).unwrap();
        let walker = b
            .unit(dutch, "model.unit.freeColonist", UnitLocation::Tile(TileId(5)))
            .unwrap();
        let game = b.build();
        let mut ai = FactionAi::new(dutch, AiConfig::default());
        ai.registry.declare(ObjectId::Colony(first));
        ai.registry.declare(ObjectId::Unit(walker));

        let report = ai
            .run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
            .unwrap();
        assert_eq!(report.colonies.len(), 2);
        assert!(ai.registry.colony(first).is_ok());
        assert!(ai.registry.colony(second).is_ok());
        assert!(report.missions.iter().any(|(u, _)| *u == walker));
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_dangling_plan_handle_does_not_stop_the_turn() {
        let (game, faction) = ScenarioBuilder::random(7, 2, 4).unwrap();
        let mut ai = FactionAi::new(faction, AiConfig::default());
        ai.run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
            .unwrap();
        let colony = ai.registry.colony_ids()[0];
        ai.registry
            .colony_mut(colony)
            .unwrap()
            .tile_improvements
            .push(crate::core::types::PlanId(900));

        let report = ai
            .run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
            .unwrap();
        assert_eq!(report.colonies.len(), 2);
        assert!(!ai
            .registry
            .colony(colony)
            .unwrap()
            .tile_improvements
            .contains(&crate::core::types::PlanId(900)));
    }
}
