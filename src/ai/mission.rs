//! Missions handed to units by the dispatcher

use serde::{Deserialize, Serialize};

use crate::ai::registry::Registry;
use crate::core::types::{
    Destination, FactionId, GoodsId, NativeSettlementId, PlanId, SettlementId, TileId, UnitId,
    WishId,
};
use crate::game::{GameState, UnitLocation};

/// Orders produced by a military advisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MilitaryOrder {
    Defend(SettlementId),
    Attack(TileId),
}

/// The one task a unit performs this turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionTask {
    CashInTreasure { destination: Destination },
    Scout { target: NativeSettlementId },
    Military(MilitaryOrder),
    /// Carry units and goods parcels
    Transport {
        units: Vec<UnitId>,
        goods: Vec<GoodsId>,
    },
    /// `plan` is `None` once the improvement plan has been disposed
    Pioneer { plan: Option<PlanId>, tile: TileId },
    RealizeWish { wish: WishId, destination: Destination },
    FoundColony { tile: TileId, value: i32 },
    Wander,
}

impl MissionTask {
    pub fn name(&self) -> &'static str {
        match self {
            MissionTask::CashInTreasure { .. } => "cash-in",
            MissionTask::Scout { .. } => "scout",
            MissionTask::Military(_) => "military",
            MissionTask::Transport { .. } => "transport",
            MissionTask::Pioneer { .. } => "pioneer",
            MissionTask::RealizeWish { .. } => "realize-wish",
            MissionTask::FoundColony { .. } => "found-colony",
            MissionTask::Wander => "wander",
        }
    }

    /// Add a passenger to a transport manifest; false for any other task
    pub fn add_passenger(&mut self, unit: UnitId) -> bool {
        match self {
            MissionTask::Transport { units, .. } => {
                if !units.contains(&unit) {
                    units.push(unit);
                }
                true
            }
            _ => false,
        }
    }

    /// Whether a task carried over from an earlier turn still applies
    pub fn is_valid(
        &self,
        game: &GameState,
        registry: &Registry,
        faction: FactionId,
        unit: UnitId,
    ) -> bool {
        let Some(u) = game.unit(unit) else {
            return false;
        };
        match self {
            MissionTask::CashInTreasure { destination } => {
                u.treasure > 0
                    && match destination {
                        Destination::Settlement(s) => game.settlement(*s).is_some(),
                        _ => true,
                    }
            }
            MissionTask::Scout { target } => {
                game.natives.contains_key(target) && !game.is_visited(*target, faction)
            }
            MissionTask::Military(MilitaryOrder::Defend(s)) => game
                .settlement(*s)
                .map_or(false, |s| s.owner == faction),
            MissionTask::Military(MilitaryOrder::Attack(t)) => game.map.tile(*t).is_some(),
            MissionTask::Transport { .. } => u.is_carrier(&game.rules),
            MissionTask::Pioneer { plan, .. } => {
                u.has_tools() && plan.map_or(false, |p| registry.plan(p).is_ok())
            }
            MissionTask::RealizeWish { wish, .. } => registry
                .wish(*wish)
                .map_or(false, |w| w.is_fulfilled_by_unit(unit)),
            MissionTask::FoundColony { tile, .. } => game
                .map
                .tile(*tile)
                .map_or(false, |t| t.settlement.is_none() && t.owner.is_none()),
            MissionTask::Wander => false,
        }
    }
}

/// Units currently aboard a carrier, ascending id
pub fn passengers(game: &GameState, carrier: UnitId) -> Vec<UnitId> {
    game.units
        .values()
        .filter(|u| u.location == UnitLocation::Aboard(carrier))
        .map(|u| u.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ScenarioBuilder;

    #[test]
    fn test_add_passenger_only_on_transport() {
        let mut transport = MissionTask::Transport {
            units: vec![],
            goods: vec![],
        };
        assert!(transport.add_passenger(UnitId(3)));
        assert!(transport.add_passenger(UnitId(3)));
        assert_eq!(
            transport,
            MissionTask::Transport {
                units: vec![UnitId(3)],
                goods: vec![]
            }
        );
        assert!(!MissionTask::Wander.add_passenger(UnitId(3)));
    }

    #[test]
    fn test_wander_never_carries_over() {
        let mut b = ScenarioBuilder::new(3, 3, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        let unit = b
            .unit(dutch, "model.unit.freeColonist", UnitLocation::Tile(TileId(0)))
            .unwrap();
        let game = b.build();
        let registry = Registry::new();
        assert!(!MissionTask::Wander.is_valid(&game, &registry, dutch, unit));
        let found = MissionTask::FoundColony {
            tile: TileId(4),
            value: 10,
        };
        assert!(found.is_valid(&game, &registry, dutch, unit));
        let orphaned = MissionTask::Pioneer {
            plan: None,
            tile: TileId(4),
        };
        assert!(!orphaned.is_valid(&game, &registry, dutch, unit));
    }
}
