//! Military mission assignment
//!
//! The dispatcher only decides *whether* a unit is handed to the military
//! layer. What it does there is up to a [`MilitaryAdvisor`].

use crate::ai::mission::MilitaryOrder;
use crate::core::types::UnitId;
use crate::game::{GameState, TravelEstimator};

pub trait MilitaryAdvisor {
    /// An order for the unit, or `None` to let the dispatcher continue
    fn military_mission(&self, game: &GameState, unit: UnitId) -> Option<MilitaryOrder>;
}

/// Sends land units to defend the reachable own settlement with the fewest defenders
#[derive(Debug, Clone, Copy, Default)]
pub struct GarrisonAdvisor;

impl MilitaryAdvisor for GarrisonAdvisor {
    fn military_mission(&self, game: &GameState, unit: UnitId) -> Option<MilitaryOrder> {
        let u = game.unit(unit)?;
        if u.is_naval(&game.rules) {
            return None;
        }
        game.settlements_of(u.owner)
            .filter_map(|s| {
                let turns = game.turns_to_reach(unit, s.tile)?;
                let defenders = game
                    .units_of(u.owner)
                    .filter(|d| d.id != unit && d.is_defensive(&game.rules))
                    .filter(|d| game.unit_tile(d.id) == Some(s.tile))
                    .count();
                Some((defenders, turns, s.id))
            })
            .min()
            .map(|(_, _, s)| MilitaryOrder::Defend(s))
    }
}
