//! Wishes - standing needs raised by settlements
//!
//! A wish names a destination, an importance value and what is needed there.
//! At most one fulfiller (a unit or a goods parcel) is bound at a time; a
//! bound wish is out of the matching pool until it is disposed or released.

use serde::{Deserialize, Serialize};

use crate::ai::registry::Disposal;
use crate::core::config::DispatchConfig;
use crate::core::types::{Destination, GoodsId, GoodsTypeId, SettlementId, UnitId, UnitTypeId, WishId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WishKind {
    Goods {
        goods_type: GoodsTypeId,
        amount: i32,
    },
    Worker {
        unit_type: UnitTypeId,
        /// Only this exact expert will do
        expert_needed: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Fulfiller {
    Unit(UnitId),
    Goods(GoodsId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wish {
    pub id: WishId,
    /// Settlement whose pool holds this wish
    pub colony: SettlementId,
    pub destination: Destination,
    pub value: i32,
    pub kind: WishKind,
    fulfiller: Option<Fulfiller>,
}

impl Wish {
    pub fn new(id: WishId, colony: SettlementId, value: i32, kind: WishKind) -> Self {
        Self {
            id,
            colony,
            destination: Destination::Settlement(colony),
            value,
            kind,
            fulfiller: None,
        }
    }

    pub fn fulfiller(&self) -> Option<Fulfiller> {
        self.fulfiller
    }

    pub fn is_bound(&self) -> bool {
        self.fulfiller.is_some()
    }

    pub fn is_fulfilled_by_unit(&self, unit: UnitId) -> bool {
        self.fulfiller == Some(Fulfiller::Unit(unit))
    }

    /// Bind a fulfiller; refused while another one is bound
    pub fn bind(&mut self, fulfiller: Fulfiller) -> bool {
        if self.fulfiller.is_some() {
            return false;
        }
        self.fulfiller = Some(fulfiller);
        true
    }

    pub fn release(&mut self) -> Option<Fulfiller> {
        self.fulfiller.take()
    }

    pub fn worker_type(&self) -> Option<UnitTypeId> {
        match self.kind {
            WishKind::Worker { unit_type, .. } => Some(unit_type),
            WishKind::Goods { .. } => None,
        }
    }

    /// Events the owning layer must apply once this wish is gone
    pub fn dispose(&self) -> Vec<Disposal> {
        let mut events = Vec::with_capacity(2);
        if let Some(fulfiller) = self.fulfiller {
            events.push(Disposal::UnbindFulfiller {
                wish: self.id,
                fulfiller,
            });
        }
        events.push(Disposal::DetachWish {
            colony: self.colony,
            wish: self.id,
        });
        events
    }
}

/// Travel turns charged against a wish or site
///
/// Unreachable destinations cost a fixed number of turns, lower when the
/// destination has no tile at all. The result is capped.
pub fn travel_turns(turns: Option<u32>, has_tile: bool, config: &DispatchConfig) -> u32 {
    let turns = turns.unwrap_or(if has_tile {
        config.unreachable_turns
    } else {
        config.unreachable_turns_without_tile
    });
    turns.min(config.travel_turn_cap)
}

/// Importance discounted by travel time
pub fn travel_score(value: i32, turns: u32, config: &DispatchConfig) -> i32 {
    value - config.travel_penalty * turns as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GoodsTypeId;

    fn worker_wish() -> Wish {
        Wish::new(
            WishId(1),
            SettlementId(2),
            100,
            WishKind::Worker {
                unit_type: UnitTypeId(0),
                expert_needed: false,
            },
        )
    }

    #[test]
    fn test_bind_only_once() {
        let mut wish = worker_wish();
        assert!(wish.bind(Fulfiller::Unit(UnitId(5))));
        assert!(!wish.bind(Fulfiller::Unit(UnitId(6))));
        assert!(wish.is_fulfilled_by_unit(UnitId(5)));
        assert_eq!(wish.release(), Some(Fulfiller::Unit(UnitId(5))));
        assert!(!wish.is_bound());
    }

    #[test]
    fn test_dispose_unbinds_and_detaches() {
        let mut wish = worker_wish();
        assert_eq!(
            wish.dispose(),
            vec![Disposal::DetachWish {
                colony: SettlementId(2),
                wish: WishId(1)
            }]
        );
        wish.bind(Fulfiller::Goods(GoodsId(9)));
        let events = wish.dispose();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            Disposal::UnbindFulfiller {
                wish: WishId(1),
                fulfiller: Fulfiller::Goods(GoodsId(9))
            }
        );
    }

    #[test]
    fn test_travel_score_caps_turns() {
        let config = DispatchConfig::default();
        assert_eq!(travel_score(100, travel_turns(Some(5), true, &config), &config), 90);
        assert_eq!(travel_score(100, travel_turns(Some(12), true, &config), &config), 90);
        assert_eq!(travel_score(100, travel_turns(Some(1), true, &config), &config), 98);
        // Unreachable: ten turns with a tile, five without, both capped at five
        assert_eq!(travel_turns(None, true, &config), 5);
        assert_eq!(travel_turns(None, false, &config), 5);
    }

    #[test]
    fn test_goods_wish_has_no_worker_type() {
        let wish = Wish::new(
            WishId(1),
            SettlementId(1),
            40,
            WishKind::Goods {
                goods_type: GoodsTypeId(3),
                amount: 20,
            },
        );
        assert!(wish.worker_type().is_none());
    }
}
