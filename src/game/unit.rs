//! Units as the planner sees them

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, SettlementId, TileId, UnitId, UnitTypeId, WorkLocation};
use crate::rules::Rules;

/// Where a unit currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitLocation {
    Tile(TileId),
    /// Cargo of a carrier
    Aboard(UnitId),
    /// Working inside a settlement
    Settlement(SettlementId, WorkLocation),
    Europe,
}

/// Equipment role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Default,
    Pioneer,
    Scout,
    Soldier,
    Dragoon,
}

impl Role {
    pub fn is_armed(&self) -> bool {
        matches!(self, Role::Soldier | Role::Dragoon)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub owner: FactionId,
    pub unit_type: UnitTypeId,
    pub location: UnitLocation,
    pub role: Role,
    /// Tools carried by a pioneer
    pub tools: i32,
    /// Gold carried by a treasure train
    pub treasure: i32,
}

impl Unit {
    pub fn new(id: UnitId, owner: FactionId, unit_type: UnitTypeId, location: UnitLocation) -> Self {
        Self {
            id,
            owner,
            unit_type,
            location,
            role: Role::Default,
            tools: 0,
            treasure: 0,
        }
    }

    pub fn can_carry_treasure(&self, rules: &Rules) -> bool {
        rules.unit(self.unit_type).carries_treasure
    }

    pub fn can_scout(&self) -> bool {
        self.role == Role::Scout
    }

    pub fn is_naval(&self, rules: &Rules) -> bool {
        rules.unit(self.unit_type).naval
    }

    pub fn is_carrier(&self, rules: &Rules) -> bool {
        let ut = rules.unit(self.unit_type);
        ut.naval && ut.cargo_slots > 0
    }

    pub fn is_offensive(&self, rules: &Rules) -> bool {
        rules.unit(self.unit_type).offence > 0 || self.role.is_armed()
    }

    pub fn is_defensive(&self, rules: &Rules) -> bool {
        let ut = rules.unit(self.unit_type);
        !ut.naval && (ut.defence > 1 || self.role.is_armed())
    }

    /// A person able to found and work in colonies
    pub fn is_colonist(&self, rules: &Rules) -> bool {
        let ut = rules.unit(self.unit_type);
        ut.can_found_colony && !ut.naval
    }

    pub fn is_expert_soldier(&self, rules: &Rules) -> bool {
        rules.unit(self.unit_type).expert_soldier
    }

    pub fn has_tools(&self) -> bool {
        self.role == Role::Pioneer && self.tools > 0
    }

    pub fn carrier(&self) -> Option<UnitId> {
        match self.location {
            UnitLocation::Aboard(carrier) => Some(carrier),
            _ => None,
        }
    }
}
