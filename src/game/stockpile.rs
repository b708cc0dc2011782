//! Stockpile - settlement-level goods storage

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::GoodsTypeId;
use crate::rules::Rules;

/// Goods held by a settlement, with one warehouse capacity shared by every storable type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stockpile {
    goods: AHashMap<GoodsTypeId, i32>,
    capacity: i32,
}

impl Stockpile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: i32) -> Self {
        Self {
            goods: AHashMap::new(),
            capacity,
        }
    }

    /// Warehouse capacity per storable goods type
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: i32) {
        self.capacity = capacity;
    }

    /// Get current amount of a goods type
    pub fn get(&self, goods: GoodsTypeId) -> i32 {
        self.goods.get(&goods).copied().unwrap_or(0)
    }

    pub fn set(&mut self, goods: GoodsTypeId, amount: i32) {
        self.goods.insert(goods, amount.max(0));
    }

    /// Add goods; storable goods are clamped to capacity. Returns amount actually added
    pub fn add(&mut self, goods: GoodsTypeId, amount: i32, rules: &Rules) -> i32 {
        let entry = self.goods.entry(goods).or_insert(0);
        let added = if rules.goods(goods).is_storable {
            amount.min((self.capacity - *entry).max(0))
        } else {
            amount
        };
        *entry += added;
        added
    }

    /// Remove goods, returns amount actually removed
    pub fn remove(&mut self, goods: GoodsTypeId, amount: i32) -> i32 {
        if let Some(entry) = self.goods.get_mut(&goods) {
            let removed = amount.min(*entry);
            *entry -= removed;
            removed
        } else {
            0
        }
    }

    /// Check if stockpile has enough of all required goods
    pub fn has_materials(&self, requirements: &[(GoodsTypeId, i32)]) -> bool {
        requirements.iter().all(|(g, amount)| self.get(*g) >= *amount)
    }

    /// Shortfall of each required goods type, omitting satisfied ones
    pub fn missing(&self, requirements: &[(GoodsTypeId, i32)]) -> Vec<(GoodsTypeId, i32)> {
        requirements
            .iter()
            .filter_map(|(g, amount)| {
                let short = amount - self.get(*g);
                (short > 0).then_some((*g, short))
            })
            .collect()
    }

    /// Whether any storable goods type has reached warehouse capacity
    pub fn any_at_capacity(&self, rules: &Rules) -> bool {
        self.capacity > 0
            && self
                .goods
                .iter()
                .any(|(g, amount)| rules.goods(*g).is_storable && *amount >= self.capacity)
    }
}
