//! Planner configuration with documented constants
//!
//! All tunables of the colony planner and the mission dispatcher live here.
//! Every section has a `Default` matching the classic rules, so a TOML file
//! only needs to mention the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

use crate::core::error::{AiError, Result};

/// Food eaten by every worker each turn
pub const FOOD_CONSUMPTION_PER_WORKER: i32 = 2;

/// Maximum number of extra manufacturing workers added per building
pub const MAX_LEVEL: usize = 3;

/// Colony planning tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyPlanConfig {
    /// Food eaten by each planned worker per turn
    pub food_consumption_per_worker: i32,
    /// Extra workers the headroom phase may add to one building
    pub max_level: usize,
    /// Tiles whose food potential is at or below this are not worth working for food
    pub useless_food_threshold: i32,
    /// Surplus food required before another manufacturing worker is added
    pub food_headroom: i32,
}

impl Default for ColonyPlanConfig {
    fn default() -> Self {
        Self {
            food_consumption_per_worker: FOOD_CONSUMPTION_PER_WORKER,
            max_level: MAX_LEVEL,
            useless_food_threshold: 2,
            food_headroom: 2,
        }
    }
}

/// Mission dispatch tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Score lost per turn of travel
    pub travel_penalty: i32,
    /// Travel turns beyond this are not penalised further
    pub travel_turn_cap: u32,
    /// Assumed travel time to an unreachable destination without a tile (Europe)
    pub unreachable_turns_without_tile: u32,
    /// Assumed travel time to an unreachable destination on the map
    pub unreachable_turns: u32,
    /// After this turn plain armed colonists are handed to the military advisor
    pub military_turn_threshold: u32,
    /// How far from a colonist to look for colony sites (tiles)
    pub site_search_radius: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            travel_penalty: 2,
            travel_turn_cap: 5,
            unreachable_turns_without_tile: 5,
            unreachable_turns: 10,
            military_turn_threshold: 5,
            site_search_radius: 6,
        }
    }
}

/// Values given to wishes raised by colony plans
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WishConfig {
    pub worker_wish_value: i32,
    /// Extra value when the wish asks for an expert
    pub expert_wish_bonus: i32,
    pub goods_wish_value: i32,
    /// Extra value per unit of planned production at the unstaffed location
    pub value_per_production: i32,
}

impl Default for WishConfig {
    fn default() -> Self {
        Self {
            worker_wish_value: 50,
            expert_wish_bonus: 25,
            goods_wish_value: 40,
            value_per_production: 5,
        }
    }
}

/// Values given to tile improvement proposals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprovementConfig {
    /// Value per unit of extra production the improvement yields
    pub value_per_bonus: i32,
    /// Flat value of a road on a worked tile
    pub road_value: i32,
}

impl Default for ImprovementConfig {
    fn default() -> Self {
        Self {
            value_per_bonus: 20,
            road_value: 10,
        }
    }
}

/// Complete planner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub colony: ColonyPlanConfig,
    pub dispatch: DispatchConfig,
    pub wishes: WishConfig,
    pub improvements: ImprovementConfig,
}

impl AiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AiConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.colony.food_consumption_per_worker <= 0 {
            return Err(AiError::Config(format!(
                "food_consumption_per_worker ({}) must be positive",
                self.colony.food_consumption_per_worker
            )));
        }
        if self.colony.food_headroom < 0 {
            return Err(AiError::Config("food_headroom must not be negative".into()));
        }
        if self.dispatch.travel_turn_cap == 0 {
            return Err(AiError::Config("travel_turn_cap must be at least 1".into()));
        }
        if self.dispatch.travel_penalty < 0 {
            return Err(AiError::Config("travel_penalty must not be negative".into()));
        }
        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

static CONFIG: OnceLock<AiConfig> = OnceLock::new();

/// Get the global planner config (initializes with defaults if not set)
pub fn config() -> &'static AiConfig {
    CONFIG.get_or_init(AiConfig::default)
}

/// Set the global planner config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: AiConfig) -> std::result::Result<(), AiConfig> {
    CONFIG.set(config)
}
