//! Load a rules catalog from TOML
//!
//! Cross references (`made_from`, `upgrades_from`, `expert_production`, ...)
//! are written as identifier strings and resolved after every goods and tile
//! type is known. Buildings must list their predecessor before the upgrade.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::core::types::{GoodsTypeId, TileTypeId};
use crate::rules::catalog::{
    BuildingKind, BuildingType, GoodsType, ImprovementType, ResourceType, Rules, TileType,
    UnitType,
};

/// Errors that can occur when loading a rules catalog
#[derive(Debug, Error)]
pub enum RulesLoadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("{owner} references unknown goods type {name}")]
    UnknownGoods { owner: String, name: String },
    #[error("{owner} references unknown building type {name}")]
    UnknownBuilding { owner: String, name: String },
    #[error("{owner} references unknown tile type {name}")]
    UnknownTile { owner: String, name: String },
    #[error("Duplicate identifier: {0}")]
    Duplicate(String),
}

/// TOML representation of a rules file
#[derive(Debug, Deserialize)]
struct TomlRules {
    #[serde(default)]
    goods: Vec<TomlGoods>,
    #[serde(default)]
    buildings: Vec<TomlBuilding>,
    #[serde(default)]
    units: Vec<TomlUnit>,
    #[serde(default)]
    tiles: Vec<TomlTile>,
    #[serde(default)]
    resources: Vec<TomlResource>,
    #[serde(default)]
    improvements: Vec<TomlImprovement>,
}

#[derive(Debug, Deserialize)]
struct TomlAmount {
    goods: String,
    amount: i32,
}

#[derive(Debug, Deserialize)]
struct TomlGoods {
    id: String,
    name: String,
    #[serde(default)]
    food: bool,
    #[serde(default)]
    farmed: bool,
    #[serde(default = "default_true")]
    storable: bool,
    #[serde(default)]
    liberty: bool,
    #[serde(default)]
    building_material: bool,
    #[serde(default)]
    military: bool,
    made_from: Option<String>,
    #[serde(default)]
    price: i32,
}

#[derive(Debug, Deserialize)]
struct TomlBuilding {
    id: String,
    name: String,
    #[serde(default)]
    kind: BuildingKind,
    upgrades_from: Option<String>,
    produces: Option<String>,
    consumes: Option<String>,
    #[serde(default)]
    workplaces: u32,
    #[serde(default)]
    production_per_worker: i32,
    #[serde(default = "default_one")]
    required_population: u32,
    #[serde(default)]
    required_goods: Vec<TomlAmount>,
    #[serde(default)]
    requires_coast: bool,
    #[serde(default)]
    storage_bonus: i32,
    #[serde(default)]
    automatic: bool,
}

#[derive(Debug, Deserialize)]
struct TomlUnit {
    id: String,
    name: String,
    expert_production: Option<String>,
    #[serde(default)]
    learns_by_experience: bool,
    #[serde(default)]
    learnable_by_experience: bool,
    #[serde(default)]
    offence: i32,
    #[serde(default)]
    defence: i32,
    #[serde(default)]
    can_found_colony: bool,
    #[serde(default)]
    carries_treasure: bool,
    #[serde(default)]
    expert_scout: bool,
    #[serde(default)]
    expert_soldier: bool,
    #[serde(default)]
    naval: bool,
    #[serde(default)]
    cargo_slots: u32,
    #[serde(default = "default_one")]
    moves_per_turn: u32,
    #[serde(default)]
    required_goods: Vec<TomlAmount>,
    #[serde(default)]
    default: bool,
}

#[derive(Debug, Deserialize)]
struct TomlTile {
    id: String,
    name: String,
    #[serde(default)]
    potentials: Vec<TomlAmount>,
    #[serde(default)]
    water: bool,
    #[serde(default)]
    arctic: bool,
    #[serde(default = "default_true")]
    can_settle: bool,
    #[serde(default)]
    forest: bool,
}

#[derive(Debug, Deserialize)]
struct TomlResource {
    id: String,
    name: String,
    #[serde(default)]
    bonuses: Vec<TomlAmount>,
}

#[derive(Debug, Deserialize)]
struct TomlImprovement {
    id: String,
    name: String,
    #[serde(default)]
    bonuses: Vec<TomlAmount>,
    #[serde(default)]
    allowed_on: Vec<String>,
    #[serde(default)]
    road: bool,
    #[serde(default)]
    expended_tools: i32,
}

fn default_true() -> bool {
    true
}

fn default_one() -> u32 {
    1
}

/// Load rules from a TOML file on disk
pub fn load_rules_file(path: &Path) -> Result<Rules, RulesLoadError> {
    let content = std::fs::read_to_string(path)?;
    load_rules_toml(&content)
}

/// Parse rules from a TOML string
pub fn load_rules_toml(content: &str) -> Result<Rules, RulesLoadError> {
    let data: TomlRules = toml::from_str(content)?;
    let mut rules = Rules::new();

    // Goods first without inputs, so `made_from` may point forwards
    for g in &data.goods {
        if rules.lookup(&g.id).is_some() {
            return Err(RulesLoadError::Duplicate(g.id.clone()));
        }
        rules.add_goods(GoodsType {
            id: g.id.clone(),
            name: g.name.clone(),
            is_food: g.food,
            is_farmed: g.farmed,
            is_storable: g.storable,
            is_liberty: g.liberty,
            is_building_material: g.building_material,
            is_military: g.military,
            made_from: None,
            price: g.price,
        });
    }
    for g in &data.goods {
        if let Some(from) = &g.made_from {
            let from_id = goods_ref(&rules, &g.id, from)?;
            let own = goods_ref(&rules, &g.id, &g.id)?;
            rules.set_made_from(own, Some(from_id));
        }
    }

    for t in data.tiles {
        let potentials = amounts(&rules, &t.id, &t.potentials)?;
        rules.add_tile(TileType {
            id: t.id,
            name: t.name,
            potentials,
            is_water: t.water,
            is_arctic: t.arctic,
            can_settle: t.can_settle && !t.water,
            is_forest: t.forest,
        });
    }

    for b in data.buildings {
        let upgrades_from = match &b.upgrades_from {
            Some(name) => Some(rules.building_by_name(name).ok_or_else(|| {
                RulesLoadError::UnknownBuilding {
                    owner: b.id.clone(),
                    name: name.clone(),
                }
            })?),
            None => None,
        };
        let level = upgrades_from
            .map(|prev| rules.building(prev).level + 1)
            .unwrap_or(1);
        let produces = optional_goods(&rules, &b.id, b.produces.as_deref())?;
        let consumes = optional_goods(&rules, &b.id, b.consumes.as_deref())?;
        let required_goods = amounts(&rules, &b.id, &b.required_goods)?;
        rules.add_building(BuildingType {
            id: b.id,
            name: b.name,
            kind: b.kind,
            level,
            upgrades_to: None,
            upgrades_from,
            produces,
            consumes,
            workplaces: b.workplaces,
            production_per_worker: b.production_per_worker,
            required_population: b.required_population,
            required_goods,
            requires_coast: b.requires_coast,
            storage_bonus: b.storage_bonus,
            automatic: b.automatic,
        });
    }

    for u in data.units {
        let expert_production = optional_goods(&rules, &u.id, u.expert_production.as_deref())?;
        let required_goods = amounts(&rules, &u.id, &u.required_goods)?;
        rules.add_unit(UnitType {
            id: u.id,
            name: u.name,
            expert_production,
            learns_by_experience: u.learns_by_experience,
            learnable_by_experience: u.learnable_by_experience,
            offence: u.offence,
            defence: u.defence,
            can_found_colony: u.can_found_colony,
            carries_treasure: u.carries_treasure,
            expert_scout: u.expert_scout,
            expert_soldier: u.expert_soldier,
            naval: u.naval,
            cargo_slots: u.cargo_slots,
            moves_per_turn: u.moves_per_turn,
            required_goods,
            is_default: u.default,
        });
    }

    for r in data.resources {
        let bonuses = amounts(&rules, &r.id, &r.bonuses)?;
        rules.add_resource(ResourceType {
            id: r.id,
            name: r.name,
            bonuses,
        });
    }

    for i in data.improvements {
        let bonuses = amounts(&rules, &i.id, &i.bonuses)?;
        let allowed_on = i
            .allowed_on
            .iter()
            .map(|name| tile_ref(&rules, &i.id, name))
            .collect::<Result<Vec<_>, _>>()?;
        rules.add_improvement(ImprovementType {
            id: i.id,
            name: i.name,
            bonuses,
            allowed_on,
            is_road: i.road,
            expended_tools: i.expended_tools,
        });
    }

    Ok(rules)
}

fn goods_ref(rules: &Rules, owner: &str, name: &str) -> Result<GoodsTypeId, RulesLoadError> {
    rules
        .goods_by_name(name)
        .ok_or_else(|| RulesLoadError::UnknownGoods {
            owner: owner.to_string(),
            name: name.to_string(),
        })
}

fn tile_ref(rules: &Rules, owner: &str, name: &str) -> Result<TileTypeId, RulesLoadError> {
    rules
        .tile_by_name(name)
        .ok_or_else(|| RulesLoadError::UnknownTile {
            owner: owner.to_string(),
            name: name.to_string(),
        })
}

fn optional_goods(
    rules: &Rules,
    owner: &str,
    name: Option<&str>,
) -> Result<Option<GoodsTypeId>, RulesLoadError> {
    name.map(|n| goods_ref(rules, owner, n)).transpose()
}

fn amounts(
    rules: &Rules,
    owner: &str,
    list: &[TomlAmount],
) -> Result<Vec<(GoodsTypeId, i32)>, RulesLoadError> {
    list.iter()
        .map(|a| Ok((goods_ref(rules, owner, &a.goods)?, a.amount)))
        .collect()
}
