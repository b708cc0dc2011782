//! Integration tests for colony planning
//!
//! These tests drive [`ColonyPlan`] and the per-turn [`FactionAi`] through
//! hand-built settlements and check the plan, wish pool and improvement
//! plans together.

use colony_ai::ai::colony_plan::ColonyPlan;
use colony_ai::ai::military::GarrisonAdvisor;
use colony_ai::ai::mission::MissionTask;
use colony_ai::ai::registry::ObjectId;
use colony_ai::ai::site::TerrainSiteFinder;
use colony_ai::ai::wish::WishKind;
use colony_ai::ai::FactionAi;
use colony_ai::core::config::AiConfig;
use colony_ai::core::types::{TileId, WorkLocation};
use colony_ai::game::{Buildable, ScenarioBuilder, UnitLocation};

// ============================================================================
// Plan shape
// ============================================================================

/// A settlement with one plain tile and no buildings works that tile for
/// food and queues only the default defences
#[test]
fn test_single_food_tile_settlement() {
    let mut b = ScenarioBuilder::new(2, 1, "model.tile.plains").unwrap();
    let dutch = b.faction("Dutch", true);
    let colony = b.settlement(dutch, "Plymouth", 0, 0).unwrap();
    let game = b.build();
    let rules = &game.rules;
    let food = rules.well_known().food.unwrap();

    let plan = ColonyPlan::new(&game, colony, &AiConfig::default().colony);

    assert_eq!(plan.work_plans().len(), 1);
    let only = plan.work_plans()[0];
    assert_eq!(only.goods, food);
    assert_eq!(only.production, 5);
    assert_eq!(only.location, WorkLocation::Tile(TileId(1)));
    assert_eq!(
        plan.build_queue(),
        &[
            Buildable::Building(rules.building_by_name("model.building.stockade").unwrap()),
            Buildable::Building(rules.building_by_name("model.building.armory").unwrap()),
            Buildable::Unit(rules.unit_by_name("model.unit.artillery").unwrap()),
        ]
    );
    assert!(plan.food_production() >= plan.food_consumption());
}

/// Every planned tile belongs to the settlement and appears once
#[test]
fn test_random_plans_use_own_tiles_once() {
    let (game, faction) = ScenarioBuilder::random(5, 3, 0).unwrap();
    for settlement in game.settlements_of(faction) {
        let plan = ColonyPlan::new(&game, settlement.id, &AiConfig::default().colony);
        let own = game.work_tiles(settlement.id);
        let tiles = plan.planned_tiles();
        for tile in &tiles {
            assert!(own.contains(tile), "{} is not worked by {}", tile, settlement.id);
        }
        let mut unique = tiles.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), tiles.len());
    }
}

// ============================================================================
// Turn pipeline
// ============================================================================

/// Unstaffed locations become worker wishes in the settlement's pool,
/// highest value first
#[test]
fn test_vacancies_become_wishes() {
    let mut b = ScenarioBuilder::new(5, 3, "model.tile.plains").unwrap();
    let dutch = b.faction("Dutch", true);
    let colony = b.settlement(dutch, "Plymouth", 2, 1).unwrap();
    b.starting_buildings(colony).unwrap();
    b.worker(colony, "model.unit.freeColonist", WorkLocation::Tile(TileId(1)))
        .unwrap();
    let game = b.build();

    let mut ai = FactionAi::new(dutch, AiConfig::default());
    let report = ai
        .run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
        .unwrap();

    let plan = &report.colonies[0];
    assert!(!plan.vacancies().is_empty());
    let pool = &ai.registry.colony(colony).unwrap().wishes;
    let workers = pool
        .iter()
        .filter(|w| matches!(ai.registry.wish(**w).unwrap().kind, WishKind::Worker { .. }))
        .count();
    assert_eq!(workers, plan.vacancies().len());
    let values: Vec<i32> = pool.iter().map(|w| ai.registry.wish(*w).unwrap().value).collect();
    assert!(values.windows(2).all(|v| v[0] >= v[1]));
}

/// A pioneer is sent to the settlement's most valuable improvement
#[test]
fn test_pioneer_takes_improvement_plan() {
    let mut b = ScenarioBuilder::new(6, 3, "model.tile.plains").unwrap();
    let dutch = b.faction("Dutch", true);
    let colony = b.settlement(dutch, "Plymouth", 1, 1).unwrap();
    b.worker(colony, "model.unit.freeColonist", WorkLocation::Tile(TileId(0)))
        .unwrap();
    let pioneer = b
        .unit(dutch, "model.unit.hardyPioneer", UnitLocation::Tile(TileId(4)))
        .unwrap();
    b.equip(pioneer, colony_ai::game::Role::Pioneer).unwrap();
    let game = b.build();

    let mut ai = FactionAi::new(dutch, AiConfig::default());
    let report = ai
        .run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
        .unwrap();

    let plans = &ai.registry.colony(colony).unwrap().tile_improvements;
    assert!(!plans.is_empty());
    let mission = report
        .missions
        .iter()
        .find(|(u, _)| *u == pioneer)
        .map(|(_, m)| m.clone());
    match mission {
        Some(MissionTask::Pioneer { plan: Some(plan), .. }) => {
            assert_eq!(ai.registry.plan(plan).unwrap().pioneer, Some(pioneer));
            assert!(ai.registry.contains(ObjectId::TileImprovement(plan)));
        }
        other => panic!("pioneer got {:?}", other),
    }
}

/// Planning twice on the same world leaves the same plans and pool
#[test]
fn test_turns_are_stable_on_unchanged_world() {
    let (game, faction) = ScenarioBuilder::random(23, 2, 3).unwrap();
    let mut ai = FactionAi::new(faction, AiConfig::default());
    let first = ai
        .run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
        .unwrap();
    let pools: Vec<_> = ai
        .registry
        .colony_ids()
        .into_iter()
        .map(|c| ai.registry.colony(c).unwrap().wishes.clone())
        .collect();
    let second = ai
        .run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default())
        .unwrap();
    let again: Vec<_> = ai
        .registry
        .colony_ids()
        .into_iter()
        .map(|c| ai.registry.colony(c).unwrap().wishes.clone())
        .collect();

    for (a, b) in first.colonies.iter().zip(&second.colonies) {
        assert_eq!(a.work_plans(), b.work_plans());
        assert_eq!(a.build_queue(), b.build_queue());
    }
    assert_eq!(pools, again);
}
