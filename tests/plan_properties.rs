//! Property tests over generated worlds
//!
//! Seeds, settlement counts and unit counts are drawn by proptest; every
//! generated world must satisfy the planner's invariants.

use std::collections::BTreeSet;

use colony_ai::ai::colony_plan::ColonyPlan;
use colony_ai::ai::military::GarrisonAdvisor;
use colony_ai::ai::mission::MissionTask;
use colony_ai::ai::site::TerrainSiteFinder;
use colony_ai::ai::FactionAi;
use colony_ai::core::config::AiConfig;
use colony_ai::core::types::WorkLocation;
use colony_ai::game::ScenarioBuilder;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_planned_tiles_are_distinct_and_owned(seed in any::<u64>(), settlements in 1usize..4) {
        let (game, faction) = ScenarioBuilder::random(seed, settlements, 0).unwrap();
        for s in game.settlements_of(faction) {
            let plan = ColonyPlan::new(&game, s.id, &AiConfig::default().colony);
            let own = game.work_tiles(s.id);
            let tiles = plan.planned_tiles();
            let distinct: BTreeSet<_> = tiles.iter().copied().collect();
            prop_assert_eq!(distinct.len(), tiles.len());
            prop_assert!(tiles.iter().all(|t| own.contains(t)));
            prop_assert!(!tiles.contains(&s.tile));
        }
    }

    #[test]
    fn prop_plan_feeds_itself_or_is_minimal(seed in any::<u64>(), settlements in 1usize..4) {
        let (game, faction) = ScenarioBuilder::random(seed, settlements, 0).unwrap();
        for s in game.settlements_of(faction) {
            let plan = ColonyPlan::new(&game, s.id, &AiConfig::default().colony);
            prop_assert!(
                plan.food_production() >= plan.food_consumption() || plan.is_minimal(),
                "{}: food {} < {}", s.id, plan.food_production(), plan.food_consumption()
            );
        }
    }

    #[test]
    fn prop_assignment_is_consistent(seed in any::<u64>(), settlements in 1usize..4) {
        let (game, faction) = ScenarioBuilder::random(seed, settlements, 0).unwrap();
        for s in game.settlements_of(faction) {
            let mut plan = ColonyPlan::new(&game, s.id, &AiConfig::default().colony);
            plan.assign_workers(&game);
            let workers: BTreeSet<_> = game.settlement_workers(s.id).iter().map(|u| u.id).collect();
            let assigned: BTreeSet<_> = plan.assignments().iter().map(|a| a.unit).collect();
            prop_assert_eq!(assigned.len(), plan.assignments().len());
            prop_assert!(assigned.is_subset(&workers));
            prop_assert!(plan.assignments().len() + plan.vacancies().len() <= plan.work_plans().len());
            let tiles: Vec<_> = plan
                .assignments()
                .iter()
                .filter_map(|a| match a.location {
                    WorkLocation::Tile(t) => Some(t),
                    WorkLocation::Building(_) => None,
                })
                .collect();
            let distinct: BTreeSet<_> = tiles.iter().copied().collect();
            prop_assert_eq!(distinct.len(), tiles.len());
        }
    }

    #[test]
    fn prop_planning_is_idempotent(seed in any::<u64>()) {
        let (game, faction) = ScenarioBuilder::random(seed, 2, 0).unwrap();
        for s in game.settlements_of(faction) {
            let config = AiConfig::default().colony;
            let mut a = ColonyPlan::new(&game, s.id, &config);
            let mut b = ColonyPlan::new(&game, s.id, &config);
            a.assign_workers(&game);
            b.assign_workers(&game);
            prop_assert_eq!(a.work_plans(), b.work_plans());
            prop_assert_eq!(a.build_queue(), b.build_queue());
            prop_assert_eq!(a.assignments(), b.assignments());
        }
    }

    #[test]
    fn prop_each_unit_dispatched_once(seed in any::<u64>(), units in 0usize..10) {
        let (game, faction) = ScenarioBuilder::random(seed, 2, units).unwrap();
        let mut ai = FactionAi::new(faction, AiConfig::default());
        let report = ai.run_turn(&game, &GarrisonAdvisor, &TerrainSiteFinder::default()).unwrap();
        let mut seen = BTreeSet::new();
        let mut wishes = BTreeSet::new();
        for (unit, mission) in &report.missions {
            prop_assert!(seen.insert(*unit));
            if let MissionTask::RealizeWish { wish, .. } = mission {
                prop_assert!(wishes.insert(*wish));
            }
        }
    }
}
