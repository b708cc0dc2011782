//! Colony AI - Entry Point
//!
//! Generates a seeded random world, plans one turn for its faction and prints
//! the colony plans and missions.

use std::path::PathBuf;

use clap::Parser;
use colony_ai::ai::military::GarrisonAdvisor;
use colony_ai::ai::site::TerrainSiteFinder;
use colony_ai::ai::{FactionAi, TurnReport};
use colony_ai::core::config::{self, AiConfig};
use colony_ai::core::error::{AiError, Result};
use colony_ai::core::types::WorkLocation;
use colony_ai::game::{GameState, ScenarioBuilder};
use colony_ai::rules::{load_rules_file, Rules};

/// Plan one AI turn on a generated world
#[derive(Parser, Debug)]
#[command(name = "colony-ai")]
#[command(about = "Plan colonies and dispatch units for one AI turn")]
struct Args {
    /// Random seed for the generated world
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of settlements to place
    #[arg(long, default_value_t = 3)]
    settlements: usize,

    /// Number of free units to place
    #[arg(long, default_value_t = 6)]
    units: usize,

    /// Planner configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rules catalog (TOML); the classic rules when omitted
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Turns to plan in a row
    #[arg(long, default_value_t = 1)]
    turns: u32,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "colony_ai=debug" } else { "colony_ai=info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &args.config {
        if config::set_config(AiConfig::load(path)?).is_err() {
            tracing::warn!("Planner config already set, ignoring {}", path.display());
        }
    }
    let config = config::config().clone();
    let site_finder = TerrainSiteFinder::new(config.dispatch.site_search_radius);

    let rules = match &args.rules {
        Some(path) => load_rules_file(path).map_err(|e| AiError::Config(e.to_string()))?,
        None => Rules::with_defaults(),
    };
    let (mut game, faction) =
        ScenarioBuilder::random_with_rules(rules, args.seed, args.settlements, args.units)?;
    tracing::info!(seed = args.seed, units = game.units.len(), "World generated");

    let mut ai = FactionAi::new(faction, config);
    for _ in 0..args.turns.max(1) {
        let report = ai.run_turn(&game, &GarrisonAdvisor, &site_finder)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&game, &report);
        }
        game.turn += 1;
    }
    Ok(())
}

fn print_report(game: &GameState, report: &TurnReport) {
    let rules = &game.rules;
    println!("=== TURN {} ({}) ===", report.turn, report.faction);
    for plan in &report.colonies {
        let name = game
            .settlement(plan.settlement())
            .map_or("?", |s| s.name.as_str());
        println!("\n{} [{}]", name, plan.settlement());
        println!(
            "  food {} / {}{}",
            plan.food_production(),
            plan.food_consumption(),
            if plan.is_minimal() { " (minimal)" } else { "" }
        );
        for p in plan.work_plans() {
            let at = match p.location {
                WorkLocation::Tile(t) => t.to_string(),
                WorkLocation::Building(b) => rules.building(b).name.clone(),
            };
            println!("  {:>4} {:<12} at {}", p.production, rules.goods(p.goods).name, at);
        }
        let queue: Vec<&str> = plan.build_queue().iter().map(|b| b.name(rules)).collect();
        println!("  build: {}", queue.join(", "));
        println!(
            "  {} assigned, {} vacant",
            plan.assignments().len(),
            plan.vacancies().len()
        );
    }

    println!("\nMissions:");
    for (unit, mission) in &report.missions {
        let unit_type = game
            .unit(*unit)
            .map_or("?", |u| rules.unit(u.unit_type).name.as_str());
        println!("  {} ({}): {}", unit, unit_type, mission.name());
    }
    for unit in &report.kept {
        println!("  {} keeps its mission", unit);
    }
    for (unit, error) in &report.errors {
        println!("  {} failed: {}", unit, error);
    }
}
