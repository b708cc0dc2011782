//! The classic colonization ruleset, hardcoded

use crate::core::types::{BuildingTypeId, GoodsTypeId};
use crate::rules::catalog::{
    BuildingKind, BuildingType, GoodsType, ImprovementType, ResourceType, Rules, TileType,
    UnitType,
};

fn goods(id: &str, name: &str, price: i32) -> GoodsType {
    GoodsType {
        id: format!("model.goods.{}", id),
        name: name.into(),
        is_storable: true,
        price,
        ..Default::default()
    }
}

fn farmed(id: &str, name: &str, price: i32) -> GoodsType {
    GoodsType {
        is_farmed: true,
        ..goods(id, name, price)
    }
}

fn made(id: &str, name: &str, price: i32, from: GoodsTypeId) -> GoodsType {
    GoodsType {
        made_from: Some(from),
        ..goods(id, name, price)
    }
}

fn building(id: &str, name: &str, kind: BuildingKind) -> BuildingType {
    BuildingType {
        id: format!("model.building.{}", id),
        name: name.into(),
        kind,
        level: 1,
        required_population: 1,
        ..Default::default()
    }
}

fn workshop(
    id: &str,
    name: &str,
    kind: BuildingKind,
    consumes: Option<GoodsTypeId>,
    produces: GoodsTypeId,
) -> BuildingType {
    BuildingType {
        produces: Some(produces),
        consumes,
        workplaces: 3,
        production_per_worker: 3,
        automatic: true,
        ..building(id, name, kind)
    }
}

fn upgrade(
    id: &str,
    name: &str,
    from: (BuildingTypeId, &BuildingType),
    population: u32,
    cost: Vec<(GoodsTypeId, i32)>,
) -> BuildingType {
    let (from_id, prev) = from;
    BuildingType {
        id: format!("model.building.{}", id),
        name: name.into(),
        level: prev.level + 1,
        upgrades_from: Some(from_id),
        required_population: population,
        required_goods: cost,
        automatic: false,
        ..prev.clone()
    }
}

fn expert(id: &str, name: &str, goods: GoodsTypeId, by_experience: bool) -> UnitType {
    UnitType {
        id: format!("model.unit.{}", id),
        name: name.into(),
        expert_production: Some(goods),
        learnable_by_experience: by_experience,
        defence: 1,
        can_found_colony: true,
        moves_per_turn: 1,
        ..Default::default()
    }
}

impl Rules {
    /// Build the classic ruleset
    pub fn with_defaults() -> Self {
        let mut r = Rules::new();

        // Goods
        let food = r.add_goods(GoodsType {
            is_food: true,
            ..farmed("food", "Food", 1)
        });
        let sugar = r.add_goods(farmed("sugar", "Sugar", 3));
        let tobacco = r.add_goods(farmed("tobacco", "Tobacco", 3));
        let cotton = r.add_goods(farmed("cotton", "Cotton", 2));
        let furs = r.add_goods(farmed("furs", "Furs", 4));
        let lumber = r.add_goods(farmed("lumber", "Lumber", 1));
        let ore = r.add_goods(farmed("ore", "Ore", 3));
        let silver = r.add_goods(farmed("silver", "Silver", 19));
        r.add_goods(goods("horses", "Horses", 2));
        let rum = r.add_goods(made("rum", "Rum", 11, sugar));
        let cigars = r.add_goods(made("cigars", "Cigars", 11, tobacco));
        let cloth = r.add_goods(made("cloth", "Cloth", 11, cotton));
        let coats = r.add_goods(made("coats", "Coats", 11, furs));
        let hammers = r.add_goods(GoodsType {
            is_building_material: true,
            is_storable: false,
            ..made("hammers", "Hammers", 0, lumber)
        });
        let tools = r.add_goods(made("tools", "Tools", 2, ore));
        let muskets = r.add_goods(GoodsType {
            is_military: true,
            ..made("muskets", "Muskets", 3, tools)
        });
        let bells = r.add_goods(GoodsType {
            is_liberty: true,
            is_storable: false,
            ..goods("bells", "Liberty Bells", 0)
        });

        // Buildings
        let town_hall = workshop("townHall", "Town Hall", BuildingKind::TownHall, None, bells);
        r.add_building(town_hall);

        let carpenter = workshop(
            "carpenterHouse",
            "Carpenter's House",
            BuildingKind::Carpentry,
            Some(lumber),
            hammers,
        );
        let carpenter_id = r.add_building(carpenter.clone());
        r.add_building(BuildingType {
            production_per_worker: 6,
            ..upgrade(
                "lumberMill",
                "Lumber Mill",
                (carpenter_id, &carpenter),
                3,
                vec![(hammers, 52)],
            )
        });

        let smith = workshop(
            "blacksmithHouse",
            "Blacksmith's House",
            BuildingKind::Blacksmith,
            Some(ore),
            tools,
        );
        let smith_id = r.add_building(smith.clone());
        r.add_building(upgrade(
            "blacksmithShop",
            "Blacksmith's Shop",
            (smith_id, &smith),
            4,
            vec![(hammers, 64), (tools, 20)],
        ));

        let armory = BuildingType {
            automatic: false,
            required_goods: vec![(hammers, 52)],
            ..workshop("armory", "Armory", BuildingKind::Armory, Some(tools), muskets)
        };
        let armory_id = r.add_building(armory.clone());
        let magazine = upgrade(
            "magazine",
            "Magazine",
            (armory_id, &armory),
            8,
            vec![(hammers, 120), (tools, 50)],
        );
        let magazine_id = r.add_building(magazine.clone());
        r.add_building(upgrade(
            "arsenal",
            "Arsenal",
            (magazine_id, &magazine),
            8,
            vec![(hammers, 240), (tools, 100)],
        ));

        let docks = BuildingType {
            requires_coast: true,
            required_goods: vec![(hammers, 52)],
            ..building("docks", "Docks", BuildingKind::Docks)
        };
        let docks_id = r.add_building(docks.clone());
        r.add_building(upgrade(
            "drydock",
            "Drydock",
            (docks_id, &docks),
            4,
            vec![(hammers, 80), (tools, 50)],
        ));

        r.add_building(BuildingType {
            required_population: 3,
            required_goods: vec![(hammers, 150), (tools, 50)],
            ..building("customHouse", "Custom House", BuildingKind::CustomsHouse)
        });

        let country = BuildingType {
            automatic: true,
            ..building("country", "Country", BuildingKind::Stable)
        };
        let country_id = r.add_building(country.clone());
        r.add_building(upgrade(
            "stables",
            "Stables",
            (country_id, &country),
            1,
            vec![(hammers, 64)],
        ));

        let stockade = BuildingType {
            required_population: 3,
            required_goods: vec![(hammers, 64)],
            ..building("stockade", "Stockade", BuildingKind::Stockade)
        };
        let stockade_id = r.add_building(stockade.clone());
        let fort = upgrade(
            "fort",
            "Fort",
            (stockade_id, &stockade),
            4,
            vec![(hammers, 120), (tools, 100)],
        );
        let fort_id = r.add_building(fort.clone());
        r.add_building(upgrade(
            "fortress",
            "Fortress",
            (fort_id, &fort),
            8,
            vec![(hammers, 320), (tools, 100)],
        ));

        let school = BuildingType {
            required_population: 4,
            required_goods: vec![(hammers, 64), (tools, 30)],
            workplaces: 1,
            ..building("schoolhouse", "Schoolhouse", BuildingKind::Schoolhouse)
        };
        let school_id = r.add_building(school.clone());
        r.add_building(upgrade(
            "college",
            "College",
            (school_id, &school),
            8,
            vec![(hammers, 160), (tools, 50)],
        ));

        let depot = BuildingType {
            automatic: true,
            storage_bonus: 100,
            ..building("depot", "Depot", BuildingKind::Warehouse)
        };
        let depot_id = r.add_building(depot.clone());
        let warehouse = BuildingType {
            storage_bonus: 200,
            ..upgrade(
                "warehouse",
                "Warehouse",
                (depot_id, &depot),
                1,
                vec![(hammers, 80)],
            )
        };
        let warehouse_id = r.add_building(warehouse.clone());
        r.add_building(BuildingType {
            storage_bonus: 300,
            ..upgrade(
                "warehouseExpansion",
                "Warehouse Expansion",
                (warehouse_id, &warehouse),
                1,
                vec![(hammers, 80), (tools, 20)],
            )
        });

        for (id, name, raw, out, shop, shop_name) in [
            ("distillerHouse", "Distiller's House", sugar, rum, "distillerShop", "Distiller's Shop"),
            ("tobacconistHouse", "Tobacconist's House", tobacco, cigars, "tobacconistShop", "Tobacconist's Shop"),
            ("weaverHouse", "Weaver's House", cotton, cloth, "weaverShop", "Weaver's Shop"),
            ("furTraderHouse", "Fur Trader's House", furs, coats, "furTradingPost", "Fur Trading Post"),
        ] {
            let house = workshop(id, name, BuildingKind::Manufacture, Some(raw), out);
            let house_id = r.add_building(house.clone());
            r.add_building(upgrade(
                shop,
                shop_name,
                (house_id, &house),
                3,
                vec![(hammers, 64), (tools, 20)],
            ));
        }

        // Units
        r.add_unit(UnitType {
            id: "model.unit.freeColonist".into(),
            name: "Free Colonist".into(),
            learns_by_experience: true,
            defence: 1,
            can_found_colony: true,
            moves_per_turn: 1,
            is_default: true,
            ..Default::default()
        });
        r.add_unit(UnitType {
            id: "model.unit.indenturedServant".into(),
            name: "Indentured Servant".into(),
            defence: 1,
            can_found_colony: true,
            moves_per_turn: 1,
            ..Default::default()
        });
        for (id, name, g, learnable) in [
            ("expertFarmer", "Expert Farmer", food, true),
            ("masterSugarPlanter", "Master Sugar Planter", sugar, true),
            ("masterTobaccoPlanter", "Master Tobacco Planter", tobacco, true),
            ("masterCottonPlanter", "Master Cotton Planter", cotton, true),
            ("expertFurTrapper", "Expert Fur Trapper", furs, true),
            ("expertLumberJack", "Expert Lumber Jack", lumber, true),
            ("expertOreMiner", "Expert Ore Miner", ore, true),
            ("expertSilverMiner", "Expert Silver Miner", silver, true),
            ("masterCarpenter", "Master Carpenter", hammers, false),
            ("masterBlacksmith", "Master Blacksmith", tools, false),
            ("masterGunsmith", "Master Gunsmith", muskets, false),
            ("masterDistiller", "Master Distiller", rum, false),
            ("masterTobacconist", "Master Tobacconist", cigars, false),
            ("masterWeaver", "Master Weaver", cloth, false),
            ("masterFurTrader", "Master Fur Trader", coats, false),
            ("elderStatesman", "Elder Statesman", bells, false),
        ] {
            r.add_unit(expert(id, name, g, learnable));
        }
        r.add_unit(UnitType {
            id: "model.unit.veteranSoldier".into(),
            name: "Veteran Soldier".into(),
            defence: 1,
            expert_soldier: true,
            can_found_colony: true,
            moves_per_turn: 1,
            ..Default::default()
        });
        r.add_unit(UnitType {
            id: "model.unit.seasonedScout".into(),
            name: "Seasoned Scout".into(),
            defence: 1,
            expert_scout: true,
            can_found_colony: true,
            moves_per_turn: 1,
            ..Default::default()
        });
        r.add_unit(UnitType {
            id: "model.unit.hardyPioneer".into(),
            name: "Hardy Pioneer".into(),
            defence: 1,
            can_found_colony: true,
            moves_per_turn: 1,
            ..Default::default()
        });
        r.add_unit(UnitType {
            id: "model.unit.artillery".into(),
            name: "Artillery".into(),
            offence: 7,
            defence: 5,
            moves_per_turn: 1,
            required_goods: vec![(hammers, 192), (tools, 40)],
            ..Default::default()
        });
        r.add_unit(UnitType {
            id: "model.unit.treasureTrain".into(),
            name: "Treasure Train".into(),
            carries_treasure: true,
            moves_per_turn: 1,
            ..Default::default()
        });
        for (id, name, slots, offence) in [
            ("caravel", "Caravel", 2, 0),
            ("merchantman", "Merchantman", 4, 0),
            ("galleon", "Galleon", 6, 0),
            ("privateer", "Privateer", 2, 8),
        ] {
            r.add_unit(UnitType {
                id: format!("model.unit.{}", id),
                name: name.into(),
                naval: true,
                cargo_slots: slots,
                offence,
                defence: 2,
                moves_per_turn: 4,
                ..Default::default()
            });
        }

        // Tiles
        let land = |id: &str, name: &str, potentials: Vec<(GoodsTypeId, i32)>| TileType {
            id: format!("model.tile.{}", id),
            name: name.into(),
            potentials,
            can_settle: true,
            ..Default::default()
        };
        r.add_tile(land("plains", "Plains", vec![(food, 5), (cotton, 2)]));
        r.add_tile(land("grassland", "Grassland", vec![(food, 3), (tobacco, 3)]));
        r.add_tile(land("prairie", "Prairie", vec![(food, 3), (cotton, 3)]));
        r.add_tile(land("savannah", "Savannah", vec![(food, 4), (sugar, 3)]));
        r.add_tile(land("marsh", "Marsh", vec![(food, 3), (tobacco, 2), (ore, 2)]));
        r.add_tile(land("desert", "Desert", vec![(food, 2), (cotton, 1), (ore, 2)]));
        r.add_tile(land("tundra", "Tundra", vec![(food, 3), (ore, 2)]));
        r.add_tile(land("hills", "Hills", vec![(food, 2), (ore, 4)]));
        r.add_tile(land("mountains", "Mountains", vec![(ore, 4), (silver, 1)]));
        r.add_tile(TileType {
            is_forest: true,
            ..land("mixedForest", "Mixed Forest", vec![(food, 3), (furs, 3), (lumber, 6)])
        });
        r.add_tile(TileType {
            is_forest: true,
            ..land("coniferForest", "Conifer Forest", vec![(food, 2), (furs, 2), (lumber, 6)])
        });
        r.add_tile(TileType {
            is_arctic: true,
            can_settle: false,
            ..land("arctic", "Arctic", vec![])
        });
        r.add_tile(TileType {
            id: "model.tile.ocean".into(),
            name: "Ocean".into(),
            potentials: vec![(food, 4)],
            is_water: true,
            ..Default::default()
        });

        // Resources
        for (id, name, g, bonus) in [
            ("grain", "Grain", food, 2),
            ("fish", "Fisheries", food, 4),
            ("sugar", "Sugar", sugar, 3),
            ("tobacco", "Tobacco", tobacco, 3),
            ("cotton", "Cotton", cotton, 3),
            ("game", "Game", furs, 3),
            ("timber", "Prime Timber", lumber, 4),
            ("ore", "Ore Deposit", ore, 2),
            ("silver", "Silver Deposit", silver, 2),
        ] {
            r.add_resource(ResourceType {
                id: format!("model.resource.{}", id),
                name: name.into(),
                bonuses: vec![(g, bonus)],
            });
        }

        // Improvements
        let non_forest: Vec<_> = ["plains", "grassland", "prairie", "savannah", "marsh", "desert", "tundra"]
            .iter()
            .filter_map(|t| r.tile_by_name(&format!("model.tile.{}", t)))
            .collect();
        r.add_improvement(ImprovementType {
            id: "model.improvement.plow".into(),
            name: "Plow".into(),
            bonuses: vec![(food, 1), (sugar, 1), (tobacco, 1), (cotton, 1)],
            allowed_on: non_forest,
            expended_tools: 20,
            ..Default::default()
        });
        r.add_improvement(ImprovementType {
            id: "model.improvement.road".into(),
            name: "Road".into(),
            bonuses: vec![(lumber, 2), (ore, 1), (silver, 1)],
            is_road: true,
            expended_tools: 20,
            ..Default::default()
        });

        r
    }
}
