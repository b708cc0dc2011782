//! Colony site search

use serde::Serialize;

use crate::core::types::{TileId, UnitId};
use crate::game::{tile_potential, GameState};

/// A candidate place to found a colony, valued before travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColonySite {
    pub tile: TileId,
    pub value: i32,
}

pub trait SiteFinder {
    fn find_site(&self, game: &GameState, unit: UnitId) -> Option<ColonySite>;
}

/// Values unclaimed land by what its centre and ring could produce
#[derive(Debug, Clone, Copy)]
pub struct TerrainSiteFinder {
    pub radius: u32,
    pub coastal_bonus: i32,
}

impl Default for TerrainSiteFinder {
    fn default() -> Self {
        Self {
            radius: 6,
            coastal_bonus: 10,
        }
    }
}

impl TerrainSiteFinder {
    pub fn new(radius: u32) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    /// Value of founding on `tile`, or `None` where no colony may stand
    pub fn value(&self, game: &GameState, tile: TileId) -> Option<i32> {
        let rules = &game.rules;
        let t = game.map.tile(tile)?;
        let tile_type = rules.tile(t.tile_type);
        if tile_type.is_water || !tile_type.can_settle || t.owner.is_some() || t.native_settlement.is_some() {
            return None;
        }
        let ring = game.map.neighbours(tile);
        let crowded = ring.iter().any(|n| {
            game.map
                .tile(*n)
                .map_or(false, |n| n.settlement.is_some() || n.native_settlement.is_some())
        });
        if crowded {
            return None;
        }
        let best = |id: TileId| {
            game.map.tile(id).map_or(0, |tile| {
                rules
                    .goods_ids()
                    .filter(|g| rules.goods(*g).is_farmed)
                    .map(|g| tile_potential(rules, tile, g, None))
                    .max()
                    .unwrap_or(0)
            })
        };
        let center_food = rules
            .well_known()
            .food
            .map_or(0, |f| tile_potential(rules, t, f, None));
        let ring_value: i32 = ring
            .iter()
            .filter(|n| game.map.tile(**n).map_or(false, |n| n.owner.is_none()))
            .map(|n| best(*n))
            .sum();
        let coastal = if game.map.is_coastal(tile, rules) {
            self.coastal_bonus
        } else {
            0
        };
        Some(2 * center_food + ring_value + coastal)
    }
}

impl SiteFinder for TerrainSiteFinder {
    fn find_site(&self, game: &GameState, unit: UnitId) -> Option<ColonySite> {
        let origin = game.unit_tile(unit)?;
        std::iter::once(origin)
            .chain(game.map.tiles_within(origin, self.radius))
            .filter_map(|tile| self.value(game, tile).map(|value| ColonySite { tile, value }))
            .max_by(|a, b| a.value.cmp(&b.value).then(b.tile.cmp(&a.tile)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ScenarioBuilder, UnitLocation};

    #[test]
    fn test_owned_land_is_not_a_site() {
        let mut b = ScenarioBuilder::new(7, 3, "model.tile.plains").unwrap();
        let dutch = b.faction("Dutch", true);
        b.settlement(dutch, "Plymouth", 1, 1).unwrap();
        let colonist = b
            .unit(dutch, "model.unit.freeColonist", UnitLocation::Tile(TileId(8)))
            .unwrap();
        let game = b.build();
        let finder = TerrainSiteFinder::default();
        assert_eq!(finder.value(&game, TileId(8)), None);
        let site = finder.find_site(&game, colonist).unwrap();
        let x = game.map.tile(site.tile).unwrap().x;
        assert!(x >= 4, "site at x={} crowds the colony", x);
    }

    #[test]
    fn test_better_land_scores_higher() {
        let mut b = ScenarioBuilder::new(7, 3, "model.tile.tundra").unwrap();
        for y in 0..3 {
            b.tile(5, y, "model.tile.plains").unwrap();
            b.tile(6, y, "model.tile.plains").unwrap();
        }
        let game = b.build();
        let finder = TerrainSiteFinder::default();
        let poor = finder.value(&game, game.map.tile_at(1, 1).unwrap()).unwrap();
        let rich = finder.value(&game, game.map.tile_at(5, 1).unwrap()).unwrap();
        assert!(rich > poor);
    }
}
