//! Rectangular tile map with 8-way adjacency

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::types::{
    ImprovementTypeId, NativeSettlementId, ResourceTypeId, SettlementId, TileId, TileTypeId,
};
use crate::rules::Rules;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub x: i32,
    pub y: i32,
    pub tile_type: TileTypeId,
    pub resource: Option<ResourceTypeId>,
    pub improvements: Vec<ImprovementTypeId>,
    /// Settlement whose land this is
    pub owner: Option<SettlementId>,
    /// Settlement centred on this tile
    pub settlement: Option<SettlementId>,
    pub native_settlement: Option<NativeSettlementId>,
}

impl Tile {
    pub fn has_improvement(&self, improvement: ImprovementTypeId) -> bool {
        self.improvements.contains(&improvement)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Map {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Map {
    /// Create a map filled with one tile type
    pub fn new(width: i32, height: i32, fill: TileTypeId) -> Self {
        let mut tiles = Vec::with_capacity((width * height).max(0) as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile {
                    id: TileId((y * width + x) as u32),
                    x,
                    y,
                    tile_type: fill,
                    resource: None,
                    improvements: Vec::new(),
                    owner: None,
                    settlement: None,
                    native_settlement: None,
                });
            }
        }
        Self {
            width,
            height,
            tiles,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.0 as usize)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id.0 as usize)
    }

    pub fn tile_at(&self, x: i32, y: i32) -> Option<TileId> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(TileId((y * self.width + x) as u32))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Chebyshev distance between two tiles
    pub fn distance(&self, a: TileId, b: TileId) -> Option<u32> {
        let (ta, tb) = (self.tile(a)?, self.tile(b)?);
        Some((ta.x - tb.x).abs().max((ta.y - tb.y).abs()) as u32)
    }

    /// Up to eight adjacent tiles, in row-major order
    pub fn neighbours(&self, id: TileId) -> Vec<TileId> {
        let Some(tile) = self.tile(id) else {
            return Vec::new();
        };
        let mut result = Vec::with_capacity(8);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if let Some(n) = self.tile_at(tile.x + dx, tile.y + dy) {
                    result.push(n);
                }
            }
        }
        result
    }

    /// All tiles within `radius` (excluding the centre), in row-major order
    pub fn tiles_within(&self, id: TileId, radius: u32) -> Vec<TileId> {
        let Some(tile) = self.tile(id) else {
            return Vec::new();
        };
        let r = radius as i32;
        let mut result = Vec::new();
        for y in (tile.y - r)..=(tile.y + r) {
            for x in (tile.x - r)..=(tile.x + r) {
                if let Some(t) = self.tile_at(x, y) {
                    if t != id {
                        result.push(t);
                    }
                }
            }
        }
        result
    }

    pub fn is_water(&self, id: TileId, rules: &Rules) -> bool {
        self.tile(id)
            .map(|t| rules.tile(t.tile_type).is_water)
            .unwrap_or(false)
    }

    /// Land tile with at least one water neighbour
    pub fn is_coastal(&self, id: TileId, rules: &Rules) -> bool {
        !self.is_water(id, rules)
            && self
                .neighbours(id)
                .into_iter()
                .any(|n| self.is_water(n, rules))
    }

    /// Number of steps on land from `from` to `to`, if connected
    pub fn land_steps(&self, from: TileId, to: TileId, rules: &Rules) -> Option<u32> {
        if self.is_water(to, rules) {
            return None;
        }
        self.bfs(from, to, |id| !self.is_water(id, rules))
    }

    /// Number of steps by sea from `from` to `to`; `to` may be a coastal land tile
    pub fn sea_steps(&self, from: TileId, to: TileId, rules: &Rules) -> Option<u32> {
        self.bfs(from, to, |id| self.is_water(id, rules))
    }

    fn bfs(&self, from: TileId, to: TileId, passable: impl Fn(TileId) -> bool) -> Option<u32> {
        self.tile(from)?;
        self.tile(to)?;
        if from == to {
            return Some(0);
        }
        let mut dist = vec![u32::MAX; self.tiles.len()];
        let mut queue = VecDeque::new();
        dist[from.0 as usize] = 0;
        queue.push_back(from);
        while let Some(current) = queue.pop_front() {
            let d = dist[current.0 as usize];
            for n in self.neighbours(current) {
                if dist[n.0 as usize] != u32::MAX {
                    continue;
                }
                if n == to {
                    return Some(d + 1);
                }
                if passable(n) {
                    dist[n.0 as usize] = d + 1;
                    queue.push_back(n);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_and_map() -> (Rules, Map) {
        let rules = Rules::with_defaults();
        let plains = rules.tile_by_name("model.tile.plains").unwrap();
        (rules, Map::new(6, 4, plains))
    }

    #[test]
    fn test_neighbours_at_corner() {
        let (_, map) = rules_and_map();
        let corner = map.tile_at(0, 0).unwrap();
        assert_eq!(map.neighbours(corner).len(), 3);
        let middle = map.tile_at(2, 2).unwrap();
        assert_eq!(map.neighbours(middle).len(), 8);
    }

    #[test]
    fn test_distance_is_chebyshev() {
        let (_, map) = rules_and_map();
        let a = map.tile_at(0, 0).unwrap();
        let b = map.tile_at(3, 1).unwrap();
        assert_eq!(map.distance(a, b), Some(3));
    }

    #[test]
    fn test_land_steps_blocked_by_water() {
        let (rules, mut map) = rules_and_map();
        let ocean = rules.tile_by_name("model.tile.ocean").unwrap();
        for y in 0..4 {
            let id = map.tile_at(3, y).unwrap();
            map.tile_mut(id).unwrap().tile_type = ocean;
        }
        let west = map.tile_at(0, 1).unwrap();
        let east = map.tile_at(5, 1).unwrap();
        assert_eq!(map.land_steps(west, east, &rules), None);
        let near = map.tile_at(2, 2).unwrap();
        assert_eq!(map.land_steps(west, near, &rules), Some(2));
        assert!(map.is_coastal(near, &rules));
        assert!(!map.is_coastal(west, &rules));
    }

    #[test]
    fn test_sea_steps_reach_coast() {
        let (rules, mut map) = rules_and_map();
        let ocean = rules.tile_by_name("model.tile.ocean").unwrap();
        for x in 0..6 {
            let id = map.tile_at(x, 0).unwrap();
            map.tile_mut(id).unwrap().tile_type = ocean;
        }
        let start = map.tile_at(0, 0).unwrap();
        let port = map.tile_at(5, 1).unwrap();
        assert_eq!(map.sea_steps(start, port, &rules), Some(5));
        let inland = map.tile_at(5, 3).unwrap();
        assert_eq!(map.sea_steps(start, inland, &rules), None);
    }

    #[test]
    fn test_tiles_within_excludes_centre() {
        let (_, map) = rules_and_map();
        let centre = map.tile_at(2, 2).unwrap();
        let ring = map.tiles_within(centre, 1);
        assert_eq!(ring.len(), 8);
        assert!(!ring.contains(&centre));
    }
}
