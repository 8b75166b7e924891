//! The tile map and line-of-sight checks.
//!
//! Tiles are loaded by an external collaborator; the engine only needs a
//! sparse position-keyed table.

use std::collections::BTreeMap;

use ironhold_types::Position;

use crate::catalog::ItemCatalog;
use crate::item::ItemStore;
use crate::tile::Tile;

/// Sparse tile storage.
#[derive(Debug, Clone, Default)]
pub struct Map {
    tiles: BTreeMap<Position, Tile>,
}

impl Map {
    /// An empty map.
    pub const fn new() -> Self {
        Self {
            tiles: BTreeMap::new(),
        }
    }

    /// Ensure a tile exists at `position` and return it.
    pub fn ensure_tile(&mut self, position: Position) -> &mut Tile {
        self.tiles.entry(position).or_insert_with(|| Tile::new(position))
    }

    /// The tile at `position`.
    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.tiles.get(&position)
    }

    /// Mutable tile at `position`.
    pub fn tile_mut(&mut self, position: Position) -> Option<&mut Tile> {
        self.tiles.get_mut(&position)
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the map has no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles within the rectangle `range_x` by `range_y` around `center`,
    /// on the same floor.
    pub fn tiles_around(&self, center: Position, range_x: u16, range_y: u16) -> impl Iterator<Item = &Tile> {
        let low = Position::new(
            center.x.saturating_sub(range_x),
            center.y.saturating_sub(range_y),
            center.z,
        );
        let high = Position::new(
            center.x.saturating_add(range_x),
            center.y.saturating_add(range_y),
            center.z,
        );
        self.tiles
            .range(low..=high)
            .map(|(_, tile)| tile)
            .filter(move |tile| {
                let p = tile.position();
                p.z == center.z && p.y >= low.y && p.y <= high.y
            })
    }

    /// Whether nothing blocks a thrown object between `from` and `to`.
    ///
    /// Both ends must share a floor. Walks a Bresenham line and fails on
    /// any intermediate tile that is missing or blocks throwing. The end
    /// tiles themselves are not checked.
    pub fn line_of_sight(&self, from: Position, to: Position, catalog: &ItemCatalog, items: &ItemStore) -> bool {
        if !from.same_floor(to) {
            return false;
        }
        line_between(from, to)
            .into_iter()
            .filter(|step| *step != from && *step != to)
            .all(|step| {
                self.tile(step)
                    .is_some_and(|tile| !tile.blocks_throw(catalog, items))
            })
    }
}

/// Positions on the Bresenham line from `from` to `to`, inclusive.
fn line_between(from: Position, to: Position) -> Vec<Position> {
    let (mut x, mut y) = (i32::from(from.x), i32::from(from.y));
    let (end_x, end_y) = (i32::from(to.x), i32::from(to.y));
    let dx = end_x.saturating_sub(x).abs();
    let dy = end_y.saturating_sub(y).abs().saturating_neg();
    let step_x = if x < end_x { 1 } else { -1 };
    let step_y = if y < end_y { 1 } else { -1 };
    let mut err = dx.saturating_add(dy);
    let mut line = Vec::new();
    loop {
        if let (Ok(px), Ok(py)) = (u16::try_from(x), u16::try_from(y)) {
            line.push(Position::new(px, py, from.z));
        }
        if x == end_x && y == end_y {
            break;
        }
        let doubled = err.saturating_mul(2);
        if doubled >= dy {
            err = err.saturating_add(dy);
            x = x.saturating_add(step_x);
        }
        if doubled <= dx {
            err = err.saturating_add(dx);
            y = y.saturating_add(step_y);
        }
    }
    line
}
