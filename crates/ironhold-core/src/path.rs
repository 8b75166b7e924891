//! Path finding service.
//!
//! Operations consume path finding as a black box through [`PathFinder`].
//! Searching happens inside `execute`, so implementations must stay cheap;
//! an expensive search belongs outside the fire loop, feeding its result
//! back as a new operation.

use ironhold_types::{CreatureId, Direction, Position};
use ironhold_world::World;

/// How far a search got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    /// The path ends within the requested distance of the goal.
    Reached,
    /// The path gets closer but stops short.
    Partial,
    /// No step could be taken.
    Unreachable,
}

/// Result of a path search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResult {
    /// How far the search got.
    pub state: PathState,
    /// Where the path ends.
    pub reached: Position,
    /// Steps from the start, in order.
    pub directions: Vec<Direction>,
}

impl PathResult {
    /// A result with no steps.
    pub const fn unreachable(from: Position) -> Self {
        Self {
            state: PathState::Unreachable,
            reached: from,
            directions: Vec::new(),
        }
    }
}

/// Finds a walkable route between two positions.
pub trait PathFinder: Send + Sync + std::fmt::Debug {
    /// Find a route from `from` to within `target_distance` tiles of `to`
    /// for `creature`.
    fn find_between(
        &self,
        world: &World,
        from: Position,
        to: Position,
        creature: CreatureId,
        target_distance: u16,
    ) -> PathResult;
}

/// Greedy path finder that steps straight towards the goal.
///
/// When the direct step is blocked, a diagonal falls back to its two
/// cardinal components. It does not search around obstacles.
#[derive(Debug, Clone, Copy)]
pub struct StraightLinePathFinder {
    max_steps: u16,
}

impl StraightLinePathFinder {
    /// A finder that gives up after `max_steps` steps.
    pub const fn new(max_steps: u16) -> Self {
        Self { max_steps }
    }
}

impl Default for StraightLinePathFinder {
    fn default() -> Self {
        Self::new(64)
    }
}

const fn cardinal_components(direction: Direction) -> Option<[Direction; 2]> {
    match direction {
        Direction::NorthEast => Some([Direction::North, Direction::East]),
        Direction::NorthWest => Some([Direction::North, Direction::West]),
        Direction::SouthEast => Some([Direction::South, Direction::East]),
        Direction::SouthWest => Some([Direction::South, Direction::West]),
        Direction::North | Direction::East | Direction::South | Direction::West => None,
    }
}

impl PathFinder for StraightLinePathFinder {
    fn find_between(
        &self,
        world: &World,
        from: Position,
        to: Position,
        _creature: CreatureId,
        target_distance: u16,
    ) -> PathResult {
        if !from.same_floor(to) {
            return PathResult::unreachable(from);
        }
        let mut current = from;
        let mut directions = Vec::new();
        for _ in 0..self.max_steps {
            if current.distance_to(to) <= target_distance {
                return PathResult {
                    state: PathState::Reached,
                    reached: current,
                    directions,
                };
            }
            let Some(direct) = current.direction_to(to) else {
                break;
            };
            let candidates = cardinal_components(direct).map_or_else(|| vec![direct], |[a, b]| vec![direct, a, b]);
            let next = candidates.into_iter().find_map(|direction| {
                let position = current.step(direction)?;
                let closer = position.distance_to(to) <= current.distance_to(to);
                (closer && world.is_walkable(position)).then_some((direction, position))
            });
            let Some((direction, position)) = next else {
                break;
            };
            directions.push(direction);
            current = position;
        }
        let state = if current.distance_to(to) <= target_distance {
            PathState::Reached
        } else if directions.is_empty() {
            PathState::Unreachable
        } else {
            PathState::Partial
        };
        PathResult {
            state,
            reached: current,
            directions,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ironhold_types::ItemTypeId;
    use ironhold_world::{CreatureRegistry, Holder, ItemCatalog, ItemType, WorldSettings};

    use super::*;

    const GROUND: ItemTypeId = ItemTypeId(1);
    const WALL: ItemTypeId = ItemTypeId(2);

    fn world() -> World {
        let catalog = ItemCatalog::from_types([
            ItemType {
                ground: true,
                movable: false,
                ..ItemType::simple(GROUND.0, "floor")
            },
            ItemType {
                blocks_movement: true,
                movable: false,
                ..ItemType::simple(WALL.0, "wall")
            },
        ])
        .unwrap();
        let mut world = World::new(catalog, CreatureRegistry::default(), WorldSettings::default());
        for x in 0..8 {
            for y in 0..8 {
                world.add_tile(Position::new(x, y, 7), GROUND).unwrap();
            }
        }
        world
    }

    #[test]
    fn walks_straight_to_adjacent_tile() {
        let world = world();
        let result = StraightLinePathFinder::default().find_between(
            &world,
            Position::new(0, 0, 7),
            Position::new(4, 0, 7),
            CreatureId(1),
            1,
        );
        assert_eq!(result.state, PathState::Reached);
        assert_eq!(result.reached, Position::new(3, 0, 7));
        assert_eq!(result.directions, vec![Direction::East; 3]);
    }

    #[test]
    fn diagonal_falls_back_to_cardinal_step() {
        let mut world = world();
        world
            .spawn_item(WALL, 1, Holder::Tile(Position::new(1, 1, 7)), None, ironhold_types::GameTime::ZERO)
            .unwrap();
        let result = StraightLinePathFinder::default().find_between(
            &world,
            Position::new(0, 0, 7),
            Position::new(3, 3, 7),
            CreatureId(1),
            0,
        );
        assert_eq!(result.state, PathState::Reached);
        assert_eq!(result.directions.first(), Some(&Direction::South));
    }

    #[test]
    fn other_floor_is_unreachable() {
        let world = world();
        let result = StraightLinePathFinder::default().find_between(
            &world,
            Position::new(0, 0, 7),
            Position::new(0, 0, 6),
            CreatureId(1),
            0,
        );
        assert_eq!(result.state, PathState::Unreachable);
        assert!(result.directions.is_empty());
    }
}
