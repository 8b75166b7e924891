//! Map coordinates, directions, and thing locations.

use serde::{Deserialize, Serialize};

use crate::enums::BodySlot;

/// A tile coordinate on the map. `z` is the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// West-to-east coordinate.
    pub x: u16,
    /// North-to-south coordinate.
    pub y: u16,
    /// Floor.
    pub z: u8,
}

impl Position {
    /// Create a position.
    pub const fn new(x: u16, y: u16, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Chebyshev distance on the horizontal plane, ignoring floors.
    pub const fn distance_to(self, other: Self) -> u16 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }

    /// Whether both positions are on the same floor.
    pub const fn same_floor(self, other: Self) -> bool {
        self.z == other.z
    }

    /// Whether `other` is on the same floor and at most one tile away.
    pub const fn is_adjacent_to(self, other: Self) -> bool {
        self.same_floor(other) && self.distance_to(other) <= 1
    }

    /// Whether `other` is on the same floor and within `range` tiles.
    pub const fn within_range(self, other: Self, range: u16) -> bool {
        self.same_floor(other) && self.distance_to(other) <= range
    }

    /// The tile one step away in `direction`, or `None` off the map edge.
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (dx, dy) = direction.delta();
        let x = i32::from(self.x).checked_add(i32::from(dx))?;
        let y = i32::from(self.y).checked_add(i32::from(dy))?;
        Some(Self {
            x: u16::try_from(x).ok()?,
            y: u16::try_from(y).ok()?,
            z: self.z,
        })
    }

    /// The compass direction from `self` towards `other` on the plane.
    ///
    /// Returns `None` when both positions share the same x/y.
    pub fn direction_to(self, other: Self) -> Option<Direction> {
        use core::cmp::Ordering;

        match (other.x.cmp(&self.x), other.y.cmp(&self.y)) {
            (Ordering::Equal, Ordering::Equal) => None,
            (Ordering::Equal, Ordering::Less) => Some(Direction::North),
            (Ordering::Equal, Ordering::Greater) => Some(Direction::South),
            (Ordering::Greater, Ordering::Equal) => Some(Direction::East),
            (Ordering::Less, Ordering::Equal) => Some(Direction::West),
            (Ordering::Greater, Ordering::Less) => Some(Direction::NorthEast),
            (Ordering::Less, Ordering::Less) => Some(Direction::NorthWest),
            (Ordering::Greater, Ordering::Greater) => Some(Direction::SouthEast),
            (Ordering::Less, Ordering::Greater) => Some(Direction::SouthWest),
        }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One of the eight compass directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards decreasing `y`.
    North,
    /// Towards increasing `x`.
    East,
    /// Towards increasing `y`.
    South,
    /// Towards decreasing `x`.
    West,
    /// North and east.
    NorthEast,
    /// North and west.
    NorthWest,
    /// South and east.
    SouthEast,
    /// South and west.
    SouthWest,
}

impl Direction {
    /// Coordinate delta of one step.
    pub const fn delta(self) -> (i8, i8) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
            Self::NorthEast => (1, -1),
            Self::NorthWest => (-1, -1),
            Self::SouthEast => (1, 1),
            Self::SouthWest => (-1, 1),
        }
    }

    /// Whether this is a diagonal direction.
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Self::NorthEast | Self::NorthWest | Self::SouthEast | Self::SouthWest
        )
    }

    /// The direction a creature faces after stepping this way.
    ///
    /// Creatures only face the four cardinal directions; diagonal steps
    /// resolve to east or west.
    pub const fn facing(self) -> Self {
        match self {
            Self::NorthEast | Self::SouthEast => Self::East,
            Self::NorthWest | Self::SouthWest => Self::West,
            other => other,
        }
    }
}

/// Where a thing is, as addressed by a particular creature.
///
/// Container locations are relative to the addressing creature's own table
/// of open containers, so the same container may be `slot 0` for one
/// creature and `slot 3` for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    /// A tile on the map.
    Map(Position),
    /// A slot on the addressing creature's body.
    Body(BodySlot),
    /// An index inside one of the addressing creature's open containers.
    Container {
        /// The open-container position in the creature's table.
        slot: u8,
        /// Index within the container (0 is the most recently added item).
        index: u8,
    },
}

impl Location {
    /// The map position, if this is a map location.
    pub const fn map_position(self) -> Option<Position> {
        match self {
            Self::Map(position) => Some(position),
            Self::Body(_) | Self::Container { .. } => None,
        }
    }
}
