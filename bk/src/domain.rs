//! Domain types: travel directions and the travelers that use the lane

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// One of the two mutually exclusive traffic flows across the lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
}

impl Direction {
    /// Both directions, north first
    pub const ALL: [Direction; 2] = [Direction::North, Direction::South];

    /// The flow this one conflicts with
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
        }
    }

    /// Adjective used in console narration ("Northbound", "Southbound")
    pub fn bound(self) -> &'static str {
        match self {
            Direction::North => "Northbound",
            Direction::South => "Southbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::North => write!(f, "north"),
            Direction::South => write!(f, "south"),
        }
    }
}

/// A pair of values, one per direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerDirection<T> {
    pub north: T,
    pub south: T,
}

impl<T> PerDirection<T> {
    pub fn new(north: T, south: T) -> Self {
        Self { north, south }
    }

    /// Build both entries from a function of the direction
    pub fn from_fn(mut f: impl FnMut(Direction) -> T) -> Self {
        Self {
            north: f(Direction::North),
            south: f(Direction::South),
        }
    }
}

impl<T> Index<Direction> for PerDirection<T> {
    type Output = T;

    fn index(&self, direction: Direction) -> &T {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
        }
    }
}

impl<T> IndexMut<Direction> for PerDirection<T> {
    fn index_mut(&mut self, direction: Direction) -> &mut T {
        match direction {
            Direction::North => &mut self.north,
            Direction::South => &mut self.south,
        }
    }
}

/// Ordinal id of a traveler within its direction
pub type TravelerId = u32;

/// A traveler identity: who is crossing and which way
///
/// Travelers carry no state beyond this; the coordinator never stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Traveler {
    pub id: TravelerId,
    pub direction: Direction,
}

impl Traveler {
    pub fn new(id: TravelerId, direction: Direction) -> Self {
        Self { id, direction }
    }

    pub fn north(id: TravelerId) -> Self {
        Self::new(id, Direction::North)
    }

    pub fn south(id: TravelerId) -> Self {
        Self::new(id, Direction::South)
    }
}

impl fmt::Display for Traveler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} traveler {}", self.direction.bound(), self.id)
    }
}
