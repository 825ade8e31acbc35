use serde::{Deserialize, Serialize};

pub mod action;
pub mod agent;
pub mod environment;
pub mod map;
pub mod scoring;

/// Name identifying a player in a game.
pub type PlayerName = String;

/// Represents a 2D coordinate.
///
/// The origin `(0, 0)` is the bottom-left cell of the maze and `y` grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Returns the manhattan distance between two positions.
    pub fn manhattan_distance(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Position { x, y }
    }
}

/// Manhattan distance between two locations, `|bx - ax| + |by - ay|`.
pub fn distance(a: Position, b: Position) -> usize {
    a.manhattan_distance(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_between_offset_cells() {
        assert_eq!(distance(Position::new(5, 4), Position::new(7, 6)), 4);
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = Position::new(4, 4);
        assert_eq!(distance(p, p), 0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Position::new(0, 9);
        let b = Position::new(3, 2);
        assert_eq!(distance(a, b), distance(b, a));
        assert_eq!(distance(a, b), 10);
    }

    #[test]
    fn distance_is_zero_only_for_equal_positions() {
        let a = Position::new(2, 2);
        assert!(distance(a, Position::new(2, 3)) > 0);
        assert!(distance(a, Position::new(1, 2)) > 0);
    }
}
