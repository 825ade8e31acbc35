use crate::Position;

/// Represents errors that can occur when addressing maze cells.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("Invalid position: {index} is outside of the maze ({width}x{height})")]
    OutOfRange {
        index: usize,
        width: usize,
        height: usize,
    },
    #[error("Coordinates ({x}, {y}) are out of bounds for maze size ({width}, {height})")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("Maze dimensions must be positive, got ({width}, {height})")]
    EmptyMaze { width: usize, height: usize },
}

/// Dimensions of a rectangular maze.
///
/// Cells are addressed either by `(x, y)` coordinates with the origin at the
/// bottom-left, or by a linear index in row-major order where index row 0 is
/// the *top* row of the maze. For a 4x2 maze:
///
/// ```text
/// y = 1 | 0  1  2  3
/// y = 0 | 4  5  6  7
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Maze {
    width: usize,
    height: usize,
}

impl Maze {
    /// Creates a maze with the given dimensions.
    ///
    /// Returns `Err(MapError::EmptyMaze)` if either dimension is zero or the
    /// cell count overflows `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, MapError> {
        if width == 0 || height == 0 || width.checked_mul(height).is_none() {
            return Err(MapError::EmptyMaze { width, height });
        }
        Ok(Maze { width, height })
    }

    /// Returns the width of the maze.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the maze.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of cells in the maze.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Checks if the given position lies within the maze.
    #[inline]
    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Returns `Err(MapError::OutOfBounds)` if `position` lies outside the maze.
    pub fn check_contains(&self, position: Position) -> Result<(), MapError> {
        if self.contains(position) {
            Ok(())
        } else {
            Err(MapError::OutOfBounds {
                x: position.x,
                y: position.y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Converts a cell index to `(x, y)` coordinates.
    ///
    /// `x = index % width` and `y = height - index / width - 1`.
    /// Returns `Err(MapError::OutOfRange)` if `index >= width * height`; the
    /// index is never clamped.
    pub fn index_to_position(&self, index: usize) -> Result<Position, MapError> {
        if index >= self.cell_count() {
            return Err(MapError::OutOfRange {
                index,
                width: self.width,
                height: self.height,
            });
        }
        Ok(Position {
            x: index % self.width,
            y: self.height - index / self.width - 1,
        })
    }

    /// Converts `(x, y)` coordinates back to a cell index.
    pub fn position_to_index(&self, position: Position) -> Result<usize, MapError> {
        self.check_contains(position)?;
        Ok((self.height - position.y - 1) * self.width + position.x)
    }

    /// Returns an iterator over every position of the maze in index order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let (width, height) = (self.width, self.height);
        (0..self.cell_count()).map(move |index| Position {
            x: index % width,
            y: height - index / width - 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn index_to_position_small_maze() {
        let maze = Maze::new(4, 2).unwrap();
        assert_eq!(maze.index_to_position(5), Ok(Position::new(1, 0)));
        assert_eq!(maze.index_to_position(0), Ok(Position::new(0, 1)));
        assert_eq!(maze.index_to_position(7), Ok(Position::new(3, 0)));
    }

    #[test]
    fn index_to_position_large_maze() {
        let maze = Maze::new(10, 15).unwrap();
        assert_eq!(maze.index_to_position(105), Ok(Position::new(5, 4)));

        let narrow = Maze::new(2, 3).unwrap();
        assert_eq!(narrow.index_to_position(4), Ok(Position::new(0, 0)));
    }

    #[test]
    fn index_outside_maze_is_rejected() {
        let maze = Maze::new(5, 20).unwrap();
        let err = maze.index_to_position(100).unwrap_err();
        assert_eq!(
            err,
            MapError::OutOfRange {
                index: 100,
                width: 5,
                height: 20
            }
        );
        assert!(err.to_string().contains("outside"));
        assert!(maze.index_to_position(99).is_ok());
    }

    #[test]
    fn conversion_is_a_bijection() {
        for (width, height) in [(1, 1), (1, 7), (6, 1), (4, 2), (10, 15)] {
            let maze = Maze::new(width, height).unwrap();
            let mut seen = HashSet::new();
            for index in 0..maze.cell_count() {
                let position = maze.index_to_position(index).unwrap();
                assert!(maze.contains(position));
                assert_eq!(maze.position_to_index(position), Ok(index));
                assert!(seen.insert(position), "duplicate {:?}", position);
            }
            assert_eq!(seen.len(), width * height);
        }
    }

    #[test]
    fn positions_iterates_in_index_order() {
        let maze = Maze::new(3, 2).unwrap();
        let expected: Vec<Position> = (0..6)
            .map(|index| maze.index_to_position(index).unwrap())
            .collect();
        assert_eq!(maze.positions().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn position_outside_maze_is_rejected() {
        let maze = Maze::new(3, 3).unwrap();
        assert!(matches!(
            maze.position_to_index(Position::new(3, 0)),
            Err(MapError::OutOfBounds { x: 3, y: 0, .. })
        ));
    }

    #[test]
    fn empty_maze_is_rejected() {
        assert_eq!(
            Maze::new(0, 4),
            Err(MapError::EmptyMaze {
                width: 0,
                height: 4
            })
        );
        assert!(Maze::new(3, 0).is_err());
    }
}
