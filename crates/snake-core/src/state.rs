//! Grid cells and game state snapshots

use serde::{Deserialize, Serialize};

use crate::action::Direction;

/// A `(row, col)` square on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Neighbouring cell in `direction`, or `None` if it falls off a
    /// `height` x `width` board
    pub fn neighbor(self, direction: Direction, height: usize, width: usize) -> Option<Cell> {
        let (dr, dc) = direction.delta();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        (row < height && col < width).then_some(Cell { row, col })
    }

    /// Whether the two cells share an edge
    pub fn is_adjacent(self, other: Cell) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

/// Snapshot of the board handed out by [`crate::Game`]
///
/// Every query returns a fresh copy; the replay memory keeps past
/// snapshots, so they are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Snake cells, head first
    pub snake: Vec<Cell>,

    /// Fruit cells, disjoint from `snake`
    pub fruits: Vec<Cell>,
}

impl GameState {
    /// The snake's head, if the snake is non-empty
    pub fn head(&self) -> Option<Cell> {
        self.snake.first().copied()
    }

    pub fn snake_len(&self) -> usize {
        self.snake.len()
    }

    pub fn is_snake(&self, cell: Cell) -> bool {
        self.snake.contains(&cell)
    }

    pub fn is_fruit(&self, cell: Cell) -> bool {
        self.fruits.contains(&cell)
    }
}
