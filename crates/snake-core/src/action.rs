//! Relative turn actions and absolute headings

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnakeError};

/// Number of discrete actions available to the agent
pub const NUM_ACTIONS: usize = 3;

/// All actions, ordered by their network output index
pub const ALL_ACTIONS: [Action; NUM_ACTIONS] =
    [Action::GoStraight, Action::TurnLeft, Action::TurnRight];

/// A turn command relative to the snake's current heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Keep the current heading
    GoStraight,
    /// Rotate the heading 90° counter-clockwise
    TurnLeft,
    /// Rotate the heading 90° clockwise
    TurnRight,
}

impl Action {
    /// Convert action to its Q-value output index
    pub fn to_index(self) -> usize {
        match self {
            Action::GoStraight => 0,
            Action::TurnLeft => 1,
            Action::TurnRight => 2,
        }
    }

    /// Create action from a Q-value output index
    pub fn from_index(index: usize) -> Result<Self> {
        ALL_ACTIONS
            .get(index)
            .copied()
            .ok_or(SnakeError::InvalidAction(index))
    }
}

impl TryFrom<usize> for Action {
    type Error = SnakeError;

    fn try_from(index: usize) -> Result<Self> {
        Self::from_index(index)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::GoStraight => write!(f, "straight"),
            Action::TurnLeft => write!(f, "left"),
            Action::TurnRight => write!(f, "right"),
        }
    }
}

/// Absolute heading of the snake on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    /// Heading after applying a relative turn
    pub fn turn(self, action: Action) -> Direction {
        match action {
            Action::GoStraight => self,
            Action::TurnLeft => match self {
                Direction::Left => Direction::Down,
                Direction::Up => Direction::Left,
                Direction::Right => Direction::Up,
                Direction::Down => Direction::Right,
            },
            Action::TurnRight => match self {
                Direction::Left => Direction::Up,
                Direction::Up => Direction::Right,
                Direction::Right => Direction::Down,
                Direction::Down => Direction::Left,
            },
        }
    }

    /// Row/column offset of one step in this heading
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Left => (0, -1),
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
        }
    }
}
