//! Snake game state machine
//!
//! The game is fully deterministic given its random number generator:
//! initial placement and fruit spawning are the only sources of
//! randomness, and both draw from the injected `R`.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::action::{Action, Direction};
use crate::config::GameConfig;
use crate::error::{Result, SnakeError};
use crate::state::{Cell, GameState};

/// Reward for a step that neither eats fruit nor ends the episode
pub const NO_FRUIT_REWARD: f64 = -0.2;

/// Reward for eating a fruit
pub const FRUIT_REWARD: f64 = 10.0;

/// Reward for leaving the board or running into the snake's own body
pub const DEATH_REWARD: f64 = -10.0;

/// Result of a single [`Game::step`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub reward: f64,
    /// Board after the step (unchanged body on a terminal step)
    pub state: GameState,
    pub done: bool,
    pub fruit_eaten: bool,
}

/// The snake game on a fixed-size grid
pub struct Game<R = StdRng> {
    config: GameConfig,
    snake: VecDeque<Cell>,
    fruits: Vec<Cell>,
    direction: Direction,
    done: bool,
    rng: R,
}

impl Game<StdRng> {
    /// Create a game seeded from system entropy
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a reproducible game from a fixed seed
    pub fn seeded(config: GameConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Game<R> {
    /// Create a game drawing all randomness from `rng`
    ///
    /// The configuration is validated here; the returned game has already
    /// been reset and is ready to step.
    pub fn with_rng(config: GameConfig, rng: R) -> Result<Self> {
        config.validate()?;

        let mut game = Self {
            config,
            snake: VecDeque::new(),
            fruits: Vec::new(),
            direction: Direction::Right,
            done: false,
            rng,
        };
        game.reset();
        Ok(game)
    }

    /// Start a new episode
    ///
    /// The snake is laid out straight in a random row, heading right, with
    /// its whole length on the board. Fruit is placed on random empty cells.
    pub fn reset(&mut self) -> GameState {
        let init_len = self.config.init_len;
        let row = self.rng.gen_range(0..self.config.height);
        let head_col = self.rng.gen_range(init_len - 1..self.config.width);

        self.snake = (0..init_len)
            .map(|i| Cell::new(row, head_col - i))
            .collect();
        self.direction = Direction::Right;
        self.fruits.clear();
        self.make_fruits(self.config.num_fruits);
        self.done = false;

        debug!(
            row,
            head_col,
            fruits = self.fruits.len(),
            "Game reset"
        );
        self.state()
    }

    /// Advance the game by one frame
    pub fn step(&mut self, action: Action) -> Result<StepOutcome> {
        if self.done {
            return Err(SnakeError::GameOver);
        }

        self.direction = self.direction.turn(action);
        let head = self
            .snake
            .front()
            .copied()
            .ok_or_else(|| SnakeError::InvalidState("snake has no cells".to_string()))?;

        // The tail has not moved yet, so it still counts as body here.
        let new_head = match head.neighbor(self.direction, self.config.height, self.config.width) {
            Some(cell) if !self.snake.contains(&cell) => cell,
            _ => {
                self.done = true;
                trace!(?head, direction = ?self.direction, "Snake died");
                return Ok(StepOutcome {
                    reward: DEATH_REWARD,
                    state: self.state(),
                    done: true,
                    fruit_eaten: false,
                });
            }
        };

        self.snake.push_front(new_head);

        let fruit_eaten = match self.fruits.iter().position(|&f| f == new_head) {
            Some(idx) => {
                self.fruits.remove(idx);
                let missing = self.config.num_fruits.saturating_sub(self.fruits.len());
                self.make_fruits(missing);
                true
            }
            None => {
                self.snake.pop_back();
                false
            }
        };

        Ok(StepOutcome {
            reward: if fruit_eaten { FRUIT_REWARD } else { NO_FRUIT_REWARD },
            state: self.state(),
            done: false,
            fruit_eaten,
        })
    }

    /// Place up to `count` fruits on distinct empty cells
    ///
    /// Fewer fruits are placed when the board runs out of empty cells.
    fn make_fruits(&mut self, count: usize) {
        if count == 0 {
            return;
        }

        let width = self.config.width;
        let mut occupied = vec![false; self.config.area()];
        for cell in self.snake.iter().chain(self.fruits.iter()) {
            occupied[cell.row * width + cell.col] = true;
        }

        let empty: Vec<Cell> = occupied
            .iter()
            .enumerate()
            .filter(|(_, taken)| !**taken)
            .map(|(idx, _)| Cell::new(idx / width, idx % width))
            .collect();

        let placed: Vec<Cell> = empty
            .choose_multiple(&mut self.rng, count.min(empty.len()))
            .copied()
            .collect();
        self.fruits.extend(placed);
    }

    /// Replace the board with an explicit snake, fruit set, and heading
    ///
    /// The snake must be non-empty, head first, in bounds, pairwise distinct
    /// and edge-connected; fruits must be in bounds, distinct, and off the
    /// snake. Clears any terminal status.
    pub fn set_state(
        &mut self,
        snake: Vec<Cell>,
        fruits: Vec<Cell>,
        direction: Direction,
    ) -> Result<()> {
        let (height, width) = (self.config.height, self.config.width);
        let in_bounds = |c: Cell| c.row < height && c.col < width;

        if snake.is_empty() {
            return Err(SnakeError::InvalidState("snake must have at least one cell".to_string()));
        }
        if let Some(cell) = snake.iter().chain(fruits.iter()).find(|c| !in_bounds(**c)) {
            return Err(SnakeError::InvalidState(format!(
                "cell {cell:?} is outside the {height}x{width} board"
            )));
        }
        for (i, cell) in snake.iter().enumerate() {
            if snake[..i].contains(cell) {
                return Err(SnakeError::InvalidState(format!(
                    "snake visits {cell:?} more than once"
                )));
            }
        }
        if let Some(pair) = snake.windows(2).find(|w| !w[0].is_adjacent(w[1])) {
            return Err(SnakeError::InvalidState(format!(
                "snake cells {:?} and {:?} are not adjacent",
                pair[0], pair[1]
            )));
        }
        for (i, fruit) in fruits.iter().enumerate() {
            if snake.contains(fruit) || fruits[..i].contains(fruit) {
                return Err(SnakeError::InvalidState(format!(
                    "fruit at {fruit:?} overlaps the snake or another fruit"
                )));
            }
        }

        self.snake = snake.into();
        self.fruits = fruits;
        self.direction = direction;
        self.done = false;
        Ok(())
    }
}

impl<R> Game<R> {
    /// Fresh copy of the current board
    pub fn state(&self) -> GameState {
        GameState {
            snake: self.snake.iter().copied().collect(),
            fruits: self.fruits.clone(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn height(&self) -> usize {
        self.config.height
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the current episode has ended
    pub fn is_done(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(pairs: &[(usize, usize)]) -> Vec<Cell> {
        pairs.iter().copied().map(Cell::from).collect()
    }

    fn game_5x5(init_len: usize) -> Game {
        Game::seeded(GameConfig::new(5, 5, 1, init_len), 7).unwrap()
    }

    #[test]
    fn test_construction_defaults() {
        let game = Game::seeded(GameConfig::default(), 1).unwrap();
        assert_eq!(game.height(), 9);
        assert_eq!(game.width(), 9);
        assert!(!game.is_done());
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let result = Game::seeded(GameConfig::new(0, 5, 1, 2), 1);
        assert!(matches!(result, Err(SnakeError::Config(_))));
    }

    #[test]
    fn test_reset_layout() {
        for seed in 0..50 {
            let mut game = Game::seeded(GameConfig::new(6, 8, 2, 4), seed).unwrap();
            let state = game.reset();

            assert_eq!(state.snake.len(), 4);
            assert_eq!(state.fruits.len(), 2);
            assert_eq!(game.direction(), Direction::Right);

            let row = state.snake[0].row;
            for (i, cell) in state.snake.iter().enumerate() {
                assert_eq!(cell.row, row);
                assert_eq!(cell.col, state.snake[0].col - i);
                assert!(cell.row < 6 && cell.col < 8);
            }
            for fruit in &state.fruits {
                assert!(!state.snake.contains(fruit));
            }
            assert_ne!(state.fruits[0], state.fruits[1]);
        }
    }

    #[test]
    fn test_same_seed_same_game() {
        let mut a = Game::seeded(GameConfig::default(), 99).unwrap();
        let mut b = Game::seeded(GameConfig::default(), 99).unwrap();
        assert_eq!(a.state(), b.state());
        for action in [Action::GoStraight, Action::TurnLeft, Action::TurnRight] {
            let out_a = a.step(action).unwrap();
            let out_b = b.step(action).unwrap();
            assert_eq!(out_a, out_b);
        }
    }

    #[test]
    fn test_step_without_fruit() {
        let mut game = game_5x5(2);
        game.set_state(cells(&[(4, 1), (4, 0)]), cells(&[(0, 4)]), Direction::Right)
            .unwrap();

        let out = game.step(Action::GoStraight).unwrap();
        assert_eq!(out.reward, NO_FRUIT_REWARD);
        assert!(!out.done);
        assert!(!out.fruit_eaten);
        assert_eq!(out.state.snake, cells(&[(4, 2), (4, 1)]));
        assert_eq!(out.state.fruits, cells(&[(0, 4)]));

        let out = game.step(Action::TurnLeft).unwrap();
        assert_eq!(game.direction(), Direction::Up);
        assert_eq!(out.state.snake, cells(&[(3, 2), (4, 2)]));

        let out = game.step(Action::TurnRight).unwrap();
        assert_eq!(game.direction(), Direction::Right);
        assert_eq!(out.state.snake, cells(&[(3, 3), (3, 2)]));

        let out = game.step(Action::TurnRight).unwrap();
        assert_eq!(game.direction(), Direction::Down);
        assert_eq!(out.state.snake, cells(&[(4, 3), (3, 3)]));
        assert_eq!(out.reward, NO_FRUIT_REWARD);
    }

    #[test]
    fn test_leaving_each_edge_ends_episode() {
        let cases = [
            (cells(&[(4, 0), (4, 1)]), Direction::Left),
            (cells(&[(0, 0), (1, 0)]), Direction::Up),
            (cells(&[(3, 4), (3, 3)]), Direction::Right),
            (cells(&[(4, 2), (3, 2)]), Direction::Down),
        ];
        for (snake, direction) in cases {
            let mut game = game_5x5(2);
            game.set_state(snake.clone(), cells(&[(0, 4)]), direction).unwrap();

            let out = game.step(Action::GoStraight).unwrap();
            assert!(out.done);
            assert_eq!(out.reward, DEATH_REWARD);
            assert_eq!(out.state.snake, snake, "body must not move on death");
            assert!(game.is_done());
        }
    }

    #[test]
    fn test_running_into_tail_ends_episode() {
        let mut game = game_5x5(4);
        game.set_state(
            cells(&[(2, 3), (3, 3), (3, 4), (2, 4)]),
            cells(&[(0, 4)]),
            Direction::Up,
        )
        .unwrap();

        let out = game.step(Action::TurnRight).unwrap();
        assert!(out.done);
        assert_eq!(out.reward, DEATH_REWARD);
    }

    #[test]
    fn test_running_into_neck_ends_episode() {
        let mut game = game_5x5(4);
        game.set_state(
            cells(&[(2, 3), (3, 3), (3, 4), (2, 4)]),
            cells(&[(0, 4)]),
            Direction::Left,
        )
        .unwrap();

        let out = game.step(Action::TurnLeft).unwrap();
        assert!(out.done);
    }

    #[test]
    fn test_step_after_death_is_error() {
        let mut game = game_5x5(2);
        game.set_state(cells(&[(0, 0), (0, 1)]), vec![], Direction::Left).unwrap();
        assert!(game.step(Action::GoStraight).unwrap().done);
        assert!(matches!(game.step(Action::GoStraight), Err(SnakeError::GameOver)));

        game.reset();
        assert!(game.step(Action::GoStraight).is_ok());
    }

    #[test]
    fn test_fruit_eaten() {
        let mut game = game_5x5(4);
        game.set_state(
            cells(&[(2, 3), (3, 3), (3, 4), (2, 4)]),
            cells(&[(1, 3)]),
            Direction::Up,
        )
        .unwrap();

        let out = game.step(Action::GoStraight).unwrap();
        assert_eq!(out.reward, FRUIT_REWARD);
        assert!(out.fruit_eaten);
        assert!(!out.done);

        let expected = cells(&[(1, 3), (2, 3), (3, 3), (3, 4), (2, 4)]);
        assert_eq!(out.state.snake, expected);
        assert_eq!(out.state.fruits.len(), 1);
        assert!(!expected.contains(&out.state.fruits[0]));
    }

    #[test]
    fn test_fruit_not_replenished_on_full_board() {
        let config = GameConfig::new(1, 3, 1, 2);
        let mut game = Game::seeded(config, 3).unwrap();
        game.set_state(cells(&[(0, 1), (0, 0)]), cells(&[(0, 2)]), Direction::Right)
            .unwrap();

        let out = game.step(Action::GoStraight).unwrap();
        assert!(out.fruit_eaten);
        assert_eq!(out.state.snake.len(), 3);
        assert!(out.state.fruits.is_empty());
    }

    #[test]
    fn test_single_cell_board() {
        let mut game = Game::seeded(GameConfig::new(1, 1, 1, 1), 5).unwrap();
        let state = game.state();
        assert_eq!(state.snake, cells(&[(0, 0)]));
        assert!(state.fruits.is_empty());

        for action in [Action::GoStraight, Action::TurnLeft, Action::TurnRight] {
            game.reset();
            let out = game.step(action).unwrap();
            assert!(out.done);
            assert_eq!(out.reward, DEATH_REWARD);
        }
    }

    #[test]
    fn test_set_state_rejects_broken_snakes() {
        let mut game = game_5x5(2);
        let bad = [
            (vec![], vec![]),
            (cells(&[(0, 0), (0, 2)]), vec![]),
            (cells(&[(0, 0), (0, 1), (0, 0)]), vec![]),
            (cells(&[(0, 5)]), vec![]),
            (cells(&[(0, 0), (0, 1)]), cells(&[(0, 1)])),
            (cells(&[(0, 0)]), cells(&[(2, 2), (2, 2)])),
        ];
        for (snake, fruits) in bad {
            let result = game.set_state(snake, fruits, Direction::Right);
            assert!(matches!(result, Err(SnakeError::InvalidState(_))));
        }
    }

    #[test]
    fn test_state_is_a_copy() {
        let mut game = game_5x5(2);
        let before = game.state();
        let mut copy = game.state();
        copy.snake.clear();
        assert_eq!(game.state(), before);

        let _ = game.step(Action::GoStraight).unwrap();
        assert_eq!(before.snake.len(), 2);
    }
}
