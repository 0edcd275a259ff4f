//! Experience replay memory for DQN training

use rand::Rng;
use serde::{Deserialize, Serialize};
use snake_core::{Action, GameState, Result, SnakeError};

/// Reward value from the game
pub type Reward = f64;

/// A single experience tuple (s, a, r, done, s')
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: GameState,
    pub action: Action,
    pub reward: Reward,
    pub done: bool,
    /// Absent exactly when `done` is set
    pub next_state: Option<GameState>,
}

impl Transition {
    /// Create a transition; a missing next state marks the episode end
    pub fn new(
        state: GameState,
        action: Action,
        reward: Reward,
        next_state: Option<GameState>,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            done: next_state.is_none(),
            next_state,
        }
    }
}

/// Fixed-capacity ring buffer of past experience
///
/// Storage is allocated once up front. Once `capacity` items have been
/// appended, each further append overwrites the oldest slot.
#[derive(Debug, Clone)]
pub struct ReplayMemory<T = Transition> {
    slots: Vec<T>,
    capacity: usize,
    cursor: usize,
}

impl<T> ReplayMemory<T> {
    /// Create an empty memory holding at most `capacity` items
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SnakeError::Config(
                "Expected replay_capacity to be a positive integer, but received 0".to_string(),
            ));
        }
        Ok(Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        })
    }

    /// Store an item, overwriting the oldest one when full
    pub fn append(&mut self, item: T) {
        if self.slots.len() < self.capacity {
            self.slots.push(item);
        } else {
            self.slots[self.cursor] = item;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// Draw `batch_size` items uniformly at random, with replacement
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&T>> {
        if self.slots.is_empty() {
            return Err(SnakeError::EmptyReplayMemory);
        }
        Ok((0..batch_size)
            .map(|_| &self.slots[rng.gen_range(0..self.slots.len())])
            .collect())
    }

    /// Number of valid items (never more than the capacity)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over stored items from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let split = if self.is_full() { self.cursor } else { 0 };
        self.slots[split..].iter().chain(self.slots[..split].iter())
    }

    /// Drop every stored item, keeping the allocation
    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
    }
}
