//! Epsilon-greedy DQN agent
//!
//! The agent owns the game, the replay memory, and the online/target
//! network pair. Every frame it plays goes into replay memory in order;
//! the frame counter only ever grows and drives both the exploration
//! schedule and the target-sync cadence.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use snake_core::{Action, Game, GameState, Result, SnakeError, ALL_ACTIONS, NUM_ACTIONS};
use tracing::{debug, trace};

use crate::config::AgentConfig;
use crate::experience::{ReplayMemory, Reward, Transition};
use crate::features::{encode_batch, encode_state, input_dim};
use crate::network::{MlpConfig, MlpQNetwork, QNetwork};
use crate::schedule::EpsilonSchedule;

/// Summary of one [`Agent::play_step`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayStep {
    pub action: Action,
    pub reward: Reward,
    /// Episode total including this step (before any reset)
    pub cumulative_reward: Reward,
    pub done: bool,
    pub fruit_eaten: bool,
}

/// DQN agent playing the snake game
pub struct Agent<N = MlpQNetwork> {
    game: Game,
    state: GameState,
    config: AgentConfig,
    schedule: EpsilonSchedule,
    replay_memory: ReplayMemory<Transition>,
    online: N,
    target: N,
    rng: StdRng,
    cumulative_reward: Reward,
    frame_count: u64,
    episode_over: bool,
}

impl Agent<MlpQNetwork> {
    /// Create an agent with freshly initialized reference networks
    pub fn new(game: Game, config: AgentConfig) -> Result<Self> {
        config.validate()?;

        let network_config = |seed: Option<u64>| MlpConfig {
            input_dim: input_dim(game.height(), game.width()),
            hidden_units: config.hidden_units,
            num_actions: NUM_ACTIONS,
            learning_rate: config.learning_rate,
            seed,
        };
        let online = MlpQNetwork::new(&network_config(config.seed))?;
        let target = MlpQNetwork::new(&network_config(config.seed.map(|s| s.wrapping_add(1))))?;

        Self::with_networks(game, config, online, target)
    }
}

impl<N: QNetwork> Agent<N> {
    /// Create an agent around caller-supplied online and target networks
    ///
    /// Both networks must accept this game's encoded board and produce one
    /// value per action.
    pub fn with_networks(mut game: Game, config: AgentConfig, online: N, target: N) -> Result<Self> {
        config.validate()?;
        let expected_input = input_dim(game.height(), game.width());
        for (role, net) in [("online", &online), ("target", &target)] {
            if net.input_dim() != expected_input || net.num_actions() != NUM_ACTIONS {
                return Err(SnakeError::Network(format!(
                    "{role} network maps {} inputs to {} actions, expected {expected_input} to {NUM_ACTIONS}",
                    net.input_dim(),
                    net.num_actions()
                )));
            }
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(2)),
            None => StdRng::from_entropy(),
        };
        let state = game.reset();

        Ok(Self {
            game,
            state,
            schedule: config.epsilon_schedule()?,
            replay_memory: ReplayMemory::new(config.replay_capacity)?,
            config,
            online,
            target,
            rng,
            cumulative_reward: 0.0,
            frame_count: 0,
            episode_over: false,
        })
    }

    /// Start a fresh episode
    pub fn reset(&mut self) {
        self.state = self.game.reset();
        self.cumulative_reward = 0.0;
        self.episode_over = false;
    }

    /// Exploration probability for the next frame
    pub fn epsilon(&self) -> f64 {
        self.schedule.value(self.frame_count)
    }

    /// Play one frame with the epsilon-greedy policy
    pub fn play_step(&mut self) -> Result<PlayStep> {
        let explore = self.rng.gen::<f64>() < self.epsilon();
        self.advance(explore)
    }

    /// Play one frame with a uniformly random action
    pub fn play_random_step(&mut self) -> Result<PlayStep> {
        self.advance(true)
    }

    fn advance(&mut self, explore: bool) -> Result<PlayStep> {
        if self.episode_over {
            self.reset();
        }

        let action = if explore {
            ALL_ACTIONS[self.rng.gen_range(0..NUM_ACTIONS)]
        } else {
            self.greedy_action(&self.state)?.0
        };

        let outcome = self.game.step(action)?;
        let next_state = (!outcome.done).then(|| outcome.state.clone());
        let state = std::mem::replace(&mut self.state, outcome.state);
        self.replay_memory
            .append(Transition::new(state, action, outcome.reward, next_state));

        self.cumulative_reward += outcome.reward;
        self.frame_count += 1;
        self.episode_over = outcome.done;

        trace!(
            frame = self.frame_count,
            %action,
            explore,
            reward = outcome.reward,
            "Played frame"
        );

        Ok(PlayStep {
            action,
            reward: outcome.reward,
            cumulative_reward: self.cumulative_reward,
            done: outcome.done,
            fruit_eaten: outcome.fruit_eaten,
        })
    }

    /// Best action for `state` under the online network, with all values
    pub fn greedy_action(&self, state: &GameState) -> Result<(Action, Vec<f64>)> {
        greedy_action(&self.online, state, self.game.height(), self.game.width())
    }

    /// One gradient step on a replay batch using Bellman targets
    ///
    /// Terminal transitions target their reward alone; others add the
    /// discounted best target-network value of the next state.
    pub fn train_on_replay_batch(&mut self) -> Result<f64> {
        let (height, width) = (self.game.height(), self.game.width());
        let batch = self
            .replay_memory
            .sample(self.config.batch_size, &mut self.rng)?;

        let states: Vec<&GameState> = batch.iter().map(|t| &t.state).collect();
        let inputs = encode_batch(&states, height, width);

        let continuing: Vec<(usize, &GameState)> = batch
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.next_state.as_ref().map(|s| (i, s)))
            .collect();
        let mut bootstrap = Array1::<f64>::zeros(batch.len());
        if !continuing.is_empty() {
            let next_states: Vec<&GameState> = continuing.iter().map(|(_, s)| *s).collect();
            let next_values = self
                .target
                .predict(encode_batch(&next_states, height, width).view())?;
            for ((i, _), row) in continuing.iter().zip(next_values.rows()) {
                bootstrap[*i] = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            }
        }

        // Only the taken action's output is pulled toward its target.
        let mut targets = self.online.predict(inputs.view())?;
        let gamma = self.config.discount_factor;
        for (i, transition) in batch.iter().enumerate() {
            let target = if transition.done {
                transition.reward
            } else {
                transition.reward + gamma * bootstrap[i]
            };
            targets[[i, transition.action.to_index()]] = target;
        }

        let loss = self.online.train_on_batch(inputs.view(), targets.view())?;
        trace!(frame = self.frame_count, loss, "Trained on replay batch");
        Ok(loss)
    }

    /// Copy every online-network weight into the target network
    pub fn sync_target_network(&mut self) -> Result<()> {
        self.target.set_weights(&self.online.weights())?;
        debug!(frame = self.frame_count, "Synced target network");
        Ok(())
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Reward accumulated in the current episode so far
    pub fn cumulative_reward(&self) -> Reward {
        self.cumulative_reward
    }

    /// Board the next frame will be played from
    pub fn current_state(&self) -> &GameState {
        &self.state
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn replay_memory(&self) -> &ReplayMemory<Transition> {
        &self.replay_memory
    }

    pub fn online_network(&self) -> &N {
        &self.online
    }

    pub fn target_network(&self) -> &N {
        &self.target
    }
}

/// Best action for `state` under `network`, with the values of all actions
pub fn greedy_action<N: QNetwork + ?Sized>(
    network: &N,
    state: &GameState,
    height: usize,
    width: usize,
) -> Result<(Action, Vec<f64>)> {
    let inputs = encode_state(state, height, width).insert_axis(ndarray::Axis(0));
    let values = network.predict(inputs.view())?;
    let row: Vec<f64> = values.row(0).to_vec();
    let best = argmax(row.iter().copied());
    Ok((Action::from_index(best)?, row))
}

/// Index of the largest value; ties go to the lowest index
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    values
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_v), (i, v)| {
            if v > best_v {
                (i, v)
            } else {
                (best, best_v)
            }
        })
        .0
}
