//! Integration tests for the DQN stack
//!
//! These tests drive the agent and training loop against real games.

#![allow(clippy::float_cmp)]

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::{Array2, ArrayView2};

use rand::rngs::StdRng;
use rand::SeedableRng;
use snake_core::{Action, Game, GameConfig, GameState, NUM_ACTIONS};
use snake_rl::features::input_dim;
use snake_rl::{
    load_checkpoint, save_checkpoint, Agent, AgentConfig, EpsilonSchedule, ModelCheckpoint,
    QNetwork, ReplayMemory, StopReason, TrainingConfig, TrainingLoop, Weights,
};
use uuid::Uuid;

/// Helper to build a small, fully seeded agent
fn create_test_agent(epsilon: f64) -> Agent {
    let game = Game::seeded(GameConfig::new(5, 5, 1, 2), 11).unwrap();
    let config = AgentConfig {
        replay_capacity: 50,
        epsilon_init: epsilon,
        epsilon_final: epsilon,
        epsilon_num_frames: 100,
        batch_size: 8,
        hidden_units: 16,
        seed: Some(42),
        ..AgentConfig::default()
    };
    Agent::new(game, config).unwrap()
}

fn training_config(threshold: f64, max_frames: Option<u64>) -> TrainingConfig {
    TrainingConfig {
        sync_every_frames: 20,
        cumulative_reward_threshold: threshold,
        prefill_frames: None,
        max_frames,
        log_every_episodes: 1,
        moving_average_window: 10,
    }
}

#[test]
fn test_replay_memory_keeps_latest_items() {
    let mut memory = ReplayMemory::new(3).unwrap();
    for item in ["t0", "t1", "t2", "t3", "t4"] {
        memory.append(item);
    }

    let mut rng = StdRng::seed_from_u64(0);
    let batch = memory.sample(100, &mut rng).unwrap();
    assert_eq!(batch.len(), 100);
    assert!(batch.iter().all(|item| ["t2", "t3", "t4"].contains(*item)));
    assert_eq!(memory.iter().copied().collect::<Vec<_>>(), vec!["t2", "t3", "t4"]);
}

#[test]
fn test_epsilon_schedule_anneals_linearly() {
    let schedule = EpsilonSchedule::new(1.0, 0.1, 10).unwrap();
    assert_eq!(schedule.value(0), 1.0);
    assert!((schedule.value(5) - 0.55).abs() < 1e-12);
    assert!((schedule.value(10) - 0.1).abs() < 1e-12);
    assert!((schedule.value(1_000) - 0.1).abs() < 1e-12);
}

#[test]
fn test_training_stops_at_frame_limit() {
    let agent = create_test_agent(0.5);
    // Unreachable threshold
    let mut training = TrainingLoop::new(agent, training_config(1e9, Some(120))).unwrap();

    let report = training.run(|| false).unwrap();

    assert_eq!(report.reason, StopReason::FrameLimit);
    assert_eq!(report.stats.frames, 120);
    assert_eq!(training.agent().frame_count(), 120);
    assert!(training.agent().replay_memory().is_full());
    assert!(report.stats.last_loss.is_some());
}

#[test]
fn test_training_can_be_interrupted() {
    let agent = create_test_agent(0.5);
    let mut training = TrainingLoop::new(agent, training_config(1e9, None)).unwrap();

    let polls = Cell::new(0);
    let report = training
        .run(|| {
            polls.set(polls.get() + 1);
            polls.get() > 25
        })
        .unwrap();

    assert_eq!(report.reason, StopReason::Interrupted);
    // 50 pre-fill frames plus one frame per poll that returned false
    assert_eq!(training.agent().frame_count(), 75);
}

#[test]
fn test_training_solves_low_threshold() {
    // A fully random snake on a 5x5 board dies long before losing 100 reward
    let agent = create_test_agent(1.0);
    let mut training = TrainingLoop::new(agent, training_config(-100.0, Some(10_000))).unwrap();

    let report = training.run(|| false).unwrap();

    assert!(report.solved());
    match report.reason {
        StopReason::Solved { cumulative_reward } => assert!(cumulative_reward >= -100.0),
        other => panic!("expected Solved, got {other:?}"),
    }
    assert_eq!(report.stats.episodes, 1);
}

#[test]
fn test_prefill_respects_configured_frames() {
    let agent = create_test_agent(0.5);
    let mut config = training_config(1e9, None);
    config.prefill_frames = Some(20);
    let mut training = TrainingLoop::new(agent, config).unwrap();

    let played = training.prefill().unwrap();
    assert_eq!(played, 20);
    assert_eq!(training.agent().replay_memory().len(), 20);
    assert_eq!(training.stats().episodes, 0);
}

#[test]
fn test_trained_model_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models/snake.json");

    let agent = create_test_agent(0.5);
    let mut training = TrainingLoop::new(agent, training_config(1e9, Some(80))).unwrap();
    let report = training.run(|| false).unwrap();
    let agent = training.into_agent();

    let checkpoint = ModelCheckpoint::from_agent(&agent, &report.stats, Uuid::new_v4());
    save_checkpoint(&checkpoint, &path).unwrap();
    let loaded = load_checkpoint(&path).unwrap();
    assert_eq!(loaded.metadata.frames, 80);

    // The restored network picks the same greedy action as the trained one
    let network = loaded.restore_network(&GameConfig::new(5, 5, 1, 2)).unwrap();
    let replay = Agent::with_networks(
        Game::seeded(GameConfig::new(5, 5, 1, 2), 1).unwrap(),
        agent.config().clone(),
        network.clone(),
        network,
    )
    .unwrap();

    let state: &GameState = agent.current_state();
    let (expected, expected_q) = agent.greedy_action(state).unwrap();
    let (action, q): (Action, Vec<f64>) = replay.greedy_action(state).unwrap();
    assert_eq!(action, expected);
    assert_eq!(q, expected_q);
}

/// Constant-valued network that counts weight overwrites
struct CountingNetwork {
    input_dim: usize,
    syncs: Arc<AtomicUsize>,
}

impl QNetwork for CountingNetwork {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn num_actions(&self) -> usize {
        NUM_ACTIONS
    }

    fn predict(&self, inputs: ArrayView2<'_, f64>) -> snake_core::Result<Array2<f64>> {
        Ok(Array2::zeros((inputs.nrows(), NUM_ACTIONS)))
    }

    fn train_on_batch(
        &mut self,
        _inputs: ArrayView2<'_, f64>,
        _targets: ArrayView2<'_, f64>,
    ) -> snake_core::Result<f64> {
        Ok(0.0)
    }

    fn weights(&self) -> Weights {
        Weights::default()
    }

    fn set_weights(&mut self, _weights: &Weights) -> snake_core::Result<()> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_target_synced_every_n_frames() {
    let online_syncs = Arc::new(AtomicUsize::new(0));
    let target_syncs = Arc::new(AtomicUsize::new(0));
    let network = |syncs: &Arc<AtomicUsize>| CountingNetwork {
        input_dim: input_dim(5, 5),
        syncs: Arc::clone(syncs),
    };

    let game = Game::seeded(GameConfig::new(5, 5, 1, 2), 9).unwrap();
    let config = AgentConfig {
        replay_capacity: 10,
        batch_size: 4,
        seed: Some(1),
        ..AgentConfig::default()
    };
    let agent =
        Agent::with_networks(game, config, network(&online_syncs), network(&target_syncs)).unwrap();

    let mut loop_config = training_config(1e9, Some(71));
    loop_config.sync_every_frames = 7;
    loop_config.prefill_frames = Some(1);
    let mut training = TrainingLoop::new(agent, loop_config).unwrap();

    let report = training.run(|| false).unwrap();

    assert_eq!(report.reason, StopReason::FrameLimit);
    // Frames 2..=71 are played in the loop; 7, 14, ..., 70 trigger a sync.
    assert_eq!(target_syncs.load(Ordering::SeqCst), 10);
    assert_eq!(online_syncs.load(Ordering::SeqCst), 0);
}
