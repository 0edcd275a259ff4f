//! Q-function approximator contract and a reference implementation

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use snake_core::{Result, SnakeError};

/// Trait for Q-value approximators driven by the agent
///
/// Inputs are batches of encoded states, one per row; outputs hold one
/// value per action, one row per state.
pub trait QNetwork: Send {
    /// Length of an encoded state
    fn input_dim(&self) -> usize;

    /// Number of action values produced per state
    fn num_actions(&self) -> usize;

    /// Predict action values for a batch of states
    fn predict(&self, inputs: ArrayView2<'_, f64>) -> Result<Array2<f64>>;

    /// Take one gradient step toward `targets`, returning the loss
    fn train_on_batch(
        &mut self,
        inputs: ArrayView2<'_, f64>,
        targets: ArrayView2<'_, f64>,
    ) -> Result<f64>;

    /// Snapshot of all trainable parameters
    fn weights(&self) -> Weights;

    /// Overwrite all trainable parameters
    fn set_weights(&mut self, weights: &Weights) -> Result<()>;
}

/// One named parameter tensor in row-major order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

/// Full parameter set of a network
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Weights {
    pub tensors: Vec<WeightTensor>,
}

impl Weights {
    fn tensor(&self, name: &str, shape: &[usize]) -> Result<&WeightTensor> {
        let tensor = self
            .tensors
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| SnakeError::Network(format!("missing weight tensor '{name}'")))?;
        if tensor.shape != shape {
            return Err(SnakeError::Network(format!(
                "weight tensor '{name}' has shape {:?}, expected {shape:?}",
                tensor.shape
            )));
        }
        Ok(tensor)
    }
}

/// Shape and optimizer settings for [`MlpQNetwork`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    pub input_dim: usize,
    pub hidden_units: usize,
    pub num_actions: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,
}

/// Two-layer perceptron: ReLU hidden layer, linear action-value head,
/// trained with plain SGD on mean squared error
#[derive(Debug, Clone)]
pub struct MlpQNetwork {
    w1: Array2<f64>,
    b1: Array1<f64>,
    w2: Array2<f64>,
    b2: Array1<f64>,
    learning_rate: f64,
}

impl MlpQNetwork {
    pub fn new(config: &MlpConfig) -> Result<Self> {
        if config.input_dim == 0 {
            return Err(SnakeError::Config(
                "Expected input_dim to be a positive integer, but received 0".to_string(),
            ));
        }
        if config.hidden_units == 0 {
            return Err(SnakeError::Config(
                "Expected hidden_units to be a positive integer, but received 0".to_string(),
            ));
        }
        if config.num_actions < 2 {
            return Err(SnakeError::Config(format!(
                "Expected num_actions to be an integer greater than 1, but received {}",
                config.num_actions
            )));
        }
        if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
            return Err(SnakeError::Config(format!(
                "Expected learning_rate to be a positive number, but received {}",
                config.learning_rate
            )));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let w1 = xavier_uniform(config.input_dim, config.hidden_units, &mut rng);
        let w2 = xavier_uniform(config.hidden_units, config.num_actions, &mut rng);

        Ok(Self {
            w1,
            b1: Array1::zeros(config.hidden_units),
            w2,
            b2: Array1::zeros(config.num_actions),
            learning_rate: config.learning_rate,
        })
    }

    pub fn hidden_units(&self) -> usize {
        self.b1.len()
    }

    fn check_inputs(&self, inputs: &ArrayView2<'_, f64>) -> Result<()> {
        if inputs.ncols() != self.input_dim() {
            return Err(SnakeError::Network(format!(
                "expected {} input features, got {}",
                self.input_dim(),
                inputs.ncols()
            )));
        }
        Ok(())
    }

    /// Pre-activations and activations of the hidden layer, plus outputs
    fn forward(&self, inputs: &ArrayView2<'_, f64>) -> (Array2<f64>, Array2<f64>, Array2<f64>) {
        let z1 = inputs.dot(&self.w1) + &self.b1;
        let h1 = z1.mapv(|v| v.max(0.0));
        let out = h1.dot(&self.w2) + &self.b2;
        (z1, h1, out)
    }
}

fn xavier_uniform(fan_in: usize, fan_out: usize, rng: &mut StdRng) -> Array2<f64> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Array2::from_shape_fn((fan_in, fan_out), |_| rng.gen_range(-limit..limit))
}

fn to_tensor(name: &str, shape: &[usize], values: impl Iterator<Item = f64>) -> WeightTensor {
    WeightTensor {
        name: name.to_string(),
        shape: shape.to_vec(),
        data: values.collect(),
    }
}

impl QNetwork for MlpQNetwork {
    fn input_dim(&self) -> usize {
        self.w1.nrows()
    }

    fn num_actions(&self) -> usize {
        self.b2.len()
    }

    fn predict(&self, inputs: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.check_inputs(&inputs)?;
        let (_, _, out) = self.forward(&inputs);
        Ok(out)
    }

    fn train_on_batch(
        &mut self,
        inputs: ArrayView2<'_, f64>,
        targets: ArrayView2<'_, f64>,
    ) -> Result<f64> {
        self.check_inputs(&inputs)?;
        if inputs.nrows() == 0 {
            return Err(SnakeError::Network("cannot train on an empty batch".to_string()));
        }
        if targets.dim() != (inputs.nrows(), self.num_actions()) {
            return Err(SnakeError::Network(format!(
                "expected targets of shape ({}, {}), got {:?}",
                inputs.nrows(),
                self.num_actions(),
                targets.dim()
            )));
        }

        let batch = inputs.nrows() as f64;
        let (z1, h1, out) = self.forward(&inputs);
        let diff = out - &targets;
        let loss = diff.mapv(|d| d * d).sum() / batch;

        // Backpropagate the squared error through both layers.
        let d_out = diff * (2.0 / batch);
        let grad_w2 = h1.t().dot(&d_out);
        let grad_b2 = d_out.sum_axis(Axis(0));
        let d_hidden = d_out.dot(&self.w2.t()) * z1.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
        let grad_w1 = inputs.t().dot(&d_hidden);
        let grad_b1 = d_hidden.sum_axis(Axis(0));

        let lr = self.learning_rate;
        self.w2.scaled_add(-lr, &grad_w2);
        self.b2.scaled_add(-lr, &grad_b2);
        self.w1.scaled_add(-lr, &grad_w1);
        self.b1.scaled_add(-lr, &grad_b1);

        Ok(loss)
    }

    fn weights(&self) -> Weights {
        let (input, hidden, actions) = (self.input_dim(), self.hidden_units(), self.num_actions());
        Weights {
            tensors: vec![
                to_tensor("hidden/kernel", &[input, hidden], self.w1.iter().copied()),
                to_tensor("hidden/bias", &[hidden], self.b1.iter().copied()),
                to_tensor("output/kernel", &[hidden, actions], self.w2.iter().copied()),
                to_tensor("output/bias", &[actions], self.b2.iter().copied()),
            ],
        }
    }

    fn set_weights(&mut self, weights: &Weights) -> Result<()> {
        let (input, hidden, actions) = (self.input_dim(), self.hidden_units(), self.num_actions());
        let shape_err = |e: ndarray::ShapeError| SnakeError::Network(e.to_string());

        let w1 = Array2::from_shape_vec(
            (input, hidden),
            weights.tensor("hidden/kernel", &[input, hidden])?.data.clone(),
        )
        .map_err(shape_err)?;
        let b1 = Array1::from_vec(weights.tensor("hidden/bias", &[hidden])?.data.clone());
        let w2 = Array2::from_shape_vec(
            (hidden, actions),
            weights.tensor("output/kernel", &[hidden, actions])?.data.clone(),
        )
        .map_err(shape_err)?;
        let b2 = Array1::from_vec(weights.tensor("output/bias", &[actions])?.data.clone());

        if b1.len() != hidden || b2.len() != actions {
            return Err(SnakeError::Network("bias length does not match its shape".to_string()));
        }

        self.w1 = w1;
        self.b1 = b1;
        self.w2 = w2;
        self.b2 = b2;
        Ok(())
    }
}
