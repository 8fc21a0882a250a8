//! Model and pipeline configuration
//!
//! Hyperparameters live in explicit typed structures with documented
//! defaults; nothing is read from loosely-typed maps.

use serde::{Deserialize, Serialize};

/// Configuration of the LSTM point forecaster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmConfig {
    /// Number of input features
    pub input_size: usize,
    /// Width of the first LSTM layer; the second layer uses half of it
    pub lstm_units: usize,
    /// Width of the dense hidden layer before the output unit
    pub dense_units: usize,
    /// Dropout probability after each LSTM layer (training only)
    pub dropout_rate: f64,
    /// Adam learning rate
    pub learning_rate: f64,
    /// RNG seed for weight init and dropout masks; None draws from entropy
    pub seed: Option<u64>,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            input_size: 4,
            lstm_units: 64,
            dense_units: 32,
            dropout_rate: 0.2,
            learning_rate: 0.001,
            seed: None,
        }
    }
}

impl LstmConfig {
    pub fn new(input_size: usize) -> Self {
        Self {
            input_size,
            ..Self::default()
        }
    }

    pub fn with_lstm_units(mut self, units: usize) -> Self {
        self.lstm_units = units;
        self
    }

    pub fn with_dropout_rate(mut self, rate: f64) -> Self {
        self.dropout_rate = rate;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Width of the second LSTM layer
    pub fn second_layer_units(&self) -> usize {
        (self.lstm_units / 2).max(1)
    }
}

/// Kernel for the interval regressors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Kernel {
    /// Radial basis function; gamma defaults to 1 / (n_features * variance)
    Rbf { gamma: Option<f64> },
    /// Plain dot product
    Linear,
    /// Polynomial of the given degree
    Poly { degree: u32 },
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Rbf { gamma: None }
    }
}

/// Configuration of one epsilon-insensitive support vector regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvrConfig {
    /// Kernel type
    pub kernel: Kernel,
    /// Regularization strength (penalty on loss violations)
    pub c: f64,
    /// Width of the epsilon-insensitive tube
    pub epsilon: f64,
    /// Subgradient descent step size
    pub learning_rate: f64,
    /// Maximum descent iterations
    pub max_iter: usize,
    /// Stop when the objective improves by less than this
    pub tol: f64,
}

impl Default for SvrConfig {
    fn default() -> Self {
        Self {
            kernel: Kernel::default(),
            c: 100.0,
            epsilon: 0.1,
            learning_rate: 0.01,
            max_iter: 2000,
            tol: 1e-8,
        }
    }
}

impl SvrConfig {
    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

/// What to do with the interval values when the independently fitted bounds
/// come back inverted (lower > upper). The anomaly is always logged and
/// flagged on the forecast; the policy only decides the reported values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum IntervalPolicy {
    /// Report the raw bounds as-is
    #[default]
    Flag,
    /// Collapse both bounds onto the point estimate
    Clamp,
}

/// Full training configuration for one model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Point forecaster hyperparameters
    pub lstm: LstmConfig,
    /// Interval regressor hyperparameters (shared by both bounds)
    pub svr: SvrConfig,
    /// Training epochs for the point forecaster
    pub epochs: usize,
    /// Mini-batch size
    pub batch_size: usize,
    /// Trailing fraction of the fit data held out for validation
    pub validation_split: f64,
    /// Inverted-interval handling at serving time
    pub interval_policy: IntervalPolicy,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lstm: LstmConfig::default(),
            svr: SvrConfig::default(),
            epochs: 50,
            batch_size: 32,
            validation_split: 0.2,
            interval_policy: IntervalPolicy::Flag,
        }
    }
}
