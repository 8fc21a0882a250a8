//! Dense layer, activations, and dropout used by the point forecaster

use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Activation function for dense layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    /// Apply the activation element-wise to pre-activations
    pub fn apply(&self, z: &Array1<f64>) -> Array1<f64> {
        match self {
            Activation::Linear => z.clone(),
            Activation::Relu => z.mapv(|v| v.max(0.0)),
            Activation::Sigmoid => z.mapv(|v| 1.0 / (1.0 + (-v).exp())),
            Activation::Tanh => z.mapv(f64::tanh),
        }
    }

    /// Derivative with respect to the pre-activation
    pub fn derivative(&self, z: &Array1<f64>) -> Array1<f64> {
        match self {
            Activation::Linear => Array1::ones(z.len()),
            Activation::Relu => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Sigmoid => z.mapv(|v| {
                let s = 1.0 / (1.0 + (-v).exp());
                s * (1.0 - s)
            }),
            Activation::Tanh => z.mapv(|v| 1.0 - v.tanh().powi(2)),
        }
    }
}

/// Fully connected layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    /// Weight matrix [output_size, input_size]
    pub weights: Array2<f64>,
    /// Bias vector [output_size]
    pub biases: Array1<f64>,
    /// Activation applied to the pre-activation
    pub activation: Activation,
}

/// Parameter gradients for one dense layer
#[derive(Debug, Clone)]
pub struct DenseGrads {
    pub d_weights: Array2<f64>,
    pub d_biases: Array1<f64>,
}

impl DenseGrads {
    pub fn zeros_like(layer: &Dense) -> Self {
        Self {
            d_weights: Array2::zeros(layer.weights.raw_dim()),
            d_biases: Array1::zeros(layer.biases.raw_dim()),
        }
    }

    pub fn accumulate(&mut self, other: &DenseGrads) {
        self.d_weights += &other.d_weights;
        self.d_biases += &other.d_biases;
    }
}

impl Dense {
    /// Create a layer with uniform init in ±sqrt(1/input_size)
    pub fn new<R: Rng>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let limit = (1.0 / input_size as f64).sqrt();
        Self {
            weights: Array2::random_using(
                (output_size, input_size),
                Uniform::new(-limit, limit),
                rng,
            ),
            biases: Array1::zeros(output_size),
            activation,
        }
    }

    /// Forward pass for one sample
    pub fn forward(&self, x: &Array1<f64>) -> Array1<f64> {
        let z = self.weights.dot(x) + &self.biases;
        self.activation.apply(&z)
    }

    /// Forward pass that also returns the pre-activation for backprop
    pub fn forward_cached(&self, x: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let z = self.weights.dot(x) + &self.biases;
        (self.activation.apply(&z), z)
    }

    /// Backward pass for one sample.
    ///
    /// `x` and `z` are the cached input and pre-activation from the forward
    /// pass; `d_out` is the loss gradient with respect to the layer output.
    /// Returns parameter gradients and the gradient flowing to the input.
    pub fn backward(
        &self,
        x: &Array1<f64>,
        z: &Array1<f64>,
        d_out: &Array1<f64>,
    ) -> (DenseGrads, Array1<f64>) {
        let d_z = d_out * &self.activation.derivative(z);
        let d_weights = outer(&d_z, x);
        let d_input = self.weights.t().dot(&d_z);

        (
            DenseGrads {
                d_weights,
                d_biases: d_z,
            },
            d_input,
        )
    }
}

/// Outer product a ⊗ b as a [len(a), len(b)] matrix
pub fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    let mut result = Array2::zeros((a.len(), b.len()));
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            result[[i, j]] = ai * bj;
        }
    }
    result
}

/// Inverted dropout: masks are sampled at train time and scaled by
/// 1/(1-rate) so inference needs no rescaling; at inference dropout is a
/// no-op entirely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dropout {
    pub rate: f64,
}

impl Dropout {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Sample a scaled keep/drop mask for one activation vector
    pub fn sample_mask<R: Rng>(&self, len: usize, rng: &mut R) -> Array1<f64> {
        if self.rate <= 0.0 {
            return Array1::ones(len);
        }
        let keep = 1.0 - self.rate;
        Array1::from_iter((0..len).map(|_| {
            if rng.gen::<f64>() < keep {
                1.0 / keep
            } else {
                0.0
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_dense_forward_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = Dense::new(4, 8, Activation::Relu, &mut rng);
        let out = layer.forward(&Array1::zeros(4));

        assert_eq!(out.len(), 8);
        assert!(out.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_dense_backward_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut layer = Dense::new(3, 2, Activation::Tanh, &mut rng);
        let x = array![0.3, -0.7, 0.5];

        // Loss: sum of outputs
        let (out, z) = layer.forward_cached(&x);
        let d_out = Array1::ones(out.len());
        let (grads, _) = layer.backward(&x, &z, &d_out);

        let eps = 1e-6;
        let original = layer.weights[[1, 2]];
        layer.weights[[1, 2]] = original + eps;
        let plus: f64 = layer.forward(&x).sum();
        layer.weights[[1, 2]] = original - eps;
        let minus: f64 = layer.forward(&x).sum();
        layer.weights[[1, 2]] = original;

        let numeric = (plus - minus) / (2.0 * eps);
        assert!((grads.d_weights[[1, 2]] - numeric).abs() < 1e-6);
    }

    #[test]
    fn test_relu_derivative() {
        let z = array![-1.0, 0.0, 2.0];
        let d = Activation::Relu.derivative(&z);
        assert_eq!(d, array![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_dropout_mask_scaling() {
        let mut rng = StdRng::seed_from_u64(3);
        let dropout = Dropout::new(0.5);
        let mask = dropout.sample_mask(1000, &mut rng);

        // Kept units are scaled by 1/keep
        assert!(mask.iter().all(|&v| v == 0.0 || (v - 2.0).abs() < 1e-12));

        // Expected value of the mask is ~1
        let mean = mask.mean().unwrap();
        assert!((mean - 1.0).abs() < 0.15);
    }

    #[test]
    fn test_dropout_zero_rate_is_identity() {
        let mut rng = StdRng::seed_from_u64(4);
        let mask = Dropout::new(0.0).sample_mask(16, &mut rng);
        assert!(mask.iter().all(|&v| v == 1.0));
    }
}
