//! LSTM point forecaster
//!
//! Fixed architecture: LSTM(U) returning the full hidden sequence, dropout,
//! LSTM(U/2) returning the final hidden state, dropout, Dense(32, ReLU),
//! Dense(1, linear). Inputs are presented to the recurrent stage as length-1
//! sequences over the four scaled features; the sequence machinery is kept
//! general so longer lookbacks stay possible.
//!
//! Trained with analytic backpropagation through time, MSE loss on the
//! scaled target, MAE tracked, Adam at a fixed learning rate.

use super::config::LstmConfig;
use super::layers::{outer, Activation, Dense, DenseGrads, Dropout};
use super::optimizer::{Adam, AdamSlot};
use crate::error::{ForecastError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array1, Array2, Ix1, Ix2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One LSTM layer (weights for the four gates)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayer {
    pub input_size: usize,
    pub hidden_size: usize,

    // input gate
    w_ii: Array2<f64>,
    w_hi: Array2<f64>,
    b_i: Array1<f64>,
    // forget gate
    w_if: Array2<f64>,
    w_hf: Array2<f64>,
    b_f: Array1<f64>,
    // cell candidate
    w_ig: Array2<f64>,
    w_hg: Array2<f64>,
    b_g: Array1<f64>,
    // output gate
    w_io: Array2<f64>,
    w_ho: Array2<f64>,
    b_o: Array1<f64>,
}

/// Cached activations for one time step, used by the backward pass
#[derive(Debug, Clone)]
struct StepCache {
    x: Array1<f64>,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    c: Array1<f64>,
}

/// Parameter gradients for one LSTM layer
#[derive(Debug, Clone)]
pub struct LstmGrads {
    dw_ii: Array2<f64>,
    dw_hi: Array2<f64>,
    db_i: Array1<f64>,
    dw_if: Array2<f64>,
    dw_hf: Array2<f64>,
    db_f: Array1<f64>,
    dw_ig: Array2<f64>,
    dw_hg: Array2<f64>,
    db_g: Array1<f64>,
    dw_io: Array2<f64>,
    dw_ho: Array2<f64>,
    db_o: Array1<f64>,
}

impl LstmGrads {
    fn zeros_like(layer: &LstmLayer) -> Self {
        Self {
            dw_ii: Array2::zeros(layer.w_ii.raw_dim()),
            dw_hi: Array2::zeros(layer.w_hi.raw_dim()),
            db_i: Array1::zeros(layer.b_i.raw_dim()),
            dw_if: Array2::zeros(layer.w_if.raw_dim()),
            dw_hf: Array2::zeros(layer.w_hf.raw_dim()),
            db_f: Array1::zeros(layer.b_f.raw_dim()),
            dw_ig: Array2::zeros(layer.w_ig.raw_dim()),
            dw_hg: Array2::zeros(layer.w_hg.raw_dim()),
            db_g: Array1::zeros(layer.b_g.raw_dim()),
            dw_io: Array2::zeros(layer.w_io.raw_dim()),
            dw_ho: Array2::zeros(layer.w_ho.raw_dim()),
            db_o: Array1::zeros(layer.b_o.raw_dim()),
        }
    }

    fn accumulate(&mut self, other: &LstmGrads) {
        self.dw_ii += &other.dw_ii;
        self.dw_hi += &other.dw_hi;
        self.db_i += &other.db_i;
        self.dw_if += &other.dw_if;
        self.dw_hf += &other.dw_hf;
        self.db_f += &other.db_f;
        self.dw_ig += &other.dw_ig;
        self.dw_hg += &other.dw_hg;
        self.db_g += &other.db_g;
        self.dw_io += &other.dw_io;
        self.dw_ho += &other.dw_ho;
        self.db_o += &other.db_o;
    }
}

impl LstmLayer {
    /// Create a layer with uniform init in ±sqrt(1/hidden_size); forget
    /// gate bias starts at 1 so early training does not forget everything
    pub fn new<R: Rng>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let limit = (1.0 / hidden_size as f64).sqrt();
        let dist = Uniform::new(-limit, limit);
        let mat =
            |rows, cols, rng: &mut R| Array2::random_using((rows, cols), dist, rng);

        Self {
            input_size,
            hidden_size,
            w_ii: mat(hidden_size, input_size, rng),
            w_hi: mat(hidden_size, hidden_size, rng),
            b_i: Array1::zeros(hidden_size),
            w_if: mat(hidden_size, input_size, rng),
            w_hf: mat(hidden_size, hidden_size, rng),
            b_f: Array1::from_elem(hidden_size, 1.0),
            w_ig: mat(hidden_size, input_size, rng),
            w_hg: mat(hidden_size, hidden_size, rng),
            b_g: Array1::zeros(hidden_size),
            w_io: mat(hidden_size, input_size, rng),
            w_ho: mat(hidden_size, hidden_size, rng),
            b_o: Array1::zeros(hidden_size),
        }
    }

    fn step(
        &self,
        x: &Array1<f64>,
        h_prev: &Array1<f64>,
        c_prev: &Array1<f64>,
    ) -> StepCache {
        let i = sigmoid(&(self.w_ii.dot(x) + self.w_hi.dot(h_prev) + &self.b_i));
        let f = sigmoid(&(self.w_if.dot(x) + self.w_hf.dot(h_prev) + &self.b_f));
        let g = (self.w_ig.dot(x) + self.w_hg.dot(h_prev) + &self.b_g).mapv(f64::tanh);
        let o = sigmoid(&(self.w_io.dot(x) + self.w_ho.dot(h_prev) + &self.b_o));
        let c = &f * c_prev + &i * &g;

        StepCache {
            x: x.clone(),
            h_prev: h_prev.clone(),
            c_prev: c_prev.clone(),
            i,
            f,
            g,
            o,
            c,
        }
    }

    /// Run the full sequence, returning the hidden state at every step
    pub fn forward_sequence(&self, xs: &[Array1<f64>]) -> Vec<Array1<f64>> {
        let (hs, _) = self.forward_cached(xs);
        hs
    }

    fn forward_cached(&self, xs: &[Array1<f64>]) -> (Vec<Array1<f64>>, Vec<StepCache>) {
        let mut h = Array1::zeros(self.hidden_size);
        let mut c = Array1::zeros(self.hidden_size);

        let mut hs = Vec::with_capacity(xs.len());
        let mut caches = Vec::with_capacity(xs.len());

        for x in xs {
            let cache = self.step(x, &h, &c);
            h = &cache.o * &cache.c.mapv(f64::tanh);
            c = cache.c.clone();
            hs.push(h.clone());
            caches.push(cache);
        }

        (hs, caches)
    }

    /// Backpropagation through time.
    ///
    /// `d_hs[t]` is the loss gradient with respect to the hidden state at
    /// step t (zero where the step's output is unused). Returns parameter
    /// gradients and the gradient with respect to each input step.
    fn backward(&self, caches: &[StepCache], d_hs: &[Array1<f64>]) -> (LstmGrads, Vec<Array1<f64>>) {
        let mut grads = LstmGrads::zeros_like(self);
        let mut d_xs = vec![Array1::zeros(self.input_size); caches.len()];

        let mut dh_carry: Array1<f64> = Array1::zeros(self.hidden_size);
        let mut dc_carry: Array1<f64> = Array1::zeros(self.hidden_size);

        for t in (0..caches.len()).rev() {
            let cache = &caches[t];
            let tc = cache.c.mapv(f64::tanh);

            let dh = &d_hs[t] + &dh_carry;
            let d_o = &dh * &tc;
            let dc = &dc_carry + &(&dh * &cache.o * &tc.mapv(|v| 1.0 - v * v));

            let d_i = &dc * &cache.g;
            let d_g = &dc * &cache.i;
            let d_f = &dc * &cache.c_prev;
            dc_carry = &dc * &cache.f;

            let dp_i = &d_i * &cache.i * &cache.i.mapv(|v| 1.0 - v);
            let dp_f = &d_f * &cache.f * &cache.f.mapv(|v| 1.0 - v);
            let dp_o = &d_o * &cache.o * &cache.o.mapv(|v| 1.0 - v);
            let dp_g = &d_g * &cache.g.mapv(|v| 1.0 - v * v);

            grads.dw_ii += &outer(&dp_i, &cache.x);
            grads.dw_hi += &outer(&dp_i, &cache.h_prev);
            grads.db_i += &dp_i;
            grads.dw_if += &outer(&dp_f, &cache.x);
            grads.dw_hf += &outer(&dp_f, &cache.h_prev);
            grads.db_f += &dp_f;
            grads.dw_ig += &outer(&dp_g, &cache.x);
            grads.dw_hg += &outer(&dp_g, &cache.h_prev);
            grads.db_g += &dp_g;
            grads.dw_io += &outer(&dp_o, &cache.x);
            grads.dw_ho += &outer(&dp_o, &cache.h_prev);
            grads.db_o += &dp_o;

            d_xs[t] = self.w_ii.t().dot(&dp_i)
                + self.w_if.t().dot(&dp_f)
                + self.w_ig.t().dot(&dp_g)
                + self.w_io.t().dot(&dp_o);

            dh_carry = self.w_hi.t().dot(&dp_i)
                + self.w_hf.t().dot(&dp_f)
                + self.w_hg.t().dot(&dp_g)
                + self.w_ho.t().dot(&dp_o);
        }

        (grads, d_xs)
    }
}

fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

/// Loss curves recorded during one training run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Training MSE (scaled target) per epoch
    pub train_loss: Vec<f64>,
    /// Validation MSE per epoch; empty when validation_split is 0
    pub val_loss: Vec<f64>,
    /// Training MAE per epoch
    pub train_mae: Vec<f64>,
    /// Validation MAE per epoch
    pub val_mae: Vec<f64>,
}

impl TrainingHistory {
    /// Final training loss, if any epochs ran
    pub fn final_loss(&self) -> Option<f64> {
        self.train_loss.last().copied()
    }
}

/// Two-layer LSTM regressor producing one scalar per sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmForecaster {
    pub config: LstmConfig,
    layer1: LstmLayer,
    layer2: LstmLayer,
    hidden: Dense,
    output: Dense,
    dropout: Dropout,
}

impl LstmForecaster {
    pub fn from_config(config: LstmConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let units1 = config.lstm_units;
        let units2 = config.second_layer_units();

        Self {
            layer1: LstmLayer::new(config.input_size, units1, &mut rng),
            layer2: LstmLayer::new(units1, units2, &mut rng),
            hidden: Dense::new(units2, config.dense_units, Activation::Relu, &mut rng),
            output: Dense::new(config.dense_units, 1, Activation::Linear, &mut rng),
            dropout: Dropout::new(config.dropout_rate),
            config,
        }
    }

    /// Number of input features the forecaster expects
    pub fn input_size(&self) -> usize {
        self.config.input_size
    }

    /// Pure forward inference for a batch of scaled feature rows.
    ///
    /// Dropout is disabled; identical inputs give identical outputs.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_input(x)?;

        let mut out = Array1::zeros(x.nrows());
        for (idx, row) in x.rows().into_iter().enumerate() {
            out[idx] = self.forward_sample(&row.to_owned());
        }
        Ok(out)
    }

    fn forward_sample(&self, row: &Array1<f64>) -> f64 {
        // Length-1 sequence over the scaled features
        let seq = vec![row.clone()];
        let hs1 = self.layer1.forward_sequence(&seq);
        let hs2 = self.layer2.forward_sequence(&hs1);
        let last = hs2.last().expect("non-empty sequence");
        let hidden = self.hidden.forward(last);
        self.output.forward(&hidden)[0]
    }

    /// Train with mini-batch Adam on MSE.
    ///
    /// The trailing `validation_split` fraction of the data is held out for
    /// validation and never used for gradient updates.
    pub fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        epochs: usize,
        batch_size: usize,
        validation_split: f64,
    ) -> Result<TrainingHistory> {
        self.check_input(x)?;
        if x.nrows() != y.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }
        if !(0.0..1.0).contains(&validation_split) {
            return Err(ForecastError::InsufficientData(format!(
                "validation_split must be in [0, 1), got {validation_split}"
            )));
        }

        let n = x.nrows();
        let n_val = (n as f64 * validation_split) as usize;
        let n_train = n - n_val;
        if n_train == 0 {
            return Err(ForecastError::InsufficientData(
                "no training rows left after validation split".to_string(),
            ));
        }
        let batch_size = batch_size.max(1).min(n_train);

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };

        let mut adam = Adam::new(self.config.learning_rate);
        let mut slots = ForecasterSlots::zeros_like(self);
        let mut history = TrainingHistory::default();

        let bar = ProgressBar::new(epochs as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) loss: {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        for epoch in 0..epochs {
            let mut epoch_sq = 0.0;
            let mut epoch_abs = 0.0;

            for start in (0..n_train).step_by(batch_size) {
                let end = (start + batch_size).min(n_train);
                let (sq, abs) = self.train_batch(x, y, start, end, &mut adam, &mut slots, &mut rng);
                epoch_sq += sq;
                epoch_abs += abs;
            }

            history.train_loss.push(epoch_sq / n_train as f64);
            history.train_mae.push(epoch_abs / n_train as f64);

            if n_val > 0 {
                let (val_loss, val_mae) = self.holdout_metrics(x, y, n_train, n)?;
                history.val_loss.push(val_loss);
                history.val_mae.push(val_mae);
            }

            bar.set_message(format!("{:.6}", history.train_loss[epoch]));
            bar.inc(1);
        }

        bar.finish_and_clear();
        debug!(
            final_loss = history.final_loss(),
            epochs, "point forecaster training finished"
        );

        Ok(history)
    }

    /// One mini-batch: forward with dropout, backprop, Adam step.
    /// Returns the batch's summed squared and absolute errors.
    fn train_batch(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        start: usize,
        end: usize,
        adam: &mut Adam,
        slots: &mut ForecasterSlots,
        rng: &mut StdRng,
    ) -> (f64, f64) {
        let batch_len = (end - start) as f64;

        let mut g1 = LstmGrads::zeros_like(&self.layer1);
        let mut g2 = LstmGrads::zeros_like(&self.layer2);
        let mut gh = DenseGrads::zeros_like(&self.hidden);
        let mut go = DenseGrads::zeros_like(&self.output);

        let mut sum_sq = 0.0;
        let mut sum_abs = 0.0;

        for idx in start..end {
            let row = x.row(idx).to_owned();
            let seq = vec![row];

            let (hs1, cache1) = self.layer1.forward_cached(&seq);
            let mask1 = self.dropout.sample_mask(self.layer1.hidden_size, rng);
            let hs1_dropped: Vec<Array1<f64>> = hs1.iter().map(|h| h * &mask1).collect();

            let (hs2, cache2) = self.layer2.forward_cached(&hs1_dropped);
            let mask2 = self.dropout.sample_mask(self.layer2.hidden_size, rng);
            let last = hs2.last().expect("non-empty sequence") * &mask2;

            let (hidden_out, hidden_z) = self.hidden.forward_cached(&last);
            let (out, out_z) = self.output.forward_cached(&hidden_out);

            let err = out[0] - y[idx];
            sum_sq += err * err;
            sum_abs += err.abs();

            // d(MSE)/d(pred), averaged over the batch
            let d_pred = Array1::from_elem(1, 2.0 * err / batch_len);

            let (d_out_layer, d_hidden_out) = self.output.backward(&hidden_out, &out_z, &d_pred);
            let (d_hidden_layer, d_last_masked) =
                self.hidden.backward(&last, &hidden_z, &d_hidden_out);

            // Only the final hidden state of layer 2 feeds the dense stack
            let mut d_hs2 = vec![Array1::zeros(self.layer2.hidden_size); hs2.len()];
            *d_hs2.last_mut().expect("non-empty sequence") = d_last_masked * &mask2;

            let (grads2, d_hs1_dropped) = self.layer2.backward(&cache2, &d_hs2);

            let d_hs1: Vec<Array1<f64>> =
                d_hs1_dropped.iter().map(|d| d * &mask1).collect();
            let (grads1, _) = self.layer1.backward(&cache1, &d_hs1);

            g1.accumulate(&grads1);
            g2.accumulate(&grads2);
            gh.accumulate(&d_hidden_layer);
            go.accumulate(&d_out_layer);
        }

        adam.begin_step();
        slots.apply(self, adam, &g1, &g2, &gh, &go);

        (sum_sq, sum_abs)
    }

    fn holdout_metrics(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        from: usize,
        to: usize,
    ) -> Result<(f64, f64)> {
        let mut sum_sq = 0.0;
        let mut sum_abs = 0.0;
        for idx in from..to {
            let pred = self.forward_sample(&x.row(idx).to_owned());
            let err = pred - y[idx];
            sum_sq += err * err;
            sum_abs += err.abs();
        }
        let count = (to - from) as f64;
        Ok((sum_sq / count, sum_abs / count))
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if x.ncols() != self.config.input_size {
            return Err(ForecastError::DimensionMismatch {
                expected: self.config.input_size,
                got: x.ncols(),
            });
        }
        Ok(())
    }
}

/// Adam moment slots for every parameter tensor of the forecaster
struct ForecasterSlots {
    layer1: LstmSlots,
    layer2: LstmSlots,
    hidden_w: AdamSlot<Ix2>,
    hidden_b: AdamSlot<Ix1>,
    output_w: AdamSlot<Ix2>,
    output_b: AdamSlot<Ix1>,
}

struct LstmSlots {
    w_ii: AdamSlot<Ix2>,
    w_hi: AdamSlot<Ix2>,
    b_i: AdamSlot<Ix1>,
    w_if: AdamSlot<Ix2>,
    w_hf: AdamSlot<Ix2>,
    b_f: AdamSlot<Ix1>,
    w_ig: AdamSlot<Ix2>,
    w_hg: AdamSlot<Ix2>,
    b_g: AdamSlot<Ix1>,
    w_io: AdamSlot<Ix2>,
    w_ho: AdamSlot<Ix2>,
    b_o: AdamSlot<Ix1>,
}

impl LstmSlots {
    fn zeros_like(layer: &LstmLayer) -> Self {
        Self {
            w_ii: AdamSlot::zeros_like(&layer.w_ii),
            w_hi: AdamSlot::zeros_like(&layer.w_hi),
            b_i: AdamSlot::zeros_like(&layer.b_i),
            w_if: AdamSlot::zeros_like(&layer.w_if),
            w_hf: AdamSlot::zeros_like(&layer.w_hf),
            b_f: AdamSlot::zeros_like(&layer.b_f),
            w_ig: AdamSlot::zeros_like(&layer.w_ig),
            w_hg: AdamSlot::zeros_like(&layer.w_hg),
            b_g: AdamSlot::zeros_like(&layer.b_g),
            w_io: AdamSlot::zeros_like(&layer.w_io),
            w_ho: AdamSlot::zeros_like(&layer.w_ho),
            b_o: AdamSlot::zeros_like(&layer.b_o),
        }
    }

    fn apply(&mut self, layer: &mut LstmLayer, adam: &Adam, grads: &LstmGrads) {
        adam.update(&mut self.w_ii, &mut layer.w_ii, &grads.dw_ii);
        adam.update(&mut self.w_hi, &mut layer.w_hi, &grads.dw_hi);
        adam.update(&mut self.b_i, &mut layer.b_i, &grads.db_i);
        adam.update(&mut self.w_if, &mut layer.w_if, &grads.dw_if);
        adam.update(&mut self.w_hf, &mut layer.w_hf, &grads.dw_hf);
        adam.update(&mut self.b_f, &mut layer.b_f, &grads.db_f);
        adam.update(&mut self.w_ig, &mut layer.w_ig, &grads.dw_ig);
        adam.update(&mut self.w_hg, &mut layer.w_hg, &grads.dw_hg);
        adam.update(&mut self.b_g, &mut layer.b_g, &grads.db_g);
        adam.update(&mut self.w_io, &mut layer.w_io, &grads.dw_io);
        adam.update(&mut self.w_ho, &mut layer.w_ho, &grads.dw_ho);
        adam.update(&mut self.b_o, &mut layer.b_o, &grads.db_o);
    }
}

impl ForecasterSlots {
    fn zeros_like(model: &LstmForecaster) -> Self {
        Self {
            layer1: LstmSlots::zeros_like(&model.layer1),
            layer2: LstmSlots::zeros_like(&model.layer2),
            hidden_w: AdamSlot::zeros_like(&model.hidden.weights),
            hidden_b: AdamSlot::zeros_like(&model.hidden.biases),
            output_w: AdamSlot::zeros_like(&model.output.weights),
            output_b: AdamSlot::zeros_like(&model.output.biases),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &mut self,
        model: &mut LstmForecaster,
        adam: &Adam,
        g1: &LstmGrads,
        g2: &LstmGrads,
        gh: &DenseGrads,
        go: &DenseGrads,
    ) {
        self.layer1.apply(&mut model.layer1, adam, g1);
        self.layer2.apply(&mut model.layer2, adam, g2);
        adam.update(&mut self.hidden_w, &mut model.hidden.weights, &gh.d_weights);
        adam.update(&mut self.hidden_b, &mut model.hidden.biases, &gh.d_biases);
        adam.update(&mut self.output_w, &mut model.output.weights, &go.d_weights);
        adam.update(&mut self.output_b, &mut model.output.biases, &go.d_biases);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn tiny_config() -> LstmConfig {
        LstmConfig::new(4)
            .with_lstm_units(8)
            .with_dropout_rate(0.0)
            .with_seed(42)
    }

    #[test]
    fn test_layer_forward_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = LstmLayer::new(4, 8, &mut rng);

        let seq = vec![Array1::zeros(4), Array1::ones(4)];
        let hs = layer.forward_sequence(&seq);

        assert_eq!(hs.len(), 2);
        assert_eq!(hs[0].len(), 8);
    }

    #[test]
    fn test_layer_backward_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut layer = LstmLayer::new(3, 4, &mut rng);
        let seq = vec![array![0.2, -0.4, 0.9], array![0.5, 0.1, -0.3]];

        // Loss: sum of the last hidden state
        let (hs, caches) = layer.forward_cached(&seq);
        let mut d_hs = vec![Array1::zeros(4); 2];
        d_hs[1] = Array1::ones(4);
        let (grads, _) = layer.backward(&caches, &d_hs);

        let eps = 1e-6;
        let original = layer.w_hf[[2, 1]];
        layer.w_hf[[2, 1]] = original + eps;
        let plus: f64 = layer.forward_sequence(&seq)[1].sum();
        layer.w_hf[[2, 1]] = original - eps;
        let minus: f64 = layer.forward_sequence(&seq)[1].sum();
        layer.w_hf[[2, 1]] = original;

        let numeric = (plus - minus) / (2.0 * eps);
        assert!(
            (grads.dw_hf[[2, 1]] - numeric).abs() < 1e-6,
            "analytic {} vs numeric {}",
            grads.dw_hf[[2, 1]],
            numeric
        );
        let _ = hs;
    }

    #[test]
    fn test_predict_is_deterministic() {
        let model = LstmForecaster::from_config(tiny_config());
        let x = array![[0.5, 0.2, 0.8, 0.1], [0.1, 0.9, 0.3, 0.7]];

        let a = model.predict(&x).unwrap();
        let b = model.predict(&x).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let model = LstmForecaster::from_config(tiny_config());
        let err = model.predict(&array![[0.5, 0.2]]).unwrap_err();
        assert!(matches!(err, ForecastError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_fit_reduces_loss() {
        let mut model = LstmForecaster::from_config(tiny_config());

        // Simple learnable signal: y = mean of features
        let n = 64;
        let mut x = Array2::zeros((n, 4));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            for j in 0..4 {
                x[[i, j]] = ((i * 7 + j * 3) % 11) as f64 / 10.0;
            }
            y[i] = x.row(i).mean().unwrap();
        }

        let history = model.fit(&x, &y, 40, 16, 0.2).unwrap();

        assert_eq!(history.train_loss.len(), 40);
        assert_eq!(history.val_loss.len(), 40);
        let first = history.train_loss[0];
        let last = *history.train_loss.last().unwrap();
        assert!(last < first, "loss did not decrease: {first} -> {last}");
    }

    #[test]
    fn test_validation_rows_not_trained_on() {
        // With validation_split covering most rows, training still runs on
        // the leading fraction only and records validation metrics
        let mut model = LstmForecaster::from_config(tiny_config());
        let x = Array2::from_elem((10, 4), 0.5);
        let y = Array1::from_elem(10, 0.5);

        let history = model.fit(&x, &y, 3, 4, 0.5).unwrap();
        assert_eq!(history.val_loss.len(), 3);
        assert_eq!(history.val_mae.len(), 3);
    }

    #[test]
    fn test_fit_rejects_bad_split() {
        let mut model = LstmForecaster::from_config(tiny_config());
        let x = Array2::from_elem((4, 4), 0.5);
        let y = Array1::from_elem(4, 0.5);

        assert!(model.fit(&x, &y, 1, 2, 1.0).is_err());
    }
}
