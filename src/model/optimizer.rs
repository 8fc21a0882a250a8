//! Adam optimizer with per-parameter moment state

use ndarray::{Array, Dimension};
use serde::{Deserialize, Serialize};

/// Adaptive moment estimation with the usual defaults
/// (beta1 = 0.9, beta2 = 0.999, eps = 1e-8)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    /// Step counter shared by every parameter tensor
    t: u64,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            t: 0,
        }
    }

    /// Advance the shared step counter; call once per optimizer step,
    /// before updating the parameter tensors of that step.
    pub fn begin_step(&mut self) {
        self.t += 1;
    }

    /// Update one parameter tensor in place from its gradient
    pub fn update<D: Dimension>(
        &self,
        slot: &mut AdamSlot<D>,
        param: &mut Array<f64, D>,
        grad: &Array<f64, D>,
    ) {
        debug_assert!(self.t > 0, "begin_step must run before update");

        slot.m.zip_mut_with(grad, |m, &g| {
            *m = self.beta1 * *m + (1.0 - self.beta1) * g;
        });
        slot.v.zip_mut_with(grad, |v, &g| {
            *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
        });

        let bias1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias2 = 1.0 - self.beta2.powi(self.t as i32);

        ndarray::Zip::from(param)
            .and(&slot.m)
            .and(&slot.v)
            .for_each(|p, &m, &v| {
                let m_hat = m / bias1;
                let v_hat = v / bias2;
                *p -= self.learning_rate * m_hat / (v_hat.sqrt() + self.eps);
            });
    }
}

/// First and second moment estimates for one parameter tensor
#[derive(Debug, Clone)]
pub struct AdamSlot<D: Dimension> {
    m: Array<f64, D>,
    v: Array<f64, D>,
}

impl<D: Dimension> AdamSlot<D> {
    pub fn zeros_like(param: &Array<f64, D>) -> Self {
        Self {
            m: Array::zeros(param.raw_dim()),
            v: Array::zeros(param.raw_dim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_adam_descends_quadratic() {
        // Minimize f(x) = x^2 from x = 5
        let mut param = array![5.0];
        let mut slot = AdamSlot::zeros_like(&param);
        let mut adam = Adam::new(0.1);

        for _ in 0..500 {
            let grad = array![2.0 * param[0]];
            adam.begin_step();
            adam.update(&mut slot, &mut param, &grad);
        }

        assert!(param[0].abs() < 0.05);
    }

    #[test]
    fn test_first_step_magnitude() {
        // With bias correction the first step is ~learning_rate regardless
        // of gradient scale
        let mut param = array![0.0];
        let mut slot = AdamSlot::zeros_like(&param);
        let mut adam = Adam::new(0.001);

        adam.begin_step();
        adam.update(&mut slot, &mut param, &array![123.0]);

        assert!((param[0] + 0.001).abs() < 1e-6);
    }
}
