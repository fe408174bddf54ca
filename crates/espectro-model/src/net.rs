//! Seeded one-hidden-layer feed-forward classifier.
//!
//! Architecture is fixed: input → ReLU hidden layer → softmax output,
//! trained with full-batch Adam on cross-entropy plus a small L2 penalty.
//! Full-batch updates plus a seeded init make a fit bit-reproducible for a
//! given `(X, y, options)`.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ModelError;

/// Classifier hyperparameters.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Width of the single hidden layer.
    pub hidden_units: usize,
    /// Iteration cap. A safety bound for small corpora, not a tuning target.
    pub max_iter: usize,
    /// Seed for weight initialisation.
    pub seed: u64,
    pub learning_rate: f32,
    /// L2 penalty strength.
    pub alpha: f32,
    /// Minimum loss improvement counted as progress.
    pub tol: f32,
    /// Consecutive non-improving iterations before stopping.
    pub n_iter_no_change: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            hidden_units: 100,
            max_iter: 5000,
            seed: 1,
            learning_rate: 1e-3,
            alpha: 1e-4,
            tol: 1e-4,
            n_iter_no_change: 10,
        }
    }
}

/// How a fit ended.
#[derive(Debug, Clone, Copy)]
pub struct FitOutcome {
    pub n_iter: usize,
    /// False when the iteration cap was hit before the loss plateaued. The
    /// fitted state is still usable; the trainer surfaces a warning.
    pub converged: bool,
    pub final_loss: f32,
}

/// Fitted feed-forward classifier: one embedding vector in, one class out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    /// Hidden weights, `hidden × dim_in`.
    w1: Array2<f32>,
    b1: Array1<f32>,
    /// Output weights, `n_classes × hidden`.
    w2: Array2<f32>,
    b2: Array1<f32>,
}

impl MlpClassifier {
    /// Input dimensionality the classifier was fitted on.
    pub fn dim_in(&self) -> usize {
        self.w1.ncols()
    }

    pub fn n_classes(&self) -> usize {
        self.w2.nrows()
    }

    /// Fit on `x` (`n × dim`) against class indices `y` (`len n`).
    ///
    /// Runs until the loss stops improving by more than `tol` for
    /// `n_iter_no_change` iterations, or until `max_iter`. Hitting the cap is
    /// non-fatal: the best-effort state is returned with `converged = false`.
    pub fn fit(
        x: &Array2<f32>,
        y: &[usize],
        n_classes: usize,
        options: &TrainOptions,
    ) -> (Self, FitOutcome) {
        let n = x.nrows();
        let dim = x.ncols();
        let hidden = options.hidden_units;
        assert_eq!(n, y.len(), "features and labels must be index-aligned");
        assert!(n > 0, "cannot fit on an empty dataset");

        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut w1 = glorot_uniform(hidden, dim, &mut rng);
        let mut b1 = Array1::<f32>::zeros(hidden);
        let mut w2 = glorot_uniform(n_classes, hidden, &mut rng);
        let mut b2 = Array1::<f32>::zeros(n_classes);

        // One-hot targets.
        let mut targets = Array2::<f32>::zeros((n, n_classes));
        for (i, &class) in y.iter().enumerate() {
            targets[[i, class]] = 1.0;
        }

        let mut adam = Adam::new(hidden, dim, n_classes);

        let mut best_loss = f32::INFINITY;
        let mut no_improvement = 0usize;
        let mut converged = false;
        let mut n_iter = 0usize;
        let mut loss = f32::INFINITY;

        for iter in 1..=options.max_iter {
            // Forward pass.
            let z1 = x.dot(&w1.t()) + &b1;
            let h = z1.mapv(|v| v.max(0.0));
            let logits = h.dot(&w2.t()) + &b2;
            let probs = softmax_rows(&logits);

            loss = cross_entropy(&probs, y)
                + options.alpha * 0.5 * (sum_sq(&w1) + sum_sq(&w2)) / n as f32;

            // Backward pass.
            let dlogits = (&probs - &targets) / n as f32;
            let dw2 = dlogits.t().dot(&h) + &(options.alpha / n as f32 * &w2);
            let db2 = dlogits.sum_axis(Axis(0));
            let mut dh = dlogits.dot(&w2);
            dh.zip_mut_with(&z1, |g, &z| {
                if z <= 0.0 {
                    *g = 0.0;
                }
            });
            let dw1 = dh.t().dot(x) + &(options.alpha / n as f32 * &w1);
            let db1 = dh.sum_axis(Axis(0));

            adam.step(
                options.learning_rate,
                (&mut w1, &dw1),
                (&mut b1, &db1),
                (&mut w2, &dw2),
                (&mut b2, &db2),
            );

            n_iter = iter;
            if iter % 100 == 0 {
                debug!(iter, loss, "training");
            }

            if loss > best_loss - options.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            best_loss = best_loss.min(loss);

            if no_improvement >= options.n_iter_no_change {
                converged = true;
                break;
            }
        }

        if converged {
            info!(n_iter, loss, "training converged");
        } else {
            warn!(
                max_iter = options.max_iter,
                loss, "training hit the iteration cap before converging"
            );
        }

        (
            Self { w1, b1, w2, b2 },
            FitOutcome {
                n_iter,
                converged,
                final_loss: loss,
            },
        )
    }

    /// Predict the class of a single embedding vector.
    pub fn predict_one(&self, x: &[f32]) -> Result<usize, ModelError> {
        if x.len() != self.dim_in() {
            return Err(ModelError::DimensionMismatch {
                expected: self.dim_in(),
                got: x.len(),
            });
        }

        let x = ndarray::ArrayView1::from(x);
        let h = (self.w1.dot(&x) + &self.b1).mapv(|v| v.max(0.0));
        let logits = self.w2.dot(&h) + &self.b2;

        let mut best = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (class, &score) in logits.iter().enumerate() {
            if score > best_score {
                best_score = score;
                best = class;
            }
        }
        Ok(best)
    }

    /// Predict classes for every row of `x`.
    pub fn predict(&self, x: &Array2<f32>) -> Result<Vec<usize>, ModelError> {
        x.rows()
            .into_iter()
            .map(|row| self.predict_one(&row.to_vec()))
            .collect()
    }
}

/// Glorot-uniform initialisation for a `rows × cols` weight matrix.
fn glorot_uniform(rows: usize, cols: usize, rng: &mut StdRng) -> Array2<f32> {
    let bound = (6.0 / (rows + cols) as f32).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.random_range(-bound..bound))
}

/// Numerically stable row-wise softmax.
fn softmax_rows(logits: &Array2<f32>) -> Array2<f32> {
    let mut out = logits.clone();
    for mut row in out.rows_mut() {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|v| v / sum);
        }
    }
    out
}

/// Mean negative log-likelihood of the true classes.
fn cross_entropy(probs: &Array2<f32>, y: &[usize]) -> f32 {
    let mut total = 0.0f64;
    for (i, &class) in y.iter().enumerate() {
        total -= f64::from(probs[[i, class]].max(1e-12).ln());
    }
    (total / y.len() as f64) as f32
}

fn sum_sq(m: &Array2<f32>) -> f32 {
    m.iter().map(|v| v * v).sum()
}

// ── Adam optimizer ──

const BETA1: f32 = 0.9;
const BETA2: f32 = 0.999;
const EPS: f32 = 1e-8;

/// First/second moment estimates for one parameter tensor.
struct Moments<D: ndarray::Dimension> {
    m: ndarray::Array<f32, D>,
    v: ndarray::Array<f32, D>,
}

impl<D: ndarray::Dimension> Moments<D> {
    fn update(
        &mut self,
        lr: f32,
        correction1: f32,
        correction2: f32,
        param: &mut ndarray::Array<f32, D>,
        grad: &ndarray::Array<f32, D>,
    ) {
        self.m.zip_mut_with(grad, |m, &g| *m = BETA1 * *m + (1.0 - BETA1) * g);
        self.v
            .zip_mut_with(grad, |v, &g| *v = BETA2 * *v + (1.0 - BETA2) * g * g);

        ndarray::Zip::from(param)
            .and(&self.m)
            .and(&self.v)
            .for_each(|p, &m, &v| {
                let m_hat = m / correction1;
                let v_hat = v / correction2;
                *p -= lr * m_hat / (v_hat.sqrt() + EPS);
            });
    }
}

/// Full-batch Adam with bias correction, one moment pair per parameter.
struct Adam {
    t: i32,
    w1: Moments<ndarray::Ix2>,
    b1: Moments<ndarray::Ix1>,
    w2: Moments<ndarray::Ix2>,
    b2: Moments<ndarray::Ix1>,
}

impl Adam {
    fn new(hidden: usize, dim: usize, n_classes: usize) -> Self {
        Self {
            t: 0,
            w1: Moments {
                m: Array2::zeros((hidden, dim)),
                v: Array2::zeros((hidden, dim)),
            },
            b1: Moments {
                m: Array1::zeros(hidden),
                v: Array1::zeros(hidden),
            },
            w2: Moments {
                m: Array2::zeros((n_classes, hidden)),
                v: Array2::zeros((n_classes, hidden)),
            },
            b2: Moments {
                m: Array1::zeros(n_classes),
                v: Array1::zeros(n_classes),
            },
        }
    }

    #[allow(clippy::type_complexity)]
    fn step(
        &mut self,
        lr: f32,
        w1: (&mut Array2<f32>, &Array2<f32>),
        b1: (&mut Array1<f32>, &Array1<f32>),
        w2: (&mut Array2<f32>, &Array2<f32>),
        b2: (&mut Array1<f32>, &Array1<f32>),
    ) {
        self.t += 1;
        let correction1 = 1.0 - BETA1.powi(self.t);
        let correction2 = 1.0 - BETA2.powi(self.t);

        self.w1.update(lr, correction1, correction2, w1.0, w1.1);
        self.b1.update(lr, correction1, correction2, b1.0, b1.1);
        self.w2.update(lr, correction1, correction2, w2.0, w2.1);
        self.b2.update(lr, correction1, correction2, b2.0, b2.1);
    }
}
