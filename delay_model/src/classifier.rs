use argmin::core::{CostFunction, Executor, Gradient, State};
use argmin::solver::{linesearch::MoreThuenteLineSearch, quasinewton::LBFGS};
use ndarray::{s, Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::artifact;
use crate::error::{Error, Result};

type Lbfgs = LBFGS<MoreThuenteLineSearch<Array1<f64>, Array1<f64>, f64>, Array1<f64>, Array1<f64>, f64>;

/// Correction pairs kept by L-BFGS.
const LBFGS_MEMORY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every sample counts once.
    Uniform,
    /// `n_samples / (n_classes * count(class))`.
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionParams {
    /// Inverse L2 regularisation strength. The intercept is not penalised.
    pub c: f64,
    pub max_iter: usize,
    /// Convergence threshold on the L2 norm of the gradient.
    pub tol: f64,
    pub class_weight: ClassWeight,
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-6,
            class_weight: ClassWeight::Balanced,
        }
    }
}

/// Fitted binary logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Array1<f64>,
    intercept: f64,
    n_iter: usize,
}

impl LogisticRegression {
    /// Fits with L-BFGS. The objective is strictly convex, so the result does
    /// not depend on row order.
    pub fn fit(params: &LogisticRegressionParams, x: ArrayView2<f64>, y: &[u8]) -> Result<Self> {
        let n = x.nrows();
        if n != y.len() {
            return Err(Error::ShapeMismatch { features: n, labels: y.len() });
        }
        if n == 0 {
            return Err(Error::EmptyTrainingSet);
        }
        let positives = y.iter().filter(|v| **v == 1).count();
        if positives == 0 {
            return Err(Error::SingleClass(0));
        }
        if positives == n {
            return Err(Error::SingleClass(1));
        }

        let sample_weight = sample_weights(params.class_weight, y, positives);
        let target: Array1<f64> = y.iter().map(|v| f64::from(*v)).collect();
        let d = x.ncols();
        let mut design = Array2::<f64>::ones((n, d + 1));
        design.slice_mut(s![.., ..d]).assign(&x);
        let problem = Problem {
            design: &design,
            target: &target,
            sample_weight: &sample_weight,
            n_weights: d,
            inv_c: 1.0 / params.c,
        };

        let solver: Lbfgs = LBFGS::new(MoreThuenteLineSearch::new(), LBFGS_MEMORY)
            .with_tolerance_grad(params.tol)
            .map_err(optimizer_error)?;
        let result = Executor::new(problem, solver)
            .configure(|state| state.param(Array1::zeros(d + 1)).max_iters(params.max_iter as u64))
            .run()
            .map_err(optimizer_error)?;

        let state = result.state();
        let n_iter = state.get_iter() as usize;
        let theta = state
            .get_best_param()
            .ok_or_else(|| Error::Optimizer("solver returned no parameters".to_string()))?;

        if n_iter >= params.max_iter {
            tracing::warn!(max_iter = params.max_iter, "logistic regression did not converge");
        }

        Ok(Self {
            weights: theta.slice(s![..d]).to_owned(),
            intercept: theta[d],
            n_iter,
        })
    }

    pub fn from_parts(weights: Array1<f64>, intercept: f64) -> Self {
        Self { weights, intercept, n_iter: 0 }
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features() {
            return Err(Error::FeatureWidth {
                got: x.ncols(),
                expected: self.n_features(),
            });
        }
        Ok(x.dot(&self.weights) + self.intercept)
    }

    /// Probability of the delayed class for each row.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        Ok(self.decision_function(x)?.mapv(sigmoid))
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .decision_function(x)?
            .iter()
            .map(|z| u8::from(*z > 0.0))
            .collect())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        artifact::save(self, path.as_ref())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        artifact::load(path.as_ref())
    }
}

fn sample_weights(mode: ClassWeight, y: &[u8], positives: usize) -> Array1<f64> {
    let n = y.len() as f64;
    match mode {
        ClassWeight::Uniform => Array1::ones(y.len()),
        ClassWeight::Balanced => {
            let w1 = n / (2.0 * positives as f64);
            let w0 = n / (2.0 * (y.len() - positives) as f64);
            y.iter().map(|v| if *v == 1 { w1 } else { w0 }).collect()
        }
    }
}

struct Problem<'a> {
    /// Features with a trailing column of ones for the intercept.
    design: &'a Array2<f64>,
    target: &'a Array1<f64>,
    sample_weight: &'a Array1<f64>,
    n_weights: usize,
    inv_c: f64,
}

impl Problem<'_> {
    fn penalty(&self, theta: &Array1<f64>) -> f64 {
        let w = theta.slice(s![..self.n_weights]);
        0.5 * self.inv_c * w.dot(&w)
    }
}

impl CostFunction for Problem<'_> {
    type Param = Array1<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        let z = self.design.dot(theta);
        let loss: f64 = z
            .iter()
            .zip(self.target.iter())
            .zip(self.sample_weight.iter())
            .map(|((z, y), s)| s * (softplus(*z) - y * z))
            .sum();
        Ok(loss + self.penalty(theta))
    }
}

impl Gradient for Problem<'_> {
    type Param = Array1<f64>;
    type Gradient = Array1<f64>;

    fn gradient(&self, theta: &Self::Param) -> std::result::Result<Self::Gradient, argmin::core::Error> {
        let p = self.design.dot(theta).mapv(sigmoid);
        let residual = (p - self.target) * self.sample_weight;
        let mut grad = self.design.t().dot(&residual);
        for j in 0..self.n_weights {
            grad[j] += self.inv_c * theta[j];
        }
        Ok(grad)
    }
}

fn optimizer_error(e: argmin::core::Error) -> Error {
    Error::Optimizer(e.to_string())
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow.
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}
