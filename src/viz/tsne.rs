//! Exact t-SNE (van der Maaten & Hinton, 2008) with PCA initialisation.
//!
//! O(N^2) in time and memory, which is fine for vocabularies of a few
//! hundred entities.
//!
//! - High-dimensional affinities: Gaussian conditionals whose bandwidth is
//!   binary-searched so each row has entropy ln(perplexity), then symmetrised
//! - Low-dimensional affinities: Student-t with one degree of freedom
//! - Optimiser: gradient descent with momentum and per-coordinate gains,
//!   early exaggeration for the first 250 iterations

use ndarray::{s, Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

const EARLY_EXAGGERATION: f64 = 12.0;
const EXAGGERATION_ITERS: usize = 250;
const MIN_GAIN: f64 = 0.01;
const ENTROPY_TOL: f64 = 1e-5;
const BINARY_SEARCH_STEPS: usize = 100;
const MACHINE_EPSILON: f64 = 1e-12;

/// t-SNE settings. Reference values: perplexity 40, 2500 iterations, seed 23.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tsne {
    /// Effective neighbourhood size
    pub perplexity: f64,
    pub iterations: usize,
    /// Seeds the PCA initialisation
    pub seed: u64,
    /// `None` picks max(N / 12 / 4, 50)
    pub learning_rate: Option<f64>,
}

impl Default for Tsne {
    fn default() -> Self {
        Self {
            perplexity: 40.0,
            iterations: 2500,
            seed: 23,
            learning_rate: None,
        }
    }
}

/// One labelled point in the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// 2D coordinates for every projected entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub points: Vec<ProjectedPoint>,
}

impl Projection {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Tsne {
    pub fn new(perplexity: f64, iterations: usize, seed: u64) -> Self {
        Self {
            perplexity,
            iterations,
            seed,
            learning_rate: None,
        }
    }

    /// Project labelled vectors. `labels[i]` names `vectors[i]`.
    pub fn project(&self, vectors: &[Vec<f32>], labels: &[&str]) -> Projection {
        let coords = self.embed(vectors);
        let points = labels
            .iter()
            .zip(coords.outer_iter())
            .map(|(label, row)| ProjectedPoint {
                label: label.to_string(),
                x: row[0],
                y: row[1],
            })
            .collect();
        Projection { points }
    }

    /// Run t-SNE and return [N, 2] coordinates.
    pub fn embed(&self, vectors: &[Vec<f32>]) -> Array2<f64> {
        let n = vectors.len();
        if n < 2 {
            return Array2::zeros((n, 2));
        }

        let x = to_array(vectors);
        let perplexity = self.perplexity.min((n - 1) as f64 / 3.0).max(1.0);
        let p = joint_probabilities(&squared_distances(&x), perplexity);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut y = pca_2d(&x, &mut rng);
        let std0 = y.column(0).std(0.0);
        if std0 > 0.0 {
            y.mapv_inplace(|v| v / std0 * 1e-4);
        }

        let lr = self
            .learning_rate
            .unwrap_or_else(|| (n as f64 / EARLY_EXAGGERATION / 4.0).max(50.0));

        let mut update = Array2::<f64>::zeros((n, 2));
        let mut gains = Array2::<f64>::ones((n, 2));

        for iter in 0..self.iterations {
            let (exaggeration, momentum) = if iter < EXAGGERATION_ITERS {
                (EARLY_EXAGGERATION, 0.5)
            } else {
                (1.0, 0.8)
            };

            let grad = gradient(&p, &y, exaggeration);

            ndarray::Zip::from(&mut gains)
                .and(&grad)
                .and(&update)
                .for_each(|g, &dg, &u| {
                    *g = if (dg > 0.0) != (u > 0.0) {
                        *g + 0.2
                    } else {
                        (*g * 0.8).max(MIN_GAIN)
                    };
                });

            ndarray::Zip::from(&mut update)
                .and(&gains)
                .and(&grad)
                .for_each(|u, &g, &dg| *u = momentum * *u - lr * g * dg);

            y += &update;

            if iter % 250 == 0 {
                tracing::trace!(iter, "t-SNE step");
            }
        }

        tracing::debug!(points = n, perplexity, iterations = self.iterations, "t-SNE finished");
        y
    }
}

fn to_array(vectors: &[Vec<f32>]) -> Array2<f64> {
    let n = vectors.len();
    let d = vectors.first().map_or(0, Vec::len);
    Array2::from_shape_fn((n, d), |(i, j)| vectors[i][j] as f64)
}

fn squared_distances(x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows();
    let norms: Array1<f64> = x.map_axis(Axis(1), |row| row.dot(&row));
    let gram = x.dot(&x.t());
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            0.0
        } else {
            (norms[i] + norms[j] - 2.0 * gram[[i, j]]).max(0.0)
        }
    })
}

/// Row-conditional Gaussian affinities with entropy ln(perplexity).
/// Each row sums to 1 and has a zero diagonal.
fn conditional_probabilities(dist: &Array2<f64>, perplexity: f64) -> Array2<f64> {
    let n = dist.nrows();
    let target = perplexity.ln();
    let mut p = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        let mut beta = 1.0;
        let mut beta_min = f64::NEG_INFINITY;
        let mut beta_max = f64::INFINITY;
        let mut row = vec![0.0; n];

        for _ in 0..BINARY_SEARCH_STEPS {
            let mut sum = 0.0;
            for j in 0..n {
                row[j] = if j == i { 0.0 } else { (-dist[[i, j]] * beta).exp() };
                sum += row[j];
            }
            if sum == 0.0 {
                sum = MACHINE_EPSILON;
            }

            let mut weighted = 0.0;
            for j in 0..n {
                row[j] /= sum;
                weighted += dist[[i, j]] * row[j];
            }
            let entropy = sum.ln() + beta * weighted;

            let diff = entropy - target;
            if diff.abs() <= ENTROPY_TOL {
                break;
            }
            if diff > 0.0 {
                beta_min = beta;
                beta = if beta_max.is_infinite() { beta * 2.0 } else { (beta + beta_max) / 2.0 };
            } else {
                beta_max = beta;
                beta = if beta_min.is_infinite() { beta / 2.0 } else { (beta + beta_min) / 2.0 };
            }
        }

        p.row_mut(i).assign(&Array1::from(row));
    }
    p
}

fn joint_probabilities(dist: &Array2<f64>, perplexity: f64) -> Array2<f64> {
    let n = dist.nrows() as f64;
    let cond = conditional_probabilities(dist, perplexity);
    let joint = (&cond + &cond.t()) / (2.0 * n);
    joint.mapv(|v| v.max(MACHINE_EPSILON))
}

/// KL(P || Q) gradient with P scaled by `exaggeration`.
fn gradient(p: &Array2<f64>, y: &Array2<f64>, exaggeration: f64) -> Array2<f64> {
    let n = y.nrows();

    // Student-t numerators
    let mut num = Array2::<f64>::zeros((n, n));
    let mut total = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = y[[i, 0]] - y[[j, 0]];
            let dy = y[[i, 1]] - y[[j, 1]];
            let v = 1.0 / (1.0 + dx * dx + dy * dy);
            num[[i, j]] = v;
            num[[j, i]] = v;
            total += 2.0 * v;
        }
    }
    let total = total.max(MACHINE_EPSILON);

    let mut grad = Array2::<f64>::zeros((n, 2));
    for i in 0..n {
        let (mut gx, mut gy) = (0.0, 0.0);
        for j in 0..n {
            if i == j {
                continue;
            }
            let q = (num[[i, j]] / total).max(MACHINE_EPSILON);
            let w = (exaggeration * p[[i, j]] - q) * num[[i, j]];
            gx += w * (y[[i, 0]] - y[[j, 0]]);
            gy += w * (y[[i, 1]] - y[[j, 1]]);
        }
        grad[[i, 0]] = 4.0 * gx;
        grad[[i, 1]] = 4.0 * gy;
    }
    grad
}

/// Project rows of `x` onto their first two principal components.
///
/// Components come from power iteration with deflation on the covariance
/// matrix; start vectors are drawn from `rng`. Each component's sign is fixed
/// so its largest-magnitude entry is positive.
pub fn pca_2d<R: Rng + ?Sized>(x: &Array2<f64>, rng: &mut R) -> Array2<f64> {
    let (n, d) = x.dim();
    if n == 0 || d == 0 {
        return Array2::zeros((n, 2));
    }

    let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(d));
    let centered = x - &mean;
    let mut cov = centered.t().dot(&centered) / n as f64;

    let mut out = Array2::<f64>::zeros((n, 2));
    for k in 0..2.min(d) {
        let mut v: Array1<f64> = Array1::from_shape_fn(d, |_| rng.gen_range(-1.0..1.0));
        let mut eigenvalue = 0.0;

        for _ in 0..500 {
            let next = cov.dot(&v);
            let norm = next.dot(&next).sqrt();
            if norm < MACHINE_EPSILON {
                break;
            }
            let next = next / norm;
            let delta = (&next - &v).mapv(f64::abs).sum();
            v = next;
            eigenvalue = norm;
            if delta < 1e-10 {
                break;
            }
        }

        let pivot = v.iter().copied().fold(0.0f64, |acc, e| if e.abs() > acc.abs() { e } else { acc });
        if pivot < 0.0 {
            v.mapv_inplace(|e| -e);
        }

        out.slice_mut(s![.., k]).assign(&centered.dot(&v));

        // Deflate
        let outer = v.view().insert_axis(Axis(1)).dot(&v.view().insert_axis(Axis(0)));
        cov = cov - outer * eigenvalue;
    }
    out
}
