// ─────────────────────────────────────────────────────────────────────
// GeoField — Metric Tensor
// ─────────────────────────────────────────────────────────────────────
//! Symmetric positive-definite metric `g` with cached inverse and
//! determinant.
//!
//! Mutators leave the metric stale (`is_valid() == false`); callers run
//! [`Metric::update`] before reading the inverse or determinant. Every
//! successful update stamps a fresh revision, which downstream caches
//! use as their key.

use std::sync::atomic::{AtomicU64, Ordering};

use geofield_types::{FieldError, FieldResult};

use crate::spectral::SymmetricEigen;

/// Relative tolerance for the symmetry check.
const SYMMETRY_TOL: f64 = 1e-12;

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// Axis blocks of the 6-D manifold: spatial, temporal, modal.
pub const BLOCKS_6D: [(usize, usize); 3] = [(0, 3), (3, 5), (5, 6)];

#[derive(Debug, Clone)]
pub struct Metric {
    dim: usize,
    /// Row-major dim×dim.
    g: Vec<f64>,
    g_inv: Vec<f64>,
    det: f64,
    valid: bool,
    block_diagonal: bool,
    revision: u64,
}

impl PartialEq for Metric {
    fn eq(&self, other: &Self) -> bool {
        self.dim == other.dim && self.g == other.g
    }
}

impl Metric {
    /// Flat Euclidean metric.
    pub fn identity(dim: usize) -> Self {
        let mut g = vec![0.0; dim * dim];
        for i in 0..dim {
            g[i * dim + i] = 1.0;
        }
        Self {
            dim,
            g_inv: g.clone(),
            g,
            det: 1.0,
            valid: true,
            block_diagonal: true,
            revision: next_revision(),
        }
    }

    pub fn from_diagonal(diag: &[f64]) -> FieldResult<Self> {
        let dim = diag.len();
        let mut g = vec![0.0; dim * dim];
        for (i, &d) in diag.iter().enumerate() {
            g[i * dim + i] = d;
        }
        Self::from_matrix(dim, g)
    }

    /// Build from a row-major matrix; fails on asymmetric or indefinite input.
    pub fn from_matrix(dim: usize, g: Vec<f64>) -> FieldResult<Self> {
        if dim == 0 || g.len() != dim * dim {
            return Err(FieldError::Dimension(format!(
                "metric of dimension {dim} needs {} entries, got {}",
                dim * dim,
                g.len()
            )));
        }
        let mut m = Self {
            dim,
            g_inv: vec![0.0; dim * dim],
            g,
            det: 0.0,
            valid: false,
            block_diagonal: false,
            revision: 0,
        };
        m.update()?;
        Ok(m)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn g(&self, i: usize, j: usize) -> f64 {
        self.g[i * self.dim + j]
    }

    #[inline]
    pub fn inv(&self, i: usize, j: usize) -> f64 {
        self.g_inv[i * self.dim + j]
    }

    pub fn matrix(&self) -> &[f64] {
        &self.g
    }

    pub fn inverse_matrix(&self) -> &[f64] {
        &self.g_inv
    }

    pub fn determinant(&self) -> f64 {
        self.det
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when `g` has no coupling across the axis blocks used by the
    /// optimized geodesic distance.
    pub fn is_block_diagonal(&self) -> bool {
        self.block_diagonal
    }

    /// Axis blocks for this dimension: the 6-D split, or one block per axis.
    pub fn blocks(&self) -> Vec<(usize, usize)> {
        if self.dim == 6 {
            BLOCKS_6D.to_vec()
        } else {
            (0..self.dim).map(|i| (i, i + 1)).collect()
        }
    }

    /// Set `g_ij` and `g_ji`. Leaves the metric stale.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.g[i * self.dim + j] = value;
        self.g[j * self.dim + i] = value;
        self.valid = false;
    }

    /// Multiply every entry by `factor`. Leaves the metric stale.
    pub fn scale(&mut self, factor: f64) {
        for v in self.g.iter_mut() {
            *v *= factor;
        }
        self.valid = false;
    }

    /// Add `delta` to each diagonal entry. Leaves the metric stale.
    pub fn add_to_diagonal(&mut self, delta: f64) {
        for i in 0..self.dim {
            self.g[i * self.dim + i] += delta;
        }
        self.valid = false;
    }

    /// Recompute inverse, determinant and block structure.
    ///
    /// Fails (and marks the metric invalid) when `g` is non-finite,
    /// asymmetric, or not positive-definite.
    pub fn update(&mut self) -> FieldResult<()> {
        self.valid = false;
        let n = self.dim;
        if self.g.iter().any(|v| !v.is_finite()) {
            return Err(FieldError::Metric("metric has non-finite entries".to_string()));
        }
        let scale = self.g.iter().fold(0.0f64, |m, v| m.max(v.abs())).max(1.0);
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (self.g[i * n + j], self.g[j * n + i]);
                if (a - b).abs() > SYMMETRY_TOL * scale {
                    return Err(FieldError::Metric(format!(
                        "metric is not symmetric at ({i}, {j}): {a} vs {b}"
                    )));
                }
            }
        }

        let l = cholesky(&self.g, n).ok_or_else(|| {
            FieldError::Metric("metric is not positive-definite".to_string())
        })?;

        let mut det = 1.0;
        for i in 0..n {
            det *= l[i * n + i] * l[i * n + i];
        }
        self.det = det;
        self.g_inv = cholesky_inverse(&l, n);
        self.block_diagonal = self.detect_block_diagonal();
        self.revision = next_revision();
        self.valid = true;
        Ok(())
    }

    /// Eagerly reject stale or invalid metrics.
    pub fn validate(&self) -> FieldResult<()> {
        if !self.valid {
            return Err(FieldError::Metric(
                "metric is stale or invalid; call update()".to_string(),
            ));
        }
        if !(self.det > 0.0) || !self.det.is_finite() {
            return Err(FieldError::Metric(format!(
                "metric determinant must be positive and finite, got {}",
                self.det
            )));
        }
        Ok(())
    }

    /// Δᵀ g Δ.
    pub fn quadratic_form(&self, delta: &[f64]) -> f64 {
        let n = self.dim;
        let mut sum = 0.0;
        for i in 0..n {
            let mut row = 0.0;
            for j in 0..n {
                row += self.g[i * n + j] * delta[j];
            }
            sum += delta[i] * row;
        }
        sum
    }

    /// Δᵀ g Δ restricted to the diagonal blocks.
    pub fn block_quadratic_form(&self, delta: &[f64]) -> f64 {
        let n = self.dim;
        let mut sum = 0.0;
        for (lo, hi) in self.blocks() {
            for i in lo..hi {
                let mut row = 0.0;
                for j in lo..hi {
                    row += self.g[i * n + j] * delta[j];
                }
                sum += delta[i] * row;
            }
        }
        sum
    }

    /// g·Δ.
    pub fn lower(&self, delta: &[f64]) -> Vec<f64> {
        let n = self.dim;
        (0..n)
            .map(|i| (0..n).map(|j| self.g[i * n + j] * delta[j]).sum())
            .collect()
    }

    pub fn eigen(&self) -> SymmetricEigen {
        SymmetricEigen::decompose(&self.g, self.dim)
    }

    pub fn condition_number(&self) -> f64 {
        self.eigen().condition_number()
    }

    /// Congruence `S g S` with `S = diag(√fᵢ)`; positive factors keep `g`
    /// positive-definite.
    pub fn scaled_axes(&self, factors: &[f64]) -> FieldResult<Metric> {
        if factors.len() != self.dim {
            return Err(FieldError::Dimension(format!(
                "expected {} axis factors, got {}",
                self.dim,
                factors.len()
            )));
        }
        if let Some(f) = factors.iter().find(|f| !(**f > 0.0)) {
            return Err(FieldError::Metric(format!("axis factor must be > 0, got {f}")));
        }
        let n = self.dim;
        let roots: Vec<f64> = factors.iter().map(|f| f.sqrt()).collect();
        let mut g = self.g.clone();
        for i in 0..n {
            for j in 0..n {
                g[i * n + j] *= roots[i] * roots[j];
            }
        }
        Metric::from_matrix(n, g)
    }

    /// Principal sub-metric over the given axes.
    pub fn restrict(&self, axes: &[usize]) -> FieldResult<Metric> {
        let k = axes.len();
        if let Some(a) = axes.iter().find(|a| **a >= self.dim) {
            return Err(FieldError::Dimension(format!(
                "axis {a} out of range for dimension {}",
                self.dim
            )));
        }
        let mut g = vec![0.0; k * k];
        for (r, &i) in axes.iter().enumerate() {
            for (c, &j) in axes.iter().enumerate() {
                g[r * k + c] = self.g(i, j);
            }
        }
        Metric::from_matrix(k, g)
    }

    fn detect_block_diagonal(&self) -> bool {
        let n = self.dim;
        let blocks = self.blocks();
        let block_of = |axis: usize| blocks.iter().position(|&(lo, hi)| axis >= lo && axis < hi);
        for i in 0..n {
            for j in 0..n {
                if block_of(i) != block_of(j) && self.g[i * n + j] != 0.0 {
                    return false;
                }
            }
        }
        true
    }
}

/// Lower Cholesky factor, `None` unless strictly positive-definite.
fn cholesky(a: &[f64], n: usize) -> Option<Vec<f64>> {
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if !(sum > 0.0) {
                    return None;
                }
                l[i * n + i] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }
    Some(l)
}

/// (L Lᵀ)⁻¹ by forward/back substitution against the identity.
fn cholesky_inverse(l: &[f64], n: usize) -> Vec<f64> {
    let mut inv = vec![0.0; n * n];
    let mut y = vec![0.0; n];
    for col in 0..n {
        // L y = e_col
        for i in 0..n {
            let mut sum = if i == col { 1.0 } else { 0.0 };
            for k in 0..i {
                sum -= l[i * n + k] * y[k];
            }
            y[i] = sum / l[i * n + i];
        }
        // Lᵀ x = y
        for i in (0..n).rev() {
            let mut sum = y[i];
            for k in (i + 1)..n {
                sum -= l[k * n + i] * inv[k * n + col];
            }
            inv[i * n + col] = sum / l[i * n + i];
        }
    }
    inv
}
