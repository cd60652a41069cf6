// ─────────────────────────────────────────────────────────────────────
// GeoField — Christoffel Symbols
// ─────────────────────────────────────────────────────────────────────
//! Levi-Civita connection from central-difference metric derivatives:
//!
//!   Γᵏᵢⱼ = ½ gᵏˡ (∂ᵢgⱼₗ + ∂ⱼgᵢₗ − ∂ₗgᵢⱼ)
//!
//! A spatially constant metric has bitwise-identical samples on both
//! sides of every stencil, so its connection is exactly zero.

use geofield_core::{Complex64, Field, Point};

use crate::metric_field::MetricField;

/// Step for metric derivatives.
pub const METRIC_FD_STEP: f64 = 1e-5;

/// Γᵏᵢⱼ stored at `(k·n + i)·n + j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Christoffel {
    dim: usize,
    data: Vec<f64>,
}

impl Christoffel {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * dim * dim],
        }
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn get(&self, k: usize, i: usize, j: usize) -> f64 {
        self.data[(k * self.dim + i) * self.dim + j]
    }

    #[inline]
    pub(crate) fn set(&mut self, k: usize, i: usize, j: usize, value: f64) {
        self.data[(k * self.dim + i) * self.dim + j] = value;
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, v| m.max(v.abs()))
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|v| *v == 0.0)
    }

    /// vᵏ = gⁱʲ Γᵏᵢⱼ, the contraction used by the Laplace–Beltrami operator.
    pub fn contract(&self, g_inv: &[f64]) -> Vec<f64> {
        let n = self.dim;
        (0..n)
            .map(|k| {
                let mut sum = 0.0;
                for i in 0..n {
                    for j in 0..n {
                        sum += g_inv[i * n + j] * self.get(k, i, j);
                    }
                }
                sum
            })
            .collect()
    }
}

/// ∂ₖgᵢⱼ stored at `(k·n + i)·n + j`; `None` if the metric is degenerate
/// anywhere on the stencil.
pub fn metric_derivatives<S: MetricField + ?Sized>(source: &S, point: &Point) -> Option<Vec<f64>> {
    let n = source.dimension();
    let h = METRIC_FD_STEP;
    let mut dg = vec![0.0; n * n * n];
    for k in 0..n {
        let plus = source.metric_at(&point.offset(k, h))?;
        let minus = source.metric_at(&point.offset(k, -h))?;
        for i in 0..n {
            for j in 0..n {
                dg[(k * n + i) * n + j] = (plus.g(i, j) - minus.g(i, j)) / (2.0 * h);
            }
        }
    }
    Some(dg)
}

/// Christoffel symbols of the second kind at `point`.
///
/// Returns zeros on dimension mismatch or a degenerate metric.
pub fn christoffel_symbols<S: MetricField + ?Sized>(source: &S, point: &Point) -> Christoffel {
    let n = source.dimension();
    let mut gamma = Christoffel::zeros(n);
    if point.dimension() != n {
        return gamma;
    }
    let Some(metric) = source.metric_at(point) else {
        return gamma;
    };
    let Some(dg) = metric_derivatives(source, point) else {
        return gamma;
    };
    let d = |k: usize, i: usize, j: usize| dg[(k * n + i) * n + j];

    // Lowered symbols Γₗᵢⱼ = ½(∂ᵢgⱼₗ + ∂ⱼgᵢₗ − ∂ₗgᵢⱼ), symmetric in (i, j)
    let mut lowered = vec![0.0; n * n * n];
    for l in 0..n {
        for i in 0..n {
            for j in i..n {
                let v = 0.5 * (d(i, j, l) + d(j, i, l) - d(l, i, j));
                lowered[(l * n + i) * n + j] = v;
                lowered[(l * n + j) * n + i] = v;
            }
        }
    }
    for k in 0..n {
        for i in 0..n {
            for j in i..n {
                let mut sum = 0.0;
                for l in 0..n {
                    sum += metric.inv(k, l) * lowered[(l * n + i) * n + j];
                }
                gamma.set(k, i, j, sum);
                gamma.set(k, j, i, sum);
            }
        }
    }
    gamma
}

/// ∇ᵢΦ for the scalar field Φ. Scalars carry no connection term, so
/// this is the partial derivative along `direction`; zero for an axis
/// the field does not have.
pub fn covariant_derivative_scalar(field: &Field, point: &Point, direction: usize) -> Complex64 {
    field
        .gradient(point)
        .get(direction)
        .copied()
        .unwrap_or_default()
}
