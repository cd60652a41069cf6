// ─────────────────────────────────────────────────────────────────────
// GeoField — Curvature
// ─────────────────────────────────────────────────────────────────────
//! Riemann, Ricci and scalar curvature from finite differences of the
//! connection:
//!
//!   Rⁱⱼₖₗ = ∂ₖΓⁱₗⱼ − ∂ₗΓⁱₖⱼ + ΓⁱₖₘΓᵐₗⱼ − ΓⁱₗₘΓᵐₖⱼ
//!   Rⱼₗ = Rᵏⱼₖₗ,   R = gʲˡ Rⱼₗ
//!
//! Sign convention gives R = 2 on the unit sphere.

use geofield_core::Point;

use crate::christoffel::{christoffel_symbols, Christoffel};
use crate::metric_field::MetricField;

/// Step for connection derivatives. Larger than the metric step so the
/// nested difference stays above round-off.
pub const CONNECTION_FD_STEP: f64 = 1e-4;

/// Rⁱⱼₖₗ stored at `((i·n + j)·n + k)·n + l`.
#[derive(Debug, Clone, PartialEq)]
pub struct RiemannTensor {
    dim: usize,
    data: Vec<f64>,
}

impl RiemannTensor {
    fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim.pow(4)],
        }
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        let n = self.dim;
        self.data[((i * n + j) * n + k) * n + l]
    }

    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, v| m.max(v.abs()))
    }

    /// Rⱼₗ = Rᵏⱼₖₗ, row-major n×n.
    pub fn ricci(&self) -> Vec<f64> {
        let n = self.dim;
        let mut ric = vec![0.0; n * n];
        for j in 0..n {
            for l in 0..n {
                ric[j * n + l] = (0..n).map(|k| self.get(k, j, k, l)).sum();
            }
        }
        ric
    }
}

/// Full Riemann tensor at `point`; zeros on dimension mismatch or a
/// degenerate metric.
pub fn riemann_tensor<S: MetricField + ?Sized>(source: &S, point: &Point) -> RiemannTensor {
    let n = source.dimension();
    let mut riemann = RiemannTensor::zeros(n);
    if point.dimension() != n || source.metric_at(point).is_none() {
        return riemann;
    }
    if source.constant_revision().is_some() {
        return riemann;
    }

    let gamma = christoffel_symbols(source, point);
    let h = CONNECTION_FD_STEP;
    // dgamma[m] = ∂ₘΓ
    let dgamma: Vec<Christoffel> = (0..n)
        .map(|m| {
            let plus = christoffel_symbols(source, &point.offset(m, h));
            let minus = christoffel_symbols(source, &point.offset(m, -h));
            difference(&plus, &minus, 2.0 * h)
        })
        .collect();

    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                for l in (k + 1)..n {
                    let mut v = dgamma[k].get(i, l, j) - dgamma[l].get(i, k, j);
                    for m in 0..n {
                        v += gamma.get(i, k, m) * gamma.get(m, l, j)
                            - gamma.get(i, l, m) * gamma.get(m, k, j);
                    }
                    riemann.data[((i * n + j) * n + k) * n + l] = v;
                    riemann.data[((i * n + j) * n + l) * n + k] = -v;
                }
            }
        }
    }
    riemann
}

fn difference(plus: &Christoffel, minus: &Christoffel, width: f64) -> Christoffel {
    let n = plus.dimension();
    let mut out = Christoffel::zeros(n);
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                out.set(k, i, j, (plus.get(k, i, j) - minus.get(k, i, j)) / width);
            }
        }
    }
    out
}

pub fn ricci_tensor<S: MetricField + ?Sized>(source: &S, point: &Point) -> Vec<f64> {
    riemann_tensor(source, point).ricci()
}

/// R = gʲˡ Rⱼₗ; zero for a constant metric.
pub fn scalar_curvature<S: MetricField + ?Sized>(source: &S, point: &Point) -> f64 {
    let n = source.dimension();
    let Some(metric) = source.metric_at(point) else {
        return 0.0;
    };
    if point.dimension() != n {
        return 0.0;
    }
    let ric = ricci_tensor(source, point);
    let mut r = 0.0;
    for j in 0..n {
        for l in 0..n {
            r += metric.inv(j, l) * ric[j * n + l];
        }
    }
    r
}
