// ─────────────────────────────────────────────────────────────────────
// GeoField — Laplace–Beltrami Operator
// ─────────────────────────────────────────────────────────────────────
//! Δ_g f = gⁱʲ(∂ᵢ∂ⱼf − Γᵏᵢⱼ∂ₖf), applied to each basis function and
//! normalized by ε² so that narrow and wide kernels diffuse at the same
//! O(1) rate.
//!
//! Two evaluators:
//!   - optimized: closed-form radial Laplacian at the geodesic radius,
//!     exact whenever the center's metric is constant
//!   - general: finite-difference Hessian and gradient contracted with a
//!     metric and connection, for position-dependent operator metrics

use geofield_core::{geodesic_distance_optimized, Complex64, Field, Metric, Point};

use crate::cache::ConnectionCache;
use crate::christoffel::{christoffel_symbols, Christoffel};
use crate::metric_field::MetricField;

/// Base step of the basis-function stencil, shrunk for narrow kernels.
const HESSIAN_FD_STEP: f64 = 1e-3;

/// Σᵢ cᵢ·∇²φ(r_gᵢ, εᵢ)/εᵢ² in closed form. Zero on dimension mismatch.
pub fn laplace_beltrami_optimized(field: &Field, point: &Point) -> Complex64 {
    laplace_beltrami_optimized_over(field, point, 0..field.len())
}

/// Closed form restricted to the given centers, e.g. a KD-tree
/// neighborhood. Indices with no center are skipped.
pub fn laplace_beltrami_optimized_over<I>(field: &Field, point: &Point, indices: I) -> Complex64
where
    I: IntoIterator<Item = usize>,
{
    let dim = field.dimension();
    if point.dimension() != dim {
        return Complex64::new(0.0, 0.0);
    }
    let kind = field.rbf_kind();
    indices
        .into_iter()
        .filter_map(|i| {
            let c = field.centers().get(i)?;
            let r = geodesic_distance_optimized(point, c.point(), field.center_metric(i));
            Some(c.coeff() * kind.normalized_laplacian(r, c.epsilon(), dim))
        })
        .sum()
}

/// General operator; each center is differentiated under its own metric.
pub fn laplace_beltrami(field: &Field, point: &Point) -> Complex64 {
    laplace_beltrami_cached(field, point, &ConnectionCache::default())
}

/// General operator with connections of constant metrics reused across
/// calls through `cache`.
pub fn laplace_beltrami_cached(field: &Field, point: &Point, cache: &ConnectionCache) -> Complex64 {
    if point.dimension() != field.dimension() {
        return Complex64::new(0.0, 0.0);
    }
    let mut sum = Complex64::new(0.0, 0.0);
    for i in 0..field.len() {
        let metric = field.center_metric(i);
        let gamma = cache.christoffel(metric);
        sum += field.centers()[i].coeff() * center_term(field, i, point, metric, &gamma);
    }
    sum
}

/// General operator under an explicit operator metric; the metric and
/// its connection are sampled from `source` at `point`.
pub fn laplace_beltrami_with<S: MetricField + ?Sized>(
    field: &Field,
    point: &Point,
    source: &S,
) -> Complex64 {
    let zero = Complex64::new(0.0, 0.0);
    if point.dimension() != field.dimension() || source.dimension() != field.dimension() {
        return zero;
    }
    let Some(metric) = source.metric_at(point) else {
        return zero;
    };
    let gamma = christoffel_symbols(source, point);
    (0..field.len())
        .map(|i| field.centers()[i].coeff() * center_term(field, i, point, &metric, &gamma))
        .sum()
}

/// Normalized Δ_g of basis function `i` at `point`.
fn center_term(field: &Field, i: usize, point: &Point, metric: &Metric, gamma: &Christoffel) -> f64 {
    let n = field.dimension();
    let eps = field.centers()[i].epsilon();
    if !(eps > 0.0) {
        return 0.0;
    }
    let h = HESSIAN_FD_STEP * (1.0 / eps).min(1.0);
    let f = |p: &Point| field.basis(i, p);
    let f0 = f(point);

    let v = gamma.contract(metric.inverse_matrix());
    let mut value = 0.0;
    for a in 0..n {
        let fp = f(&point.offset(a, h));
        let fm = f(&point.offset(a, -h));
        let d2 = (fp - 2.0 * f0 + fm) / (h * h);
        let d1 = (fp - fm) / (2.0 * h);
        value += metric.inv(a, a) * d2 - v[a] * d1;
        for b in (a + 1)..n {
            let g_ab = metric.inv(a, b);
            if g_ab == 0.0 {
                continue;
            }
            let mixed = (f(&point.offset2(a, h, b, h)) - f(&point.offset2(a, h, b, -h))
                - f(&point.offset2(a, -h, b, h))
                + f(&point.offset2(a, -h, b, -h)))
                / (4.0 * h * h);
            value += 2.0 * g_ab * mixed;
        }
    }
    value / (eps * eps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric_field::MetricFn;
    use geofield_core::{FieldConfig, MetricMode, RbfKind};

    fn single_center(dim: usize, eps: f64) -> Field {
        let mut field = Field::new(dim, 4, 2.5).unwrap();
        field
            .add_center(Point::origin(dim), Complex64::new(1.0, 0.0), eps)
            .unwrap();
        field
    }

    fn mixed_field(kind: RbfKind, mode: MetricMode) -> Field {
        let mut field = Field::from_config(FieldConfig {
            dimension: 3,
            capacity: 8,
            fractal_dimension: 2.5,
            rbf_kind: kind,
            metric_mode: mode,
        })
        .unwrap();
        let g = Metric::from_matrix(3, vec![1.5, 0.2, 0.0, 0.2, 1.0, 0.1, 0.0, 0.1, 0.8]).unwrap();
        field.set_metric(g).unwrap();
        field
            .add_center(Point::from_slice(&[0.0, 0.0, 0.0]).unwrap(), Complex64::new(1.0, 0.5), 1.2)
            .unwrap();
        field
            .add_center(Point::from_slice(&[0.4, -0.3, 0.2]).unwrap(), Complex64::new(-0.7, 0.2), 0.6)
            .unwrap();
        if mode == MetricMode::PerCenter {
            field
                .set_center_metric(1, Metric::from_diagonal(&[2.0, 0.5, 1.0]).unwrap())
                .unwrap();
        }
        field
    }

    #[test]
    fn test_optimized_over_skips_missing_centers() {
        let field = single_center(2, 1.0);
        let p = Point::origin(2);
        let full = laplace_beltrami_optimized(&field, &p);
        assert_eq!(laplace_beltrami_optimized_over(&field, &p, [0, 3]), full);
        assert_eq!(laplace_beltrami_optimized_over(&field, &p, [3]), Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_gaussian_center_magnitude_independent_of_width() {
        for eps in [0.05, 0.5, 5.0] {
            let field = single_center(2, eps);
            let lb = laplace_beltrami_optimized(&field, &Point::origin(2));
            assert!((lb.norm() - 4.0).abs() < 1e-12, "eps={eps}: {lb}");
            let general = laplace_beltrami(&field, &Point::origin(2));
            assert!((general.norm() - 4.0).abs() < 1e-4, "eps={eps}: {general}");
        }
    }

    #[test]
    fn test_general_matches_optimized() {
        let p = Point::from_slice(&[0.15, 0.1, -0.05]).unwrap();
        for kind in [RbfKind::Gaussian, RbfKind::Multiquadric, RbfKind::InverseMultiquadric] {
            for mode in [MetricMode::Global, MetricMode::PerCenter] {
                let field = mixed_field(kind, mode);
                let fast = laplace_beltrami_optimized(&field, &p);
                let slow = laplace_beltrami(&field, &p);
                assert!((fast - slow).norm() < 1e-4, "{kind:?}/{mode:?}: {fast} vs {slow}");
            }
        }
    }

    #[test]
    fn test_explicit_metric_matches_optimized() {
        let field = mixed_field(RbfKind::Gaussian, MetricMode::Global);
        let p = Point::from_slice(&[0.2, 0.0, 0.1]).unwrap();
        let fast = laplace_beltrami_optimized(&field, &p);
        let with = laplace_beltrami_with(&field, &p, field.metric());
        assert!((fast - with).norm() < 1e-4);
    }

    #[test]
    fn test_conformal_operator_metric_scales() {
        // Operator metric λ²·I divides the flat Laplacian by λ².
        let field = single_center(2, 1.0);
        let lambda_sq = 4.0;
        let source = MetricFn::new(2, move |_: &Point| {
            Metric::from_diagonal(&[lambda_sq, lambda_sq]).ok()
        });
        let p = Point::from_slice(&[0.3, -0.2]).unwrap();
        let flat = laplace_beltrami_optimized(&field, &p);
        let scaled = laplace_beltrami_with(&field, &p, &source);
        assert!((scaled - flat / lambda_sq).norm() < 1e-5, "{scaled} vs {}", flat / lambda_sq);
    }

    #[test]
    fn test_cache_reused_across_points() {
        let field = mixed_field(RbfKind::Gaussian, MetricMode::Global);
        let cache = ConnectionCache::default();
        for x in [0.0, 0.1, 0.2] {
            laplace_beltrami_cached(&field, &Point::from_slice(&[x, 0.0, 0.0]).unwrap(), &cache);
        }
        assert_eq!(cache.len(), 1);
        let (hits, misses) = cache.hit_stats();
        assert_eq!(misses, 1);
        assert_eq!(hits, 5);
    }

    #[test]
    fn test_restricted_sum_matches_full() {
        let field = mixed_field(RbfKind::InverseMultiquadric, MetricMode::Global);
        let p = Point::from_slice(&[0.1, 0.1, 0.1]).unwrap();
        let full = laplace_beltrami_optimized(&field, &p);
        let split = laplace_beltrami_optimized_over(&field, &p, [0])
            + laplace_beltrami_optimized_over(&field, &p, [1]);
        assert!((full - split).norm() < 1e-14);
    }

    #[test]
    fn test_dimension_mismatch_is_zero() {
        let field = single_center(2, 1.0);
        assert_eq!(laplace_beltrami_optimized(&field, &Point::origin(3)), Complex64::new(0.0, 0.0));
        assert_eq!(laplace_beltrami(&field, &Point::origin(3)), Complex64::new(0.0, 0.0));
    }
}
