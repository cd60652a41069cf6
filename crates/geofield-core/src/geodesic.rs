// ─────────────────────────────────────────────────────────────────────
// GeoField — Geodesic Distance (constant metrics)
// ─────────────────────────────────────────────────────────────────────
//! Under a spatially constant metric geodesics are straight lines and
//!
//!   d_g(p, q) = √(Δᵀ g Δ),  Δ = q − p.
//!
//! Position-dependent metrics use the path-integral form in the
//! geometry crate.

use crate::metric::Metric;
use crate::point::Point;

/// Full contraction √(Δᵀ g Δ). Returns 0 on dimension mismatch.
pub fn geodesic_distance(p: &Point, q: &Point, metric: &Metric) -> f64 {
    if p.dimension() != q.dimension() || p.dimension() != metric.dimension() {
        return 0.0;
    }
    let delta = p.delta_to(q);
    metric.quadratic_form(&delta).max(0.0).sqrt()
}

/// Block-wise contraction for block-diagonal metrics; falls back to the
/// full contraction otherwise.
pub fn geodesic_distance_optimized(p: &Point, q: &Point, metric: &Metric) -> f64 {
    if p.dimension() != q.dimension() || p.dimension() != metric.dimension() {
        return 0.0;
    }
    if !metric.is_block_diagonal() {
        return geodesic_distance(p, q, metric);
    }
    let delta = p.delta_to(q);
    metric.block_quadratic_form(&delta).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pt(c: &[f64]) -> Point {
        Point::from_slice(c).unwrap()
    }

    #[test]
    fn test_identity_is_euclidean() {
        let m = Metric::identity(2);
        let d = geodesic_distance(&pt(&[0.0, 0.0]), &pt(&[3.0, 4.0]), &m);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_diagonal() {
        let m = Metric::from_diagonal(&[4.0, 1.0]).unwrap();
        let d = geodesic_distance(&pt(&[0.0, 0.0]), &pt(&[1.0, 0.0]), &m);
        assert!((d - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch_is_zero() {
        let m = Metric::identity(2);
        assert_eq!(geodesic_distance(&pt(&[0.0, 0.0]), &pt(&[1.0, 0.0, 0.0]), &m), 0.0);
    }

    #[test]
    fn test_optimized_matches_general_for_block_metric() {
        let mut m = Metric::identity(6);
        m.set(0, 1, 0.2);
        m.set(1, 2, -0.1);
        m.set(3, 4, 0.3);
        m.set(5, 5, 2.5);
        m.update().unwrap();
        assert!(m.is_block_diagonal());
        let p = pt(&[0.1, -0.4, 0.7, 1.2, 0.0, 0.3]);
        let q = pt(&[-0.5, 0.2, 0.9, 0.4, 0.6, -0.2]);
        let a = geodesic_distance(&p, &q, &m);
        let b = geodesic_distance_optimized(&p, &q, &m);
        assert!((a - b).abs() < 1e-12 * a.max(1.0), "{a} vs {b}");
    }

    #[test]
    fn test_optimized_falls_back_for_coupled_metric() {
        let mut m = Metric::identity(6);
        m.set(2, 3, 0.4);
        m.update().unwrap();
        let p = pt(&[0.0; 6]);
        let q = pt(&[0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
        let a = geodesic_distance(&p, &q, &m);
        let b = geodesic_distance_optimized(&p, &q, &m);
        assert_eq!(a, b);
        assert!((a - (2.0f64 + 0.8).sqrt()).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_triangle_inequality_diagonal_metric(
            diag in prop::collection::vec(0.05f64..20.0, 3),
            a in prop::collection::vec(-5.0f64..5.0, 3),
            b in prop::collection::vec(-5.0f64..5.0, 3),
            c in prop::collection::vec(-5.0f64..5.0, 3),
        ) {
            let m = Metric::from_diagonal(&diag).unwrap();
            let (a, b, c) = (pt(&a), pt(&b), pt(&c));
            let ab = geodesic_distance(&a, &b, &m);
            let bc = geodesic_distance(&b, &c, &m);
            let ac = geodesic_distance(&a, &c, &m);
            prop_assert!(ac <= ab + bc + 1e-9 * (1.0 + ab + bc), "{ac} > {ab} + {bc}");
            prop_assert!((ab - geodesic_distance(&b, &a, &m)).abs() < 1e-12);
            prop_assert_eq!(geodesic_distance(&a, &a, &m), 0.0);
            let optimized = geodesic_distance_optimized(&a, &b, &m);
            prop_assert!((ab - optimized).abs() < 1e-12 * (1.0 + ab));
        }
    }
}
