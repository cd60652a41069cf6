// ─────────────────────────────────────────────────────────────────────
// GeoField — Geodesic Length Under Varying Metrics
// ─────────────────────────────────────────────────────────────────────

use geofield_core::{geodesic_distance_optimized, Point};

use crate::metric_field::MetricField;

pub const DEFAULT_PATH_STEPS: usize = 32;

/// Length of the straight segment p→q under `source`, by the midpoint
/// rule ∫₀¹ √(Δᵀ g(x(t)) Δ) dt.
///
/// An upper bound on the true geodesic distance; exact for constant
/// metrics. Returns 0 on dimension mismatch and ∞ if the metric
/// degenerates along the path.
pub fn path_length<S: MetricField + ?Sized>(source: &S, p: &Point, q: &Point, steps: usize) -> f64 {
    let n = source.dimension();
    if p.dimension() != n || q.dimension() != n {
        return 0.0;
    }
    let steps = steps.max(1);
    let delta = p.delta_to(q);
    let mut length = 0.0;
    for s in 0..steps {
        let t = (s as f64 + 0.5) / steps as f64;
        let Some(g) = source.metric_at(&p.lerp(q, t)) else {
            return f64::INFINITY;
        };
        length += g.quadratic_form(&delta).max(0.0).sqrt();
    }
    length / steps as f64
}

/// Closed form for constant sources, path integral otherwise.
pub fn geodesic_distance_varying<S: MetricField + ?Sized>(source: &S, p: &Point, q: &Point) -> f64 {
    if source.constant_revision().is_some() {
        if let Some(g) = source.metric_at(p) {
            return geodesic_distance_optimized(p, q, &g);
        }
    }
    path_length(source, p, q, DEFAULT_PATH_STEPS)
}
