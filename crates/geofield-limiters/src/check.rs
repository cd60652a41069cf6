// ─────────────────────────────────────────────────────────────────────
// GeoField — Bound Checks
// ─────────────────────────────────────────────────────────────────────

use geofield_core::{Field, Metric, Point};
use geofield_geometry::{
    laplace_beltrami_optimized, riemann_tensor, scalar_curvature, DET_TOLERANCE,
};
use geofield_types::LimitCheck;

use crate::limiter::{gradient_norm, AdaptiveLimiter, ENERGY_TOLERANCE};

impl AdaptiveLimiter {
    /// Report whether `field` sits inside the active bounds. Never mutates.
    pub fn check_limits(&self, field: &Field) -> LimitCheck {
        let cfg = self.active_config();
        let slack = 1.0 + ENERGY_TOLERANCE;
        let centers = field.centers();

        let metric_in_range = |m: &Metric| {
            m.is_valid()
                && m.determinant() >= cfg.min_metric_det * (1.0 - DET_TOLERANCE)
                && m.determinant() <= cfg.max_metric_det * (1.0 + DET_TOLERANCE)
        };
        let curvature_within = |m: &Metric, at: &Point| {
            riemann_tensor(m, at).max_abs() <= cfg.max_riemann
                && scalar_curvature(m, at).abs() <= cfg.max_scalar_curvature
        };
        let origin = Point::origin(field.dimension());
        let metric_ok = metric_in_range(field.metric())
            && (0..field.len()).all(|i| metric_in_range(field.center_metric(i)));
        let curvature_ok = curvature_within(field.metric(), &origin)
            && (0..field.len()).all(|i| curvature_within(field.center_metric(i), centers[i].point()));

        LimitCheck {
            finite: field.check_finite().is_ok(),
            energy_ok: field.compute_energy() <= cfg.max_energy * slack,
            amplitude_ok: centers
                .iter()
                .all(|c| c.coeff().norm() <= cfg.max_center_amplitude * slack),
            epsilon_ok: centers
                .iter()
                .all(|c| c.epsilon() >= cfg.min_epsilon && c.epsilon() <= cfg.max_epsilon),
            metric_ok,
            gradient_ok: centers
                .iter()
                .all(|c| gradient_norm(&field.gradient(c.point())) <= cfg.max_gradient * slack),
            laplacian_ok: centers
                .iter()
                .all(|c| laplace_beltrami_optimized(field, c.point()).norm() <= cfg.max_laplacian),
            curvature_ok,
        }
    }
}
