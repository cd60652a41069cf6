// ─────────────────────────────────────────────────────────────────────
// GeoField — Metric Regularization
// ─────────────────────────────────────────────────────────────────────

use geofield_core::Metric;
use geofield_types::FieldResult;

const BISECTION_STEPS: usize = 96;

/// Relative slack on both determinant bounds, so a metric that was just
/// regularized is not corrected again.
pub const DET_TOLERANCE: f64 = 1e-9;

/// Bring `det g` into `[min_det, max_det]`.
///
/// A near-singular metric gets the smallest diagonal shift δ with
/// Π(λᵢ + δ) = min_det; an oversized one is scaled by √(max_det/det).
/// Returns `None` when the metric is already in range, up to
/// [`DET_TOLERANCE`].
pub fn regularize_metric(metric: &Metric, min_det: f64, max_det: f64) -> FieldResult<Option<Metric>> {
    metric.validate()?;
    let det = metric.determinant();
    if det < min_det * (1.0 - DET_TOLERANCE) {
        let delta = diagonal_floor(&metric.eigen().values, min_det);
        let mut fixed = metric.clone();
        fixed.add_to_diagonal(delta);
        fixed.update()?;
        log::debug!("metric det {det:.3e} < {min_det:.3e}: diagonal shift {delta:.3e}");
        return Ok(Some(fixed));
    }
    if det > max_det * (1.0 + DET_TOLERANCE) {
        let factor = (max_det / det).sqrt();
        let mut fixed = metric.clone();
        fixed.scale(factor);
        fixed.update()?;
        log::debug!("metric det {det:.3e} > {max_det:.3e}: scaled by {factor:.3e}");
        return Ok(Some(fixed));
    }
    Ok(None)
}

/// Smallest δ ≥ 0 with Σ ln(λᵢ + δ) ≥ ln(target), by bisection.
fn diagonal_floor(eigenvalues: &[f64], target: f64) -> f64 {
    let n = eigenvalues.len().max(1) as f64;
    let log_target = target.ln();
    let lambda_min = eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
    let log_det = |delta: f64| eigenvalues.iter().map(|l| (l + delta).ln()).sum::<f64>();

    let mut lo = 0.0;
    // (λ_min + hi)ⁿ = target bounds the product from below.
    let mut hi = (target.powf(1.0 / n) - lambda_min).max(0.0);
    if log_det(lo) >= log_target {
        return 0.0;
    }
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if log_det(mid) >= log_target {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_in_range_untouched() {
        let m = Metric::identity(3);
        assert!(regularize_metric(&m, 1e-6, 1e6).unwrap().is_none());
    }

    #[test]
    fn test_near_singular_lifted_to_floor() {
        let m = Metric::from_diagonal(&[1e-4, 1.0, 1.0]).unwrap();
        let fixed = regularize_metric(&m, 1e-2, 1e6).unwrap().unwrap();
        assert_relative_eq!(fixed.determinant(), 1e-2, max_relative = 1e-9);
        // Off-diagonal structure is untouched by a diagonal shift.
        assert_eq!(fixed.g(0, 1), 0.0);
        assert!(fixed.g(0, 0) > m.g(0, 0));
    }

    #[test]
    fn test_correlated_metric_floor() {
        let m = Metric::from_matrix(2, vec![1.0, 0.9999, 0.9999, 1.0]).unwrap();
        let fixed = regularize_metric(&m, 1e-2, 1e6).unwrap().unwrap();
        assert_relative_eq!(fixed.determinant(), 1e-2, max_relative = 1e-9);
        assert_eq!(fixed.g(0, 1), 0.9999);
    }

    #[test]
    fn test_oversized_scaled_down() {
        let m = Metric::from_diagonal(&[100.0, 100.0, 100.0]).unwrap();
        let fixed = regularize_metric(&m, 1e-6, 1e4).unwrap().unwrap();
        // √(1e4/1e6) = 0.1 per entry
        assert_relative_eq!(fixed.g(0, 0), 10.0, epsilon = 1e-12);
        assert!(fixed.determinant() <= 1e4);
    }

    #[test]
    fn test_stale_metric_rejected() {
        let mut m = Metric::identity(2);
        m.set(0, 1, 0.5);
        assert!(regularize_metric(&m, 1e-6, 1e6).is_err());
    }
}
