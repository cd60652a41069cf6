// ─────────────────────────────────────────────────────────────────────
// GeoField — Energy-Adaptive Metric
// ─────────────────────────────────────────────────────────────────────
//! Stretches the baseline metric where the field is energetic:
//!
//!   f = 1 + α·tanh(β·ρ),   g' = S g S,   S = diag(√fₐ)
//!
//! with ρ the local energy density. On the 6-D manifold the temporal
//! block responds at half strength and the modal axis at a tenth. The
//! congruence keeps g' positive-definite and the clamp keeps every
//! factor in [min_factor, max_factor].
//!
//! The coupled flow instead moves the metric along the trace-free part
//! of the field's energy-momentum tensor:
//!
//!   ∂g_ij/∂t = κ·(T_ij − ⟨T⟩·g_ij/d),   T_ij = ⟨∂ᵢΦ*∂ⱼΦ + ∂ⱼΦ*∂ᵢΦ⟩

use std::f64::consts::TAU;

use geofield_core::{Field, Metric, MetricMode, Point};
use geofield_types::{AdaptiveMetricConfig, FieldError, FieldResult, MetricCouplingConfig};

use crate::metric_field::MetricField;
use crate::regularize::regularize_metric;

const TEMPORAL_RESPONSE: f64 = 0.5;
const MODAL_RESPONSE: f64 = 0.1;

/// Per-axis scale factors for energy density `rho`.
pub fn axis_factors(dim: usize, rho: f64, config: &AdaptiveMetricConfig) -> Vec<f64> {
    let saturation = (config.beta * rho.max(0.0)).tanh();
    let clamp = |f: f64| f.clamp(config.min_factor, config.max_factor);
    let spatial = clamp(1.0 + config.alpha * saturation);
    if dim != 6 {
        return vec![spatial; dim];
    }
    let temporal = clamp(1.0 + TEMPORAL_RESPONSE * config.alpha * saturation);
    let modal = clamp(1.0 + MODAL_RESPONSE * config.alpha * saturation);
    vec![spatial, spatial, spatial, temporal, temporal, modal]
}

pub fn adapt_metric(baseline: &Metric, rho: f64, config: &AdaptiveMetricConfig) -> FieldResult<Metric> {
    baseline.scaled_axes(&axis_factors(baseline.dimension(), rho, config))
}

/// Baseline adapted to |Φ(point)|².
pub fn adapt_metric_at(
    field: &Field,
    point: &Point,
    baseline: &Metric,
    config: &AdaptiveMetricConfig,
) -> FieldResult<Metric> {
    adapt_metric(baseline, field.evaluate(point).norm_sqr(), config)
}

/// Rewrite the field's metrics from the current state.
///
/// Global mode adapts to max|cᵢ|². Per-center mode adapts each center's
/// metric to |Φ(pᵢ)|², with every density taken before any metric
/// changes.
pub fn update_adaptive_metric(
    field: &mut Field,
    baseline: &Metric,
    config: &AdaptiveMetricConfig,
) -> FieldResult<()> {
    config.validate()?;
    match field.metric_mode() {
        MetricMode::Global => {
            let rho = field
                .centers()
                .iter()
                .map(|c| c.coeff().norm_sqr())
                .fold(0.0, f64::max);
            let adapted = adapt_metric(baseline, rho, config)?;
            log::trace!("adaptive metric: rho={rho:.4e} det={:.4e}", adapted.determinant());
            field.set_metric(adapted)
        }
        MetricMode::PerCenter => {
            let densities: Vec<f64> = field
                .centers()
                .iter()
                .map(|c| field.evaluate(c.point()).norm_sqr())
                .collect();
            for (i, rho) in densities.into_iter().enumerate() {
                field.set_center_metric(i, adapt_metric(baseline, rho, config)?)?;
            }
            Ok(())
        }
    }
}

/// Gradient stress averaged over `samples` points on a ring of offset
/// `radius` around the centroid of the centers. Row-major d×d and
/// symmetric; zero for an empty field.
pub fn energy_momentum_tensor(field: &Field, samples: usize, radius: f64) -> Vec<f64> {
    let dim = field.dimension();
    let mut stress = vec![0.0; dim * dim];
    if field.is_empty() || samples == 0 {
        return stress;
    }
    let weight = 1.0 / field.len() as f64;
    let mut centroid = vec![0.0; dim];
    for c in field.centers() {
        for (acc, x) in centroid.iter_mut().zip(c.point().coords()) {
            *acc += weight * x;
        }
    }

    for s in 0..samples {
        let phase = TAU * s as f64 / samples as f64;
        let coords = centroid
            .iter()
            .enumerate()
            .map(|(d, x)| x + radius * (phase + d as f64).sin())
            .collect();
        let Ok(point) = Point::new(coords) else {
            continue;
        };
        let grad = field.gradient(&point);
        for i in 0..dim {
            for j in i..dim {
                let v = 2.0 * (grad[i].conj() * grad[j]).re;
                stress[i * dim + j] += v;
                if i != j {
                    stress[j * dim + i] += v;
                }
            }
        }
    }
    let norm = 1.0 / samples as f64;
    for v in &mut stress {
        *v *= norm;
    }
    stress
}

/// One explicit step of the coupled flow for `metric` under `stress`.
///
/// The diagonal is floored at `min_diagonal`, the result is re-factored
/// and then regularized into `[min_det, max_det]`. Fails when the step
/// leaves the metric indefinite.
pub fn flow_metric(
    metric: &Metric,
    stress: &[f64],
    dt: f64,
    config: &MetricCouplingConfig,
) -> FieldResult<Metric> {
    metric.validate()?;
    let n = metric.dimension();
    if stress.len() != n * n {
        return Err(FieldError::Dimension(format!(
            "stress tensor has {} entries, metric of dimension {n} needs {}",
            stress.len(),
            n * n
        )));
    }
    let mut trace = 0.0;
    for k in 0..n {
        for l in 0..n {
            trace += metric.inv(k, l) * stress[k * n + l];
        }
    }
    let mean = trace / n as f64;

    let rate = dt * config.kappa;
    let mut g = metric.matrix().to_vec();
    for i in 0..n {
        for j in 0..n {
            g[i * n + j] += rate * (stress[i * n + j] - mean * metric.g(i, j));
        }
        let diag = &mut g[i * n + i];
        *diag = diag.max(config.min_diagonal);
    }
    let flowed = Metric::from_matrix(n, g)?;
    Ok(regularize_metric(&flowed, config.min_det, config.max_det)?.unwrap_or(flowed))
}

/// Evolve the field's metrics for time `dt` under the coupled flow,
/// split into `config.substeps` explicit sub-steps.
///
/// T is resampled before every sub-step. In per-center mode every
/// center's metric and the template follow the same T. On error the
/// metrics of the failing sub-step are left as they were.
pub fn evolve_metric_coupled(
    field: &mut Field,
    dt: f64,
    config: &MetricCouplingConfig,
) -> FieldResult<()> {
    config.validate()?;
    if !(dt > 0.0 && dt.is_finite()) {
        return Err(FieldError::Validation(format!(
            "metric flow time step must be positive and finite, got {dt}"
        )));
    }
    let h = dt / config.substeps as f64;
    for _ in 0..config.substeps {
        let stress = energy_momentum_tensor(field, config.samples, config.sample_radius);
        let global = flow_metric(field.metric(), &stress, h, config)?;
        match field.metric_mode() {
            MetricMode::Global => field.set_metric(global)?,
            MetricMode::PerCenter => {
                let flowed = (0..field.len())
                    .map(|i| flow_metric(field.center_metric(i), &stress, h, config))
                    .collect::<FieldResult<Vec<_>>>()?;
                field.set_metric(global)?;
                for (i, m) in flowed.into_iter().enumerate() {
                    field.set_center_metric(i, m)?;
                }
            }
        }
    }
    log::trace!(
        "coupled metric flow: dt={dt:.3e} in {} sub-steps, det={:.6e}",
        config.substeps,
        field.metric().determinant()
    );
    Ok(())
}

/// Position-dependent view of the adaptive metric, for geometry
/// operators that differentiate the metric.
pub struct AdaptiveMetric<'a> {
    field: &'a Field,
    baseline: &'a Metric,
    config: AdaptiveMetricConfig,
}

impl<'a> AdaptiveMetric<'a> {
    pub fn new(field: &'a Field, baseline: &'a Metric, config: AdaptiveMetricConfig) -> Self {
        Self {
            field,
            baseline,
            config,
        }
    }
}

impl MetricField for AdaptiveMetric<'_> {
    fn dimension(&self) -> usize {
        self.baseline.dimension()
    }

    fn metric_at(&self, point: &Point) -> Option<Metric> {
        adapt_metric_at(self.field, point, self.baseline, &self.config).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curvature::scalar_curvature;
    use approx::assert_relative_eq;
    use geofield_core::{Complex64, FieldConfig, RbfKind};

    #[test]
    fn test_zero_energy_is_identity_scaling() {
        let cfg = AdaptiveMetricConfig::default();
        assert_eq!(axis_factors(6, 0.0, &cfg), vec![1.0; 6]);
        let base = Metric::from_diagonal(&[2.0, 1.0, 1.0]).unwrap();
        assert_eq!(adapt_metric(&base, 0.0, &cfg).unwrap(), base);
    }

    #[test]
    fn test_six_d_block_responses() {
        let cfg = AdaptiveMetricConfig::default();
        let f = axis_factors(6, 1e6, &cfg);
        assert_relative_eq!(f[0], 1.3, epsilon = 1e-12);
        assert_relative_eq!(f[3], 1.15, epsilon = 1e-12);
        assert_relative_eq!(f[5], 1.03, epsilon = 1e-12);
    }

    #[test]
    fn test_factors_clamped() {
        let cfg = AdaptiveMetricConfig {
            alpha: -5.0,
            ..AdaptiveMetricConfig::default()
        };
        assert!(axis_factors(3, 10.0, &cfg).iter().all(|f| *f == cfg.min_factor));
        let cfg = AdaptiveMetricConfig {
            alpha: 50.0,
            ..AdaptiveMetricConfig::default()
        };
        assert!(axis_factors(3, 10.0, &cfg).iter().all(|f| *f == cfg.max_factor));
    }

    #[test]
    fn test_congruence_keeps_positive_definite() {
        let base = Metric::from_matrix(2, vec![1.0, 0.9, 0.9, 1.0]).unwrap();
        let cfg = AdaptiveMetricConfig::default();
        let adapted = adapt_metric(&base, 3.0, &cfg).unwrap();
        assert!(adapted.is_valid());
        let f = axis_factors(2, 3.0, &cfg)[0];
        assert_relative_eq!(adapted.determinant(), base.determinant() * f * f, epsilon = 1e-12);
    }

    #[test]
    fn test_global_update_uses_max_amplitude() {
        let mut field = Field::new(2, 4, 2.5).unwrap();
        field.add_center(Point::origin(2), Complex64::new(2.0, 0.0), 1.0).unwrap();
        field
            .add_center(Point::from_slice(&[1.0, 1.0]).unwrap(), Complex64::new(0.5, 0.0), 1.0)
            .unwrap();
        let base = Metric::identity(2);
        let cfg = AdaptiveMetricConfig::default();
        update_adaptive_metric(&mut field, &base, &cfg).unwrap();
        let expected = 1.0 + 0.3 * (2.0f64 * 4.0).tanh();
        assert_relative_eq!(field.metric().g(0, 0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_per_center_update_uses_pre_update_state() {
        let mut field = Field::from_config(FieldConfig {
            dimension: 2,
            capacity: 4,
            fractal_dimension: 2.5,
            rbf_kind: RbfKind::Gaussian,
            metric_mode: MetricMode::PerCenter,
        })
        .unwrap();
        field.add_center(Point::origin(2), Complex64::new(1.0, 0.0), 2.0).unwrap();
        field
            .add_center(Point::from_slice(&[0.3, 0.0]).unwrap(), Complex64::new(1.0, 0.0), 2.0)
            .unwrap();
        let before: Vec<f64> = field
            .centers()
            .iter()
            .map(|c| field.evaluate(c.point()).norm_sqr())
            .collect();
        let base = Metric::identity(2);
        let cfg = AdaptiveMetricConfig::default();
        update_adaptive_metric(&mut field, &base, &cfg).unwrap();
        for (i, rho) in before.iter().enumerate() {
            let expected = axis_factors(2, *rho, &cfg)[0];
            assert_relative_eq!(field.center_metric(i).g(0, 0), expected, epsilon = 1e-12);
        }
    }

    fn energetic_field(mode: MetricMode) -> Field {
        let mut field = Field::from_config(FieldConfig {
            dimension: 2,
            capacity: 4,
            fractal_dimension: 2.5,
            rbf_kind: RbfKind::Gaussian,
            metric_mode: mode,
        })
        .unwrap();
        field.add_center(Point::origin(2), Complex64::new(1.0, 0.5), 1.0).unwrap();
        field
            .add_center(Point::from_slice(&[0.2, 0.1]).unwrap(), Complex64::new(0.0, 1.0), 1.5)
            .unwrap();
        field
    }

    fn strong_coupling() -> MetricCouplingConfig {
        MetricCouplingConfig {
            kappa: 1.0,
            sample_radius: 0.3,
            ..MetricCouplingConfig::default()
        }
    }

    #[test]
    fn test_stress_tensor_symmetric_and_empty_is_zero() {
        let field = energetic_field(MetricMode::Global);
        let t = energy_momentum_tensor(&field, 10, 0.3);
        assert_eq!(t[1], t[2]);
        assert!(t[0] > 0.0 && t[3] > 0.0);
        let empty = Field::new(3, 2, 2.5).unwrap();
        assert!(energy_momentum_tensor(&empty, 10, 0.3).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_zero_stress_keeps_metric() {
        let base = Metric::from_matrix(2, vec![1.5, 0.2, 0.2, 0.9]).unwrap();
        let flowed = flow_metric(&base, &[0.0; 4], 0.1, &strong_coupling()).unwrap();
        assert_eq!(flowed, base);
        assert_ne!(flowed.revision(), base.revision());
    }

    #[test]
    fn test_coupled_flow_keeps_metric_positive_definite() {
        let mut field = energetic_field(MetricMode::Global);
        let before = field.metric().clone();
        evolve_metric_coupled(&mut field, 0.01, &strong_coupling()).unwrap();
        let after = field.metric();
        assert!(after.is_valid());
        assert!(after.eigen().min() > 0.0);
        assert_ne!(after.revision(), before.revision());
        assert!(after.g(0, 1).abs() > 0.0, "anisotropic stress shears the metric");
        // Trace-free flow: det moves only at second order in the step.
        let step = (0..2)
            .flat_map(|i| (0..2).map(move |j| (i, j)))
            .map(|(i, j)| (after.g(i, j) - before.g(i, j)).abs())
            .fold(0.0, f64::max);
        assert!(step > 0.0);
        assert!((after.determinant() - 1.0).abs() < 0.1 * step);
    }

    #[test]
    fn test_diagonal_floor_and_regularization() {
        let base = Metric::from_diagonal(&[0.11, 1.0]).unwrap();
        // Strong compressive stress on the first axis.
        let stress = [-100.0, 0.0, 0.0, 0.0];
        let cfg = MetricCouplingConfig {
            min_det: 10.0,
            ..strong_coupling()
        };
        let flowed = flow_metric(&base, &stress, 0.1, &cfg).unwrap();
        assert!(flowed.g(0, 0) >= cfg.min_diagonal);
        assert!(flowed.determinant() >= cfg.min_det * (1.0 - crate::regularize::DET_TOLERANCE));
    }

    #[test]
    fn test_substeps_match_repeated_half_steps() {
        let mut a = energetic_field(MetricMode::Global);
        let mut b = a.clone();
        let split = MetricCouplingConfig {
            substeps: 2,
            ..strong_coupling()
        };
        evolve_metric_coupled(&mut a, 0.02, &split).unwrap();
        evolve_metric_coupled(&mut b, 0.01, &strong_coupling()).unwrap();
        evolve_metric_coupled(&mut b, 0.01, &strong_coupling()).unwrap();
        assert_eq!(a.metric(), b.metric());
    }

    #[test]
    fn test_per_center_flow_updates_every_center() {
        let mut field = energetic_field(MetricMode::PerCenter);
        let revisions: Vec<u64> = (0..2).map(|i| field.center_metric(i).revision()).collect();
        evolve_metric_coupled(&mut field, 0.01, &strong_coupling()).unwrap();
        for (i, rev) in revisions.into_iter().enumerate() {
            let m = field.center_metric(i);
            assert!(m.is_valid());
            assert_ne!(m.revision(), rev);
        }
    }

    #[test]
    fn test_bad_flow_step_rejected() {
        let mut field = energetic_field(MetricMode::Global);
        let before = field.metric().clone();
        assert!(evolve_metric_coupled(&mut field, 0.0, &strong_coupling()).is_err());
        assert!(evolve_metric_coupled(&mut field, f64::NAN, &strong_coupling()).is_err());
        assert_eq!(field.metric().revision(), before.revision());
    }

    #[test]
    fn test_adaptive_view_is_curved_near_energy() {
        let mut field = Field::new(2, 4, 2.5).unwrap();
        field.add_center(Point::origin(2), Complex64::new(0.6, 0.0), 1.0).unwrap();
        let base = Metric::identity(2);
        let view = AdaptiveMetric::new(&field, &base, AdaptiveMetricConfig::default());
        assert!(view.constant_revision().is_none());
        let r = scalar_curvature(&view, &Point::from_slice(&[0.4, 0.2]).unwrap());
        assert!(r.is_finite());
        assert!(r.abs() > 1e-6, "R = {r}");
    }
}
