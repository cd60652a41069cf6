// ─────────────────────────────────────────────────────────────────────
// GeoField — Adaptive Limiter
// ─────────────────────────────────────────────────────────────────────
//! Post-step corrective pass. Order within a pass:
//!
//!   epsilon → metric → amplitude → energy → gradient
//!
//! Every limiter preserves phase and relative structure: amplitudes are
//! clipped radially, energy is rescaled by one global factor.

use geofield_core::{Complex64, Field, MetricMode};
use geofield_geometry::regularize_metric;
use geofield_types::{FieldResult, LimiterConfig, LimiterCounters, LimiterReport};

/// Relative slack before the energy limiter fires; makes it idempotent.
pub const ENERGY_TOLERANCE: f64 = 1e-9;

pub struct AdaptiveLimiter {
    /// Bounds as configured; auto-adjust never loosens past these.
    base: LimiterConfig,
    /// Bounds in force for the current pass.
    active: LimiterConfig,
    counters: LimiterCounters,
}

impl Default for AdaptiveLimiter {
    fn default() -> Self {
        let config = LimiterConfig::default();
        Self {
            base: config.clone(),
            active: config,
            counters: LimiterCounters::default(),
        }
    }
}

impl AdaptiveLimiter {
    pub fn new(config: LimiterConfig) -> FieldResult<Self> {
        config.validate()?;
        Ok(Self {
            base: config.clone(),
            active: config,
            counters: LimiterCounters::default(),
        })
    }

    pub fn base_config(&self) -> &LimiterConfig {
        &self.base
    }

    pub fn active_config(&self) -> &LimiterConfig {
        &self.active
    }

    pub fn counters(&self) -> LimiterCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = LimiterCounters::default();
    }

    /// Run every limiter in order, retuning bounds first when auto-adjust
    /// is enabled.
    pub fn apply_all(&mut self, field: &mut Field) -> FieldResult<LimiterReport> {
        if self.base.auto_adjust {
            self.auto_adjust(field);
        }
        let epsilon_clipped = self.limit_epsilon(field)?;
        let metrics_clipped = self.limit_metric(field)?;
        let amplitudes_clipped = self.limit_amplitude(field)?;
        let energy_scale = self.limit_energy(field);
        let gradients_clipped = self.limit_gradient(field)?;
        let report = LimiterReport {
            epsilon_clipped,
            metrics_clipped,
            amplitudes_clipped,
            energy_clipped: energy_scale < 1.0,
            energy_scale,
            gradients_clipped,
        };
        if report.fired() {
            log::debug!(
                "limiter pass: eps={} metric={} amp={} energy_scale={:.4} grad={}",
                report.epsilon_clipped,
                report.metrics_clipped,
                report.amplitudes_clipped,
                report.energy_scale,
                report.gradients_clipped
            );
        }
        Ok(report)
    }

    /// Retune active bounds from the field's current scale, capped by the
    /// base bounds. Metric and gradient bounds stay at their base values.
    pub fn auto_adjust(&mut self, field: &Field) {
        let stats = field.stats();
        let safety = self.base.safety_factor;
        let mut active = self.base.clone();
        if stats.energy > 0.0 {
            active.max_energy = self.base.max_energy.min(2.0 * stats.energy / safety);
        }
        if stats.max_amplitude > 0.0 {
            active.max_center_amplitude = self
                .base
                .max_center_amplitude
                .min(2.0 * stats.max_amplitude / safety);
        }
        if stats.num_centers > 0 {
            active.min_epsilon = self.base.min_epsilon.max(0.5 * stats.min_epsilon);
            active.max_epsilon = self.base.max_epsilon.min(2.0 * stats.max_epsilon);
            if active.max_epsilon < active.min_epsilon {
                active.min_epsilon = self.base.min_epsilon;
                active.max_epsilon = self.base.max_epsilon;
            }
        }
        log::trace!(
            "auto-adjust: max_energy={:.3e} max_amp={:.3e} eps=[{:.3e}, {:.3e}]",
            active.max_energy,
            active.max_center_amplitude,
            active.min_epsilon,
            active.max_epsilon
        );
        self.active = active;
    }

    /// Clamp shape parameters into `[min_epsilon, max_epsilon]`.
    pub fn limit_epsilon(&mut self, field: &mut Field) -> FieldResult<usize> {
        let (lo, hi) = (self.active.min_epsilon, self.active.max_epsilon);
        let clipped: Vec<(usize, f64)> = field
            .centers()
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                let eps = c.epsilon();
                let fixed = if eps.is_nan() { lo } else { eps.clamp(lo, hi) };
                (fixed != eps).then_some((i, fixed))
            })
            .collect();
        for &(i, eps) in &clipped {
            field.set_epsilon(i, eps)?;
        }
        self.counters.epsilon_clips += clipped.len() as u64;
        Ok(clipped.len())
    }

    /// Regularize the global metric and, in per-center mode, every
    /// center's own metric.
    pub fn limit_metric(&mut self, field: &mut Field) -> FieldResult<usize> {
        let (lo, hi) = (self.active.min_metric_det, self.active.max_metric_det);
        let mut fixed = 0;
        if let Some(m) = regularize_metric(field.metric(), lo, hi)? {
            field.set_metric(m)?;
            fixed += 1;
        }
        if field.metric_mode() == MetricMode::PerCenter {
            for i in 0..field.len() {
                if let Some(m) = regularize_metric(field.center_metric(i), lo, hi)? {
                    field.set_center_metric(i, m)?;
                    fixed += 1;
                }
            }
        }
        self.counters.metric_clips += fixed as u64;
        Ok(fixed)
    }

    /// Clip |cᵢ| to `max_center_amplitude`, preserving phase.
    pub fn limit_amplitude(&mut self, field: &mut Field) -> FieldResult<usize> {
        let max = self.active.max_center_amplitude;
        let clipped: Vec<(usize, Complex64)> = field
            .centers()
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                let a = c.coeff().norm();
                (a > max).then(|| (i, c.coeff() * (max / a)))
            })
            .collect();
        for &(i, c) in &clipped {
            field.set_coefficient(i, c)?;
        }
        self.counters.amplitude_clips += clipped.len() as u64;
        Ok(clipped.len())
    }

    /// Rescale every coefficient by √(max/E) when E exceeds the bound.
    /// Returns the applied scale, 1.0 when the limiter did not fire.
    pub fn limit_energy(&mut self, field: &mut Field) -> f64 {
        let max = self.active.max_energy;
        let energy = field.compute_energy();
        if !(energy > max * (1.0 + ENERGY_TOLERANCE)) {
            return 1.0;
        }
        let scale = (max / energy).sqrt();
        field.scale_coefficients(scale);
        self.counters.energy_clips += 1;
        log::warn!("energy {energy:.4e} exceeds {max:.4e}: coefficients scaled by {scale:.4e}");
        scale
    }

    /// Scale cᵢ by max/|∇Φ(pᵢ)| wherever the gradient at a center exceeds
    /// the bound. Gradients are sampled before any coefficient changes.
    pub fn limit_gradient(&mut self, field: &mut Field) -> FieldResult<usize> {
        let max = self.active.max_gradient;
        let clipped: Vec<(usize, Complex64)> = field
            .centers()
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                let g = gradient_norm(&field.gradient(c.point()));
                (g > max).then(|| (i, c.coeff() * (max / g)))
            })
            .collect();
        for &(i, c) in &clipped {
            field.set_coefficient(i, c)?;
        }
        self.counters.gradient_clips += clipped.len() as u64;
        Ok(clipped.len())
    }
}

pub(crate) fn gradient_norm(grad: &[Complex64]) -> f64 {
    grad.iter().map(|g| g.norm_sqr()).sum::<f64>().sqrt()
}
