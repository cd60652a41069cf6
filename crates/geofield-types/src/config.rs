// ─────────────────────────────────────────────────────────────────────
// GeoField — Engine Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FieldResult};

/// Saturating energy-to-metric coupling: `g = g⁰ · [1 + α·tanh(β|Φ|²)]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveMetricConfig {
    /// Coupling strength α. Default: 0.3.
    pub alpha: f64,
    /// Energy sensitivity β. Default: 2.0.
    pub beta: f64,
    /// Lower clamp on any axis scale factor. Default: 0.1.
    pub min_factor: f64,
    /// Upper clamp on any axis scale factor. Default: 3.0.
    pub max_factor: f64,
}

impl Default for AdaptiveMetricConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 2.0,
            min_factor: 0.1,
            max_factor: 3.0,
        }
    }
}

impl AdaptiveMetricConfig {
    pub fn validate(&self) -> FieldResult<()> {
        if !self.alpha.is_finite() || !self.beta.is_finite() || self.beta < 0.0 {
            return Err(FieldError::Config(format!(
                "adaptive metric needs finite alpha and beta >= 0, got alpha={} beta={}",
                self.alpha, self.beta
            )));
        }
        if !(self.min_factor > 0.0 && self.min_factor <= 1.0 && self.max_factor >= 1.0) {
            return Err(FieldError::Config(format!(
                "adaptive metric factor range must satisfy 0 < min <= 1 <= max, got [{}, {}]",
                self.min_factor, self.max_factor
            )));
        }
        Ok(())
    }
}

/// Metric flow driven by the field's energy-momentum tensor:
///
///   ∂g_ij/∂t = κ·(T_ij − ⟨T⟩·g_ij/d),   ⟨T⟩ = gᵏˡ T_kl
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricCouplingConfig {
    /// Coupling strength κ. Default: 0.01.
    pub kappa: f64,
    /// Sub-steps the flow is split into per field step. Default: 1.
    pub substeps: usize,
    /// Gradient samples averaged into T. Default: 10.
    pub samples: usize,
    /// Offset of the sample ring around the centers' centroid. Default: 0.1.
    pub sample_radius: f64,
    /// Floor on every diagonal entry after the flow. Default: 0.1.
    pub min_diagonal: f64,
    /// Determinant range the flowed metric is regularized into.
    /// Default: [1e-6, 1e6].
    pub min_det: f64,
    pub max_det: f64,
}

impl Default for MetricCouplingConfig {
    fn default() -> Self {
        Self {
            kappa: 0.01,
            substeps: 1,
            samples: 10,
            sample_radius: 0.1,
            min_diagonal: 0.1,
            min_det: 1e-6,
            max_det: 1e6,
        }
    }
}

impl MetricCouplingConfig {
    pub fn validate(&self) -> FieldResult<()> {
        if !self.kappa.is_finite() {
            return Err(FieldError::Config(format!(
                "metric coupling kappa must be finite, got {}",
                self.kappa
            )));
        }
        if self.substeps == 0 || self.samples == 0 {
            return Err(FieldError::Config(
                "metric coupling needs at least one sub-step and one sample".to_string(),
            ));
        }
        if !(self.sample_radius >= 0.0 && self.sample_radius.is_finite()) {
            return Err(FieldError::Config(format!(
                "metric coupling sample radius must be finite and >= 0, got {}",
                self.sample_radius
            )));
        }
        if !(self.min_diagonal > 0.0 && self.min_det > 0.0 && self.max_det >= self.min_det) {
            return Err(FieldError::Config(format!(
                "metric coupling bounds invalid: min_diagonal={} det range [{}, {}]",
                self.min_diagonal, self.min_det, self.max_det
            )));
        }
        Ok(())
    }
}

/// How the non-local coupling integral is approximated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CouplingMode {
    /// Kernel-weighted mean of Φ over centers inside the coupling radius.
    #[default]
    NeighborSum,
    /// Hit-or-miss Monte-Carlo integration over the coupling ball.
    MonteCarlo,
}

/// Coupling estimator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CouplingConfig {
    pub mode: CouplingMode,
    /// Accepted Monte-Carlo samples per center. Default: 100.
    pub samples: usize,
    /// Kernel cutoff used to derive the coupling radius. Default: 0.01.
    pub threshold: f64,
    /// Base seed for Monte-Carlo sampling.
    pub seed: u64,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            mode: CouplingMode::NeighborSum,
            samples: 100,
            threshold: 0.01,
            seed: 0x5EED_0F_F1E1D,
        }
    }
}

impl CouplingConfig {
    pub fn validate(&self) -> FieldResult<()> {
        if self.samples == 0 {
            return Err(FieldError::Config("coupling samples must be > 0".to_string()));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(FieldError::Config(format!(
                "coupling threshold must be in (0, 1), got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Which Laplace–Beltrami implementation the diffusion term uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiffusionOperator {
    /// Closed-form radial Laplacian evaluated at the geodesic radius.
    #[default]
    Optimized,
    /// Finite-difference Hessian with Christoffel correction.
    General,
}

/// Settings for the evolution stepper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub coupling: CouplingConfig,
    /// Metric adaptation applied before each step; `None` keeps the metric fixed.
    pub adaptive_metric: Option<AdaptiveMetricConfig>,
    /// Energy-momentum metric flow applied after each step; `None` disables it.
    pub metric_coupling: Option<MetricCouplingConfig>,
    /// Rebuild the KD-tree every N steps. Default: 1.
    ///
    /// Values above 1 are only sound when centers do not move; layout
    /// changes always force a rebuild regardless of this cadence.
    pub rebuild_every: u64,
    /// Fields with at least this many centers evaluate through the KD-tree.
    pub index_threshold: usize,
    /// Kernel magnitude below which a center is treated as out of support.
    pub support_tolerance: f64,
    pub diffusion_operator: DiffusionOperator,
    /// Evaluate per-center terms on the rayon pool.
    pub parallel: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            coupling: CouplingConfig::default(),
            adaptive_metric: None,
            metric_coupling: None,
            rebuild_every: 1,
            index_threshold: 64,
            support_tolerance: 1e-12,
            diffusion_operator: DiffusionOperator::Optimized,
            parallel: true,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> FieldResult<()> {
        self.coupling.validate()?;
        if let Some(adaptive) = &self.adaptive_metric {
            adaptive.validate()?;
        }
        if let Some(coupling) = &self.metric_coupling {
            coupling.validate()?;
        }
        if self.rebuild_every == 0 {
            return Err(FieldError::Config("rebuild_every must be >= 1".to_string()));
        }
        if !(self.support_tolerance > 0.0 && self.support_tolerance < 1.0) {
            return Err(FieldError::Config(format!(
                "support_tolerance must be in (0, 1), got {}",
                self.support_tolerance
            )));
        }
        Ok(())
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> FieldResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| FieldError::Config(format!("JSON parse error: {e}")))
    }
}

/// Bounds enforced by the limiter pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Total energy ceiling Σ|cᵢ|². Default: 1e4.
    pub max_energy: f64,
    /// Per-center coefficient magnitude ceiling. Default: 100.
    pub max_center_amplitude: f64,
    /// Default: 0.01.
    pub min_epsilon: f64,
    /// Default: 10.
    pub max_epsilon: f64,
    /// Default: 1e-6.
    pub min_metric_det: f64,
    /// Default: 1e6.
    pub max_metric_det: f64,
    /// Default: 1e3.
    pub max_gradient: f64,
    /// Default: 1e4.
    pub max_laplacian: f64,
    /// Largest allowed Riemann component. Default: 1e3.
    pub max_riemann: f64,
    /// Default: 1e4.
    pub max_scalar_curvature: f64,
    /// Retune bounds from field statistics before every pass.
    pub auto_adjust: bool,
    /// Headroom divisor for auto-adjusted bounds. Default: 0.8.
    pub safety_factor: f64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_energy: 1e4,
            max_center_amplitude: 100.0,
            min_epsilon: 0.01,
            max_epsilon: 10.0,
            min_metric_det: 1e-6,
            max_metric_det: 1e6,
            max_gradient: 1e3,
            max_laplacian: 1e4,
            max_riemann: 1e3,
            max_scalar_curvature: 1e4,
            auto_adjust: true,
            safety_factor: 0.8,
        }
    }
}

impl LimiterConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> FieldResult<()> {
        let positive = [
            ("max_energy", self.max_energy),
            ("max_center_amplitude", self.max_center_amplitude),
            ("min_epsilon", self.min_epsilon),
            ("min_metric_det", self.min_metric_det),
            ("max_gradient", self.max_gradient),
            ("max_laplacian", self.max_laplacian),
            ("max_riemann", self.max_riemann),
            ("max_scalar_curvature", self.max_scalar_curvature),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(FieldError::Config(format!("{name} must be > 0, got {value}")));
            }
        }
        if self.max_epsilon < self.min_epsilon {
            return Err(FieldError::Config(format!(
                "epsilon range is empty: [{}, {}]",
                self.min_epsilon, self.max_epsilon
            )));
        }
        if self.max_metric_det < self.min_metric_det {
            return Err(FieldError::Config(format!(
                "metric determinant range is empty: [{}, {}]",
                self.min_metric_det, self.max_metric_det
            )));
        }
        if !(self.safety_factor > 0.0 && self.safety_factor <= 1.0) {
            return Err(FieldError::Config(format!(
                "safety_factor must be in (0, 1], got {}",
                self.safety_factor
            )));
        }
        Ok(())
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> FieldResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| FieldError::Config(format!("JSON parse error: {e}")))
    }
}
