// ─────────────────────────────────────────────────────────────────────
// GeoField — Complex RBF Field
// ─────────────────────────────────────────────────────────────────────
//! The manifold state: a set of weighted RBF centers
//!
//!   Φ(x) = Σᵢ cᵢ · φ(d_gᵢ(x, pᵢ), εᵢ)
//!
//! where gᵢ is the global metric or, in per-center mode, the center's
//! own metric. The cached energy Σ|cᵢ|² is invalidated by every
//! coefficient mutation.

use num_complex::Complex64;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use geofield_types::{FieldError, FieldResult, FieldStats};

use crate::geodesic::geodesic_distance_optimized;
use crate::kdtree::KdTree;
use crate::metric::Metric;
use crate::point::Point;
use crate::rbf::RbfKind;

/// Length scale of the pairwise interaction in the Hamiltonian energy.
const INTERACTION_SIGMA: f64 = 0.3;

/// Which metric geometry queries use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MetricMode {
    /// One metric shared by every center.
    #[default]
    Global,
    /// Each center carries its own (adapted) metric.
    PerCenter,
}

/// Field construction settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Manifold dimension (≥ 2). Default: 6.
    pub dimension: usize,
    /// Maximum number of centers. Default: 1024.
    pub capacity: usize,
    /// Diagnostic target only. Default: 2.5.
    pub fractal_dimension: f64,
    pub rbf_kind: RbfKind,
    pub metric_mode: MetricMode,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            dimension: 6,
            capacity: 1024,
            fractal_dimension: 2.5,
            rbf_kind: RbfKind::Gaussian,
            metric_mode: MetricMode::Global,
        }
    }
}

impl FieldConfig {
    pub fn validate(&self) -> FieldResult<()> {
        if self.dimension < 2 {
            return Err(FieldError::Dimension(format!(
                "field dimension must be >= 2, got {}",
                self.dimension
            )));
        }
        if self.capacity == 0 {
            return Err(FieldError::Config("capacity must be > 0".to_string()));
        }
        if !self.fractal_dimension.is_finite() {
            return Err(FieldError::Config(format!(
                "fractal_dimension must be finite, got {}",
                self.fractal_dimension
            )));
        }
        Ok(())
    }
}

/// One RBF basis term.
#[derive(Debug, Clone)]
pub struct Center {
    point: Point,
    coeff: Complex64,
    epsilon: f64,
    metric: Option<Metric>,
}

impl Center {
    pub fn point(&self) -> &Point {
        &self.point
    }

    pub fn coeff(&self) -> Complex64 {
        self.coeff
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Local metric, present only in per-center mode.
    pub fn metric(&self) -> Option<&Metric> {
        self.metric.as_ref()
    }
}

#[derive(Debug)]
pub struct Field {
    config: FieldConfig,
    centers: Vec<Center>,
    metric: Metric,
    time: f64,
    temporal_dimension: f64,
    layout_revision: u64,
    energy_cache: Mutex<Option<f64>>,
}

impl Clone for Field {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            centers: self.centers.clone(),
            metric: self.metric.clone(),
            time: self.time,
            temporal_dimension: self.temporal_dimension,
            layout_revision: self.layout_revision,
            energy_cache: Mutex::new(*self.energy_cache.lock()),
        }
    }
}

impl Field {
    /// Global-metric Gaussian field.
    pub fn new(dimension: usize, capacity: usize, fractal_dimension: f64) -> FieldResult<Self> {
        Self::from_config(FieldConfig {
            dimension,
            capacity,
            fractal_dimension,
            ..FieldConfig::default()
        })
    }

    pub fn from_config(config: FieldConfig) -> FieldResult<Self> {
        config.validate()?;
        Ok(Self {
            metric: Metric::identity(config.dimension),
            centers: Vec::with_capacity(config.capacity),
            config,
            time: 0.0,
            temporal_dimension: 1.5,
            layout_revision: 0,
            energy_cache: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn rbf_kind(&self) -> RbfKind {
        self.config.rbf_kind
    }

    pub fn metric_mode(&self) -> MetricMode {
        self.config.metric_mode
    }

    pub fn fractal_dimension(&self) -> f64 {
        self.config.fractal_dimension
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn advance_time(&mut self, dt: f64) {
        self.time += dt;
    }

    pub fn temporal_dimension(&self) -> f64 {
        self.temporal_dimension
    }

    pub fn set_temporal_dimension(&mut self, tau: f64) {
        self.temporal_dimension = tau;
    }

    /// Bumped on every add/remove; KD-trees compare against it.
    pub fn layout_revision(&self) -> u64 {
        self.layout_revision
    }

    pub fn centers(&self) -> &[Center] {
        &self.centers
    }

    pub fn center(&self, index: usize) -> FieldResult<&Center> {
        self.centers.get(index).ok_or(FieldError::Index {
            index,
            len: self.centers.len(),
        })
    }

    /// Append a center and return its index.
    pub fn add_center(&mut self, point: Point, coeff: Complex64, epsilon: f64) -> FieldResult<usize> {
        if self.centers.len() >= self.config.capacity {
            return Err(FieldError::Capacity {
                capacity: self.config.capacity,
            });
        }
        if point.dimension() != self.dimension() {
            return Err(FieldError::Dimension(format!(
                "center has dimension {}, field has {}",
                point.dimension(),
                self.dimension()
            )));
        }
        if !(epsilon > 0.0) || !epsilon.is_finite() {
            return Err(FieldError::Validation(format!(
                "shape parameter must be positive and finite, got {epsilon}"
            )));
        }
        if !coeff.re.is_finite() || !coeff.im.is_finite() {
            return Err(FieldError::Validation(format!(
                "coefficient must be finite, got {coeff}"
            )));
        }
        let metric = match self.config.metric_mode {
            MetricMode::Global => None,
            MetricMode::PerCenter => Some(self.metric.clone()),
        };
        self.centers.push(Center {
            point,
            coeff,
            epsilon,
            metric,
        });
        self.layout_revision += 1;
        self.invalidate_energy();
        Ok(self.centers.len() - 1)
    }

    /// Swap-remove: the last center takes `index`'s slot.
    pub fn remove_center(&mut self, index: usize) -> FieldResult<Center> {
        if index >= self.centers.len() {
            return Err(FieldError::Index {
                index,
                len: self.centers.len(),
            });
        }
        let removed = self.centers.swap_remove(index);
        self.layout_revision += 1;
        self.invalidate_energy();
        Ok(removed)
    }

    pub fn coefficients(&self) -> Vec<Complex64> {
        self.centers.iter().map(|c| c.coeff).collect()
    }

    pub fn set_coefficient(&mut self, index: usize, coeff: Complex64) -> FieldResult<()> {
        let len = self.centers.len();
        let center = self
            .centers
            .get_mut(index)
            .ok_or(FieldError::Index { index, len })?;
        center.coeff = coeff;
        self.invalidate_energy();
        Ok(())
    }

    /// Replace every coefficient at once.
    pub fn apply_coefficients(&mut self, coeffs: &[Complex64]) -> FieldResult<()> {
        if coeffs.len() != self.centers.len() {
            return Err(FieldError::Validation(format!(
                "expected {} coefficients, got {}",
                self.centers.len(),
                coeffs.len()
            )));
        }
        for (center, &c) in self.centers.iter_mut().zip(coeffs) {
            center.coeff = c;
        }
        self.invalidate_energy();
        Ok(())
    }

    /// Multiply every coefficient by a real factor (phases preserved).
    pub fn scale_coefficients(&mut self, factor: f64) {
        for center in self.centers.iter_mut() {
            center.coeff *= factor;
        }
        self.invalidate_energy();
    }

    pub fn set_epsilon(&mut self, index: usize, epsilon: f64) -> FieldResult<()> {
        if !(epsilon > 0.0) || !epsilon.is_finite() {
            return Err(FieldError::Validation(format!(
                "shape parameter must be positive and finite, got {epsilon}"
            )));
        }
        let len = self.centers.len();
        let center = self
            .centers
            .get_mut(index)
            .ok_or(FieldError::Index { index, len })?;
        center.epsilon = epsilon;
        Ok(())
    }

    /// Global metric; in per-center mode, the template for new centers.
    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    pub fn set_metric(&mut self, metric: Metric) -> FieldResult<()> {
        self.check_metric(&metric)?;
        self.metric = metric;
        Ok(())
    }

    pub fn set_center_metric(&mut self, index: usize, metric: Metric) -> FieldResult<()> {
        if self.config.metric_mode != MetricMode::PerCenter {
            return Err(FieldError::Config(
                "per-center metrics require MetricMode::PerCenter".to_string(),
            ));
        }
        self.check_metric(&metric)?;
        let len = self.centers.len();
        let center = self
            .centers
            .get_mut(index)
            .ok_or(FieldError::Index { index, len })?;
        center.metric = Some(metric);
        Ok(())
    }

    /// Metric governing center `index` under the field's mode. Falls back
    /// to the global metric for an index with no center.
    #[inline]
    pub fn center_metric(&self, index: usize) -> &Metric {
        match self.centers.get(index).and_then(|c| c.metric.as_ref()) {
            Some(m) if self.config.metric_mode == MetricMode::PerCenter => m,
            _ => &self.metric,
        }
    }

    fn check_metric(&self, metric: &Metric) -> FieldResult<()> {
        if metric.dimension() != self.dimension() {
            return Err(FieldError::Dimension(format!(
                "metric has dimension {}, field has {}",
                metric.dimension(),
                self.dimension()
            )));
        }
        metric.validate()
    }

    // ── Evaluation ───────────────────────────────────────────────────

    /// Kernel value of center `index` at `point`; zero for an index with
    /// no center.
    #[inline]
    pub fn basis(&self, index: usize, point: &Point) -> f64 {
        let Some(c) = self.centers.get(index) else {
            return 0.0;
        };
        let r = geodesic_distance_optimized(point, &c.point, self.center_metric(index));
        self.config.rbf_kind.evaluate(r, c.epsilon)
    }

    /// Φ(point) summed over every center. Zero on dimension mismatch.
    pub fn evaluate(&self, point: &Point) -> Complex64 {
        self.evaluate_over(point, 0..self.centers.len())
    }

    /// Φ(point) restricted to the given centers. Indices past the end,
    /// e.g. from a stale neighborhood, are skipped.
    pub fn evaluate_over<I>(&self, point: &Point, indices: I) -> Complex64
    where
        I: IntoIterator<Item = usize>,
    {
        if point.dimension() != self.dimension() {
            return Complex64::new(0.0, 0.0);
        }
        indices
            .into_iter()
            .filter_map(|i| self.centers.get(i).map(|c| c.coeff * self.basis(i, point)))
            .sum()
    }

    /// Φ(point) over centers within Euclidean `radius` of `point`.
    pub fn evaluate_indexed(&self, point: &Point, tree: &KdTree, radius: f64) -> Complex64 {
        let near = tree.radius_query(point, radius);
        self.evaluate_over(point, near.iter().map(|n| n.index))
    }

    /// Analytic gradient ∂Φ/∂xₖ = Σᵢ cᵢ·(φ'/r)·(gᵢΔ)ₖ.
    pub fn gradient(&self, point: &Point) -> Vec<Complex64> {
        self.gradient_over(point, 0..self.centers.len())
    }

    pub fn gradient_over<I>(&self, point: &Point, indices: I) -> Vec<Complex64>
    where
        I: IntoIterator<Item = usize>,
    {
        let dim = self.dimension();
        let mut grad = vec![Complex64::new(0.0, 0.0); dim];
        if point.dimension() != dim {
            return grad;
        }
        for i in indices {
            let Some(c) = self.centers.get(i) else {
                continue;
            };
            let metric = self.center_metric(i);
            let delta = c.point.delta_to(point);
            let r = metric.quadratic_form(&delta).max(0.0).sqrt();
            let w = self.config.rbf_kind.derivative_over_r(r, c.epsilon);
            let lowered = metric.lower(&delta);
            for k in 0..dim {
                grad[k] += c.coeff * (w * lowered[k]);
            }
        }
        grad
    }

    pub fn gradient_indexed(&self, point: &Point, tree: &KdTree, radius: f64) -> Vec<Complex64> {
        let near = tree.radius_query(point, radius);
        self.gradient_over(point, near.iter().map(|n| n.index))
    }

    /// Euclidean radius outside which every center contributes less than
    /// `tol`; `None` for non-decaying kernels or an empty field.
    pub fn support_radius(&self, tol: f64) -> Option<f64> {
        if self.centers.is_empty() {
            return None;
        }
        let min_eps = self
            .centers
            .iter()
            .map(|c| c.epsilon)
            .fold(f64::INFINITY, f64::min);
        let geodesic = self.config.rbf_kind.support_radius(min_eps, tol)?;
        // d_g ≥ √λ_min · d_E, so a geodesic ball fits in a Euclidean ball of r/√λ_min.
        let lambda_min = match self.config.metric_mode {
            MetricMode::Global => self.metric.eigen().min(),
            MetricMode::PerCenter => (0..self.centers.len())
                .map(|i| self.center_metric(i).eigen().min())
                .fold(f64::INFINITY, f64::min),
        };
        if !(lambda_min > 0.0) {
            return None;
        }
        Some(geodesic / lambda_min.sqrt())
    }

    // ── Energy and statistics ────────────────────────────────────────

    /// Σ|cᵢ|², cached until the next coefficient change.
    pub fn compute_energy(&self) -> f64 {
        let mut cache = self.energy_cache.lock();
        if let Some(e) = *cache {
            return e;
        }
        let e = self.centers.iter().map(|c| c.coeff.norm_sqr()).sum();
        *cache = Some(e);
        e
    }

    fn invalidate_energy(&self) {
        *self.energy_cache.lock() = None;
    }

    /// Kinetic ½|c|²/ε² + potential ½|c|² + pairwise interaction
    /// Re(cᵢc̄ⱼ)·exp(−d²/(2σ²)).
    pub fn hamiltonian_energy(&self) -> f64 {
        let mut kinetic = 0.0;
        let mut potential = 0.0;
        for c in &self.centers {
            let m2 = c.coeff.norm_sqr();
            kinetic += 0.5 * m2 / (c.epsilon * c.epsilon);
            potential += 0.5 * m2;
        }
        let two_sigma_sq = 2.0 * INTERACTION_SIGMA * INTERACTION_SIGMA;
        let mut interaction = 0.0;
        for i in 0..self.centers.len() {
            for j in (i + 1)..self.centers.len() {
                let (a, b) = (&self.centers[i], &self.centers[j]);
                let d = geodesic_distance_optimized(&a.point, &b.point, &self.metric);
                interaction += (a.coeff * b.coeff.conj()).re * (-d * d / two_sigma_sq).exp();
            }
        }
        kinetic + potential + interaction
    }

    pub fn stats(&self) -> FieldStats {
        let n = self.centers.len();
        if n == 0 {
            return FieldStats::default();
        }
        let mut stats = FieldStats {
            num_centers: n,
            energy: self.compute_energy(),
            min_epsilon: f64::INFINITY,
            ..FieldStats::default()
        };
        let mut amp_sum = 0.0;
        let mut eps_sum = 0.0;
        for c in &self.centers {
            let a = c.coeff.norm();
            amp_sum += a;
            eps_sum += c.epsilon;
            stats.max_amplitude = stats.max_amplitude.max(a);
            stats.min_epsilon = stats.min_epsilon.min(c.epsilon);
            stats.max_epsilon = stats.max_epsilon.max(c.epsilon);
        }
        stats.mean_amplitude = amp_sum / n as f64;
        stats.mean_epsilon = eps_sum / n as f64;
        stats
    }

    /// Post-step validity check: every coefficient, shape parameter and
    /// metric determinant must be finite.
    pub fn check_finite(&self) -> FieldResult<()> {
        for (i, c) in self.centers.iter().enumerate() {
            if !c.coeff.re.is_finite() || !c.coeff.im.is_finite() {
                return Err(FieldError::Numerical(format!(
                    "coefficient {i} is not finite: {}",
                    c.coeff
                )));
            }
            if !c.epsilon.is_finite() {
                return Err(FieldError::Numerical(format!("epsilon {i} is not finite")));
            }
            if let Some(m) = &c.metric {
                if !m.determinant().is_finite() {
                    return Err(FieldError::Numerical(format!(
                        "metric determinant of center {i} is not finite"
                    )));
                }
            }
        }
        if !self.metric.determinant().is_finite() {
            return Err(FieldError::Numerical(
                "global metric determinant is not finite".to_string(),
            ));
        }
        Ok(())
    }
}
