// ─────────────────────────────────────────────────────────────────────
// GeoField — Explicit Field Integrator
// ─────────────────────────────────────────────────────────────────────
//! Forward-Euler stepper for
//!
//!   ∂Φ/∂t = D·∇²_g Φ − α|Φ|²Φ + β·T(Φ) + γ·C(Φ)
//!
//! Every term is evaluated against the pre-step state. Per-center work
//! runs on the rayon pool and lands in a private slot of the derivative
//! vector; coefficients are written once, sequentially, afterwards.
//! With metric coupling enabled the metric then flows over the same dt.
//! The stepper never clips: limiting is the caller's pass.

use geofield_core::{Complex64, Field, KdTree, Metric};
use geofield_geometry::{evolve_metric_coupled, update_adaptive_metric, ConnectionCache};
use geofield_types::{EvolutionConfig, FieldResult, Parameters, StepReport};
use rayon::prelude::*;

use crate::energy::temporal_dimension;
use crate::terms::{CenterTerms, StepContext};

/// Map `f` over `0..n`, on the rayon pool when `parallel` is set.
/// Output order is index order either way.
fn per_center<T, F>(n: usize, parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if parallel {
        (0..n).into_par_iter().map(f).collect()
    } else {
        (0..n).map(f).collect()
    }
}

/// cᵢ += dt·rateᵢ for every center. Returns the largest |Δcᵢ|; a rate
/// vector of the wrong length leaves the field untouched.
fn apply_rates(field: &mut Field, rates: &[Complex64], dt: f64) -> FieldResult<f64> {
    let mut max_update = 0.0_f64;
    let updated: Vec<Complex64> = field
        .centers()
        .iter()
        .zip(rates)
        .map(|(c, rate)| {
            let delta = rate * dt;
            max_update = max_update.max(delta.norm());
            c.coeff() + delta
        })
        .collect();
    field.apply_coefficients(&updated)?;
    Ok(max_update)
}

/// Explicit stepper with its KD-tree and connection cache.
pub struct EvolutionStepper {
    config: EvolutionConfig,
    /// Metric the adaptive deformation is applied to, captured from the
    /// field on the first adaptive step unless set explicitly.
    baseline: Option<Metric>,
    tree: Option<KdTree>,
    cache: ConnectionCache,
    steps: u64,
}

impl Default for EvolutionStepper {
    fn default() -> Self {
        Self {
            config: EvolutionConfig::default(),
            baseline: None,
            tree: None,
            cache: ConnectionCache::default(),
            steps: 0,
        }
    }
}

impl EvolutionStepper {
    pub fn new(config: EvolutionConfig) -> FieldResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Continue the step counter from `step`, so Monte-Carlo coupling
    /// draws the seeds it would have drawn at that point of a run.
    pub fn resume_at(mut self, step: u64) -> Self {
        self.steps = step;
        self
    }

    /// Fix the adaptive-metric baseline instead of capturing it lazily.
    pub fn with_baseline(mut self, baseline: Metric) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn index(&self) -> Option<&KdTree> {
        self.tree.as_ref()
    }

    pub fn cache(&self) -> &ConnectionCache {
        &self.cache
    }

    pub fn baseline(&self) -> Option<&Metric> {
        self.baseline.as_ref()
    }

    /// Rebuild the KD-tree when due. Returns whether a rebuild happened.
    fn refresh_index(&mut self, field: &Field) -> bool {
        if field.len() < self.config.index_threshold {
            self.tree = None;
            return false;
        }
        let on_cadence = self.steps % self.config.rebuild_every == 0;
        let stale = self.tree.as_ref().map_or(true, |t| t.is_stale(field));
        if !on_cadence && !stale {
            return false;
        }
        if stale && !on_cadence && self.tree.is_some() {
            log::warn!(
                "KD-tree stale at step {} ({} centers), rebuilding off cadence",
                self.steps,
                field.len()
            );
        }
        self.tree = Some(KdTree::build(field));
        true
    }

    fn adapt_metric(&mut self, field: &mut Field) {
        let Some(adaptive) = self.config.adaptive_metric else {
            return;
        };
        let baseline = self.baseline.get_or_insert_with(|| field.metric().clone());
        if let Err(e) = update_adaptive_metric(field, baseline, &adaptive) {
            log::warn!("adaptive metric update failed, keeping previous metric: {e}");
        }
    }

    /// Flow the metric along the post-update energy-momentum tensor. A
    /// failed flow leaves the previous metric in place.
    fn flow_metric(&self, field: &mut Field, dt: f64) {
        let Some(coupling) = self.config.metric_coupling else {
            return;
        };
        if let Err(e) = evolve_metric_coupled(field, dt, &coupling) {
            log::warn!("coupled metric flow failed, keeping previous metric: {e}");
        }
    }

    /// dΦ/dt at every center for the current state, plus Φ at the centers.
    pub fn derivatives(&self, field: &Field, params: &Parameters) -> (Vec<Complex64>, Vec<Complex64>) {
        let n = field.len();
        let parallel = self.config.parallel;
        let tree = self.tree.as_ref().filter(|t| !t.is_stale(field));
        let support = tree.and_then(|_| field.support_radius(self.config.support_tolerance));

        let phi = per_center(n, parallel, |i| {
            let p = field.centers()[i].point();
            match (tree, support) {
                (Some(tree), Some(radius)) => field.evaluate_indexed(p, tree, radius),
                _ => field.evaluate(p),
            }
        });

        let ctx = StepContext {
            field,
            params,
            config: &self.config,
            tree,
            support,
            phi: &phi,
            cache: &self.cache,
            step: self.steps,
        };
        let rates = per_center(n, parallel, |i| CenterTerms::compute(&ctx, i).total());
        (rates, phi)
    }

    /// Advance `field` by `params.dt`.
    ///
    /// A non-finite outcome is left in place for the limiter pass and the
    /// driver's finiteness check.
    pub fn step(&mut self, field: &mut Field, params: &Parameters) -> FieldResult<StepReport> {
        let energy_before = field.compute_energy();
        self.adapt_metric(field);
        let index_rebuilt = self.refresh_index(field);

        let (rates, _) = self.derivatives(field, params);
        let max_update = apply_rates(field, &rates, params.dt)?;
        self.flow_metric(field, params.dt);

        field.advance_time(params.dt);
        let energy_after = field.compute_energy();
        let tau = temporal_dimension(energy_after);
        field.set_temporal_dimension(tau);
        self.steps += 1;

        log::trace!(
            "step {}: t={:.4} E {:.6e} -> {:.6e}, max |dc|={:.3e}",
            self.steps,
            field.time(),
            energy_before,
            energy_after,
            max_update
        );
        Ok(StepReport {
            step: self.steps,
            time: field.time(),
            energy_before,
            energy_after,
            max_update,
            index_rebuilt,
            temporal_dimension: tau,
        })
    }

    /// Take `n_steps` steps with fixed parameters.
    pub fn run(
        &mut self,
        field: &mut Field,
        params: &Parameters,
        n_steps: u64,
    ) -> FieldResult<Vec<StepReport>> {
        (0..n_steps).map(|_| self.step(field, params)).collect()
    }
}

/// Step number `step` (0-based) under the default configuration.
///
/// A fresh stepper is built per call and resumed at `step`, so
/// Monte-Carlo seeds follow the caller's counter instead of restarting
/// at zero. The KD-tree and connection cache do not carry over; long
/// runs should keep an `EvolutionStepper` alive instead.
pub fn evolve_step(field: &mut Field, params: &Parameters, step: u64) -> FieldResult<StepReport> {
    EvolutionStepper::default().resume_at(step).step(field, params)
}
