// ─────────────────────────────────────────────────────────────────────
// GeoField — Diagnostic Records
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// Aggregate statistics over a field's centers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub num_centers: usize,
    /// Σ|cᵢ|².
    pub energy: f64,
    pub max_amplitude: f64,
    pub mean_amplitude: f64,
    pub min_epsilon: f64,
    pub max_epsilon: f64,
    pub mean_epsilon: f64,
}

/// How many times each limiter has fired since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterCounters {
    pub epsilon_clips: u64,
    pub metric_clips: u64,
    pub amplitude_clips: u64,
    pub energy_clips: u64,
    pub gradient_clips: u64,
}

impl LimiterCounters {
    pub fn total(&self) -> u64 {
        self.epsilon_clips
            + self.metric_clips
            + self.amplitude_clips
            + self.energy_clips
            + self.gradient_clips
    }
}

/// Outcome of one limiter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LimiterReport {
    /// Centers whose shape parameter was clamped.
    pub epsilon_clipped: usize,
    /// Metrics regularised or rescaled.
    pub metrics_clipped: usize,
    pub amplitudes_clipped: usize,
    /// Whether the global energy rescale fired.
    pub energy_clipped: bool,
    /// Global scale applied by the energy limiter (1.0 when it did not fire).
    pub energy_scale: f64,
    pub gradients_clipped: usize,
}

impl LimiterReport {
    pub fn fired(&self) -> bool {
        self.epsilon_clipped > 0
            || self.metrics_clipped > 0
            || self.amplitudes_clipped > 0
            || self.energy_clipped
            || self.gradients_clipped > 0
    }
}

/// Non-mutating bound check over the whole field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitCheck {
    pub finite: bool,
    pub energy_ok: bool,
    pub amplitude_ok: bool,
    pub epsilon_ok: bool,
    pub metric_ok: bool,
    pub gradient_ok: bool,
    pub laplacian_ok: bool,
    pub curvature_ok: bool,
}

impl LimitCheck {
    pub fn within_bounds(&self) -> bool {
        self.finite
            && self.energy_ok
            && self.amplitude_ok
            && self.epsilon_ok
            && self.metric_ok
            && self.gradient_ok
            && self.laplacian_ok
            && self.curvature_ok
    }
}

/// Shape statistics of a KD-tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub nodes: usize,
    pub max_depth: usize,
    pub mean_depth: f64,
    /// ⌈log₂(n+1)⌉ / (max_depth + 1): 1.0 for a perfectly balanced tree.
    pub balance: f64,
}

/// Summary of one evolution step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: u64,
    /// Simulation time after the step.
    pub time: f64,
    pub energy_before: f64,
    pub energy_after: f64,
    /// Largest |ΔΦ| applied to any coefficient.
    pub max_update: f64,
    /// Whether the KD-tree was rebuilt for this step.
    pub index_rebuilt: bool,
    pub temporal_dimension: f64,
}

/// Summary of a driver run (steps plus limiter passes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: u64,
    pub initial_energy: f64,
    pub final_energy: f64,
    pub final_time: f64,
    pub limiter_passes_fired: u64,
    pub counters: LimiterCounters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_total() {
        let c = LimiterCounters {
            epsilon_clips: 1,
            metric_clips: 2,
            amplitude_clips: 3,
            energy_clips: 4,
            gradient_clips: 5,
        };
        assert_eq!(c.total(), 15);
    }

    #[test]
    fn test_limit_check_requires_all() {
        let mut check = LimitCheck {
            finite: true,
            energy_ok: true,
            amplitude_ok: true,
            epsilon_ok: true,
            metric_ok: true,
            gradient_ok: true,
            laplacian_ok: true,
            curvature_ok: true,
        };
        assert!(check.within_bounds());
        check.gradient_ok = false;
        assert!(!check.within_bounds());
    }

    #[test]
    fn test_default_report_not_fired() {
        assert!(!LimiterReport::default().fired());
    }
}
