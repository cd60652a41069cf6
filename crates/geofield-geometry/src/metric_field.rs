// ─────────────────────────────────────────────────────────────────────
// GeoField — Position-Dependent Metrics
// ─────────────────────────────────────────────────────────────────────

use geofield_core::{Metric, Point};

/// A metric tensor as a function of position.
///
/// Geometry operators differentiate `metric_at` by central differences,
/// so implementations must be deterministic.
pub trait MetricField: Sync {
    fn dimension(&self) -> usize;

    /// Metric at `point`, `None` when it is degenerate there.
    fn metric_at(&self, point: &Point) -> Option<Metric>;

    /// Revision key when the metric does not depend on position.
    fn constant_revision(&self) -> Option<u64> {
        None
    }
}

impl MetricField for Metric {
    fn dimension(&self) -> usize {
        Metric::dimension(self)
    }

    fn metric_at(&self, _point: &Point) -> Option<Metric> {
        self.is_valid().then(|| self.clone())
    }

    fn constant_revision(&self) -> Option<u64> {
        self.is_valid().then(|| self.revision())
    }
}

/// Closure-backed metric, e.g. an analytic test manifold.
pub struct MetricFn<F> {
    dim: usize,
    f: F,
}

impl<F> MetricFn<F>
where
    F: Fn(&Point) -> Option<Metric> + Sync,
{
    pub fn new(dim: usize, f: F) -> Self {
        Self { dim, f }
    }
}

impl<F> MetricField for MetricFn<F>
where
    F: Fn(&Point) -> Option<Metric> + Sync,
{
    fn dimension(&self) -> usize {
        self.dim
    }

    fn metric_at(&self, point: &Point) -> Option<Metric> {
        (self.f)(point)
    }
}
