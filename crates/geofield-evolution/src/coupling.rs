// ─────────────────────────────────────────────────────────────────────
// GeoField — Non-Local Coupling
// ─────────────────────────────────────────────────────────────────────
//! C(x) = ∫ Φ(y)·K(x, y) dy with K(x, y) = exp(−d_g(x, y)/σ).
//!
//! Two estimators:
//!   - neighbor sum: kernel-weighted mean of Φ over centers inside the
//!     coupling radius, with Φ at every center computed once per step
//!   - Monte-Carlo: hit-or-miss integration over the coupling ball, with
//!     a per-(step, center) seed so parallel evaluation is reproducible

use geofield_core::{geodesic_distance_optimized, Complex64, Field, KdTree, Metric, Point};
use geofield_types::CouplingConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Attempt budget per requested Monte-Carlo sample.
const MAX_ATTEMPTS_PER_SAMPLE: usize = 10;

#[inline]
pub fn coupling_kernel(distance: f64, sigma: f64) -> f64 {
    if !(sigma > 0.0) {
        return 0.0;
    }
    (-distance / sigma).exp()
}

/// Geodesic radius at which the kernel falls to `threshold`.
pub fn coupling_radius(sigma: f64, threshold: f64) -> f64 {
    if !(sigma > 0.0) || !(threshold > 0.0 && threshold < 1.0) {
        return 0.0;
    }
    -sigma * threshold.ln()
}

/// Euclidean radius enclosing the geodesic ball of `radius` under `metric`.
fn euclidean_bound(radius: f64, metric: &Metric) -> Option<f64> {
    let lambda_min = metric.eigen().min();
    (lambda_min > 0.0).then(|| radius / lambda_min.sqrt())
}

/// Kernel-weighted mean of `phi_at_centers` around center `index`.
///
/// `phi_at_centers[j]` must hold Φ(pⱼ) for the state being stepped.
/// The center itself always contributes with weight 1.
pub fn neighbor_coupling(
    field: &Field,
    index: usize,
    phi_at_centers: &[Complex64],
    sigma: f64,
    threshold: f64,
    tree: Option<&KdTree>,
) -> Complex64 {
    let zero = Complex64::new(0.0, 0.0);
    if index >= field.len() || phi_at_centers.len() != field.len() {
        return zero;
    }
    let metric = field.center_metric(index);
    let anchor = field.centers()[index].point();
    let radius = coupling_radius(sigma, threshold);

    let candidates: Vec<usize> = match (tree, euclidean_bound(radius, metric)) {
        (Some(tree), Some(bound)) => tree.radius_query(anchor, bound).iter().map(|n| n.index).collect(),
        _ => (0..field.len()).collect(),
    };

    let mut weighted = zero;
    let mut total = 0.0;
    for j in candidates {
        let Some(other) = field.centers().get(j) else {
            continue;
        };
        let d = geodesic_distance_optimized(anchor, other.point(), metric);
        if d > radius {
            continue;
        }
        let k = coupling_kernel(d, sigma);
        weighted += phi_at_centers[j] * k;
        total += k;
    }
    if total > 0.0 {
        weighted / total
    } else {
        zero
    }
}

/// Monte-Carlo coupling estimate with its sampling statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CouplingEstimate {
    pub value: Complex64,
    /// Standard error of `value` (modulus).
    pub std_error: f64,
    pub accepted: usize,
    pub attempts: usize,
}

/// Hit-or-miss estimate of ∫_{d_g ≤ r} Φ(y)·K(x, y) dy.
///
/// Draws uniformly from the cube of half-width r around `point` until
/// `config.samples` points land inside the geodesic ball or the attempt
/// budget runs out. The estimate is the cube volume times the mean of
/// K·Φ over all attempts, with rejected draws counting as zero.
pub fn monte_carlo_coupling<R: Rng>(
    field: &Field,
    point: &Point,
    metric: &Metric,
    sigma: f64,
    config: &CouplingConfig,
    rng: &mut R,
) -> CouplingEstimate {
    let mut estimate = CouplingEstimate::default();
    let dim = field.dimension();
    let radius = coupling_radius(sigma, config.threshold);
    if point.dimension() != dim || metric.dimension() != dim || !(radius > 0.0) {
        return estimate;
    }
    let Some(half_width) = euclidean_bound(radius, metric) else {
        return estimate;
    };

    let budget = config.samples.saturating_mul(MAX_ATTEMPTS_PER_SAMPLE);
    let mut sum = Complex64::new(0.0, 0.0);
    let mut sum_sq = 0.0;
    let mut coords = vec![0.0; dim];
    while estimate.accepted < config.samples && estimate.attempts < budget {
        estimate.attempts += 1;
        for (k, c) in coords.iter_mut().enumerate() {
            *c = point.get(k) + rng.gen_range(-half_width..=half_width);
        }
        let Ok(sample) = Point::from_slice(&coords) else {
            continue;
        };
        let d = geodesic_distance_optimized(point, &sample, metric);
        if d > radius {
            continue;
        }
        estimate.accepted += 1;
        let contribution = field.evaluate(&sample) * coupling_kernel(d, sigma);
        sum += contribution;
        sum_sq += contribution.norm_sqr();
    }
    if estimate.attempts == 0 {
        return estimate;
    }

    let volume = (2.0 * half_width).powi(dim as i32);
    let n = estimate.attempts as f64;
    let mean = sum / n;
    estimate.value = mean * volume;
    if estimate.attempts > 1 {
        let variance = ((sum_sq / n) - mean.norm_sqr()).max(0.0) * n / (n - 1.0);
        estimate.std_error = volume * (variance / n).sqrt();
    }
    estimate
}

/// Seed for the sampler of `center` at `step`, derived from the base
/// seed with a SplitMix64 finalizer.
pub fn coupling_seed(base: u64, step: u64, center: usize) -> u64 {
    let mut z = base
        ^ step.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (center as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic Monte-Carlo coupling for center `index` at `step`.
/// An index with no center yields an empty estimate.
pub fn seeded_monte_carlo(
    field: &Field,
    index: usize,
    sigma: f64,
    config: &CouplingConfig,
    step: u64,
) -> CouplingEstimate {
    let Some(center) = field.centers().get(index) else {
        return CouplingEstimate::default();
    };
    let mut rng = StdRng::seed_from_u64(coupling_seed(config.seed, step, index));
    monte_carlo_coupling(
        field,
        center.point(),
        field.center_metric(index),
        sigma,
        config,
        &mut rng,
    )
}

/// K(pᵢ, pⱼ) for every pair, row-major n×n, distances under center i's
/// metric.
pub fn kernel_matrix(field: &Field, sigma: f64) -> Vec<f64> {
    let n = field.len();
    let centers = field.centers();
    let mut k = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            let d = geodesic_distance_optimized(centers[i].point(), centers[j].point(), field.center_metric(i));
            k[i * n + j] = coupling_kernel(d, sigma);
        }
    }
    k
}

/// Other centers inside the coupling radius of center `index`.
pub fn neighbor_count(field: &Field, index: usize, sigma: f64, threshold: f64) -> usize {
    if index >= field.len() {
        return 0;
    }
    let radius = coupling_radius(sigma, threshold);
    let anchor = field.centers()[index].point();
    let metric = field.center_metric(index);
    field
        .centers()
        .iter()
        .enumerate()
        .filter(|(j, c)| *j != index && geodesic_distance_optimized(anchor, c.point(), metric) <= radius)
        .count()
}
