// ─────────────────────────────────────────────────────────────────────
// GeoField — Mesh Adaptation and Fractal Seeding
// ─────────────────────────────────────────────────────────────────────
//! Center-set maintenance outside the time step.
//!
//!   - adapt_mesh: split centers on steep gradients, drop isolated
//!     centers on flat ones
//!   - initialize_fractal: self-similar seed with four offspring per
//!     center per level

use geofield_core::{geodesic_distance_optimized, Complex64, Field, Point};
use geofield_types::{FieldError, FieldResult};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Half-width of the per-axis jitter applied to a refined child.
const REFINE_JITTER: f64 = 0.005;
const CHILD_COEFF_SCALE: f64 = 0.5;
const CHILD_EPSILON_SCALE: f64 = 0.8;
/// Coarsening never shrinks the field to this many centers or fewer.
const MIN_CENTERS: usize = 10;
/// A center closer than this to any other is not isolated.
const ISOLATION_DISTANCE: f64 = 0.1;

pub const MAX_FRACTAL_DEPTH: usize = 10;
const FRACTAL_OFFSPRING: usize = 4;
const FRACTAL_AMPLITUDE_DECAY: f64 = 0.7;
const FRACTAL_PHASE_STEP: f64 = 0.3;
const FRACTAL_SEED_EPSILON: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshReport {
    pub refined: usize,
    pub coarsened: usize,
}

/// Refine where |∇Φ| > `refine_threshold`, coarsen where
/// |∇Φ| < `coarsen_threshold`.
///
/// Gradients are sampled once, before any change. Refinement appends a
/// child with half the coefficient and 0.8·ε, jittered around its
/// parent, while capacity remains. Coarsening walks the original
/// centers from the highest index down and removes one only if it is at
/// least 0.1 from every other center under the global metric and more
/// than 10 centers remain.
pub fn adapt_mesh<R: Rng>(
    field: &mut Field,
    refine_threshold: f64,
    coarsen_threshold: f64,
    rng: &mut R,
) -> FieldResult<MeshReport> {
    if coarsen_threshold > refine_threshold {
        return Err(FieldError::Config(format!(
            "coarsen threshold {coarsen_threshold} exceeds refine threshold {refine_threshold}"
        )));
    }
    let mut report = MeshReport::default();
    let n = field.len();
    let gradients: Vec<f64> = field
        .centers()
        .iter()
        .map(|c| {
            field
                .gradient(c.point())
                .iter()
                .map(|g| g.norm_sqr())
                .sum::<f64>()
                .sqrt()
        })
        .collect();

    for (i, &grad) in gradients.iter().enumerate() {
        if grad <= refine_threshold || field.len() >= field.capacity() {
            continue;
        }
        let parent = &field.centers()[i];
        let coords: Vec<f64> = parent
            .point()
            .coords()
            .iter()
            .map(|&x| x + rng.gen_range(-REFINE_JITTER..=REFINE_JITTER))
            .collect();
        let coeff = parent.coeff() * CHILD_COEFF_SCALE;
        let epsilon = parent.epsilon() * CHILD_EPSILON_SCALE;
        field.add_center(Point::from_slice(&coords)?, coeff, epsilon)?;
        report.refined += 1;
    }

    for i in (0..n).rev() {
        if gradients[i] >= coarsen_threshold || field.len() <= MIN_CENTERS {
            continue;
        }
        let anchor = field.centers()[i].point();
        let metric = field.metric();
        let isolated = field.centers().iter().enumerate().all(|(j, c)| {
            j == i || geodesic_distance_optimized(anchor, c.point(), metric) >= ISOLATION_DISTANCE
        });
        if isolated {
            field.remove_center(i)?;
            report.coarsened += 1;
        }
    }

    if report.refined + report.coarsened > 0 {
        log::debug!(
            "mesh adapted: +{} -{} -> {} centers",
            report.refined,
            report.coarsened,
            field.len()
        );
    }
    Ok(report)
}

/// Seed `field` with a self-similar cluster and return the number of
/// centers added.
///
/// Level `k` (0-based) adds four children around every existing center
/// at offset `scale_factor^(k+1)` and amplitude `amplitude·0.7^(k+1)`,
/// stopping early when the next family would not fit. Coordinates are
/// clamped to the unit cube.
pub fn initialize_fractal(
    field: &mut Field,
    amplitude: f64,
    scale_factor: f64,
    max_depth: usize,
) -> FieldResult<usize> {
    if !(1..=MAX_FRACTAL_DEPTH).contains(&max_depth) {
        return Err(FieldError::Config(format!(
            "fractal depth must be in 1..={MAX_FRACTAL_DEPTH}, got {max_depth}"
        )));
    }
    if !(scale_factor > 0.0 && scale_factor < 1.0) {
        return Err(FieldError::Config(format!(
            "fractal scale factor must be in (0, 1), got {scale_factor}"
        )));
    }
    if !amplitude.is_finite() {
        return Err(FieldError::Validation(format!(
            "fractal amplitude must be finite, got {amplitude}"
        )));
    }

    let dim = field.dimension();
    let start = field.len();
    let mut seed = vec![0.5; dim];
    if dim == 6 {
        seed[3] = 0.0;
        seed[4] = 0.0;
    }
    field.add_center(
        Point::from_slice(&seed)?,
        Complex64::new(amplitude, 0.0),
        FRACTAL_SEED_EPSILON,
    )?;

    'levels: for depth in 0..max_depth {
        let level = (depth + 1) as i32;
        let scale = scale_factor.powi(level);
        let level_amplitude = amplitude * FRACTAL_AMPLITUDE_DECAY.powi(level);
        let parents = field.len();
        for i in 0..parents {
            if field.len() + FRACTAL_OFFSPRING > field.capacity() {
                break 'levels;
            }
            let parent: Vec<f64> = field.centers()[i].point().coords().to_vec();
            for j in 0..FRACTAL_OFFSPRING {
                let angle = std::f64::consts::TAU * j as f64 / FRACTAL_OFFSPRING as f64;
                let coords = offspring_coords(&parent, scale, angle);
                let phase = angle + FRACTAL_PHASE_STEP * depth as f64;
                field.add_center(
                    Point::from_slice(&coords)?,
                    Complex64::from_polar(level_amplitude, phase),
                    FRACTAL_SEED_EPSILON * scale,
                )?;
            }
        }
    }
    let added = field.len() - start;
    log::debug!("fractal initialization added {added} centers (depth {max_depth})");
    Ok(added)
}

/// Spiral offsets on the spatial axes; in 6-D the temporal pair and the
/// modal axis follow at reduced amplitude.
fn offspring_coords(parent: &[f64], scale: f64, angle: f64) -> Vec<f64> {
    let mut coords = parent.to_vec();
    coords[0] += scale * angle.cos();
    coords[1] += scale * angle.sin();
    if coords.len() > 2 {
        coords[2] += scale * (2.0 * angle).sin();
    }
    if coords.len() == 6 {
        coords[3] += 0.5 * scale * angle.cos();
        coords[4] += 0.5 * scale * angle.sin();
        coords[5] += 0.1 * scale * (3.0 * angle).sin();
    }
    for c in &mut coords {
        *c = c.clamp(0.0, 1.0);
    }
    coords
}
