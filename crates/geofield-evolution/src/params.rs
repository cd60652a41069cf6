// ─────────────────────────────────────────────────────────────────────
// GeoField — Parameter Configuration
// ─────────────────────────────────────────────────────────────────────
//! Derives stable step parameters from the field's current statistics.
//!
//! Construction:
//!   1. Start from the base coefficients
//!   2. Scale D by fractal dimension and mean energy
//!   3. Divide D by the mean kernel overlap (denser fields diffuse slower)
//!   4. Cap dt by the explicit-scheme stability estimate

use geofield_core::Field;
use geofield_types::{Parameters, BASE_DT};

/// Fractal dimension above which diffusion is boosted.
const FRACTAL_BOOST_THRESHOLD: f64 = 2.5;
const FRACTAL_BOOST: f64 = 1.2;
/// Target fraction of the stability limit for dt.
const CFL_SAFETY: f64 = 0.5;

/// Mean over centers of Σⱼ φⱼ(pᵢ), the number of kernels overlapping a
/// typical center. At least 1 for decaying kernels (self-overlap).
pub fn kernel_overlap(field: &Field) -> f64 {
    let n = field.len();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = field
        .centers()
        .iter()
        .map(|c| (0..n).map(|j| field.basis(j, c.point())).sum::<f64>())
        .sum();
    total / n as f64
}

/// Stable parameters for the next step of `field`.
pub fn configure_parameters(field: &Field) -> Parameters {
    let mut params = Parameters::default();
    let n = field.len();
    if n == 0 {
        return params;
    }

    if field.fractal_dimension() > FRACTAL_BOOST_THRESHOLD {
        params.diffusion *= FRACTAL_BOOST;
    }
    let stats = field.stats();
    let mean_energy = stats.energy / n as f64;
    if mean_energy > 1.0 {
        params.diffusion *= mean_energy.sqrt();
    }

    let overlap = kernel_overlap(field);
    if overlap > 0.0 && overlap.is_finite() {
        params.diffusion /= overlap;
    }

    // Normalized Laplacian peaks at 2d per unit overlap; the cubic term
    // at α·max|c|²·overlap².
    let d = field.dimension() as f64;
    let max_amp_sq = stats.max_amplitude * stats.max_amplitude;
    let rate = params.diffusion * 2.0 * d * overlap + params.alpha * max_amp_sq * overlap * overlap;
    if rate > 0.0 && rate.is_finite() {
        params.dt = BASE_DT.min(CFL_SAFETY / rate);
    }
    log::debug!(
        "configured parameters: dt={:.3e} D={:.3e} overlap={overlap:.3}",
        params.dt,
        params.diffusion
    );
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geofield_core::{Complex64, Point};
    use geofield_types::{BASE_ALPHA, BASE_DIFFUSION};

    fn isolated_field(n: usize, amplitude: f64, fractal_dimension: f64) -> Field {
        let mut field = Field::new(2, 16, fractal_dimension).unwrap();
        for i in 0..n {
            let p = Point::from_slice(&[100.0 * i as f64, 0.0]).unwrap();
            field.add_center(p, Complex64::new(amplitude, 0.0), 1.0).unwrap();
        }
        field
    }

    #[test]
    fn test_empty_field_defaults() {
        let field = Field::new(3, 4, 2.5).unwrap();
        assert_eq!(configure_parameters(&field), Parameters::default());
        assert_eq!(kernel_overlap(&field), 0.0);
    }

    #[test]
    fn test_isolated_centers_have_unit_overlap() {
        let field = isolated_field(3, 1.0, 2.0);
        assert_relative_eq!(kernel_overlap(&field), 1.0, epsilon = 1e-12);
        let params = configure_parameters(&field);
        assert_relative_eq!(params.diffusion, BASE_DIFFUSION, epsilon = 1e-15);
        assert_eq!(params.dt, BASE_DT);
    }

    #[test]
    fn test_fractal_boost() {
        let params = configure_parameters(&isolated_field(2, 1.0, 2.8));
        assert_relative_eq!(params.diffusion, BASE_DIFFUSION * 1.2, epsilon = 1e-15);
    }

    #[test]
    fn test_energetic_field_boosts_diffusion() {
        let params = configure_parameters(&isolated_field(2, 3.0, 2.0));
        assert_relative_eq!(params.diffusion, BASE_DIFFUSION * 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dense_field_shrinks_diffusion() {
        let mut field = Field::new(2, 16, 2.0).unwrap();
        for i in 0..8 {
            let p = Point::from_slice(&[0.01 * i as f64, 0.0]).unwrap();
            field.add_center(p, Complex64::new(1.0, 0.0), 0.5).unwrap();
        }
        let overlap = kernel_overlap(&field);
        assert!(overlap > 7.0);
        let params = configure_parameters(&field);
        assert_relative_eq!(params.diffusion, BASE_DIFFUSION / overlap, epsilon = 1e-15);
    }

    #[test]
    fn test_large_amplitude_caps_dt() {
        let params = configure_parameters(&isolated_field(1, 1e3, 2.0));
        // D = 0.08·1000 = 80, rate = 80·4 + 0.01·1e6 = 10320
        let rate = BASE_DIFFUSION * 1e3 * 4.0 + BASE_ALPHA * 1e6;
        assert_relative_eq!(params.dt, 0.5 / rate, epsilon = 1e-15);
        assert!(params.dt < BASE_DT);
    }
}
