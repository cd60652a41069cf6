// ─────────────────────────────────────────────────────────────────────
// GeoField — Energy Diagnostics
// ─────────────────────────────────────────────────────────────────────

use geofield_core::Field;
use geofield_types::Parameters;

pub const MIN_TEMPORAL_DIMENSION: f64 = 1.0;
pub const MAX_TEMPORAL_DIMENSION: f64 = 1.999;

/// τ = 1 + ½(1 + tanh((E − 1)/0.5)), clamped to [1, 1.999].
pub fn temporal_dimension(energy: f64) -> f64 {
    if !energy.is_finite() {
        return MIN_TEMPORAL_DIMENSION;
    }
    let tau = 1.0 + 0.5 * (1.0 + ((energy - 1.0) / 0.5).tanh());
    tau.clamp(MIN_TEMPORAL_DIMENSION, MAX_TEMPORAL_DIMENSION)
}

/// Recompute τ from the field's energy and store it.
pub fn refresh_temporal_dimension(field: &mut Field) -> f64 {
    let tau = temporal_dimension(field.compute_energy());
    field.set_temporal_dimension(tau);
    tau
}

/// dE/dt of pure diffusion, −D·E.
pub fn dissipation_rate(field: &Field, params: &Parameters) -> f64 {
    -params.diffusion * field.compute_energy()
}

/// |E₁ − E₀| ≤ tol·max(|E₀|, ε).
pub fn energy_conserved(initial: f64, current: f64, relative_tolerance: f64) -> bool {
    let scale = initial.abs().max(f64::EPSILON);
    (current - initial).abs() <= relative_tolerance * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofield_core::{Complex64, Point};

    #[test]
    fn test_temporal_dimension_range() {
        assert!((temporal_dimension(1.0) - 1.5).abs() < 1e-15);
        assert_eq!(temporal_dimension(1e6), MAX_TEMPORAL_DIMENSION);
        assert!(temporal_dimension(0.0) >= MIN_TEMPORAL_DIMENSION);
        assert_eq!(temporal_dimension(f64::NAN), MIN_TEMPORAL_DIMENSION);
    }

    #[test]
    fn test_temporal_dimension_monotone() {
        let mut last = 0.0;
        for e in [0.0, 0.5, 1.0, 1.5, 2.0] {
            let tau = temporal_dimension(e);
            assert!(tau >= last);
            last = tau;
        }
    }

    #[test]
    fn test_dissipation_and_refresh() {
        let mut field = Field::new(2, 4, 2.5).unwrap();
        field.add_center(Point::origin(2), Complex64::new(2.0, 0.0), 1.0).unwrap();
        let params = Parameters::default();
        assert!((dissipation_rate(&field, &params) + params.diffusion * 4.0).abs() < 1e-15);
        let tau = refresh_temporal_dimension(&mut field);
        assert_eq!(field.temporal_dimension(), tau);
    }

    #[test]
    fn test_energy_conservation_tolerance() {
        assert!(energy_conserved(10.0, 10.05, 0.01));
        assert!(!energy_conserved(10.0, 10.5, 0.01));
        assert!(energy_conserved(0.0, 0.0, 1e-9));
    }
}
