// ─────────────────────────────────────────────────────────────────────
// GeoField — Evolution Driver
// ─────────────────────────────────────────────────────────────────────
//! Step → limiter pass → finiteness check, with a hard stop.
//!
//! A state that is still non-finite after limiting halts the driver:
//! every later `advance` fails until `reactivate` is called. The halt
//! flag belongs to the driver instance.

use geofield_core::Field;
use geofield_limiters::AdaptiveLimiter;
use geofield_types::{
    EvolutionConfig, FieldError, FieldResult, LimiterConfig, LimiterReport, Parameters,
    RunSummary, StepReport,
};

use crate::energy::refresh_temporal_dimension;
use crate::integrator::EvolutionStepper;
use crate::params::configure_parameters;

pub struct EvolutionDriver {
    stepper: EvolutionStepper,
    limiter: AdaptiveLimiter,
    halted: bool,
}

impl EvolutionDriver {
    pub fn new(evolution: EvolutionConfig, limits: LimiterConfig) -> FieldResult<Self> {
        Ok(Self::from_parts(
            EvolutionStepper::new(evolution)?,
            AdaptiveLimiter::new(limits)?,
        ))
    }

    pub fn from_parts(stepper: EvolutionStepper, limiter: AdaptiveLimiter) -> Self {
        Self {
            stepper,
            limiter,
            halted: false,
        }
    }

    pub fn stepper(&self) -> &EvolutionStepper {
        &self.stepper
    }

    pub fn limiter(&self) -> &AdaptiveLimiter {
        &self.limiter
    }

    pub fn limiter_mut(&mut self) -> &mut AdaptiveLimiter {
        &mut self.limiter
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Stop accepting steps.
    pub fn halt(&mut self, reason: &str) {
        log::error!("evolution halted at step {}: {reason}", self.stepper.steps());
        self.halted = true;
    }

    /// Accept steps again after a halt.
    pub fn reactivate(&mut self) {
        self.halted = false;
        log::info!("evolution driver reactivated");
    }

    /// One step followed by the limiter pass and the finiteness check.
    pub fn advance(
        &mut self,
        field: &mut Field,
        params: &Parameters,
    ) -> FieldResult<(StepReport, LimiterReport)> {
        if self.halted {
            return Err(FieldError::Numerical("evolution driver is halted".to_string()));
        }
        let mut step = self.stepper.step(field, params)?;
        let limits = match self.limiter.apply_all(field) {
            Ok(report) => report,
            Err(e) => {
                self.halt(&format!("limiter pass failed: {e}"));
                return Err(e);
            }
        };
        if let Err(e) = field.check_finite() {
            self.halt(&e.to_string());
            return Err(e);
        }
        if limits.fired() {
            step.energy_after = field.compute_energy();
            step.temporal_dimension = refresh_temporal_dimension(field);
        }
        Ok((step, limits))
    }

    /// `steps` advances with fixed parameters, validated up front.
    pub fn run(&mut self, field: &mut Field, params: &Parameters, steps: u64) -> FieldResult<RunSummary> {
        params.validate()?;
        self.run_with(field, steps, |_| *params)
    }

    /// `steps` advances, re-deriving parameters from the field each step.
    pub fn run_adaptive(&mut self, field: &mut Field, steps: u64) -> FieldResult<RunSummary> {
        self.run_with(field, steps, configure_parameters)
    }

    fn run_with<F>(&mut self, field: &mut Field, steps: u64, mut params_for: F) -> FieldResult<RunSummary>
    where
        F: FnMut(&Field) -> Parameters,
    {
        let mut summary = RunSummary {
            initial_energy: field.compute_energy(),
            ..RunSummary::default()
        };
        for _ in 0..steps {
            let params = params_for(field);
            let (_, limits) = self.advance(field, &params)?;
            summary.steps += 1;
            if limits.fired() {
                summary.limiter_passes_fired += 1;
            }
        }
        summary.final_energy = field.compute_energy();
        summary.final_time = field.time();
        summary.counters = self.limiter.counters();
        log::info!(
            "run complete: {} steps, E {:.6e} -> {:.6e}, t={:.4}, {} limiter passes fired",
            summary.steps,
            summary.initial_energy,
            summary.final_energy,
            summary.final_time,
            summary.limiter_passes_fired
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofield_core::{Complex64, Point};
    use geofield_types::{CouplingConfig, CouplingMode};

    fn driver() -> EvolutionDriver {
        EvolutionDriver::new(EvolutionConfig::default(), LimiterConfig::default()).unwrap()
    }

    fn single_center_6d() -> Field {
        let mut field = Field::new(6, 16, 2.5).unwrap();
        field.add_center(Point::origin(6), Complex64::new(1.0, 0.0), 0.1).unwrap();
        field
    }

    #[test]
    fn test_single_center_decays_stably() {
        let mut field = single_center_6d();
        let params = Parameters::diffusive(0.01, 0.08, 0.01);
        let summary = driver().run(&mut field, &params, 50).unwrap();
        assert_eq!(summary.steps, 50);
        assert!((summary.final_time - 0.5).abs() < 1e-12);
        let c = field.centers()[0].coeff();
        assert!(c.re.is_finite() && c.im.is_finite());
        assert!((c - Complex64::new(1.0, 0.0)).norm() > 1e-3);
        assert!(summary.final_energy < 10.0 * summary.initial_energy);
        // Normalized LB at a Gaussian center is −2d, so the amplitude decays.
        assert!(c.norm() < 1.0);
    }

    #[test]
    fn test_invalid_params_rejected_before_stepping() {
        let mut field = single_center_6d();
        let params = Parameters {
            dt: -1.0,
            ..Parameters::default()
        };
        let mut d = driver();
        assert!(d.run(&mut field, &params, 3).is_err());
        assert_eq!(d.stepper().steps(), 0);
    }

    #[test]
    fn test_non_finite_state_halts() {
        let mut field = single_center_6d();
        field.set_coefficient(0, Complex64::new(f64::NAN, 0.0)).unwrap();
        let mut d = driver();
        let err = d.advance(&mut field, &Parameters::default()).unwrap_err();
        assert!(matches!(err, FieldError::Numerical(_)));
        assert!(d.is_halted());
        // Halted drivers refuse further steps without touching the field.
        let time = field.time();
        assert!(d.advance(&mut field, &Parameters::default()).is_err());
        assert_eq!(field.time(), time);

        d.reactivate();
        field.set_coefficient(0, Complex64::new(1.0, 0.0)).unwrap();
        assert!(d.advance(&mut field, &Parameters::default()).is_ok());
    }

    #[test]
    fn test_limiter_clips_growth() {
        let mut field = Field::new(2, 4, 2.5).unwrap();
        field.add_center(Point::origin(2), Complex64::new(50.0, 0.0), 1.0).unwrap();
        let limits = LimiterConfig {
            max_center_amplitude: 10.0,
            auto_adjust: false,
            ..LimiterConfig::default()
        };
        let mut d = EvolutionDriver::new(EvolutionConfig::default(), limits).unwrap();
        let (step, report) = d.advance(&mut field, &Parameters::diffusive(1e-4, 0.0, 0.0)).unwrap();
        assert_eq!(report.amplitudes_clipped, 1);
        assert!((field.centers()[0].coeff().norm() - 10.0).abs() < 1e-9);
        assert!((step.energy_after - 100.0).abs() < 1e-6);
        assert_eq!(d.limiter().counters().amplitude_clips, 1);
    }

    #[test]
    fn test_adaptive_run_is_stable() {
        let mut field = Field::new(3, 32, 2.5).unwrap();
        for i in 0..8 {
            let t = i as f64 * 0.8;
            let p = Point::from_slice(&[t.cos() * 0.3, t.sin() * 0.3, 0.05 * t]).unwrap();
            field.add_center(p, Complex64::from_polar(1.5, t), 2.0).unwrap();
        }
        let summary = driver().run_adaptive(&mut field, 20).unwrap();
        assert_eq!(summary.steps, 20);
        assert!(field.check_finite().is_ok());
        assert!(summary.final_energy.is_finite());
        assert!(summary.final_time > 0.0 && summary.final_time <= 0.2 + 1e-12);
    }

    #[test]
    fn test_monte_carlo_runs_deterministic() {
        let config = EvolutionConfig {
            coupling: CouplingConfig {
                mode: CouplingMode::MonteCarlo,
                samples: 16,
                seed: 99,
                ..CouplingConfig::default()
            },
            ..EvolutionConfig::default()
        };
        let make = || {
            let mut field = Field::new(2, 8, 2.5).unwrap();
            field.add_center(Point::origin(2), Complex64::new(1.0, 0.0), 1.0).unwrap();
            field
                .add_center(Point::from_slice(&[0.3, 0.1]).unwrap(), Complex64::new(0.0, 1.0), 1.0)
                .unwrap();
            field
        };
        let (mut a, mut b) = (make(), make());
        let params = Parameters::default();
        let mut da = EvolutionDriver::new(config.clone(), LimiterConfig::default()).unwrap();
        let mut db = EvolutionDriver::new(config, LimiterConfig::default()).unwrap();
        let sa = da.run(&mut a, &params, 10).unwrap();
        let sb = db.run(&mut b, &params, 10).unwrap();
        assert_eq!(sa, sb);
        assert_eq!(a.coefficients(), b.coefficients());
    }
}
