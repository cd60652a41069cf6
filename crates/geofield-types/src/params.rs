// ─────────────────────────────────────────────────────────────────────
// GeoField — Evolution Parameters
// ─────────────────────────────────────────────────────────────────────
//! Coefficients of the field equation
//!
//!   ∂Φ/∂t = D·∇²_g Φ − α|Φ|²Φ + β·T(Φ) + γ·C(Φ)
//!
//! with coupling kernel K(x, y) = exp(−d_g(x, y)/σ).

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FieldResult};

/// Base time step before stability scaling.
pub const BASE_DT: f64 = 0.01;
/// Base diffusion coefficient D.
pub const BASE_DIFFUSION: f64 = 0.08;
/// Base saturation coefficient α.
pub const BASE_ALPHA: f64 = 0.01;
/// Base torsion coefficient β.
pub const BASE_BETA: f64 = 0.005;
/// Base coupling coefficient γ.
pub const BASE_GAMMA: f64 = 0.02;
/// Base coupling correlation length σ.
pub const BASE_SIGMA: f64 = 0.5;

/// Plain value bundle passed into every evolution step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub dt: f64,
    /// Diffusion coefficient D.
    pub diffusion: f64,
    /// Cubic saturation α.
    pub alpha: f64,
    /// Torsion β.
    pub beta: f64,
    /// Coupling γ.
    pub gamma: f64,
    /// Coupling correlation length σ.
    pub sigma: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            dt: BASE_DT,
            diffusion: BASE_DIFFUSION,
            alpha: BASE_ALPHA,
            beta: BASE_BETA,
            gamma: BASE_GAMMA,
            sigma: BASE_SIGMA,
        }
    }
}

impl Parameters {
    pub fn new(dt: f64, diffusion: f64, alpha: f64, beta: f64, gamma: f64, sigma: f64) -> Self {
        Self {
            dt,
            diffusion,
            alpha,
            beta,
            gamma,
            sigma,
        }
    }

    /// Diffusion and saturation only; torsion and coupling switched off.
    pub fn diffusive(dt: f64, diffusion: f64, alpha: f64) -> Self {
        Self {
            dt,
            diffusion,
            alpha,
            beta: 0.0,
            gamma: 0.0,
            sigma: BASE_SIGMA,
        }
    }

    /// Validate parameter ranges. The stepper itself never rejects
    /// parameters; callers that load them from outside should.
    pub fn validate(&self) -> FieldResult<()> {
        let all = [
            ("dt", self.dt),
            ("diffusion", self.diffusion),
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
            ("sigma", self.sigma),
        ];
        for (name, value) in all {
            if !value.is_finite() {
                return Err(FieldError::Config(format!("{name} must be finite, got {value}")));
            }
        }
        if self.dt <= 0.0 {
            return Err(FieldError::Config(format!("dt must be > 0, got {}", self.dt)));
        }
        if self.diffusion < 0.0 {
            return Err(FieldError::Config(format!(
                "diffusion must be >= 0, got {}",
                self.diffusion
            )));
        }
        if self.sigma <= 0.0 {
            return Err(FieldError::Config(format!("sigma must be > 0, got {}", self.sigma)));
        }
        Ok(())
    }
}
