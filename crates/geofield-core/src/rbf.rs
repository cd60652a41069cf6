// ─────────────────────────────────────────────────────────────────────
// GeoField — Radial Basis Kernels
// ─────────────────────────────────────────────────────────────────────
//! Three radial kernels of the scaled radius s = ε²r²:
//!
//!   Gaussian               φ = exp(−s)
//!   multiquadric           φ = √(1 + s)
//!   inverse multiquadric   φ = 1/√(1 + s)
//!
//! Laplacians are the radial form φ'' + (d−1)/r·φ' in d dimensions:
//!
//!   Gaussian               2ε²(2s − d)·exp(−s)
//!   multiquadric           ε²(d + (d−1)s) / (1+s)^{3/2}
//!   inverse multiquadric   ε²((3−d)s − d) / (1+s)^{5/2}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RbfKind {
    #[default]
    Gaussian,
    Multiquadric,
    InverseMultiquadric,
}

impl RbfKind {
    /// Kernel value at distance `r`; equals 1 at `r = 0`.
    #[inline]
    pub fn evaluate(self, r: f64, epsilon: f64) -> f64 {
        let s = epsilon * epsilon * r * r;
        match self {
            RbfKind::Gaussian => (-s).exp(),
            RbfKind::Multiquadric => (1.0 + s).sqrt(),
            RbfKind::InverseMultiquadric => 1.0 / (1.0 + s).sqrt(),
        }
    }

    /// φ'(r)/r, finite at r = 0. Drives analytic gradients:
    /// ∂φ/∂xₖ = (φ'/r)·(gΔ)ₖ.
    #[inline]
    pub fn derivative_over_r(self, r: f64, epsilon: f64) -> f64 {
        let e2 = epsilon * epsilon;
        let s = e2 * r * r;
        match self {
            RbfKind::Gaussian => -2.0 * e2 * (-s).exp(),
            RbfKind::Multiquadric => e2 / (1.0 + s).sqrt(),
            RbfKind::InverseMultiquadric => -e2 / ((1.0 + s) * (1.0 + s).sqrt()),
        }
    }

    /// Radial Laplacian in `dim` dimensions.
    #[inline]
    pub fn laplacian(self, r: f64, epsilon: f64, dim: usize) -> f64 {
        let d = dim as f64;
        let e2 = epsilon * epsilon;
        let s = e2 * r * r;
        match self {
            RbfKind::Gaussian => 2.0 * e2 * (2.0 * s - d) * (-s).exp(),
            RbfKind::Multiquadric => e2 * (d + (d - 1.0) * s) / (1.0 + s).powf(1.5),
            RbfKind::InverseMultiquadric => e2 * ((3.0 - d) * s - d) / (1.0 + s).powf(2.5),
        }
    }

    /// Laplacian divided by ε², the O(1) form used for diffusion.
    #[inline]
    pub fn normalized_laplacian(self, r: f64, epsilon: f64, dim: usize) -> f64 {
        let e2 = epsilon * epsilon;
        if e2 == 0.0 {
            return 0.0;
        }
        self.laplacian(r, epsilon, dim) / e2
    }

    /// Geodesic radius beyond which |φ| < `tol`; `None` for kernels that
    /// do not decay.
    pub fn support_radius(self, epsilon: f64, tol: f64) -> Option<f64> {
        if !(epsilon > 0.0) || !(tol > 0.0 && tol < 1.0) {
            return None;
        }
        match self {
            RbfKind::Gaussian => Some((-tol.ln()).sqrt() / epsilon),
            RbfKind::InverseMultiquadric => Some((1.0 / (tol * tol) - 1.0).sqrt() / epsilon),
            RbfKind::Multiquadric => None,
        }
    }

    pub fn is_decaying(self) -> bool {
        !matches!(self, RbfKind::Multiquadric)
    }
}
