// ─────────────────────────────────────────────────────────────────────
// GeoField — Field Evolution
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Explicit time integration of
//!
//!   ∂Φ/∂t = D·∇²_g Φ − α|Φ|²Φ + β·T(Φ) + γ·C(Φ)
//!
//! Architecture:
//!   - params: stable (dt, D, α, β, γ, σ) from field statistics
//!   - terms / coupling: the four right-hand-side terms per center
//!   - EvolutionStepper: forward Euler on the pre-step state, rayon
//!     per-center evaluation, KD-tree and connection cache upkeep
//!   - EvolutionDriver: step, limiter pass, finiteness hard stop
//!   - energy / mesh: temporal dimension, dissipation, refinement,
//!     fractal seeding

pub mod coupling;
pub mod driver;
pub mod energy;
pub mod integrator;
pub mod mesh;
pub mod params;
pub mod terms;

pub use coupling::{
    coupling_kernel, coupling_radius, coupling_seed, kernel_matrix, monte_carlo_coupling,
    neighbor_count, neighbor_coupling, seeded_monte_carlo, CouplingEstimate,
};
pub use driver::EvolutionDriver;
pub use energy::{dissipation_rate, energy_conserved, refresh_temporal_dimension, temporal_dimension};
pub use integrator::{evolve_step, EvolutionStepper};
pub use mesh::{adapt_mesh, initialize_fractal, MeshReport};
pub use params::{configure_parameters, kernel_overlap};
pub use terms::{CenterTerms, StepContext};
