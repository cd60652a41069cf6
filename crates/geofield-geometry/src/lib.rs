// ─────────────────────────────────────────────────────────────────────
// GeoField — Differential Geometry
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Connection, curvature and differential operators on the field's
//! manifold.
//!
//! Architecture:
//!   - MetricField: metric as a function of position (constant, closure,
//!     energy-adaptive)
//!   - christoffel / curvature: Γ, Riemann, Ricci, scalar R by central
//!     differences
//!   - laplacian: Laplace–Beltrami, closed-form and general
//!   - torsion: antisymmetric Hessian of Φ and its evolution scalar
//!   - adaptive: energy-driven metric deformation and the coupled
//!     energy-momentum metric flow
//!   - regularize: determinant bounds for flowed or limited metrics
//!   - ConnectionCache: revision-keyed Γ for constant metrics

pub mod adaptive;
pub mod cache;
pub mod christoffel;
pub mod curvature;
pub mod geodesic;
pub mod laplacian;
pub mod metric_field;
pub mod regularize;
pub mod torsion;

pub use adaptive::{
    adapt_metric, adapt_metric_at, axis_factors, energy_momentum_tensor, evolve_metric_coupled,
    flow_metric, update_adaptive_metric, AdaptiveMetric,
};
pub use cache::ConnectionCache;
pub use christoffel::{
    christoffel_symbols, covariant_derivative_scalar, metric_derivatives, Christoffel,
};
pub use curvature::{ricci_tensor, riemann_tensor, scalar_curvature, RiemannTensor};
pub use geodesic::{geodesic_distance_varying, path_length};
pub use laplacian::{
    laplace_beltrami, laplace_beltrami_cached, laplace_beltrami_optimized,
    laplace_beltrami_optimized_over, laplace_beltrami_with,
};
pub use metric_field::{MetricField, MetricFn};
pub use regularize::{regularize_metric, DET_TOLERANCE};
pub use torsion::{
    torsion_contribution, torsion_magnitude, torsion_slice_grid, torsion_tensor, TorsionTensor,
};
