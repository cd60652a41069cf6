// ─────────────────────────────────────────────────────────────────────
// GeoField — Core Field Model
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Points, metric tensors, RBF kernels and the complex field they
//! define, plus the KD-tree that keeps per-step evaluation local.
//!
//! Architecture:
//!   - Point / Metric: coordinates and SPD tensors (inverse, determinant)
//!   - RbfKind: Gaussian, multiquadric, inverse multiquadric
//!   - geodesic: distances under constant metrics (full and block-wise)
//!   - Field: weighted centers, evaluation, gradient, energy
//!   - KdTree: static index with kNN and radius queries
//!   - SliceProjection: 2-D views of n-D fields

pub mod field;
pub mod geodesic;
pub mod kdtree;
pub mod metric;
pub mod point;
pub mod projection;
pub mod rbf;
pub mod spectral;

pub use field::{Center, Field, FieldConfig, MetricMode};
pub use geodesic::{geodesic_distance, geodesic_distance_optimized};
pub use kdtree::{KdTree, Neighbor};
pub use metric::Metric;
pub use num_complex::Complex64;
pub use point::Point;
pub use projection::SliceProjection;
pub use rbf::RbfKind;
pub use spectral::{symmetric_eigenvalues, SymmetricEigen};
