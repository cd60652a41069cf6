// ─────────────────────────────────────────────────────────────────────
// GeoField — Adaptive Limiters
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Corrective pass run after every evolution step. Clamps shape
//! parameters, metric determinants, amplitudes, total energy and
//! gradients to configured bounds, optionally retuned from the field's
//! own scale, and counts every intervention.

pub mod check;
pub mod limiter;

pub use limiter::{AdaptiveLimiter, ENERGY_TOLERANCE};
