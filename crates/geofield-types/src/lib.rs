// ─────────────────────────────────────────────────────────────────────
// GeoField — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! GeoField complex-field evolution engine.

pub mod config;
pub mod error;
pub mod params;
pub mod stats;

pub use config::{
    AdaptiveMetricConfig, CouplingConfig, CouplingMode, DiffusionOperator, EvolutionConfig,
    LimiterConfig, MetricCouplingConfig,
};
pub use error::{FieldError, FieldResult};
pub use params::{
    Parameters, BASE_ALPHA, BASE_BETA, BASE_DIFFUSION, BASE_DT, BASE_GAMMA, BASE_SIGMA,
};
pub use stats::{
    FieldStats, IndexStats, LimitCheck, LimiterCounters, LimiterReport, RunSummary, StepReport,
};
