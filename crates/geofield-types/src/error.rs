// ─────────────────────────────────────────────────────────────────────
// GeoField — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all GeoField failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// The field already holds `capacity` centers.
    #[error("capacity exhausted: field holds {capacity} centers")]
    Capacity { capacity: usize },

    /// Dimension below 2 or a point/metric of the wrong dimension.
    #[error("dimension error: {0}")]
    Dimension(String),

    /// Invalid input (shape parameter, coordinates, coefficient).
    #[error("validation error: {0}")]
    Validation(String),

    /// Asymmetric, singular or non-positive-definite metric.
    #[error("metric error: {0}")]
    Metric(String),

    /// Center index outside the live range.
    #[error("index {index} out of range for {len} centers")]
    Index { index: usize, len: usize },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Numerical error (NaN/Inf in field state).
    #[error("numerical error: {0}")]
    Numerical(String),
}

pub type FieldResult<T> = Result<T, FieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = FieldError::Capacity { capacity: 8 };
        assert_eq!(e.to_string(), "capacity exhausted: field holds 8 centers");
        let e = FieldError::Index { index: 3, len: 2 };
        assert_eq!(e.to_string(), "index 3 out of range for 2 centers");
    }
}
