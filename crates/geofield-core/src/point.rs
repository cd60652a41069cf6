// ─────────────────────────────────────────────────────────────────────
// GeoField — Manifold Points
// ─────────────────────────────────────────────────────────────────────

use geofield_types::{FieldError, FieldResult};

/// Coordinate vector on the manifold. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    coords: Vec<f64>,
}

impl Point {
    /// Build a point; rejects empty or non-finite coordinates.
    pub fn new(coords: Vec<f64>) -> FieldResult<Self> {
        if coords.is_empty() {
            return Err(FieldError::Dimension("point needs at least one coordinate".to_string()));
        }
        if let Some(i) = coords.iter().position(|c| !c.is_finite()) {
            return Err(FieldError::Validation(format!(
                "coordinate {i} is not finite: {}",
                coords[i]
            )));
        }
        Ok(Self { coords })
    }

    pub fn origin(dimension: usize) -> Self {
        Self {
            coords: vec![0.0; dimension],
        }
    }

    /// Convenience for fixed-size literals in tests and demos.
    pub fn from_slice(coords: &[f64]) -> FieldResult<Self> {
        Self::new(coords.to_vec())
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    #[inline]
    pub fn get(&self, axis: usize) -> f64 {
        self.coords[axis]
    }

    /// Copy of this point moved by `delta` along one axis.
    pub fn offset(&self, axis: usize, delta: f64) -> Self {
        let mut coords = self.coords.clone();
        coords[axis] += delta;
        Self { coords }
    }

    /// Copy of this point moved by `da` along `a` and `db` along `b`.
    pub fn offset2(&self, a: usize, da: f64, b: usize, db: f64) -> Self {
        let mut coords = self.coords.clone();
        coords[a] += da;
        coords[b] += db;
        Self { coords }
    }

    /// Coordinate difference `other − self`.
    pub fn delta_to(&self, other: &Point) -> Vec<f64> {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| b - a)
            .collect()
    }

    /// Point on the straight segment `self + t·(other − self)`.
    pub fn lerp(&self, other: &Point, t: f64) -> Self {
        let coords = self
            .coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| a + t * (b - a))
            .collect();
        Self { coords }
    }

    /// Plain Euclidean distance in coordinates.
    pub fn euclidean_distance(&self, other: &Point) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| (b - a) * (b - a))
            .sum::<f64>()
            .sqrt()
    }
}

impl AsRef<[f64]> for Point {
    fn as_ref(&self) -> &[f64] {
        &self.coords
    }
}
