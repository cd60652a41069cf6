// ─────────────────────────────────────────────────────────────────────
// GeoField — Field Torsion
// ─────────────────────────────────────────────────────────────────────
//! Antisymmetric part of the field's complex Hessian,
//! Tᵢⱼ = ∂ᵢ(∇ⱼΦ) − ∂ⱼ(∇ᵢΦ), from central differences of the analytic
//! gradient. Exact antisymmetry is imposed after differencing.

use geofield_core::{Complex64, Field, Point, SliceProjection};
use geofield_types::{FieldError, FieldResult};

pub const TORSION_FD_STEP: f64 = 1e-4;

/// Imaginary weight of the torsion contribution |T|·(1 + 0.1i).
pub const TORSION_PHASE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct TorsionTensor {
    dim: usize,
    data: Vec<Complex64>,
}

impl TorsionTensor {
    pub fn dimension(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Complex64 {
        self.data[i * self.dim + j]
    }

    /// Frobenius norm over every component.
    pub fn magnitude(&self) -> f64 {
        self.data.iter().map(|t| t.norm_sqr()).sum::<f64>().sqrt()
    }

    pub fn is_antisymmetric(&self) -> bool {
        (0..self.dim).all(|i| {
            self.get(i, i) == Complex64::new(0.0, 0.0)
                && (i + 1..self.dim).all(|j| self.get(i, j) == -self.get(j, i))
        })
    }
}

pub fn torsion_tensor(field: &Field, point: &Point) -> TorsionTensor {
    let n = field.dimension();
    let zero = Complex64::new(0.0, 0.0);
    let mut data = vec![zero; n * n];
    if point.dimension() != n || field.is_empty() {
        return TorsionTensor { dim: n, data };
    }
    let h = TORSION_FD_STEP;
    // hessian[i·n + j] = ∂ᵢ(∂ⱼΦ)
    let mut hessian = vec![zero; n * n];
    for i in 0..n {
        let plus = field.gradient(&point.offset(i, h));
        let minus = field.gradient(&point.offset(i, -h));
        for j in 0..n {
            hessian[i * n + j] = (plus[j] - minus[j]) / (2.0 * h);
        }
    }
    for i in 0..n {
        for j in (i + 1)..n {
            let t = hessian[i * n + j] - hessian[j * n + i];
            data[i * n + j] = t;
            data[j * n + i] = -t;
        }
    }
    TorsionTensor { dim: n, data }
}

pub fn torsion_magnitude(field: &Field, point: &Point) -> f64 {
    torsion_tensor(field, point).magnitude()
}

/// Complex torsion scalar |T|·(1 + 0.1i) that drives the evolution term.
pub fn torsion_contribution(field: &Field, point: &Point) -> Complex64 {
    torsion_magnitude(field, point) * Complex64::new(1.0, TORSION_PHASE)
}

/// |T| sampled on a `resolution`² grid over [0, 1]² in the slice plane,
/// row-major with the second slice axis as the row.
pub fn torsion_slice_grid(
    field: &Field,
    projection: &SliceProjection,
    resolution: usize,
) -> FieldResult<Vec<f64>> {
    if resolution < 2 {
        return Err(FieldError::Validation(format!(
            "torsion grid needs resolution >= 2, got {resolution}"
        )));
    }
    let step = 1.0 / (resolution - 1) as f64;
    let mut grid = Vec::with_capacity(resolution * resolution);
    for row in 0..resolution {
        for col in 0..resolution {
            let plane = Point::from_slice(&[col as f64 * step, row as f64 * step])?;
            let lifted = projection.lift(&plane);
            if lifted.dimension() != field.dimension() {
                return Err(FieldError::Dimension(format!(
                    "slice lifts to dimension {}, field has {}",
                    lifted.dimension(),
                    field.dimension()
                )));
            }
            grid.push(torsion_magnitude(field, &lifted));
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofield_core::Metric;

    fn sample_field() -> Field {
        let mut field = Field::new(3, 8, 2.5).unwrap();
        let g = Metric::from_matrix(3, vec![1.0, 0.3, 0.0, 0.3, 2.0, 0.2, 0.0, 0.2, 1.0]).unwrap();
        field.set_metric(g).unwrap();
        field
            .add_center(Point::from_slice(&[0.0, 0.0, 0.0]).unwrap(), Complex64::new(1.0, 0.0), 1.5)
            .unwrap();
        field
            .add_center(Point::from_slice(&[0.5, 0.2, -0.1]).unwrap(), Complex64::new(0.0, 0.8), 0.9)
            .unwrap();
        field
    }

    #[test]
    fn test_antisymmetric_with_zero_diagonal() {
        let field = sample_field();
        let t = torsion_tensor(&field, &Point::from_slice(&[0.2, 0.1, 0.0]).unwrap());
        assert!(t.is_antisymmetric());
    }

    #[test]
    fn test_smooth_field_has_small_torsion() {
        // Mixed partials commute, so T is pure discretization error.
        let field = sample_field();
        let m = torsion_magnitude(&field, &Point::from_slice(&[0.2, 0.1, 0.0]).unwrap());
        assert!(m < 1e-6, "|T| = {m}");
    }

    #[test]
    fn test_contribution_phase() {
        let field = sample_field();
        let p = Point::from_slice(&[0.3, 0.3, 0.3]).unwrap();
        let c = torsion_contribution(&field, &p);
        assert!((c.im - TORSION_PHASE * c.re).abs() < 1e-15);
        assert!(c.re >= 0.0);
    }

    #[test]
    fn test_empty_field_is_zero() {
        let field = Field::new(3, 4, 2.5).unwrap();
        assert_eq!(torsion_magnitude(&field, &Point::origin(3)), 0.0);
    }

    #[test]
    fn test_slice_grid_shape() {
        let field = sample_field();
        let proj = SliceProjection::new(3, 0, 1, vec![0.0]).unwrap();
        let grid = torsion_slice_grid(&field, &proj, 4).unwrap();
        assert_eq!(grid.len(), 16);
        assert!(grid.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert!(torsion_slice_grid(&field, &proj, 1).is_err());
    }

    #[test]
    fn test_slice_grid_dimension_mismatch() {
        let field = sample_field();
        let proj = SliceProjection::default_for(6).unwrap();
        assert!(torsion_slice_grid(&field, &proj, 3).is_err());
    }
}
