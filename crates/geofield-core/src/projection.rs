// ─────────────────────────────────────────────────────────────────────
// GeoField — 2-D Slice Projection
// ─────────────────────────────────────────────────────────────────────
//! Projects an n-D field onto the plane spanned by two axes, holding
//! every other coordinate at a fixed slice value.

use geofield_types::{FieldError, FieldResult};

use crate::field::{Field, FieldConfig, MetricMode};
use crate::point::Point;

#[derive(Debug, Clone, PartialEq)]
pub struct SliceProjection {
    dim: usize,
    axis1: usize,
    axis2: usize,
    /// Values of the remaining axes, in ascending axis order.
    fixed: Vec<f64>,
}

impl SliceProjection {
    pub fn new(dim: usize, axis1: usize, axis2: usize, fixed: Vec<f64>) -> FieldResult<Self> {
        if dim < 2 || axis1 >= dim || axis2 >= dim || axis1 == axis2 {
            return Err(FieldError::Dimension(format!(
                "invalid slice axes ({axis1}, {axis2}) for dimension {dim}"
            )));
        }
        if fixed.len() != dim - 2 {
            return Err(FieldError::Dimension(format!(
                "slice needs {} fixed coordinates, got {}",
                dim - 2,
                fixed.len()
            )));
        }
        Ok(Self {
            dim,
            axis1,
            axis2,
            fixed,
        })
    }

    /// x–y plane; in 6-D the remaining axes sit at (z, τ₁, τ₂, m) = (0.5, 1.5, 0, 0.5).
    pub fn default_for(dim: usize) -> FieldResult<Self> {
        let fixed = if dim == 6 {
            vec![0.5, 1.5, 0.0, 0.5]
        } else {
            vec![0.0; dim.saturating_sub(2)]
        };
        Self::new(dim, 0, 1, fixed)
    }

    pub fn axes(&self) -> (usize, usize) {
        (self.axis1, self.axis2)
    }

    /// Drop every coordinate except the two slice axes.
    pub fn project(&self, point: &Point) -> Point {
        if point.dimension() != self.dim {
            return Point::origin(2);
        }
        Point::origin(2)
            .offset(0, point.get(self.axis1))
            .offset(1, point.get(self.axis2))
    }

    /// Re-embed a 2-D point at the slice's fixed coordinates.
    pub fn lift(&self, point: &Point) -> Point {
        if point.dimension() != 2 {
            return Point::origin(self.dim);
        }
        let mut fixed = self.fixed.iter();
        let mut lifted = Point::origin(self.dim);
        for axis in 0..self.dim {
            let value = if axis == self.axis1 {
                point.get(0)
            } else if axis == self.axis2 {
                point.get(1)
            } else {
                fixed.next().copied().unwrap_or(0.0)
            };
            lifted = lifted.offset(axis, value);
        }
        lifted
    }

    /// 2-D field holding every center projected onto the slice, under the
    /// restriction of the global metric to the slice axes.
    pub fn project_field(&self, field: &Field) -> FieldResult<Field> {
        if field.dimension() != self.dim {
            return Err(FieldError::Dimension(format!(
                "projection built for dimension {}, field has {}",
                self.dim,
                field.dimension()
            )));
        }
        let mut slice = Field::from_config(FieldConfig {
            dimension: 2,
            capacity: field.capacity(),
            fractal_dimension: field.fractal_dimension(),
            rbf_kind: field.rbf_kind(),
            metric_mode: MetricMode::Global,
        })?;
        slice.set_metric(field.metric().restrict(&[self.axis1, self.axis2])?)?;
        for c in field.centers() {
            slice.add_center(self.project(c.point()), c.coeff(), c.epsilon())?;
        }
        Ok(slice)
    }
}
