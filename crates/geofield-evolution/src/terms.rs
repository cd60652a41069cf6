// ─────────────────────────────────────────────────────────────────────
// GeoField — Field Equation Terms
// ─────────────────────────────────────────────────────────────────────
//! The four right-hand-side terms of
//!
//!   ∂Φ/∂t = D·∇²_g Φ − α|Φ|²Φ + β·T(Φ) + γ·C(Φ)
//!
//! evaluated at a center's position against one frozen field state.

use geofield_core::{Complex64, Field, KdTree};
use geofield_geometry::{
    laplace_beltrami_cached, laplace_beltrami_optimized, laplace_beltrami_optimized_over,
    torsion_contribution, ConnectionCache,
};
use geofield_types::{CouplingMode, DiffusionOperator, EvolutionConfig, Parameters};

use crate::coupling::{neighbor_coupling, seeded_monte_carlo};

/// Read-only view of the pre-step state shared by every center's terms.
pub struct StepContext<'a> {
    pub field: &'a Field,
    pub params: &'a Parameters,
    pub config: &'a EvolutionConfig,
    pub tree: Option<&'a KdTree>,
    /// Euclidean support radius for tree-restricted sums.
    pub support: Option<f64>,
    /// Φ(pⱼ) for every center j.
    pub phi: &'a [Complex64],
    pub cache: &'a ConnectionCache,
    /// Step counter, mixed into Monte-Carlo seeds.
    pub step: u64,
}

/// Per-center contributions, each scaled by its equation coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterTerms {
    pub diffusion: Complex64,
    pub nonlinear: Complex64,
    pub torsion: Complex64,
    pub coupling: Complex64,
}

impl CenterTerms {
    pub fn compute(ctx: &StepContext<'_>, index: usize) -> Self {
        let p = ctx.params;
        let zero = Complex64::new(0.0, 0.0);
        Self {
            diffusion: if p.diffusion != 0.0 {
                diffusion_term(ctx, index) * p.diffusion
            } else {
                zero
            },
            nonlinear: nonlinear_term(ctx.phi[index], p.alpha),
            torsion: if p.beta != 0.0 {
                torsion_contribution(ctx.field, ctx.field.centers()[index].point()) * p.beta
            } else {
                zero
            },
            coupling: if p.gamma != 0.0 {
                coupling_term(ctx, index) * p.gamma
            } else {
                zero
            },
        }
    }

    /// dΦ/dt at the center.
    pub fn total(&self) -> Complex64 {
        self.diffusion + self.nonlinear + self.torsion + self.coupling
    }
}

/// ∇²_g Φ at center `index`, unscaled by D.
pub fn diffusion_term(ctx: &StepContext<'_>, index: usize) -> Complex64 {
    let field = ctx.field;
    let point = field.centers()[index].point();
    match ctx.config.diffusion_operator {
        DiffusionOperator::Optimized => match (ctx.tree, ctx.support) {
            (Some(tree), Some(radius)) => {
                let near = tree.radius_query(point, radius);
                laplace_beltrami_optimized_over(field, point, near.iter().map(|n| n.index))
            }
            _ => laplace_beltrami_optimized(field, point),
        },
        DiffusionOperator::General => laplace_beltrami_cached(field, point, ctx.cache),
    }
}

/// Cubic saturation −α|φ|²φ.
#[inline]
pub fn nonlinear_term(phi: Complex64, alpha: f64) -> Complex64 {
    -phi * (alpha * phi.norm_sqr())
}

/// Non-local coupling C(Φ) at center `index`, unscaled by γ.
pub fn coupling_term(ctx: &StepContext<'_>, index: usize) -> Complex64 {
    let coupling = &ctx.config.coupling;
    match coupling.mode {
        CouplingMode::NeighborSum => neighbor_coupling(
            ctx.field,
            index,
            ctx.phi,
            ctx.params.sigma,
            coupling.threshold,
            ctx.tree,
        ),
        CouplingMode::MonteCarlo => {
            seeded_monte_carlo(ctx.field, index, ctx.params.sigma, coupling, ctx.step).value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofield_core::Point;

    fn field() -> Field {
        let mut field = Field::new(2, 8, 2.5).unwrap();
        field.add_center(Point::origin(2), Complex64::new(1.0, 0.0), 1.0).unwrap();
        field
            .add_center(Point::from_slice(&[0.5, 0.2]).unwrap(), Complex64::new(0.0, -0.5), 0.8)
            .unwrap();
        field
    }

    fn phi(field: &Field) -> Vec<Complex64> {
        field.centers().iter().map(|c| field.evaluate(c.point())).collect()
    }

    #[test]
    fn test_nonlinear_term_opposes_phase() {
        let phi = Complex64::from_polar(2.0, 0.7);
        let term = nonlinear_term(phi, 0.5);
        assert!((term.norm() - 0.5 * 8.0).abs() < 1e-12);
        assert!((term.arg() - (0.7 - std::f64::consts::PI)).abs() < 1e-12);
    }

    #[test]
    fn test_switched_off_terms_are_zero() {
        let field = field();
        let values = phi(&field);
        let params = Parameters::diffusive(0.01, 0.0, 0.0);
        let config = EvolutionConfig::default();
        let cache = ConnectionCache::default();
        let ctx = StepContext {
            field: &field,
            params: &params,
            config: &config,
            tree: None,
            support: None,
            phi: &values,
            cache: &cache,
            step: 0,
        };
        let terms = CenterTerms::compute(&ctx, 0);
        assert_eq!(terms.total(), Complex64::new(0.0, 0.0));
        // The general operator was never consulted.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_operators_agree_on_constant_metric() {
        let field = field();
        let values = phi(&field);
        let params = Parameters::default();
        let cache = ConnectionCache::default();
        let optimized = EvolutionConfig::default();
        let general = EvolutionConfig {
            diffusion_operator: DiffusionOperator::General,
            ..EvolutionConfig::default()
        };
        for i in 0..field.len() {
            let a = diffusion_term(
                &StepContext {
                    field: &field,
                    params: &params,
                    config: &optimized,
                    tree: None,
                    support: None,
                    phi: &values,
                    cache: &cache,
                    step: 0,
                },
                i,
            );
            let b = diffusion_term(
                &StepContext {
                    field: &field,
                    params: &params,
                    config: &general,
                    tree: None,
                    support: None,
                    phi: &values,
                    cache: &cache,
                    step: 0,
                },
                i,
            );
            assert!((a - b).norm() < 1e-4, "center {i}: {a} vs {b}");
        }
    }

    #[test]
    fn test_indexed_diffusion_matches_full() {
        let mut field = Field::new(3, 128, 2.5).unwrap();
        for i in 0..80 {
            let t = i as f64 * 0.21;
            let p = Point::from_slice(&[t.cos() * 3.0, t.sin() * 3.0, 0.1 * t]).unwrap();
            field.add_center(p, Complex64::from_polar(1.0, t), 2.0).unwrap();
        }
        let values = phi(&field);
        let params = Parameters::default();
        let config = EvolutionConfig::default();
        let cache = ConnectionCache::default();
        let tree = KdTree::build(&field);
        let support = field.support_radius(config.support_tolerance);
        assert!(support.is_some());
        for i in [0, 33, 79] {
            let full = StepContext {
                field: &field,
                params: &params,
                config: &config,
                tree: None,
                support: None,
                phi: &values,
                cache: &cache,
                step: 0,
            };
            let indexed = StepContext {
                tree: Some(&tree),
                support,
                ..full
            };
            let a = diffusion_term(&full, i);
            let b = diffusion_term(&indexed, i);
            assert!((a - b).norm() < 1e-7, "center {i}: {a} vs {b}");
        }
    }

    #[test]
    fn test_torsion_of_smooth_field_is_negligible() {
        let field = field();
        let values = phi(&field);
        let params = Parameters::new(0.01, 0.0, 0.0, 1.0, 0.0, 0.5);
        let config = EvolutionConfig::default();
        let cache = ConnectionCache::default();
        let ctx = StepContext {
            field: &field,
            params: &params,
            config: &config,
            tree: None,
            support: None,
            phi: &values,
            cache: &cache,
            step: 0,
        };
        assert!(CenterTerms::compute(&ctx, 1).torsion.norm() < 1e-6);
    }
}
