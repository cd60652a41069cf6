// ─────────────────────────────────────────────────────────────────────
// GeoField — Evolution Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks for the per-step hot paths:
//!   - Laplace–Beltrami, closed form and general
//!   - Full evolution step, neighbor-sum and Monte-Carlo coupling
//!   - Limited driver step

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use geofield_core::{Complex64, Field, Point};
use geofield_evolution::{EvolutionDriver, EvolutionStepper};
use geofield_geometry::{laplace_beltrami, laplace_beltrami_optimized};
use geofield_types::{CouplingConfig, CouplingMode, EvolutionConfig, LimiterConfig, Parameters};

const N: usize = 256;
const DIM: usize = 6;

// ── Helpers ───────────────────────────────────────────────────────────

fn make_field(n: usize) -> Field {
    let mut field = Field::new(DIM, n, 2.5).expect("field");
    for i in 0..n {
        let coords: Vec<f64> = (0..DIM)
            .map(|k| ((i * (k + 3)) as f64 * 0.618_033_988_7).fract())
            .collect();
        field
            .add_center(
                Point::new(coords).expect("point"),
                Complex64::from_polar(1.0, i as f64 * 0.1),
                4.0,
            )
            .expect("center");
    }
    field
}

// ── Operator benchmarks ──────────────────────────────────────────────

fn bench_laplacian_optimized(c: &mut Criterion) {
    let field = make_field(N);
    let p = Point::new(vec![0.5; DIM]).expect("point");
    c.bench_function("laplace_beltrami_optimized_256_6d", |b| {
        b.iter(|| laplace_beltrami_optimized(black_box(&field), black_box(&p)))
    });
}

fn bench_laplacian_general(c: &mut Criterion) {
    let field = make_field(32);
    let p = Point::new(vec![0.5; DIM]).expect("point");
    c.bench_function("laplace_beltrami_general_32_6d", |b| {
        b.iter(|| laplace_beltrami(black_box(&field), black_box(&p)))
    });
}

// ── Step benchmarks ──────────────────────────────────────────────────

fn bench_step_neighbor_sum(c: &mut Criterion) {
    let params = Parameters::default();
    let mut stepper = EvolutionStepper::new(EvolutionConfig::default()).expect("stepper");
    let mut field = make_field(N);
    c.bench_function("evolution_step_neighbor_256_6d", |b| {
        b.iter(|| stepper.step(black_box(&mut field), &params))
    });
}

fn bench_step_monte_carlo(c: &mut Criterion) {
    let params = Parameters::default();
    let config = EvolutionConfig {
        coupling: CouplingConfig {
            mode: CouplingMode::MonteCarlo,
            samples: 32,
            ..CouplingConfig::default()
        },
        ..EvolutionConfig::default()
    };
    let mut stepper = EvolutionStepper::new(config).expect("stepper");
    let mut field = make_field(64);
    c.bench_function("evolution_step_monte_carlo_64_6d", |b| {
        b.iter(|| stepper.step(black_box(&mut field), &params))
    });
}

fn bench_driver_advance(c: &mut Criterion) {
    let params = Parameters::default();
    let mut driver =
        EvolutionDriver::new(EvolutionConfig::default(), LimiterConfig::default()).expect("driver");
    let mut field = make_field(N);
    c.bench_function("driver_advance_256_6d", |b| {
        b.iter(|| driver.advance(black_box(&mut field), &params))
    });
}

criterion_group!(
    benches,
    bench_laplacian_optimized,
    bench_laplacian_general,
    bench_step_neighbor_sum,
    bench_step_monte_carlo,
    bench_driver_advance,
);
criterion_main!(benches);
