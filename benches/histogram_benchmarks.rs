use criterion::{criterion_group, criterion_main, Criterion};
use gradhist::{HistogramBuilder, Matrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

const N_SAMPLES: usize = 100_000;
const N_FEATURES: usize = 20;
const N_BINS: usize = 64;

fn generate_inputs() -> (Vec<u8>, Vec<f32>, Vec<f32>) {
    let mut rng = StdRng::seed_from_u64(271828);
    let binned: Vec<u8> = (0..N_SAMPLES * N_FEATURES)
        .map(|_| rng.gen_range(0..N_BINS as u8))
        .collect();
    let gradients: Vec<f32> = (0..N_SAMPLES).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let hessians: Vec<f32> = (0..N_SAMPLES).map(|_| rng.gen_range(0.0..1.0)).collect();
    (binned, gradients, hessians)
}

pub fn histogram_benchmarks(c: &mut Criterion) {
    let (binned, gradients, hessians) = generate_inputs();
    let root: Vec<u32> = (0..N_SAMPLES as u32).collect();
    let node: Vec<u32> = (0..N_SAMPLES as u32).step_by(3).collect();

    let x = Matrix::new(&binned, N_SAMPLES, N_FEATURES);
    let mut builder = HistogramBuilder::new(x, N_BINS, &gradients, &hessians, false, 4).unwrap();
    c.bench_function("compute_brute root", |b| {
        b.iter(|| {
            builder
                .compute_brute(black_box(&root), None, None, None, false)
                .unwrap()
        })
    });
    c.bench_function("compute_brute node", |b| {
        b.iter(|| {
            builder
                .compute_brute(black_box(&node), None, None, None, false)
                .unwrap()
        })
    });

    let parent = builder.compute_brute(&root, None, None, None, false).unwrap();
    let left = builder.compute_brute(&node, None, None, None, false).unwrap();
    c.bench_function("compute_subtraction", |b| {
        b.iter(|| {
            builder
                .compute_subtraction(black_box(&parent), black_box(&left), None)
                .unwrap()
        })
    });

    let x = Matrix::new(&binned, N_SAMPLES, N_FEATURES);
    let mut constant_hessian_builder =
        HistogramBuilder::new(x, N_BINS, &gradients, &[], true, 4).unwrap();
    c.bench_function("compute_brute node constant hessian", |b| {
        b.iter(|| {
            constant_hessian_builder
                .compute_brute(black_box(&node), None, None, None, false)
                .unwrap()
        })
    });
}

criterion_group!(benches, histogram_benchmarks);
criterion_main!(benches);
