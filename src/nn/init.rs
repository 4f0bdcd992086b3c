//! Weight initialization functions.
//!
//! Initializers here are plain function pointers over `(shape, seed)` so
//! layer configs stay `Copy`-friendly and a store can thread one seed
//! through every parameter it materializes.

use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// An initializer maps a shape and an optional random seed to a tensor.
pub type Initializer = fn(&[usize], Option<u64>) -> Tensor;

/// All-zeros initialization.
///
/// The default for normalization scale parameters, where the
/// offset-from-one convention turns a zero scale into an identity
/// multiplier.
#[must_use]
pub fn zeros_init(shape: &[usize], _seed: Option<u64>) -> Tensor {
    Tensor::zeros(shape)
}

/// All-ones initialization.
#[must_use]
pub fn ones_init(shape: &[usize], _seed: Option<u64>) -> Tensor {
    Tensor::ones(shape)
}

/// Small-variance normal initialization, N(0, 0.01).
///
/// The default for contraction weights.
#[must_use]
pub fn normal_init(shape: &[usize], seed: Option<u64>) -> Tensor {
    normal(shape, 0.0, 0.01, seed)
}

/// Normal distribution initialization.
///
/// Samples from N(mean, std).
pub(crate) fn normal(shape: &[usize], mean: f32, std: f32, seed: Option<u64>) -> Tensor {
    let numel: usize = shape.iter().product();
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    // Box-Muller transform for normal distribution
    let data: Vec<f32> = (0..numel)
        .map(|_| {
            let u1: f32 = rng.gen_range(0.0001_f32..1.0_f32);
            let u2: f32 = rng.gen_range(0.0_f32..1.0_f32);
            let z = (-2.0_f32 * u1.ln()).sqrt() * (2.0_f32 * std::f32::consts::PI * u2).cos();
            mean + std * z
        })
        .collect();

    Tensor::new(&data, shape)
}
