// =========================================================================
// FALSIFY-RMS: rmsnorm kernel contract (capas RMSNorm)
//
// Each test pins one mathematical invariant of the normalization kernel
// to concrete numbers, so a regression in the kernel falsifies a named
// claim instead of drifting silently.
// =========================================================================

use super::*;
use crate::nn::functional::{rsqrt, RMS_NORM_EPS};

/// FALSIFY-RMS-001: known-row normalization.
///
/// Row [3, 4, 0]: mean square = (9 + 16 + 0) / 3 = 8.3333,
/// rsqrt(8.3333 + 1e-6) ≈ 0.34641, normalized ≈ [1.0392, 1.3856, 0.0].
#[test]
fn falsify_rms_001_known_row() {
    let mut store = ParamStore::new();
    let x = Tensor::new(&[3.0, 4.0, 0.0, 1.0, 1.0, 1.0], &[2, 3]);
    let y = RMSNorm::new().without_scale().apply(&x, &mut store).unwrap();

    let expected_row0 = [1.0392, 1.3856, 0.0];
    for (c, &e) in expected_row0.iter().enumerate() {
        let got = y.data()[c];
        assert!(
            (got - e).abs() < 1e-4,
            "FALSIFIED RMS-001: y[0][{c}] = {got}, expected ≈ {e}"
        );
    }
    // second row of ones normalizes to ~1
    for c in 0..3 {
        let got = y.data()[3 + c];
        assert!(
            (got - 1.0).abs() < 1e-5,
            "FALSIFIED RMS-001: y[1][{c}] = {got}, expected ≈ 1"
        );
    }
}

/// FALSIFY-RMS-002: the unscaled path equals the literal formula
/// `x * rsqrt(mean(x^2, last_axis) + 1e-6)`, exactly.
#[test]
fn falsify_rms_002_formula_exact() {
    let mut store = ParamStore::new();
    let x = Tensor::new(&[0.25, -1.75, 3.5, -0.125, 2.0, 8.0], &[3, 2]);
    let y = RMSNorm::new().without_scale().apply(&x, &mut store).unwrap();

    for row in 0..3 {
        let slice = &x.data()[row * 2..(row + 1) * 2];
        let ms = slice.iter().map(|&v| v * v).sum::<f32>() / 2.0;
        let factor = rsqrt(ms + RMS_NORM_EPS);
        for col in 0..2 {
            let got = y.data()[row * 2 + col];
            let expected = slice[col] * factor;
            assert_eq!(
                got.to_bits(),
                expected.to_bits(),
                "FALSIFIED RMS-002: y[{row}][{col}] = {got}, expected {expected}"
            );
        }
    }
}

/// FALSIFY-RMS-003: zero-initialized scale with offset-from-one is an
/// identity multiplier, for any input.
#[test]
fn falsify_rms_003_zero_scale_identity() {
    let mut store = ParamStore::new();
    let x = Tensor::new(&[9.0, -0.01, 0.7, 44.0, -3.3, 0.0, 1e-3, -7.0], &[2, 4]);
    let scaled = RMSNorm::new().apply(&x, &mut store).unwrap();
    let unscaled = RMSNorm::new().without_scale().apply(&x, &mut store).unwrap();
    assert_eq!(
        scaled.data(),
        unscaled.data(),
        "FALSIFIED RMS-003: zero scale under 1+scale is not an identity"
    );
}

/// FALSIFY-RMS-004: zero-initialized scale without offset-from-one
/// zeroes the output, for any input.
#[test]
fn falsify_rms_004_zero_scale_direct_zeroes() {
    let mut store = ParamStore::new();
    let x = Tensor::new(&[5.0, -2.0, 0.1, 3.0], &[1, 4]);
    let y = RMSNorm::new()
        .without_plus_one()
        .apply(&x, &mut store)
        .unwrap();
    assert!(
        y.data().iter().all(|&v| v == 0.0),
        "FALSIFIED RMS-004: direct zero scale left nonzero output"
    );
}

/// FALSIFY-RMS-005: output shape equals input shape across ranks.
#[test]
fn falsify_rms_005_shape_preserved() {
    let mut store = ParamStore::new();
    for shape in [&[6][..], &[2, 6][..], &[3, 2, 6][..], &[2, 2, 2, 6][..]] {
        let numel: usize = shape.iter().product();
        let data: Vec<f32> = (0..numel).map(|i| (i as f32) - 3.0).collect();
        let x = Tensor::new(&data, shape);
        let y = RMSNorm::new().apply(&x, &mut store).unwrap();
        assert_eq!(
            y.shape(),
            shape,
            "FALSIFIED RMS-005: shape changed for rank {}",
            shape.len()
        );
    }
}

/// FALSIFY-RMS-006: the scale multiplier is rank-matched, never
/// rank-promoted: a rank-3 input multiplies against a (1, 1, d) scale.
#[test]
fn falsify_rms_006_rank_matched_scale() {
    let mut store = ParamStore::new();
    store.insert("scale", Tensor::new(&[1.0, 0.0], &[2]));
    let x = Tensor::new(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0], &[2, 2, 2]);
    let y = RMSNorm::new().apply(&x, &mut store).unwrap();

    let base = RMSNorm::new().without_scale().apply(&x, &mut store).unwrap();
    for i in 0..8 {
        let expected = if i % 2 == 0 { 2.0 * base.data()[i] } else { base.data()[i] };
        assert!(
            (y.data()[i] - expected).abs() < 1e-6,
            "FALSIFIED RMS-006: element {i} = {}, expected {expected}",
            y.data()[i]
        );
    }
}
