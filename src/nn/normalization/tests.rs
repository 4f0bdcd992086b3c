use super::*;
use crate::dtype::DType;
use crate::error::CapasError;
use crate::nn::init::ones_init;

#[test]
fn test_output_shape_matches_input() {
    let mut store = ParamStore::new();
    let norm = RMSNorm::new();
    for shape in [&[4][..], &[2, 3][..], &[5, 2, 3][..]] {
        let x = Tensor::ones(shape);
        let y = norm.apply(&x, &mut store).unwrap();
        assert_eq!(y.shape(), shape);
    }
}

#[test]
fn test_zero_scale_plus_one_is_identity_multiplier() {
    let mut store = ParamStore::new();
    let x = Tensor::new(&[0.4, -1.2, 2.2, 0.0, 5.0, -5.0], &[2, 3]);

    let with_scale = RMSNorm::new().apply(&x, &mut store).unwrap();
    let without = RMSNorm::new().without_scale().apply(&x, &mut store).unwrap();

    assert_eq!(with_scale.data(), without.data());
}

#[test]
fn test_zero_scale_without_plus_one_zeroes_output() {
    let mut store = ParamStore::new();
    let norm = RMSNorm::new().without_plus_one();
    let x = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    let y = norm.apply(&x, &mut store).unwrap();
    assert!(y.data().iter().all(|&v| v == 0.0));
}

#[test]
fn test_ones_scale_plus_one_doubles_output() {
    let mut store = ParamStore::new();
    let x = Tensor::new(&[1.0, -2.0, 0.5, 3.0], &[2, 2]);

    let base = RMSNorm::new().without_scale().apply(&x, &mut store).unwrap();
    let doubled = RMSNorm::new()
        .with_scale_init(ones_init)
        .apply(&x, &mut store)
        .unwrap();

    for (b, d) in base.data().iter().zip(doubled.data().iter()) {
        assert!((2.0 * b - d).abs() < 1e-6);
    }
}

#[test]
fn test_scale_parameter_created_under_configured_name() {
    let mut store = ParamStore::new();
    let norm = RMSNorm::new().with_scale_name("blk0_norm_scale");
    let x = Tensor::ones(&[2, 6]);
    norm.apply(&x, &mut store).unwrap();
    assert!(store.contains("blk0_norm_scale"));
    assert_eq!(store.get("blk0_norm_scale").unwrap().shape(), &[6]);
}

#[test]
fn test_no_scale_creates_no_parameter() {
    let mut store = ParamStore::new();
    let norm = RMSNorm::new().without_scale();
    norm.apply(&Tensor::ones(&[2, 4]), &mut store).unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_loaded_scale_of_wrong_length_fails() {
    let mut store = ParamStore::new();
    store.insert("scale", Tensor::zeros(&[5]));
    let norm = RMSNorm::new();
    let x = Tensor::ones(&[2, 4]);
    let err = norm.apply(&x, &mut store).unwrap_err();
    assert!(matches!(err, CapasError::ShapeMismatch { .. }), "{err}");
}

#[test]
fn test_input_not_mutated() {
    let mut store = ParamStore::new();
    let x = Tensor::new(&[3.0, 4.0, 0.0], &[1, 3]);
    let before = x.data().to_vec();
    RMSNorm::new().apply(&x, &mut store).unwrap();
    assert_eq!(x.data(), before.as_slice());
}

#[test]
fn test_precision_guard_rounds_before_normalizing() {
    let mut store = ParamStore::new();
    // bf16-declared input carrying f32-fine values
    let x = Tensor::new(&[1.0 + 1e-4, 1.0 - 1e-4], &[1, 2]).with_dtype(DType::Bf16);

    let guarded = RMSNorm::new()
        .without_scale()
        .with_precision_guard()
        .apply(&x, &mut store)
        .unwrap();

    // after rounding both elements are exactly 1.0
    let rounded = Tensor::ones(&[1, 2]).with_dtype(DType::Bf16);
    let expected = RMSNorm::new()
        .without_scale()
        .apply(&rounded, &mut store)
        .unwrap();
    assert_eq!(guarded.data(), expected.data());
}

#[test]
fn test_precision_guard_noop_for_f32() {
    let mut store = ParamStore::new();
    let x = Tensor::new(&[0.3, -0.7, 1.9], &[1, 3]);
    let plain = RMSNorm::new().without_scale().apply(&x, &mut store).unwrap();
    let guarded = RMSNorm::new()
        .without_scale()
        .with_precision_guard()
        .apply(&x, &mut store)
        .unwrap();
    assert_eq!(plain.data(), guarded.data());
}

#[test]
fn test_precision_guard_on_integer_input_fails() {
    let mut store = ParamStore::new();
    let x = Tensor::ones(&[1, 2]).with_dtype(DType::I32);
    let err = RMSNorm::new()
        .with_precision_guard()
        .apply(&x, &mut store)
        .unwrap_err();
    assert!(matches!(err, CapasError::UnknownType { .. }), "{err}");
}

#[test]
fn test_rank_one_input() {
    let mut store = ParamStore::new();
    let x = Tensor::new(&[3.0, 4.0, 0.0], &[3]);
    let y = RMSNorm::new().apply(&x, &mut store).unwrap();
    assert_eq!(y.shape(), &[3]);
    assert_eq!(store.get("scale").unwrap().shape(), &[3]);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Output shape equals input shape for any input.
        #[test]
        fn prop_shape_preserved(
            batch in 1_usize..5,
            rows in 1_usize..5,
            d in 1_usize..9,
            seed in any::<u64>()
        ) {
            let mut store = ParamStore::with_seed(seed);
            let numel = batch * rows * d;
            let data: Vec<f32> = (0..numel).map(|i| (i as f32 * 0.37).sin()).collect();
            let x = Tensor::new(&data, &[batch, rows, d]);
            let y = RMSNorm::new().apply(&x, &mut store).unwrap();
            prop_assert_eq!(y.shape(), x.shape());
        }

        /// With the offset-from-one convention and zero init, the scaled
        /// path is exactly the unscaled normalization.
        #[test]
        fn prop_zero_scale_identity(d in 1_usize..16, k in 1_u32..100) {
            let data: Vec<f32> = (0..d).map(|i| ((i + k as usize) as f32).cos()).collect();
            let x = Tensor::new(&data, &[1, d]);

            let mut store = ParamStore::new();
            let scaled = RMSNorm::new().apply(&x, &mut store).unwrap();
            let unscaled = RMSNorm::new().without_scale().apply(&x, &mut store).unwrap();
            prop_assert_eq!(scaled.data(), unscaled.data());
        }
    }
}
