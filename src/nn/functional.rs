//! Canonical numeric kernels for the nn layers.
//!
//! Layer structs delegate their math here so there is exactly one
//! definition of each kernel (ONE PATH). That matters most for
//! [`rsqrt`]: saved-model outputs are only reproducible if every
//! normalization call sites the same reciprocal-square-root rounding.

use crate::error::Result;
use crate::tensor::Tensor;

/// Fixed epsilon added to the mean square before the reciprocal square
/// root. Not configurable; changing it breaks numerical reproducibility
/// against saved model outputs.
pub const RMS_NORM_EPS: f32 = 1e-6;

/// The single reciprocal-square-root definition used by every
/// normalization path in the crate.
///
/// All callers must go through this function rather than spelling
/// `1.0 / x.sqrt()` locally, so any change to the formulation changes
/// every call site identically.
#[inline]
#[must_use]
pub fn rsqrt(x: f32) -> f32 {
    1.0 / x.sqrt()
}

/// Unscaled RMS normalization of the last axis:
/// `x * rsqrt(mean(x^2, last_axis, keepdims) + RMS_NORM_EPS)`.
///
/// Output shape equals input shape. The learned-scale step lives in
/// [`RMSNorm`](crate::nn::RMSNorm), not here.
pub fn rms_norm(x: &Tensor) -> Result<Tensor> {
    let var = x.mean_square_last_axis();
    let factor = var.map(|v| rsqrt(v + RMS_NORM_EPS));
    x.broadcast_mul(&factor)
}
