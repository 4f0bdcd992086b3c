//! Root-mean-square normalization.
//!
//! Normalizes the last axis of a tensor by its root-mean-square value,
//! optionally rescaled by a learned per-channel vector. Used in place of
//! full layer normalization in modern transformer stacks (Zhang &
//! Sennrich, 2019): no mean subtraction, no bias.
//!
//! # References
//!
//! - Zhang, B., & Sennrich, R. (2019). Root Mean Square Layer
//!   Normalization. `NeurIPS`.

use crate::error::Result;
use crate::nn::functional;
use crate::nn::init::{zeros_init, Initializer};
use crate::precision::reduce_precision;
use crate::store::ParamStore;
use crate::tensor::Tensor;

/// RMS normalization of the last axis with an optional learned scale.
///
/// ```text
/// y = x * rsqrt(mean(x^2, last_axis) + 1e-6) * (1 + scale)
/// ```
///
/// The scale parameter is zero-initialized by default and, under the
/// offset-from-one convention (`scale_plus_one`, default on), starts out
/// as an identity multiplier. The scale vector lives in an externally
/// owned [`ParamStore`] under a configurable name.
///
/// # Example
///
/// ```
/// use capas::nn::RMSNorm;
/// use capas::store::ParamStore;
/// use capas::tensor::Tensor;
///
/// let mut store = ParamStore::new();
/// let norm = RMSNorm::new();
/// let x = Tensor::new(&[3.0, 4.0, 0.0], &[1, 3]);
/// let y = norm.apply(&x, &mut store).unwrap();
/// assert_eq!(y.shape(), x.shape());
/// ```
#[derive(Debug, Clone)]
pub struct RMSNorm {
    /// Whether to apply the learned per-channel scale
    with_scale: bool,

    /// Scale initializer, run on first use only
    scale_init: Initializer,

    /// Whether the scale encodes an offset from one
    scale_plus_one: bool,

    /// Whether to round the input to its declared precision first
    guard_against_excess_precision: bool,

    /// Parameter name of the scale vector in the store
    scale_name: String,
}

impl Default for RMSNorm {
    fn default() -> Self {
        Self::new()
    }
}

impl RMSNorm {
    /// Create an RMS normalization layer with the default configuration:
    /// learned scale on, zero-initialized, offset-from-one convention,
    /// no precision guard, parameter name `"scale"`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            with_scale: true,
            scale_init: zeros_init,
            scale_plus_one: true,
            guard_against_excess_precision: false,
            scale_name: "scale".to_string(),
        }
    }

    /// Disable the learned scale entirely.
    #[must_use]
    pub fn without_scale(mut self) -> Self {
        self.with_scale = false;
        self
    }

    /// Override the scale initializer.
    #[must_use]
    pub fn with_scale_init(mut self, init: Initializer) -> Self {
        self.scale_init = init;
        self
    }

    /// Use the scale directly as the multiplier instead of `1 + scale`.
    #[must_use]
    pub fn without_plus_one(mut self) -> Self {
        self.scale_plus_one = false;
        self
    }

    /// Round the input to its declared precision before normalizing.
    ///
    /// Guards against excess precision carried in the f32 storage of a
    /// reduced-precision tensor changing the normalization statistics.
    #[must_use]
    pub fn with_precision_guard(mut self) -> Self {
        self.guard_against_excess_precision = true;
        self
    }

    /// Override the parameter name of the scale vector, so several
    /// layers can share one flat store.
    #[must_use]
    pub fn with_scale_name(mut self, name: impl Into<String>) -> Self {
        self.scale_name = name.into();
        self
    }

    /// Normalize the last axis of `x`.
    ///
    /// Output shape equals input shape; `x` is not mutated. The scale
    /// vector (when enabled) is created in `store` on first use with
    /// length equal to the input's last axis, and reshaped to the input's
    /// rank with leading singleton axes so no implicit rank promotion
    /// happens in the multiply.
    pub fn apply(&self, x: &Tensor, store: &mut ParamStore) -> Result<Tensor> {
        let guarded;
        let x = if self.guard_against_excess_precision {
            guarded = reduce_precision(x)?;
            &guarded
        } else {
            x
        };

        let normed = functional::rms_norm(x)?;

        if !self.with_scale {
            return Ok(normed);
        }

        let d = x.shape()[x.ndim() - 1];
        let scale = store.get_or_create(&self.scale_name, &[d], x.dtype(), self.scale_init)?;

        // Rank-match the scale to the input: (1, ..., 1, d)
        let mut scale_shape = vec![1; x.ndim() - 1];
        scale_shape.push(d);
        let scale = scale.reshape(&scale_shape)?;

        let multiplier = if self.scale_plus_one {
            scale.add_scalar(1.0)
        } else {
            scale
        };
        normed.broadcast_mul(&multiplier)
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests_rmsnorm_contract.rs"]
mod tests_rmsnorm_contract;
