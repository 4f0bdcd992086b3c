//! Precision reduction for tensors carrying excess internal precision.
//!
//! Storage is f32 everywhere in this crate, so a tensor declared as f16 or
//! bf16 may hold values finer than its nominal format can represent (for
//! example after a higher-precision accumulation). [`reduce_precision`]
//! rounds every element down to the declared format's precision while
//! leaving the declared dtype unchanged.
//!
//! The rounding is driven entirely by the exponent/mantissa widths from
//! [`DType::float_info`]; no float format is hardcoded here.

use crate::dtype::{DType, FloatInfo};
use crate::error::{CapasError, Result};
use crate::tensor::Tensor;

const F32_MANT_BITS: u32 = 23;
const F32_EXP_BITS: u32 = 8;
const F32_EXP_MASK: u32 = 0xff;
const F32_EXP_BIAS: i32 = 127;
const F32_SIGN_MASK: u32 = 0x8000_0000;
const F32_INF_BITS: u32 = 0x7f80_0000;

/// Round every element of `x` to the precision implied by its declared
/// dtype's exponent and mantissa widths. The declared dtype is unchanged.
///
/// Pure function: no state, no side effects, idempotent. Fails with
/// [`CapasError::UnknownType`] for non-floating-point tensors.
///
/// # Example
///
/// ```
/// use capas::dtype::DType;
/// use capas::precision::reduce_precision;
/// use capas::tensor::Tensor;
///
/// let x = Tensor::new(&[1.0 + 1e-4], &[1]).with_dtype(DType::Bf16);
/// let y = reduce_precision(&x).unwrap();
/// // bf16 has 7 mantissa bits; 1.0001 is not representable
/// assert_eq!(y.data()[0], 1.0);
/// assert_eq!(y.dtype(), DType::Bf16);
/// ```
pub fn reduce_precision(x: &Tensor) -> Result<Tensor> {
    let info = x
        .dtype()
        .float_info()
        .ok_or(CapasError::UnknownType { dtype: x.dtype() })?;
    Ok(x.map(|v| round_to_format(v, info)))
}

/// Round a single f32 value to an `(nexp, nmant)` format, round-to-nearest-even.
///
/// Overflow beyond the target exponent range produces a signed infinity;
/// values in the target's subnormal range are quantized to its subnormal
/// spacing; NaN and infinities pass through unchanged.
fn round_to_format(v: f32, info: FloatInfo) -> f32 {
    if info.nexp >= F32_EXP_BITS && info.nmant >= F32_MANT_BITS {
        return v;
    }

    let bits = v.to_bits();
    let exp_bits = (bits >> F32_MANT_BITS) & F32_EXP_MASK;
    if exp_bits == F32_EXP_MASK {
        // NaN or infinity
        return v;
    }
    if v == 0.0 {
        return v;
    }

    let emax: i32 = (1i32 << (info.nexp - 1)) - 1;
    let emin: i32 = 1 - emax;
    let sign = bits & F32_SIGN_MASK;

    // Below the target's normal range: quantize to the subnormal spacing
    // 2^(emin - nmant) in f64 so round-to-nearest-even is exact.
    let unbiased = i32::try_from(exp_bits).unwrap_or(0) - F32_EXP_BIAS;
    if unbiased < emin {
        let step = f64::from(emin - info.nmant as i32).exp2();
        let q = (f64::from(v) / step).round_ties_even() * step;
        return q as f32;
    }

    // Round the mantissa to nmant bits. The carry from an all-ones mantissa
    // propagates into the exponent field, which is exactly IEEE behavior.
    let shift = F32_MANT_BITS - info.nmant;
    let mut out = bits;
    if shift > 0 {
        let mask = (1u32 << shift) - 1;
        let rem = bits & mask;
        let half = 1u32 << (shift - 1);
        out = bits & !mask;
        if rem > half || (rem == half && (out >> shift) & 1 == 1) {
            out = out.wrapping_add(1u32 << shift);
        }
    }

    // Past the target's exponent range: overflow to a signed infinity.
    let out_exp = i32::try_from((out >> F32_MANT_BITS) & F32_EXP_MASK).unwrap_or(0) - F32_EXP_BIAS;
    if out_exp > emax {
        return f32::from_bits(sign | F32_INF_BITS);
    }
    f32::from_bits(out)
}

#[cfg(test)]
#[path = "precision_tests.rs"]
mod tests;
