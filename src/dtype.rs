//! Numeric element types and their runtime descriptors.
//!
//! Tensors carry a declared [`DType`] tag while holding values in f32
//! storage, the wider internal representation that the precision guard in
//! [`crate::precision`] exists to round away. The descriptor table here is
//! the single source of truth for exponent/mantissa bit widths; nothing
//! else in the crate hardcodes a float format.

use serde::{Deserialize, Serialize};

/// Declared element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    /// IEEE 754 binary16 (half precision)
    F16,
    /// bfloat16 (truncated binary32)
    Bf16,
    /// IEEE 754 binary32 (single precision)
    F32,
    /// 32-bit signed integer
    I32,
}

/// Exponent/mantissa bit widths of a floating-point format.
///
/// Mirrors `finfo`-style introspection: `nmant` counts explicit mantissa
/// bits (the implicit leading one is excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatInfo {
    /// Number of exponent bits
    pub nexp: u32,
    /// Number of explicit mantissa bits
    pub nmant: u32,
}

impl DType {
    /// Look up the exponent/mantissa widths for this dtype.
    ///
    /// Returns `None` for non-floating-point types.
    #[must_use]
    pub fn float_info(self) -> Option<FloatInfo> {
        match self {
            DType::F16 => Some(FloatInfo { nexp: 5, nmant: 10 }),
            DType::Bf16 => Some(FloatInfo { nexp: 8, nmant: 7 }),
            DType::F32 => Some(FloatInfo { nexp: 8, nmant: 23 }),
            DType::I32 => None,
        }
    }

    /// Whether this is a floating-point type.
    #[must_use]
    pub fn is_float(self) -> bool {
        self.float_info().is_some()
    }

    /// Standard type promotion for mixed-dtype arithmetic.
    ///
    /// Equal types promote to themselves; any f32 operand promotes the
    /// result to f32; f16 mixed with bf16 has no common 16-bit format and
    /// promotes to f32; integers promote to the float operand's type.
    #[must_use]
    pub fn promote(self, other: DType) -> DType {
        match (self, other) {
            (a, b) if a == b => a,
            (DType::I32, x) | (x, DType::I32) => x,
            (DType::F32, _) | (_, DType::F32) => DType::F32,
            // F16 x Bf16
            _ => DType::F32,
        }
    }
}
