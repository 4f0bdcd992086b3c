//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use capas::prelude::*;
//! ```

pub use crate::dtype::DType;
pub use crate::einsum::einsum;
pub use crate::error::{CapasError, Result};
pub use crate::nn::{Einsum, RMSNorm};
pub use crate::precision::reduce_precision;
pub use crate::store::ParamStore;
pub use crate::tensor::Tensor;
