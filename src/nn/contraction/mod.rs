//! Parameterized tensor contraction.
//!
//! [`Einsum`] wraps a named, shaped, lazily-materialized weight tensor
//! and contracts an input against it with a caller-supplied einsum
//! expression. The weight lives in an externally owned [`ParamStore`],
//! keyed by name, so saved weights load back under the same contract.

use crate::dtype::DType;
use crate::einsum::einsum;
use crate::error::Result;
use crate::nn::init::{normal_init, Initializer};
use crate::store::ParamStore;
use crate::tensor::Tensor;

/// Convenience layer for parameterized tensor multiplication.
///
/// The contraction expression is an argument of the call, not of the
/// config, so one weight can serve differently shaped batch inputs.
///
/// # Example
///
/// ```
/// use capas::nn::Einsum;
/// use capas::store::ParamStore;
/// use capas::tensor::Tensor;
///
/// let mut store = ParamStore::with_seed(0);
/// let proj = Einsum::new(&[4, 8]);
/// let x = Tensor::ones(&[2, 4]);
/// let y = proj.apply("...d,dh->...h", &x, &mut store).unwrap();
/// assert_eq!(y.shape(), &[2, 8]);
/// ```
#[derive(Debug, Clone)]
pub struct Einsum {
    /// Shape of the weight tensor
    shape: Vec<usize>,

    /// Parameter name in the store
    weight_name: String,

    /// Weight initializer, run on first use only
    initializer: Initializer,

    /// Weight dtype; `None` follows the input's dtype
    dtype: Option<DType>,

    /// Scalar applied to the weight on every call
    w_scale: Option<f32>,
}

impl Einsum {
    /// Create a contraction over a weight of the given shape.
    ///
    /// Defaults: parameter name `"w"`, small-variance normal
    /// initializer, dtype following the input, no weight scale.
    ///
    /// # Panics
    ///
    /// Panics if `shape` is empty.
    #[must_use]
    pub fn new(shape: &[usize]) -> Self {
        assert!(!shape.is_empty(), "weight shape must be non-empty");
        Self {
            shape: shape.to_vec(),
            weight_name: "w".to_string(),
            initializer: normal_init,
            dtype: None,
            w_scale: None,
        }
    }

    /// Override the parameter name used in the store.
    #[must_use]
    pub fn with_weight_name(mut self, name: impl Into<String>) -> Self {
        self.weight_name = name.into();
        self
    }

    /// Override the weight initializer.
    #[must_use]
    pub fn with_initializer(mut self, init: Initializer) -> Self {
        self.initializer = init;
        self
    }

    /// Pin the weight dtype instead of following the input's.
    ///
    /// Mixed-dtype contractions follow
    /// [`DType::promote`](crate::dtype::DType::promote).
    #[must_use]
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    /// Multiply every weight element by a constant before contracting.
    ///
    /// The scale is a runtime constant reapplied on every call, never
    /// baked into the stored weight, so checkpoints stay scale-free.
    /// A zero scale is treated as unset, matching the falsy-check
    /// convention of the weight-compatibility contract.
    #[must_use]
    pub fn with_scale(mut self, w_scale: f32) -> Self {
        self.w_scale = Some(w_scale);
        self
    }

    /// The configured weight shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The parameter name in the store.
    #[must_use]
    pub fn weight_name(&self) -> &str {
        &self.weight_name
    }

    /// Contract `x` against the weight according to `eqn`.
    ///
    /// The weight is created in `store` on first use and reused on every
    /// later call under the same name. Shape incompatibilities between
    /// the expression, the input, and the weight fail with
    /// [`ShapeMismatch`](crate::error::CapasError::ShapeMismatch).
    pub fn apply(&self, eqn: &str, x: &Tensor, store: &mut ParamStore) -> Result<Tensor> {
        let dtype = self.dtype.unwrap_or_else(|| x.dtype());
        let w = store.get_or_create(&self.weight_name, &self.shape, dtype, self.initializer)?;
        let w = match self.w_scale {
            Some(s) if s != 0.0 => w.scale(s),
            _ => w.clone(),
        };
        einsum(eqn, x, &w)
    }
}
