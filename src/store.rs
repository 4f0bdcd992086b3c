//! Named parameter storage with lazy, write-once materialization.
//!
//! Layers declare parameter shapes up front and only materialize them on
//! first use, via `get_or_create` against a store the caller owns and
//! injects. The store enforces the single-writer-many-reader discipline:
//! a name is created at most once, and every later request under that
//! name must agree on shape and dtype so saved weights stay loadable.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::dtype::DType;
use crate::error::{CapasError, Result};
use crate::nn::init::Initializer;
use crate::tensor::Tensor;

/// Owns the parameter tensors of a model graph.
///
/// # Example
///
/// ```
/// use capas::dtype::DType;
/// use capas::nn::init::zeros_init;
/// use capas::store::ParamStore;
///
/// let mut store = ParamStore::new();
/// let w = store
///     .get_or_create("w", &[4, 8], DType::F32, zeros_init)
///     .unwrap();
/// assert_eq!(w.shape(), &[4, 8]);
/// ```
#[derive(Debug, Default)]
pub struct ParamStore {
    params: HashMap<String, Tensor>,
    seed: Option<u64>,
}

impl ParamStore {
    /// Create an empty store. Initializers draw from entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose initializers are seeded for
    /// reproducibility.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            params: HashMap::new(),
            seed: Some(seed),
        }
    }

    /// Fetch a parameter by name, creating it on first use.
    ///
    /// On creation the initializer runs at the requested shape and the
    /// tensor is tagged with the requested dtype. On reuse the stored
    /// tensor is returned after verifying that the requested shape and
    /// dtype match what was stored; a disagreement is a
    /// [`CapasError::ShapeMismatch`], since it means two call sites (or a
    /// loaded checkpoint) disagree about the parameter contract.
    pub fn get_or_create(
        &mut self,
        name: &str,
        shape: &[usize],
        dtype: DType,
        init: Initializer,
    ) -> Result<&Tensor> {
        let seed = self.seed;
        let tensor = match self.params.entry(name.to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(init(shape, seed).with_dtype(dtype)),
        };

        if tensor.shape() != shape || tensor.dtype() != dtype {
            return Err(CapasError::ShapeMismatch {
                expected: format!("parameter '{name}' as {shape:?} {dtype:?}"),
                actual: format!("{:?} {:?}", tensor.shape(), tensor.dtype()),
            });
        }
        Ok(tensor)
    }

    /// Look up a parameter without creating it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.params.get(name)
    }

    /// Install a parameter value directly, replacing any existing one.
    ///
    /// Used for loading pretrained weights before the first forward call.
    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.params.insert(name.into(), tensor);
    }

    /// Whether a parameter with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Names of all stored parameters, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.params.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of stored parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
