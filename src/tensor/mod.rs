//! Dense row-major tensor type.
//!
//! This is the value type every operation in the crate works on. Values
//! are stored as f32 regardless of the declared [`DType`]: the declared
//! type records the *nominal* precision of the data, which may be lower
//! than what the storage carries (see [`crate::precision`]).
//!
//! Gradient tracking and in-place training machinery are deliberately
//! absent; these tensors are read-only inputs and outputs of pure forward
//! computations.

use std::fmt;

use crate::dtype::DType;
use crate::error::{CapasError, Result};

/// A dense tensor with a shape, a declared dtype, and f32 storage.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    /// Underlying data storage, row-major
    data: Vec<f32>,

    /// Shape of the tensor
    shape: Vec<usize>,

    /// Declared element type
    dtype: DType,
}

impl Tensor {
    /// Create a new tensor from a slice with the given shape.
    ///
    /// The dtype defaults to [`DType::F32`].
    ///
    /// # Panics
    ///
    /// Panics if the data length doesn't match the product of shape dimensions.
    #[must_use]
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        let expected_len: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected_len,
            "Data length {} doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            expected_len
        );

        Self {
            data: data.to_vec(),
            shape: shape.to_vec(),
            dtype: DType::F32,
        }
    }

    /// Create a tensor from a 1D slice (vector).
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self::new(data, &[data.len()])
    }

    /// Create a tensor filled with zeros.
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product();
        Self::new(&vec![0.0; len], shape)
    }

    /// Create a tensor filled with ones.
    #[must_use]
    pub fn ones(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product();
        Self::new(&vec![1.0; len], shape)
    }

    /// Create a tensor filled with a constant value.
    #[must_use]
    pub fn full(shape: &[usize], value: f32) -> Self {
        let len: usize = shape.iter().product();
        Self::new(&vec![value; len], shape)
    }

    /// Create a zero tensor with the same shape and dtype as another.
    #[must_use]
    pub fn zeros_like(other: &Tensor) -> Self {
        Self::zeros(other.shape()).with_dtype(other.dtype())
    }

    /// Re-tag the tensor with a declared dtype.
    ///
    /// Storage is untouched; only the nominal precision changes. Use
    /// [`crate::precision::reduce_precision`] to actually round values
    /// down to the declared precision.
    #[must_use]
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Get the shape of the tensor.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get the total number of elements.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Get the declared dtype.
    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Get the underlying data as a slice.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Get the underlying data as a mutable slice.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Extract the single value of a one-element tensor.
    ///
    /// # Panics
    ///
    /// Panics if the tensor has more than one element.
    #[must_use]
    pub fn item(&self) -> f32 {
        assert_eq!(
            self.numel(),
            1,
            "item() requires a single-element tensor, got shape {:?}",
            self.shape
        );
        self.data[0]
    }

    /// Row-major strides for this tensor's shape.
    pub(crate) fn strides(&self) -> Vec<usize> {
        row_major_strides(&self.shape)
    }

    /// Apply a function to every element, keeping shape and dtype.
    #[must_use]
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Tensor {
        Tensor {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
            dtype: self.dtype,
        }
    }

    /// Multiply every element by a scalar.
    #[must_use]
    pub fn scale(&self, s: f32) -> Tensor {
        self.map(|x| x * s)
    }

    /// Add a scalar to every element.
    #[must_use]
    pub fn add_scalar(&self, s: f32) -> Tensor {
        self.map(|x| x + s)
    }

    /// Reinterpret the tensor with a new shape of equal element count.
    pub fn reshape(&self, shape: &[usize]) -> Result<Tensor> {
        let new_len: usize = shape.iter().product();
        if new_len != self.numel() {
            return Err(CapasError::ShapeMismatch {
                expected: format!("{:?} ({} elements)", self.shape, self.numel()),
                actual: format!("{shape:?} ({new_len} elements)"),
            });
        }
        Ok(Tensor {
            data: self.data.clone(),
            shape: shape.to_vec(),
            dtype: self.dtype,
        })
    }

    /// Mean of squared values along the last axis, keeping that axis as
    /// size 1 so the result broadcasts against the input.
    ///
    /// # Panics
    ///
    /// Panics if the tensor has no dimensions.
    #[must_use]
    pub fn mean_square_last_axis(&self) -> Tensor {
        assert!(
            self.ndim() >= 1,
            "mean_square_last_axis requires at least 1 dimension"
        );
        let d = self.shape[self.ndim() - 1];
        let rows: usize = self.shape[..self.ndim() - 1].iter().product();

        let mut out = Vec::with_capacity(rows);
        for r in 0..rows {
            let slice = &self.data[r * d..(r + 1) * d];
            let sum_sq: f32 = slice.iter().map(|&x| x * x).sum();
            out.push(sum_sq / d as f32);
        }

        let mut out_shape = self.shape.clone();
        out_shape[self.ndim() - 1] = 1;
        Tensor::new(&out, &out_shape).with_dtype(self.dtype)
    }

    /// Elementwise multiply with rank-equal broadcasting.
    ///
    /// Each axis pair must either match or have size 1 on one side.
    /// Ranks must be equal; callers that need rank promotion reshape
    /// explicitly first (no implicit rank broadcast).
    pub fn broadcast_mul(&self, other: &Tensor) -> Result<Tensor> {
        if self.ndim() != other.ndim() {
            return Err(CapasError::ShapeMismatch {
                expected: format!("rank {} to match {:?}", self.ndim(), self.shape),
                actual: format!("rank {} ({:?})", other.ndim(), other.shape),
            });
        }

        let mut out_shape = Vec::with_capacity(self.ndim());
        for (&a, &b) in self.shape.iter().zip(other.shape.iter()) {
            if a == b || b == 1 {
                out_shape.push(a);
            } else if a == 1 {
                out_shape.push(b);
            } else {
                return Err(CapasError::ShapeMismatch {
                    expected: format!("{:?}", self.shape),
                    actual: format!("{:?}", other.shape),
                });
            }
        }

        let a_strides = self.strides();
        let b_strides = other.strides();
        let out_strides = row_major_strides(&out_shape);
        let out_numel: usize = out_shape.iter().product();

        let mut data = vec![0.0; out_numel];
        for (flat, slot) in data.iter_mut().enumerate() {
            let mut a_off = 0;
            let mut b_off = 0;
            for k in 0..out_shape.len() {
                let idx = (flat / out_strides[k]) % out_shape[k];
                if self.shape[k] != 1 {
                    a_off += idx * a_strides[k];
                }
                if other.shape[k] != 1 {
                    b_off += idx * b_strides[k];
                }
            }
            *slot = self.data[a_off] * other.data[b_off];
        }

        Ok(Tensor {
            data,
            shape: out_shape,
            dtype: self.dtype.promote(other.dtype),
        })
    }
}

/// Row-major strides for a shape.
pub(crate) fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for k in (0..shape.len().saturating_sub(1)).rev() {
        strides[k] = strides[k + 1] * shape[k + 1].max(1);
    }
    strides
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("dtype", &self.dtype)
            .field("numel", &self.numel())
            .finish()
    }
}
