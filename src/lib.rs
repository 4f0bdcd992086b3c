//! Capas: parameterized tensor-contraction and RMS normalization layers
//! in pure Rust.
//!
//! Two transformer building blocks with an externally injected parameter
//! store, so weight naming, shapes, and dtypes stay compatible with
//! saved checkpoints:
//!
//! - [`nn::Einsum`] contracts an input against a named, shaped,
//!   lazily-materialized weight using an einsum expression
//! - [`nn::RMSNorm`] normalizes the last axis by its root-mean-square
//!   value, with an optional learned per-channel scale and an optional
//!   precision guard
//!
//! # Quick Start
//!
//! ```
//! use capas::prelude::*;
//!
//! let mut store = ParamStore::with_seed(42);
//!
//! // Project (batch, 4) inputs to (batch, 8)
//! let proj = Einsum::new(&[4, 8]);
//! let x = Tensor::ones(&[2, 4]);
//! let h = proj.apply("...d,dh->...h", &x, &mut store).unwrap();
//! assert_eq!(h.shape(), &[2, 8]);
//!
//! // Normalize the projection
//! let norm = RMSNorm::new();
//! let y = norm.apply(&h, &mut store).unwrap();
//! assert_eq!(y.shape(), h.shape());
//!
//! // Both parameters were created lazily, under their contract names
//! assert_eq!(store.names(), vec!["scale", "w"]);
//! ```
//!
//! # Modules
//!
//! - [`tensor`]: dense row-major tensor with a declared dtype
//! - [`dtype`]: element types and their exponent/mantissa descriptors
//! - [`einsum`]: two-operand Einstein summation
//! - [`store`]: named parameter storage with write-once materialization
//! - [`nn`]: the layers, their kernels, and initializers
//! - [`precision`]: rounding tensors to their declared precision
//! - [`error`]: error types
//!
//! # Design
//!
//! Everything is a pure forward computation: no gradients, no training
//! loop, no device management. Shape disagreements are contract
//! violations surfaced immediately as [`error::CapasError`]; there are
//! no retries and no recoverable-error paths.

pub mod dtype;
pub mod einsum;
pub mod error;
pub mod nn;
pub mod precision;
pub mod prelude;
pub mod store;
pub mod tensor;
