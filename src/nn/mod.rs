//! Neural network building blocks.
//!
//! Two leaf layers plus their supporting pieces:
//!
//! - [`Einsum`]: a named, shaped, lazily-materialized weight contracted
//!   against the input by a caller-supplied expression
//! - [`RMSNorm`]: root-mean-square normalization of the last axis with an
//!   optional learned per-channel scale
//! - [`functional`]: the canonical kernels the layers delegate to
//! - [`init`]: weight initializer functions
//!
//! Layers are transient configuration values; parameters live in an
//! externally owned [`ParamStore`](crate::store::ParamStore) injected
//! into every `apply` call. Both layers are pure at call time aside from
//! first-use parameter creation, so they are safe to invoke concurrently
//! over independent inputs sharing one set of weights.

mod contraction;
pub mod functional;
pub mod init;
mod normalization;

pub use contraction::Einsum;
pub use normalization::RMSNorm;
