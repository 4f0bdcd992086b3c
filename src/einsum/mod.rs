//! Two-operand Einstein summation.
//!
//! Evaluates contraction expressions in the standard index-label notation:
//! each letter names an axis, letters shared between operands are matched,
//! and letters absent from the output are summed out. A single `...`
//! (ellipsis) per term stands for the batch axes, e.g. `"...d,dh->...h"`
//! applies a `(d, h)` weight to any number of leading batch dimensions.
//!
//! Axis sizes that disagree with the expression fail with
//! [`CapasError::ShapeMismatch`]; grammar violations fail with
//! [`CapasError::InvalidEquation`]. Accumulation is in f32 and the result
//! dtype follows [`DType::promote`](crate::dtype::DType::promote).

use std::collections::HashMap;

use crate::error::{CapasError, Result};
use crate::tensor::{row_major_strides, Tensor};

const ELLIPSIS: &str = "...";

/// One side of an equation term: labels split around an optional ellipsis.
struct TermSpec {
    before: Vec<char>,
    ellipsis: bool,
    after: Vec<char>,
}

impl TermSpec {
    fn explicit_rank(&self) -> usize {
        self.before.len() + self.after.len()
    }
}

fn invalid(eqn: &str, reason: impl Into<String>) -> CapasError {
    CapasError::InvalidEquation {
        eqn: eqn.to_string(),
        reason: reason.into(),
    }
}

fn parse_term(eqn: &str, term: &str) -> Result<TermSpec> {
    let (before_str, ellipsis, after_str) = match term.find(ELLIPSIS) {
        Some(pos) => {
            let after = &term[pos + ELLIPSIS.len()..];
            if after.contains(ELLIPSIS) {
                return Err(invalid(eqn, "more than one '...' in a term"));
            }
            (&term[..pos], true, after)
        }
        None => (term, false, ""),
    };

    let collect = |s: &str| -> Result<Vec<char>> {
        s.chars()
            .map(|c| {
                if c.is_ascii_alphabetic() {
                    Ok(c)
                } else {
                    Err(invalid(eqn, format!("unexpected character '{c}'")))
                }
            })
            .collect()
    };

    let spec = TermSpec {
        before: collect(before_str)?,
        ellipsis,
        after: collect(after_str)?,
    };

    let mut seen = Vec::new();
    for &c in spec.before.iter().chain(spec.after.iter()) {
        if seen.contains(&c) {
            return Err(invalid(eqn, format!("label '{c}' repeated within one term")));
        }
        seen.push(c);
    }

    Ok(spec)
}

/// Maps labels and batch axes of both operands onto a flat slot space.
struct Binder {
    /// Size of each slot
    sizes: Vec<usize>,
    /// Slot id per label
    label_slot: HashMap<char, usize>,
    /// Slot ids of the batch axes, in order
    batch_slots: Vec<usize>,
}

impl Binder {
    fn new() -> Self {
        Self {
            sizes: Vec::new(),
            label_slot: HashMap::new(),
            batch_slots: Vec::new(),
        }
    }

    fn bind_label(&mut self, eqn: &str, label: char, size: usize) -> Result<usize> {
        if let Some(&slot) = self.label_slot.get(&label) {
            if self.sizes[slot] != size {
                return Err(CapasError::ShapeMismatch {
                    expected: format!("axis '{label}' of size {} (from '{eqn}')", self.sizes[slot]),
                    actual: format!("{size}"),
                });
            }
            return Ok(slot);
        }
        let slot = self.sizes.len();
        self.sizes.push(size);
        self.label_slot.insert(label, slot);
        Ok(slot)
    }

    /// Bind one operand's axes, returning the slot id of each axis in order.
    fn bind_operand(&mut self, eqn: &str, spec: &TermSpec, shape: &[usize]) -> Result<Vec<usize>> {
        let explicit = spec.explicit_rank();

        let batch_rank = if spec.ellipsis {
            if shape.len() < explicit {
                return Err(CapasError::ShapeMismatch {
                    expected: format!("rank >= {explicit} (from '{eqn}')"),
                    actual: format!("rank {} ({shape:?})", shape.len()),
                });
            }
            shape.len() - explicit
        } else {
            if shape.len() != explicit {
                return Err(CapasError::ShapeMismatch {
                    expected: format!("rank {explicit} (from '{eqn}')"),
                    actual: format!("rank {} ({shape:?})", shape.len()),
                });
            }
            0
        };

        if spec.ellipsis {
            let batch_shape = &shape[spec.before.len()..spec.before.len() + batch_rank];
            if self.batch_slots.is_empty() {
                for &size in batch_shape {
                    self.batch_slots.push(self.sizes.len());
                    self.sizes.push(size);
                }
            } else {
                let bound: Vec<usize> =
                    self.batch_slots.iter().map(|&s| self.sizes[s]).collect();
                if bound.as_slice() != batch_shape {
                    return Err(CapasError::ShapeMismatch {
                        expected: format!("batch shape {bound:?} (from '{eqn}')"),
                        actual: format!("{batch_shape:?}"),
                    });
                }
            }
        }

        let mut axis_slots = Vec::with_capacity(shape.len());
        for (i, &label) in spec.before.iter().enumerate() {
            axis_slots.push(self.bind_label(eqn, label, shape[i])?);
        }
        if spec.ellipsis {
            axis_slots.extend_from_slice(&self.batch_slots);
        }
        let tail_start = shape.len() - spec.after.len();
        for (i, &label) in spec.after.iter().enumerate() {
            axis_slots.push(self.bind_label(eqn, label, shape[tail_start + i])?);
        }

        Ok(axis_slots)
    }
}

/// Per-slot stride contribution of one operand.
fn slot_strides(n_slots: usize, axis_slots: &[usize], shape: &[usize]) -> Vec<usize> {
    let axis_strides = row_major_strides(shape);
    let mut strides = vec![0usize; n_slots];
    for (axis, &slot) in axis_slots.iter().enumerate() {
        strides[slot] = axis_strides[axis];
    }
    strides
}

/// Contract two tensors according to an einsum expression.
///
/// # Example
///
/// ```
/// use capas::einsum::einsum;
/// use capas::tensor::Tensor;
///
/// let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
/// let b = Tensor::new(&[1.0, 0.0, 0.0, 1.0], &[2, 2]);
/// let c = einsum("ij,jk->ik", &a, &b).unwrap();
/// assert_eq!(c.data(), a.data());
/// ```
pub fn einsum(eqn: &str, a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let cleaned: String = eqn.chars().filter(|c| !c.is_whitespace()).collect();

    let (lhs, out_str) = cleaned
        .split_once("->")
        .ok_or_else(|| invalid(eqn, "missing '->'"))?;
    let operand_strs: Vec<&str> = lhs.split(',').collect();
    if operand_strs.len() != 2 {
        return Err(invalid(
            eqn,
            format!("expected exactly two operands, got {}", operand_strs.len()),
        ));
    }

    let spec_a = parse_term(eqn, operand_strs[0])?;
    let spec_b = parse_term(eqn, operand_strs[1])?;
    let spec_out = parse_term(eqn, out_str)?;

    let mut binder = Binder::new();
    let a_axis_slots = binder.bind_operand(eqn, &spec_a, a.shape())?;
    let b_axis_slots = binder.bind_operand(eqn, &spec_b, b.shape())?;

    // Output slots, in output-axis order.
    let mut out_slots = Vec::new();
    for &label in &spec_out.before {
        let slot = binder
            .label_slot
            .get(&label)
            .copied()
            .ok_or_else(|| invalid(eqn, format!("output label '{label}' not in inputs")))?;
        out_slots.push(slot);
    }
    if spec_out.ellipsis {
        out_slots.extend_from_slice(&binder.batch_slots);
    }
    for &label in &spec_out.after {
        let slot = binder
            .label_slot
            .get(&label)
            .copied()
            .ok_or_else(|| invalid(eqn, format!("output label '{label}' not in inputs")))?;
        out_slots.push(slot);
    }

    // Everything not in the output gets summed over.
    let sum_slots: Vec<usize> = (0..binder.sizes.len())
        .filter(|s| !out_slots.contains(s))
        .collect();

    let n_slots = binder.sizes.len();
    let a_strides = slot_strides(n_slots, &a_axis_slots, a.shape());
    let b_strides = slot_strides(n_slots, &b_axis_slots, b.shape());

    let out_shape: Vec<usize> = out_slots.iter().map(|&s| binder.sizes[s]).collect();
    let sum_shape: Vec<usize> = sum_slots.iter().map(|&s| binder.sizes[s]).collect();
    let out_numel: usize = out_shape.iter().product();
    let sum_numel: usize = sum_shape.iter().product();
    let out_strides = row_major_strides(&out_shape);
    let sum_strides = row_major_strides(&sum_shape);

    let a_data = a.data();
    let b_data = b.data();
    let mut out = vec![0.0f32; out_numel];
    for (flat, slot) in out.iter_mut().enumerate() {
        let mut a_base = 0;
        let mut b_base = 0;
        for k in 0..out_slots.len() {
            let idx = (flat / out_strides[k]) % out_shape[k];
            a_base += idx * a_strides[out_slots[k]];
            b_base += idx * b_strides[out_slots[k]];
        }

        let mut acc = 0.0f32;
        for s in 0..sum_numel {
            let mut a_off = a_base;
            let mut b_off = b_base;
            for k in 0..sum_slots.len() {
                let idx = (s / sum_strides[k]) % sum_shape[k];
                a_off += idx * a_strides[sum_slots[k]];
                b_off += idx * b_strides[sum_slots[k]];
            }
            acc += a_data[a_off] * b_data[b_off];
        }
        *slot = acc;
    }

    Ok(Tensor::new(&out, &out_shape).with_dtype(a.dtype().promote(b.dtype())))
}
