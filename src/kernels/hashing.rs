//! Batched dot products, as used by feature-hashing style scorers: every row
//! of a batch is dotted with one shared weight vector and the row scores are
//! summed into a single total.

use ndarray::ArrayView2;

use crate::error::{empty_buffer, length_mismatch, Result};
use crate::kernels::dot::dot_with;
use crate::kernels::Backend;
use crate::simd::{preferred_width, ElementKind, SimdVector, WidthDescriptor};

/// Generic body: row scores accumulated in row order. Each row must be as
/// long as `weights`.
#[inline(always)]
pub(crate) fn batched_with<V: SimdVector>(rows: &[impl AsRef<[f32]>], weights: &[f32]) -> f32 {
    let mut total = 0.0;
    for row in rows {
        total += dot_with::<V>(row.as_ref(), weights);
    }
    total
}

fn check_batch(rows: &[impl AsRef<[f32]>], weights: &[f32]) -> Result<()> {
    if weights.is_empty() {
        return Err(empty_buffer("weights"));
    }
    for row in rows {
        let row = row.as_ref();
        if row.len() != weights.len() {
            return Err(length_mismatch(row.len(), weights.len()));
        }
    }
    Ok(())
}

/// Sum over `rows` of `dot(row, weights)` at the preferred width of this CPU.
/// An empty batch scores `0.0`.
///
/// # Errors
///
/// Returns an error if `weights` is empty or any row differs in length from
/// `weights`.
///
/// # Example
///
/// ```rust
/// use lanebench::batched_dot_product;
///
/// let rows: Vec<Vec<f32>> = vec![vec![1.0, 0.0, 2.0], vec![0.5, 1.0, 0.0]];
/// let weights = [2.0, 4.0, 1.0];
/// // (2 + 0 + 2) + (1 + 4 + 0)
/// assert_eq!(batched_dot_product(&rows, &weights).unwrap(), 9.0);
/// ```
pub fn batched_dot_product(rows: &[impl AsRef<[f32]>], weights: &[f32]) -> Result<f32> {
    batched_dot_product_with(preferred_width(ElementKind::Float), rows, weights)
}

/// Batched dot product computed one element at a time.
pub fn scalar_batched_dot_product(rows: &[impl AsRef<[f32]>], weights: &[f32]) -> Result<f32> {
    batched_dot_product_with(WidthDescriptor::scalar(ElementKind::Float), rows, weights)
}

/// Batched dot product at an explicit width.
///
/// # Errors
///
/// Same conditions as [`batched_dot_product`], plus
/// [`KernelError::UnsupportedWidth`](crate::KernelError::UnsupportedWidth)
/// when no backend implements `width`.
pub fn batched_dot_product_with(
    width: WidthDescriptor,
    rows: &[impl AsRef<[f32]>],
    weights: &[f32],
) -> Result<f32> {
    check_batch(rows, weights)?;
    let backend = Backend::select(width)?;
    tracing::trace!(rows = rows.len(), dim = weights.len(), %backend, "batched dot product");
    Ok(dispatch!(backend, hashing::batched_with(rows, weights)))
}

/// Batched dot product over the rows of a matrix.
pub fn batched_dot_product_matrix(rows: ArrayView2<'_, f32>, weights: &[f32]) -> Result<f32> {
    batched_dot_product_matrix_with(preferred_width(ElementKind::Float), rows, weights)
}

/// Batched dot product over the rows of a matrix at an explicit width.
///
/// Non-contiguous views are copied into standard layout first.
pub fn batched_dot_product_matrix_with(
    width: WidthDescriptor,
    rows: ArrayView2<'_, f32>,
    weights: &[f32],
) -> Result<f32> {
    if weights.is_empty() {
        return Err(empty_buffer("weights"));
    }
    if rows.ncols() != weights.len() {
        return Err(length_mismatch(rows.ncols(), weights.len()));
    }
    if rows.nrows() == 0 {
        return Ok(0.0);
    }

    let standard = rows.as_standard_layout();
    let data = standard
        .as_slice()
        .ok_or_else(|| crate::error::invalid_argument("matrix is not contiguous"))?;
    let batch: Vec<&[f32]> = data.chunks_exact(weights.len()).collect();
    batched_dot_product_with(width, &batch, weights)
}
