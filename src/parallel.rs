//! Multi-core kernel variants.
//!
//! A parallel call follows three explicit steps:
//!
//! 1. **partition**: [`partition`] splits `[0, len)` into `cores` contiguous,
//!    non-overlapping ranges of `ceil(len / cores)` elements (trailing ranges
//!    may be empty).
//! 2. **execute**: one rayon task per partition runs the generic kernel on the
//!    partition's own sub-slices. The body/tail split is therefore computed
//!    from `end - start`, so no vector load or store ever crosses a partition
//!    boundary.
//! 3. **join**: element-wise kernels write disjoint `&mut` output chunks and
//!    need no merge. Reduction kernels collect one partial result per
//!    partition, in partition order, and sum them in the calling thread once
//!    every task has finished.
//!
//! ```text
//! len = 10, cores = 3, chunk = 4
//! [0 1 2 3] [4 5 6 7] [8 9]
//! ```

use std::ops::Range;

use rayon::prelude::*;

use crate::error::{check_pair, empty_buffer, invalid_argument, length_mismatch, Result};
use crate::kernels::cosine::{self, CosineSums};
use crate::kernels::{dispatch, Backend};
use crate::simd::{preferred_width, ElementKind, WidthDescriptor};

/// A contiguous index range `[start, end)` processed by one execution unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub start: usize,
    pub end: usize,
}

impl Partition {
    /// Number of indices in the partition.
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// `true` for the trailing partitions left over when `cores > len`.
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The partition as a slice range.
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Largest core count accepted by [`partition`].
pub const MAX_CORES: usize = 1 << 16;

/// Splits `[0, len)` into exactly `cores` partitions of `ceil(len / cores)`
/// elements each, the last non-empty one possibly shorter.
///
/// # Errors
///
/// Returns [`KernelError::InvalidArgument`](crate::KernelError::InvalidArgument)
/// if `cores` is zero or above [`MAX_CORES`].
///
/// # Example
///
/// ```rust
/// use lanebench::parallel::{partition, Partition};
///
/// let parts = partition(10, 3).unwrap();
/// assert_eq!(
///     parts,
///     vec![
///         Partition { start: 0, end: 4 },
///         Partition { start: 4, end: 8 },
///         Partition { start: 8, end: 10 },
///     ]
/// );
/// ```
pub fn partition(len: usize, cores: usize) -> Result<Vec<Partition>> {
    if cores == 0 {
        return Err(invalid_argument("core count must be positive"));
    }
    if cores > MAX_CORES {
        return Err(invalid_argument(format!(
            "core count {cores} exceeds the maximum of {MAX_CORES}"
        )));
    }

    let chunk = len.div_ceil(cores);
    Ok((0..cores)
        .map(|core| {
            let start = len.min(core * chunk);
            let end = len.min(start + chunk);
            Partition { start, end }
        })
        .collect())
}

/// Number of worker threads in the current rayon pool.
pub fn available_cores() -> usize {
    rayon::current_num_threads().max(1)
}

/// Splits `out` into one disjoint mutable chunk per partition.
fn split_mut<'a>(mut out: &'a mut [f32], parts: &[Partition]) -> Vec<&'a mut [f32]> {
    let mut chunks = Vec::with_capacity(parts.len());
    for part in parts {
        let (head, rest) = out.split_at_mut(part.len());
        chunks.push(head);
        out = rest;
    }
    chunks
}

fn check_output(a: &[f32], out: &[f32]) -> Result<()> {
    if out.len() != a.len() {
        return Err(length_mismatch(a.len(), out.len()));
    }
    Ok(())
}

/// Dot product split across every core of the rayon pool.
///
/// # Errors
///
/// Same conditions as [`dot_product`](crate::dot_product).
pub fn par_dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    par_dot_product_with(preferred_width(ElementKind::Float), available_cores(), a, b)
}

/// Dot product at an explicit width over `cores` partitions.
///
/// # Errors
///
/// Returns an error if either buffer is empty, their lengths differ, no
/// backend implements `width`, or [`partition`] rejects `cores`.
pub fn par_dot_product_with(
    width: WidthDescriptor,
    cores: usize,
    a: &[f32],
    b: &[f32],
) -> Result<f32> {
    check_pair(a, b)?;
    let backend = Backend::select(width)?;
    let parts = partition(a.len(), cores)?;
    tracing::debug!(len = a.len(), cores, %backend, "parallel dot product");

    let partials: Vec<f32> = parts
        .par_iter()
        .with_max_len(1)
        .map(|part| {
            let range = part.range();
            dispatch!(backend, dot::dot_with(&a[range.clone()], &b[range]))
        })
        .collect();

    Ok(partials.into_iter().fold(0.0, |total, partial| total + partial))
}

/// Cosine similarity with the three sums accumulated per core and merged
/// before the division.
pub fn par_cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    par_cosine_similarity_with(preferred_width(ElementKind::Float), available_cores(), a, b)
}

/// Cosine similarity at an explicit width over `cores` partitions. Each
/// partition's sums are rescanned in `f64` on their own when out of `f32`
/// range.
pub fn par_cosine_similarity_with(
    width: WidthDescriptor,
    cores: usize,
    a: &[f32],
    b: &[f32],
) -> Result<f32> {
    check_pair(a, b)?;
    let backend = Backend::select(width)?;
    let parts = partition(a.len(), cores)?;
    tracing::debug!(len = a.len(), cores, %backend, "parallel cosine similarity");

    let partials: Vec<CosineSums> = parts
        .par_iter()
        .with_max_len(1)
        .map(|part| {
            let (a, b) = (&a[part.range()], &b[part.range()]);
            let sums = dispatch!(backend, cosine::cosine_sums_with(a, b));
            cosine::rescan_if_needed(sums, a, b)
        })
        .collect();

    Ok(partials
        .into_iter()
        .fold(CosineSums::default(), CosineSums::merge)
        .similarity())
}

/// Element-wise transform with each core writing its own output chunk.
pub fn par_elementwise_transform(a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    par_elementwise_transform_with(preferred_width(ElementKind::Float), available_cores(), a, b)
}

/// Element-wise transform at an explicit width over `cores` partitions.
pub fn par_elementwise_transform_with(
    width: WidthDescriptor,
    cores: usize,
    a: &[f32],
    b: &[f32],
) -> Result<Vec<f32>> {
    let mut out = vec![0.0; a.len()];
    par_elementwise_transform_into_with(width, cores, a, b, &mut out)?;
    Ok(out)
}

/// Element-wise transform into `out`, split across every core of the pool.
pub fn par_elementwise_transform_into(a: &[f32], b: &[f32], out: &mut [f32]) -> Result<()> {
    par_elementwise_transform_into_with(
        preferred_width(ElementKind::Float),
        available_cores(),
        a,
        b,
        out,
    )
}

/// Element-wise transform into `out` at an explicit width over `cores`
/// partitions.
///
/// # Errors
///
/// Returns an error if either input is empty, the inputs differ in length,
/// `out` is not as long as the inputs, no backend implements `width`, or
/// [`partition`] rejects `cores`.
pub fn par_elementwise_transform_into_with(
    width: WidthDescriptor,
    cores: usize,
    a: &[f32],
    b: &[f32],
    out: &mut [f32],
) -> Result<()> {
    check_pair(a, b)?;
    check_output(a, out)?;
    let backend = Backend::select(width)?;
    let parts = partition(a.len(), cores)?;
    tracing::debug!(len = a.len(), cores, %backend, "parallel elementwise transform");

    let chunks = split_mut(out, &parts);
    parts
        .into_par_iter()
        .zip(chunks)
        .with_max_len(1)
        .for_each(|(part, chunk)| {
            let range = part.range();
            dispatch!(
                backend,
                transform::transform_into_with(&a[range.clone()], &b[range], chunk)
            )
        });
    Ok(())
}

/// SAXPY with each core writing its own output chunk.
pub fn par_saxpy(scale: f32, a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    par_saxpy_with(preferred_width(ElementKind::Float), available_cores(), scale, a, b)
}

/// SAXPY at an explicit width over `cores` partitions.
pub fn par_saxpy_with(
    width: WidthDescriptor,
    cores: usize,
    scale: f32,
    a: &[f32],
    b: &[f32],
) -> Result<Vec<f32>> {
    check_pair(a, b)?;
    let backend = Backend::select(width)?;
    let parts = partition(a.len(), cores)?;
    tracing::debug!(len = a.len(), cores, %backend, "parallel saxpy");

    let mut out = vec![0.0; a.len()];
    let chunks = split_mut(&mut out, &parts);
    parts
        .into_par_iter()
        .zip(chunks)
        .with_max_len(1)
        .for_each(|(part, chunk)| {
            let range = part.range();
            dispatch!(
                backend,
                saxpy::saxpy_body_with(&a[range.clone()], &b[range], scale, chunk)
            )
        });
    Ok(out)
}

/// Root product with each core writing its own output chunk.
pub fn par_root_product(a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    par_root_product_with(preferred_width(ElementKind::Float), available_cores(), a, b)
}

/// Root product at an explicit width over `cores` partitions.
pub fn par_root_product_with(
    width: WidthDescriptor,
    cores: usize,
    a: &[f32],
    b: &[f32],
) -> Result<Vec<f32>> {
    check_pair(a, b)?;
    let backend = Backend::select(width)?;
    let parts = partition(a.len(), cores)?;
    tracing::debug!(len = a.len(), cores, %backend, "parallel root product");

    let mut out = vec![0.0; a.len()];
    let chunks = split_mut(&mut out, &parts);
    parts
        .into_par_iter()
        .zip(chunks)
        .with_max_len(1)
        .for_each(|(part, chunk)| {
            let range = part.range();
            dispatch!(
                backend,
                root_product::root_product_body_with(&a[range.clone()], &b[range], chunk)
            )
        });
    Ok(out)
}

/// Batched dot product with the rows partitioned across cores.
///
/// Partial batch scores are summed in row-partition order, so the result only
/// depends on `cores`, never on thread scheduling.
pub fn par_batched_dot_product(rows: &[impl AsRef<[f32]> + Sync], weights: &[f32]) -> Result<f32> {
    par_batched_dot_product_with(
        preferred_width(ElementKind::Float),
        available_cores(),
        rows,
        weights,
    )
}

/// Batched dot product at an explicit width with the rows split over `cores`
/// partitions.
pub fn par_batched_dot_product_with(
    width: WidthDescriptor,
    cores: usize,
    rows: &[impl AsRef<[f32]> + Sync],
    weights: &[f32],
) -> Result<f32> {
    if weights.is_empty() {
        return Err(empty_buffer("weights"));
    }
    if let Some(row) = rows.iter().map(AsRef::as_ref).find(|row| row.len() != weights.len()) {
        return Err(length_mismatch(row.len(), weights.len()));
    }
    let backend = Backend::select(width)?;
    let parts = partition(rows.len(), cores)?;
    tracing::debug!(rows = rows.len(), cores, %backend, "parallel batched dot product");

    let partials: Vec<f32> = parts
        .par_iter()
        .with_max_len(1)
        .map(|part| dispatch!(backend, hashing::batched_with(&rows[part.range()], weights)))
        .collect();

    Ok(partials.into_iter().fold(0.0, |total, partial| total + partial))
}
