//! Dot product: `sum(a[i] * b[i])`.
//!
//! The vector body multiplies and adds into one lane accumulator, which is
//! reduced once at the end of the body; the scalar tail is then added to that
//! sum element by element.

use crate::error::{check_pair, Result};
use crate::kernels::Backend;
use crate::simd::{drive, preferred_width, ElementKind, LaneKernel, SimdVector, WidthDescriptor};

struct DotKernel<'a, V> {
    a: &'a [f32],
    b: &'a [f32],
    acc: V,
    sum: f32,
}

impl<V: SimdVector> LaneKernel<V> for DotKernel<'_, V> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.a.len()
    }

    #[inline(always)]
    unsafe fn block(&mut self, offset: usize) {
        let va = V::load(self.a.as_ptr().add(offset));
        let vb = V::load(self.b.as_ptr().add(offset));
        self.acc = self.acc + va * vb;
    }

    #[inline(always)]
    fn end_body(&mut self) {
        self.sum = self.acc.reduce_sum();
    }

    #[inline(always)]
    fn element(&mut self, index: usize) {
        self.sum += self.a[index] * self.b[index];
    }
}

/// Generic dot product body. `a` and `b` must have equal lengths.
#[inline(always)]
pub(crate) fn dot_with<V: SimdVector>(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must be the same length");

    let mut kernel = DotKernel {
        a,
        b,
        acc: V::zero(),
        sum: 0.0,
    };
    drive::<V, _>(&mut kernel);
    kernel.sum
}

/// Dot product at the preferred width of this CPU.
///
/// # Errors
///
/// Returns an error if either buffer is empty or their lengths differ.
///
/// # Example
///
/// ```rust
/// use lanebench::dot_product;
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [5.0, 4.0, 3.0, 2.0, 1.0];
/// assert_eq!(dot_product(&a, &b).unwrap(), 35.0);
/// ```
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    dot_product_with(preferred_width(ElementKind::Float), a, b)
}

/// Dot product computed one element at a time.
pub fn scalar_dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    dot_product_with(WidthDescriptor::scalar(ElementKind::Float), a, b)
}

/// Dot product at an explicit width.
///
/// # Errors
///
/// Returns an error if either buffer is empty, their lengths differ, or no
/// backend implements `width`.
pub fn dot_product_with(width: WidthDescriptor, a: &[f32], b: &[f32]) -> Result<f32> {
    check_pair(a, b)?;
    let backend = Backend::select(width)?;
    Ok(dispatch!(backend, dot::dot_with(a, b)))
}
