//! Element-wise root product: `out[i] = sqrt(sqrt(a[i]) * sqrt(b[i]) + a[i] * b[i])`.
//!
//! A heavier arithmetic kernel than SAXPY: three square roots, two products and
//! one add per element, all correctly rounded lane operations, so every width
//! produces bitwise identical output. Negative inputs give NaN.

use crate::error::{check_pair, length_mismatch, Result};
use crate::kernels::Backend;
use crate::simd::{drive, preferred_width, ElementKind, LaneKernel, SimdVector, WidthDescriptor};

/// The root product of a single pair of elements.
#[inline(always)]
pub fn root_product_element(x: f32, y: f32) -> f32 {
    (x.sqrt() * y.sqrt() + x * y).sqrt()
}

struct RootProductKernel<'a> {
    a: &'a [f32],
    b: &'a [f32],
    out: &'a mut [f32],
}

impl<V: SimdVector> LaneKernel<V> for RootProductKernel<'_> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.a.len()
    }

    #[inline(always)]
    unsafe fn block(&mut self, offset: usize) {
        let va = V::load(self.a.as_ptr().add(offset));
        let vb = V::load(self.b.as_ptr().add(offset));
        (va.sqrt() * vb.sqrt() + va * vb)
            .sqrt()
            .store(self.out.as_mut_ptr().add(offset));
    }

    #[inline(always)]
    fn element(&mut self, index: usize) {
        self.out[index] = root_product_element(self.a[index], self.b[index]);
    }
}

#[inline(always)]
pub(crate) fn root_product_body_with<V: SimdVector>(a: &[f32], b: &[f32], out: &mut [f32]) {
    debug_assert_eq!(a.len(), b.len(), "Vectors must be the same length");
    debug_assert_eq!(a.len(), out.len(), "Output must match the inputs");

    let mut kernel = RootProductKernel { a, b, out };
    drive::<V, _>(&mut kernel);
}

/// Root product at the preferred width of this CPU.
///
/// # Errors
///
/// Returns an error if either buffer is empty or their lengths differ.
///
/// # Example
///
/// ```rust
/// use lanebench::root_product;
///
/// let out = root_product(&[4.0, 1.0, -1.0], &[9.0, 0.0, 1.0]).unwrap();
/// // sqrt(2 * 3 + 36), sqrt(0 + 0)
/// assert_eq!(out[0], 42.0f32.sqrt());
/// assert_eq!(out[1], 0.0);
/// assert!(out[2].is_nan());
/// ```
pub fn root_product(a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    root_product_with(preferred_width(ElementKind::Float), a, b)
}

/// Root product computed one element at a time.
pub fn scalar_root_product(a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    root_product_with(WidthDescriptor::scalar(ElementKind::Float), a, b)
}

/// Root product at an explicit width, into a new buffer.
pub fn root_product_with(width: WidthDescriptor, a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    let mut out = vec![0.0; a.len()];
    root_product_into_with(width, a, b, &mut out)?;
    Ok(out)
}

/// Root product at the preferred width, into `out`.
pub fn root_product_into(a: &[f32], b: &[f32], out: &mut [f32]) -> Result<()> {
    root_product_into_with(preferred_width(ElementKind::Float), a, b, out)
}

/// Root product at an explicit width, into `out`.
///
/// # Errors
///
/// Returns an error if either input is empty, the inputs differ in length,
/// `out` is not as long as the inputs, or no backend implements `width`.
pub fn root_product_into_with(
    width: WidthDescriptor,
    a: &[f32],
    b: &[f32],
    out: &mut [f32],
) -> Result<()> {
    check_pair(a, b)?;
    if out.len() != a.len() {
        return Err(length_mismatch(a.len(), out.len()));
    }
    let backend = Backend::select(width)?;
    dispatch!(backend, root_product::root_product_body_with(a, b, out));
    Ok(())
}
