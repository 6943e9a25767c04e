//! SAXPY: `out[i] = scale * a[i] + b[i]`, one fused multiply-add per element.

use crate::error::{check_pair, length_mismatch, Result};
use crate::kernels::Backend;
use crate::simd::{drive, preferred_width, ElementKind, LaneKernel, SimdVector, WidthDescriptor};

struct SaxpyKernel<'a, V> {
    a: &'a [f32],
    b: &'a [f32],
    scale: f32,
    scale_lanes: V,
    out: &'a mut [f32],
}

impl<V: SimdVector> LaneKernel<V> for SaxpyKernel<'_, V> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.a.len()
    }

    #[inline(always)]
    unsafe fn block(&mut self, offset: usize) {
        let va = V::load(self.a.as_ptr().add(offset));
        let vb = V::load(self.b.as_ptr().add(offset));
        va.fmadd(self.scale_lanes, vb)
            .store(self.out.as_mut_ptr().add(offset));
    }

    #[inline(always)]
    fn element(&mut self, index: usize) {
        self.out[index] = self.a[index].mul_add(self.scale, self.b[index]);
    }
}

#[inline(always)]
pub(crate) fn saxpy_body_with<V: SimdVector>(a: &[f32], b: &[f32], scale: f32, out: &mut [f32]) {
    debug_assert_eq!(a.len(), b.len(), "Vectors must be the same length");
    debug_assert_eq!(a.len(), out.len(), "Output must match the inputs");

    let mut kernel = SaxpyKernel {
        a,
        b,
        scale,
        scale_lanes: V::splat(scale),
        out,
    };
    drive::<V, _>(&mut kernel);
}

/// `scale * a + b` at the preferred width of this CPU.
///
/// # Errors
///
/// Returns an error if either buffer is empty or their lengths differ.
///
/// # Example
///
/// ```rust
/// use lanebench::saxpy;
///
/// let out = saxpy(2.0, &[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0]).unwrap();
/// assert_eq!(out, vec![12.0, 24.0, 36.0]);
/// ```
pub fn saxpy(scale: f32, a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    saxpy_with(preferred_width(ElementKind::Float), scale, a, b)
}

/// `scale * a + b` computed one element at a time.
pub fn scalar_saxpy(scale: f32, a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    saxpy_with(WidthDescriptor::scalar(ElementKind::Float), scale, a, b)
}

/// `scale * a + b` at an explicit width, into a new buffer.
pub fn saxpy_with(width: WidthDescriptor, scale: f32, a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    let mut out = vec![0.0; a.len()];
    saxpy_into_with(width, scale, a, b, &mut out)?;
    Ok(out)
}

/// `scale * a + b` into `out`. `out` must be as long as the inputs.
pub fn saxpy_into(scale: f32, a: &[f32], b: &[f32], out: &mut [f32]) -> Result<()> {
    saxpy_into_with(preferred_width(ElementKind::Float), scale, a, b, out)
}

/// `scale * a + b` at an explicit width, into `out`.
///
/// # Errors
///
/// Returns an error if either input is empty, the inputs differ in length,
/// `out` is not as long as the inputs, or no backend implements `width`.
pub fn saxpy_into_with(
    width: WidthDescriptor,
    scale: f32,
    a: &[f32],
    b: &[f32],
    out: &mut [f32],
) -> Result<()> {
    check_pair(a, b)?;
    if out.len() != a.len() {
        return Err(length_mismatch(a.len(), out.len()));
    }
    let backend = Backend::select(width)?;
    dispatch!(backend, saxpy::saxpy_body_with(a, b, scale, out));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::test_data::all_widths;

    #[test]
    fn test_bitwise_equal_across_widths() {
        let a: Vec<f32> = (0..77).map(|i| (i as f32 * 0.3).sin()).collect();
        let b: Vec<f32> = (0..77).map(|i| (i as f32 * 0.7).cos()).collect();
        let expected: Vec<f32> = a.iter().zip(&b).map(|(x, y)| x.mul_add(1.75, *y)).collect();

        for width in all_widths() {
            assert_eq!(saxpy_with(width, 1.75, &a, &b).unwrap(), expected, "{width}");
        }
    }

    #[test]
    fn test_zero_scale_copies_b() {
        let b = [1.0, -2.0, 3.5, 4.0, 5.0];
        assert_eq!(saxpy(0.0, &[9.0; 5], &b).unwrap(), b.to_vec());
        assert_eq!(scalar_saxpy(0.0, &[9.0; 5], &b).unwrap(), b.to_vec());
    }

    #[test]
    fn test_into_rejects_short_output() {
        let mut out = [0.0; 4];
        assert_eq!(
            saxpy_into(1.0, &[1.0; 5], &[1.0; 5], &mut out),
            Err(length_mismatch(5, 4))
        );
    }
}
