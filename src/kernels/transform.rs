//! Element-wise transform: `out[i] = sqrt(sin(a[i] * b[i]))`.
//!
//! Negative sines produce NaN, in the body and in the tail alike. Every lane
//! operation of the vector backends is the correctly rounded `f32` operation,
//! so vector and scalar outputs are bitwise identical.

use crate::error::{check_pair, length_mismatch, Result};
use crate::kernels::Backend;
use crate::simd::{drive, preferred_width, ElementKind, LaneKernel, SimdVector, WidthDescriptor};

/// The transform applied to a single pair of elements.
#[inline(always)]
pub fn transform_element(x: f32, y: f32) -> f32 {
    (x * y).sin().sqrt()
}

struct TransformKernel<'a> {
    a: &'a [f32],
    b: &'a [f32],
    out: &'a mut [f32],
}

impl<V: SimdVector> LaneKernel<V> for TransformKernel<'_> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.a.len()
    }

    #[inline(always)]
    unsafe fn block(&mut self, offset: usize) {
        let va = V::load(self.a.as_ptr().add(offset));
        let vb = V::load(self.b.as_ptr().add(offset));
        (va * vb).sin().sqrt().store(self.out.as_mut_ptr().add(offset));
    }

    #[inline(always)]
    fn element(&mut self, index: usize) {
        self.out[index] = transform_element(self.a[index], self.b[index]);
    }
}

/// Generic body. All three slices must have equal lengths.
#[inline(always)]
pub(crate) fn transform_into_with<V: SimdVector>(a: &[f32], b: &[f32], out: &mut [f32]) {
    debug_assert_eq!(a.len(), b.len(), "Vectors must be the same length");
    debug_assert_eq!(a.len(), out.len(), "Output must match the inputs");

    let mut kernel = TransformKernel { a, b, out };
    drive::<V, _>(&mut kernel);
}

/// Element-wise transform at the preferred width of this CPU.
///
/// # Errors
///
/// Returns an error if either buffer is empty or their lengths differ.
///
/// # Example
///
/// ```rust
/// use lanebench::{elementwise_transform, transform_element};
///
/// let a = [0.5, 1.0, 2.0];
/// let b = [1.0, 1.0, -1.0];
/// let out = elementwise_transform(&a, &b).unwrap();
///
/// assert_eq!(out[0], transform_element(0.5, 1.0));
/// // sin(-2) is negative
/// assert!(out[2].is_nan());
/// ```
pub fn elementwise_transform(a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    elementwise_transform_with(preferred_width(ElementKind::Float), a, b)
}

/// Element-wise transform computed one element at a time.
pub fn scalar_elementwise_transform(a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
    elementwise_transform_with(WidthDescriptor::scalar(ElementKind::Float), a, b)
}

/// Element-wise transform at an explicit width, into a new buffer.
pub fn elementwise_transform_with(
    width: WidthDescriptor,
    a: &[f32],
    b: &[f32],
) -> Result<Vec<f32>> {
    let mut out = vec![0.0; a.len()];
    elementwise_transform_into_with(width, a, b, &mut out)?;
    Ok(out)
}

/// Element-wise transform at the preferred width, into `out`.
///
/// # Errors
///
/// Returns an error if either input is empty, the inputs differ in length, or
/// `out` is not as long as the inputs.
pub fn elementwise_transform_into(a: &[f32], b: &[f32], out: &mut [f32]) -> Result<()> {
    elementwise_transform_into_with(preferred_width(ElementKind::Float), a, b, out)
}

/// Element-wise transform at an explicit width, into `out`.
pub fn elementwise_transform_into_with(
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
    dispatch!(backend, transform::transform_into_with(a, b, out));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::empty_buffer;
    use crate::kernels::test_data::all_widths;

    fn inputs(len: usize) -> (Vec<f32>, Vec<f32>) {
        let a = (0..len).map(|i| (i as f32 * 0.173).sin() * 3.0).collect();
        let b = (0..len).map(|i| (i as f32 * 0.291).cos() * 2.0).collect();
        (a, b)
    }

    #[test]
    fn test_matches_per_element_transform() {
        for len in [1, 3, 7, 8, 9, 16, 17, 100, 1027] {
            let (a, b) = inputs(len);
            for width in all_widths() {
                let out = elementwise_transform_with(width, &a, &b).unwrap();
                assert_eq!(out.len(), len);
                for i in 0..len {
                    let expected = transform_element(a[i], b[i]);
                    assert!(
                        out[i] == expected || (out[i].is_nan() && expected.is_nan()),
                        "{width} index {i}: {} != {expected}",
                        out[i]
                    );
                }
            }
        }
    }

    #[test]
    fn test_negative_sine_is_nan_in_body_and_tail() {
        // sin(-1) < 0 at every index, with 9 elements one lands in the 8-lane tail
        let a = [1.0f32; 9];
        let b = [-1.0f32; 9];
        for width in all_widths() {
            let out = elementwise_transform_with(width, &a, &b).unwrap();
            assert!(out.iter().all(|x| x.is_nan()), "{width}");
        }
    }

    #[test]
    fn test_known_values() {
        let out = scalar_elementwise_transform(&[0.0, std::f32::consts::FRAC_PI_2], &[1.0, 1.0])
            .unwrap();
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_into_validates_output() {
        let mut out = vec![0.0; 2];
        assert_eq!(
            elementwise_transform_into(&[1.0; 3], &[1.0; 3], &mut out),
            Err(length_mismatch(3, 2))
        );
        assert_eq!(
            elementwise_transform_into(&[], &[], &mut out),
            Err(empty_buffer("a"))
        );

        let mut out = vec![-1.0; 3];
        elementwise_transform_into(&[0.0; 3], &[2.0; 3], &mut out).unwrap();
        assert_eq!(out, vec![0.0; 3]);
    }
}
