//! Cosine similarity: `dot(a, b) / (‖a‖ · ‖b‖)`.
//!
//! The three sums are accumulated in a single pass over both inputs; the
//! square roots and the division happen once, after the tail, in `f64`.
//!
//! The vector body sums in `f32` lanes. When its norms fall outside
//! `[NORM_FLOOR, f32::MAX]` the lane sums may have underflowed or overflowed,
//! and the sums are recomputed element by element in `f64`.

use crate::error::{check_pair, Result};
use crate::kernels::Backend;
use crate::simd::{drive, preferred_width, ElementKind, LaneKernel, SimdVector, WidthDescriptor};

/// Smallest norm trusted from the `f32` lane sums.
const NORM_FLOOR: f64 = 1e-30;

/// The three running sums of a cosine similarity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CosineSums {
    pub(crate) dot: f64,
    pub(crate) norm_a: f64,
    pub(crate) norm_b: f64,
}

impl CosineSums {
    /// Adds the sums of another, disjoint range.
    pub(crate) fn merge(self, other: Self) -> Self {
        Self {
            dot: self.dot + other.dot,
            norm_a: self.norm_a + other.norm_a,
            norm_b: self.norm_b + other.norm_b,
        }
    }

    /// Whether `f32` lane sums of this magnitude can be trusted.
    fn is_well_scaled(self) -> bool {
        let in_range = |norm: f64| (NORM_FLOOR..=f64::from(f32::MAX)).contains(&norm);
        in_range(self.norm_a) && in_range(self.norm_b) && self.dot.is_finite()
    }

    /// Similarity of the accumulated sums; `0.0` when either vector has zero
    /// magnitude.
    pub(crate) fn similarity(self) -> f32 {
        if self.norm_a == 0.0 || self.norm_b == 0.0 {
            return 0.0;
        }
        (self.dot / (self.norm_a.sqrt() * self.norm_b.sqrt())) as f32
    }
}

/// Sums accumulated one element at a time in `f64`. Every product of two
/// `f32` values is exact in `f64`.
fn wide_sums(a: &[f32], b: &[f32]) -> CosineSums {
    a.iter()
        .zip(b)
        .fold(CosineSums::default(), |sums, (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            CosineSums {
                dot: sums.dot + x * y,
                norm_a: sums.norm_a + x * x,
                norm_b: sums.norm_b + y * y,
            }
        })
}

/// Returns `sums` of `a` and `b`, recomputed in `f64` if the vector body
/// left the range where its `f32` lane sums are exact enough.
pub(crate) fn rescan_if_needed(sums: CosineSums, a: &[f32], b: &[f32]) -> CosineSums {
    if sums.is_well_scaled() {
        return sums;
    }
    tracing::trace!(len = a.len(), ?sums, "cosine sums out of f32 range, rescanning in f64");
    wide_sums(a, b)
}

struct CosineKernel<'a, V> {
    a: &'a [f32],
    b: &'a [f32],
    dot: V,
    norm_a: V,
    norm_b: V,
    sums: CosineSums,
}

impl<V: SimdVector> LaneKernel<V> for CosineKernel<'_, V> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.a.len()
    }

    #[inline(always)]
    unsafe fn block(&mut self, offset: usize) {
        let va = V::load(self.a.as_ptr().add(offset));
        let vb = V::load(self.b.as_ptr().add(offset));
        self.dot = self.dot + va * vb;
        self.norm_a = self.norm_a + va * va;
        self.norm_b = self.norm_b + vb * vb;
    }

    #[inline(always)]
    fn end_body(&mut self) {
        self.sums = CosineSums {
            dot: f64::from(self.dot.reduce_sum()),
            norm_a: f64::from(self.norm_a.reduce_sum()),
            norm_b: f64::from(self.norm_b.reduce_sum()),
        };
    }

    #[inline(always)]
    fn element(&mut self, index: usize) {
        let (x, y) = (f64::from(self.a[index]), f64::from(self.b[index]));
        self.sums.dot += x * y;
        self.sums.norm_a += x * x;
        self.sums.norm_b += y * y;
    }
}

/// Generic body returning the raw sums, so partitions can be merged before
/// the final division.
#[inline(always)]
pub(crate) fn cosine_sums_with<V: SimdVector>(a: &[f32], b: &[f32]) -> CosineSums {
    debug_assert_eq!(a.len(), b.len(), "Vectors must be the same length");

    let mut kernel = CosineKernel {
        a,
        b,
        dot: V::zero(),
        norm_a: V::zero(),
        norm_b: V::zero(),
        sums: CosineSums::default(),
    };
    drive::<V, _>(&mut kernel);
    kernel.sums
}

/// Cosine similarity at the preferred width of this CPU.
///
/// Returns `0.0` when either vector has zero magnitude.
///
/// # Errors
///
/// Returns an error if either buffer is empty or their lengths differ.
///
/// # Example
///
/// ```rust
/// use lanebench::cosine_similarity;
///
/// let similarity = cosine_similarity(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
/// assert!((similarity - 0.974_631_8).abs() < 1e-6);
///
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    cosine_similarity_with(preferred_width(ElementKind::Float), a, b)
}

/// Cosine similarity computed one element at a time.
pub fn scalar_cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    cosine_similarity_with(WidthDescriptor::scalar(ElementKind::Float), a, b)
}

/// Cosine similarity at an explicit width.
///
/// # Errors
///
/// Returns an error if either buffer is empty, their lengths differ, or no
/// backend implements `width`.
pub fn cosine_similarity_with(width: WidthDescriptor, a: &[f32], b: &[f32]) -> Result<f32> {
    check_pair(a, b)?;
    let backend = Backend::select(width)?;
    let sums = dispatch!(backend, cosine::cosine_sums_with(a, b));
    Ok(rescan_if_needed(sums, a, b).similarity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::length_mismatch;
    use crate::kernels::test_data::{all_widths, dyadic};
    use crate::kernels::{within_tolerance, DEFAULT_TOLERANCE};
    use crate::simd::Lanes;

    #[test]
    fn test_known_value() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [5.0, 4.0, 3.0, 2.0, 1.0];
        // 35 / 55
        for width in all_widths() {
            let similarity = cosine_similarity_with(width, &a, &b).unwrap();
            assert!((similarity - 0.636_363_6).abs() < 1e-6, "{width}: {similarity}");
        }
    }

    #[test]
    fn test_zero_magnitude() {
        let zero = [0.0, 0.0, 0.0];
        let b = [1.0, 2.0, 3.0];
        for width in all_widths() {
            assert_eq!(cosine_similarity_with(width, &zero, &b).unwrap(), 0.0);
            assert_eq!(cosine_similarity_with(width, &b, &zero).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_parallel_and_opposite() {
        let a = [1.0, -2.0, 0.5, 4.0, 3.0, 1.0, -1.0, 2.0, 7.0];
        let doubled: Vec<f32> = a.iter().map(|x| x * 2.0).collect();
        let negated: Vec<f32> = a.iter().map(|x| -x).collect();

        assert!((cosine_similarity(&a, &doubled).unwrap() - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&a, &negated).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sums_are_exact_across_widths() {
        for len in 1..50 {
            let a = dyadic(len, 3);
            let b = dyadic(len, 5);
            let expected = cosine_sums_with::<Lanes<1>>(&a, &b);
            assert_eq!(cosine_sums_with::<Lanes<4>>(&a, &b), expected, "len {len}");
            assert_eq!(cosine_sums_with::<Lanes<8>>(&a, &b), expected, "len {len}");
            assert_eq!(cosine_sums_with::<Lanes<16>>(&a, &b), expected, "len {len}");
        }
    }

    #[test]
    fn test_vector_agrees_with_scalar() {
        let a: Vec<f32> = (0..1003).map(|i| (i as f32 * 0.37).cos()).collect();
        let b: Vec<f32> = (0..1003).map(|i| (i as f32 * 0.11).sin()).collect();
        let scalar = scalar_cosine_similarity(&a, &b).unwrap();
        let vector = cosine_similarity(&a, &b).unwrap();
        assert!(within_tolerance(vector, scalar, DEFAULT_TOLERANCE));
    }

    #[test]
    fn test_merge() {
        let a = dyadic(20, 1);
        let b = dyadic(20, 2);
        let whole = cosine_sums_with::<Lanes<4>>(&a, &b);
        let split = cosine_sums_with::<Lanes<4>>(&a[..9], &b[..9])
            .merge(cosine_sums_with::<Lanes<4>>(&a[9..], &b[9..]));
        assert_eq!(whole, split);
    }

    #[test]
    fn test_extreme_magnitudes() {
        // squares underflow (1e-46) or overflow (1e40) in f32
        for value in [1e-23f32, 1e20, -3e-25, 2e25] {
            for len in [8, 9, 35] {
                let a = vec![value; len];
                let doubled: Vec<f32> = a.iter().map(|x| x * 2.0).collect();
                for width in all_widths() {
                    let own = cosine_similarity_with(width, &a, &a).unwrap();
                    assert!((own - 1.0).abs() < 1e-6, "{width} {value:e} x{len}: {own}");
                    let scaled = cosine_similarity_with(width, &a, &doubled).unwrap();
                    assert!((scaled - 1.0).abs() < 1e-6, "{width} {value:e} x{len}: {scaled}");
                }
            }
        }
    }

    #[test]
    fn test_mixed_tiny_and_unit_vectors() {
        let tiny = [1e-23f32, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let unit = [1.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let orthogonal = [0.0f32, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        for width in all_widths() {
            let similarity = cosine_similarity_with(width, &tiny, &unit).unwrap();
            assert!((similarity - 1.0).abs() < 1e-6, "{width}: {similarity}");
            assert_eq!(cosine_similarity_with(width, &tiny, &orthogonal).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_well_scaled_sums_skip_rescan() {
        let a = dyadic(40, 2);
        let b = dyadic(40, 7);
        let sums = cosine_sums_with::<Lanes<8>>(&a, &b);
        assert!(sums.is_well_scaled());
        assert_eq!(rescan_if_needed(sums, &a, &b), sums);

        let tiny = [1e-23f32; 8];
        let sums = cosine_sums_with::<Lanes<8>>(&tiny, &tiny);
        assert_eq!(sums.norm_a, 0.0);
        assert!(rescan_if_needed(sums, &tiny, &tiny).norm_a > 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            cosine_similarity(&[1.0; 4], &[1.0; 5]),
            Err(length_mismatch(4, 5))
        );
    }
}
