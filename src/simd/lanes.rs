//! Portable array-backed vectors.
//!
//! `Lanes<N>` stores `N` lanes in a plain `[f32; N]` and implements every
//! primitive lane by lane. The loops are fixed-length, so the compiler maps
//! them onto whatever vector unit the target enables (SSE2 and NEON at
//! baseline). `Lanes<1>` doubles as the scalar backend.

use std::ops::{Add, Mul};

use crate::simd::SimdVector;

/// `N` packed `f32` lanes backed by an array.
///
/// # Usage
///
/// ```rust
/// use lanebench::simd::{Lanes, SimdVector};
///
/// let data = [1.0f32, 4.0, 9.0, 16.0];
/// let v = Lanes::<4>::load_slice(&data);
/// assert_eq!(v.sqrt().to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
/// assert_eq!(v.reduce_sum(), 30.0);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Lanes<const N: usize>(pub [f32; N]);

impl<const N: usize> Add for Lanes<N> {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Lanes(std::array::from_fn(|i| self.0[i] + rhs.0[i]))
    }
}

impl<const N: usize> Mul for Lanes<N> {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        Lanes(std::array::from_fn(|i| self.0[i] * rhs.0[i]))
    }
}

impl<const N: usize> SimdVector for Lanes<N> {
    const LANES: usize = N;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        Lanes([value; N])
    }

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        Lanes(ptr.cast::<[f32; N]>().read_unaligned())
    }

    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        ptr.cast::<[f32; N]>().write_unaligned(self.0)
    }

    #[inline(always)]
    fn fmadd(self, b: Self, c: Self) -> Self {
        Lanes(std::array::from_fn(|i| self.0[i].mul_add(b.0[i], c.0[i])))
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        Lanes(self.0.map(f32::sqrt))
    }

    #[inline(always)]
    fn sin(self) -> Self {
        Lanes(self.0.map(f32::sin))
    }

    #[inline(always)]
    fn reduce_sum(self) -> f32 {
        self.0.iter().fold(0.0, |acc, &x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splat_and_zero() {
        assert_eq!(Lanes::<4>::splat(2.5).0, [2.5; 4]);
        assert_eq!(Lanes::<8>::zero().0, [0.0; 8]);
    }

    #[test]
    fn test_load_store_unaligned() {
        let data = [0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0];
        // offset by one element so the read is not 16-byte aligned
        let v = unsafe { Lanes::<4>::load(data.as_ptr().add(1)) };
        assert_eq!(v.0, [1.0, 2.0, 3.0, 4.0]);

        let mut out = [0.0f32; 6];
        unsafe { v.store(out.as_mut_ptr().add(2)) };
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_arithmetic() {
        let a = Lanes([1.0, 2.0, 3.0, 4.0]);
        let b = Lanes([5.0, 6.0, 7.0, 8.0]);
        assert_eq!((a + b).0, [6.0, 8.0, 10.0, 12.0]);
        assert_eq!((a * b).0, [5.0, 12.0, 21.0, 32.0]);
        assert_eq!(a.fmadd(b, Lanes::splat(1.0)).0, [6.0, 13.0, 22.0, 33.0]);
    }

    #[test]
    fn test_unary_matches_scalar_methods() {
        let values = [0.1f32, 0.7, 1.3, 2.9];
        let v = Lanes(values);
        for (i, x) in values.iter().enumerate() {
            assert_eq!(v.sin().0[i], x.sin());
            assert_eq!(v.sqrt().0[i], x.sqrt());
        }
    }

    #[test]
    fn test_reduce_sum() {
        assert_eq!(Lanes([1.0, 2.0, 3.0, 4.0]).reduce_sum(), 10.0);
        assert_eq!(Lanes([7.5]).reduce_sum(), 7.5);
    }

    #[test]
    #[should_panic(expected = "shorter than 8 lanes")]
    fn test_load_slice_too_short() {
        let _ = Lanes::<8>::load_slice(&[1.0, 2.0, 3.0]);
    }
}
