//! AVX2 8-lane f32 SIMD vector implementation.
//!
//! This module provides `F32x8`, a SIMD vector type that wraps Intel's AVX2 `__m256`
//! intrinsic to perform vectorized operations on 8 single-precision floating-point
//! values simultaneously using 256-bit AVX2 and FMA instructions.
//!
//! # Architecture Requirements
//!
//! - **CPU Support**: Intel processors with AVX2 + FMA support (Haswell and later)
//! - **Target Architecture**: x86_64 (and x86)
//! - **Runtime Detection**: values of this type are only created after
//!   [`has_avx2_fma`](crate::simd::width::has_avx2_fma) returned `true`
//!
//! # Supported Operations
//!
//! - `load()` / `store()`: unaligned 256-bit memory access
//! - `+`, `*`, `fmadd()`: `_mm256_add_ps`, `_mm256_mul_ps`, `_mm256_fmadd_ps`
//! - `sqrt()`: `_mm256_sqrt_ps` (correctly rounded, identical to `f32::sqrt`)
//! - `sin()`: evaluated per lane with `f32::sin`, identical to the scalar tail
//! - `reduce_sum()`: lanes summed in order 0..8

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, Mul};

use crate::simd::SimdVector;

/// Number of f32 elements that fit in an AVX2 256-bit vector.
pub(crate) const LANE_COUNT: usize = 8;

/// AVX2 SIMD vector containing 8 packed f32 values.
///
/// # Safety
///
/// Every method executes AVX2/FMA instructions. The kernel dispatcher only
/// instantiates kernels over `F32x8` after runtime feature detection, inside
/// functions compiled with `#[target_feature(enable = "avx2,fma")]`.
#[derive(Copy, Clone, Debug)]
pub(crate) struct F32x8 {
    /// AVX2 256-bit vector register containing 8 packed f32 values
    pub(crate) elements: __m256,
}

impl F32x8 {
    /// Spills the register into an array, lane 0 first.
    #[inline(always)]
    pub(crate) fn to_array(self) -> [f32; LANE_COUNT] {
        let mut out = [0.0f32; LANE_COUNT];
        // SAFETY: `out` holds exactly LANE_COUNT values.
        unsafe { _mm256_storeu_ps(out.as_mut_ptr(), self.elements) };
        out
    }

    /// Loads a register from an array, lane 0 first.
    #[inline(always)]
    pub(crate) fn from_array(values: [f32; LANE_COUNT]) -> Self {
        // SAFETY: `values` holds exactly LANE_COUNT values.
        unsafe { Self::load(values.as_ptr()) }
    }
}

impl Add for F32x8 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            elements: unsafe { _mm256_add_ps(self.elements, rhs.elements) },
        }
    }
}

impl Mul for F32x8 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            elements: unsafe { _mm256_mul_ps(self.elements, rhs.elements) },
        }
    }
}

impl SimdVector for F32x8 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        Self {
            elements: unsafe { _mm256_set1_ps(value) },
        }
    }

    #[inline(always)]
    fn zero() -> Self {
        Self {
            elements: unsafe { _mm256_setzero_ps() },
        }
    }

    /// Loads 8 values using `_mm256_loadu_ps`.
    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> Self {
        Self {
            elements: _mm256_loadu_ps(ptr),
        }
    }

    /// Stores 8 values using `_mm256_storeu_ps`.
    #[inline(always)]
    unsafe fn store(self, ptr: *mut f32) {
        _mm256_storeu_ps(ptr, self.elements)
    }

    /// Computes `self * b + c` with `_mm256_fmadd_ps`.
    #[inline(always)]
    fn fmadd(self, b: Self, c: Self) -> Self {
        Self {
            elements: unsafe { _mm256_fmadd_ps(self.elements, b.elements, c.elements) },
        }
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        Self {
            elements: unsafe { _mm256_sqrt_ps(self.elements) },
        }
    }

    #[inline(always)]
    fn sin(self) -> Self {
        Self::from_array(self.to_array().map(f32::sin))
    }

    #[inline(always)]
    fn reduce_sum(self) -> f32 {
        self.to_array().iter().fold(0.0, |acc, &x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::{width::has_avx2_fma, Lanes};

    #[test]
    fn test_matches_portable_lanes() {
        if !has_avx2_fma() {
            return;
        }

        let a = [1.5f32, -2.0, 3.25, 4.0, 0.5, 6.0, -7.5, 8.0];
        let b = [0.5f32, 1.0, -1.5, 2.0, 2.5, -3.0, 3.5, 4.0];

        let (va, vb) = (F32x8::load_slice(&a), F32x8::load_slice(&b));
        let (la, lb) = (Lanes::<8>::load_slice(&a), Lanes::<8>::load_slice(&b));

        assert_eq!((va + vb).to_array(), (la + lb).0);
        assert_eq!((va * vb).to_array(), (la * lb).0);
        assert_eq!(va.fmadd(vb, va).to_array(), la.fmadd(lb, la).0);
        assert_eq!((va * vb).sin().to_array(), (la * lb).sin().0);
        assert_eq!((va * va).sqrt().to_array(), (la * la).sqrt().0);
        assert_eq!(va.reduce_sum(), la.reduce_sum());
    }

    #[test]
    fn test_load_store_roundtrip_unaligned() {
        if !has_avx2_fma() {
            return;
        }

        let data: Vec<f32> = (0..9).map(|i| i as f32).collect();
        let v = unsafe { F32x8::load(data.as_ptr().add(1)) };
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);

        let mut out = vec![0.0f32; 9];
        unsafe { v.store(out.as_mut_ptr().add(1)) };
        assert_eq!(&out[1..], &data[1..]);
    }

    #[test]
    fn test_splat_zero() {
        if !has_avx2_fma() {
            return;
        }

        assert_eq!(F32x8::splat(3.0).to_array(), [3.0; 8]);
        assert_eq!(F32x8::zero().reduce_sum(), 0.0);
    }
}
