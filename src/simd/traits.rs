//! Kernel primitives shared by every vector backend.

use std::ops::{Add, Mul};

/// A fixed-width vector of `f32` lanes.
///
/// Kernels are written once against this trait and instantiated for every
/// backend. A backend with `LANES == 1` is the scalar form of the same kernel.
///
/// Lane-wise results of [`sqrt`](SimdVector::sqrt), [`sin`](SimdVector::sin)
/// and [`fmadd`](SimdVector::fmadd) must equal the corresponding `f32`
/// methods applied to each lane, so that vector bodies and scalar tails
/// agree exactly on element-wise kernels.
pub trait SimdVector: Copy + Send + Sync + Add<Output = Self> + Mul<Output = Self> {
    /// Number of `f32` lanes.
    const LANES: usize;

    /// Broadcasts `value` to every lane.
    fn splat(value: f32) -> Self;

    /// All lanes set to `0.0`.
    #[inline(always)]
    fn zero() -> Self {
        Self::splat(0.0)
    }

    /// Reads `LANES` contiguous values starting at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `LANES` consecutive `f32` values. No
    /// alignment is required. Callers establish this through the loop bound
    /// of [`tail::drive`](crate::simd::tail::drive), not through a check here.
    unsafe fn load(ptr: *const f32) -> Self;

    /// Writes all lanes to `LANES` contiguous values starting at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of `LANES` consecutive `f32` values. No
    /// alignment is required.
    unsafe fn store(self, ptr: *mut f32);

    /// Fused multiply-add: `self * b + c` with a single rounding per lane.
    fn fmadd(self, b: Self, c: Self) -> Self;

    /// Lane-wise square root.
    fn sqrt(self) -> Self;

    /// Lane-wise sine (radians).
    fn sin(self) -> Self;

    /// Horizontal sum of all lanes, lane 0 first.
    fn reduce_sum(self) -> f32;

    /// Loads the first `LANES` elements of `slice`.
    ///
    /// # Panics
    ///
    /// Panics if `slice` holds fewer than `LANES` elements.
    #[inline(always)]
    fn load_slice(slice: &[f32]) -> Self {
        assert!(
            slice.len() >= Self::LANES,
            "slice of {} elements is shorter than {} lanes",
            slice.len(),
            Self::LANES
        );
        // SAFETY: the slice holds at least LANES elements.
        unsafe { Self::load(slice.as_ptr()) }
    }

    /// Stores all lanes into the first `LANES` elements of `slice`.
    ///
    /// # Panics
    ///
    /// Panics if `slice` holds fewer than `LANES` elements.
    #[inline(always)]
    fn store_slice(self, slice: &mut [f32]) {
        assert!(
            slice.len() >= Self::LANES,
            "slice of {} elements is shorter than {} lanes",
            slice.len(),
            Self::LANES
        );
        // SAFETY: the slice holds at least LANES elements.
        unsafe { self.store(slice.as_mut_ptr()) }
    }

    /// Copies the lanes into a freshly allocated vector.
    fn to_vec(self) -> Vec<f32> {
        let mut out = vec![0.0; Self::LANES];
        self.store_slice(&mut out);
        out
    }
}
