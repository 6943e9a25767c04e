//! Numeric kernels with one generic body per kernel.
//!
//! Every kernel is written once against [`SimdVector`](crate::simd::SimdVector)
//! and instantiated for each backend. Entry points come in three flavours:
//!
//! | Function               | Width used                                  |
//! |------------------------|---------------------------------------------|
//! | `xxx(..)`              | [`preferred_width`] of `f32` on this CPU    |
//! | `scalar_xxx(..)`       | one lane (the scalar form)                  |
//! | `xxx_with(width, ..)`  | the caller's [`WidthDescriptor`]            |
//!
//! The scalar form is not a separate implementation: it is the same body run
//! through `Lanes<1>`.
//!
//! # Backend selection
//!
//! | Lanes | Backend                                       |
//! |-------|-----------------------------------------------|
//! | 1     | `Lanes<1>` (scalar)                           |
//! | 2, 4  | `Lanes<2>`, `Lanes<4>`                        |
//! | 8     | `F32x8` when AVX2+FMA is detected, else `Lanes<8>` |
//! | 16    | `Lanes<16>`                                   |
//!
//! Any other lane count is rejected with
//! [`KernelError::UnsupportedWidth`](crate::KernelError::UnsupportedWidth).

use std::fmt;

use num::Float;

use crate::error::{KernelError, Result};
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use crate::simd::width::has_avx2_fma;
use crate::simd::{preferred_width, ElementKind, WidthDescriptor};

/// Relative tolerance within which scalar and vector results must agree.
pub const DEFAULT_TOLERANCE: f32 = 1e-5;

/// Returns `true` if `actual` is within `tolerance * max(1, |expected|)` of
/// `expected`. Two NaNs compare equal.
pub fn within_tolerance<T: Float>(actual: T, expected: T, tolerance: T) -> bool {
    if actual.is_nan() || expected.is_nan() {
        return actual.is_nan() && expected.is_nan();
    }
    (actual - expected).abs() <= tolerance * T::one().max(expected.abs())
}

/// The vector backend a kernel call runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// One lane: the scalar form of every kernel.
    Scalar,
    /// Portable 2-lane vectors.
    Lanes2,
    /// Portable 4-lane vectors (SSE2 / NEON width).
    Lanes4,
    /// Portable 8-lane vectors.
    Lanes8,
    /// AVX2+FMA intrinsics, 8 lanes.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    Avx2,
    /// Portable 16-lane vectors (AVX-512 width).
    Lanes16,
}

impl Backend {
    /// Picks the backend implementing `width`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnsupportedWidth`] for lane counts other than
    /// 1, 2, 4, 8 and 16.
    pub fn select(width: WidthDescriptor) -> Result<Self> {
        let backend = match width.lanes() {
            1 => Backend::Scalar,
            2 => Backend::Lanes2,
            4 => Backend::Lanes4,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            8 if has_avx2_fma() => Backend::Avx2,
            8 => Backend::Lanes8,
            16 => Backend::Lanes16,
            lanes => return Err(KernelError::UnsupportedWidth { lanes }),
        };
        tracing::trace!(%width, backend = backend.name(), "selected kernel backend");
        Ok(backend)
    }

    /// Backend for the preferred `f32` width of this CPU.
    pub fn preferred() -> Self {
        Self::select(preferred_width(ElementKind::Float)).unwrap_or(Backend::Scalar)
    }

    /// Every backend usable on this CPU, narrowest first.
    pub fn available() -> Vec<Self> {
        let mut backends = vec![
            Backend::Scalar,
            Backend::Lanes2,
            Backend::Lanes4,
            Backend::Lanes8,
        ];
        backends.extend(Self::intrinsics());
        backends.push(Backend::Lanes16);
        backends
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    fn intrinsics() -> Option<Self> {
        has_avx2_fma().then_some(Backend::Avx2)
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    fn intrinsics() -> Option<Self> {
        None
    }

    /// Lane count of the backend.
    pub const fn lanes(self) -> usize {
        match self {
            Backend::Scalar => 1,
            Backend::Lanes2 => 2,
            Backend::Lanes4 => 4,
            Backend::Lanes8 => 8,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Avx2 => 8,
            Backend::Lanes16 => 16,
        }
    }

    /// Short name used in logs and reports.
    pub const fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Lanes2 => "lanes2",
            Backend::Lanes4 => "lanes4",
            Backend::Lanes8 => "lanes8",
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            Backend::Avx2 => "avx2",
            Backend::Lanes16 => "lanes16",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} lanes)", self.name(), self.lanes())
    }
}

/// Calls the generic body `$kernel::$func` instantiated for `$backend`.
macro_rules! dispatch {
    ($backend:expr, $kernel:ident :: $func:ident ( $($arg:expr),* $(,)? )) => {
        match $backend {
            $crate::kernels::Backend::Scalar => {
                $crate::kernels::$kernel::$func::<$crate::simd::Lanes<1>>($($arg),*)
            }
            $crate::kernels::Backend::Lanes2 => {
                $crate::kernels::$kernel::$func::<$crate::simd::Lanes<2>>($($arg),*)
            }
            $crate::kernels::Backend::Lanes4 => {
                $crate::kernels::$kernel::$func::<$crate::simd::Lanes<4>>($($arg),*)
            }
            $crate::kernels::Backend::Lanes8 => {
                $crate::kernels::$kernel::$func::<$crate::simd::Lanes<8>>($($arg),*)
            }
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            $crate::kernels::Backend::Avx2 => {
                // SAFETY: `Backend::Avx2` is only selected after AVX2+FMA detection.
                unsafe { $crate::kernels::avx2::$func($($arg),*) }
            }
            $crate::kernels::Backend::Lanes16 => {
                $crate::kernels::$kernel::$func::<$crate::simd::Lanes<16>>($($arg),*)
            }
        }
    };
}

pub(crate) use dispatch;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) mod avx2;

pub mod cosine;
pub mod dot;
pub mod hashing;
pub mod rank;
pub mod root_product;
pub mod saxpy;
pub mod transform;

pub use cosine::{cosine_similarity, cosine_similarity_with, scalar_cosine_similarity};
pub use dot::{dot_product, dot_product_with, scalar_dot_product};
pub use hashing::{
    batched_dot_product, batched_dot_product_matrix, batched_dot_product_matrix_with,
    batched_dot_product_with, scalar_batched_dot_product,
};
pub use rank::{rank_by_similarity, rank_by_similarity_with, Ranked};
pub use root_product::{
    root_product, root_product_element, root_product_into, root_product_into_with,
    root_product_with, scalar_root_product,
};
pub use saxpy::{saxpy, saxpy_into, saxpy_into_with, saxpy_with, scalar_saxpy};
pub use transform::{
    elementwise_transform, elementwise_transform_into, elementwise_transform_into_with,
    elementwise_transform_with, scalar_elementwise_transform, transform_element,
};
