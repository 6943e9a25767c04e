//! AVX2+FMA instantiations of the generic kernel bodies.
//!
//! Each function is compiled with `avx2,fma` enabled so the `F32x8`
//! intrinsics inline into the body loop.
//!
//! # Safety
//!
//! Callers must have confirmed AVX2 and FMA support at runtime.

use crate::kernels::cosine::{self, CosineSums};
use crate::kernels::{dot, hashing, root_product, saxpy, transform};
use crate::simd::avx2::f32x8::F32x8;

#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn dot_with(a: &[f32], b: &[f32]) -> f32 {
    dot::dot_with::<F32x8>(a, b)
}

#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn cosine_sums_with(a: &[f32], b: &[f32]) -> CosineSums {
    cosine::cosine_sums_with::<F32x8>(a, b)
}

#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn transform_into_with(a: &[f32], b: &[f32], out: &mut [f32]) {
    transform::transform_into_with::<F32x8>(a, b, out)
}

#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn saxpy_body_with(a: &[f32], b: &[f32], scale: f32, out: &mut [f32]) {
    saxpy::saxpy_body_with::<F32x8>(a, b, scale, out)
}

#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn root_product_body_with(a: &[f32], b: &[f32], out: &mut [f32]) {
    root_product::root_product_body_with::<F32x8>(a, b, out)
}

#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn batched_with(rows: &[impl AsRef<[f32]>], weights: &[f32]) -> f32 {
    hashing::batched_with::<F32x8>(rows, weights)
}
