//! AVX2 SIMD implementations for 256-bit vector operations.
//!
//! This module contains the vector backend built on Intel's Advanced Vector
//! Extensions 2 (AVX2) and FMA instruction sets. AVX2 is available on most
//! Intel processors since Haswell (2013) and AMD processors since Excavator (2015).
//!
//! # Runtime Detection
//!
//! The module is compiled on every x86/x86_64 target, but its types are only
//! used after [`has_avx2_fma`](crate::simd::width::has_avx2_fma) confirmed the
//! CPU supports both extensions. The kernels that use it are compiled with
//! `#[target_feature(enable = "avx2,fma")]` so the intrinsics inline.
//!
//! # Available Types
//!
//! - [`f32x8::F32x8`]: 256-bit vector containing 8 packed single-precision values

pub(crate) mod f32x8;
