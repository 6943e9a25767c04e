//! # lanebench
//!
//! Scalar vs SIMD vs parallel-SIMD micro-benchmarks of elementary `f32`
//! kernels.
//!
//! Every kernel (dot product, cosine similarity, the fused
//! `sqrt(sin(a * b))` transform, the root product, batched dot products and
//! SAXPY) is written once against [`simd::SimdVector`] and runs at any
//! supported lane width:
//!
//! - **Scalar**: `Lanes<1>`, the same body one element at a time
//! - **Portable**: `Lanes<2>`, `Lanes<4>`, `Lanes<8>`, `Lanes<16>`
//! - **AVX2+FMA**: 256-bit intrinsics, selected at runtime on x86/x86_64
//!
//! Full vector blocks cover `[0, loop_bound)`; the remaining `len % lanes`
//! elements are handled by the same kernel's scalar step (see [`simd::tail`]).
//! The [`parallel`] module partitions buffers across cores with the same
//! guarantee per partition, and [`bench`] times the variants against each
//! other.
//!
//! ## Quick start
//!
//! ```rust
//! use lanebench::{dot_product, scalar_dot_product, parallel::par_dot_product};
//!
//! let a: Vec<f32> = (0..1000).map(|i| i as f32 / 8.0).collect();
//! let b = vec![0.5f32; 1000];
//!
//! let scalar = scalar_dot_product(&a, &b)?;
//! let simd = dot_product(&a, &b)?;
//! let parallel = par_dot_product(&a, &b)?;
//!
//! assert_eq!(scalar, simd);
//! assert_eq!(scalar, parallel);
//! # Ok::<(), lanebench::KernelError>(())
//! ```
//!
//! ## Width selection
//!
//! [`preferred_width`] detects the widest usable register once per process.
//! Setting `LANEBENCH_FORCE_LANES` caps the lane count, e.g. `1` forces the
//! scalar path everywhere. Any kernel can also be called at an explicit width
//! through its `*_with` variant.

pub mod bench;
pub mod error;
pub mod kernels;
pub mod parallel;
pub mod simd;

pub use bench::{benchmark, speedup, Comparison, Harness, HarnessConfig, TimingSample};
pub use error::{KernelError, Result};
pub use kernels::{
    batched_dot_product, batched_dot_product_matrix, batched_dot_product_matrix_with,
    batched_dot_product_with, cosine_similarity, cosine_similarity_with, dot_product,
    dot_product_with, elementwise_transform, elementwise_transform_into,
    elementwise_transform_into_with, elementwise_transform_with, rank_by_similarity,
    rank_by_similarity_with, root_product, root_product_element, root_product_into,
    root_product_into_with, root_product_with, saxpy, saxpy_into, saxpy_into_with, saxpy_with,
    scalar_batched_dot_product, scalar_cosine_similarity, scalar_dot_product,
    scalar_elementwise_transform, scalar_root_product, scalar_saxpy, transform_element,
    within_tolerance, Backend, Ranked, DEFAULT_TOLERANCE,
};
pub use simd::{preferred_width, simd_level, ElementKind, SimdLevel, WidthDescriptor};
