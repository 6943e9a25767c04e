//! Vector primitives: width detection, backends and the body/tail driver.

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) mod avx2;

pub mod lanes;
pub mod tail;
pub mod traits;
pub mod width;

pub use lanes::Lanes;
pub use tail::{drive, loop_bound, LaneKernel, TailSplit};
pub use traits::SimdVector;
pub use width::{
    preferred_width, simd_level, standard_widths, ElementKind, SimdLevel, WidthDescriptor,
};
