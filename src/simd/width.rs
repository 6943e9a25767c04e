//! Preferred SIMD width detection.
//!
//! The widest vector register usable on the running CPU is detected once per
//! process and cached. Every kernel entry point that is not handed an explicit
//! [`WidthDescriptor`] asks [`preferred_width`] for one before computing any
//! loop bound.
//!
//! # Fallback
//!
//! When no vector capability is detected the descriptor has `lanes = 1`, which
//! routes every kernel through the same generic body instantiated at one lane.
//! This is the designed fallback and never an error.
//!
//! # Overriding
//!
//! Setting `LANEBENCH_FORCE_LANES` caps the preferred lane count (rounded down
//! to a power of two). `LANEBENCH_FORCE_LANES=1` forces the scalar path.

use std::fmt;
use std::sync::OnceLock;

use crate::error::{invalid_argument, Result};
use crate::simd::tail;

/// Environment variable capping the preferred lane count.
pub const FORCE_LANES_ENV: &str = "LANEBENCH_FORCE_LANES";

/// SIMD capability level detected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    /// AVX-512F, 512-bit registers (x86_64 only).
    Avx512,
    /// AVX2 + FMA, 256-bit registers (x86/x86_64 only).
    Avx2,
    /// SSE2, 128-bit registers (always present on x86_64).
    Sse2,
    /// NEON, 128-bit registers (always present on aarch64).
    Neon,
    /// No usable vector unit.
    Scalar,
}

impl SimdLevel {
    /// Register width in bits, `0` for [`SimdLevel::Scalar`].
    pub const fn register_bits(self) -> usize {
        match self {
            SimdLevel::Avx512 => 512,
            SimdLevel::Avx2 => 256,
            SimdLevel::Sse2 | SimdLevel::Neon => 128,
            SimdLevel::Scalar => 0,
        }
    }
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimdLevel::Avx512 => "AVX-512F",
            SimdLevel::Avx2 => "AVX2+FMA",
            SimdLevel::Sse2 => "SSE2",
            SimdLevel::Neon => "NEON",
            SimdLevel::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

static SIMD_LEVEL: OnceLock<SimdLevel> = OnceLock::new();
static FORCED_LANES: OnceLock<Option<usize>> = OnceLock::new();

#[allow(unreachable_code)]
fn detect_simd_level() -> SimdLevel {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx512f") {
            return SimdLevel::Avx512;
        }
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            return SimdLevel::Avx2;
        }
        return SimdLevel::Sse2;
    }

    #[cfg(target_arch = "x86")]
    {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            return SimdLevel::Avx2;
        }
        if is_x86_feature_detected!("sse2") {
            return SimdLevel::Sse2;
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        return SimdLevel::Neon;
    }

    SimdLevel::Scalar
}

/// Returns the cached SIMD capability level of the running CPU.
#[inline]
pub fn simd_level() -> SimdLevel {
    *SIMD_LEVEL.get_or_init(|| {
        let level = detect_simd_level();
        tracing::debug!(%level, register_bits = level.register_bits(), "detected SIMD level");
        level
    })
}

/// Returns `true` when the AVX2+FMA `F32x8` backend may be used.
#[inline]
pub fn has_avx2_fma() -> bool {
    avx2_fma_detected()
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn avx2_fma_detected() -> bool {
    is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn avx2_fma_detected() -> bool {
    false
}

fn forced_lanes() -> Option<usize> {
    *FORCED_LANES.get_or_init(|| {
        let forced = std::env::var(FORCE_LANES_ENV)
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|&lanes| lanes > 0);
        if let Some(lanes) = forced {
            tracing::debug!(lanes, "lane count capped by {}", FORCE_LANES_ENV);
        }
        forced
    })
}

/// Primitive element kinds a vector register can be split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// 8-bit integer.
    Byte,
    /// 16-bit integer.
    Short,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
}

impl ElementKind {
    /// Every element kind, narrowest first.
    pub const ALL: [ElementKind; 6] = [
        ElementKind::Byte,
        ElementKind::Short,
        ElementKind::Int,
        ElementKind::Long,
        ElementKind::Float,
        ElementKind::Double,
    ];

    /// Size of one element in bits.
    pub const fn bits(self) -> usize {
        match self {
            ElementKind::Byte => 8,
            ElementKind::Short => 16,
            ElementKind::Int | ElementKind::Float => 32,
            ElementKind::Long | ElementKind::Double => 64,
        }
    }

    /// Lower-case type name as used in reports.
    pub const fn name(self) -> &'static str {
        match self {
            ElementKind::Byte => "byte",
            ElementKind::Short => "short",
            ElementKind::Int => "int",
            ElementKind::Long => "long",
            ElementKind::Float => "float",
            ElementKind::Double => "double",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable description of a vector shape: how many lanes, how many bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidthDescriptor {
    lanes: usize,
    bit_width: usize,
}

impl WidthDescriptor {
    /// Creates a descriptor of `lanes` lanes spanning `bit_width` bits.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidArgument`](crate::KernelError) if either
    /// value is zero or `bit_width` is not a multiple of `lanes`.
    pub fn new(lanes: usize, bit_width: usize) -> Result<Self> {
        if lanes == 0 || bit_width == 0 {
            return Err(invalid_argument(format!(
                "width descriptor needs positive lanes and bit width \
                 (got {lanes} lanes, {bit_width} bits)"
            )));
        }
        if bit_width % lanes != 0 {
            return Err(invalid_argument(format!(
                "bit width {bit_width} is not divisible into {lanes} lanes"
            )));
        }
        Ok(Self { lanes, bit_width })
    }

    /// Descriptor for the forced scalar fallback of `kind` (one lane).
    pub const fn scalar(kind: ElementKind) -> Self {
        Self {
            lanes: 1,
            bit_width: kind.bits(),
        }
    }

    /// Descriptor of `kind` elements packed in a `register_bits`-bit register.
    pub const fn for_register(kind: ElementKind, register_bits: usize) -> Self {
        let lanes = register_bits / kind.bits();
        if lanes == 0 {
            Self::scalar(kind)
        } else {
            Self {
                lanes,
                bit_width: lanes * kind.bits(),
            }
        }
    }

    /// Number of lanes.
    #[inline]
    pub const fn lanes(&self) -> usize {
        self.lanes
    }

    /// Total register width in bits.
    #[inline]
    pub const fn bit_width(&self) -> usize {
        self.bit_width
    }

    /// Width of a single lane in bits.
    #[inline]
    pub const fn element_bits(&self) -> usize {
        self.bit_width / self.lanes
    }

    /// `true` for the one-lane fallback.
    #[inline]
    pub const fn is_scalar(&self) -> bool {
        self.lanes == 1
    }

    /// Largest multiple of [`lanes`](Self::lanes) not exceeding `len`.
    #[inline]
    pub const fn loop_bound(&self, len: usize) -> usize {
        tail::loop_bound(len, self.lanes)
    }

    /// Upper bound on the speedup of a compute-bound kernel at this width.
    pub fn theoretical_speedup(&self) -> f64 {
        self.lanes.max(1) as f64
    }
}

impl fmt::Display for WidthDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit x {} lanes", self.bit_width, self.lanes)
    }
}

/// Returns the preferred (widest supported) vector shape for `kind`.
pub fn preferred_width(kind: ElementKind) -> WidthDescriptor {
    let detected = WidthDescriptor::for_register(kind, simd_level().register_bits());

    match forced_lanes() {
        Some(cap) if cap < detected.lanes => {
            // largest power of two <= cap
            let lanes = 1usize << (usize::BITS - 1 - cap.leading_zeros());
            WidthDescriptor {
                lanes,
                bit_width: lanes * kind.bits(),
            }
        }
        _ => detected,
    }
}

/// Fixed 64/128/256/512-bit shapes of `kind`, for capability reports.
pub fn standard_widths(kind: ElementKind) -> [WidthDescriptor; 4] {
    [64, 128, 256, 512].map(|bits| WidthDescriptor::for_register(kind, bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_descriptor() {
        let width = WidthDescriptor::scalar(ElementKind::Float);
        assert_eq!(width.lanes(), 1);
        assert_eq!(width.bit_width(), 32);
        assert!(width.is_scalar());
        assert_eq!(width.theoretical_speedup(), 1.0);
    }

    #[test]
    fn test_new_validates() {
        assert!(WidthDescriptor::new(0, 256).is_err());
        assert!(WidthDescriptor::new(8, 0).is_err());
        assert!(WidthDescriptor::new(3, 256).is_err());

        let width = WidthDescriptor::new(8, 256).unwrap();
        assert_eq!(width.element_bits(), 32);
        assert_eq!(width.to_string(), "256-bit x 8 lanes");
    }

    #[test]
    fn test_for_register() {
        let width = WidthDescriptor::for_register(ElementKind::Float, 256);
        assert_eq!(width.lanes(), 8);

        let width = WidthDescriptor::for_register(ElementKind::Byte, 128);
        assert_eq!(width.lanes(), 16);

        // register narrower than the element
        let width = WidthDescriptor::for_register(ElementKind::Double, 0);
        assert_eq!(width, WidthDescriptor::scalar(ElementKind::Double));
    }

    #[test]
    fn test_loop_bound() {
        let width = WidthDescriptor::new(4, 128).unwrap();
        assert_eq!(width.loop_bound(10), 8);
        assert_eq!(width.loop_bound(3), 0);
        assert_eq!(width.loop_bound(12), 12);
    }

    #[test]
    fn test_preferred_width_is_consistent() {
        for kind in ElementKind::ALL {
            let width = preferred_width(kind);
            assert!(width.lanes() >= 1);
            assert!(width.lanes().is_power_of_two());
            assert_eq!(width.bit_width(), width.lanes() * kind.bits());
        }
        // cached: same answer every time
        assert_eq!(
            preferred_width(ElementKind::Float),
            preferred_width(ElementKind::Float)
        );
    }

    #[test]
    fn test_standard_widths() {
        let lanes: Vec<_> = standard_widths(ElementKind::Float)
            .iter()
            .map(|w| w.lanes())
            .collect();
        assert_eq!(lanes, vec![2, 4, 8, 16]);

        let lanes: Vec<_> = standard_widths(ElementKind::Long)
            .iter()
            .map(|w| w.lanes())
            .collect();
        assert_eq!(lanes, vec![1, 2, 4, 8]);
    }

    #[test]
    fn test_element_kind_bits() {
        assert_eq!(ElementKind::Byte.bits(), 8);
        assert_eq!(ElementKind::Short.bits(), 16);
        assert_eq!(ElementKind::Float.bits(), 32);
        assert_eq!(ElementKind::Double.bits(), 64);
        assert_eq!(ElementKind::Int.to_string(), "int");
    }
}
