//! Body/tail split shared by every vectorized kernel.
//!
//! A kernel over `len` elements with `lanes`-wide vectors processes
//! `[0, loop_bound)` in full vector blocks and `[loop_bound, len)` one element
//! at a time, where `loop_bound = len - len % lanes`. [`drive`] is the only
//! loop in the crate that performs this split; kernels supply the per-block
//! and per-element arithmetic through [`LaneKernel`].
//!
//! ```text
//! len = 10, lanes = 4
//! index:  0 1 2 3 | 4 5 6 7 | 8 9
//!         block 0 | block 4 | tail
//! ```

use std::iter::StepBy;
use std::ops::Range;

use crate::simd::SimdVector;

/// Largest multiple of `lanes` not exceeding `len`.
///
/// # Panics
///
/// Panics if `lanes` is zero.
#[inline(always)]
pub const fn loop_bound(len: usize, lanes: usize) -> usize {
    assert!(lanes > 0, "lane count must be positive");
    len - len % lanes
}

/// The body and tail index ranges of one kernel invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailSplit {
    len: usize,
    lanes: usize,
    loop_bound: usize,
}

impl TailSplit {
    /// Splits `[0, len)` for `lanes`-wide vectors.
    ///
    /// # Panics
    ///
    /// Panics if `lanes` is zero.
    #[inline(always)]
    pub const fn new(len: usize, lanes: usize) -> Self {
        Self {
            len,
            lanes,
            loop_bound: loop_bound(len, lanes),
        }
    }

    /// Splits `[0, len)` for the vector type `V`.
    #[inline(always)]
    pub const fn for_vector<V: SimdVector>(len: usize) -> Self {
        Self::new(len, V::LANES)
    }

    /// Total number of elements.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// `true` if there is nothing to process.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// End of the vectorized region.
    #[inline(always)]
    pub const fn loop_bound(&self) -> usize {
        self.loop_bound
    }

    /// Indices covered by full vector blocks.
    #[inline(always)]
    pub const fn body(&self) -> Range<usize> {
        0..self.loop_bound
    }

    /// Indices handled one at a time after the last full block.
    #[inline(always)]
    pub const fn tail(&self) -> Range<usize> {
        self.loop_bound..self.len
    }

    /// Start offsets of every full block.
    #[inline(always)]
    pub fn blocks(&self) -> StepBy<Range<usize>> {
        self.body().step_by(self.lanes)
    }
}

/// Per-kernel arithmetic driven by [`drive`].
pub trait LaneKernel<V: SimdVector> {
    /// Number of elements the kernel walks over.
    fn len(&self) -> usize;

    /// Processes `V::LANES` elements starting at `offset`.
    ///
    /// # Safety
    ///
    /// Callers guarantee `offset + V::LANES <= self.len()`.
    unsafe fn block(&mut self, offset: usize);

    /// Called once after the last full block and before the first tail element.
    #[inline(always)]
    fn end_body(&mut self) {}

    /// Processes the single element at `index` with scalar arithmetic.
    fn element(&mut self, index: usize);
}

/// Runs `kernel` over its whole index range: every full block through
/// [`LaneKernel::block`], then every remaining index through
/// [`LaneKernel::element`]. Each index is visited exactly once.
#[inline(always)]
pub fn drive<V: SimdVector, K: LaneKernel<V>>(kernel: &mut K) {
    let split = TailSplit::for_vector::<V>(kernel.len());

    for offset in split.blocks() {
        // SAFETY: offset + LANES <= loop_bound <= len.
        unsafe { kernel.block(offset) };
    }

    kernel.end_body();

    for index in split.tail() {
        kernel.element(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::Lanes;

    #[test]
    fn test_loop_bound() {
        assert_eq!(loop_bound(10, 4), 8);
        assert_eq!(loop_bound(8, 4), 8);
        assert_eq!(loop_bound(3, 4), 0);
        assert_eq!(loop_bound(0, 8), 0);
        assert_eq!(loop_bound(7, 1), 7);
    }

    #[test]
    fn test_split_ranges() {
        let split = TailSplit::new(10, 4);
        assert_eq!(split.loop_bound(), 8);
        assert_eq!(split.body(), 0..8);
        assert_eq!(split.tail().collect::<Vec<_>>(), vec![8, 9]);
        assert_eq!(split.blocks().collect::<Vec<_>>(), vec![0, 4]);
    }

    #[test]
    #[should_panic(expected = "lane count must be positive")]
    fn test_zero_lanes_panics() {
        let _ = TailSplit::new(10, 0);
    }

    /// Records every index the driver touches.
    struct Recorder {
        len: usize,
        visits: Vec<usize>,
        body_done_at: Option<usize>,
    }

    impl<V: SimdVector> LaneKernel<V> for Recorder {
        fn len(&self) -> usize {
            self.len
        }

        unsafe fn block(&mut self, offset: usize) {
            self.visits.extend(offset..offset + V::LANES);
        }

        fn end_body(&mut self) {
            self.body_done_at = Some(self.visits.len());
        }

        fn element(&mut self, index: usize) {
            self.visits.push(index);
        }
    }

    fn visits<V: SimdVector>(len: usize) -> Recorder {
        let mut recorder = Recorder {
            len,
            visits: Vec::new(),
            body_done_at: None,
        };
        drive::<V, _>(&mut recorder);
        recorder
    }

    #[test]
    fn test_drive_touches_every_index_once() {
        for len in 0..40 {
            let expected: Vec<usize> = (0..len).collect();
            assert_eq!(visits::<Lanes<1>>(len).visits, expected);
            assert_eq!(visits::<Lanes<4>>(len).visits, expected);
            assert_eq!(visits::<Lanes<8>>(len).visits, expected);
            assert_eq!(visits::<Lanes<16>>(len).visits, expected);
        }
    }

    #[test]
    fn test_end_body_runs_between_body_and_tail() {
        let recorder = visits::<Lanes<4>>(10);
        assert_eq!(recorder.body_done_at, Some(8));

        let recorder = visits::<Lanes<4>>(0);
        assert_eq!(recorder.body_done_at, Some(0));
    }
}
