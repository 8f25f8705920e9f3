//! Free-space search inside the circular receive DMA window.
//!
//! Frames received at MIR/FIR stay in the window until the upstream
//! consumer gives them back, so the next receive DMA has to be programmed
//! into whatever gap is left between the claimed slices.

use crate::driver::error::{DmaError, DmaResult};
use crate::internal::constants::DMA_ALIGN;

/// A contiguous byte range inside the receive window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Span {
    /// Offset from the start of the window
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
}

impl Span {
    /// Create a new span
    #[must_use]
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// One past the last byte
    #[inline(always)]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    /// True when the two spans share at least one byte
    #[must_use]
    pub const fn overlaps(&self, other: &Span) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// Round `val` up to the DMA alignment
#[inline(always)]
pub const fn align_up(val: usize) -> usize {
    (val + DMA_ALIGN - 1) & !(DMA_ALIGN - 1)
}

/// Round `val` down to the DMA alignment
#[inline(always)]
pub const fn align_down(val: usize) -> usize {
    val & !(DMA_ALIGN - 1)
}

/// Find the largest free span of a window of `window_len` bytes.
///
/// `full` and `pending` yield the slices claimed by buffers on the Full and
/// Pending lists, each ascending by offset. `None` entries are buffers that
/// are not backed by the window (SIR private storage) and are skipped.
///
/// The returned span starts on a [`DMA_ALIGN`] boundary and its length is a
/// multiple of [`DMA_ALIGN`]. Fails with [`DmaError::InsufficientSpace`] when
/// the result is shorter than `min_len`.
pub fn find_largest_free_span(
    full: impl Iterator<Item = Option<Span>>,
    pending: impl Iterator<Item = Option<Span>>,
    window_len: usize,
    min_len: usize,
) -> DmaResult<Span> {
    let mut full = full.flatten().peekable();
    let mut pending = pending.flatten().peekable();

    let mut end_of_last = 0usize;
    let mut best = Span::default();

    loop {
        let next = match (full.peek().copied(), pending.peek().copied()) {
            (Some(f), Some(p)) if f.offset <= p.offset => full.next(),
            (Some(_), Some(_)) | (None, Some(_)) => pending.next(),
            (Some(_), None) => full.next(),
            (None, None) => break,
        };
        let Some(span) = next else { break };

        debug_assert!(span.end() <= window_len, "claimed slice outside window");
        if span.offset > end_of_last && span.offset - end_of_last > best.len {
            best = Span::new(end_of_last, span.offset - end_of_last);
        }
        end_of_last = end_of_last.max(span.end());
    }

    if window_len > end_of_last && window_len - end_of_last > best.len {
        best = Span::new(end_of_last, window_len - end_of_last);
    }

    let start = align_up(best.offset);
    let len = align_down(best.end().saturating_sub(start));
    if len < min_len || len == 0 {
        return Err(DmaError::InsufficientSpace);
    }
    Ok(Span::new(start, len))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    fn spans(list: &[(usize, usize)]) -> Vec<Option<Span>> {
        list.iter().map(|&(o, l)| Some(Span::new(o, l))).collect()
    }

    fn largest(full: &[(usize, usize)], pending: &[(usize, usize)], window: usize) -> DmaResult<Span> {
        find_largest_free_span(
            spans(full).into_iter(),
            spans(pending).into_iter(),
            window,
            0,
        )
    }

    /// Byte-by-byte scan for the first maximal free run.
    fn brute_force(occupied: &[Span], window: usize) -> Span {
        let mut used = std::vec![false; window];
        for span in occupied {
            for b in &mut used[span.offset..span.end()] {
                *b = true;
            }
        }
        let mut best = Span::default();
        let mut run_start = None;
        for (i, &u) in used.iter().chain(core::iter::once(&true)).enumerate() {
            match (u, run_start) {
                (false, None) => run_start = Some(i),
                (true, Some(start)) => {
                    if i - start > best.len {
                        best = Span::new(start, i - start);
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
        best
    }

    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }

        fn below(&mut self, n: usize) -> usize {
            (self.next() % n as u64) as usize
        }
    }

    #[test]
    fn empty_window_is_one_span() {
        assert_eq!(largest(&[], &[], 8192), Ok(Span::new(0, 8192)));
    }

    #[test]
    fn gap_before_first_buffer() {
        let got = largest(&[(4096, 100)], &[], 5000).unwrap();
        assert_eq!(got, Span::new(0, 4096));
    }

    #[test]
    fn tail_gap_wins() {
        let got = largest(&[(0, 68)], &[(68, 1504)], 8192).unwrap();
        assert_eq!(got, Span::new(1572, 8192 - 1572));
    }

    #[test]
    fn merges_full_and_pending() {
        // full: [100,200) [900,1000); pending: [300,800)
        let got = largest(&[(100, 100), (900, 100)], &[(300, 500)], 1024).unwrap();
        assert_eq!(got, Span::new(0, 100));
    }

    #[test]
    fn offset_rounded_up_and_length_rounded_down() {
        // gap is [66, 8192)
        let got = largest(&[(0, 66)], &[], 8192).unwrap();
        assert_eq!(got.offset, 68);
        assert_eq!(got.len, 8124);
        assert_eq!(got.offset % DMA_ALIGN, 0);
        assert_eq!(got.len % DMA_ALIGN, 0);
    }

    #[test]
    fn private_buffers_are_skipped() {
        let full = [None, Some(Span::new(0, 1000)), None];
        let got = find_largest_free_span(full.into_iter(), core::iter::empty(), 4096, 0).unwrap();
        assert_eq!(got, Span::new(1000, 3096));
    }

    #[test]
    fn insufficient_space_is_reported() {
        let result = find_largest_free_span(
            spans(&[(0, 3000), (3500, 4000)]).into_iter(),
            core::iter::empty(),
            8192,
            1000,
        );
        assert_eq!(result, Err(DmaError::InsufficientSpace));
    }

    #[test]
    fn full_window_is_insufficient() {
        assert_eq!(largest(&[(0, 4096)], &[], 4096), Err(DmaError::InsufficientSpace));
    }

    #[test]
    fn span_overlap() {
        assert!(Span::new(0, 10).overlaps(&Span::new(9, 1)));
        assert!(!Span::new(0, 10).overlaps(&Span::new(10, 5)));
    }

    #[test]
    fn randomized_against_brute_force() {
        const WINDOW: usize = 4096;
        let mut rng = XorShift(0x2545_F491_4F6C_DD1D);

        for _ in 0..500 {
            // Build sorted, non-overlapping spans, then deal them out to the
            // two lists while keeping each list ascending.
            let mut occupied = Vec::new();
            let mut cursor = 0usize;
            while cursor < WINDOW {
                cursor += rng.below(600);
                let len = 1 + rng.below(400);
                if cursor + len > WINDOW {
                    break;
                }
                occupied.push(Span::new(cursor, len));
                cursor += len;
            }

            let mut full = Vec::new();
            let mut pending = Vec::new();
            for span in &occupied {
                if rng.below(2) == 0 {
                    full.push(Some(*span));
                } else {
                    pending.push(Some(*span));
                }
            }

            let expected = brute_force(&occupied, WINDOW);
            let start = align_up(expected.offset);
            let len = align_down(expected.end().saturating_sub(start));
            let got = find_largest_free_span(full.into_iter(), pending.into_iter(), WINDOW, 0);

            if len == 0 {
                assert_eq!(got, Err(DmaError::InsufficientSpace));
            } else {
                assert_eq!(got, Ok(Span::new(start, len)), "occupied: {occupied:?}");
                let got = got.unwrap();
                assert!(occupied.iter().all(|s| !s.overlaps(&got)));
            }
        }
    }
}
