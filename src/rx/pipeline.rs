//! MIR/FIR receive pipeline and SIR frame intake.
//!
//! [`RxEngine`] owns the buffer pool and the receive DMA bookkeeping. It is
//! kept inside the adapter's critical-section cell, so every method here
//! runs with the interrupt handler excluded. Delivery to the consumer runs
//! outside the cell and lives in the adapter.

#[cfg(feature = "log")]
use log::{debug, warn};

use super::buffer::Storage;
use super::pool::RxPool;
use crate::driver::config::Speed;
use crate::driver::stats::Statistics;
use crate::hal::{DmaDirection, DmaTransfer, FrameStatus, IrdaHardware, TimerKind};
use crate::internal::constants::{SIR_BUFFER_SIZE, SIR_FCS_SIZE};
use crate::internal::window::Span;

/// Everything the pipeline needs from its adapter besides its own state
pub(crate) struct RxEnv<'a, H> {
    pub(crate) hw: &'a H,
    pub(crate) stats: &'a Statistics,
    pub(crate) max_frame_size: usize,
    pub(crate) min_header_size: usize,
    pub(crate) rx_poll_ms: u32,
    /// First byte of the DMA window
    pub(crate) window: *mut u8,
    pub(crate) window_len: usize,
    /// First byte of the SIR spare array (`SIR_BUFFER_SIZE` bytes per slot)
    pub(crate) spares: *mut u8,
}

/// Receive DMA mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum RxMode {
    /// Receiver off
    #[default]
    Idle,
    /// SIR: frames arrive through [`RxEngine::receive_sir`]
    Sir,
    /// Receive DMA running into this span of the window
    Dma(Span),
    /// DMA completed and walked; waiting to be re-armed after delivery
    Draining,
    /// No span large enough for one frame; waiting for a release
    Stalled,
}

/// Result of one progress check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollOutcome {
    /// Not receiving through DMA
    Inactive,
    /// DMA still moving data (or nothing arrived yet); poll timer re-armed
    Busy,
    /// DMA torn down and the status FIFO walked; frames may be on Full
    Walked,
}

pub(crate) struct RxEngine<const N: usize> {
    pub(crate) pool: RxPool<N>,
    speed: Speed,
    mode: RxMode,
    last_remaining: usize,
    /// Status entry read ahead of its data, applied first on the next walk
    carried: Option<FrameStatus>,
    discard_next: bool,
    media_busy_armed: bool,
}

impl<const N: usize> RxEngine<N> {
    pub(crate) fn new(speed: Speed) -> Self {
        Self {
            pool: RxPool::new(),
            speed,
            mode: RxMode::Idle,
            last_remaining: 0,
            carried: None,
            discard_next: false,
            media_busy_armed: false,
        }
    }

    #[inline(always)]
    pub(crate) fn mode(&self) -> RxMode {
        self.mode
    }

    /// Switch framing. Only valid while the receiver is stopped.
    pub(crate) fn set_speed(&mut self, speed: Speed) {
        debug_assert!(!matches!(self.mode, RxMode::Dma(_)), "speed change with DMA running");
        self.speed = speed;
        self.carried = None;
        self.discard_next = false;
    }

    pub(crate) fn arm_media_busy(&mut self) {
        self.media_busy_armed = true;
    }

    /// Consume the media-busy indication, if armed
    pub(crate) fn take_media_busy(&mut self) -> bool {
        core::mem::replace(&mut self.media_busy_armed, false)
    }

    // =========================================================================
    // Start / stop
    // =========================================================================

    /// Arm reception at the current speed. No-op while DMA is already running.
    pub(crate) fn start<H: IrdaHardware>(&mut self, env: &RxEnv<'_, H>) {
        if matches!(self.mode, RxMode::Dma(_)) {
            return;
        }
        if !self.speed.class().uses_dma() {
            self.mode = RxMode::Sir;
            return;
        }

        let min_len = env.max_frame_size + self.speed.fcs_size();
        match self.pool.largest_free_span(env.window_len, min_len) {
            Ok(span) => {
                env.hw.start_dma(DmaTransfer {
                    // SAFETY: the allocator only returns spans inside the window.
                    addr: unsafe { env.window.add(span.offset) },
                    offset: span.offset,
                    len: span.len,
                    direction: DmaDirection::Receive,
                });
                env.hw.arm_timer(TimerKind::RxPoll, env.rx_poll_ms);
                self.mode = RxMode::Dma(span);
                self.last_remaining = span.len;
            }
            Err(_) => {
                if self.mode != RxMode::Stalled {
                    env.stats.record_window_stall();
                    #[cfg(feature = "log")]
                    warn!("irda: receive window exhausted, reception stalled");
                }
                self.mode = RxMode::Stalled;
            }
        }
    }

    /// Re-arm after delivery, if the walk left the receiver draining
    pub(crate) fn restart<H: IrdaHardware>(&mut self, env: &RxEnv<'_, H>) {
        if self.mode == RxMode::Draining {
            self.start(env);
        }
    }

    /// Retry a stalled receiver after buffers came back
    pub(crate) fn retry_stalled<H: IrdaHardware>(&mut self, env: &RxEnv<'_, H>) {
        if self.mode == RxMode::Stalled {
            self.start(env);
        }
    }

    /// Stop reception, keeping whatever already landed in the window.
    pub(crate) fn stop<H: IrdaHardware>(&mut self, env: &RxEnv<'_, H>) {
        if let RxMode::Dma(span) = self.mode {
            self.complete_and_walk(env, span);
        }
        self.mode = RxMode::Idle;
    }

    /// Stop reception and discard everything in flight (teardown).
    pub(crate) fn halt<H: IrdaHardware>(&mut self, env: &RxEnv<'_, H>) {
        if matches!(self.mode, RxMode::Dma(_)) {
            env.hw.complete_dma();
            env.hw.flush_status_fifo();
        }
        self.mode = RxMode::Idle;
        self.carried = None;
        self.discard_next = false;
        self.pool.reclaim_full();
    }

    // =========================================================================
    // MIR/FIR progress check
    // =========================================================================

    /// Check whether the receive DMA has gone quiet and, if so, collect the
    /// frames it wrote.
    pub(crate) fn poll<H: IrdaHardware>(&mut self, env: &RxEnv<'_, H>) -> PollOutcome {
        let RxMode::Dma(span) = self.mode else {
            return PollOutcome::Inactive;
        };

        let remaining = env.hw.dma_remaining();
        if remaining == span.len || remaining != self.last_remaining {
            self.last_remaining = remaining;
            env.hw.arm_timer(TimerKind::RxPoll, env.rx_poll_ms);
            return PollOutcome::Busy;
        }

        self.complete_and_walk(env, span);
        self.mode = RxMode::Draining;
        PollOutcome::Walked
    }

    fn complete_and_walk<H: IrdaHardware>(&mut self, env: &RxEnv<'_, H>, span: Span) {
        let remaining = env.hw.complete_dma().min(span.len);
        self.walk(env, span.offset, span.end() - remaining);
    }

    /// Walk the frame-status FIFO over `[start, end_of_data)` of the window,
    /// moving every good frame onto the Full list.
    fn walk<H: IrdaHardware>(&mut self, env: &RxEnv<'_, H>, start: usize, end_of_data: usize) {
        let fcs_size = self.speed.fcs_size();
        let mut read = start;

        while read < end_of_data {
            let status = match self.carried.take() {
                Some(status) => status,
                None => env.hw.read_status_fifo(),
            };
            if !status.is_pending() {
                break;
            }
            let size = status.size as usize;

            if let Some(error) = status.error() {
                if self.discard_next {
                    self.discard_next = false;
                } else {
                    env.stats.record_frame_error(error);
                    #[cfg(feature = "log")]
                    debug!("irda: dropped frame at {}: {:?}", read, error);
                }
                read += size;
                continue;
            }

            let len = size.saturating_sub(fcs_size);
            if size < fcs_size || len < env.min_header_size || len > env.max_frame_size {
                env.stats.record_size_error();
                #[cfg(feature = "log")]
                warn!("irda: frame size {} out of range, flushing status FIFO", size);
                env.hw.flush_status_fifo();
                self.discard_next = true;
                break;
            }

            if read + size > end_of_data {
                // Status ran ahead of the data; the frame lands in the next cycle.
                // Every armed span holds a maximum-size frame, so this resolves.
                self.carried = Some(status);
                break;
            }

            let claimed = Span::new(read, size);
            read += size;

            self.discard_next = false;
            match self.pool.acquire_free() {
                Some(index) => self.pool.mark_full(index, Storage::Window { claimed, len }),
                None => env.stats.record_no_buffer(),
            }
        }
    }

    // =========================================================================
    // SIR intake
    // =========================================================================

    /// Queue one unstuffed SIR frame (FCS included). Returns `false` when the
    /// frame was dropped.
    pub(crate) fn receive_sir<H>(&mut self, env: &RxEnv<'_, H>, frame: &[u8]) -> bool {
        if self.mode != RxMode::Sir {
            return false;
        }
        if frame.len() > SIR_BUFFER_SIZE || frame.len() < env.min_header_size + SIR_FCS_SIZE {
            env.stats.record_size_error();
            return false;
        }

        let Some(index) = self.pool.acquire_free() else {
            env.stats.record_no_buffer();
            return false;
        };
        let Some(slot) = self.pool.acquire_spare() else {
            self.pool.unacquire(index);
            env.stats.record_no_buffer();
            return false;
        };

        // SAFETY: `slot` came off the spare list, so no other buffer refers to
        // it, and `frame.len()` fits one spare.
        unsafe {
            let dst = env.spares.add(slot as usize * SIR_BUFFER_SIZE);
            core::ptr::copy_nonoverlapping(frame.as_ptr(), dst, frame.len());
        }
        self.pool.mark_full(index, Storage::Private { slot, len: frame.len() });
        true
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec;

    use super::*;
    use crate::internal::constants::{DEFAULT_RX_POLL_MS, MAX_FRAME_SIZE, MIN_HEADER_SIZE, frame_stat};
    use crate::testing::{HwEvent, MockHardware};

    fn env<'a>(
        hw: &'a MockHardware,
        stats: &'a Statistics,
        window: &mut [u8],
        spares: &mut [u8],
    ) -> RxEnv<'a, MockHardware> {
        RxEnv {
            hw,
            stats,
            max_frame_size: MAX_FRAME_SIZE,
            min_header_size: MIN_HEADER_SIZE,
            rx_poll_ms: DEFAULT_RX_POLL_MS,
            window: window.as_mut_ptr(),
            window_len: window.len(),
            spares: spares.as_mut_ptr(),
        }
    }

    fn settle(rx: &mut RxEngine<4>, env: &RxEnv<'_, MockHardware>) -> PollOutcome {
        assert_eq!(rx.poll(env), PollOutcome::Busy);
        rx.poll(env)
    }

    #[test]
    fn start_arms_window_and_poll_timer() {
        let (hw, stats) = (MockHardware::new(), Statistics::new());
        let (mut window, mut spares) = (vec![0u8; 8192], vec![0u8; 4 * SIR_BUFFER_SIZE]);
        let env = env(&hw, &stats, &mut window, &mut spares);
        let mut rx = RxEngine::<4>::new(Speed::Fir4M);

        rx.start(&env);

        assert_eq!(rx.mode(), RxMode::Dma(Span::new(0, 8192)));
        assert!(hw.events().contains(&HwEvent::ArmTimer {
            kind: TimerKind::RxPoll,
            ms: DEFAULT_RX_POLL_MS,
        }));
    }

    #[test]
    fn sir_start_uses_no_dma() {
        let (hw, stats) = (MockHardware::new(), Statistics::new());
        let (mut window, mut spares) = (vec![0u8; 8192], vec![0u8; 4 * SIR_BUFFER_SIZE]);
        let env = env(&hw, &stats, &mut window, &mut spares);
        let mut rx = RxEngine::<4>::new(Speed::Sir115200);

        rx.start(&env);

        assert_eq!(rx.mode(), RxMode::Sir);
        assert!(hw.events().is_empty());
    }

    #[test]
    fn idle_dma_is_not_walked() {
        let (hw, stats) = (MockHardware::new(), Statistics::new());
        let (mut window, mut spares) = (vec![0u8; 8192], vec![0u8; 4 * SIR_BUFFER_SIZE]);
        let env = env(&hw, &stats, &mut window, &mut spares);
        let mut rx = RxEngine::<4>::new(Speed::Fir4M);
        rx.start(&env);

        for _ in 0..3 {
            assert_eq!(rx.poll(&env), PollOutcome::Busy);
        }
        assert!(matches!(rx.mode(), RxMode::Dma(_)));
    }

    #[test]
    fn error_frame_is_skipped_by_size() {
        let (hw, stats) = (MockHardware::new(), Statistics::new());
        let (mut window, mut spares) = (vec![0u8; 8192], vec![0u8; 4 * SIR_BUFFER_SIZE]);
        let env = env(&hw, &stats, &mut window, &mut spares);
        let mut rx = RxEngine::<4>::new(Speed::Fir4M);
        rx.start(&env);

        hw.receive_bad_frame(100, frame_stat::RX_FIFO_OVERRUN);
        hw.receive_frame(&[0x11; 60], 4);
        assert_eq!(settle(&mut rx, &env), PollOutcome::Walked);

        let head = rx.pool.full_front().unwrap();
        assert_eq!(
            head.storage,
            Storage::Window {
                claimed: Span::new(100, 64),
                len: 60,
            }
        );
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.rx_fifo_overruns, 1);
        assert_eq!(snapshot.rx_dropped, 1);
        assert_eq!(rx.mode(), RxMode::Draining);
    }

    #[test]
    fn oversize_frame_sets_discard_until_next_valid_frame() {
        let (hw, stats) = (MockHardware::new(), Statistics::new());
        let (mut window, mut spares) = (vec![0u8; 8192], vec![0u8; 4 * SIR_BUFFER_SIZE]);
        let env = env(&hw, &stats, &mut window, &mut spares);
        let mut rx = RxEngine::<4>::new(Speed::Fir4M);
        rx.start(&env);

        hw.receive_frame(&[0; MAX_FRAME_SIZE + 1], 4);
        settle(&mut rx, &env);
        assert_eq!(stats.snapshot().rx_size_errors, 1);
        assert!(rx.discard_next);

        rx.restart(&env);
        hw.receive_frame(&[0x22; 30], 4);
        settle(&mut rx, &env);
        assert!(!rx.discard_next);
        assert_eq!(rx.pool.counts().full, 1);
    }

    #[test]
    fn stop_keeps_landed_frames() {
        let (hw, stats) = (MockHardware::new(), Statistics::new());
        let (mut window, mut spares) = (vec![0u8; 8192], vec![0u8; 4 * SIR_BUFFER_SIZE]);
        let env = env(&hw, &stats, &mut window, &mut spares);
        let mut rx = RxEngine::<4>::new(Speed::Mir1152k);
        rx.start(&env);

        hw.receive_frame(&[0x33; 40], 2);
        rx.stop(&env);

        assert_eq!(rx.mode(), RxMode::Idle);
        assert_eq!(rx.pool.counts().full, 1);
        assert_eq!(rx.poll(&env), PollOutcome::Inactive);
    }

    #[test]
    fn halt_drops_everything() {
        let (hw, stats) = (MockHardware::new(), Statistics::new());
        let (mut window, mut spares) = (vec![0u8; 8192], vec![0u8; 4 * SIR_BUFFER_SIZE]);
        let env = env(&hw, &stats, &mut window, &mut spares);
        let mut rx = RxEngine::<4>::new(Speed::Fir4M);
        rx.start(&env);

        hw.receive_frame(&[0x44; 40], 4);
        settle(&mut rx, &env);
        rx.restart(&env);
        hw.push_status(FrameStatus::good(50));
        rx.halt(&env);

        assert_eq!(rx.pool.counts().free, 4);
        assert_eq!(hw.status_fifo_len(), 0);
        assert_eq!(rx.mode(), RxMode::Idle);
    }

    #[test]
    fn stall_is_counted_once() {
        let (hw, stats) = (MockHardware::new(), Statistics::new());
        let (mut window, mut spares) = (vec![0u8; 4200], vec![0u8; 4 * SIR_BUFFER_SIZE]);
        let env = env(&hw, &stats, &mut window, &mut spares);
        let mut rx = RxEngine::<4>::new(Speed::Fir4M);
        rx.start(&env);

        hw.receive_frame(&[0x55; 2196], 4);
        settle(&mut rx, &env);
        rx.restart(&env);
        assert_eq!(rx.mode(), RxMode::Stalled);

        rx.retry_stalled(&env);
        rx.retry_stalled(&env);
        assert_eq!(stats.snapshot().rx_window_stalls, 1);

        let head = rx.pool.full_front().unwrap();
        rx.pool.release_full(head.index);
        rx.retry_stalled(&env);
        assert_eq!(rx.mode(), RxMode::Dma(Span::new(0, 4200)));
    }

    #[test]
    fn sir_intake_checks_mode_and_size() {
        let (hw, stats) = (MockHardware::new(), Statistics::new());
        let (mut window, mut spares) = (vec![0u8; 8192], vec![0u8; 4 * SIR_BUFFER_SIZE]);
        let env = env(&hw, &stats, &mut window, &mut spares);
        let mut rx = RxEngine::<4>::new(Speed::Sir9600);

        assert!(!rx.receive_sir(&env, &[0; 10]));
        rx.start(&env);
        assert!(!rx.receive_sir(&env, &[0; MIN_HEADER_SIZE + SIR_FCS_SIZE - 1]));
        assert!(!rx.receive_sir(&env, &vec![0; SIR_BUFFER_SIZE + 1]));
        assert_eq!(stats.snapshot().rx_size_errors, 2);

        assert!(rx.receive_sir(&env, &[0x66; 10]));
        let head = rx.pool.full_front().unwrap();
        let Storage::Private { slot, len } = head.storage else {
            panic!("SIR frame stored in the window");
        };
        assert_eq!(len, 10);
        let start = slot as usize * SIR_BUFFER_SIZE;
        assert_eq!(spares[start..start + len], [0x66; 10]);
    }
}
