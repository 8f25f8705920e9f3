//! IrDA adapter: the engine tying the receive pool, the MIR/FIR pipeline,
//! the transmit scheduler and the speed/state controller together.
//!
//! # Contexts
//!
//! - **Interrupt**: [`Irda::on_interrupt`] and [`Irda::receive_sir_frame`]
//! - **Deferred**: [`Irda::run_deferred`], serialized by the caller
//! - **Caller**: [`Irda::send`], [`Irda::release_pending`],
//!   [`Irda::set_speed`] and the queries
//!
//! All methods take `&self`, so one adapter can be placed in a `static`
//! and reached from all three.

#[cfg(feature = "log")]
use log::{debug, warn};

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use spin::Mutex;

use super::config::{AdapterState, IrdaConfig, Speed};
use super::error::{ConfigError, ConfigResult, DmaError, IoError, IoResult, Result};
use super::interrupt::{InterruptMask, InterruptStatus};
use super::protocol::{Delivery, FrameId, PendingFrame, Protocol, SendStatus};
use super::stats::{IrdaStats, Statistics};
use crate::hal::{DmaDirection, DmaTransfer, FrameError, IrdaHardware, TimerKind};
use crate::internal::constants::{
    DEFAULT_TX_SLOTS, MAX_FCS_SIZE, MAX_FRAME_SIZE, RCV_DMA_SIZE, RX_BUFFER_COUNT, SIR_BUFFER_SIZE,
    SIR_FCS_SIZE, irq,
};
use crate::internal::fcs;
use crate::internal::window::{Span, align_down};
use crate::rx::buffer::Storage;
use crate::rx::pipeline::{PollOutcome, RxEngine, RxEnv, RxMode};
use crate::rx::pool::PoolCounts;
use crate::sync::CriticalSectionCell;
use crate::tx::scheduler::{SpeedRequest, TxAction, TxScheduler};

/// Transmit bounce buffer: largest frame plus the SIR software FCS
const TX_BUFFER_SIZE: usize = MAX_FRAME_SIZE + MAX_FCS_SIZE;

/// Interrupt mask while receiving at `speed`
fn receive_mask(speed: Speed) -> InterruptMask {
    if speed.class().uses_dma() {
        InterruptMask::DMA_RECEIVE
    } else {
        InterruptMask::SIR_RECEIVE
    }
}

/// IrDA receive/transmit engine.
///
/// # Type Parameters
///
/// - `H`: hardware collaborator
/// - `RX_BUFS`: receive buffer descriptors (and SIR spares)
/// - `WINDOW`: receive DMA window size in bytes
/// - `TX_SLOTS`: send queue depth
///
/// # Memory
///
/// All frame memory is inline: the window, `RX_BUFS` SIR spares of
/// [`SIR_BUFFER_SIZE`] bytes, `TX_SLOTS` queue slots of [`MAX_FRAME_SIZE`]
/// bytes and one transmit bounce buffer. With [`IrdaDefault`] that is about
/// 66 KB; on targets that restrict DMA to internal SRAM, place the adapter
/// there.
///
/// # Example
///
/// ```ignore
/// static IRDA: StaticCell<IrdaDefault<Board>> = StaticCell::new();
/// let irda = IRDA.init(IrdaDefault::new(Board::new(), IrdaConfig::new())?);
/// irda.open()?;
///
/// // interrupt handler
/// if irda.on_interrupt(board.read_and_clear_events()) {
///     schedule_deferred();
/// }
///
/// // deferred context
/// irda.run_deferred(&mut irlap);
/// ```
pub struct Irda<H, const RX_BUFS: usize, const WINDOW: usize, const TX_SLOTS: usize> {
    hw: H,
    config: IrdaConfig,
    /// Receive lists and DMA bookkeeping, shared with the interrupt handler
    rx: CriticalSectionCell<RxEngine<RX_BUFS>>,
    /// Send queue, adapter state and pending speed change
    tx: Mutex<TxScheduler<TX_SLOTS>>,
    window: UnsafeCell<[u8; WINDOW]>,
    spares: UnsafeCell<[[u8; SIR_BUFFER_SIZE]; RX_BUFS]>,
    tx_buffer: UnsafeCell<[u8; TX_BUFFER_SIZE]>,
    stats: Statistics,
    /// Interrupt bits awaiting deferred processing
    deferred: AtomicU8,
    delivering: AtomicBool,
}

/// Default adapter: 16 receive buffers, 16 KB window, 8 queued sends
pub type IrdaDefault<H> = Irda<H, RX_BUFFER_COUNT, RCV_DMA_SIZE, DEFAULT_TX_SLOTS>;

/// Small adapter: 8 receive buffers, 8 KB window, 4 queued sends
pub type IrdaSmall<H> = Irda<H, 8, 8192, 4>;

// SAFETY: bookkeeping lives behind the critical-section cell or the queue
// lock. Bytes in the UnsafeCells are only touched by the holder of the buffer
// state that claims them: a Full/Pending buffer for its window slice or
// spare, the hardware for the armed DMA span, and the in-flight send for the
// bounce buffer.
unsafe impl<H: Sync, const RX_BUFS: usize, const WINDOW: usize, const TX_SLOTS: usize> Sync
    for Irda<H, RX_BUFS, WINDOW, TX_SLOTS>
{
}

impl<H: IrdaHardware, const RX_BUFS: usize, const WINDOW: usize, const TX_SLOTS: usize>
    Irda<H, RX_BUFS, WINDOW, TX_SLOTS>
{
    /// Create a closed adapter.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::WindowTooSmall`] if the window cannot hold one
    ///   maximum-size frame plus the largest FCS
    /// - [`ConfigError::InvalidConfig`] for zero buffers or queue slots, or
    ///   any error from [`IrdaConfig::validate`]
    pub fn new(hw: H, config: IrdaConfig) -> ConfigResult<Self> {
        config.validate()?;
        if RX_BUFS == 0 || TX_SLOTS == 0 {
            return Err(ConfigError::InvalidConfig);
        }
        if align_down(WINDOW) < config.max_frame_size + MAX_FCS_SIZE {
            return Err(ConfigError::WindowTooSmall);
        }

        Ok(Self {
            hw,
            config,
            rx: CriticalSectionCell::new(RxEngine::new(config.initial_speed)),
            tx: Mutex::new(TxScheduler::new(config.initial_speed)),
            window: UnsafeCell::new([0; WINDOW]),
            spares: UnsafeCell::new([[0; SIR_BUFFER_SIZE]; RX_BUFS]),
            tx_buffer: UnsafeCell::new([0; TX_BUFFER_SIZE]),
            stats: Statistics::new(),
            deferred: AtomicU8::new(0),
            delivering: AtomicBool::new(false),
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Program the initial speed and start receiving.
    pub fn open(&self) -> Result<()> {
        let mut tx = self.tx.lock();
        if tx.is_open() {
            return Err(IoError::AlreadyOpen.into());
        }

        let speed = self.config.initial_speed;
        tx.open(speed);
        self.hw.set_speed(speed);
        self.hw.set_interrupt_mask(receive_mask(speed));

        let env = self.rx_env();
        self.rx.with(|rx| {
            rx.set_speed(speed);
            rx.arm_media_busy();
            rx.start(&env);
        });
        Ok(())
    }

    /// Tear the adapter down.
    ///
    /// Interrupts are masked first, then DMA stops, undelivered frames are
    /// dropped and queued sends complete with [`SendStatus::Aborted`].
    ///
    /// # Errors
    ///
    /// [`IoError::PendingAtTeardown`] if the consumer still holds deferred
    /// frames. Debug builds panic instead.
    pub fn close<P: Protocol>(&self, proto: &mut P) -> Result<()> {
        let mut aborted = [None; TX_SLOTS];
        let pending = {
            let mut tx = self.tx.lock();
            if !tx.is_open() {
                return Err(IoError::NotOpen.into());
            }

            self.hw.set_interrupt_mask(InterruptMask::NONE);
            if tx.write_pending() && tx.speed().class().uses_dma() {
                self.hw.complete_dma();
            }

            let mut count = 0;
            tx.close(|id| {
                if let Some(slot) = aborted.get_mut(count) {
                    *slot = Some(id);
                }
                count += 1;
            });

            let env = self.rx_env();
            self.rx.with(|rx| {
                rx.halt(&env);
                rx.pool.counts().pending
            })
        };
        self.deferred.store(0, Ordering::Release);

        for id in aborted.into_iter().flatten() {
            self.stats.record_tx_aborted();
            proto.on_send_complete(id, SendStatus::Aborted);
        }

        if pending > 0 {
            #[cfg(feature = "log")]
            warn!("irda: {} receive buffers pending at teardown", pending);
            debug_assert!(pending == 0, "{pending} receive buffers pending at teardown");
            return Err(IoError::PendingAtTeardown.into());
        }
        Ok(())
    }

    // =========================================================================
    // Transmit
    // =========================================================================

    /// Queue a frame (no FCS) for transmission.
    ///
    /// `turnaround_us` is the minimum time the link must stay quiet before
    /// this frame goes out; it is waited for on a timer, never by sleeping.
    pub fn send(&self, frame: &[u8], turnaround_us: Option<u32>) -> Result<FrameId> {
        if frame.len() > self.config.max_frame_size {
            return Err(DmaError::FrameTooLarge.into());
        }
        if frame.len() < self.config.min_header_size {
            return Err(DmaError::InvalidLength.into());
        }

        let mut tx = self.tx.lock();
        if !tx.is_open() {
            return Err(IoError::NotOpen.into());
        }
        let id = tx.enqueue(frame, turnaround_us.unwrap_or(0))?;
        self.pump(&mut tx);
        Ok(id)
    }

    /// The in-flight frame finished. Reports it to the consumer, applies a
    /// speed change waiting on it, then starts the next frame or falls back
    /// to receiving.
    ///
    /// Called by [`run_deferred`](Self::run_deferred) on a transmit
    /// interrupt.
    ///
    /// # Errors
    ///
    /// [`IoError::NoOutstandingSend`] if nothing was in flight. Debug builds
    /// panic instead.
    pub fn complete_send<P: Protocol>(&self, proto: &mut P) -> Result<()> {
        let (id, status) = {
            let mut tx = self.tx.lock();
            let dma = tx.speed().class().uses_dma();
            let Some((id, switch)) = tx.complete() else {
                debug_assert!(false, "send completion with no frame outstanding");
                return Err(IoError::NoOutstandingSend.into());
            };
            if dma {
                self.hw.complete_dma();
            }

            let status = if self.hw.take_tx_underrun() {
                self.stats.record_tx_underrun();
                #[cfg(feature = "log")]
                warn!("irda: transmit underrun on frame {}", id.value());
                SendStatus::Underrun
            } else {
                self.stats.record_tx_completed();
                SendStatus::Ok
            };

            if let Some(speed) = switch {
                self.switch_speed(&mut tx, speed);
            }
            self.pump(&mut tx);
            if !tx.write_pending() {
                self.resume_reception(&mut tx);
            }
            (id, status)
        };

        proto.on_send_complete(id, status);
        Ok(())
    }

    /// Act on the queue head: wait out its turnaround, or send it.
    fn pump(&self, tx: &mut TxScheduler<TX_SLOTS>) {
        match tx.next_action() {
            TxAction::Idle => {}
            TxAction::Wait(ms) => self.hw.arm_timer(TimerKind::Turnaround, ms),
            TxAction::Send => self.start_transmit(tx),
        }
    }

    fn start_transmit(&self, tx: &mut TxScheduler<TX_SLOTS>) {
        if tx.state() == AdapterState::Receiving {
            let env = self.rx_env();
            self.rx.with(|rx| rx.stop(&env));
        }
        let Some(head) = tx.head() else {
            return;
        };

        // SAFETY: the bounce buffer is only written here, under the queue
        // lock, and only while no send is in flight.
        let buf = unsafe { &mut *self.tx_buffer.get() };
        if tx.speed().class().uses_dma() {
            let len = head.data().len();
            buf[..len].copy_from_slice(head.data());
            self.hw.set_interrupt_mask(InterruptMask::DMA_TRANSMIT);
            self.hw.start_dma(DmaTransfer {
                addr: buf.as_mut_ptr(),
                offset: 0,
                len,
                direction: DmaDirection::Transmit,
            });
        } else {
            let Some(len) = fcs::append(head.data(), buf) else {
                return;
            };
            self.hw.set_interrupt_mask(InterruptMask::SIR_TRANSMIT);
            self.hw.start_sir_transmit(&buf[..len]);
        }

        tx.mark_transmitting();
        self.stats.record_tx_started();
    }

    // =========================================================================
    // Speed / state
    // =========================================================================

    /// Change the link speed.
    ///
    /// Applied at once when nothing is queued; otherwise after the last
    /// frame queued so far has completed, so a burst never changes speed
    /// midway.
    pub fn set_speed(&self, speed: Speed) -> Result<()> {
        if !self.config.supported_speeds.contains(speed) {
            return Err(ConfigError::UnsupportedSpeed.into());
        }
        let mut tx = self.tx.lock();
        if !tx.is_open() {
            return Err(IoError::NotOpen.into());
        }
        if tx.request_speed(speed) == SpeedRequest::Now {
            self.switch_speed(&mut tx, speed);
            self.resume_reception(&mut tx);
        }
        Ok(())
    }

    /// Reprogram the link. Frames already in the window stay on the Full
    /// list and are delivered on the next deferred run.
    fn switch_speed(&self, tx: &mut TxScheduler<TX_SLOTS>, speed: Speed) {
        #[cfg(feature = "log")]
        debug!("irda: switching to {} b/s", speed.bits_per_sec());
        let env = self.rx_env();
        self.rx.with(|rx| {
            rx.stop(&env);
            rx.set_speed(speed);
        });
        self.hw.set_speed(speed);
        tx.set_speed(speed);
    }

    fn resume_reception(&self, tx: &mut TxScheduler<TX_SLOTS>) {
        tx.set_receiving();
        self.hw.set_interrupt_mask(receive_mask(tx.speed()));
        let env = self.rx_env();
        self.rx.with(|rx| rx.start(&env));
    }

    // =========================================================================
    // Interrupt / deferred
    // =========================================================================

    /// Interrupt handler entry. Records `raw` event bits for
    /// [`run_deferred`](Self::run_deferred) and returns `true` if deferred
    /// work should be scheduled.
    #[inline]
    pub fn on_interrupt(&self, raw: u8) -> bool {
        if raw == 0 {
            return false;
        }
        self.deferred.fetch_or(raw, Ordering::AcqRel);
        true
    }

    /// Queue one unstuffed SIR frame, FCS included. Callable from the
    /// interrupt handler. Returns `false` if the frame was dropped.
    pub fn receive_sir_frame(&self, frame: &[u8]) -> bool {
        let env = self.rx_env();
        let queued = self.rx.with(|rx| rx.receive_sir(&env, frame));
        if queued {
            self.deferred.fetch_or(irq::SIR_RX, Ordering::AcqRel);
        }
        queued
    }

    /// Deferred processing: transmit completion, turnaround expiry, receive
    /// checks, then delivery of everything on the Full list.
    pub fn run_deferred<P: Protocol>(&self, proto: &mut P) {
        let status = InterruptStatus::from_raw(self.deferred.swap(0, Ordering::AcqRel));

        if status.tx_done() {
            // Spurious completions are asserted inside.
            let _ = self.complete_send(proto);
        }
        if status.turnaround_timer {
            let mut tx = self.tx.lock();
            if tx.turnaround_expired() {
                self.pump(&mut tx);
            }
        }
        if status.dma_rx || status.poll_timer {
            self.check_receive(proto);
        }
        self.deliver(proto);
    }

    /// MIR/FIR receive check: collect frames once the DMA has gone quiet,
    /// deliver them, and re-arm into the largest free span.
    fn check_receive<P: Protocol>(&self, proto: &mut P) {
        let env = self.rx_env();
        if self.rx.with(|rx| rx.poll(&env)) != PollOutcome::Walked {
            return;
        }

        self.deliver(proto);

        let tx = self.tx.lock();
        if tx.state() == AdapterState::Receiving {
            self.rx.with(|rx| rx.restart(&env));
        }
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Hand every Full buffer to the consumer, oldest first.
    fn deliver<P: Protocol>(&self, proto: &mut P) {
        if self.delivering.swap(true, Ordering::Acquire) {
            return;
        }

        while let Some(head) = self.rx.with_ref(|rx| rx.pool.full_front()) {
            // SAFETY: the buffer stays on Full until this iteration moves it,
            // so nothing reuses its storage meanwhile.
            let raw = unsafe { self.storage_bytes(head.storage) };
            let frame = match head.storage {
                Storage::Private { .. } => {
                    if !fcs::is_valid(raw) {
                        self.stats.record_frame_error(FrameError::Crc);
                        #[cfg(feature = "log")]
                        debug!("irda: SIR frame failed FCS, {} bytes", raw.len());
                        self.rx.with(|rx| rx.pool.release_full(head.index));
                        continue;
                    }
                    &raw[..raw.len() - SIR_FCS_SIZE]
                }
                Storage::Window { .. } => raw,
            };

            if self.rx.with(|rx| rx.take_media_busy()) {
                proto.on_media_busy();
            }
            let outcome = proto.on_frame_received(frame, PendingFrame::new(head.index, head.generation));
            self.stats.record_delivered();

            let len = frame.len();
            self.rx.with(|rx| match outcome {
                Delivery::Accepted => rx.pool.release_full(head.index),
                Delivery::Deferred => rx.pool.defer(head.index, len),
            });
        }

        let env = self.rx_env();
        self.rx.with(|rx| rx.retry_stalled(&env));
        self.delivering.store(false, Ordering::Release);
    }

    /// Borrow the bytes of a deferred frame.
    pub fn frame_data<'a>(&'a self, token: &'a PendingFrame) -> Option<&'a [u8]> {
        let storage = self.rx.with_ref(|rx| rx.pool.pending_storage(token))?;
        // SAFETY: the buffer stays Pending until `token` is released, which
        // the borrow of `token` rules out while the slice lives.
        Some(unsafe { self.storage_bytes(storage) })
    }

    /// Return a deferred frame. Restarts a stalled receiver if the released
    /// slice opened up enough window space.
    ///
    /// # Errors
    ///
    /// [`IoError::NotPending`] for a stale token.
    pub fn release_pending(&self, token: PendingFrame) -> Result<()> {
        let env = self.rx_env();
        self.rx.with(|rx| -> IoResult<()> {
            rx.pool.release_pending(token)?;
            rx.retry_stalled(&env);
            Ok(())
        })?;
        Ok(())
    }

    /// Fire [`Protocol::on_media_busy`] again before the next delivered frame.
    pub fn reset_media_busy(&self) {
        self.rx.with(RxEngine::arm_media_busy);
    }

    /// # Safety
    ///
    /// `storage` must belong to a Full or Pending buffer for as long as the
    /// returned slice lives.
    unsafe fn storage_bytes(&self, storage: Storage) -> &[u8] {
        match storage {
            Storage::Window { claimed, len } => {
                debug_assert!(claimed.end() <= WINDOW && len <= claimed.len);
                // SAFETY: claimed slices lie inside the window and no DMA
                // targets them while claimed.
                unsafe { core::slice::from_raw_parts(self.window.get().cast::<u8>().add(claimed.offset), len) }
            }
            Storage::Private { slot, len } => {
                debug_assert!((slot as usize) < RX_BUFS && len <= SIR_BUFFER_SIZE);
                // SAFETY: the spare is owned by the buffer holding `storage`.
                unsafe {
                    core::slice::from_raw_parts(
                        self.spares.get().cast::<u8>().add(slot as usize * SIR_BUFFER_SIZE),
                        len,
                    )
                }
            }
        }
    }

    fn rx_env(&self) -> RxEnv<'_, H> {
        RxEnv {
            hw: &self.hw,
            stats: &self.stats,
            max_frame_size: self.config.max_frame_size,
            min_header_size: self.config.min_header_size,
            rx_poll_ms: self.config.rx_poll_ms,
            window: self.window.get().cast::<u8>(),
            window_len: WINDOW,
            spares: self.spares.get().cast::<u8>(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Hardware collaborator
    #[inline(always)]
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Configuration the adapter was created with
    #[inline(always)]
    pub fn config(&self) -> &IrdaConfig {
        &self.config
    }

    /// True between [`open`](Self::open) and [`close`](Self::close)
    pub fn is_open(&self) -> bool {
        self.tx.lock().is_open()
    }

    /// Current adapter state
    pub fn state(&self) -> AdapterState {
        self.tx.lock().state()
    }

    /// Current link speed
    pub fn speed(&self) -> Speed {
        self.tx.lock().speed()
    }

    /// Frames queued for transmission, including the one in flight
    pub fn queued_sends(&self) -> usize {
        self.tx.lock().queued()
    }

    /// Counter snapshot
    pub fn statistics(&self) -> IrdaStats {
        self.stats.snapshot()
    }

    /// Buffers on each receive list
    pub fn pool_counts(&self) -> PoolCounts {
        self.rx.with_ref(|rx| rx.pool.counts())
    }

    /// True while reception is stopped for lack of window space
    pub fn is_rx_stalled(&self) -> bool {
        self.rx.with_ref(|rx| rx.mode() == RxMode::Stalled)
    }

    /// Largest span of the window not claimed by a received frame, or
    /// `None` if the window is fully claimed.
    pub fn largest_free_span(&self) -> Option<Span> {
        self.rx.with_ref(|rx| rx.pool.largest_free_span(WINDOW, 0).ok())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
