//! Interrupt status decoding and per-mode interrupt masks.
//!
//! The interrupt handler only records which events fired; the work itself
//! runs later in deferred context (see [`Irda::run_deferred`]).
//!
//! [`Irda::run_deferred`]: crate::Irda::run_deferred

use crate::internal::constants::irq;

// =============================================================================
// Interrupt Status
// =============================================================================

/// Interrupt status flags parsed from the controller's event register.
///
/// # Example
///
/// ```ignore
/// let status = InterruptStatus::from_raw(raw);
/// if status.dma_tx {
///     // transmit completion
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    /// SIR receive data available
    pub sir_rx: bool,
    /// SIR frame fully shifted out
    pub sir_tx: bool,
    /// MIR/FIR receive event
    pub dma_rx: bool,
    /// MIR/FIR transmit DMA finished
    pub dma_tx: bool,
    /// Transmit underrun
    pub tx_underrun: bool,
    /// Turnaround timer expired
    pub turnaround_timer: bool,
    /// Receive poll timer expired
    pub poll_timer: bool,
}

impl InterruptStatus {
    /// Create from raw event register value
    #[inline]
    pub fn from_raw(status: u8) -> Self {
        Self {
            sir_rx: (status & irq::SIR_RX) != 0,
            sir_tx: (status & irq::SIR_TX) != 0,
            dma_rx: (status & irq::DMA_RX) != 0,
            dma_tx: (status & irq::DMA_TX) != 0,
            tx_underrun: (status & irq::TX_UNDERRUN) != 0,
            turnaround_timer: (status & irq::TURNAROUND_TIMER) != 0,
            poll_timer: (status & irq::POLL_TIMER) != 0,
        }
    }

    /// Convert back to raw bits
    #[inline]
    pub fn to_raw(&self) -> u8 {
        let mut val = 0u8;
        if self.sir_rx {
            val |= irq::SIR_RX;
        }
        if self.sir_tx {
            val |= irq::SIR_TX;
        }
        if self.dma_rx {
            val |= irq::DMA_RX;
        }
        if self.dma_tx {
            val |= irq::DMA_TX;
        }
        if self.tx_underrun {
            val |= irq::TX_UNDERRUN;
        }
        if self.turnaround_timer {
            val |= irq::TURNAROUND_TIMER;
        }
        if self.poll_timer {
            val |= irq::POLL_TIMER;
        }
        val
    }

    /// Check if any interrupt occurred
    #[inline]
    pub fn any(&self) -> bool {
        self.to_raw() != 0
    }

    /// True when a transmit finished, successfully or not.
    ///
    /// An underrun alone is not a completion: the controller still raises
    /// `DMA_TX`/`SIR_TX` for the frame, and the underrun is read back from
    /// the hardware when that completion is handled.
    #[inline]
    pub fn tx_done(&self) -> bool {
        self.dma_tx || self.sir_tx
    }
}

// =============================================================================
// Interrupt Mask
// =============================================================================

/// Interrupt enable mask programmed on every mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptMask(u8);

impl InterruptMask {
    /// Everything disabled (teardown)
    pub const NONE: InterruptMask = InterruptMask(0);

    /// SIR receiving: byte-level receive, plus the turnaround timer of a
    /// frame waiting to go out
    pub const SIR_RECEIVE: InterruptMask = InterruptMask(irq::SIR_RX | irq::TURNAROUND_TIMER);

    /// SIR transmitting: completion plus underrun
    pub const SIR_TRANSMIT: InterruptMask = InterruptMask(irq::SIR_TX | irq::TX_UNDERRUN);

    /// MIR/FIR receiving: receive events and both timers
    pub const DMA_RECEIVE: InterruptMask =
        InterruptMask(irq::DMA_RX | irq::POLL_TIMER | irq::TURNAROUND_TIMER);

    /// MIR/FIR transmitting: completion plus underrun
    pub const DMA_TRANSMIT: InterruptMask = InterruptMask(irq::DMA_TX | irq::TX_UNDERRUN);

    /// Raw mask bits
    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True when every bit of `status` is enabled
    #[inline(always)]
    pub const fn allows(self, status: u8) -> bool {
        status & !self.0 == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
