//! Centralized Constants
//!
//! Single source of truth for the sizes, timings and hardware bit
//! assignments used by the receive/transmit engine.
//!
//! # Organization
//!
//! - **Frame sizes**: IrLAP frame dimensions and FCS trailers
//! - **Buffer counts**: default pool, window and queue sizes
//! - **Timing**: turnaround and receive poll granularity
//! - **Frame status / interrupt bits**: hardware-reported flags

// =============================================================================
// Frame Sizes
// =============================================================================

/// Maximum IrLAP information field size
pub const MAX_I_DATA_SIZE: usize = 2048;

/// Address + control bytes that precede the information field
pub const ADDR_CONTROL_SIZE: usize = 2;

/// Maximum frame size excluding FCS (address + control + information)
pub const MAX_FRAME_SIZE: usize = MAX_I_DATA_SIZE + ADDR_CONTROL_SIZE;

/// Smallest frame the engine will deliver (address + control)
pub const MIN_HEADER_SIZE: usize = ADDR_CONTROL_SIZE;

/// FCS trailer at SIR speeds (CRC-16, validated in software)
pub const SIR_FCS_SIZE: usize = 2;

/// FCS trailer at MIR speeds (CRC-16, validated by hardware)
pub const MIR_FCS_SIZE: usize = 2;

/// FCS trailer at FIR speed (CRC-32, validated by hardware)
pub const FIR_FCS_SIZE: usize = 4;

/// Largest FCS trailer across all speeds
pub const MAX_FCS_SIZE: usize = FIR_FCS_SIZE;

/// Size of one private SIR receive buffer (frame + FCS)
pub const SIR_BUFFER_SIZE: usize = MAX_FRAME_SIZE + SIR_FCS_SIZE;

/// Receive DMA window alignment in bytes
pub const DMA_ALIGN: usize = 4;

// =============================================================================
// Default Buffer Counts
// =============================================================================

/// Number of receive buffer descriptors allocated at open
pub const RX_BUFFER_COUNT: usize = 16;

/// Default size of the circular receive DMA window
pub const RCV_DMA_SIZE: usize = 16 * 1024;

/// Default number of transmit queue slots
pub const DEFAULT_TX_SLOTS: usize = 8;

// =============================================================================
// Timing
// =============================================================================

/// Turnaround timer granularity in microseconds (one timer tick = 1 ms)
pub const TURNAROUND_TICK_US: u32 = 1000;

/// Default interval between receive DMA progress checks
pub const DEFAULT_RX_POLL_MS: u32 = 2;

/// Depth of the hardware frame-status FIFO
pub const STATUS_FIFO_DEPTH: usize = 8;

// =============================================================================
// Frame Status FIFO
// =============================================================================

/// Frame status byte bit assignments (one entry per received MIR/FIR frame)
pub mod frame_stat {
    /// Receive FIFO overrun - bytes were lost before reaching DMA
    pub const RX_FIFO_OVERRUN: u8 = 1 << 0;
    /// Status FIFO overrun - earlier status entries were lost
    pub const STATUS_FIFO_OVERRUN: u8 = 1 << 1;
    /// Bad CRC reported by the hardware framer
    pub const BAD_CRC: u8 = 1 << 2;
    /// Physical layer decoding error
    pub const PHY_ERROR: u8 = 1 << 3;
    /// Frame exceeded the programmed maximum length
    pub const MAX_LEN: u8 = 1 << 4;
    /// Entry is valid - a frame is pending behind it
    pub const FRAME_PENDING: u8 = 1 << 7;

    /// All error bits
    pub const ALL_ERRORS: u8 = RX_FIFO_OVERRUN | STATUS_FIFO_OVERRUN | BAD_CRC | PHY_ERROR | MAX_LEN;
}

// =============================================================================
// Interrupt Bits
// =============================================================================

/// Interrupt status/mask bit assignments
pub mod irq {
    /// SIR receive data available (consumed by the byte unstuffing layer)
    pub const SIR_RX: u8 = 1 << 0;
    /// SIR frame fully shifted out
    pub const SIR_TX: u8 = 1 << 1;
    /// MIR/FIR receive event (status FIFO threshold or DMA terminal count)
    pub const DMA_RX: u8 = 1 << 2;
    /// MIR/FIR transmit DMA complete
    pub const DMA_TX: u8 = 1 << 3;
    /// Transmit underrun
    pub const TX_UNDERRUN: u8 = 1 << 4;
    /// Turnaround timer expired
    pub const TURNAROUND_TIMER: u8 = 1 << 5;
    /// Receive poll timer expired
    pub const POLL_TIMER: u8 = 1 << 6;
}
