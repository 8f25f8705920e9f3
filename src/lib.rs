//! IrDA Adapter Engine
//!
//! A `no_std`, `no_alloc` receive/transmit buffer engine for infrared
//! (IrDA) serial adapters running at SIR, MIR and FIR speeds.
//!
//! The crate sits between a link-layer consumer (an IrLAP implementation)
//! and a controller with a frame-status FIFO and a receive DMA engine. It
//! owns all frame memory and keeps it moving: frames land in a shared DMA
//! window, are handed upstream without copying, and the window space they
//! occupy is reused as soon as the consumer gives it back.
//!
//! # Architecture
//!
//! 1. **Adapter** ([`driver::irda`]): lifecycle, interrupt entry points,
//!    deferred processing, speed changes
//! 2. **Receive** (internal): a fixed buffer pool cycling Free, Full and
//!    Pending, the MIR/FIR frame-status walk, SIR frame intake and the
//!    largest-free-span window allocator
//! 3. **Transmit** (internal): a FIFO send queue with per-frame turnaround
//!    delay and deferred speed switching
//! 4. **HAL** ([`hal`]): the [`IrdaHardware`] trait the board implements
//!
//! ## Standard Compliance
//!
//! - **IrDA SIR**: CRC-16 (CCITT) frame check sequence in software
//! - **IrDA MIR/FIR**: 2-byte and 4-byte FCS appended by the hardware
//! - **IrLAP**: minimum turnaround time honored before each frame
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types
//! - `log`: Log drops, stalls and speed changes through the `log` facade
//!
//! # Example
//!
//! ```ignore
//! use ph_irda::{IrdaConfig, IrdaDefault, Speed};
//!
//! let config = IrdaConfig::new().with_initial_speed(Speed::Sir9600);
//! let irda = IrdaDefault::new(board, config)?;
//! irda.open()?;
//!
//! // interrupt handler
//! if irda.on_interrupt(events) {
//!     pend_deferred_work();
//! }
//!
//! // deferred context
//! irda.run_deferred(&mut irlap);
//! ```
//!
//! # Memory Requirements
//!
//! With [`IrdaDefault`] (16 receive buffers, 16 KB window, 8 send slots):
//! about 66 KB, all inline in the adapter. The window and the transmit
//! bounce buffer must be DMA-reachable.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;
mod rx;
mod tx;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{AdapterState, IrdaConfig, LinkClass, Speed, SpeedMask};
pub use driver::error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result,
};
pub use driver::interrupt::{InterruptMask, InterruptStatus};
pub use driver::irda::{Irda, IrdaDefault, IrdaSmall};
pub use driver::protocol::{Delivery, FrameId, PendingFrame, Protocol, SendStatus};
pub use driver::stats::IrdaStats;
pub use hal::{DmaDirection, DmaTransfer, FrameError, FrameStatus, IrdaHardware, TimerKind};
pub use internal::window::Span;
pub use rx::PoolCounts;

/// Shared engine constants.
///
/// Grouped into a dedicated module to keep the top-level facade focused on
/// engine types.
pub mod constants {
    pub use crate::internal::constants::{
        ADDR_CONTROL_SIZE, DEFAULT_RX_POLL_MS, DEFAULT_TX_SLOTS, DMA_ALIGN, FIR_FCS_SIZE,
        MAX_FCS_SIZE, MAX_FRAME_SIZE, MAX_I_DATA_SIZE, MIN_HEADER_SIZE,
        MIR_FCS_SIZE, RCV_DMA_SIZE, RX_BUFFER_COUNT, SIR_BUFFER_SIZE, SIR_FCS_SIZE,
        STATUS_FIFO_DEPTH, TURNAROUND_TICK_US, frame_stat, irq,
    };
}
