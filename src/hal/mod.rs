//! Hardware Abstraction Layer
//!
//! The engine never touches registers itself. Everything it needs from the
//! controller goes through the [`IrdaHardware`] trait: the frame-status
//! FIFO, receive/transmit DMA programming, interrupt masking, speed
//! programming and the one-shot timer.
//!
//! # Modules
//!
//! - [`hardware`]: The collaborator trait and the plain data it exchanges

pub mod hardware;

pub use hardware::{DmaDirection, DmaTransfer, FrameError, FrameStatus, IrdaHardware, TimerKind};
