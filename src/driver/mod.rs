//! Core engine components for an IrDA adapter.
//!
//! - [`config`] - Link speeds, adapter state and the configuration builder
//! - [`error`] - Error types and result aliases
//! - [`interrupt`] - Interrupt event bits and masks
//! - [`irda`] - The adapter itself
//! - [`protocol`] - The upstream consumer interface and deferred-frame tokens
//! - [`stats`] - Drop, error and stall counters
//!
//! # Example
//!
//! ```ignore
//! use ph_irda::driver::{IrdaConfig, IrdaDefault, Speed};
//!
//! let config = IrdaConfig::new().with_initial_speed(Speed::Fir4M);
//! let irda = IrdaDefault::new(board, config)?;
//! ```

// Submodules
pub mod config;
pub mod error;
pub mod interrupt;
pub mod irda;
pub mod protocol;
pub mod stats;

// Re-exports for convenience
pub use config::{AdapterState, IrdaConfig, LinkClass, Speed, SpeedMask};
pub use error::{ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, Result};
pub use interrupt::{InterruptMask, InterruptStatus};
pub use irda::{Irda, IrdaDefault, IrdaSmall};
pub use protocol::{Delivery, FrameId, PendingFrame, Protocol, SendStatus};
pub use stats::IrdaStats;
