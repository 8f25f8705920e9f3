//! Error types for the IrDA receive/transmit engine
//!
//! Errors are organized by domain:
//! - [`ConfigError`]: Bring-up and configuration failures
//! - [`DmaError`]: Receive window and transmit slot exhaustion
//! - [`IoError`]: Adapter lifecycle and protocol-state violations
//!
//! Frame-level faults (bad FCS, hardware overruns, size errors) are never
//! returned as errors. They drop one frame and show up in the statistics.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and bring-up errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Invalid configuration parameter
    InvalidConfig,
    /// Receive window cannot hold one maximum-size frame plus trailer
    WindowTooSmall,
    /// Requested speed is not in the supported set
    UnsupportedSpeed,
    /// Maximum frame size outside the supported range
    FrameSizeOutOfRange,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::WindowTooSmall => "receive window too small",
            ConfigError::UnsupportedSpeed => "unsupported speed",
            ConfigError::FrameSizeOutOfRange => "frame size out of range",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// Receive window and transmit buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// No free span in the receive window large enough for one frame
    InsufficientSpace,
    /// Frame larger than the configured maximum
    FrameTooLarge,
    /// Frame shorter than the minimum header
    InvalidLength,
    /// Every transmit queue slot is occupied
    QueueFull,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::InsufficientSpace => "insufficient receive window space",
            DmaError::FrameTooLarge => "frame too large",
            DmaError::InvalidLength => "invalid frame length",
            DmaError::QueueFull => "transmit queue full",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Lifecycle and protocol-state errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Adapter has not been opened
    NotOpen,
    /// Adapter is already open
    AlreadyOpen,
    /// Send completion with no frame outstanding
    NoOutstandingSend,
    /// Token does not name a buffer currently held by the consumer
    NotPending,
    /// Consumer still held buffers when the adapter was closed
    PendingAtTeardown,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::NotOpen => "adapter not open",
            IoError::AlreadyOpen => "adapter already open",
            IoError::NoOutstandingSend => "no outstanding send",
            IoError::NotPending => "buffer not pending",
            IoError::PendingAtTeardown => "buffers pending at teardown",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// ```ignore
/// match irda.send(&frame, None) {
///     Err(Error::Dma(DmaError::QueueFull)) => { /* back off */ }
///     Err(Error::Io(IoError::NotOpen)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// DMA error
    Dma(DmaError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for adapter operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for DMA operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;

    #[test]
    fn config_error_as_str_non_empty() {
        let variants = [
            ConfigError::InvalidConfig,
            ConfigError::WindowTooSmall,
            ConfigError::UnsupportedSpeed,
            ConfigError::FrameSizeOutOfRange,
        ];

        for variant in variants {
            assert!(!variant.as_str().is_empty(), "ConfigError::{variant:?} has empty string");
        }
    }

    #[test]
    fn dma_error_as_str_non_empty() {
        let variants = [
            DmaError::InsufficientSpace,
            DmaError::FrameTooLarge,
            DmaError::InvalidLength,
            DmaError::QueueFull,
        ];

        for variant in variants {
            assert!(!variant.as_str().is_empty(), "DmaError::{variant:?} has empty string");
        }
    }

    #[test]
    fn io_error_as_str_non_empty() {
        let variants = [
            IoError::NotOpen,
            IoError::AlreadyOpen,
            IoError::NoOutstandingSend,
            IoError::NotPending,
            IoError::PendingAtTeardown,
        ];

        for variant in variants {
            assert!(!variant.as_str().is_empty(), "IoError::{variant:?} has empty string");
        }
    }

    #[test]
    fn dma_error_display() {
        let display = format!("{}", DmaError::InsufficientSpace);
        assert_eq!(display, "insufficient receive window space");
    }

    #[test]
    fn error_from_domain_errors() {
        assert_eq!(Error::from(ConfigError::WindowTooSmall), Error::Config(ConfigError::WindowTooSmall));
        assert_eq!(Error::from(DmaError::QueueFull), Error::Dma(DmaError::QueueFull));
        assert_eq!(Error::from(IoError::NotPending), Error::Io(IoError::NotPending));
    }

    #[test]
    fn error_display_prefixes_domain() {
        let display = format!("{}", Error::Io(IoError::NoOutstandingSend));
        assert!(display.starts_with("io: "));
        assert!(display.contains("outstanding"));

        let display = format!("{}", Error::Config(ConfigError::UnsupportedSpeed));
        assert!(display.starts_with("config: "));
    }

    #[test]
    fn question_mark_converts() {
        fn inner() -> DmaResult<()> {
            Err(DmaError::FrameTooLarge)
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        assert_eq!(outer(), Err(Error::Dma(DmaError::FrameTooLarge)));
    }
}
