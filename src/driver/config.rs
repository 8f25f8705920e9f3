//! Configuration types for the IrDA engine

use super::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_RX_POLL_MS, FIR_FCS_SIZE, MAX_FRAME_SIZE, MIN_HEADER_SIZE, MIR_FCS_SIZE, SIR_FCS_SIZE,
};

/// IrDA link speed tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkClass {
    /// Serial IR: UART framed, byte-stuffed, software FCS
    Sir,
    /// Medium IR: hardware framed with a frame-status FIFO
    Mir,
    /// Fast IR: hardware framed with a frame-status FIFO
    Fir,
}

impl LinkClass {
    /// True for the hardware-framed tiers that receive through the DMA window
    #[inline(always)]
    #[must_use]
    pub const fn uses_dma(self) -> bool {
        !matches!(self, LinkClass::Sir)
    }
}

/// IrDA link speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Speed {
    /// 2400 b/s
    Sir2400 = 0,
    /// 9600 b/s (IrLAP contention speed)
    #[default]
    Sir9600 = 1,
    /// 19200 b/s
    Sir19200 = 2,
    /// 38400 b/s
    Sir38400 = 3,
    /// 57600 b/s
    Sir57600 = 4,
    /// 115200 b/s
    Sir115200 = 5,
    /// 576 kb/s
    Mir576k = 6,
    /// 1.152 Mb/s
    Mir1152k = 7,
    /// 4 Mb/s
    Fir4M = 8,
}

impl Speed {
    /// Every speed, slowest first
    pub const ALL: [Speed; 9] = [
        Speed::Sir2400,
        Speed::Sir9600,
        Speed::Sir19200,
        Speed::Sir38400,
        Speed::Sir57600,
        Speed::Sir115200,
        Speed::Mir576k,
        Speed::Mir1152k,
        Speed::Fir4M,
    ];

    /// Bit rate in bits per second
    #[must_use]
    pub const fn bits_per_sec(self) -> u32 {
        match self {
            Speed::Sir2400 => 2_400,
            Speed::Sir9600 => 9_600,
            Speed::Sir19200 => 19_200,
            Speed::Sir38400 => 38_400,
            Speed::Sir57600 => 57_600,
            Speed::Sir115200 => 115_200,
            Speed::Mir576k => 576_000,
            Speed::Mir1152k => 1_152_000,
            Speed::Fir4M => 4_000_000,
        }
    }

    /// Look up a speed by bit rate
    #[must_use]
    pub fn from_bits_per_sec(bps: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.bits_per_sec() == bps)
    }

    /// Speed tier
    #[must_use]
    pub const fn class(self) -> LinkClass {
        match self {
            Speed::Mir576k | Speed::Mir1152k => LinkClass::Mir,
            Speed::Fir4M => LinkClass::Fir,
            _ => LinkClass::Sir,
        }
    }

    /// FCS trailer length: 2 bytes below 4 Mb/s, 4 bytes at/above
    #[must_use]
    pub const fn fcs_size(self) -> usize {
        match self.class() {
            LinkClass::Sir => SIR_FCS_SIZE,
            LinkClass::Mir => MIR_FCS_SIZE,
            LinkClass::Fir => FIR_FCS_SIZE,
        }
    }

    /// Bit for this speed in a [`SpeedMask`]
    #[inline(always)]
    const fn bit(self) -> u16 {
        1 << self as u8
    }
}

/// Set of speeds the transceiver supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpeedMask(u16);

impl SpeedMask {
    /// Every speed up to and including FIR
    pub const ALL: SpeedMask = SpeedMask(0x01FF);
    /// SIR speeds only
    pub const SIR_ONLY: SpeedMask = SpeedMask(0x003F);

    /// Empty mask
    #[must_use]
    pub const fn empty() -> Self {
        SpeedMask(0)
    }

    /// Add a speed
    #[must_use]
    pub const fn with(self, speed: Speed) -> Self {
        SpeedMask(self.0 | speed.bit())
    }

    /// Check membership
    #[must_use]
    pub const fn contains(self, speed: Speed) -> bool {
        self.0 & speed.bit() != 0
    }

    /// Raw bit mask
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl Default for SpeedMask {
    fn default() -> Self {
        SpeedMask::ALL
    }
}

/// Engine configuration, read once at bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrdaConfig {
    /// Speed programmed at open (IrLAP discovery runs at 9600)
    pub initial_speed: Speed,
    /// Speeds the transceiver supports
    pub supported_speeds: SpeedMask,
    /// Largest frame accepted or sent, excluding FCS
    pub max_frame_size: usize,
    /// Smallest frame delivered upstream, excluding FCS
    pub min_header_size: usize,
    /// Interval between receive DMA progress checks
    pub rx_poll_ms: u32,
}

impl Default for IrdaConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl IrdaConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initial_speed: Speed::Sir9600,
            supported_speeds: SpeedMask::ALL,
            max_frame_size: MAX_FRAME_SIZE,
            min_header_size: MIN_HEADER_SIZE,
            rx_poll_ms: DEFAULT_RX_POLL_MS,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the speed programmed at open
    #[must_use]
    pub const fn with_initial_speed(mut self, speed: Speed) -> Self {
        self.initial_speed = speed;
        self
    }

    /// Set the supported speed mask
    #[must_use]
    pub const fn with_supported_speeds(mut self, mask: SpeedMask) -> Self {
        self.supported_speeds = mask;
        self
    }

    /// Set the maximum frame size (excluding FCS)
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set the minimum deliverable frame size
    #[must_use]
    pub const fn with_min_header_size(mut self, size: usize) -> Self {
        self.min_header_size = size;
        self
    }

    /// Set the receive poll interval
    #[must_use]
    pub const fn with_rx_poll_ms(mut self, ms: u32) -> Self {
        self.rx_poll_ms = ms;
        self
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_frame_size > MAX_FRAME_SIZE || self.max_frame_size < MIN_HEADER_SIZE {
            return Err(ConfigError::FrameSizeOutOfRange);
        }
        if self.min_header_size == 0 || self.min_header_size > self.max_frame_size {
            return Err(ConfigError::InvalidConfig);
        }
        if self.rx_poll_ms == 0 {
            return Err(ConfigError::InvalidConfig);
        }
        if !self.supported_speeds.contains(self.initial_speed) {
            return Err(ConfigError::UnsupportedSpeed);
        }
        Ok(())
    }
}

/// Adapter operating state, mutated only under the queue lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdapterState {
    /// Closed, or open with neither direction active
    #[default]
    None,
    /// Receiver armed
    Receiving,
    /// Frame in flight
    Transmitting,
}

// =============================================================================
// Unit Tests
// =============================================================================
