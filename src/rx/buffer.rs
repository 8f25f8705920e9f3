//! Receive buffer descriptors.
//!
//! A descriptor never owns memory directly. Its [`Storage`] names where the
//! payload lives: one of the private SIR spares, or a slice of the shared
//! DMA window.

use crate::internal::window::Span;

/// Where a received frame's bytes live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Storage {
    /// Private SIR spare `slot`; `len` bytes starting at its first byte
    Private { slot: u8, len: usize },
    /// Slice of the DMA window. `claimed` covers the whole frame as the
    /// hardware wrote it (FCS included); `len` is the deliverable prefix.
    Window { claimed: Span, len: usize },
}

impl Storage {
    /// Window range claimed by this storage, if it lives in the window
    #[inline(always)]
    pub(crate) fn window_span(&self) -> Option<Span> {
        match *self {
            Storage::Window { claimed, .. } => Some(claimed),
            Storage::Private { .. } => None,
        }
    }

    /// Bytes available to the consumer
    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        match *self {
            Storage::Private { len, .. } | Storage::Window { len, .. } => len,
        }
    }

    /// Same storage, shortened to `len` bytes
    pub(crate) fn truncated(self, len: usize) -> Self {
        match self {
            Storage::Private { slot, len: old } => Storage::Private { slot, len: len.min(old) },
            Storage::Window { claimed, len: old } => Storage::Window {
                claimed,
                len: len.min(old),
            },
        }
    }
}

/// Ownership state of a receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum BufferState {
    /// On the Free list, no payload
    #[default]
    Free,
    /// Holds a received frame awaiting delivery
    Full,
    /// Lent to the upstream consumer
    Pending,
}

/// One receive buffer descriptor.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RxBuffer {
    pub(crate) state: BufferState,
    /// Set only while `state != Free`
    pub(crate) storage: Option<Storage>,
    /// Bumped every time the buffer returns to Free; stale tokens carry an
    /// older value
    pub(crate) generation: u16,
}

impl RxBuffer {
    /// A free descriptor
    pub(crate) const fn new() -> Self {
        Self {
            state: BufferState::Free,
            storage: None,
            generation: 0,
        }
    }

    /// Window range claimed while Full or Pending
    #[inline(always)]
    pub(crate) fn window_span(&self) -> Option<Span> {
        self.storage.and_then(|s| s.window_span())
    }
}
