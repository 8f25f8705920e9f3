//! Upstream consumer interface.
//!
//! The protocol layer above the engine (IrLAP) receives frames and send
//! completions through [`Protocol`]. Callbacks are always invoked with no
//! engine lock held, so a callback may call back into the adapter.

/// Identifier returned by [`Irda::send`](crate::Irda::send) and echoed in
/// [`Protocol::on_send_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameId(pub(crate) u32);

impl FrameId {
    /// Raw sequence number
    #[inline(always)]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Consumer's answer to a received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delivery {
    /// Frame consumed during the callback; its buffer is recycled at once
    /// and the token passed with it goes stale.
    Accepted,
    /// Consumer kept the token and will return the buffer later with
    /// [`Irda::release_pending`](crate::Irda::release_pending).
    Deferred,
}

/// Outcome of one send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendStatus {
    /// Frame went out
    Ok,
    /// Transmit underrun; the frame was corrupted on the air
    Underrun,
    /// Adapter closed before the frame went out
    Aborted,
}

impl SendStatus {
    /// True for [`SendStatus::Ok`]
    #[inline(always)]
    pub const fn is_ok(self) -> bool {
        matches!(self, SendStatus::Ok)
    }
}

/// Ownership token for a frame lent to the consumer.
///
/// Not `Clone`: exactly one token exists per loan. Borrow the payload with
/// [`Irda::frame_data`](crate::Irda::frame_data) and hand the token back
/// with [`Irda::release_pending`](crate::Irda::release_pending).
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a deferred frame holds a receive buffer until released"]
pub struct PendingFrame {
    index: u8,
    generation: u16,
}

impl PendingFrame {
    #[inline(always)]
    pub(crate) const fn new(index: u8, generation: u16) -> Self {
        Self { index, generation }
    }

    #[inline(always)]
    pub(crate) const fn index(&self) -> u8 {
        self.index
    }

    #[inline(always)]
    pub(crate) const fn generation(&self) -> u16 {
        self.generation
    }
}

/// Callbacks from the engine to the protocol layer.
pub trait Protocol {
    /// A validated frame (FCS stripped). Return [`Delivery::Deferred`] and
    /// keep `token` to hold on to the bytes past the callback.
    fn on_frame_received(&mut self, frame: &[u8], token: PendingFrame) -> Delivery;

    /// The frame queued under `id` finished.
    fn on_send_complete(&mut self, id: FrameId, status: SendStatus);

    /// Fired once per receive burst, before the first frame is delivered.
    fn on_media_busy(&mut self) {}
}
