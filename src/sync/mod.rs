//! Synchronization support.
//!
//! Two primitives guard the engine, always taken in this order:
//!
//! 1. the queue lock (`spin::Mutex`), held by caller and deferred contexts
//!    around the send queue and adapter state; never taken by the interrupt
//!    handler
//! 2. [`CriticalSectionCell`], around the receive lists and DMA window
//!    bookkeeping; the interrupt handler enters it too
//!
//! Consumer callbacks run with neither held.

mod primitives;

pub use primitives::CriticalSectionCell;
