//! Receive side: buffer descriptors, the buffer pool and the MIR/FIR
//! delivery pipeline.
//!
//! Buffers cycle FREE -> FULL -> PENDING -> FREE. All list manipulation
//! happens inside the adapter's critical section; handing frames to the
//! consumer happens outside it, in the adapter.

pub(crate) mod buffer;
pub(crate) mod pipeline;
pub(crate) mod pool;

pub use pool::PoolCounts;
