//! Transmit side: the FIFO send queue and the scheduler that applies
//! turnaround delays and deferred speed changes.

pub(crate) mod queue;
pub(crate) mod scheduler;
