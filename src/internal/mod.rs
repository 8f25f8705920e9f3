//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - [`constants`]: Frame sizes, default counts, status and interrupt bits
//! - [`fcs`]: SIR CRC-16 frame check sequence
//! - [`ring`]: Fixed-capacity index queue backing the buffer lists
//! - [`window`]: Largest-free-span search in the receive DMA window
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Do not depend on any types
//! or functions in this module from external code. They are subject to change
//! without notice.

pub(crate) mod constants;
pub(crate) mod fcs;
pub(crate) mod ring;
pub(crate) mod window;
