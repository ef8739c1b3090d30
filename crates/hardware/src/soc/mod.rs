//! Memory-side components of the accelerator.
//!
//! Everything that stores data rather than computing on it lives here: the on-chip
//! SRAM buffers and the off-chip DRAM model behind the control processor.

/// On-chip SRAM and off-chip DRAM.
pub mod memory;
