//! Accelerator Memory System.
//!
//! This module implements both levels of the memory hierarchy seen by the datapath. It provides:
//! 1. **SRAM:** The banked on-chip buffers (NBin, NBout, SB) with finite ports and fixed latency.
//! 2. **DRAM:** Off-chip requests, the [`DramInterface`] boundary and a single-channel model.
//! 3. **Controller:** Per-access latency (fixed, or row-buffer CAS/RAS/precharge).

/// DRAM latency models.
pub mod controller;

/// DRAM requests, interface and timing model.
pub mod dram;

/// Banked on-chip SRAM.
pub mod sram;

pub use self::dram::{DramInterface, DramModel, DramStats, MemoryRequest, RequestId};
pub use self::sram::{BankedMemory, SramStats};
