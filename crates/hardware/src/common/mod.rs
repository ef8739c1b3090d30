//! Common types used throughout the accelerator simulator.
//!
//! This module provides the building blocks shared by every component:
//! 1. **Memory Access:** Read/write direction of SRAM accesses and DRAM requests.
//! 2. **Buffer Identity:** The closed set of on-chip buffers and a map keyed by it.
//! 3. **Error Handling:** The fatal `SimError` type and the `SimResult` alias.

/// Access direction, buffer identity and buffer maps.
pub mod data;

/// Fatal error types.
pub mod error;

pub use data::{AccessType, BufferKind, BufferMap};
pub use error::{SimError, SimResult};
