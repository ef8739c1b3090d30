//! DianNao-style accelerator simulator library.
//!
//! This crate implements a cycle-accurate model of a neural-network accelerator datapath:
//! 1. **Core:** A three-stage NFU pipeline (multiply, add/pool, accumulate) joined by
//!    bounded pipeline registers, and the control processor driving it.
//! 2. **Memory:** Banked NBin/SB/NBout SRAMs with finite ports and fixed latency, and an
//!    off-chip DRAM model with pluggable latency controllers.
//! 3. **Simulation:** Configuration, program loading, the clocked harness and statistics.

/// Common types (buffer identities, access types, errors).
pub mod common;
/// Simulator configuration (defaults, hierarchical config structures).
pub mod config;
/// Accelerator core (pipeline, datapath, control processor).
pub mod core;
/// Simulation harness and loaders.
pub mod sim;
/// On-chip and off-chip memory models.
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Register chain, stages and SRAMs.
pub use crate::core::Datapath;
/// Top-level simulator; construct with `Simulator::new`.
pub use crate::sim::Simulator;
