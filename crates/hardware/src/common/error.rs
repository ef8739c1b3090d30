//! Simulation error definitions.
//!
//! This module defines the fatal error class of the simulator. It provides:
//! 1. **Invariant Violations:** Malformed instructions (undefined FSM state, oversized buffers).
//! 2. **Configuration Errors:** Parameters rejected by validation or by the JSON loader.
//! 3. **Halt Reporting:** The error returned once a simulation has already stopped.
//!
//! Recoverable contention (a full register, a busy SRAM port, a DRAM request that has
//! not finished) is never an error; it surfaces as `false` or as a value handed back to
//! the caller, and the caller retries on a later cycle.

use thiserror::Error;

use super::data::BufferKind;

/// Fatal simulation errors.
///
/// Any of these stops the simulation. Terminating the process is left to the
/// embedding harness.
#[derive(Debug, Error)]
pub enum SimError {
    /// An instruction carried a state code outside the control-processor FSM.
    #[error("undefined instruction state {0}; aborting")]
    UndefinedState(u8),

    /// An instruction moves more data into an SRAM than the SRAM holds.
    #[error("{buffer} transfer of {requested} bytes exceeds its {capacity}-byte capacity")]
    BufferOverflow {
        /// Buffer targeted by the transfer.
        buffer: BufferKind,
        /// Requested transfer size in bytes.
        requested: u64,
        /// Configured buffer capacity in bytes.
        capacity: u64,
    },

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration or instruction stream could not be parsed.
    #[error("failed to parse JSON input: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Input file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `tick` was called after a fatal error already halted the simulation.
    #[error("simulation halted by an earlier fatal error")]
    Halted,
}

/// Result alias used across the simulator.
pub type SimResult<T> = Result<T, SimError>;
