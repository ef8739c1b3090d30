//! Accelerator core.
//!
//! This module contains the compute side of the accelerator: the NFU pipeline, the
//! datapath that binds it to the on-chip buffers, and the control processor that
//! sequences instructions over both.

/// Instruction FSM and dispatch policies.
pub mod control;

/// Register chain, stages and SRAMs advanced one clock edge at a time.
pub mod datapath;

/// Pipeline registers, operations, stages and functional units.
pub mod pipeline;

pub use self::control::ControlProcessor;
pub use self::datapath::Datapath;
