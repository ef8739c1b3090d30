//! Pluggable functional-unit behaviour.
//!
//! The timing of a stage (depth, unit budget, backpressure) is fixed by the stage engine;
//! what a stage computes is not. A [`FunctionalUnit`] is invoked once for every operation
//! accepted by the stage, and can model multiply, add/pool or accumulate arithmetic, or
//! simply observe the traffic.

use std::fmt::Debug;

use crate::core::pipeline::operation::Operation;

/// Computation performed by one pipeline stage.
pub trait FunctionalUnit: Debug {
    /// Called once when `op` enters the stage.
    ///
    /// # Arguments
    ///
    /// * `op` - The operation just accepted.
    /// * `cycle` - Stage-local cycle count at acceptance.
    fn evaluate(&mut self, op: &mut Operation, cycle: u64);
}

/// Functional unit that leaves every operation untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl FunctionalUnit for Passthrough {
    fn evaluate(&mut self, _op: &mut Operation, _cycle: u64) {}
}
