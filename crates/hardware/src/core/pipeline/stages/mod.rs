//! NFU pipeline stages.
//!
//! The compute pipeline has three stages, each a fixed-depth shift register bounded by a
//! functional-unit budget. It includes:
//! 1. **NFU-1:** Multiplier array; only accepts operations whose NBin and SB reads completed.
//! 2. **NFU-2:** Adder tree, shifters and max units (add/pool).
//! 3. **NFU-3:** Accumulation and activation.
//!
//! All three share the [`PipelineStage`] engine; they differ in configuration, in their
//! input readiness rule and in the pluggable functional unit they carry.

use std::fmt;

use crate::core::pipeline::operation::Operation;

/// Generic stage engine (delay slots, unit budget, backpressure).
pub mod nfu;

pub use nfu::{PipelineStage, StageStats};

/// Identity of a pipeline stage, in pipeline order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageId {
    /// NFU-1: multiply.
    Nfu1,
    /// NFU-2: add / pool.
    Nfu2,
    /// NFU-3: accumulate / activate.
    Nfu3,
}

impl StageId {
    /// All stages, first to last.
    pub const ALL: [Self; 3] = [Self::Nfu1, Self::Nfu2, Self::Nfu3];

    /// Position of the stage in the pipeline. Stage `i` reads register `i` and writes
    /// register `i + 1`.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Nfu1 => 0,
            Self::Nfu2 => 1,
            Self::Nfu3 => 2,
        }
    }

    /// Returns true if `op` may leave the stage's input register this cycle.
    #[inline]
    pub fn accepts(self, op: &Operation) -> bool {
        match self {
            Self::Nfu1 => op.inputs_ready(),
            Self::Nfu2 | Self::Nfu3 => true,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nfu1 => f.write_str("NFU-1"),
            Self::Nfu2 => f.write_str("NFU-2"),
            Self::Nfu3 => f.write_str("NFU-3"),
        }
    }
}
