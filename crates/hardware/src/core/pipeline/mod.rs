//! NFU compute pipeline.
//!
//! This module contains the building blocks of the three-stage compute pipeline.
//! It includes the following components:
//! 1. **Latches:** Bounded pipeline registers between adjacent components.
//! 2. **Operation:** The unit of work carried through the pipeline.
//! 3. **Stages:** The NFU-1, NFU-2 and NFU-3 stage engine.
//! 4. **Traits:** The pluggable functional-unit interface.

/// Inter-stage pipeline registers.
pub mod latches;

/// In-flight compute operations.
pub mod operation;

/// NFU pipeline stages.
pub mod stages;

/// Functional-unit trait.
pub mod traits;

pub use self::latches::PipelineRegister;
pub use self::operation::{AccessState, Direction, OpId, Operation, SramRegion};
pub use self::stages::{PipelineStage, StageId, StageStats};
pub use self::traits::{FunctionalUnit, Passthrough};
