//! Control processor.
//!
//! This module sequences instructions over the datapath. It provides:
//! 1. **Instructions:** The directive format and its closed FSM state enumeration.
//! 2. **Processor:** The FSM moving data between DRAM and the SRAMs and dispatching compute.
//! 3. **Dispatch:** Pluggable policies deciding which SRAM lines each operation touches.

/// Dispatch policies.
pub mod dispatch;

/// Instructions and FSM states.
pub mod instruction;

/// The instruction FSM.
pub mod processor;

pub use self::dispatch::{DispatchPolicy, FilterSweep, NoDispatch};
pub use self::instruction::{InstState, Instruction};
pub use self::processor::{ControlProcessor, ControlStats};
