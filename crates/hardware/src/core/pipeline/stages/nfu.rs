//! Pipeline stage engine.
//!
//! A stage of depth `d` owns `d - 1` internal delay slots; its output register supplies the
//! last cycle of latency, so an operation pulled by one stage is pulled by the next stage
//! exactly `d` cycles later when nothing blocks it. Each tick, in order:
//! 1. **Hand-off:** The operation in the final slot moves to the output register, or stays
//!    put if the register is full (backpressure). A blocked final slot blocks the slots
//!    behind it.
//! 2. **Shift:** Every other operation advances one slot if the slot ahead is free.
//! 3. **Pull:** The input front enters the first slot if it is ready, the slot is free and
//!    the functional-unit budget allows. A depth-1 stage has no slots and moves the input
//!    front straight into the output register.

use tracing::trace;

use crate::config::StageConfig;
use crate::core::pipeline::latches::PipelineRegister;
use crate::core::pipeline::operation::{OpId, Operation};
use crate::core::pipeline::stages::StageId;
use crate::core::pipeline::traits::{FunctionalUnit, Passthrough};

/// Per-stage counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Operations accepted into the stage.
    pub accepted: u64,
    /// Cycles an operation was ready to leave but the output register was full.
    pub stall_cycles: u64,
}

/// One NFU pipeline stage.
#[derive(Debug)]
pub struct PipelineStage {
    id: StageId,
    slots: Vec<Option<Operation>>,
    functional_units: usize,
    unit: Box<dyn FunctionalUnit>,
    cycle: u64,
    stats: StageStats,
}

impl PipelineStage {
    /// Creates an empty stage with a pass-through functional unit.
    pub fn new(id: StageId, config: &StageConfig) -> Self {
        let internal = config.pipeline_depth.saturating_sub(1);
        let mut slots = Vec::with_capacity(internal);
        slots.resize_with(internal, || None);
        Self {
            id,
            slots,
            functional_units: config.functional_units,
            unit: Box::new(Passthrough),
            cycle: 0,
            stats: StageStats::default(),
        }
    }

    /// Replaces the functional unit.
    #[must_use]
    pub fn with_unit(mut self, unit: Box<dyn FunctionalUnit>) -> Self {
        self.set_unit(unit);
        self
    }

    /// Replaces the functional unit in place.
    pub fn set_unit(&mut self, unit: Box<dyn FunctionalUnit>) {
        self.unit = unit;
    }

    /// Stage identity.
    #[inline]
    pub const fn id(&self) -> StageId {
        self.id
    }

    /// Pipeline depth in cycles.
    #[inline]
    pub fn depth(&self) -> usize {
        self.slots.len() + 1
    }

    /// Number of occupied slots.
    pub fn occupancy(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns true if no operation is inside the stage.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Counters accumulated so far.
    #[inline]
    pub const fn stats(&self) -> StageStats {
        self.stats
    }

    /// Returns true if [`push_operation`](Self::push_operation) would accept an operation.
    pub fn can_accept(&self) -> bool {
        matches!(self.slots.first(), Some(None)) && self.occupancy() < self.functional_units
    }

    /// Places `op` in the entry slot.
    ///
    /// # Errors
    ///
    /// Hands `op` back if the entry slot is occupied, the unit budget is exhausted, or the
    /// stage has depth 1 (no internal slot to hold it).
    pub fn push_operation(&mut self, mut op: Operation) -> Result<(), Operation> {
        if !self.can_accept() {
            return Err(op);
        }
        self.accept(&mut op);
        self.slots[0] = Some(op);
        Ok(())
    }

    /// Advances the stage by one cycle.
    ///
    /// # Arguments
    ///
    /// * `input` - Register the stage pulls from.
    /// * `output` - Register the stage hands completed operations to.
    pub fn tick(&mut self, input: &mut PipelineRegister, output: &mut PipelineRegister) {
        self.hand_off(output);
        self.shift();
        self.pull(input, output);
        self.cycle += 1;
    }

    /// Ids held in each slot, entry slot first.
    pub fn slot_ids(&self) -> Vec<Option<OpId>> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().map(Operation::id))
            .collect()
    }

    fn accept(&mut self, op: &mut Operation) {
        self.unit.evaluate(op, self.cycle);
        self.stats.accepted += 1;
        trace!(stage = %self.id, op = %op.id(), cycle = self.cycle, "accepted");
    }

    fn hand_off(&mut self, output: &mut PipelineRegister) {
        let Some(last) = self.slots.last_mut() else {
            return;
        };
        let Some(op) = last.take() else {
            return;
        };
        if let Err(op) = output.push(op) {
            trace!(stage = %self.id, op = %op.id(), "stalled: output register full");
            *last = Some(op);
            self.stats.stall_cycles += 1;
        }
    }

    fn shift(&mut self) {
        for i in (1..self.slots.len()).rev() {
            if self.slots[i].is_none() {
                self.slots.swap(i, i - 1);
            }
        }
    }

    fn pull(&mut self, input: &mut PipelineRegister, output: &mut PipelineRegister) {
        if !input.peek().is_some_and(|op| self.id.accepts(op)) {
            return;
        }

        if self.slots.is_empty() {
            if output.is_full() {
                self.stats.stall_cycles += 1;
                return;
            }
            let Some(mut op) = input.pop() else {
                return;
            };
            self.accept(&mut op);
            if let Err(op) = output.push(op) {
                unreachable!(
                    "{} lost {}: output register refused after capacity check",
                    self.id,
                    op.id()
                );
            }
            return;
        }

        if !self.can_accept() {
            return;
        }
        let Some(op) = input.pop() else {
            return;
        };
        if let Err(op) = self.push_operation(op) {
            unreachable!(
                "{} lost {}: entry slot refused after capacity check",
                self.id,
                op.id()
            );
        }
    }
}
