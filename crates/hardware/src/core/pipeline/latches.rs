//! Pipeline registers for inter-stage communication.
//!
//! A [`PipelineRegister`] sits between every pair of adjacent components of the datapath:
//! SRAM reads → NFU-1 → NFU-2 → NFU-3 → NBout writeback. It provides:
//! 1. **Bounded Storage:** At most `max_buffer_size` operations; a full register refuses
//!    the push and hands the operation back, which is how backpressure propagates.
//! 2. **Ownership Transfer:** The only place an operation changes owner between stages.
//! 3. **Single-Edge Discipline:** One push and one pop per cycle. A second one in the same
//!    cycle is a caller bug and trips a debug assertion; `end_cycle` re-arms the guards.

use std::collections::VecDeque;

use crate::core::pipeline::operation::{OpId, Operation};

/// Bounded FIFO of operations between two pipeline components.
#[derive(Debug)]
pub struct PipelineRegister {
    entries: VecDeque<Operation>,
    capacity: usize,
    pushed_this_cycle: bool,
    popped_this_cycle: bool,
}

impl PipelineRegister {
    /// Creates an empty register holding at most `capacity` operations.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            pushed_this_cycle: false,
            popped_this_cycle: false,
        }
    }

    /// Maximum number of operations.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no operation is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if a push would be refused.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Appends `op` at the back.
    ///
    /// # Errors
    ///
    /// Hands `op` back unchanged when the register is full.
    pub fn push(&mut self, op: Operation) -> Result<(), Operation> {
        if self.is_full() {
            return Err(op);
        }
        debug_assert!(
            !self.pushed_this_cycle,
            "second push into a pipeline register within one cycle"
        );
        self.pushed_this_cycle = true;
        self.entries.push_back(op);
        Ok(())
    }

    /// Removes and returns the front operation.
    pub fn pop(&mut self) -> Option<Operation> {
        let op = self.entries.pop_front()?;
        debug_assert!(
            !self.popped_this_cycle,
            "second pop from a pipeline register within one cycle"
        );
        self.popped_this_cycle = true;
        Some(op)
    }

    /// Borrows the front operation.
    #[inline]
    pub fn peek(&self) -> Option<&Operation> {
        self.entries.front()
    }

    /// Mutably borrows the front operation.
    #[inline]
    pub fn peek_mut(&mut self) -> Option<&mut Operation> {
        self.entries.front_mut()
    }

    /// Iterates from front to back.
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.entries.iter()
    }

    /// Iterates mutably from front to back. Used by SRAMs to deliver completions.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Operation> {
        self.entries.iter_mut()
    }

    /// Finds a queued operation by id.
    pub fn find_mut(&mut self, id: OpId) -> Option<&mut Operation> {
        self.entries.iter_mut().find(|op| op.id() == id)
    }

    /// Ids of the queued operations, front first.
    pub fn ids(&self) -> Vec<OpId> {
        self.entries.iter().map(Operation::id).collect()
    }

    /// Re-arms the one-push/one-pop guards at the end of a clock edge.
    pub fn end_cycle(&mut self) {
        self.pushed_this_cycle = false;
        self.popped_this_cycle = false;
    }
}
