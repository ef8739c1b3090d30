//! Accelerator datapath.
//!
//! The [`Datapath`] owns the register chain, the three NFU stages and the three on-chip
//! SRAMs, and advances them one clock edge per [`Datapath::cycle`]. It provides:
//! 1. **Admission:** [`Datapath::insert_operation`] places one operation in the head
//!    register and starts its NBin and SB reads.
//! 2. **Edge Evaluation:** Components are evaluated back to front so that each one sees
//!    only state committed at the end of the previous edge:
//!    retire → NBout → NFU-3 → NFU-2 → NFU-1 → writeback issue → NBin → SB.
//! 3. **Retirement:** An operation leaves the tail register once its NBout write completes.
//! 4. **Observability:** Issue/completion counters, per-op latency and a pipeline snapshot.
//!
//! Register `i` is the input of stage `i` and register `i + 1` its output; register 0 is
//! the head (filled by admission) and the last register is the tail (drained by retire).

use std::fmt;

use tracing::{debug, trace};

use crate::common::{BufferKind, BufferMap};
use crate::config::Config;
use crate::core::pipeline::latches::PipelineRegister;
use crate::core::pipeline::operation::{Direction, OpId, Operation};
use crate::core::pipeline::stages::{PipelineStage, StageId};
use crate::core::pipeline::traits::FunctionalUnit;
use crate::soc::memory::sram::BankedMemory;

const HEAD: usize = 0;

/// Register chain, stages and SRAMs of the accelerator.
#[derive(Debug)]
pub struct Datapath {
    registers: Vec<PipelineRegister>,
    stages: Vec<PipelineStage>,
    srams: BufferMap<BankedMemory>,
    now: u64,
    ops_issued: u64,
    ops_completed: u64,
    insert_refusals: u64,
    latency_total: u64,
    latency_max: u64,
    last_latency: Option<u64>,
}

impl Datapath {
    /// Builds an empty datapath from a validated configuration.
    pub fn new(config: &Config) -> Self {
        let capacity = config.general.max_buffer_size;
        let stages: Vec<_> = StageId::ALL
            .iter()
            .map(|&id| PipelineStage::new(id, config.stage(id)))
            .collect();
        let registers = (0..=stages.len())
            .map(|_| PipelineRegister::new(capacity))
            .collect();
        Self {
            registers,
            stages,
            srams: BufferMap::from_fn(|buffer| BankedMemory::from_config(buffer, config)),
            now: 0,
            ops_issued: 0,
            ops_completed: 0,
            insert_refusals: 0,
            latency_total: 0,
            latency_max: 0,
            last_latency: None,
        }
    }

    /// Installs the functional unit of one stage.
    pub fn set_functional_unit(&mut self, id: StageId, unit: Box<dyn FunctionalUnit>) {
        self.stages[id.index()].set_unit(unit);
    }

    /// Number of edges evaluated so far.
    #[inline]
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Operations admitted.
    #[inline]
    pub const fn ops_issued(&self) -> u64 {
        self.ops_issued
    }

    /// Operations retired.
    #[inline]
    pub const fn ops_completed(&self) -> u64 {
        self.ops_completed
    }

    /// Admissions refused because the head register was occupied.
    #[inline]
    pub const fn insert_refusals(&self) -> u64 {
        self.insert_refusals
    }

    /// Operations admitted but not yet retired.
    #[inline]
    pub const fn in_flight(&self) -> u64 {
        self.ops_issued - self.ops_completed
    }

    /// Sum of retire-minus-issue cycles over all retired operations.
    #[inline]
    pub const fn latency_total(&self) -> u64 {
        self.latency_total
    }

    /// Largest latency observed.
    #[inline]
    pub const fn latency_max(&self) -> u64 {
        self.latency_max
    }

    /// Latency of the most recently retired operation.
    #[inline]
    pub const fn last_latency(&self) -> Option<u64> {
        self.last_latency
    }

    /// Returns true when no operation is in flight and every SRAM port is free.
    pub fn is_idle(&self) -> bool {
        self.registers.iter().all(PipelineRegister::is_empty)
            && self.stages.iter().all(PipelineStage::is_empty)
            && self.srams.iter().all(|(_, sram)| sram.is_idle())
    }

    /// Borrows one stage.
    pub fn stage(&self, id: StageId) -> &PipelineStage {
        &self.stages[id.index()]
    }

    /// Borrows one SRAM.
    pub fn sram(&self, buffer: BufferKind) -> &BankedMemory {
        &self.srams[buffer]
    }

    /// Borrows register `index` (0 is the head, `StageId::ALL.len()` the tail).
    pub fn register(&self, index: usize) -> Option<&PipelineRegister> {
        self.registers.get(index)
    }

    /// Borrows the tail register.
    pub fn tail(&self) -> &PipelineRegister {
        &self.registers[self.tail_index()]
    }

    /// Admits `op` into the head register.
    ///
    /// The operation is marked as reading, stamped with the current cycle, and its NBin
    /// and SB reads are issued at once. A read refused for lack of ports is retried by the
    /// SRAM on later edges.
    ///
    /// # Errors
    ///
    /// Hands `op` back untouched if the head register is not empty. At most one operation
    /// can therefore be admitted per cycle.
    pub fn insert_operation(&mut self, mut op: Operation) -> Result<(), Operation> {
        if !self.registers[HEAD].is_empty() {
            self.insert_refusals += 1;
            trace!(cycle = self.now, op = %op.id(), "admission refused: head occupied");
            return Err(op);
        }

        op.set_read();
        op.stamp_issue(self.now);
        let nbin = self.srams[BufferKind::Input].read_for(&mut op);
        let sb = self.srams[BufferKind::Weight].read_for(&mut op);
        debug!(cycle = self.now, op = %op.id(), nbin, sb, "operation admitted");

        self.registers[HEAD].push(op)?;
        self.ops_issued += 1;
        Ok(())
    }

    /// Retires the tail front if its NBout write has completed.
    ///
    /// # Returns
    ///
    /// Id of the retired operation, if any.
    pub fn check_output_complete(&mut self) -> Option<OpId> {
        let tail = self.tail_index();
        let ready = self.registers[tail]
            .peek()
            .is_some_and(|op| !op.is_read() && op.is_write_complete());
        if !ready {
            return None;
        }

        let op = self.registers[tail].pop()?;
        let latency = op.issued_at().map_or(0, |issued| self.now - issued);
        self.ops_completed += 1;
        self.latency_total += latency;
        self.latency_max = self.latency_max.max(latency);
        self.last_latency = Some(latency);
        debug!(cycle = self.now, op = %op.id(), latency, "operation retired");
        Some(op.id())
    }

    /// Starts an untagged read on one SRAM. Returns false if every port is busy.
    pub fn read_memory(&mut self, buffer: BufferKind, addr: u64, size: u64) -> bool {
        self.srams[buffer].read(addr, size)
    }

    /// Starts an untagged write on one SRAM. Returns false if every port is busy.
    pub fn write_memory(&mut self, buffer: BufferKind, addr: u64, size: u64) -> bool {
        self.srams[buffer].write(addr, size)
    }

    /// Evaluates one clock edge.
    pub fn cycle(&mut self) {
        let _ = self.check_output_complete();

        let tail = self.tail_index();
        let _ = self.srams[BufferKind::Output].tick(&mut self.registers[tail]);

        for (i, stage) in self.stages.iter_mut().enumerate().rev() {
            let (inputs, outputs) = self.registers.split_at_mut(i + 1);
            stage.tick(&mut inputs[i], &mut outputs[0]);
        }

        self.issue_writebacks();

        let _ = self.srams[BufferKind::Input].tick(&mut self.registers[HEAD]);
        let _ = self.srams[BufferKind::Weight].tick(&mut self.registers[HEAD]);

        for register in &mut self.registers {
            register.end_cycle();
        }
        trace!(dump = %self.pipeline_dump(), "edge evaluated");
        self.now += 1;
    }

    /// Captures the contents of every register and stage slot.
    pub fn pipeline_dump(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            cycle: self.now,
            registers: self.registers.iter().map(PipelineRegister::ids).collect(),
            stages: self
                .stages
                .iter()
                .map(|stage| (stage.id(), stage.slot_ids()))
                .collect(),
        }
    }

    fn tail_index(&self) -> usize {
        self.registers.len() - 1
    }

    fn issue_writebacks(&mut self) {
        let Some(tail) = self.registers.last_mut() else {
            return;
        };
        let nbout = &mut self.srams[BufferKind::Output];
        for op in tail.iter_mut() {
            if op.direction() != Direction::Read {
                continue;
            }
            op.set_write();
            if !nbout.write_for(op) {
                trace!(cycle = self.now, op = %op.id(), "writeback deferred: NBout busy");
            }
        }
    }
}

/// Contents of the pipeline at one cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineSnapshot {
    /// Cycle the snapshot was taken at.
    pub cycle: u64,
    /// Ids held by each register, head first, front of each register first.
    pub registers: Vec<Vec<OpId>>,
    /// Slot contents of each stage, entry slot first.
    pub stages: Vec<(StageId, Vec<Option<OpId>>)>,
}

impl fmt::Display for PipelineSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn ids(f: &mut fmt::Formatter<'_>, ids: &[OpId]) -> fmt::Result {
            f.write_str("[")?;
            for (i, id) in ids.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{id}")?;
            }
            f.write_str("]")
        }

        writeln!(f, "cycle {}", self.cycle)?;
        for (i, register) in self.registers.iter().enumerate() {
            write!(f, "  reg{i} ")?;
            ids(f, register)?;
            writeln!(f)?;
            if let Some((id, slots)) = self.stages.get(i) {
                write!(f, "  {id} ")?;
                f.write_str("[")?;
                for (j, slot) in slots.iter().enumerate() {
                    if j > 0 {
                        f.write_str(" ")?;
                    }
                    match slot {
                        Some(op) => write!(f, "{op}")?,
                        None => f.write_str("-")?,
                    }
                }
                writeln!(f, "]")?;
            }
        }
        Ok(())
    }
}
