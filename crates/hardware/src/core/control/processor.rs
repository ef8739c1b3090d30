//! Control-processor instruction FSM.
//!
//! The [`ControlProcessor`] runs one instruction at a time, advancing its FSM by at most
//! one step per cycle:
//! 1. **LOAD_NBIN:** Submit the NBin DRAM read, then go to LOAD_SB or EXECUTE.
//! 2. **LOAD_SB:** Submit the SB DRAM read, then go to EXECUTE.
//! 3. **EXECUTE:** Drain the pending DRAM reads in order into their SRAMs, one per cycle,
//!    then admit the dispatch policy's operations one per cycle. Once the policy runs dry
//!    and the datapath drains, go to STORE_NBOUT or COMPLETE.
//! 4. **STORE_NBOUT:** Submit the NBout DRAM write and wait for it.
//!
//! Refused SRAM writes and refused admissions are retried on the next cycle.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::common::{AccessType, BufferKind, SimResult};
use crate::config::Config;
use crate::core::control::dispatch::{DispatchPolicy, FilterSweep};
use crate::core::control::instruction::{InstState, Instruction};
use crate::core::datapath::Datapath;
use crate::core::pipeline::operation::{OpId, Operation};
use crate::soc::memory::dram::{DramInterface, MemoryRequest, RequestId};

/// Control-processor counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlStats {
    /// Instructions that reached COMPLETE.
    pub instructions_completed: u64,
    /// DRAM requests submitted.
    pub dram_requests: u64,
    /// SRAM fill writes refused for lack of ports.
    pub fill_retries: u64,
    /// Operations handed to the datapath.
    pub ops_dispatched: u64,
    /// Cycles spent in each state, indexed by [`InstState::code`].
    pub state_cycles: [u64; InstState::ALL.len()],
}

impl ControlStats {
    /// Cycles spent in `state`.
    pub const fn cycles_in(&self, state: InstState) -> u64 {
        self.state_cycles[state.code() as usize]
    }
}

/// Per-instruction progress that does not live in the instruction itself.
#[derive(Debug, Default)]
struct Progress {
    dispatch_started: bool,
    policy_exhausted: bool,
    held: Option<Operation>,
    store_submitted: bool,
}

/// Instruction sequencer in front of the datapath.
#[derive(Debug)]
pub struct ControlProcessor {
    config: Config,
    policy: Box<dyn DispatchPolicy>,
    program: VecDeque<Instruction>,
    current: Option<Instruction>,
    progress: Progress,
    pending: VecDeque<MemoryRequest>,
    next_request: u64,
    next_op: u64,
    stats: ControlStats,
}

impl ControlProcessor {
    /// Creates an idle control processor using [`FilterSweep`] dispatch.
    pub fn new(config: &Config) -> Self {
        Self::with_policy(config, Box::new(FilterSweep::new()))
    }

    /// Creates an idle control processor with an explicit dispatch policy.
    pub fn with_policy(config: &Config, policy: Box<dyn DispatchPolicy>) -> Self {
        Self {
            config: config.clone(),
            policy,
            program: VecDeque::new(),
            current: None,
            progress: Progress::default(),
            pending: VecDeque::new(),
            next_request: 0,
            next_op: 0,
            stats: ControlStats::default(),
        }
    }

    /// Queues an instruction behind any already issued.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::BufferOverflow`](crate::common::SimError::BufferOverflow) if
    /// a transfer does not fit its SRAM. Nothing is queued in that case.
    pub fn issue(&mut self, inst: Instruction) -> SimResult<()> {
        inst.validate(&self.config)?;
        self.program.push_back(inst);
        Ok(())
    }

    /// Returns true when no instruction is running or queued.
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.program.is_empty() && self.pending.is_empty()
    }

    /// FSM state of the running instruction, or of the next queued one, if it decodes.
    pub fn state(&self) -> Option<InstState> {
        self.current
            .as_ref()
            .or_else(|| self.program.front())
            .and_then(|inst| inst.state().ok())
    }

    /// DRAM requests submitted but not yet written into an SRAM or acknowledged.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Counters accumulated so far.
    #[inline]
    pub const fn stats(&self) -> ControlStats {
        self.stats
    }

    /// Records the DRAM completion of request `id` at `cycle`.
    pub fn complete_request(&mut self, id: RequestId, cycle: u64) {
        match self.pending.iter_mut().find(|req| req.id() == id) {
            Some(req) => req.complete(cycle),
            None => trace!(req = %id, "completion for unknown request"),
        }
    }

    /// Advances the running instruction by one FSM step.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UndefinedState`](crate::common::SimError::UndefinedState) if
    /// the instruction's state code is outside the FSM.
    pub fn step(
        &mut self,
        datapath: &mut Datapath,
        dram: &mut dyn DramInterface,
    ) -> SimResult<()> {
        if self.current.is_none() {
            self.current = self.program.pop_front();
            self.progress = Progress::default();
        }
        let Some(mut inst) = self.current.take() else {
            return Ok(());
        };

        let state = match inst.state() {
            Ok(state) => state,
            Err(err) => {
                self.current = Some(inst);
                return Err(err);
            }
        };
        self.stats.state_cycles[state.code() as usize] += 1;

        let next = match state {
            InstState::LoadInputBuffer => {
                self.submit(dram, &inst, BufferKind::Input, AccessType::Read);
                if inst.load_weights {
                    InstState::LoadWeightBuffer
                } else {
                    InstState::Execute
                }
            }
            InstState::LoadWeightBuffer => {
                self.submit(dram, &inst, BufferKind::Weight, AccessType::Read);
                InstState::Execute
            }
            InstState::Execute => {
                if self.execute(datapath, &inst) {
                    if inst.store_output {
                        InstState::StoreOutputBuffer
                    } else {
                        InstState::Complete
                    }
                } else {
                    InstState::Execute
                }
            }
            InstState::StoreOutputBuffer => {
                if self.store(dram, &inst) {
                    InstState::Complete
                } else {
                    InstState::StoreOutputBuffer
                }
            }
            InstState::Complete => InstState::Complete,
        };

        if next != state {
            debug!(cycle = datapath.now(), from = %state, to = %next, "instruction state");
        }
        if next == InstState::Complete {
            self.stats.instructions_completed += 1;
            debug!(cycle = datapath.now(), "instruction complete");
            return Ok(());
        }
        inst.set_state(next);
        self.current = Some(inst);
        Ok(())
    }

    fn submit(
        &mut self,
        dram: &mut dyn DramInterface,
        inst: &Instruction,
        buffer: BufferKind,
        kind: AccessType,
    ) {
        let addr = match buffer {
            BufferKind::Input => inst.nbin_address,
            BufferKind::Output => inst.nbout_address,
            BufferKind::Weight => inst.sb_address,
        };
        let request = MemoryRequest::new(
            RequestId(self.next_request),
            addr,
            inst.size_of(buffer),
            kind,
            buffer,
        );
        self.next_request += 1;
        self.stats.dram_requests += 1;
        dram.submit(&request);
        self.pending.push_back(request);
    }

    /// One EXECUTE cycle. Returns true once the instruction's compute is finished.
    fn execute(&mut self, datapath: &mut Datapath, inst: &Instruction) -> bool {
        if let Some(front) = self.pending.front() {
            if !front.is_complete() {
                return false;
            }
            let (buffer, size) = (front.buffer(), front.size());
            if datapath.write_memory(buffer, 0, size) {
                let _ = self.pending.pop_front();
                debug!(cycle = datapath.now(), %buffer, size, "sram filled");
            } else {
                self.stats.fill_retries += 1;
                trace!(cycle = datapath.now(), %buffer, "sram fill refused, retrying");
            }
            return false;
        }

        if !self.progress.dispatch_started {
            self.policy.begin(inst, &self.config);
            self.progress.dispatch_started = true;
        }

        if self.progress.held.is_none() && !self.progress.policy_exhausted {
            match self.policy.next_operation(OpId(self.next_op)) {
                Some(op) => {
                    self.next_op += 1;
                    self.progress.held = Some(op);
                }
                None => self.progress.policy_exhausted = true,
            }
        }

        if let Some(op) = self.progress.held.take() {
            match datapath.insert_operation(op) {
                Ok(()) => self.stats.ops_dispatched += 1,
                Err(op) => self.progress.held = Some(op),
            }
            return false;
        }

        datapath.is_idle()
    }

    /// One STORE_NBOUT cycle. Returns true once the write-back completed.
    fn store(&mut self, dram: &mut dyn DramInterface, inst: &Instruction) -> bool {
        if !self.progress.store_submitted {
            self.submit(dram, inst, BufferKind::Output, AccessType::Write);
            self.progress.store_submitted = true;
            return false;
        }
        if self.pending.front().is_some_and(MemoryRequest::is_complete) {
            let _ = self.pending.pop_front();
            return true;
        }
        false
    }
}
