//! Simulator: owns the datapath, the control processor and the DRAM side-by-side.
//!
//! One [`Simulator::tick`] is one clock edge: the DRAM advances and reports completions,
//! the control processor takes one FSM step, and the datapath evaluates its edge. A fatal
//! error halts the simulator; every later tick reports [`SimError::Halted`].

use std::time::Instant;

use tracing::{error, info, warn};

use crate::common::{BufferKind, BufferMap, SimError, SimResult};
use crate::config::Config;
use crate::core::control::{ControlProcessor, DispatchPolicy, Instruction};
use crate::core::datapath::Datapath;
use crate::core::pipeline::stages::StageId;
use crate::soc::memory::{DramInterface, DramModel};
use crate::stats::SimStats;

/// How a bounded run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Every instruction completed and the datapath drained.
    Idle,
    /// The cycle limit was reached first.
    CycleLimit,
}

/// Top-level simulator.
#[derive(Debug)]
pub struct Simulator {
    config: Config,
    datapath: Datapath,
    control: ControlProcessor,
    dram: Box<dyn DramInterface>,
    cycles: u64,
    start_time: Instant,
    halted: bool,
}

impl Simulator {
    /// Creates a simulator with the default DRAM model and dispatch policy.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: Config) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            datapath: Datapath::new(&config),
            control: ControlProcessor::new(&config),
            dram: Box::new(DramModel::new(&config.dram)),
            config,
            cycles: 0,
            start_time: Instant::now(),
            halted: false,
        })
    }

    /// Replaces the dispatch policy. Instructions already issued are dropped.
    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn DispatchPolicy>) -> Self {
        self.control = ControlProcessor::with_policy(&self.config, policy);
        self
    }

    /// Replaces the DRAM model.
    #[must_use]
    pub fn with_dram(mut self, dram: Box<dyn DramInterface>) -> Self {
        self.dram = dram;
        self
    }

    /// Active configuration.
    #[inline]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Clock edges simulated.
    #[inline]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Returns true after a fatal error.
    #[inline]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Borrows the datapath.
    #[inline]
    pub const fn datapath(&self) -> &Datapath {
        &self.datapath
    }

    /// Mutably borrows the datapath.
    #[inline]
    pub fn datapath_mut(&mut self) -> &mut Datapath {
        &mut self.datapath
    }

    /// Borrows the control processor.
    #[inline]
    pub const fn control(&self) -> &ControlProcessor {
        &self.control
    }

    /// Returns true when no instruction, DRAM request or operation is outstanding.
    pub fn is_idle(&self) -> bool {
        self.control.is_idle() && self.datapath.is_idle() && self.dram.outstanding() == 0
    }

    /// Queues an instruction.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::BufferOverflow`] if a transfer does not fit its SRAM.
    pub fn issue(&mut self, inst: Instruction) -> SimResult<()> {
        self.control.issue(inst)
    }

    /// Advances every component by one clock edge.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that halted the simulator, or [`SimError::Halted`] if it
    /// was already halted.
    pub fn tick(&mut self) -> SimResult<()> {
        if self.halted {
            return Err(SimError::Halted);
        }

        self.dram.tick();
        for (id, cycle) in self.dram.drain_completed() {
            self.control.complete_request(id, cycle);
        }

        if let Err(err) = self.control.step(&mut self.datapath, self.dram.as_mut()) {
            error!(cycle = self.cycles, %err, "simulation halted");
            self.halted = true;
            return Err(err);
        }

        self.datapath.cycle();
        self.cycles += 1;
        Ok(())
    }

    /// Ticks until idle or until `max_cycles` more edges have elapsed.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal error from [`tick`](Self::tick).
    pub fn run_until_idle(&mut self, max_cycles: u64) -> SimResult<RunStatus> {
        let start = self.cycles;
        while !self.is_idle() {
            if self.cycles - start >= max_cycles {
                warn!(cycles = self.cycles, max_cycles, "cycle limit reached");
                return Ok(RunStatus::CycleLimit);
            }
            self.tick()?;
        }
        info!(
            cycles = self.cycles,
            ops = self.datapath.ops_completed(),
            "simulation idle"
        );
        Ok(RunStatus::Idle)
    }

    /// Collects every component's counters.
    pub fn stats(&self) -> SimStats {
        let mut stats = SimStats::new(self.start_time);
        stats.cycles = self.cycles;
        stats.ops_issued = self.datapath.ops_issued();
        stats.ops_completed = self.datapath.ops_completed();
        stats.insert_refusals = self.datapath.insert_refusals();
        stats.latency_total = self.datapath.latency_total();
        stats.latency_max = self.datapath.latency_max();
        stats.stages = StageId::ALL.map(|id| self.datapath.stage(id).stats());
        stats.srams = BufferMap::from_fn(|buffer: BufferKind| self.datapath.sram(buffer).stats());
        stats.dram = self.dram.stats();
        stats.control = self.control.stats();
        stats
    }
}
