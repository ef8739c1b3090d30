use dnnsim_core::Simulator;
use dnnsim_core::common::SimResult;
use dnnsim_core::config::Config;
use dnnsim_core::core::Datapath;
use dnnsim_core::core::control::{DispatchPolicy, InstState, Instruction};
use dnnsim_core::sim::RunStatus;

use crate::common::mocks::dram::{MockDram, RequestLog};

/// Cycle budget for harness-driven runs; far above anything a test needs.
pub const TEST_MAX_CYCLES: u64 = 100_000;

/// Installs a test-writer subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .compact()
        .without_time()
        .try_init();
}

pub struct TestContext {
    pub sim: Simulator,
    pub dram_log: RequestLog,
}

impl TestContext {
    /// Simulator over `config` with a [`MockDram`] of the given latency.
    pub fn new(config: Config, dram_latency: u64) -> Self {
        init_tracing();
        let dram = MockDram::new(dram_latency);
        let dram_log = dram.log();
        let sim = Simulator::new(config)
            .expect("test configuration must validate")
            .with_dram(Box::new(dram));
        Self { sim, dram_log }
    }

    pub fn with_policy(mut self, policy: Box<dyn DispatchPolicy>) -> Self {
        self.sim = self.sim.with_policy(policy);
        self
    }

    pub fn issue(&mut self, inst: Instruction) -> &mut Self {
        self.sim.issue(inst).expect("instruction must fit the buffers");
        self
    }

    pub fn datapath(&self) -> &Datapath {
        self.sim.datapath()
    }

    pub fn run(&mut self) -> SimResult<RunStatus> {
        self.sim.run_until_idle(TEST_MAX_CYCLES)
    }

    /// Ticks until idle, recording the FSM state observed before every tick with
    /// consecutive repeats collapsed.
    pub fn run_state_trace(&mut self) -> SimResult<Vec<InstState>> {
        let mut trace: Vec<InstState> = Vec::new();
        while !self.sim.is_idle() {
            assert!(
                self.sim.cycles() < TEST_MAX_CYCLES,
                "simulation did not drain"
            );
            if let Some(state) = self.sim.control().state() {
                if trace.last() != Some(&state) {
                    trace.push(state);
                }
            }
            self.sim.tick()?;
        }
        Ok(trace)
    }
}

/// Drives a bare datapath one edge at a time.
pub struct DatapathRig {
    pub dp: Datapath,
}

impl DatapathRig {
    pub fn new(config: &Config) -> Self {
        init_tracing();
        Self {
            dp: Datapath::new(config),
        }
    }

    pub fn cycles(&mut self, n: u64) -> &mut Self {
        for _ in 0..n {
            self.dp.cycle();
        }
        self
    }

    /// Cycles until `count` operations retired; returns the edges taken.
    pub fn run_until_completed(&mut self, count: u64) -> u64 {
        let start = self.dp.now();
        while self.dp.ops_completed() < count {
            assert!(
                self.dp.now() - start < TEST_MAX_CYCLES,
                "operations never retired"
            );
            self.dp.cycle();
        }
        self.dp.now() - start
    }

    /// Index of the register currently holding `id`, if any.
    pub fn register_of(&self, id: u64) -> Option<usize> {
        let snap = self.dp.pipeline_dump();
        snap.registers
            .iter()
            .position(|reg| reg.iter().any(|op| op.0 == id))
    }
}
