//! # Simulator Tests
//!
//! End-to-end runs through the real DRAM model: the built-in program, bounded runs,
//! halting and the collected statistics.

use std::cell::Cell;
use std::rc::Rc;

use dnnsim_core::Simulator;
use dnnsim_core::common::{BufferKind, SimError};
use dnnsim_core::config::Config;
use dnnsim_core::core::control::NoDispatch;
use dnnsim_core::core::pipeline::{FunctionalUnit, Operation, StageId};
use dnnsim_core::sim::{RunStatus, loader};
use pretty_assertions::assert_eq;

use crate::common::builder::config::ConfigBuilder;
use crate::common::harness::{TEST_MAX_CYCLES, init_tracing};

fn demo_simulator() -> Simulator {
    init_tracing();
    let mut sim = Simulator::new(Config::default()).unwrap();
    for inst in loader::demo_program() {
        sim.issue(inst).unwrap();
    }
    sim
}

#[derive(Debug)]
struct Tally(Rc<Cell<u64>>);

impl FunctionalUnit for Tally {
    fn evaluate(&mut self, _op: &mut Operation, _cycle: u64) {
        self.0.set(self.0.get() + 1);
    }
}

// ══════════════════════════════════════════════════════════
// 1. Full runs
// ══════════════════════════════════════════════════════════

#[test]
fn demo_program_runs_to_completion() {
    let mut sim = demo_simulator();
    assert_eq!(sim.run_until_idle(TEST_MAX_CYCLES).unwrap(), RunStatus::Idle);

    // 32 KiB of synapses in 512-byte lines.
    assert_eq!(sim.datapath().ops_completed(), 64);
    assert_eq!(sim.control().stats().instructions_completed, 1);
    assert!(sim.is_idle());
    assert!(!sim.is_halted());
}

#[test]
fn statistics_cover_every_component() {
    let mut sim = demo_simulator();
    let _ = sim.run_until_idle(TEST_MAX_CYCLES).unwrap();
    let stats = sim.stats();

    assert_eq!(stats.cycles, sim.cycles());
    assert_eq!(stats.ops_issued, 64);
    assert_eq!(stats.ops_completed, 64);
    assert!(stats.latency_max >= 8);
    assert!(stats.mean_latency() >= 8.0);
    for stage in &stats.stages {
        assert_eq!(stage.accepted, 64);
    }
    assert_eq!(stats.srams[BufferKind::Weight].writes, 1);
    assert_eq!(stats.srams[BufferKind::Weight].reads, 64);
    assert_eq!(stats.srams[BufferKind::Output].writes, 64);
    assert_eq!(stats.dram.reads, 2);
    assert_eq!(
        stats.dram.bytes_read,
        loader::DEMO_NBIN_SIZE + loader::DEMO_SB_SIZE
    );
    assert_eq!(stats.control.ops_dispatched, 64);
}

#[test]
fn functional_units_see_every_operation() {
    let calls = Rc::new(Cell::new(0));
    let mut sim = demo_simulator();
    sim.datapath_mut()
        .set_functional_unit(StageId::Nfu3, Box::new(Tally(Rc::clone(&calls))));
    let _ = sim.run_until_idle(TEST_MAX_CYCLES).unwrap();
    assert_eq!(calls.get(), 64);
}

#[test]
fn data_only_policy_dispatches_nothing() {
    init_tracing();
    let mut sim = Simulator::new(Config::default())
        .unwrap()
        .with_policy(Box::new(NoDispatch));
    for inst in loader::demo_program() {
        sim.issue(inst).unwrap();
    }
    assert_eq!(sim.run_until_idle(TEST_MAX_CYCLES).unwrap(), RunStatus::Idle);
    assert_eq!(sim.datapath().ops_issued(), 0);
    assert_eq!(sim.stats().dram.reads, 2);
}

// ══════════════════════════════════════════════════════════
// 2. Bounded runs and errors
// ══════════════════════════════════════════════════════════

#[test]
fn empty_simulator_is_idle_at_once() {
    init_tracing();
    let mut sim = Simulator::new(Config::default()).unwrap();
    assert_eq!(sim.run_until_idle(10).unwrap(), RunStatus::Idle);
    assert_eq!(sim.cycles(), 0);
}

#[test]
fn cycle_limit_stops_the_run_and_can_be_resumed() {
    let mut sim = demo_simulator();
    assert_eq!(sim.run_until_idle(10).unwrap(), RunStatus::CycleLimit);
    assert_eq!(sim.cycles(), 10);
    assert!(!sim.is_idle());

    assert_eq!(sim.run_until_idle(TEST_MAX_CYCLES).unwrap(), RunStatus::Idle);
    assert_eq!(sim.datapath().ops_completed(), 64);
}

#[test]
fn invalid_configuration_is_rejected() {
    let config = ConfigBuilder::new().max_buffer_size(0).build();
    assert!(matches!(
        Simulator::new(config),
        Err(SimError::InvalidConfig(_))
    ));
}

#[test]
fn halted_simulator_refuses_to_tick() {
    let mut sim = demo_simulator();
    let bad = loader::parse_program(r#"[{"state": 7}]"#).unwrap();
    for inst in bad {
        sim.issue(inst).unwrap();
    }
    let err = sim.run_until_idle(TEST_MAX_CYCLES).unwrap_err();
    assert!(matches!(err, SimError::UndefinedState(7)), "{err}");
    assert!(sim.is_halted());
    assert_eq!(sim.control().stats().instructions_completed, 1);
    assert!(matches!(sim.tick(), Err(SimError::Halted)));
}
