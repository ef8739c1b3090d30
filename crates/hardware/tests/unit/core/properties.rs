//! # Pipeline Properties
//!
//! Randomised checks over small configurations:
//! - Two runs of the same configuration and program are cycle-identical.
//! - Every admitted operation retires, no faster than the unloaded latency.
//! - An operation occupies exactly one place in the pipeline at any cycle.

use std::collections::HashSet;

use dnnsim_core::common::BufferKind;
use dnnsim_core::config::Config;
use dnnsim_core::core::pipeline::OpId;
use proptest::prelude::*;

use crate::common::builder::config::ConfigBuilder;
use crate::common::builder::operation::{InstructionBuilder, op};
use crate::common::harness::{DatapathRig, TestContext};

fn small_config() -> impl Strategy<Value = Config> {
    (
        (1usize..4, 1usize..4, 1usize..4),
        (1u64..4, 1u64..4, 1u64..4),
        1usize..3,
        1usize..4,
    )
        .prop_map(|((d1, d2, d3), (nbin, sb, nbout), ports, regs)| {
            let mut b = ConfigBuilder::new().depths(d1, d2, d3).max_buffer_size(regs);
            for (buffer, latency) in [
                (BufferKind::Input, nbin),
                (BufferKind::Weight, sb),
                (BufferKind::Output, nbout),
            ] {
                b = b.sram(buffer, ports, latency);
            }
            b.build()
        })
}

fn unloaded_latency(config: &Config) -> u64 {
    let depths: usize = [&config.nfu1, &config.nfu2, &config.nfu3]
        .iter()
        .map(|s| s.pipeline_depth)
        .sum();
    config.nbin.access_cycles.max(config.sb.access_cycles)
        + depths as u64
        + config.nbout.access_cycles
}

/// Runs a one-instruction program and returns everything observable at the end.
fn run_program(config: &Config, sb_lines: u64) -> (u64, u64, u64, String) {
    let mut ctx = TestContext::new(config.clone(), 7);
    let _ = ctx.issue(InstructionBuilder::new().weights(sb_lines * 512).build());
    let _ = ctx.run().unwrap();
    let dp = ctx.datapath();
    (
        ctx.sim.cycles(),
        dp.ops_completed(),
        dp.latency_total(),
        dp.pipeline_dump().to_string(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn identical_runs_are_cycle_identical(config in small_config(), sb_lines in 1u64..12) {
        prop_assert_eq!(run_program(&config, sb_lines), run_program(&config, sb_lines));
    }

    #[test]
    fn every_operation_retires(config in small_config(), count in 1u64..24) {
        let mut rig = DatapathRig::new(&config);
        let mut next = 0;
        let mut guard = 0;
        while rig.dp.ops_completed() < count {
            guard += 1;
            prop_assert!(guard < 5_000, "pipeline wedged");
            if next < count && rig.dp.insert_operation(op(next)).is_ok() {
                next += 1;
            }
            rig.dp.cycle();
        }
        prop_assert_eq!(rig.dp.in_flight(), 0);
        prop_assert!(rig.dp.is_idle());
        prop_assert!(rig.dp.latency_total() >= count * unloaded_latency(&config));
    }

    #[test]
    fn operations_are_never_duplicated(
        config in small_config(),
        offers in prop::collection::vec(any::<bool>(), 1..60),
    ) {
        let mut rig = DatapathRig::new(&config);
        let mut next = 0;
        for offer in offers {
            if offer && rig.dp.insert_operation(op(next)).is_ok() {
                next += 1;
            }
            rig.dp.cycle();

            let snap = rig.dp.pipeline_dump();
            let mut seen: Vec<OpId> = snap.registers.iter().flatten().copied().collect();
            seen.extend(snap.stages.iter().flat_map(|(_, slots)| slots.iter().flatten().copied()));
            let unique: HashSet<_> = seen.iter().copied().collect();
            prop_assert_eq!(unique.len(), seen.len());
            prop_assert_eq!(seen.len() as u64, rig.dp.in_flight());
        }
    }
}
