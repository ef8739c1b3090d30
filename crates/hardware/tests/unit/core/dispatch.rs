//! # Dispatch Policy Tests
//!
//! Checks the operations produced by `FilterSweep` for a range of instruction shapes,
//! and that every region it hands out stays inside its SRAM.

use dnnsim_core::common::BufferKind;
use dnnsim_core::config::Config;
use dnnsim_core::core::control::{DispatchPolicy, FilterSweep, Instruction, NoDispatch};
use dnnsim_core::core::pipeline::{OpId, Operation};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn sweep(inst: &Instruction, config: &Config) -> Vec<Operation> {
    let mut policy = FilterSweep::new();
    policy.begin(inst, config);
    let mut ops = Vec::new();
    while let Some(op) = policy.next_operation(OpId(100 + ops.len() as u64)) {
        ops.push(op);
    }
    assert_eq!(ops.len() as u64, policy.total());
    ops
}

fn lines(ops: &[Operation], buffer: BufferKind, line: u64) -> Vec<u64> {
    ops.iter().map(|op| op.sram_addr(buffer) / line).collect()
}

#[test]
fn no_dispatch_is_always_exhausted() {
    let mut policy = NoDispatch;
    policy.begin(&Instruction::default(), &Config::default());
    assert!(policy.next_operation(OpId(0)).is_none());
}

#[test]
fn operations_carry_the_ids_they_were_given() {
    let inst = Instruction {
        sb_size: 1024,
        ..Instruction::default()
    };
    let ids: Vec<_> = sweep(&inst, &Config::default())
        .iter()
        .map(Operation::id)
        .collect();
    assert_eq!(ids, vec![OpId(100), OpId(101)]);
}

#[test]
fn partial_synapse_line_still_gets_an_operation() {
    let inst = Instruction {
        sb_size: 513,
        ..Instruction::default()
    };
    assert_eq!(sweep(&inst, &Config::default()).len(), 2);
}

#[test]
fn output_lines_wrap_at_the_stored_region() {
    let inst = Instruction {
        sb_size: 512 * 5,
        store_output: true,
        nbout_size: 64,
        ..Instruction::default()
    };
    let ops = sweep(&inst, &Config::default());
    assert_eq!(lines(&ops, BufferKind::Output, 32), vec![0, 1, 0, 1, 0]);
}

#[test]
fn stride_window_is_clamped_to_the_buffer() {
    let inst = Instruction {
        nbin_size: 2048,
        nbin_stride: 40,
        nbin_stride_begin: 10,
        nbin_stride_end: 500,
        sb_size: 512 * 3,
        ..Instruction::default()
    };
    // Window [10, 64): steps of 40 wrap modulo 54.
    let ops = sweep(&inst, &Config::default());
    assert_eq!(lines(&ops, BufferKind::Input, 32), vec![10, 50, 36]);
}

#[test]
fn zero_stride_keeps_the_first_window_line() {
    let inst = Instruction {
        nbin_size: 256,
        nbin_stride_begin: 3,
        sb_size: 512 * 4,
        ..Instruction::default()
    };
    let ops = sweep(&inst, &Config::default());
    assert_eq!(lines(&ops, BufferKind::Input, 32), vec![3, 3, 3, 3]);
}

proptest! {
    #[test]
    fn regions_stay_inside_their_buffers(
        nbin_size in 0u64..=2048,
        sb_size in 0u64..=8192,
        sb_reuse in 0u32..3,
        nbin_reuse in 0u32..3,
        stride in 0u32..8,
        begin in 0u32..80,
        end in 0u32..80,
        nbout_size in 0u64..=2048,
    ) {
        let config = Config::default();
        let inst = Instruction {
            nbin_size,
            nbin_reuse,
            nbin_stride: stride,
            nbin_stride_begin: begin,
            nbin_stride_end: end,
            sb_size,
            sb_reuse,
            nbout_size,
            ..Instruction::default()
        };
        let ops = sweep(&inst, &config);
        prop_assert_eq!(ops.len() as u64, sb_size.div_ceil(512) * (u64::from(sb_reuse) + 1));
        for op in &ops {
            for buffer in BufferKind::ALL {
                let end = op.sram_addr(buffer) + op.sram_size(buffer);
                prop_assert!(end <= config.sram_capacity(buffer) as u64);
            }
        }
    }
}
