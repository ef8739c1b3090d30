//! # Datapath Tests
//!
//! Covers admission, end-to-end operation latency, edge evaluation order,
//! backpressure through the register chain and the pipeline dump.

use dnnsim_core::common::BufferKind;
use dnnsim_core::core::pipeline::{OpId, StageId};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::config::ConfigBuilder;
use crate::common::builder::operation::op;
use crate::common::harness::DatapathRig;

/// Offers operations `0..count` to the datapath, one attempt per cycle, until all
/// of them retired.
fn feed(rig: &mut DatapathRig, count: u64) {
    let mut next = 0;
    let mut guard = 0;
    while rig.dp.ops_completed() < count {
        guard += 1;
        assert!(guard < 10_000, "datapath never drained");
        if next < count && rig.dp.insert_operation(op(next)).is_ok() {
            next += 1;
        }
        rig.dp.cycle();
    }
}

// ══════════════════════════════════════════════════════════
// 1. Idle behaviour and admission
// ══════════════════════════════════════════════════════════

#[test]
fn idle_datapath_keeps_zero_counters() {
    let mut rig = DatapathRig::new(&ConfigBuilder::new().build());
    let _ = rig.cycles(100);

    assert_eq!(rig.dp.now(), 100);
    assert_eq!(rig.dp.ops_issued(), 0);
    assert_eq!(rig.dp.ops_completed(), 0);
    assert_eq!(rig.dp.last_latency(), None);
    assert!(rig.dp.is_idle());
    for buffer in BufferKind::ALL {
        assert_eq!(rig.dp.sram(buffer).stats().reads, 0);
    }
}

#[test]
fn second_insert_in_one_cycle_is_refused() {
    let mut rig = DatapathRig::new(&ConfigBuilder::minimal().build());
    assert!(rig.dp.insert_operation(op(1)).is_ok());

    let back = rig.dp.insert_operation(op(2)).unwrap_err();
    assert_eq!(back.id(), OpId(2));
    assert_eq!(rig.dp.ops_issued(), 1);
    assert_eq!(rig.dp.insert_refusals(), 1);
    assert_eq!(rig.dp.register(0).map(|r| r.ids()), Some(vec![OpId(1)]));
}

#[test]
fn head_frees_once_nfu1_pulls() {
    let mut rig = DatapathRig::new(&ConfigBuilder::minimal().build());
    rig.dp.insert_operation(op(1)).unwrap();

    // Reads complete on the first edge; NFU-1 pulls on the second.
    let _ = rig.cycles(1);
    assert!(rig.dp.insert_operation(op(2)).is_err());
    let _ = rig.cycles(1);
    assert!(rig.dp.insert_operation(op(2)).is_ok());
    assert_eq!(rig.dp.in_flight(), 2);
}

#[test]
fn admission_starts_both_reads() {
    let mut rig = DatapathRig::new(&ConfigBuilder::minimal().build());
    rig.dp.insert_operation(op(1)).unwrap();

    assert_eq!(rig.dp.sram(BufferKind::Input).in_flight(), 1);
    assert_eq!(rig.dp.sram(BufferKind::Weight).in_flight(), 1);
    assert_eq!(rig.dp.sram(BufferKind::Output).in_flight(), 0);
}

// ══════════════════════════════════════════════════════════
// 2. Latency
// ══════════════════════════════════════════════════════════

/// A lone operation takes the slower input read, every stage depth and the
/// NBout write.
#[rstest]
#[case::defaults(1, 2, 1, 2, 2, 1, 8)]
#[case::all_unit(1, 1, 1, 1, 1, 1, 5)]
#[case::slow_nbin(3, 1, 2, 4, 1, 2, 12)]
#[case::slow_sb(1, 4, 1, 1, 3, 1, 10)]
fn lone_operation_latency(
    #[case] nbin: u64,
    #[case] sb: u64,
    #[case] nbout: u64,
    #[case] d1: usize,
    #[case] d2: usize,
    #[case] d3: usize,
    #[case] expected: u64,
) {
    let config = ConfigBuilder::new()
        .latencies(nbin, sb, nbout)
        .depths(d1, d2, d3)
        .build();
    let mut rig = DatapathRig::new(&config);
    rig.dp.insert_operation(op(1)).unwrap();

    let _ = rig.run_until_completed(1);
    assert_eq!(rig.dp.last_latency(), Some(expected));
    assert_eq!(rig.dp.latency_max(), expected);
    assert!(rig.dp.is_idle());
}

// ══════════════════════════════════════════════════════════
// 3. Edge evaluation order
// ══════════════════════════════════════════════════════════

/// With unit depths and latencies an operation advances exactly one register per
/// edge. Evaluating front to back would let it skip registers.
#[test]
fn operation_advances_one_register_per_edge() {
    let mut rig = DatapathRig::new(&ConfigBuilder::minimal().build());
    rig.dp.insert_operation(op(1)).unwrap();

    for expected in 0..=3 {
        let _ = rig.cycles(1);
        assert_eq!(rig.register_of(1), Some(expected), "after edge {}", expected + 1);
    }

    let _ = rig.cycles(1);
    assert_eq!(rig.dp.ops_completed(), 0);
    assert_eq!(rig.register_of(1), Some(3));

    let _ = rig.cycles(1);
    assert_eq!(rig.dp.ops_completed(), 1);
    assert_eq!(rig.dp.last_latency(), Some(5));
    assert_eq!(rig.register_of(1), None);
}

#[test]
fn writeback_starts_when_operation_reaches_tail() {
    let mut rig = DatapathRig::new(&ConfigBuilder::minimal().build());
    rig.dp.insert_operation(op(1)).unwrap();
    let _ = rig.cycles(3);
    assert_eq!(rig.dp.sram(BufferKind::Output).stats().writes, 0);

    let _ = rig.cycles(1);
    assert_eq!(rig.dp.sram(BufferKind::Output).stats().writes, 1);
    assert!(!rig.dp.tail().peek().is_some_and(|o| o.is_read()));
}

// ══════════════════════════════════════════════════════════
// 4. Throughput and backpressure
// ══════════════════════════════════════════════════════════

#[test]
fn stream_of_operations_all_retire() {
    let mut rig = DatapathRig::new(&ConfigBuilder::new().build());
    feed(&mut rig, 16);

    assert_eq!(rig.dp.ops_issued(), 16);
    assert_eq!(rig.dp.ops_completed(), 16);
    assert_eq!(rig.dp.in_flight(), 0);
    assert!(rig.dp.latency_max() >= 8);
    assert!(rig.dp.latency_total() >= 16 * 8);
}

#[test]
fn slow_writeback_backs_up_the_pipeline() {
    let config = ConfigBuilder::minimal()
        .sram(BufferKind::Output, 1, 12)
        .max_buffer_size(1)
        .build();
    let mut rig = DatapathRig::new(&config);
    feed(&mut rig, 6);

    assert!(rig.dp.stage(StageId::Nfu3).stats().stall_cycles > 0);
    assert!(rig.dp.insert_refusals() > 0);
    assert!(rig.dp.latency_max() > 5);
    for id in StageId::ALL {
        assert_eq!(rig.dp.stage(id).stats().accepted, 6);
    }
}

// ══════════════════════════════════════════════════════════
// 5. Pipeline dump
// ══════════════════════════════════════════════════════════

#[test]
fn dump_tracks_operation_through_stage_slots() {
    let config = ConfigBuilder::minimal().stage(StageId::Nfu2, 3, 1).build();
    let mut rig = DatapathRig::new(&config);
    rig.dp.insert_operation(op(4)).unwrap();
    let _ = rig.cycles(3);

    let snap = rig.dp.pipeline_dump();
    assert_eq!(snap.cycle, 3);
    assert_eq!(
        snap.stages,
        vec![
            (StageId::Nfu1, vec![]),
            (StageId::Nfu2, vec![Some(OpId(4)), None]),
            (StageId::Nfu3, vec![]),
        ]
    );
    assert!(snap.registers.iter().all(Vec::is_empty));

    let text = snap.to_string();
    assert!(text.contains("NFU-2 [op#4 -]"), "{text}");
    assert!(text.contains("reg3 []"), "{text}");
}
