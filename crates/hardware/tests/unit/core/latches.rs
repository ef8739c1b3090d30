//! # Pipeline Register Tests
//!
//! Capacity, FIFO ordering and ownership hand-back of `PipelineRegister`.

use dnnsim_core::core::pipeline::{OpId, PipelineRegister};
use rstest::rstest;

use crate::common::builder::operation::op;

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
fn push_succeeds_exactly_capacity_times(#[case] capacity: usize) {
    let mut reg = PipelineRegister::new(capacity);
    let mut accepted = 0;
    for id in 0..(capacity as u64 + 3) {
        if reg.push(op(id)).is_ok() {
            accepted += 1;
        }
        reg.end_cycle();
    }
    assert_eq!(accepted, capacity);
    assert!(reg.is_full());
    assert_eq!(reg.len(), capacity);
}

#[test]
fn refused_push_returns_the_same_operation() {
    let mut reg = PipelineRegister::new(1);
    reg.push(op(1)).unwrap();
    reg.end_cycle();
    let back = reg.push(op(2)).unwrap_err();
    assert_eq!(back.id(), OpId(2));
    assert_eq!(reg.ids(), vec![OpId(1)]);
}

#[test]
fn pop_preserves_insertion_order() {
    let mut reg = PipelineRegister::new(3);
    for id in [7, 3, 9] {
        reg.push(op(id)).unwrap();
        reg.end_cycle();
    }
    let mut out = Vec::new();
    while let Some(op) = reg.pop() {
        out.push(op.id().0);
        reg.end_cycle();
    }
    assert_eq!(out, vec![7, 3, 9]);
    assert!(reg.is_empty());
}

#[test]
fn find_mut_reaches_any_entry() {
    let mut reg = PipelineRegister::new(2);
    reg.push(op(1)).unwrap();
    reg.end_cycle();
    reg.push(op(2)).unwrap();

    let second = reg.find_mut(OpId(2)).unwrap();
    second.set_write();
    assert!(!reg.iter().nth(1).unwrap().is_read());
    assert!(reg.find_mut(OpId(3)).is_none());
}
