//! Compute dispatch policies.
//!
//! Once the SRAMs hold an instruction's data, the control processor asks a
//! [`DispatchPolicy`] for operations until it runs dry. The policy decides which SRAM
//! lines each operation touches; the datapath decides when it runs.

use std::fmt::Debug;

use crate::common::BufferKind;
use crate::config::Config;
use crate::core::control::instruction::Instruction;
use crate::core::pipeline::operation::{OpId, Operation, SramRegion};

/// Source of compute operations for one instruction.
pub trait DispatchPolicy: Debug {
    /// Prepares the sweep for `inst`. Called once, when dispatch begins.
    fn begin(&mut self, inst: &Instruction, config: &Config);

    /// Builds the next operation, tagged `id`, or returns `None` once exhausted.
    fn next_operation(&mut self, id: OpId) -> Option<Operation>;
}

/// Policy that issues nothing; the instruction only moves data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDispatch;

impl DispatchPolicy for NoDispatch {
    fn begin(&mut self, _inst: &Instruction, _config: &Config) {}

    fn next_operation(&mut self, _id: OpId) -> Option<Operation> {
        None
    }
}

/// Sweeps every resident synapse line against a strided window of input lines.
///
/// Operation `i` reads SB line `i mod sb_lines`, the NBin line picked by the stride
/// window and writes NBout line `i mod nbout_lines`. The SB sweep repeats
/// `sb_reuse + 1` times. The NBin window starts at `nbin_stride_begin`, holds each line
/// for `nbin_reuse + 1` operations, advances by `nbin_stride` lines and wraps at
/// `nbin_stride_end` (or at the end of the loaded input when that is 0).
#[derive(Debug, Clone, Default)]
pub struct FilterSweep {
    issued: u64,
    total: u64,
    sb_line: u64,
    sb_lines: u64,
    nbin_line: u64,
    window_begin: u64,
    window_span: u64,
    stride: u64,
    hold: u64,
    nbout_line: u64,
    nbout_lines: u64,
}

impl FilterSweep {
    /// Creates an exhausted policy; [`DispatchPolicy::begin`] arms it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations the current sweep will issue in total.
    pub const fn total(&self) -> u64 {
        self.total
    }

    fn nbin_index(&self, i: u64) -> u64 {
        let step = i / self.hold;
        if self.window_span == 0 {
            return self.window_begin;
        }
        self.window_begin + (step * self.stride) % self.window_span
    }
}

impl DispatchPolicy for FilterSweep {
    fn begin(&mut self, inst: &Instruction, config: &Config) {
        let line = |buffer| config.line_bytes(buffer) as u64;
        let lines = |buffer| config.sram(buffer).num_lines as u64;

        self.sb_line = line(BufferKind::Weight);
        self.sb_lines = inst.sb_size.div_ceil(self.sb_line);
        self.total = self.sb_lines * (u64::from(inst.sb_reuse) + 1);
        self.issued = 0;

        self.nbin_line = line(BufferKind::Input);
        let nbin_lines = inst.nbin_size.div_ceil(self.nbin_line).max(1);
        let end = match u64::from(inst.nbin_stride_end) {
            0 => nbin_lines,
            end => end,
        }
        .min(lines(BufferKind::Input));
        self.window_begin = u64::from(inst.nbin_stride_begin).min(end.saturating_sub(1));
        self.window_span = end.saturating_sub(self.window_begin);
        self.stride = u64::from(inst.nbin_stride);
        self.hold = u64::from(inst.nbin_reuse) + 1;

        self.nbout_line = line(BufferKind::Output);
        self.nbout_lines = match inst.nbout_size.div_ceil(self.nbout_line) {
            0 => lines(BufferKind::Output),
            n => n.min(lines(BufferKind::Output)),
        };
    }

    fn next_operation(&mut self, id: OpId) -> Option<Operation> {
        if self.issued >= self.total {
            return None;
        }
        let i = self.issued;
        self.issued += 1;

        let input = SramRegion::new(self.nbin_index(i) * self.nbin_line, self.nbin_line);
        let weight = SramRegion::new((i % self.sb_lines) * self.sb_line, self.sb_line);
        let output = SramRegion::new((i % self.nbout_lines) * self.nbout_line, self.nbout_line);
        Some(Operation::new(id, input, weight, output))
    }
}
