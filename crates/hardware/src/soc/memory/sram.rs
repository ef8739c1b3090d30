//! Banked on-chip SRAM model.
//!
//! Each of NBin, SB and NBout is a [`BankedMemory`]: a fixed-latency memory with a finite
//! number of ports. A port is held for the whole access, so the number of accesses in
//! flight never exceeds the port count. Accesses are either untagged (DRAM fills issued by
//! the control processor) or tagged with the [`OpId`] of a pipeline operation, in which
//! case completion is delivered to that operation in the attached pipeline register.
//!
//! When more requests arrive than there are free ports, the earlier caller wins and the
//! rest are refused; nothing is queued beyond the admitted accesses.

use tracing::trace;

use crate::common::{AccessType, BufferKind};
use crate::config::{Config, SramConfig};
use crate::core::pipeline::latches::PipelineRegister;
use crate::core::pipeline::operation::{AccessState, Direction, OpId, Operation};

/// Per-SRAM counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SramStats {
    /// Reads admitted.
    pub reads: u64,
    /// Writes admitted.
    pub writes: u64,
    /// Accesses refused because every port was busy.
    pub port_conflicts: u64,
    /// Lines moved by completed accesses.
    pub lines_transferred: u64,
}

/// One admitted access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SramAccess {
    kind: AccessType,
    size: u64,
    remaining: u64,
    op: Option<OpId>,
}

/// Port-limited, fixed-latency SRAM.
#[derive(Debug)]
pub struct BankedMemory {
    buffer: BufferKind,
    line_size: u64,
    num_lines: u64,
    num_ports: usize,
    access_cycles: u64,
    in_flight: Vec<SramAccess>,
    stats: SramStats,
}

impl BankedMemory {
    /// Creates an SRAM with `element_bytes`-wide elements.
    pub fn new(buffer: BufferKind, config: &SramConfig, element_bytes: usize) -> Self {
        Self {
            buffer,
            line_size: (config.line_length * element_bytes) as u64,
            num_lines: config.num_lines as u64,
            num_ports: config.num_ports,
            access_cycles: config.access_cycles,
            in_flight: Vec::with_capacity(config.num_ports),
            stats: SramStats::default(),
        }
    }

    /// Creates the SRAM for `buffer` from the full configuration.
    pub fn from_config(buffer: BufferKind, config: &Config) -> Self {
        Self::new(buffer, config.sram(buffer), config.element_bytes())
    }

    /// Buffer identity.
    #[inline]
    pub const fn buffer(&self) -> BufferKind {
        self.buffer
    }

    /// Line size in bytes.
    #[inline]
    pub const fn line_size(&self) -> u64 {
        self.line_size
    }

    /// Number of lines.
    #[inline]
    pub const fn num_lines(&self) -> u64 {
        self.num_lines
    }

    /// Capacity in bytes.
    #[inline]
    pub const fn capacity(&self) -> u64 {
        self.line_size * self.num_lines
    }

    /// Access latency in cycles.
    #[inline]
    pub const fn access_cycles(&self) -> u64 {
        self.access_cycles
    }

    /// Lines touched by an access of `size` bytes.
    pub const fn lines_for(&self, size: u64) -> u64 {
        size.div_ceil(self.line_size)
    }

    /// Ports not held by an in-flight access.
    pub fn free_ports(&self) -> usize {
        self.num_ports - self.in_flight.len()
    }

    /// Number of accesses in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns true if no access is in flight.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Counters accumulated so far.
    #[inline]
    pub const fn stats(&self) -> SramStats {
        self.stats
    }

    /// Starts an untagged read of `size` bytes at `addr`. Returns false if no port is free.
    pub fn read(&mut self, addr: u64, size: u64) -> bool {
        self.admit(AccessType::Read, addr, size, None)
    }

    /// Starts an untagged write of `size` bytes at `addr`. Returns false if no port is free.
    pub fn write(&mut self, addr: u64, size: u64) -> bool {
        self.admit(AccessType::Write, addr, size, None)
    }

    /// Starts the read this buffer owes `op`, marking it pending on success.
    pub fn read_for(&mut self, op: &mut Operation) -> bool {
        self.admit_for(AccessType::Read, op)
    }

    /// Starts the write this buffer owes `op`, marking it pending on success.
    pub fn write_for(&mut self, op: &mut Operation) -> bool {
        self.admit_for(AccessType::Write, op)
    }

    /// Advances every in-flight access by one cycle.
    ///
    /// Completed accesses release their port; tagged completions mark the owning operation
    /// in `register`. Afterwards, operations in `register` still owed an access by this
    /// buffer are admitted in queue order while ports remain.
    ///
    /// # Returns
    ///
    /// Number of accesses that completed this cycle.
    pub fn tick(&mut self, register: &mut PipelineRegister) -> usize {
        for access in &mut self.in_flight {
            access.remaining = access.remaining.saturating_sub(1);
        }

        let mut completed = 0;
        let mut i = 0;
        while i < self.in_flight.len() {
            if self.in_flight[i].remaining > 0 {
                i += 1;
                continue;
            }
            let access = self.in_flight.remove(i);
            completed += 1;
            let lines = self.lines_for(access.size);
            self.stats.lines_transferred += lines;
            trace!(buffer = %self.buffer, kind = %access.kind, lines, "access complete");
            if let Some(id) = access.op {
                match register.find_mut(id) {
                    Some(op) => op.set_sram_op_complete(self.buffer),
                    None => trace!(buffer = %self.buffer, op = %id, "completion for departed op"),
                }
            }
        }

        self.intake(register);
        completed
    }

    fn intake(&mut self, register: &mut PipelineRegister) {
        let wanted = match self.buffer {
            BufferKind::Input | BufferKind::Weight => Direction::Read,
            BufferKind::Output => Direction::Write,
        };
        for op in register.iter_mut() {
            if op.direction() != wanted || op.access_state(self.buffer) != AccessState::Idle {
                continue;
            }
            let admitted = match wanted {
                Direction::Read => self.read_for(op),
                Direction::Write => self.write_for(op),
            };
            if !admitted {
                break;
            }
        }
    }

    fn admit_for(&mut self, kind: AccessType, op: &mut Operation) -> bool {
        let (addr, size) = (op.sram_addr(self.buffer), op.sram_size(self.buffer));
        let admitted = self.admit(kind, addr, size, Some(op.id()));
        if admitted {
            op.set_sram_op_pending(self.buffer);
        }
        admitted
    }

    fn admit(&mut self, kind: AccessType, addr: u64, size: u64, op: Option<OpId>) -> bool {
        if self.in_flight.len() >= self.num_ports {
            self.stats.port_conflicts += 1;
            trace!(buffer = %self.buffer, %kind, addr, "refused: all ports busy");
            return false;
        }
        debug_assert!(
            addr + size <= self.capacity(),
            "{} access [{addr}, {}) exceeds capacity {}",
            self.buffer,
            addr + size,
            self.capacity()
        );
        match kind {
            AccessType::Read => self.stats.reads += 1,
            AccessType::Write => self.stats.writes += 1,
        }
        self.in_flight.push(SramAccess {
            kind,
            size,
            remaining: self.access_cycles,
            op,
        });
        true
    }
}
