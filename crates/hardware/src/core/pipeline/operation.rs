//! In-flight compute operations.
//!
//! An [`Operation`] is one unit of work traversing the NFU pipeline. It is created by the
//! dispatch policy, admitted by the datapath, moved from register to stage to register
//! and dropped when its NBout writeback completes. The datapath never clones one.

use std::fmt;

use crate::common::{BufferKind, BufferMap};

/// Unique operation identifier, assigned by the creator of the operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(pub u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Whether the operation is still consuming its inputs or producing its output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Reading NBin and SB, or being computed.
    #[default]
    Read,
    /// Writing its result into NBout.
    Write,
}

/// Progress of one SRAM access made on behalf of an operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessState {
    /// Not requested yet.
    #[default]
    Idle,
    /// Admitted by the SRAM, latency not yet elapsed.
    Pending,
    /// Latency elapsed; data delivered.
    Complete,
}

/// Address and size of one SRAM region touched by an operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SramRegion {
    /// Byte address inside the SRAM.
    pub addr: u64,
    /// Size in bytes.
    pub size: u64,
}

impl SramRegion {
    /// Creates a region.
    pub const fn new(addr: u64, size: u64) -> Self {
        Self { addr, size }
    }
}

/// One in-flight compute operation.
#[derive(Debug, PartialEq, Eq)]
pub struct Operation {
    id: OpId,
    regions: BufferMap<SramRegion>,
    access: BufferMap<AccessState>,
    direction: Direction,
    issued_at: Option<u64>,
}

impl Operation {
    /// Creates an operation reading `input` from NBin and `weight` from SB and writing
    /// `output` to NBout.
    pub fn new(id: OpId, input: SramRegion, weight: SramRegion, output: SramRegion) -> Self {
        let regions = BufferMap::from_fn(|kind| match kind {
            BufferKind::Input => input,
            BufferKind::Output => output,
            BufferKind::Weight => weight,
        });
        Self {
            id,
            regions,
            access: BufferMap::default(),
            direction: Direction::Read,
            issued_at: None,
        }
    }

    /// Operation identifier.
    #[inline]
    pub const fn id(&self) -> OpId {
        self.id
    }

    /// SRAM address used in `buffer`.
    #[inline]
    pub fn sram_addr(&self, buffer: BufferKind) -> u64 {
        self.regions[buffer].addr
    }

    /// Size in bytes of the access to `buffer`.
    #[inline]
    pub fn sram_size(&self, buffer: BufferKind) -> u64 {
        self.regions[buffer].size
    }

    /// Current direction.
    #[inline]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns true while the operation is in its read phase.
    #[inline]
    pub fn is_read(&self) -> bool {
        self.direction == Direction::Read
    }

    /// Marks the operation as reading (done on admission).
    pub fn set_read(&mut self) {
        self.direction = Direction::Read;
    }

    /// Marks the operation as writing (done when it reaches the tail register).
    pub fn set_write(&mut self) {
        self.direction = Direction::Write;
    }

    /// Access state for `buffer`.
    #[inline]
    pub fn access_state(&self, buffer: BufferKind) -> AccessState {
        self.access[buffer]
    }

    /// Records that the SRAM admitted the access to `buffer`.
    pub fn set_sram_op_pending(&mut self, buffer: BufferKind) {
        self.access[buffer] = AccessState::Pending;
    }

    /// Records that the access to `buffer` completed.
    pub fn set_sram_op_complete(&mut self, buffer: BufferKind) {
        self.access[buffer] = AccessState::Complete;
    }

    /// True once both NBin and SB reads completed.
    pub fn inputs_ready(&self) -> bool {
        self.access[BufferKind::Input] == AccessState::Complete
            && self.access[BufferKind::Weight] == AccessState::Complete
    }

    /// True once the NBout write completed.
    pub fn is_write_complete(&self) -> bool {
        self.access[BufferKind::Output] == AccessState::Complete
    }

    /// Cycle at which the datapath admitted the operation.
    #[inline]
    pub const fn issued_at(&self) -> Option<u64> {
        self.issued_at
    }

    pub(crate) fn stamp_issue(&mut self, cycle: u64) {
        self.issued_at = Some(cycle);
    }
}
