//! Off-chip DRAM requests and the default DRAM timing model.
//!
//! The control processor owns every [`MemoryRequest`] it creates; the DRAM only sees a
//! copy of the addressing information and later reports `(id, cycle)` pairs through
//! [`DramInterface::drain_completed`]. The owner then flips the completion flag on its
//! own request.

use std::collections::VecDeque;
use std::fmt;

use tracing::debug;

use crate::common::{AccessType, BufferKind};
use crate::config::DramConfig;
use crate::soc::memory::controller::{MemoryController, build_controller};

/// DRAM request identifier, unique per control processor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// One outstanding transfer between DRAM and an on-chip buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryRequest {
    id: RequestId,
    addr: u64,
    size: u64,
    kind: AccessType,
    buffer: BufferKind,
    completed_at: Option<u64>,
}

impl MemoryRequest {
    /// Creates a request that has not completed.
    pub const fn new(
        id: RequestId,
        addr: u64,
        size: u64,
        kind: AccessType,
        buffer: BufferKind,
    ) -> Self {
        Self {
            id,
            addr,
            size,
            kind,
            buffer,
            completed_at: None,
        }
    }

    /// Request identifier.
    #[inline]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// DRAM byte address.
    #[inline]
    pub const fn addr(&self) -> u64 {
        self.addr
    }

    /// Transfer size in bytes.
    #[inline]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Read (DRAM to SRAM) or write (SRAM to DRAM).
    #[inline]
    pub const fn kind(&self) -> AccessType {
        self.kind
    }

    /// On-chip buffer at the other end of the transfer.
    #[inline]
    pub const fn buffer(&self) -> BufferKind {
        self.buffer
    }

    /// Returns true once the DRAM reported the request done.
    #[inline]
    pub const fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// DRAM cycle at which the request completed.
    #[inline]
    pub const fn completed_at(&self) -> Option<u64> {
        self.completed_at
    }

    /// Marks the request complete at `cycle`.
    pub fn complete(&mut self, cycle: u64) {
        self.completed_at = Some(cycle);
    }
}

/// Boundary between the control processor and an off-chip memory model.
pub trait DramInterface: fmt::Debug {
    /// Accepts a request. The DRAM never refuses; it queues.
    fn submit(&mut self, request: &MemoryRequest);

    /// Advances the DRAM by one cycle.
    fn tick(&mut self);

    /// Returns the requests finished since the previous call, in completion order,
    /// with their completion cycle.
    fn drain_completed(&mut self) -> Vec<(RequestId, u64)>;

    /// Requests accepted but not yet finished.
    fn outstanding(&self) -> usize;

    /// Traffic counters, for models that keep them.
    fn stats(&self) -> DramStats {
        DramStats::default()
    }
}

/// DRAM traffic counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DramStats {
    /// Read requests submitted.
    pub reads: u64,
    /// Write requests submitted.
    pub writes: u64,
    /// Bytes read.
    pub bytes_read: u64,
    /// Bytes written.
    pub bytes_written: u64,
}

/// Single-channel DRAM.
///
/// A request starts once the channel is free and occupies it for the controller latency
/// plus `ceil(size / bus_width)` transfer cycles. Requests therefore complete in
/// submission order.
#[derive(Debug)]
pub struct DramModel {
    controller: Box<dyn MemoryController>,
    bus_width: u64,
    now: u64,
    busy_until: u64,
    in_flight: VecDeque<(RequestId, u64)>,
    completed: Vec<(RequestId, u64)>,
    stats: DramStats,
}

impl DramModel {
    /// Creates an idle DRAM.
    pub fn new(config: &DramConfig) -> Self {
        Self::with_controller(build_controller(config), config.bus_width)
    }

    /// Creates an idle DRAM around an explicit controller.
    pub fn with_controller(controller: Box<dyn MemoryController>, bus_width: u64) -> Self {
        Self {
            controller,
            bus_width: bus_width.max(1),
            now: 0,
            busy_until: 0,
            in_flight: VecDeque::new(),
            completed: Vec::new(),
            stats: DramStats::default(),
        }
    }

    /// Current DRAM cycle.
    #[inline]
    pub const fn now(&self) -> u64 {
        self.now
    }
}

impl DramInterface for DramModel {
    fn submit(&mut self, request: &MemoryRequest) {
        let start = self.now.max(self.busy_until);
        let transfer = request.size().div_ceil(self.bus_width);
        let done = start + self.controller.access_latency(request.addr()) + transfer;
        self.busy_until = done;
        self.in_flight.push_back((request.id(), done));

        match request.kind() {
            AccessType::Read => {
                self.stats.reads += 1;
                self.stats.bytes_read += request.size();
            }
            AccessType::Write => {
                self.stats.writes += 1;
                self.stats.bytes_written += request.size();
            }
        }
        debug!(
            req = %request.id(),
            kind = %request.kind(),
            buffer = %request.buffer(),
            addr = request.addr(),
            size = request.size(),
            done,
            "dram request submitted"
        );
    }

    fn tick(&mut self) {
        self.now += 1;
        while let Some(&(id, done)) = self.in_flight.front() {
            if done > self.now {
                break;
            }
            let _ = self.in_flight.pop_front();
            debug!(req = %id, cycle = self.now, "dram request complete");
            self.completed.push((id, self.now));
        }
    }

    fn drain_completed(&mut self) -> Vec<(RequestId, u64)> {
        std::mem::take(&mut self.completed)
    }

    fn outstanding(&self) -> usize {
        self.in_flight.len()
    }

    fn stats(&self) -> DramStats {
        self.stats
    }
}
