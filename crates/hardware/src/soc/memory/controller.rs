//! DRAM controller latency models.
//!
//! This module provides:
//! 1. **SimpleController:** Fixed latency per access, independent of address.
//! 2. **RowBufferController:** Open-row model; a hit costs CAS, a miss on an open row costs
//!    precharge + RAS + CAS, and the first access after reset costs RAS + CAS.
//!
//! The controller only answers "how long does the access to `addr` take"; queueing and
//! transfer time are handled by [`DramModel`](super::dram::DramModel).

use std::fmt::Debug;

use crate::config::{DramConfig, DramControllerKind};

/// Row size of the row-buffer model in bytes.
const ROW_BYTES: u64 = 2048;

/// Reports the access latency of one DRAM request in cycles.
pub trait MemoryController: Debug {
    /// Returns the number of cycles before data starts to move for an access at `addr`.
    ///
    /// # Arguments
    ///
    /// * `addr` - DRAM byte address; used by row-buffer models.
    fn access_latency(&mut self, addr: u64) -> u64;
}

/// Builds the controller selected by `config`.
pub fn build_controller(config: &DramConfig) -> Box<dyn MemoryController> {
    match config.controller {
        DramControllerKind::Simple => Box::new(SimpleController::new(config.latency)),
        DramControllerKind::Dram => Box::new(RowBufferController::new(
            config.t_cas,
            config.t_ras,
            config.t_pre,
        )),
    }
}

/// Fixed-latency controller.
#[derive(Debug, Clone, Copy)]
pub struct SimpleController {
    latency: u64,
}

impl SimpleController {
    /// Creates a controller answering `latency` for every access.
    pub const fn new(latency: u64) -> Self {
        Self { latency }
    }
}

impl MemoryController for SimpleController {
    fn access_latency(&mut self, _addr: u64) -> u64 {
        self.latency
    }
}

/// Single-bank controller with one open row.
#[derive(Debug, Clone)]
pub struct RowBufferController {
    open_row: Option<u64>,
    t_cas: u64,
    t_ras: u64,
    t_pre: u64,
}

impl RowBufferController {
    /// Creates a controller with no row open.
    ///
    /// # Arguments
    ///
    /// * `t_cas` - Column access latency.
    /// * `t_ras` - Row activation latency.
    /// * `t_pre` - Precharge latency.
    pub const fn new(t_cas: u64, t_ras: u64, t_pre: u64) -> Self {
        Self {
            open_row: None,
            t_cas,
            t_ras,
            t_pre,
        }
    }
}

impl MemoryController for RowBufferController {
    fn access_latency(&mut self, addr: u64) -> u64 {
        let row = addr / ROW_BYTES;
        match self.open_row.replace(row) {
            Some(open) if open == row => self.t_cas,
            Some(_) => self.t_pre + self.t_ras + self.t_cas,
            None => self.t_ras + self.t_cas,
        }
    }
}
