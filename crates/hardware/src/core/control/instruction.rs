//! Control-processor instructions and their FSM state.

use std::fmt;

use serde::Deserialize;

use crate::common::{BufferKind, SimError, SimResult};
use crate::config::Config;

/// Instruction FSM state.
///
/// The state lives in the instruction as a raw code, the way a hardware state register
/// would; [`TryFrom<u8>`] is the only way back to this enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InstState {
    /// Fetch the NBin data from DRAM.
    LoadInputBuffer = 0,
    /// Fetch the SB data from DRAM.
    LoadWeightBuffer = 1,
    /// Fill the SRAMs, then dispatch operations until the datapath drains.
    Execute = 2,
    /// Write NBout back to DRAM.
    StoreOutputBuffer = 3,
    /// Terminal state.
    Complete = 4,
}

impl InstState {
    /// All states, in FSM order.
    pub const ALL: [Self; 5] = [
        Self::LoadInputBuffer,
        Self::LoadWeightBuffer,
        Self::Execute,
        Self::StoreOutputBuffer,
        Self::Complete,
    ];

    /// Raw state code.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for InstState {
    type Error = SimError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|state| state.code() == code)
            .ok_or(SimError::UndefinedState(code))
    }
}

impl fmt::Display for InstState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoadInputBuffer => "LOAD_NBIN",
            Self::LoadWeightBuffer => "LOAD_SB",
            Self::Execute => "EXECUTE",
            Self::StoreOutputBuffer => "STORE_NBOUT",
            Self::Complete => "COMPLETE",
        };
        f.write_str(name)
    }
}

/// One control-processor directive.
///
/// Addresses are DRAM byte addresses; sizes are bytes. NBin is always loaded. Stride
/// fields are expressed in NBin lines.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Instruction {
    /// DRAM address of the input neurons.
    pub nbin_address: u64,
    /// Bytes of input neurons.
    pub nbin_size: u64,
    /// Times each NBin line is reused before the stride window advances.
    pub nbin_reuse: u32,
    /// Lines the stride window advances by.
    pub nbin_stride: u32,
    /// First line of the stride window.
    pub nbin_stride_begin: u32,
    /// Line the stride window wraps at; 0 means the end of the loaded data.
    pub nbin_stride_end: u32,

    /// Whether SB is loaded from DRAM.
    pub load_weights: bool,
    /// DRAM address of the synapses.
    pub sb_address: u64,
    /// Bytes of synapses.
    pub sb_size: u64,
    /// Extra passes over the resident synapses.
    pub sb_reuse: u32,

    /// Whether NBout is written back to DRAM.
    pub store_output: bool,
    /// DRAM address of the output neurons.
    pub nbout_address: u64,
    /// Bytes of output neurons.
    pub nbout_size: u64,

    /// Raw FSM state code; see [`InstState`]. Codes outside the FSM are rejected when the
    /// instruction is stepped, not when it is built.
    pub state: u8,
}

impl Instruction {
    /// Overrides the raw FSM state code, e.g. to resume a partially executed instruction.
    #[must_use]
    pub const fn with_raw_state(mut self, code: u8) -> Self {
        self.state = code;
        self
    }

    /// Raw FSM state code.
    #[inline]
    pub const fn raw_state(&self) -> u8 {
        self.state
    }

    /// Decodes the current FSM state.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UndefinedState`] if the raw code names no state.
    pub fn state(&self) -> SimResult<InstState> {
        InstState::try_from(self.state)
    }

    pub(crate) fn set_state(&mut self, state: InstState) {
        self.state = state.code();
    }

    /// Bytes this instruction moves into or out of `buffer`.
    pub const fn size_of(&self, buffer: BufferKind) -> u64 {
        match buffer {
            BufferKind::Input => self.nbin_size,
            BufferKind::Output => self.nbout_size,
            BufferKind::Weight => self.sb_size,
        }
    }

    /// Checks that every transfer fits its SRAM.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::BufferOverflow`] for the first buffer that is too small.
    pub fn validate(&self, config: &Config) -> SimResult<()> {
        for buffer in BufferKind::ALL {
            let requested = self.size_of(buffer);
            let capacity = config.sram_capacity(buffer) as u64;
            if requested > capacity {
                return Err(SimError::BufferOverflow {
                    buffer,
                    requested,
                    capacity,
                });
            }
        }
        Ok(())
    }
}
