//! Configuration system for the accelerator simulator.
//!
//! This module defines the static architecture parameters of the datapath. It provides:
//! 1. **Defaults:** Baseline DianNao-style geometry (16-bit data, 2 KiB NBin/NBout, 32 KiB SB).
//! 2. **Structures:** Hierarchical config for general settings, the three NFU stages, the
//!    three SRAMs and the DRAM model.
//! 3. **Validation:** A single check run before simulation starts; the configuration is
//!    immutable afterwards and shared read-only by every component.
//!
//! Configuration is supplied as JSON (see [`Config::from_json`]) or built with `Config::default()`.

use serde::Deserialize;

use crate::common::{BufferKind, SimError, SimResult};
use crate::core::pipeline::stages::StageId;

/// Default configuration constants for the simulator.
mod defaults {
    /// Width of one data element in bits (16-bit fixed point).
    pub const BIT_WIDTH: u32 = 16;

    /// Capacity of every pipeline register, in operations.
    pub const MAX_BUFFER_SIZE: usize = 4;

    /// Cycle limit applied by the harness when running an instruction stream.
    pub const MAX_CYCLES: u64 = 1_000_000;

    /// NFU-1 (multiplier array) pipeline depth in cycles.
    pub const NFU1_DEPTH: usize = 2;
    /// NFU-1 multiplier budget (concurrent operations).
    pub const NFU1_UNITS: usize = 2;

    /// NFU-2 (adder tree / pooling) pipeline depth in cycles.
    pub const NFU2_DEPTH: usize = 2;
    /// NFU-2 adder budget (concurrent operations).
    pub const NFU2_UNITS: usize = 2;

    /// NFU-3 (accumulate / activation) pipeline depth in cycles.
    pub const NFU3_DEPTH: usize = 1;
    /// NFU-3 unit budget (concurrent operations).
    pub const NFU3_UNITS: usize = 1;

    /// Elements per NBin/NBout line (Tn).
    pub const NEURON_LINE_LENGTH: usize = 16;
    /// NBin/NBout line count (2 KiB at 16 bits).
    pub const NEURON_NUM_LINES: usize = 64;

    /// Elements per SB line (Tn x Tn).
    pub const SYNAPSE_LINE_LENGTH: usize = 256;
    /// SB line count (32 KiB at 16 bits).
    pub const SYNAPSE_NUM_LINES: usize = 64;

    /// Read/write ports per SRAM.
    pub const SRAM_PORTS: usize = 1;
    /// NBin/NBout access latency in cycles.
    pub const NEURON_ACCESS_CYCLES: u64 = 1;
    /// SB access latency in cycles.
    pub const SYNAPSE_ACCESS_CYCLES: u64 = 2;

    /// Fixed DRAM access latency for the simple controller.
    pub const DRAM_LATENCY: u64 = 100;
    /// CAS latency in DRAM cycles.
    pub const T_CAS: u64 = 14;
    /// RAS latency in DRAM cycles.
    pub const T_RAS: u64 = 14;
    /// Precharge latency in DRAM cycles.
    pub const T_PRE: u64 = 14;
    /// Bytes transferred per cycle once a DRAM access starts.
    pub const DRAM_BUS_WIDTH: u64 = 64;
}

/// DRAM controller implementation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DramControllerKind {
    /// Fixed latency per access regardless of address.
    #[default]
    Simple,
    /// Row-buffer model with CAS, RAS and precharge latencies.
    #[serde(alias = "DRAM")]
    Dram,
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// General simulation settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// NFU-1 (multiply) stage.
    #[serde(default = "StageConfig::default_nfu1")]
    pub nfu1: StageConfig,
    /// NFU-2 (add/pool) stage.
    #[serde(default = "StageConfig::default_nfu2")]
    pub nfu2: StageConfig,
    /// NFU-3 (accumulate) stage.
    #[serde(default = "StageConfig::default_nfu3")]
    pub nfu3: StageConfig,
    /// Input neuron buffer.
    #[serde(default = "SramConfig::default_neuron")]
    pub nbin: SramConfig,
    /// Output neuron buffer.
    #[serde(default = "SramConfig::default_neuron")]
    pub nbout: SramConfig,
    /// Synapse (weight) buffer.
    #[serde(default = "SramConfig::default_synapse")]
    pub sb: SramConfig,
    /// Off-chip DRAM model.
    #[serde(default)]
    pub dram: DramConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            nfu1: StageConfig::default_nfu1(),
            nfu2: StageConfig::default_nfu2(),
            nfu3: StageConfig::default_nfu3(),
            nbin: SramConfig::default_neuron(),
            nbout: SramConfig::default_neuron(),
            sb: SramConfig::default_synapse(),
            dram: DramConfig::default(),
        }
    }
}

impl Config {
    /// Parses and validates a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConfigParse`] for malformed JSON and
    /// [`SimError::InvalidConfig`] when validation fails.
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the configuration of one pipeline stage.
    pub const fn stage(&self, id: StageId) -> &StageConfig {
        match id {
            StageId::Nfu1 => &self.nfu1,
            StageId::Nfu2 => &self.nfu2,
            StageId::Nfu3 => &self.nfu3,
        }
    }

    /// Returns the configuration of one SRAM.
    pub const fn sram(&self, buffer: BufferKind) -> &SramConfig {
        match buffer {
            BufferKind::Input => &self.nbin,
            BufferKind::Output => &self.nbout,
            BufferKind::Weight => &self.sb,
        }
    }

    /// Bytes per data element.
    pub const fn element_bytes(&self) -> usize {
        (self.general.bit_width / 8) as usize
    }

    /// Line size of an SRAM in bytes.
    pub const fn line_bytes(&self, buffer: BufferKind) -> usize {
        self.sram(buffer).line_length * self.element_bytes()
    }

    /// Total capacity of an SRAM in bytes.
    pub const fn sram_capacity(&self, buffer: BufferKind) -> usize {
        self.line_bytes(buffer) * self.sram(buffer).num_lines
    }

    /// Checks every parameter the simulator relies on.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the first offending parameter.
    pub fn validate(&self) -> SimResult<()> {
        let bits = self.general.bit_width;
        if bits == 0 || bits % 8 != 0 {
            return Err(SimError::InvalidConfig(format!(
                "bit_width must be a non-zero multiple of 8, got {bits}"
            )));
        }
        if self.general.max_buffer_size == 0 {
            return Err(SimError::InvalidConfig(
                "max_buffer_size must be at least 1".into(),
            ));
        }

        for id in StageId::ALL {
            let stage = self.stage(id);
            if stage.pipeline_depth == 0 {
                return Err(SimError::InvalidConfig(format!(
                    "{id} pipeline_depth must be at least 1"
                )));
            }
            if stage.functional_units == 0 {
                return Err(SimError::InvalidConfig(format!(
                    "{id} functional_units must be at least 1"
                )));
            }
        }

        for buffer in BufferKind::ALL {
            let sram = self.sram(buffer);
            let fields = [
                ("line_length", sram.line_length as u64),
                ("num_lines", sram.num_lines as u64),
                ("num_ports", sram.num_ports as u64),
                ("access_cycles", sram.access_cycles),
            ];
            if let Some((field, _)) = fields.iter().find(|(_, v)| *v == 0) {
                return Err(SimError::InvalidConfig(format!(
                    "{buffer} {field} must be at least 1"
                )));
            }
        }

        if self.dram.bus_width == 0 {
            return Err(SimError::InvalidConfig(
                "dram bus_width must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// General simulation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Data element width in bits.
    #[serde(default = "GeneralConfig::default_bit_width")]
    pub bit_width: u32,

    /// Capacity of each pipeline register, in operations.
    #[serde(default = "GeneralConfig::default_max_buffer_size")]
    pub max_buffer_size: usize,

    /// Cycle limit for harness-driven runs.
    #[serde(default = "GeneralConfig::default_max_cycles")]
    pub max_cycles: u64,
}

impl GeneralConfig {
    fn default_bit_width() -> u32 {
        defaults::BIT_WIDTH
    }

    fn default_max_buffer_size() -> usize {
        defaults::MAX_BUFFER_SIZE
    }

    fn default_max_cycles() -> u64 {
        defaults::MAX_CYCLES
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            bit_width: defaults::BIT_WIDTH,
            max_buffer_size: defaults::MAX_BUFFER_SIZE,
            max_cycles: defaults::MAX_CYCLES,
        }
    }
}

/// Pipeline stage configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StageConfig {
    /// Cycles an operation spends in the stage, including its output register.
    pub pipeline_depth: usize,
    /// Maximum operations in flight inside the stage at once.
    pub functional_units: usize,
}

impl StageConfig {
    /// Creates a stage configuration.
    pub const fn new(pipeline_depth: usize, functional_units: usize) -> Self {
        Self {
            pipeline_depth,
            functional_units,
        }
    }

    fn default_nfu1() -> Self {
        Self::new(defaults::NFU1_DEPTH, defaults::NFU1_UNITS)
    }

    fn default_nfu2() -> Self {
        Self::new(defaults::NFU2_DEPTH, defaults::NFU2_UNITS)
    }

    fn default_nfu3() -> Self {
        Self::new(defaults::NFU3_DEPTH, defaults::NFU3_UNITS)
    }
}

/// On-chip SRAM configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SramConfig {
    /// Data elements per line.
    pub line_length: usize,
    /// Number of lines.
    pub num_lines: usize,
    /// Concurrent read/write ports.
    #[serde(default = "SramConfig::default_ports")]
    pub num_ports: usize,
    /// Cycles per access; a port stays busy for the whole access.
    pub access_cycles: u64,
}

impl SramConfig {
    fn default_ports() -> usize {
        defaults::SRAM_PORTS
    }

    fn default_neuron() -> Self {
        Self {
            line_length: defaults::NEURON_LINE_LENGTH,
            num_lines: defaults::NEURON_NUM_LINES,
            num_ports: defaults::SRAM_PORTS,
            access_cycles: defaults::NEURON_ACCESS_CYCLES,
        }
    }

    fn default_synapse() -> Self {
        Self {
            line_length: defaults::SYNAPSE_LINE_LENGTH,
            num_lines: defaults::SYNAPSE_NUM_LINES,
            num_ports: defaults::SRAM_PORTS,
            access_cycles: defaults::SYNAPSE_ACCESS_CYCLES,
        }
    }
}

/// Off-chip DRAM model configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DramConfig {
    /// Controller type.
    #[serde(default)]
    pub controller: DramControllerKind,
    /// Fixed access latency (simple controller).
    #[serde(default = "DramConfig::default_latency")]
    pub latency: u64,
    /// CAS latency (row-buffer controller).
    #[serde(default = "DramConfig::default_t_cas")]
    pub t_cas: u64,
    /// RAS latency (row-buffer controller).
    #[serde(default = "DramConfig::default_t_ras")]
    pub t_ras: u64,
    /// Precharge latency (row-buffer controller).
    #[serde(default = "DramConfig::default_t_pre")]
    pub t_pre: u64,
    /// Bytes per transfer cycle.
    #[serde(default = "DramConfig::default_bus_width")]
    pub bus_width: u64,
}

impl DramConfig {
    fn default_latency() -> u64 {
        defaults::DRAM_LATENCY
    }

    fn default_t_cas() -> u64 {
        defaults::T_CAS
    }

    fn default_t_ras() -> u64 {
        defaults::T_RAS
    }

    fn default_t_pre() -> u64 {
        defaults::T_PRE
    }

    fn default_bus_width() -> u64 {
        defaults::DRAM_BUS_WIDTH
    }
}

impl Default for DramConfig {
    fn default() -> Self {
        Self {
            controller: DramControllerKind::default(),
            latency: defaults::DRAM_LATENCY,
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
            bus_width: defaults::DRAM_BUS_WIDTH,
        }
    }
}
