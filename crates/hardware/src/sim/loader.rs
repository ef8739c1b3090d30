//! Configuration and program loading.
//!
//! This module reads simulator inputs from disk. It provides:
//! 1. **Configuration:** A JSON [`Config`], validated before use.
//! 2. **Programs:** A JSON instruction stream, either a bare array or an object with an
//!    `instructions` array.
//! 3. **Built-in program:** The full SB + NBin load used as a smoke test.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::common::SimResult;
use crate::config::Config;
use crate::core::control::Instruction;

/// DRAM address of the NBin data in the built-in program.
pub const DEMO_NBIN_ADDRESS: u64 = 4_194_304;
/// Bytes of NBin data in the built-in program.
pub const DEMO_NBIN_SIZE: u64 = 2048;
/// Bytes of SB data in the built-in program.
pub const DEMO_SB_SIZE: u64 = 32_768;

#[derive(Deserialize)]
#[serde(untagged)]
enum ProgramFile {
    Bare(Vec<Instruction>),
    Wrapped { instructions: Vec<Instruction> },
}

/// Reads and validates a configuration file.
///
/// # Errors
///
/// Returns [`SimError::Io`](crate::common::SimError::Io) if the file cannot be read, and
/// the errors of [`Config::from_json`] otherwise.
pub fn load_config(path: &Path) -> SimResult<Config> {
    let text = fs::read_to_string(path)?;
    let config = Config::from_json(&text)?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Parses an instruction stream.
///
/// # Errors
///
/// Returns [`SimError::ConfigParse`](crate::common::SimError::ConfigParse) for malformed JSON.
pub fn parse_program(json: &str) -> SimResult<Vec<Instruction>> {
    let program = match serde_json::from_str(json)? {
        ProgramFile::Bare(list) => list,
        ProgramFile::Wrapped { instructions } => instructions,
    };
    Ok(program)
}

/// Reads an instruction stream from disk.
///
/// # Errors
///
/// Returns [`SimError::Io`](crate::common::SimError::Io) if the file cannot be read, and
/// the errors of [`parse_program`] otherwise.
pub fn load_program(path: &Path) -> SimResult<Vec<Instruction>> {
    let program = parse_program(&fs::read_to_string(path)?)?;
    debug!(path = %path.display(), instructions = program.len(), "program loaded");
    Ok(program)
}

/// Single instruction filling SB and NBin from DRAM.
pub fn demo_program() -> Vec<Instruction> {
    vec![Instruction {
        nbin_address: DEMO_NBIN_ADDRESS,
        nbin_size: DEMO_NBIN_SIZE,
        load_weights: true,
        sb_address: 0,
        sb_size: DEMO_SB_SIZE,
        ..Instruction::default()
    }]
}
