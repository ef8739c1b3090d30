//! Simulation harness and input loading.
//!
//! Provides the [`Simulator`] that clocks every component in order, and utilities for
//! loading configurations and instruction streams from JSON.

pub mod loader;

pub mod simulator;

pub use self::simulator::{RunStatus, Simulator};
