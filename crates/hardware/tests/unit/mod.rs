//! # Unit Components
//!
//! This module serves as the central hub for the per-component tests of the
//! accelerator, from pipeline registers up to the full simulator harness.
