//! Memory Access and Buffer Identity Types.
//!
//! This module defines the closed identities used to address datapath components:
//! 1. **Access Direction:** Reads and writes, for SRAM accesses and DRAM requests.
//! 2. **Buffer Identity:** The three on-chip buffers (NBin, NBout, SB).
//! 3. **Buffer Maps:** A fixed mapping from buffer identity to a component instance,
//!    so no component is ever looked up by a raw integer index.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::Deserialize;

/// Direction of a memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Data read access.
    Read,
    /// Data write access.
    Write,
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// On-chip buffer identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum BufferKind {
    /// Input neuron buffer (NBin).
    #[serde(alias = "nbin", alias = "NBin")]
    Input,
    /// Output neuron buffer (NBout).
    #[serde(alias = "nbout", alias = "NBout")]
    Output,
    /// Synapse (weight) buffer (SB).
    #[serde(alias = "sb", alias = "SB")]
    Weight,
}

impl BufferKind {
    /// All buffers, in map order.
    pub const ALL: [Self; 3] = [Self::Input, Self::Output, Self::Weight];

    /// Short hardware name of the buffer.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Input => "NBin",
            Self::Output => "NBout",
            Self::Weight => "SB",
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Self::Input => 0,
            Self::Output => 1,
            Self::Weight => 2,
        }
    }
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per on-chip buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferMap<T>([T; 3]);

impl<T> BufferMap<T> {
    /// Builds a map by evaluating `f` for every buffer in [`BufferKind::ALL`] order.
    pub fn from_fn(f: impl FnMut(BufferKind) -> T) -> Self {
        Self(BufferKind::ALL.map(f))
    }

    /// Iterates over `(buffer, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (BufferKind, &T)> {
        BufferKind::ALL.into_iter().zip(self.0.iter())
    }

    /// Iterates mutably over `(buffer, value)` pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BufferKind, &mut T)> {
        BufferKind::ALL.into_iter().zip(self.0.iter_mut())
    }
}

impl<T> Index<BufferKind> for BufferMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, kind: BufferKind) -> &T {
        &self.0[kind.index()]
    }
}

impl<T> IndexMut<BufferKind> for BufferMap<T> {
    #[inline]
    fn index_mut(&mut self, kind: BufferKind) -> &mut T {
        &mut self.0[kind.index()]
    }
}
