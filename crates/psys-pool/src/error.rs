// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for pool reservations and releases.

use psys_catalog::{
    BindingId, CellInstanceId, CellType, ChannelKind, MemoryInstanceId, MemoryKind, PortKind,
    ResourceKind,
};

/// Errors that can occur while reserving or releasing pool resources.
///
/// A reservation call that returns an error has not touched the pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Every cell of the requested type is held, or the generation has none.
    #[error("no free {cell_type} cell ({total} in catalog)")]
    NoFreeCell { cell_type: CellType, total: usize },

    /// The bank the cell reaches for this kind cannot fit the request.
    /// `instance` is `None` when the cell cannot reach the kind at all.
    #[error("insufficient {kind} memory: requested {requested}, available {available}")]
    InsufficientMemory {
        kind: MemoryKind,
        requested: u32,
        available: u32,
        instance: Option<MemoryInstanceId>,
    },

    /// Not enough concurrent transfers left on a DMA channel kind.
    #[error("insufficient {kind} channel capacity: requested {requested}, available {available}")]
    InsufficientChannel {
        kind: ChannelKind,
        requested: u32,
        available: u32,
    },

    /// Not enough reservations left on a DFM port kind.
    #[error("insufficient {kind} port capacity: requested {requested}, available {available}")]
    InsufficientPort {
        kind: PortKind,
        requested: u32,
        available: u32,
    },

    /// A reservation asked for zero units.
    #[error("cannot reserve zero units of {0}")]
    ZeroSizedReservation(ResourceKind),

    /// The binding is not active; it was already released.
    #[error("{0} is not active (double release)")]
    DoubleRelease(BindingId),

    /// The cell id does not exist in the catalog.
    #[error("{0} is not in the catalog")]
    UnknownCell(CellInstanceId),

    /// An internal ledger inconsistency was detected.
    #[error("pool integrity error: {0}")]
    PoolCorruption(String),
}

impl PoolError {
    /// Returns the resource kind a shortage refers to, if any.
    pub fn resource_kind(&self) -> Option<ResourceKind> {
        match self {
            Self::NoFreeCell { cell_type, .. } => Some(ResourceKind::Cell(*cell_type)),
            Self::InsufficientMemory { kind, .. } => Some(ResourceKind::Memory(*kind)),
            Self::InsufficientChannel { kind, .. } => Some(ResourceKind::Channel(*kind)),
            Self::InsufficientPort { kind, .. } => Some(ResourceKind::Port(*kind)),
            Self::ZeroSizedReservation(kind) => Some(*kind),
            _ => None,
        }
    }
}
