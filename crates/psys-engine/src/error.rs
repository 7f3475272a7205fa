// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the allocation engine.

use psys_catalog::{
    BindingId, CatalogError, CellType, ChannelKind, MemoryInstanceId, MemoryKind, PortKind,
    ResourceKind, StageId,
};
use psys_pool::PoolError;

/// Errors returned by the allocator.
///
/// The four shortage variants are recoverable: the pool is unchanged and
/// the same request may succeed once other pipelines release resources.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    /// No cell of the stage's type is free (or the generation has none).
    #[error("{stage}: no free {cell_type} cell ({total} in catalog)")]
    NoFreeCell {
        stage: StageId,
        cell_type: CellType,
        total: usize,
    },

    /// The memory bank reachable from the stage's cell is too full, or
    /// the cell reaches no bank of this kind (`instance` is `None`).
    #[error("{stage}: insufficient {kind} memory: requested {requested}, available {available}")]
    InsufficientMemory {
        stage: StageId,
        kind: MemoryKind,
        requested: u32,
        available: u32,
        instance: Option<MemoryInstanceId>,
    },

    /// A DMA channel kind has too few concurrent transfers left.
    #[error("{stage}: insufficient {kind} channel capacity: requested {requested}, available {available}")]
    InsufficientChannel {
        stage: StageId,
        kind: ChannelKind,
        requested: u32,
        available: u32,
    },

    /// A DFM port kind has too few reservations left.
    #[error("{stage}: insufficient {kind} port capacity: requested {requested}, available {available}")]
    InsufficientPort {
        stage: StageId,
        kind: PortKind,
        requested: u32,
        available: u32,
    },

    /// The binding was already released.
    #[error("{0} was already released")]
    DoubleRelease(BindingId),

    /// The pipeline request is malformed.
    #[error("invalid pipeline request: {0}")]
    InvalidRequest(String),

    /// The capability catalog could not be loaded.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// An internal pool inconsistency was detected.
    #[error("pool integrity error: {0}")]
    PoolCorruption(String),

    /// A thread panicked while holding the pool lock.
    #[error("resource pool lock poisoned")]
    LockPoisoned,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A binding or report could not be serialised.
    #[error("serialisation error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AllocationError {
    /// Tags a pool failure with the stage that caused it.
    pub(crate) fn at_stage(stage: StageId, err: PoolError) -> Self {
        match err {
            PoolError::NoFreeCell { cell_type, total } => Self::NoFreeCell {
                stage,
                cell_type,
                total,
            },
            PoolError::InsufficientMemory {
                kind,
                requested,
                available,
                instance,
            } => Self::InsufficientMemory {
                stage,
                kind,
                requested,
                available,
                instance,
            },
            PoolError::InsufficientChannel {
                kind,
                requested,
                available,
            } => Self::InsufficientChannel {
                stage,
                kind,
                requested,
                available,
            },
            PoolError::InsufficientPort {
                kind,
                requested,
                available,
            } => Self::InsufficientPort {
                stage,
                kind,
                requested,
                available,
            },
            PoolError::ZeroSizedReservation(kind) => {
                Self::InvalidRequest(format!("{stage} requests zero units of {kind}"))
            }
            other => Self::from(other),
        }
    }

    /// Returns `true` for shortages that may clear once resources are released.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoFreeCell { .. }
                | Self::InsufficientMemory { .. }
                | Self::InsufficientChannel { .. }
                | Self::InsufficientPort { .. }
        )
    }

    /// Returns the stage a shortage refers to.
    pub fn stage(&self) -> Option<StageId> {
        match self {
            Self::NoFreeCell { stage, .. }
            | Self::InsufficientMemory { stage, .. }
            | Self::InsufficientChannel { stage, .. }
            | Self::InsufficientPort { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Returns the resource kind a shortage refers to.
    pub fn resource_kind(&self) -> Option<ResourceKind> {
        match self {
            Self::NoFreeCell { cell_type, .. } => Some(ResourceKind::Cell(*cell_type)),
            Self::InsufficientMemory { kind, .. } => Some(ResourceKind::Memory(*kind)),
            Self::InsufficientChannel { kind, .. } => Some(ResourceKind::Channel(*kind)),
            Self::InsufficientPort { kind, .. } => Some(ResourceKind::Port(*kind)),
            _ => None,
        }
    }
}

impl From<PoolError> for AllocationError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::DoubleRelease(id) => Self::DoubleRelease(id),
            other => Self::PoolCorruption(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_stage_tags_shortages() {
        let err = AllocationError::at_stage(
            StageId::new(2),
            PoolError::InsufficientMemory {
                kind: MemoryKind::Vmem,
                requested: 50,
                available: 40,
                instance: None,
            },
        );
        assert_eq!(err.stage(), Some(StageId::new(2)));
        assert_eq!(err.resource_kind(), Some(ResourceKind::Memory(MemoryKind::Vmem)));
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "stage#2: insufficient vmem memory: requested 50, available 40"
        );
    }

    #[test]
    fn test_at_stage_keeps_memory_instance() {
        let full = AllocationError::at_stage(
            StageId::new(1),
            PoolError::InsufficientMemory {
                kind: MemoryKind::Dmem,
                requested: 8,
                available: 0,
                instance: Some(MemoryInstanceId::new(6)),
            },
        );
        assert!(matches!(
            full,
            AllocationError::InsufficientMemory { instance: Some(m), .. } if m == MemoryInstanceId::new(6)
        ));

        let unreachable = AllocationError::at_stage(
            StageId::new(1),
            PoolError::InsufficientMemory {
                kind: MemoryKind::Pmem,
                requested: 8,
                available: 0,
                instance: None,
            },
        );
        assert!(matches!(
            unreachable,
            AllocationError::InsufficientMemory { instance: None, .. }
        ));
    }

    #[test]
    fn test_zero_sized_becomes_invalid_request() {
        let err = AllocationError::at_stage(
            StageId::new(0),
            PoolError::ZeroSizedReservation(ResourceKind::Port(PortKind::LbFull)),
        );
        assert!(matches!(err, AllocationError::InvalidRequest(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_serde_errors_are_not_request_errors() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = AllocationError::from(json_err);
        assert!(matches!(err, AllocationError::Serialize(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_pool_errors_convert() {
        let id = BindingId::new(4);
        assert!(matches!(
            AllocationError::from(PoolError::DoubleRelease(id)),
            AllocationError::DoubleRelease(b) if b == id
        ));
        assert!(matches!(
            AllocationError::from(PoolError::PoolCorruption("x".into())),
            AllocationError::PoolCorruption(_)
        ));
    }
}
