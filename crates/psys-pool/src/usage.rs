// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Serialisable usage reports.
//!
//! A [`PoolUsage`] is a read-only snapshot of how much of each resource is
//! held, suitable for logging, the CLI, or JSON export.

use crate::{Holder, ResourcePool};
use psys_catalog::{CellInstanceId, CellType};

/// Occupancy of a single cell slot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CellUsage {
    pub id: CellInstanceId,
    pub name: String,
    pub cell_type: CellType,
    pub holder: Option<Holder>,
}

/// Occupancy of a capacity-tracked resource.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ResourceUsage {
    pub name: String,
    pub used: u32,
    pub capacity: u32,
}

impl ResourceUsage {
    /// Fraction of the capacity in use, in `[0.0, 1.0]`.
    pub fn utilisation(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.used) / f64::from(self.capacity)
    }
}

/// Point-in-time occupancy of a whole pool.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PoolUsage {
    pub generation: String,
    pub cells: Vec<CellUsage>,
    pub memories: Vec<ResourceUsage>,
    pub channels: Vec<ResourceUsage>,
    pub ports: Vec<ResourceUsage>,
    pub active_bindings: usize,
}

impl PoolUsage {
    pub(crate) fn capture(pool: &ResourcePool) -> Self {
        let catalog = pool.catalog();

        let cells = catalog
            .cells()
            .map(|(id, c)| CellUsage {
                id,
                name: c.name.clone(),
                cell_type: c.cell_type,
                holder: pool.cell_holder(id),
            })
            .collect();

        let memories = catalog
            .memories()
            .filter_map(|(id, m)| {
                pool.memory_ledger(id).map(|l| ResourceUsage {
                    name: m.name.clone(),
                    used: l.reserved(),
                    capacity: l.capacity(),
                })
            })
            .collect();

        let channels = catalog
            .channels()
            .filter_map(|(kind, _)| {
                pool.channel_ledger(kind).map(|l| ResourceUsage {
                    name: kind.to_string(),
                    used: l.reserved(),
                    capacity: l.capacity(),
                })
            })
            .collect();

        let ports = catalog
            .ports()
            .filter_map(|(kind, _)| {
                pool.port_ledger(kind).map(|l| ResourceUsage {
                    name: kind.to_string(),
                    used: l.reserved(),
                    capacity: l.capacity(),
                })
            })
            .collect();

        Self {
            generation: catalog.generation().to_string(),
            cells,
            memories,
            channels,
            ports,
            active_bindings: pool.active_bindings().count(),
        }
    }

    /// Number of cells currently held.
    pub fn cells_held(&self) -> usize {
        self.cells.iter().filter(|c| c.holder.is_some()).count()
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        let used: u64 = self.memories.iter().map(|m| u64::from(m.used)).sum();
        let total: u64 = self.memories.iter().map(|m| u64::from(m.capacity)).sum();
        format!(
            "{}: {}/{} cells held, {used}/{total} memory units reserved, {} active bindings",
            self.generation,
            self.cells_held(),
            self.cells.len(),
            self.active_bindings,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{Holder, ResourcePool};
    use psys_catalog::{Catalog, CellType, ChannelKind, MemoryKind, PipelineId, StageId};
    use std::sync::Arc;

    #[test]
    fn test_usage_reflects_reservations() {
        let mut pool = ResourcePool::new(Arc::new(Catalog::load("ipu6ep").unwrap()));
        let h = Holder::new(PipelineId::new(1), StageId::new(0));
        let vp = pool.try_reserve_cell(CellType::VectorProcessor, h).unwrap();
        pool.try_reserve_memory(MemoryKind::Vmem, 0x200, vp, h).unwrap();
        pool.try_reserve_channel(ChannelKind::DmaInternal, 2, h).unwrap();

        let usage = pool.usage();
        assert_eq!(usage.generation, "ipu6ep");
        assert_eq!(usage.cells_held(), 1);
        let vmem0 = usage.memories.iter().find(|m| m.name == "vmem0").unwrap();
        assert_eq!((vmem0.used, vmem0.capacity), (0x200, 0x800));
        assert!((vmem0.utilisation() - 0.25).abs() < 1e-9);
        let dma = usage.channels.iter().find(|c| c.name == "dma_internal").unwrap();
        assert_eq!(dma.used, 2);
        assert!(usage.summary().contains("1/29 cells held"));
    }

    #[test]
    fn test_usage_serialises() {
        let pool = ResourcePool::new(Arc::new(Catalog::load("ipu6ep").unwrap()));
        let json = serde_json::to_string(&pool.usage()).unwrap();
        assert!(json.contains("\"generation\":\"ipu6ep\""));
        assert!(json.contains("\"holder\":null"));
    }
}
