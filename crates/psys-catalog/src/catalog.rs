// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The immutable capability catalog.
//!
//! A [`Catalog`] describes exactly what one chip generation offers: which
//! cell type sits in each physical slot, which memory banks exist and how
//! large they are, which bank (if any) each cell reaches for every memory
//! kind, and how many concurrent DMA channels and DFM ports of each kind
//! the fabric supports.
//!
//! Catalogs are only ever produced through [`CatalogBuilder::build`], which
//! validates the description. There are no mutating methods; share one
//! behind an `Arc` for the lifetime of the process.

use crate::{
    CatalogError, CellInstanceId, CellType, ChannelKind, Generation, MemoryInstanceId,
    MemoryKind, PortKind,
};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A physical cell slot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CellDescriptor {
    /// Firmware name of the slot (e.g., `"vp0"`).
    pub name: String,
    /// The type of cell occupying the slot.
    pub cell_type: CellType,
}

/// A concrete memory bank.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MemoryDescriptor {
    /// Firmware name of the bank (e.g., `"dmem0"`).
    pub name: String,
    /// The memory kind this bank provides.
    pub kind: MemoryKind,
    /// Total capacity in allocation units.
    pub capacity: u32,
}

/// Immutable, per-generation description of the fabric inventory.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Catalog {
    generation: String,
    cells: Vec<CellDescriptor>,
    memories: Vec<MemoryDescriptor>,
    /// One row per cell; a missing kind means the cell cannot reach it.
    affinity: Vec<BTreeMap<MemoryKind, MemoryInstanceId>>,
    channels: BTreeMap<ChannelKind, u32>,
    ports: BTreeMap<PortKind, u32>,
}

impl Catalog {
    /// Loads the built-in catalog for a chip generation.
    ///
    /// Returns [`CatalogError::UnknownGeneration`] if the id is not recognised.
    ///
    /// # Example
    /// ```
    /// use psys_catalog::{Catalog, CellType};
    ///
    /// let catalog = Catalog::load("ipu6ep").unwrap();
    /// assert_eq!(catalog.count_cells(CellType::VectorProcessor), 1);
    /// assert!(Catalog::load("ipu9000").is_err());
    /// ```
    pub fn load(generation_id: &str) -> Result<Self, CatalogError> {
        let generation = Generation::from_id(generation_id)?;
        let catalog = generation.catalog()?;
        tracing::info!("catalog loaded: {}", catalog.summary());
        Ok(catalog)
    }

    /// Returns the generation identifier.
    pub fn generation(&self) -> &str {
        &self.generation
    }

    // ── Cells ──────────────────────────────────────────────────────

    /// Returns the number of physical cell slots.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Returns the descriptor of a cell slot.
    pub fn cell(&self, id: CellInstanceId) -> Option<&CellDescriptor> {
        self.cells.get(id.index())
    }

    /// Returns the type of the cell in a slot.
    pub fn cell_type(&self, id: CellInstanceId) -> Option<CellType> {
        self.cell(id).map(|c| c.cell_type)
    }

    /// Iterates all cells in ascending instance order.
    pub fn cells(&self) -> impl Iterator<Item = (CellInstanceId, &CellDescriptor)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| (CellInstanceId::new(i as u16), c))
    }

    /// Iterates the cells of one type in ascending instance order.
    pub fn cells_of_type(&self, cell_type: CellType) -> impl Iterator<Item = CellInstanceId> + '_ {
        self.cells()
            .filter(move |(_, c)| c.cell_type == cell_type)
            .map(|(id, _)| id)
    }

    /// Returns how many cells of a type the generation has.
    pub fn count_cells(&self, cell_type: CellType) -> usize {
        self.cells_of_type(cell_type).count()
    }

    /// Looks a cell up by firmware name.
    pub fn cell_by_name(&self, name: &str) -> Option<CellInstanceId> {
        self.cells().find(|(_, c)| c.name == name).map(|(id, _)| id)
    }

    // ── Memories ───────────────────────────────────────────────────

    /// Returns the number of memory banks.
    pub fn num_memories(&self) -> usize {
        self.memories.len()
    }

    /// Returns the descriptor of a memory bank.
    pub fn memory(&self, id: MemoryInstanceId) -> Option<&MemoryDescriptor> {
        self.memories.get(id.index())
    }

    /// Returns the capacity of a memory bank.
    pub fn memory_capacity(&self, id: MemoryInstanceId) -> Option<u32> {
        self.memory(id).map(|m| m.capacity)
    }

    /// Iterates all memory banks in ascending instance order.
    pub fn memories(&self) -> impl Iterator<Item = (MemoryInstanceId, &MemoryDescriptor)> + '_ {
        self.memories
            .iter()
            .enumerate()
            .map(|(i, m)| (MemoryInstanceId::new(i as u16), m))
    }

    /// Iterates the banks of one kind in ascending instance order.
    pub fn memories_of_kind(&self, kind: MemoryKind) -> impl Iterator<Item = MemoryInstanceId> + '_ {
        self.memories()
            .filter(move |(_, m)| m.kind == kind)
            .map(|(id, _)| id)
    }

    /// Returns the bank a cell uses for a memory kind, or `None` if the
    /// cell cannot reach that kind at all.
    pub fn affinity(&self, cell: CellInstanceId, kind: MemoryKind) -> Option<MemoryInstanceId> {
        self.affinity.get(cell.index())?.get(&kind).copied()
    }

    /// Returns the full affinity row of a cell, one entry per memory kind.
    pub fn affinity_row(&self, cell: CellInstanceId) -> Vec<(MemoryKind, Option<MemoryInstanceId>)> {
        MemoryKind::ALL
            .iter()
            .map(|&kind| (kind, self.affinity(cell, kind)))
            .collect()
    }

    // ── Channels and ports ─────────────────────────────────────────

    /// Returns the capacity of a DMA channel kind, if the generation has it.
    pub fn channel_capacity(&self, kind: ChannelKind) -> Option<u32> {
        self.channels.get(&kind).copied()
    }

    /// Returns the capacity of a DFM port kind, if the generation has it.
    pub fn port_capacity(&self, kind: PortKind) -> Option<u32> {
        self.ports.get(&kind).copied()
    }

    /// Iterates channel kinds and their capacities.
    pub fn channels(&self) -> impl Iterator<Item = (ChannelKind, u32)> + '_ {
        self.channels.iter().map(|(&k, &c)| (k, c))
    }

    /// Iterates port kinds and their capacities.
    pub fn ports(&self) -> impl Iterator<Item = (PortKind, u32)> + '_ {
        self.ports.iter().map(|(&k, &c)| (k, c))
    }

    /// Returns a one-line human-readable summary.
    pub fn summary(&self) -> String {
        let by_type: Vec<String> = CellType::ALL
            .iter()
            .filter_map(|&t| {
                let n = self.count_cells(t);
                (n > 0).then(|| format!("{n}×{t}"))
            })
            .collect();
        format!(
            "{}: {} cells ({}), {} memory banks, {} channel kinds, {} port kinds",
            self.generation,
            self.num_cells(),
            by_type.join(", "),
            self.num_memories(),
            self.channels.len(),
            self.ports.len(),
        )
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

// ── Builder ────────────────────────────────────────────────────────

/// Assembles and validates a [`Catalog`].
///
/// # Example
/// ```
/// use psys_catalog::{CatalogBuilder, CellType, MemoryKind};
///
/// let mut b = CatalogBuilder::new("lab");
/// let a0 = b.cell("a0", CellType::AccPsa);
/// let m = b.memory("m", MemoryKind::Vmem, 100);
/// b.affinity(a0, MemoryKind::Vmem, m);
/// let catalog = b.build().unwrap();
/// assert_eq!(catalog.affinity(a0, MemoryKind::Vmem), Some(m));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    generation: String,
    cells: Vec<CellDescriptor>,
    memories: Vec<MemoryDescriptor>,
    affinity: Vec<(CellInstanceId, MemoryKind, MemoryInstanceId)>,
    channels: Vec<(ChannelKind, u32)>,
    ports: Vec<(PortKind, u32)>,
}

impl CatalogBuilder {
    /// Starts an empty catalog for the named generation.
    pub fn new(generation: impl Into<String>) -> Self {
        Self {
            generation: generation.into(),
            ..Default::default()
        }
    }

    /// Appends a cell slot and returns its instance id.
    pub fn cell(&mut self, name: impl Into<String>, cell_type: CellType) -> CellInstanceId {
        let id = CellInstanceId::new(self.cells.len() as u16);
        self.cells.push(CellDescriptor {
            name: name.into(),
            cell_type,
        });
        id
    }

    /// Appends a memory bank and returns its instance id.
    pub fn memory(
        &mut self,
        name: impl Into<String>,
        kind: MemoryKind,
        capacity: u32,
    ) -> MemoryInstanceId {
        let id = MemoryInstanceId::new(self.memories.len() as u16);
        self.memories.push(MemoryDescriptor {
            name: name.into(),
            kind,
            capacity,
        });
        id
    }

    /// Declares that `cell` reaches `memory` for memory kind `kind`.
    pub fn affinity(
        &mut self,
        cell: CellInstanceId,
        kind: MemoryKind,
        memory: MemoryInstanceId,
    ) -> &mut Self {
        self.affinity.push((cell, kind, memory));
        self
    }

    /// Declares a DMA channel kind and its capacity.
    pub fn channel(&mut self, kind: ChannelKind, capacity: u32) -> &mut Self {
        self.channels.push((kind, capacity));
        self
    }

    /// Declares a DFM port kind and its capacity.
    pub fn port(&mut self, kind: PortKind, capacity: u32) -> &mut Self {
        self.ports.push((kind, capacity));
        self
    }

    /// Validates the description and produces the catalog.
    ///
    /// # Checks
    /// - At least one cell, and no more slots than the id type can address.
    /// - Cell names and memory names are unique.
    /// - Every capacity is positive.
    /// - Every affinity entry names an existing cell and bank, the bank is of
    ///   the declared kind, and no `(cell, kind)` pair is declared twice.
    /// - Each channel and port kind is declared at most once.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let generation = self.generation;
        let invalid = |detail: String| CatalogError::invalid(&generation, detail);

        if self.cells.is_empty() {
            return Err(invalid("catalog contains no cells".into()));
        }
        if self.cells.len() > usize::from(u16::MAX) || self.memories.len() > usize::from(u16::MAX) {
            return Err(invalid("too many resource instances".into()));
        }

        let mut seen = HashSet::new();
        for cell in &self.cells {
            if !seen.insert(cell.name.as_str()) {
                return Err(invalid(format!("duplicate cell name '{}'", cell.name)));
            }
        }

        let mut seen = HashSet::new();
        for mem in &self.memories {
            if !seen.insert(mem.name.as_str()) {
                return Err(invalid(format!("duplicate memory name '{}'", mem.name)));
            }
            if mem.capacity == 0 {
                return Err(invalid(format!("memory '{}' has zero capacity", mem.name)));
            }
        }

        let mut affinity = vec![BTreeMap::new(); self.cells.len()];
        for (cell, kind, memory) in self.affinity {
            let row = affinity
                .get_mut(cell.index())
                .ok_or_else(|| invalid(format!("affinity names unknown {cell}")))?;
            let target = self
                .memories
                .get(memory.index())
                .ok_or_else(|| invalid(format!("affinity of {cell} names unknown {memory}")))?;
            if target.kind != kind {
                return Err(invalid(format!(
                    "affinity of {cell} maps {kind} to '{}', which is {}",
                    target.name, target.kind,
                )));
            }
            if row.insert(kind, memory).is_some() {
                return Err(invalid(format!("affinity of {cell} declares {kind} twice")));
            }
        }

        let mut channels = BTreeMap::new();
        for (kind, capacity) in self.channels {
            if capacity == 0 {
                return Err(invalid(format!("channel {kind} has zero capacity")));
            }
            if channels.insert(kind, capacity).is_some() {
                return Err(invalid(format!("channel {kind} declared twice")));
            }
        }

        let mut ports = BTreeMap::new();
        for (kind, capacity) in self.ports {
            if capacity == 0 {
                return Err(invalid(format!("port {kind} has zero capacity")));
            }
            if ports.insert(kind, capacity).is_some() {
                return Err(invalid(format!("port {kind} declared twice")));
            }
        }

        tracing::debug!(
            "catalog '{}' built: {} cells, {} memories",
            generation,
            self.cells.len(),
            self.memories.len(),
        );

        Ok(Catalog {
            generation,
            cells: self.cells,
            memories: self.memories,
            affinity,
            channels,
            ports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two type-A cells sharing one 100-unit vector memory, no type-B cells.
    fn two_cell_catalog() -> Catalog {
        let mut b = CatalogBuilder::new("test");
        let c0 = b.cell("a0", CellType::AccPsa);
        let c1 = b.cell("a1", CellType::AccPsa);
        let m = b.memory("m", MemoryKind::Vmem, 100);
        b.affinity(c0, MemoryKind::Vmem, m)
            .affinity(c1, MemoryKind::Vmem, m)
            .channel(ChannelKind::DmaExt0, 4)
            .port(PortKind::BbFull, 2);
        b.build().unwrap()
    }

    #[test]
    fn test_accessors() {
        let c = two_cell_catalog();
        assert_eq!(c.generation(), "test");
        assert_eq!(c.num_cells(), 2);
        assert_eq!(c.cell_type(CellInstanceId::new(1)), Some(CellType::AccPsa));
        assert_eq!(c.cell_type(CellInstanceId::new(2)), None);
        assert_eq!(c.count_cells(CellType::AccOsa), 0);
        assert_eq!(c.memory_capacity(MemoryInstanceId::new(0)), Some(100));
        assert_eq!(c.channel_capacity(ChannelKind::DmaExt0), Some(4));
        assert_eq!(c.channel_capacity(ChannelKind::DmaIsa), None);
        assert_eq!(c.port_capacity(PortKind::BbFull), Some(2));
        assert_eq!(c.cell_by_name("a1"), Some(CellInstanceId::new(1)));
    }

    #[test]
    fn test_cells_of_type_ascending() {
        let c = two_cell_catalog();
        let ids: Vec<_> = c.cells_of_type(CellType::AccPsa).collect();
        assert_eq!(ids, vec![CellInstanceId::new(0), CellInstanceId::new(1)]);
    }

    #[test]
    fn test_affinity_absent_is_none() {
        let c = two_cell_catalog();
        let cell = CellInstanceId::new(0);
        assert_eq!(c.affinity(cell, MemoryKind::Vmem), Some(MemoryInstanceId::new(0)));
        assert_eq!(c.affinity(cell, MemoryKind::Dmem), None);
        assert_eq!(c.affinity(CellInstanceId::new(9), MemoryKind::Vmem), None);

        let row = c.affinity_row(cell);
        assert_eq!(row.len(), MemoryKind::COUNT);
        assert_eq!(row.iter().filter(|(_, m)| m.is_some()).count(), 1);
    }

    #[test]
    fn test_rejects_empty() {
        let err = CatalogBuilder::new("empty").build().unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCatalog { .. }));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let mut b = CatalogBuilder::new("bad");
        b.cell("a0", CellType::AccPsa);
        b.memory("m", MemoryKind::Vmem, 0);
        assert!(b.build().is_err());

        let mut b = CatalogBuilder::new("bad");
        b.cell("a0", CellType::AccPsa);
        b.port(PortKind::LbFull, 0);
        assert!(b.build().is_err());
    }

    #[test]
    fn test_rejects_kind_mismatch_in_affinity() {
        let mut b = CatalogBuilder::new("bad");
        let c = b.cell("a0", CellType::AccPsa);
        let m = b.memory("dmem0", MemoryKind::Dmem, 64);
        b.affinity(c, MemoryKind::Vmem, m);
        let err = b.build().unwrap_err().to_string();
        assert!(err.contains("dmem0"), "{err}");
    }

    #[test]
    fn test_rejects_unknown_affinity_targets() {
        let mut b = CatalogBuilder::new("bad");
        let c = b.cell("a0", CellType::AccPsa);
        b.affinity(c, MemoryKind::Vmem, MemoryInstanceId::new(3));
        assert!(b.build().is_err());

        let mut b = CatalogBuilder::new("bad");
        b.cell("a0", CellType::AccPsa);
        let m = b.memory("m", MemoryKind::Vmem, 8);
        b.affinity(CellInstanceId::new(5), MemoryKind::Vmem, m);
        assert!(b.build().is_err());
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut b = CatalogBuilder::new("bad");
        b.cell("a0", CellType::AccPsa);
        b.cell("a0", CellType::AccIsa);
        assert!(b.build().is_err());

        let mut b = CatalogBuilder::new("bad");
        b.cell("a0", CellType::AccPsa);
        b.channel(ChannelKind::DmaExt0, 1).channel(ChannelKind::DmaExt0, 2);
        assert!(b.build().is_err());

        let mut b = CatalogBuilder::new("bad");
        let c = b.cell("a0", CellType::AccPsa);
        let m = b.memory("m", MemoryKind::Vmem, 8);
        b.affinity(c, MemoryKind::Vmem, m).affinity(c, MemoryKind::Vmem, m);
        assert!(b.build().is_err());
    }

    #[test]
    fn test_summary() {
        let s = two_cell_catalog().summary();
        assert!(s.starts_with("test: 2 cells"), "{s}");
        assert!(s.contains("2×acc_psa"));
        assert!(s.contains("1 memory banks"));
    }
}
