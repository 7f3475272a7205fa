// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Built-in chip generations.
//!
//! Each generation is a static table compiled into the crate. Tables are
//! expressed with typed kinds and named rows rather than positional integer
//! arrays; [`Generation::catalog`] turns one into a validated [`Catalog`].

mod ipu6ep;

use crate::{Catalog, CatalogBuilder, CatalogError, CellType, ChannelKind, MemoryKind, PortKind};

/// A known chip generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    /// IPU6 "EP" processing system.
    Ipu6Ep,
}

impl Generation {
    /// Every built-in generation.
    pub const ALL: &'static [Generation] = &[Generation::Ipu6Ep];

    /// Returns the identifier used in configuration files.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Ipu6Ep => "ipu6ep",
        }
    }

    /// Resolves a generation identifier (case-insensitive).
    pub fn from_id(id: &str) -> Result<Self, CatalogError> {
        let needle = id.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|g| g.id() == needle)
            .ok_or_else(|| CatalogError::UnknownGeneration(id.to_string()))
    }

    /// Builds the catalog for this generation.
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        match self {
            Self::Ipu6Ep => build(self.id(), &ipu6ep::TABLE),
        }
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

// ── Static table shape ─────────────────────────────────────────────

/// Affinity row: for each memory kind column, the index of the bank in
/// [`GenerationTable::memories`] the cell reaches, if any.
type AffinityRow = [Option<usize>; MemoryKind::COUNT];

struct GenerationTable {
    cells: &'static [(&'static str, CellType, AffinityRow)],
    memories: &'static [(&'static str, MemoryKind, u32)],
    channels: &'static [(ChannelKind, u32)],
    ports: &'static [(PortKind, u32)],
}

fn build(id: &str, table: &GenerationTable) -> Result<Catalog, CatalogError> {
    let mut b = CatalogBuilder::new(id);

    let memories: Vec<_> = table
        .memories
        .iter()
        .map(|&(name, kind, capacity)| b.memory(name, kind, capacity))
        .collect();

    for &(name, cell_type, ref row) in table.cells {
        let cell = b.cell(name, cell_type);
        for (&kind, slot) in MemoryKind::ALL.iter().zip(row.iter()) {
            if let Some(index) = *slot {
                let memory = *memories.get(index).ok_or_else(|| {
                    CatalogError::invalid(id, format!("cell '{name}' names memory index {index}"))
                })?;
                b.affinity(cell, kind, memory);
            }
        }
    }

    for &(kind, capacity) in table.channels {
        b.channel(kind, capacity);
    }
    for &(kind, capacity) in table.ports {
        b.port(kind, capacity);
    }

    b.build()
}
