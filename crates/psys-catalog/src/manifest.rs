// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON catalog manifests.
//!
//! A manifest describes a generation that is not compiled into the crate,
//! referring to cells and banks by name instead of by index.
//!
//! # Format
//! ```json
//! {
//!   "generation": "lab",
//!   "cells": [{ "name": "a0", "type": "acc_psa" }],
//!   "memories": [{ "name": "m", "kind": "vmem", "capacity": 100 }],
//!   "affinity": { "a0": { "vmem": "m" } },
//!   "channels": { "dma_ext0": 4 },
//!   "ports": { "bb_full": 2 }
//! }
//! ```

use crate::{Catalog, CatalogBuilder, CatalogError, CellType, ChannelKind, MemoryKind, PortKind};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Top-level catalog manifest.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CatalogManifest {
    /// Generation identifier.
    pub generation: String,
    /// Cell slots, in instance order.
    pub cells: Vec<ManifestCell>,
    /// Memory banks, in instance order.
    #[serde(default)]
    pub memories: Vec<ManifestMemory>,
    /// Cell name → memory kind → bank name. Omitted kinds are unreachable.
    #[serde(default)]
    pub affinity: BTreeMap<String, BTreeMap<MemoryKind, String>>,
    /// DMA channel capacities.
    #[serde(default)]
    pub channels: BTreeMap<ChannelKind, u32>,
    /// DFM port capacities.
    #[serde(default)]
    pub ports: BTreeMap<PortKind, u32>,
}

/// A cell slot entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ManifestCell {
    pub name: String,
    #[serde(rename = "type")]
    pub cell_type: CellType,
}

/// A memory bank entry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ManifestMemory {
    pub name: String,
    pub kind: MemoryKind,
    pub capacity: u32,
}

impl CatalogManifest {
    /// Loads a manifest from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialises the manifest to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Describes an existing catalog as a manifest.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mem_name = |id| {
            catalog
                .memory(id)
                .map(|m| m.name.clone())
                .unwrap_or_default()
        };

        let affinity = catalog
            .cells()
            .filter_map(|(id, cell)| {
                let row: BTreeMap<_, _> = catalog
                    .affinity_row(id)
                    .into_iter()
                    .filter_map(|(kind, mem)| mem.map(|m| (kind, mem_name(m))))
                    .collect();
                (!row.is_empty()).then(|| (cell.name.clone(), row))
            })
            .collect();

        Self {
            generation: catalog.generation().to_string(),
            cells: catalog
                .cells()
                .map(|(_, c)| ManifestCell {
                    name: c.name.clone(),
                    cell_type: c.cell_type,
                })
                .collect(),
            memories: catalog
                .memories()
                .map(|(_, m)| ManifestMemory {
                    name: m.name.clone(),
                    kind: m.kind,
                    capacity: m.capacity,
                })
                .collect(),
            affinity,
            channels: catalog.channels().collect(),
            ports: catalog.ports().collect(),
        }
    }

    /// Resolves names and builds a validated [`Catalog`].
    pub fn into_catalog(self) -> Result<Catalog, CatalogError> {
        let mut b = CatalogBuilder::new(self.generation.clone());

        let cells: HashMap<String, _> = self
            .cells
            .into_iter()
            .map(|c| {
                let id = b.cell(c.name.clone(), c.cell_type);
                (c.name, id)
            })
            .collect();

        let memories: HashMap<String, _> = self
            .memories
            .into_iter()
            .map(|m| {
                let id = b.memory(m.name.clone(), m.kind, m.capacity);
                (m.name, id)
            })
            .collect();

        for (cell_name, row) in &self.affinity {
            let cell = *cells.get(cell_name).ok_or_else(|| {
                CatalogError::invalid(
                    &self.generation,
                    format!("affinity names unknown cell '{cell_name}'"),
                )
            })?;
            for (&kind, mem_name) in row {
                let memory = *memories.get(mem_name).ok_or_else(|| {
                    CatalogError::invalid(
                        &self.generation,
                        format!("affinity of '{cell_name}' names unknown memory '{mem_name}'"),
                    )
                })?;
                b.affinity(cell, kind, memory);
            }
        }

        for (kind, capacity) in self.channels {
            b.channel(kind, capacity);
        }
        for (kind, capacity) in self.ports {
            b.port(kind, capacity);
        }

        // Duplicate names collapse in the lookup maps above; the builder
        // still sees every entry and rejects them.
        b.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellInstanceId, MemoryInstanceId};

    fn sample_json() -> &'static str {
        r#"{
            "generation": "lab",
            "cells": [
                { "name": "a0", "type": "acc_psa" },
                { "name": "a1", "type": "acc_psa" }
            ],
            "memories": [
                { "name": "m", "kind": "vmem", "capacity": 100 }
            ],
            "affinity": {
                "a0": { "vmem": "m" },
                "a1": { "vmem": "m" }
            },
            "channels": { "dma_ext0": 4 },
            "ports": { "bb_full": 2 }
        }"#
    }

    #[test]
    fn test_parse_and_build() {
        let catalog = CatalogManifest::from_json(sample_json())
            .unwrap()
            .into_catalog()
            .unwrap();
        assert_eq!(catalog.generation(), "lab");
        assert_eq!(catalog.num_cells(), 2);
        assert_eq!(
            catalog.affinity(CellInstanceId::new(1), MemoryKind::Vmem),
            Some(MemoryInstanceId::new(0)),
        );
        assert_eq!(catalog.channel_capacity(ChannelKind::DmaExt0), Some(4));
        assert_eq!(catalog.port_capacity(PortKind::BbFull), Some(2));
    }

    #[test]
    fn test_optional_sections_default_to_empty() {
        let json = r#"{ "generation": "bare", "cells": [{ "name": "sp", "type": "sp_control" }] }"#;
        let catalog = CatalogManifest::from_json(json).unwrap().into_catalog().unwrap();
        assert_eq!(catalog.num_memories(), 0);
        assert_eq!(catalog.channels().count(), 0);
    }

    #[test]
    fn test_unknown_names_rejected() {
        let mut manifest = CatalogManifest::from_json(sample_json()).unwrap();
        manifest
            .affinity
            .insert("ghost".into(), BTreeMap::from([(MemoryKind::Vmem, "m".to_string())]));
        let err = manifest.into_catalog().unwrap_err().to_string();
        assert!(err.contains("ghost"), "{err}");

        let mut manifest = CatalogManifest::from_json(sample_json()).unwrap();
        manifest
            .affinity
            .insert("a0".into(), BTreeMap::from([(MemoryKind::Vmem, "nowhere".to_string())]));
        assert!(manifest.into_catalog().is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut manifest = CatalogManifest::from_json(sample_json()).unwrap();
        manifest.cells.push(ManifestCell {
            name: "a0".into(),
            cell_type: CellType::AccIsa,
        });
        assert!(manifest.into_catalog().is_err());
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let json = r#"{ "generation": "x", "cells": [{ "name": "a", "type": "quantum" }] }"#;
        assert!(matches!(
            CatalogManifest::from_json(json),
            Err(CatalogError::ManifestParse(_))
        ));
    }

    #[test]
    fn test_builtin_catalog_survives_manifest_export() {
        let original = Catalog::load("ipu6ep").unwrap();
        let json = CatalogManifest::from_catalog(&original).to_json().unwrap();
        let rebuilt = CatalogManifest::from_json(&json).unwrap().into_catalog().unwrap();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("psys_catalog_test_missing.json");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            CatalogManifest::from_file(&path),
            Err(CatalogError::ManifestRead(_))
        ));
    }
}
