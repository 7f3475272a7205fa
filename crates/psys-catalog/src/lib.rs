// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # psys-catalog
//!
//! The immutable capability catalog of the PSYS image-processing fabric:
//! what a chip generation physically offers, described once at start-up
//! and never edited afterwards.
//!
//! - [`CellInstanceId`], [`MemoryInstanceId`], [`PipelineId`], [`StageId`],
//!   [`BindingId`]: strongly-typed identifiers that cannot be mixed up.
//! - [`CellType`], [`MemoryKind`], [`ChannelKind`], [`PortKind`]: the
//!   resource kinds shared by every generation, plus [`ResourceKind`] to
//!   tag any of them.
//! - [`Catalog`]: cells, memory banks, the cell × memory-kind affinity
//!   matrix, and channel/port capacities. Built through [`CatalogBuilder`].
//! - [`Generation`]: built-in generation tables (`ipu6ep`).
//! - [`CatalogManifest`]: JSON description of an out-of-tree generation.
//!
//! # Example
//! ```
//! use psys_catalog::{Catalog, CellType, MemoryKind};
//!
//! let catalog = Catalog::load("ipu6ep").unwrap();
//! let vp0 = catalog.cells_of_type(CellType::VectorProcessor).next().unwrap();
//! let vmem = catalog.affinity(vp0, MemoryKind::Vmem).unwrap();
//! println!("{vp0} uses {} ({} units)", catalog.memory(vmem).unwrap().name,
//!          catalog.memory_capacity(vmem).unwrap());
//! ```

mod catalog;
mod error;
mod generation;
mod ids;
mod kinds;
mod manifest;

pub use catalog::{Catalog, CatalogBuilder, CellDescriptor, MemoryDescriptor};
pub use error::CatalogError;
pub use generation::Generation;
pub use ids::{BindingId, CellInstanceId, MemoryInstanceId, PipelineId, StageId};
pub use kinds::{CellType, ChannelKind, MemoryKind, PortKind, ResourceKind};
pub use manifest::{CatalogManifest, ManifestCell, ManifestMemory};
