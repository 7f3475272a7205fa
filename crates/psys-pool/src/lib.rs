// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # psys-pool
//!
//! Run-time reservation state for every resource instance of a PSYS
//! [`Catalog`](psys_catalog::Catalog).
//!
//! # Key Components
//!
//! - [`ResourcePool`]: free/held state for cells, capacity ledgers for
//!   memory banks, DMA channels and DFM ports, and the registry of active
//!   bindings.
//! - [`Ledger`]: conservation-checked capacity accounting for one resource.
//! - [`Reservation`]: one granted reservation, reversible with
//!   [`ResourcePool::undo`].
//! - [`PoolUsage`]: serialisable occupancy report.
//!
//! # Reservation Model
//!
//! ```text
//! try_reserve_cell ─┐
//! try_reserve_memory├─► Reservation records ──► commit(id) ──► active registry
//! try_reserve_*     ┘          │                                   │
//!                              └── rollback() on failure           └── release(id)
//! ```
//!
//! A failing `try_reserve_*` call leaves the pool exactly as it found it.
//! Reservations that succeeded before a later failure are reversed by the
//! caller through [`ResourcePool::rollback`].
//!
//! # Example
//! ```
//! use psys_catalog::{Catalog, CellType, MemoryKind, PipelineId, StageId, BindingId};
//! use psys_pool::{Holder, Reservation, ResourcePool};
//! use std::sync::Arc;
//!
//! let mut pool = ResourcePool::new(Arc::new(Catalog::load("ipu6ep").unwrap()));
//! let h = Holder::new(PipelineId::new(1), StageId::new(0));
//!
//! let cell = pool.try_reserve_cell(CellType::VectorProcessor, h).unwrap();
//! let memory = pool.try_reserve_memory(MemoryKind::Vmem, 256, cell, h).unwrap();
//! pool.commit(BindingId::new(1), h.pipeline, vec![
//!     Reservation::Cell { holder: h, cell },
//!     Reservation::Memory { holder: h, memory, amount: 256 },
//! ]).unwrap();
//!
//! pool.release(BindingId::new(1)).unwrap();
//! assert!(pool.is_idle());
//! ```

mod error;
mod ledger;
mod pool;
mod usage;

pub use error::PoolError;
pub use ledger::{Holder, Ledger, Reservation};
pub use pool::{ActiveBinding, ResourcePool};
pub use usage::{CellUsage, PoolUsage, ResourceUsage};
