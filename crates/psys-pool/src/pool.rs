// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The mutable resource pool.
//!
//! [`ResourcePool`] records, for every concrete instance in the catalog,
//! whether it is free or held and by whom:
//!
//! 1. Cells are either free or held by exactly one [`Holder`].
//! 2. Memory banks, DMA channel kinds and DFM port kinds are [`Ledger`]s.
//! 3. Committed bindings are kept in an active registry so a release can
//!    return exactly what was granted, and a second release is detected.
//!
//! Every `try_reserve_*` call either succeeds and mutates the pool, or
//! fails and leaves it exactly as it was.
//!
//! # Thread Safety
//! The pool itself is a plain value with `&mut self` mutators. Callers that
//! share one across threads put it behind a single mutex so that a whole
//! multi-step allocation runs in one critical section.

use crate::{Holder, Ledger, PoolError, PoolUsage, Reservation};
use psys_catalog::{
    BindingId, Catalog, CellInstanceId, CellType, ChannelKind, MemoryInstanceId, MemoryKind,
    PipelineId, PortKind, ResourceKind,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A committed binding as the pool remembers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBinding {
    /// The pipeline the binding belongs to.
    pub pipeline: PipelineId,
    /// Every reservation of the binding, in grant order.
    pub reservations: Vec<Reservation>,
}

/// Run-time reservation state for every resource instance in a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePool {
    catalog: Arc<Catalog>,
    cells: Vec<Option<Holder>>,
    memories: Vec<Ledger>,
    channels: BTreeMap<ChannelKind, Ledger>,
    ports: BTreeMap<PortKind, Ledger>,
    active: BTreeMap<BindingId, ActiveBinding>,
}

impl ResourcePool {
    /// Creates a pool with every resource of the catalog free.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let cells = vec![None; catalog.num_cells()];
        let memories = catalog
            .memories()
            .map(|(_, m)| Ledger::new(m.capacity))
            .collect();
        let channels = catalog
            .channels()
            .map(|(k, cap)| (k, Ledger::new(cap)))
            .collect();
        let ports = catalog
            .ports()
            .map(|(k, cap)| (k, Ledger::new(cap)))
            .collect();

        Self {
            catalog,
            cells,
            memories,
            channels,
            ports,
            active: BTreeMap::new(),
        }
    }

    /// Returns the catalog this pool was created from.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Returns the holder of a cell, or `None` if it is free.
    pub fn cell_holder(&self, cell: CellInstanceId) -> Option<Holder> {
        self.cells.get(cell.index()).copied().flatten()
    }

    /// Returns the number of free cells of a type.
    pub fn free_cells(&self, cell_type: CellType) -> usize {
        self.catalog
            .cells_of_type(cell_type)
            .filter(|c| self.cells[c.index()].is_none())
            .count()
    }

    /// Returns the ledger of a memory bank.
    pub fn memory_ledger(&self, memory: MemoryInstanceId) -> Option<&Ledger> {
        self.memories.get(memory.index())
    }

    /// Returns the ledger of a DMA channel kind.
    pub fn channel_ledger(&self, kind: ChannelKind) -> Option<&Ledger> {
        self.channels.get(&kind)
    }

    /// Returns the ledger of a DFM port kind.
    pub fn port_ledger(&self, kind: PortKind) -> Option<&Ledger> {
        self.ports.get(&kind)
    }

    /// Returns `true` if nothing at all is held.
    pub fn is_idle(&self) -> bool {
        self.cells.iter().all(Option::is_none)
            && self.memories.iter().all(Ledger::is_idle)
            && self.channels.values().all(Ledger::is_idle)
            && self.ports.values().all(Ledger::is_idle)
    }

    /// Returns `true` if the binding is committed and not yet released.
    pub fn is_active(&self, binding: BindingId) -> bool {
        self.active.contains_key(&binding)
    }

    /// Iterates committed bindings in id order.
    pub fn active_bindings(&self) -> impl Iterator<Item = (BindingId, &ActiveBinding)> + '_ {
        self.active.iter().map(|(&id, b)| (id, b))
    }

    /// Returns the active bindings that belong to a pipeline.
    pub fn bindings_of(&self, pipeline: PipelineId) -> Vec<BindingId> {
        self.active
            .iter()
            .filter(|(_, b)| b.pipeline == pipeline)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Captures a serialisable usage report.
    pub fn usage(&self) -> PoolUsage {
        PoolUsage::capture(self)
    }

    // ── Reservations ───────────────────────────────────────────────

    /// Reserves the first free cell of `cell_type`, scanning instance ids
    /// in ascending order.
    pub fn try_reserve_cell(
        &mut self,
        cell_type: CellType,
        holder: Holder,
    ) -> Result<CellInstanceId, PoolError> {
        let cell = self
            .catalog
            .cells_of_type(cell_type)
            .find(|c| self.cells[c.index()].is_none())
            .ok_or_else(|| PoolError::NoFreeCell {
                cell_type,
                total: self.catalog.count_cells(cell_type),
            })?;

        self.cells[cell.index()] = Some(holder);
        tracing::debug!("{holder}: reserved {cell} ({cell_type})");
        self.debug_verify();
        Ok(cell)
    }

    /// Reserves `amount` units of memory kind `kind` on the bank that
    /// `cell` reaches for that kind.
    ///
    /// The reservation is never split across banks. If the cell cannot
    /// reach the kind at all, the shortage is reported with no instance and
    /// zero availability.
    pub fn try_reserve_memory(
        &mut self,
        kind: MemoryKind,
        amount: u32,
        cell: CellInstanceId,
        holder: Holder,
    ) -> Result<MemoryInstanceId, PoolError> {
        if amount == 0 {
            return Err(PoolError::ZeroSizedReservation(ResourceKind::Memory(kind)));
        }
        if cell.index() >= self.cells.len() {
            return Err(PoolError::UnknownCell(cell));
        }

        let Some(memory) = self.catalog.affinity(cell, kind) else {
            return Err(PoolError::InsufficientMemory {
                kind,
                requested: amount,
                available: 0,
                instance: None,
            });
        };

        let ledger = self.memories.get_mut(memory.index()).ok_or_else(|| {
            PoolError::PoolCorruption(format!("no ledger for {memory}"))
        })?;
        if !ledger.try_reserve(holder, amount) {
            return Err(PoolError::InsufficientMemory {
                kind,
                requested: amount,
                available: ledger.remaining(),
                instance: Some(memory),
            });
        }

        tracing::debug!("{holder}: reserved {amount} of {kind} on {memory} via {cell}");
        self.debug_verify();
        Ok(memory)
    }

    /// Reserves `amount` concurrent transfers on a DMA channel kind.
    pub fn try_reserve_channel(
        &mut self,
        kind: ChannelKind,
        amount: u32,
        holder: Holder,
    ) -> Result<(), PoolError> {
        if amount == 0 {
            return Err(PoolError::ZeroSizedReservation(ResourceKind::Channel(kind)));
        }
        let shortage = |available| PoolError::InsufficientChannel {
            kind,
            requested: amount,
            available,
        };
        let ledger = self.channels.get_mut(&kind).ok_or_else(|| shortage(0))?;
        if !ledger.try_reserve(holder, amount) {
            return Err(shortage(ledger.remaining()));
        }

        tracing::debug!("{holder}: reserved {amount} of channel {kind}");
        self.debug_verify();
        Ok(())
    }

    /// Reserves `amount` slots on a DFM port kind.
    pub fn try_reserve_port(
        &mut self,
        kind: PortKind,
        amount: u32,
        holder: Holder,
    ) -> Result<(), PoolError> {
        if amount == 0 {
            return Err(PoolError::ZeroSizedReservation(ResourceKind::Port(kind)));
        }
        let shortage = |available| PoolError::InsufficientPort {
            kind,
            requested: amount,
            available,
        };
        let ledger = self.ports.get_mut(&kind).ok_or_else(|| shortage(0))?;
        if !ledger.try_reserve(holder, amount) {
            return Err(shortage(ledger.remaining()));
        }

        tracing::debug!("{holder}: reserved {amount} of port {kind}");
        self.debug_verify();
        Ok(())
    }

    /// Reverses one reservation exactly.
    pub fn undo(&mut self, reservation: &Reservation) -> Result<(), PoolError> {
        match *reservation {
            Reservation::Cell { holder, cell } => {
                let slot = self
                    .cells
                    .get_mut(cell.index())
                    .ok_or(PoolError::UnknownCell(cell))?;
                if *slot != Some(holder) {
                    return Err(PoolError::PoolCorruption(format!(
                        "{cell} is not held by {holder}"
                    )));
                }
                *slot = None;
            }
            Reservation::Memory {
                holder,
                memory,
                amount,
            } => {
                self.memories
                    .get_mut(memory.index())
                    .ok_or_else(|| PoolError::PoolCorruption(format!("no ledger for {memory}")))?
                    .release(holder, amount)
                    .map_err(|e| PoolError::PoolCorruption(format!("{memory}: {e}")))?;
            }
            Reservation::Channel {
                holder,
                kind,
                amount,
            } => {
                self.channels
                    .get_mut(&kind)
                    .ok_or_else(|| PoolError::PoolCorruption(format!("no ledger for channel {kind}")))?
                    .release(holder, amount)
                    .map_err(|e| PoolError::PoolCorruption(format!("channel {kind}: {e}")))?;
            }
            Reservation::Port {
                holder,
                kind,
                amount,
            } => {
                self.ports
                    .get_mut(&kind)
                    .ok_or_else(|| PoolError::PoolCorruption(format!("no ledger for port {kind}")))?
                    .release(holder, amount)
                    .map_err(|e| PoolError::PoolCorruption(format!("port {kind}: {e}")))?;
            }
        }
        self.debug_verify();
        Ok(())
    }

    /// Reverses a sequence of reservations, newest first.
    ///
    /// Every reservation is attempted even if an earlier one fails; the
    /// first failure is returned.
    pub fn rollback(&mut self, reservations: &[Reservation]) -> Result<(), PoolError> {
        let mut first_err = None;
        for r in reservations.iter().rev() {
            if let Err(e) = self.undo(r) {
                tracing::error!("rollback of {r:?} failed: {e}");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    // ── Bindings ───────────────────────────────────────────────────

    /// Records already-granted reservations as an active binding.
    pub fn commit(
        &mut self,
        id: BindingId,
        pipeline: PipelineId,
        reservations: Vec<Reservation>,
    ) -> Result<(), PoolError> {
        if self.active.contains_key(&id) {
            return Err(PoolError::PoolCorruption(format!("{id} is already active")));
        }
        self.active.insert(
            id,
            ActiveBinding {
                pipeline,
                reservations,
            },
        );
        self.debug_verify();
        Ok(())
    }

    /// Returns every resource of an active binding to the pool.
    ///
    /// Fails with [`PoolError::DoubleRelease`] and changes nothing if the
    /// binding is not active. If returning a reservation fails, the binding
    /// stays registered and the corruption is reported.
    pub fn release(&mut self, id: BindingId) -> Result<ActiveBinding, PoolError> {
        let binding = self.active.remove(&id).ok_or(PoolError::DoubleRelease(id))?;
        if let Err(e) = self.rollback(&binding.reservations) {
            self.active.insert(id, binding);
            return Err(e);
        }
        tracing::debug!(
            "{id} released ({} reservations, {})",
            binding.reservations.len(),
            binding.pipeline,
        );
        Ok(binding)
    }

    /// Releases every active binding of a pipeline and returns their ids.
    pub fn force_release(&mut self, pipeline: PipelineId) -> Result<Vec<BindingId>, PoolError> {
        let ids = self.bindings_of(pipeline);
        for &id in &ids {
            self.release(id)?;
        }
        Ok(ids)
    }

    // ── Invariants ─────────────────────────────────────────────────

    /// Checks the pool invariants.
    ///
    /// - Every ledger satisfies `remaining + Σ reservations == capacity`.
    /// - Every cell reservation of an active binding points at a cell held
    ///   by that reservation's holder, and no cell is claimed twice.
    pub fn verify(&self) -> Result<(), PoolError> {
        for (i, ledger) in self.memories.iter().enumerate() {
            if !ledger.is_consistent() {
                return Err(PoolError::PoolCorruption(format!(
                    "memory ledger {i} violates conservation"
                )));
            }
        }
        for (kind, ledger) in &self.channels {
            if !ledger.is_consistent() {
                return Err(PoolError::PoolCorruption(format!(
                    "channel {kind} violates conservation"
                )));
            }
        }
        for (kind, ledger) in &self.ports {
            if !ledger.is_consistent() {
                return Err(PoolError::PoolCorruption(format!(
                    "port {kind} violates conservation"
                )));
            }
        }

        let mut claimed = vec![false; self.cells.len()];
        for (id, binding) in &self.active {
            for r in &binding.reservations {
                if let Reservation::Cell { holder, cell } = *r {
                    if self.cell_holder(cell) != Some(holder) {
                        return Err(PoolError::PoolCorruption(format!(
                            "{id} claims {cell} but it is not held by {holder}"
                        )));
                    }
                    if std::mem::replace(&mut claimed[cell.index()], true) {
                        return Err(PoolError::PoolCorruption(format!(
                            "{cell} is claimed by more than one binding"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn debug_verify(&self) {
        debug_assert!(
            self.verify().is_ok(),
            "pool invariant violated: {:?}",
            self.verify()
        );
    }
}
