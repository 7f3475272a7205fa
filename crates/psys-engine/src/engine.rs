// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The allocation engine.
//!
//! ```text
//! PipelineRequest<Validated>
//!     │  Allocator::allocate()       one critical section
//!     ▼
//!  for each stage, in request order:
//!     cell → memory (via the cell's affinity) → channels → ports
//!     │                                 │
//!     │ all granted                     │ any shortage
//!     ▼                                 ▼
//!  commit journal as Binding      roll journal back, newest first
//! ```
//!
//! Every reservation made during a call is journalled, so a failed call
//! leaves the pool exactly as it found it.

use crate::{
    AllocationError, AllocationStats, AllocatorConfig, Binding, BindingGuard, ChannelGrant,
    MemoryGrant, PipelineRequest, PortGrant, StageBinding, StageRequest, Validated,
};
use psys_catalog::{BindingId, Catalog, PipelineId};
use psys_pool::{Holder, PoolError, PoolUsage, Reservation, ResourcePool};
use std::sync::{Arc, Mutex, MutexGuard};

/// Mutable engine state, guarded by a single lock.
#[derive(Debug)]
struct EngineState {
    pool: ResourcePool,
    next_binding: BindingId,
    stats: AllocationStats,
}

/// Shared allocator state, held by the [`Allocator`] and by every
/// [`BindingGuard`] it hands out.
#[derive(Debug)]
pub(crate) struct AllocatorInner {
    catalog: Arc<Catalog>,
    state: Mutex<EngineState>,
    panic_on_double_release: bool,
}

impl AllocatorInner {
    fn lock(&self) -> Result<MutexGuard<'_, EngineState>, AllocationError> {
        self.state.lock().map_err(|_| AllocationError::LockPoisoned)
    }

    /// Returns a binding's resources to the pool.
    ///
    /// A double release panics only when the allocator is configured to
    /// and the caller allows it; `Drop` paths pass `panic_allowed = false`.
    pub(crate) fn release(&self, id: BindingId, panic_allowed: bool) -> Result<(), AllocationError> {
        let mut state = self.lock()?;
        match state.pool.release(id) {
            Ok(released) => {
                state.stats.record_release();
                tracing::info!(
                    "{id} released ({}, {} reservations returned)",
                    released.pipeline,
                    released.reservations.len(),
                );
                Ok(())
            }
            Err(PoolError::DoubleRelease(id)) => {
                state.stats.record_double_release();
                drop(state);
                tracing::error!("{id} released twice; pool left unchanged");
                if self.panic_on_double_release && panic_allowed {
                    panic!("{id} released twice");
                }
                Err(AllocationError::DoubleRelease(id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl EngineState {
    /// Grants a whole request or nothing.
    fn allocate(&mut self, request: &PipelineRequest<Validated>) -> Result<Binding, AllocationError> {
        let pipeline = request.pipeline();
        let mut journal = Vec::new();
        let mut stages = Vec::with_capacity(request.num_stages());

        for stage in request.stages() {
            match grant_stage(&mut self.pool, pipeline, stage, &mut journal) {
                Ok(granted) => stages.push(granted),
                Err(e) => {
                    tracing::debug!(
                        "{pipeline}: rolling back {} reservations after failure at {}",
                        journal.len(),
                        stage.id,
                    );
                    self.pool.rollback(&journal)?;
                    return Err(e);
                }
            }
        }

        let id = self.next_binding;
        self.next_binding = id.next();
        self.pool.commit(id, pipeline, journal)?;
        Ok(Binding::new(id, pipeline, stages))
    }

    fn cells_held(&self) -> usize {
        self.pool
            .active_bindings()
            .flat_map(|(_, b)| b.reservations.iter())
            .filter(|r| matches!(r, Reservation::Cell { .. }))
            .count()
    }
}

/// Reserves everything one stage needs, journalling each grant.
fn grant_stage(
    pool: &mut ResourcePool,
    pipeline: PipelineId,
    stage: &StageRequest,
    journal: &mut Vec<Reservation>,
) -> Result<StageBinding, AllocationError> {
    let stage_id = stage.id;
    let holder = Holder::new(pipeline, stage_id);
    let at = move |e: PoolError| AllocationError::at_stage(stage_id, e);

    let cell = pool.try_reserve_cell(stage.cell_type, holder).map_err(at)?;
    journal.push(Reservation::Cell { holder, cell });
    let mut granted = StageBinding::new(stage_id, cell, stage.cell_type);

    for req in &stage.memory {
        let memory = pool
            .try_reserve_memory(req.kind, req.amount, cell, holder)
            .map_err(at)?;
        journal.push(Reservation::Memory {
            holder,
            memory,
            amount: req.amount,
        });
        granted.memory.push(MemoryGrant {
            kind: req.kind,
            memory,
            amount: req.amount,
        });
    }

    for req in &stage.channels {
        pool.try_reserve_channel(req.kind, req.amount, holder)
            .map_err(at)?;
        journal.push(Reservation::Channel {
            holder,
            kind: req.kind,
            amount: req.amount,
        });
        granted.channels.push(ChannelGrant {
            kind: req.kind,
            amount: req.amount,
        });
    }

    for req in &stage.ports {
        pool.try_reserve_port(req.kind, req.amount, holder)
            .map_err(at)?;
        journal.push(Reservation::Port {
            holder,
            kind: req.kind,
            amount: req.amount,
        });
        granted.ports.push(PortGrant {
            kind: req.kind,
            amount: req.amount,
        });
    }

    Ok(granted)
}

// ── Allocator ──────────────────────────────────────────────────────

/// Maps pipeline requests onto the resources of one catalog.
///
/// `Allocator` is cheap to clone and `Send + Sync`; clones share the same
/// pool. Each `allocate` and `release` runs as one critical section, so
/// concurrent callers are serialised and never observe a partial binding.
///
/// # Example
/// ```
/// use psys_catalog::{CellType, MemoryKind};
/// use psys_engine::{Allocator, PipelineRequest, StageRequest};
///
/// let allocator = Allocator::from_generation("ipu6ep").unwrap();
/// let request = PipelineRequest::new(1, vec![
///     StageRequest::new(0, CellType::AccIsa).with_memory(MemoryKind::LbVmem, 256),
///     StageRequest::new(1, CellType::VectorProcessor).with_memory(MemoryKind::Vmem, 512).after(0),
/// ])
/// .validate()
/// .unwrap();
///
/// let binding = allocator.allocate(&request).unwrap();
/// assert_eq!(binding.num_stages(), 2);
/// allocator.release(&binding).unwrap();
/// assert!(allocator.snapshot().unwrap().is_idle());
/// ```
#[derive(Debug, Clone)]
pub struct Allocator {
    inner: Arc<AllocatorInner>,
}

impl Allocator {
    /// Creates an allocator with every resource of `catalog` free.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_options(catalog, false)
    }

    /// Creates an allocator for a built-in generation.
    pub fn from_generation(generation: &str) -> Result<Self, AllocationError> {
        Ok(Self::new(Arc::new(Catalog::load(generation)?)))
    }

    /// Creates an allocator from configuration.
    pub fn from_config(config: &AllocatorConfig) -> Result<Self, AllocationError> {
        let catalog = config.load_catalog()?;
        Ok(Self::with_options(catalog, config.panic_on_double_release))
    }

    fn with_options(catalog: Arc<Catalog>, panic_on_double_release: bool) -> Self {
        tracing::info!(
            "allocator created for '{}' ({} cells, {} memories)",
            catalog.generation(),
            catalog.num_cells(),
            catalog.num_memories(),
        );
        let pool = ResourcePool::new(Arc::clone(&catalog));
        Self {
            inner: Arc::new(AllocatorInner {
                catalog,
                state: Mutex::new(EngineState {
                    pool,
                    next_binding: BindingId::new(1),
                    stats: AllocationStats::default(),
                }),
                panic_on_double_release,
            }),
        }
    }

    /// Returns the catalog this allocator serves.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.inner.catalog
    }

    /// Allocates every stage of `request`, or nothing.
    ///
    /// Stages are processed in request order. Within a stage the cell is
    /// reserved first (lowest free instance id of the requested type),
    /// then each memory requirement on the bank that cell reaches, then
    /// channels, then ports. The first shortage aborts the call, every
    /// reservation made so far is returned, and the error names the
    /// failing stage and resource kind.
    pub fn allocate(
        &self,
        request: &PipelineRequest<Validated>,
    ) -> Result<Binding, AllocationError> {
        let mut state = self.inner.lock()?;
        let result = state.allocate(request);

        match &result {
            Ok(binding) => {
                state.stats.record_success(binding.num_stages());
                let active = state.pool.active_bindings().count();
                let cells = state.cells_held();
                state.stats.update_peak(active, cells);
                tracing::info!("{binding}");
            }
            Err(e) => {
                state.stats.record_failure(e);
                tracing::warn!("{}: allocation refused: {e}", request.pipeline());
            }
        }
        result
    }

    /// Allocates and wraps the binding in a guard that releases it when
    /// dropped.
    pub fn acquire(
        &self,
        request: &PipelineRequest<Validated>,
    ) -> Result<BindingGuard, AllocationError> {
        let binding = self.allocate(request)?;
        Ok(BindingGuard::new(binding, Arc::clone(&self.inner)))
    }

    /// Returns every resource of `binding` to the pool.
    ///
    /// Releasing a binding that is no longer active fails with
    /// [`AllocationError::DoubleRelease`] and leaves the pool unchanged.
    pub fn release(&self, binding: &Binding) -> Result<(), AllocationError> {
        self.inner.release(binding.id(), true)
    }

    /// Releases every active binding of `pipeline`, for use by a
    /// supervisor after the owning process has died. Returns the number
    /// of bindings released.
    pub fn force_release(&self, pipeline: PipelineId) -> Result<usize, AllocationError> {
        let mut state = self.inner.lock()?;
        let released = state.pool.force_release(pipeline)?;
        for id in &released {
            state.stats.record_forced_release();
            tracing::warn!("{id} of {pipeline} force-released");
        }
        Ok(released.len())
    }

    /// Returns `true` if the binding has not been released yet.
    pub fn is_active(&self, id: BindingId) -> Result<bool, AllocationError> {
        Ok(self.inner.lock()?.pool.is_active(id))
    }

    /// Captures a usage report of the pool.
    pub fn usage(&self) -> Result<PoolUsage, AllocationError> {
        Ok(self.inner.lock()?.pool.usage())
    }

    /// Returns a copy of the cumulative statistics.
    pub fn stats(&self) -> Result<AllocationStats, AllocationError> {
        Ok(self.inner.lock()?.stats.clone())
    }

    /// Returns a copy of the pool state.
    pub fn snapshot(&self) -> Result<ResourcePool, AllocationError> {
        Ok(self.inner.lock()?.pool.clone())
    }

    /// Checks the pool invariants.
    pub fn verify(&self) -> Result<(), AllocationError> {
        Ok(self.inner.lock()?.pool.verify()?)
    }
}
