// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Allocation statistics for profiling and diagnostics.
//!
//! [`AllocationStats`] tracks cumulative counters about how the allocator
//! is being used: success rate, shortages by resource class, and peak
//! occupancy. Failed attempts never change the pool, but they do change
//! these counters.

use crate::AllocationError;

/// Cumulative statistics about allocator usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AllocationStats {
    /// Total number of `allocate` calls.
    pub total_requests: u64,
    /// Requests that produced a binding.
    pub successful: u64,
    /// Requests refused because no cell of the stage's type was free.
    pub cell_shortages: u64,
    /// Requests refused for lack of memory.
    pub memory_shortages: u64,
    /// Requests refused for lack of DMA channel or DFM port capacity.
    pub transfer_shortages: u64,
    /// Requests rejected before touching the pool, or failing internally.
    pub other_failures: u64,
    /// Total stages granted across all successful requests.
    pub stages_granted: u64,
    /// Bindings returned to the pool.
    pub releases: u64,
    /// Release attempts on a binding that was not active.
    pub double_releases: u64,
    /// Bindings reclaimed through a pipeline-wide forced release.
    pub forced_releases: u64,
    /// Highest number of simultaneously active bindings.
    pub peak_active_bindings: usize,
    /// Highest number of simultaneously held cells.
    pub peak_cells_held: usize,
}

impl AllocationStats {
    /// Returns the fraction of requests that succeeded, in `[0.0, 1.0]`.
    ///
    /// Returns `0.0` if no requests have been made.
    pub fn success_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total_requests as f64
    }

    /// Returns the number of failed requests.
    pub fn failed(&self) -> u64 {
        self.total_requests - self.successful
    }

    pub(crate) fn record_success(&mut self, stages: usize) {
        self.total_requests += 1;
        self.successful += 1;
        self.stages_granted += stages as u64;
    }

    pub(crate) fn record_failure(&mut self, err: &AllocationError) {
        self.total_requests += 1;
        match err {
            AllocationError::NoFreeCell { .. } => self.cell_shortages += 1,
            AllocationError::InsufficientMemory { .. } => self.memory_shortages += 1,
            AllocationError::InsufficientChannel { .. }
            | AllocationError::InsufficientPort { .. } => self.transfer_shortages += 1,
            _ => self.other_failures += 1,
        }
    }

    pub(crate) fn record_release(&mut self) {
        self.releases += 1;
    }

    pub(crate) fn record_forced_release(&mut self) {
        self.releases += 1;
        self.forced_releases += 1;
    }

    pub(crate) fn record_double_release(&mut self) {
        self.double_releases += 1;
    }

    /// Updates the high-water marks if needed.
    pub(crate) fn update_peak(&mut self, active_bindings: usize, cells_held: usize) {
        self.peak_active_bindings = self.peak_active_bindings.max(active_bindings);
        self.peak_cells_held = self.peak_cells_held.max(cells_held);
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Requests: {} total ({} granted, {:.0}% success), shortages: \
             {} cell / {} memory / {} transfer, {} releases ({} forced, {} double), \
             peak {} bindings / {} cells",
            self.total_requests,
            self.successful,
            self.success_ratio() * 100.0,
            self.cell_shortages,
            self.memory_shortages,
            self.transfer_shortages,
            self.releases,
            self.forced_releases,
            self.double_releases,
            self.peak_active_bindings,
            self.peak_cells_held,
        )
    }
}
