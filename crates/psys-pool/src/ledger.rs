// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Capacity ledgers and reservation records.
//!
//! A [`Ledger`] tracks one finite resource: a memory bank, a DMA channel
//! kind or a DFM port kind. It keeps `remaining` alongside the individual
//! reservations so the conservation invariant
//! `remaining + Σ reservations == capacity` can be checked at any time.

use psys_catalog::{CellInstanceId, ChannelKind, MemoryInstanceId, PipelineId, PortKind, StageId};
use std::collections::BTreeMap;
use std::fmt;

/// The owner of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct Holder {
    pub pipeline: PipelineId,
    pub stage: StageId,
}

impl Holder {
    pub fn new(pipeline: PipelineId, stage: StageId) -> Self {
        Self { pipeline, stage }
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pipeline, self.stage)
    }
}

/// One granted reservation, precise enough to be reversed exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Cell {
        holder: Holder,
        cell: CellInstanceId,
    },
    Memory {
        holder: Holder,
        memory: MemoryInstanceId,
        amount: u32,
    },
    Channel {
        holder: Holder,
        kind: ChannelKind,
        amount: u32,
    },
    Port {
        holder: Holder,
        kind: PortKind,
        amount: u32,
    },
}

impl Reservation {
    /// Returns the owner of this reservation.
    pub fn holder(&self) -> Holder {
        match *self {
            Self::Cell { holder, .. }
            | Self::Memory { holder, .. }
            | Self::Channel { holder, .. }
            | Self::Port { holder, .. } => holder,
        }
    }
}

/// Capacity accounting for a single finite resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    capacity: u32,
    remaining: u32,
    reservations: BTreeMap<Holder, u32>,
}

impl Ledger {
    /// Creates an empty ledger with the given total capacity.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            remaining: capacity,
            reservations: BTreeMap::new(),
        }
    }

    /// Total capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Capacity not currently reserved.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Capacity currently reserved.
    pub fn reserved(&self) -> u32 {
        self.capacity - self.remaining
    }

    /// Iterates the active reservations by holder.
    pub fn reservations(&self) -> impl Iterator<Item = (Holder, u32)> + '_ {
        self.reservations.iter().map(|(&h, &a)| (h, a))
    }

    /// Returns `true` if nothing is reserved.
    pub fn is_idle(&self) -> bool {
        self.reservations.is_empty()
    }

    /// Reserves `amount` units for `holder` if they fit; otherwise leaves
    /// the ledger untouched and returns `false`.
    ///
    /// Repeated reservations by the same holder accumulate.
    pub(crate) fn try_reserve(&mut self, holder: Holder, amount: u32) -> bool {
        if amount > self.remaining {
            return false;
        }
        self.remaining -= amount;
        *self.reservations.entry(holder).or_insert(0) += amount;
        true
    }

    /// Returns `amount` units held by `holder`.
    pub(crate) fn release(&mut self, holder: Holder, amount: u32) -> Result<(), String> {
        let held = self
            .reservations
            .get_mut(&holder)
            .ok_or_else(|| format!("{holder} holds nothing"))?;
        if *held < amount {
            return Err(format!("{holder} holds {held}, cannot return {amount}"));
        }
        let remaining = self
            .remaining
            .checked_add(amount)
            .filter(|&r| r <= self.capacity)
            .ok_or_else(|| format!("returning {amount} would exceed capacity {}", self.capacity))?;

        *held -= amount;
        if *held == 0 {
            self.reservations.remove(&holder);
        }
        self.remaining = remaining;
        Ok(())
    }

    /// Checks `remaining + Σ reservations == capacity`.
    pub fn is_consistent(&self) -> bool {
        let reserved: u64 = self.reservations.values().map(|&a| u64::from(a)).sum();
        u64::from(self.remaining) + reserved == u64::from(self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder(p: u32, s: u16) -> Holder {
        Holder::new(PipelineId::new(p), StageId::new(s))
    }

    #[test]
    fn test_reserve_and_release() {
        let mut l = Ledger::new(100);
        assert!(l.try_reserve(holder(1, 0), 60));
        assert_eq!(l.remaining(), 40);
        assert_eq!(l.reserved(), 60);
        assert!(l.is_consistent());

        l.release(holder(1, 0), 60).unwrap();
        assert_eq!(l, Ledger::new(100));
    }

    #[test]
    fn test_overcommit_leaves_ledger_untouched() {
        let mut l = Ledger::new(100);
        assert!(l.try_reserve(holder(1, 0), 60));
        let before = l.clone();
        assert!(!l.try_reserve(holder(1, 1), 50));
        assert_eq!(l, before);
    }

    #[test]
    fn test_same_holder_accumulates() {
        let mut l = Ledger::new(10);
        assert!(l.try_reserve(holder(1, 0), 3));
        assert!(l.try_reserve(holder(1, 0), 4));
        assert_eq!(l.reservations().collect::<Vec<_>>(), vec![(holder(1, 0), 7)]);

        l.release(holder(1, 0), 3).unwrap();
        assert_eq!(l.remaining(), 6);
        assert!(l.is_consistent());
    }

    #[test]
    fn test_release_errors() {
        let mut l = Ledger::new(10);
        assert!(l.release(holder(1, 0), 1).is_err());

        assert!(l.try_reserve(holder(1, 0), 2));
        assert!(l.release(holder(1, 0), 5).is_err());
        assert_eq!(l.remaining(), 8);
    }

    #[test]
    fn test_holder_display() {
        assert_eq!(holder(3, 1).to_string(), "pipeline#3/stage#1");
    }
}
