// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The result of a successful allocation.

use crate::AllocationError;
use psys_catalog::{
    BindingId, CellInstanceId, CellType, ChannelKind, MemoryInstanceId, MemoryKind, PipelineId,
    PortKind, StageId,
};
use std::fmt;

/// Memory granted to a stage on a specific bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MemoryGrant {
    pub kind: MemoryKind,
    pub memory: MemoryInstanceId,
    pub amount: u32,
}

/// DMA channel capacity granted to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ChannelGrant {
    pub kind: ChannelKind,
    pub amount: u32,
}

/// DFM port capacity granted to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PortGrant {
    pub kind: PortKind,
    pub amount: u32,
}

/// Everything one stage was granted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StageBinding {
    pub stage: StageId,
    pub cell: CellInstanceId,
    pub cell_type: CellType,
    pub memory: Vec<MemoryGrant>,
    pub channels: Vec<ChannelGrant>,
    pub ports: Vec<PortGrant>,
}

impl StageBinding {
    pub(crate) fn new(stage: StageId, cell: CellInstanceId, cell_type: CellType) -> Self {
        Self {
            stage,
            cell,
            cell_type,
            memory: Vec::new(),
            channels: Vec::new(),
            ports: Vec::new(),
        }
    }

    /// Returns the total memory granted to this stage.
    pub fn memory_total(&self) -> u64 {
        self.memory.iter().map(|g| u64::from(g.amount)).sum()
    }
}

/// A complete mapping of a pipeline's stages onto resource instances.
///
/// A `Binding` is a receipt: cloning it does not duplicate any resource,
/// and only the first [`Allocator::release`](crate::Allocator::release)
/// of its id returns resources to the pool.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Binding {
    id: BindingId,
    pipeline: PipelineId,
    stages: Vec<StageBinding>,
}

impl Binding {
    pub(crate) fn new(id: BindingId, pipeline: PipelineId, stages: Vec<StageBinding>) -> Self {
        Self {
            id,
            pipeline,
            stages,
        }
    }

    /// Returns the binding id.
    pub fn id(&self) -> BindingId {
        self.id
    }

    /// Returns the pipeline that owns this binding.
    pub fn pipeline(&self) -> PipelineId {
        self.pipeline
    }

    /// Returns per-stage grants in request order.
    pub fn stages(&self) -> &[StageBinding] {
        &self.stages
    }

    /// Looks up the grants of one stage.
    pub fn stage(&self, id: StageId) -> Option<&StageBinding> {
        self.stages.iter().find(|s| s.stage == id)
    }

    /// Returns the number of stages.
    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    /// Iterates the cells held by this binding.
    pub fn cells(&self) -> impl Iterator<Item = CellInstanceId> + '_ {
        self.stages.iter().map(|s| s.cell)
    }

    /// Serialises the binding to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, AllocationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}):", self.id, self.pipeline)?;
        for s in &self.stages {
            write!(f, " {}→{}", s.stage, s.cell)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Binding {
        let mut s0 = StageBinding::new(StageId::new(0), CellInstanceId::new(3), CellType::AccPsa);
        s0.memory.push(MemoryGrant {
            kind: MemoryKind::LbVmem,
            memory: MemoryInstanceId::new(3),
            amount: 64,
        });
        s0.memory.push(MemoryGrant {
            kind: MemoryKind::TransferVmem0,
            memory: MemoryInstanceId::new(1),
            amount: 32,
        });
        let mut s1 = StageBinding::new(StageId::new(1), CellInstanceId::new(2), CellType::VectorProcessor);
        s1.ports.push(PortGrant {
            kind: PortKind::IslFull,
            amount: 1,
        });
        Binding::new(BindingId::new(9), PipelineId::new(4), vec![s0, s1])
    }

    #[test]
    fn test_lookup() {
        let b = sample();
        assert_eq!(b.num_stages(), 2);
        assert_eq!(b.stage(StageId::new(1)).unwrap().cell, CellInstanceId::new(2));
        assert!(b.stage(StageId::new(5)).is_none());
        assert_eq!(b.stages()[0].memory_total(), 96);
        assert_eq!(b.cells().count(), 2);
    }

    #[test]
    fn test_display() {
        let b = sample();
        assert_eq!(b.to_string(), "binding#9 (pipeline#4): stage#0→cell#3 stage#1→cell#2");
    }

    #[test]
    fn test_to_json() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["id"], 9);
        assert_eq!(value["stages"][0]["memory"][0]["kind"], "lb_vmem");
        assert_eq!(value["stages"][1]["ports"][0]["kind"], "isl_full");
    }
}
