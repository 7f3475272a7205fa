// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pipeline requests.
//!
//! # Type-State Pattern
//!
//! ```text
//! PipelineRequest<Unchecked>   stages as handed over by the graph builder.
//!       │  .validate()
//!       ▼
//! PipelineRequest<Validated>   well-formed, accepted by the allocator.
//! ```
//!
//! The allocator only takes `PipelineRequest<Validated>`, so a request with
//! duplicate stage ids or zero-sized requirements never reaches the pool.
//!
//! # JSON Format
//! ```json
//! {
//!   "pipeline": 7,
//!   "stages": [
//!     { "id": 0, "cell_type": "acc_isa",
//!       "memory": [{ "kind": "lb_vmem", "amount": 256 }],
//!       "channels": [{ "kind": "dma_isa", "amount": 1 }] },
//!     { "id": 1, "cell_type": "vector_processor", "depends_on": [0],
//!       "memory": [{ "kind": "vmem", "amount": 512 }],
//!       "ports": [{ "kind": "isl_full", "amount": 2 }] }
//!   ]
//! }
//! ```

use crate::AllocationError;
use psys_catalog::{CellType, ChannelKind, MemoryKind, PipelineId, PortKind, StageId};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: request has not been checked.
#[derive(Debug, Clone)]
pub struct Unchecked;

/// Marker: request is well-formed.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for request states.
pub trait RequestState: fmt::Debug + Clone {}
impl RequestState for Unchecked {}
impl RequestState for Validated {}

// ── Requirements ───────────────────────────────────────────────────

/// Memory needed by a stage from the bank its cell reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryRequirement {
    pub kind: MemoryKind,
    pub amount: u32,
}

/// Concurrent transfers needed on a DMA channel kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChannelRequirement {
    pub kind: ChannelKind,
    pub amount: u32,
}

/// Reservations needed on a DFM port kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PortRequirement {
    pub kind: PortKind,
    pub amount: u32,
}

/// One stage of a pipeline: a cell of a given type plus its resources.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StageRequest {
    pub id: StageId,
    pub cell_type: CellType,
    #[serde(default)]
    pub memory: Vec<MemoryRequirement>,
    #[serde(default)]
    pub channels: Vec<ChannelRequirement>,
    #[serde(default)]
    pub ports: Vec<PortRequirement>,
    /// Producer stages. A hint only; the allocator never reorders.
    #[serde(default)]
    pub depends_on: Vec<StageId>,
}

impl StageRequest {
    /// Creates a stage that needs only a cell.
    pub fn new(id: u16, cell_type: CellType) -> Self {
        Self {
            id: StageId::new(id),
            cell_type,
            memory: Vec::new(),
            channels: Vec::new(),
            ports: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    /// Adds a memory requirement.
    pub fn with_memory(mut self, kind: MemoryKind, amount: u32) -> Self {
        self.memory.push(MemoryRequirement { kind, amount });
        self
    }

    /// Adds a DMA channel requirement.
    pub fn with_channel(mut self, kind: ChannelKind, amount: u32) -> Self {
        self.channels.push(ChannelRequirement { kind, amount });
        self
    }

    /// Adds a DFM port requirement.
    pub fn with_port(mut self, kind: PortKind, amount: u32) -> Self {
        self.ports.push(PortRequirement { kind, amount });
        self
    }

    /// Declares a producer stage.
    pub fn after(mut self, producer: u16) -> Self {
        self.depends_on.push(StageId::new(producer));
        self
    }

    fn check(&self) -> Result<(), String> {
        fn unique<K: Copy + Eq + std::hash::Hash + fmt::Display>(
            stage: StageId,
            what: &str,
            items: impl Iterator<Item = (K, u32)>,
        ) -> Result<(), String> {
            let mut seen = HashSet::new();
            for (kind, amount) in items {
                if amount == 0 {
                    return Err(format!("{stage} requests zero units of {what} {kind}"));
                }
                if !seen.insert(kind) {
                    return Err(format!("{stage} lists {what} {kind} more than once"));
                }
            }
            Ok(())
        }

        unique(self.id, "memory", self.memory.iter().map(|r| (r.kind, r.amount)))?;
        unique(self.id, "channel", self.channels.iter().map(|r| (r.kind, r.amount)))?;
        unique(self.id, "port", self.ports.iter().map(|r| (r.kind, r.amount)))?;
        Ok(())
    }
}

// ── PipelineRequest ────────────────────────────────────────────────

/// An ordered sequence of stages to be allocated atomically.
///
/// Declared order must already be producer-before-consumer; the
/// allocator processes stages in exactly this order.
#[derive(Debug, Clone)]
pub struct PipelineRequest<S: RequestState = Unchecked> {
    pipeline: PipelineId,
    stages: Vec<StageRequest>,
    _state: PhantomData<S>,
}

#[derive(serde::Deserialize)]
struct RequestDocument {
    pipeline: PipelineId,
    stages: Vec<StageRequest>,
}

impl<S: RequestState> PipelineRequest<S> {
    /// Returns the pipeline id.
    pub fn pipeline(&self) -> PipelineId {
        self.pipeline
    }

    /// Returns the stages in declared order.
    pub fn stages(&self) -> &[StageRequest] {
        &self.stages
    }

    /// Returns the number of stages.
    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    /// Returns a one-line summary.
    pub fn summary(&self) -> String {
        let memory: u64 = self
            .stages
            .iter()
            .flat_map(|s| s.memory.iter())
            .map(|r| u64::from(r.amount))
            .sum();
        format!(
            "{}: {} stages, {} memory units requested",
            self.pipeline,
            self.stages.len(),
            memory,
        )
    }
}

impl PipelineRequest<Unchecked> {
    /// Creates an unchecked request.
    pub fn new(pipeline: u32, stages: Vec<StageRequest>) -> Self {
        Self {
            pipeline: PipelineId::new(pipeline),
            stages,
            _state: PhantomData,
        }
    }

    /// Parses a request from JSON.
    pub fn from_json(json: &str) -> Result<Self, AllocationError> {
        let doc: RequestDocument = serde_json::from_str(json)
            .map_err(|e| AllocationError::InvalidRequest(format!("JSON parse error: {e}")))?;
        Ok(Self {
            pipeline: doc.pipeline,
            stages: doc.stages,
            _state: PhantomData,
        })
    }

    /// Loads a request from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, AllocationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AllocationError::InvalidRequest(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Checks the request and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - At least one stage.
    /// - Stage ids are unique.
    /// - Every amount is positive.
    /// - No stage lists the same memory, channel or port kind twice.
    ///
    /// Dependencies on stages that are not part of the request are logged,
    /// not rejected. Ordering is never checked.
    pub fn validate(self) -> Result<PipelineRequest<Validated>, AllocationError> {
        if self.stages.is_empty() {
            return Err(AllocationError::InvalidRequest(format!(
                "{} has no stages",
                self.pipeline
            )));
        }

        let mut ids = HashSet::new();
        for stage in &self.stages {
            if !ids.insert(stage.id) {
                return Err(AllocationError::InvalidRequest(format!(
                    "{} declares {} more than once",
                    self.pipeline, stage.id
                )));
            }
            stage.check().map_err(AllocationError::InvalidRequest)?;
        }

        for stage in &self.stages {
            for dep in &stage.depends_on {
                if !ids.contains(dep) || *dep == stage.id {
                    tracing::warn!(
                        "{}: {} depends on {}, which is not another stage of the request",
                        self.pipeline,
                        stage.id,
                        dep,
                    );
                }
            }
        }

        Ok(PipelineRequest {
            pipeline: self.pipeline,
            stages: self.stages,
            _state: PhantomData,
        })
    }
}
