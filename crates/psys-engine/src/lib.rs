// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # psys-engine
//!
//! The allocation engine that maps image-processing pipelines onto the
//! PSYS fabric.
//!
//! The engine takes:
//! - A [`Catalog`](psys_catalog::Catalog) from `psys-catalog`.
//! - A [`ResourcePool`](psys_pool::ResourcePool) from `psys-pool`, owned
//!   behind one lock.
//! - A validated [`PipelineRequest`] from the caller.
//!
//! And produces either a complete [`Binding`] or a typed
//! [`AllocationError`] with the pool untouched.
//!
//! # Type-State Pipeline
//! ```text
//! PipelineRequest<Unchecked> → PipelineRequest<Validated> → Binding → release
//! ```
//!
//! # Scoped Acquisition
//! [`Allocator::acquire`] returns a [`BindingGuard`] that releases the
//! binding on every exit path of its scope.

mod binding;
mod config;
mod engine;
mod error;
mod guard;
mod request;
mod stats;

pub use binding::{Binding, ChannelGrant, MemoryGrant, PortGrant, StageBinding};
pub use config::AllocatorConfig;
pub use engine::Allocator;
pub use error::AllocationError;
pub use guard::BindingGuard;
pub use request::{
    ChannelRequirement, MemoryRequirement, PipelineRequest, PortRequirement, RequestState,
    StageRequest, Unchecked, Validated,
};
pub use stats::AllocationStats;
