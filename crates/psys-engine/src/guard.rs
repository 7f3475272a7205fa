// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII binding guard that returns resources to the pool on drop.
//!
//! [`BindingGuard`] ties a binding's lifetime to a scope. Every exit path
//! of that scope, early returns and `?` included, releases the binding
//! exactly once. Once the guard is moved into [`BindingGuard::release`]
//! or [`BindingGuard::into_binding`] the borrow checker rejects any
//! further use of it.

use crate::engine::AllocatorInner;
use crate::{AllocationError, Binding};
use std::ops::Deref;
use std::sync::Arc;

/// A binding that is released when the guard goes out of scope.
///
/// # Example
/// ```
/// use psys_catalog::CellType;
/// use psys_engine::{Allocator, PipelineRequest, StageRequest};
///
/// let allocator = Allocator::from_generation("ipu6ep").unwrap();
/// let request = PipelineRequest::new(1, vec![StageRequest::new(0, CellType::Gdc)])
///     .validate()
///     .unwrap();
///
/// {
///     let guard = allocator.acquire(&request).unwrap();
///     assert_eq!(guard.num_stages(), 1);
/// } // released here
///
/// assert!(allocator.snapshot().unwrap().is_idle());
/// ```
pub struct BindingGuard {
    /// `None` once released or handed back to the caller.
    binding: Option<Binding>,
    allocator: Arc<AllocatorInner>,
}

impl BindingGuard {
    pub(crate) fn new(binding: Binding, allocator: Arc<AllocatorInner>) -> Self {
        Self {
            binding: Some(binding),
            allocator,
        }
    }

    /// Returns the guarded binding.
    pub fn binding(&self) -> &Binding {
        self.binding.as_ref().expect("binding already consumed")
    }

    /// Releases the binding now and reports the outcome.
    pub fn release(mut self) -> Result<(), AllocationError> {
        match self.binding.take() {
            Some(binding) => self.allocator.release(binding.id(), true),
            None => Ok(()),
        }
    }

    /// Disarms the guard and hands the binding back for manual release.
    pub fn into_binding(mut self) -> Binding {
        self.binding.take().expect("binding already consumed")
    }
}

impl Deref for BindingGuard {
    type Target = Binding;

    fn deref(&self) -> &Binding {
        self.binding()
    }
}

impl Drop for BindingGuard {
    fn drop(&mut self) {
        if let Some(binding) = self.binding.take() {
            if let Err(e) = self.allocator.release(binding.id(), false) {
                tracing::error!("release of {} on drop failed: {e}", binding.id());
            }
        }
    }
}

impl std::fmt::Debug for BindingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingGuard")
            .field("binding", &self.binding.as_ref().map(Binding::id))
            .field("armed", &self.binding.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{AllocationError, Allocator, PipelineRequest, StageRequest};
    use psys_catalog::{CellType, MemoryKind};

    fn setup() -> (Allocator, PipelineRequest<crate::Validated>) {
        let alloc = Allocator::from_generation("ipu6ep").unwrap();
        let req = PipelineRequest::new(
            3,
            vec![StageRequest::new(0, CellType::VectorProcessor).with_memory(MemoryKind::Vmem, 64)],
        )
        .validate()
        .unwrap();
        (alloc, req)
    }

    #[test]
    fn test_drop_releases() {
        let (alloc, req) = setup();
        let id = {
            let guard = alloc.acquire(&req).unwrap();
            assert!(alloc.is_active(guard.id()).unwrap());
            guard.id()
        };
        assert!(!alloc.is_active(id).unwrap());
        assert!(alloc.snapshot().unwrap().is_idle());
    }

    #[test]
    fn test_early_return_releases() {
        let (alloc, req) = setup();
        fn fails_midway(alloc: &Allocator, req: &PipelineRequest<crate::Validated>) -> Result<(), AllocationError> {
            let _guard = alloc.acquire(req)?;
            Err(AllocationError::InvalidRequest("downstream failure".into()))
        }
        assert!(fails_midway(&alloc, &req).is_err());
        assert!(alloc.snapshot().unwrap().is_idle());
    }

    #[test]
    fn test_explicit_release() {
        let (alloc, req) = setup();
        let guard = alloc.acquire(&req).unwrap();
        guard.release().unwrap();
        assert!(alloc.snapshot().unwrap().is_idle());
        assert_eq!(alloc.stats().unwrap().releases, 1);
    }

    #[test]
    fn test_into_binding_disarms() {
        let (alloc, req) = setup();
        let binding = alloc.acquire(&req).unwrap().into_binding();
        assert!(alloc.is_active(binding.id()).unwrap());
        alloc.release(&binding).unwrap();
        assert!(alloc.snapshot().unwrap().is_idle());
    }

    #[test]
    fn test_drop_after_manual_release_is_logged_not_fatal() {
        let (alloc, req) = setup();
        let guard = alloc.acquire(&req).unwrap();
        alloc.release(guard.binding()).unwrap();
        drop(guard);
        assert_eq!(alloc.stats().unwrap().double_releases, 1);
    }
}
