// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for allocation and release on the ipu6ep catalog.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use psys_catalog::{CellType, ChannelKind, MemoryKind, PortKind};
use psys_engine::{Allocator, PipelineRequest, StageRequest, Validated};

fn camera_pipeline() -> PipelineRequest<Validated> {
    PipelineRequest::new(
        1,
        vec![
            StageRequest::new(0, CellType::AccIsa)
                .with_memory(MemoryKind::LbVmem, 0x80)
                .with_channel(ChannelKind::DmaIsa, 1),
            StageRequest::new(1, CellType::AccPsa)
                .with_memory(MemoryKind::TransferVmem0, 0x100)
                .with_port(PortKind::LbFull, 2),
            StageRequest::new(2, CellType::VectorProcessor)
                .with_memory(MemoryKind::Vmem, 0x200)
                .with_channel(ChannelKind::DmaInternal, 2),
            StageRequest::new(3, CellType::AccOsa)
                .with_memory(MemoryKind::TransferVmem1, 0x100),
        ],
    )
    .validate()
    .expect("benchmark request is valid")
}

fn bench_allocate_release(c: &mut Criterion) {
    let alloc = Allocator::from_generation("ipu6ep").expect("ipu6ep catalog");
    let request = camera_pipeline();
    c.bench_function("allocate_release_4_stages", |b| {
        b.iter(|| {
            let binding = alloc.allocate(black_box(&request)).expect("pool is idle");
            alloc.release(&binding).expect("binding is active");
        })
    });
}

fn bench_failed_allocation(c: &mut Criterion) {
    let alloc = Allocator::from_generation("ipu6ep").expect("ipu6ep catalog");
    let request = camera_pipeline();
    // Holds the only vector processor, so every further attempt rolls back
    // after its first two stages.
    let _held = alloc.acquire(&request).expect("pool is idle");
    c.bench_function("allocate_rollback", |b| {
        b.iter(|| {
            let err = alloc.allocate(black_box(&request));
            assert!(err.is_err());
        })
    });
}

criterion_group!(benches, bench_allocate_release, bench_failed_allocation);
criterion_main!(benches);
