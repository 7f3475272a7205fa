// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `psys allocate` command: dry-run a pipeline request.
//!
//! Allocates the request against an idle pool built from the selected
//! catalog, prints the binding and the resulting occupancy, then releases
//! the binding and checks that the pool is idle again.

use super::usage_bar;
use anyhow::Context;
use psys_engine::{Allocator, AllocatorConfig, PipelineRequest};
use std::path::Path;

pub fn execute(config: &AllocatorConfig, request: &Path, json: bool) -> anyhow::Result<()> {
    let request = PipelineRequest::from_file(request)
        .with_context(|| format!("failed to load request '{}'", request.display()))?
        .validate()?;
    tracing::info!("{}", request.summary());

    let allocator = Allocator::from_config(config)?;
    let guard = allocator.acquire(&request).with_context(|| {
        format!(
            "{} cannot be placed on '{}'",
            request.pipeline(),
            allocator.catalog().generation(),
        )
    })?;

    if json {
        println!("{}", guard.to_json()?);
    } else {
        print_binding(&allocator, &guard)?;
    }

    guard.release()?;
    anyhow::ensure!(
        allocator.snapshot()?.is_idle(),
        "pool not idle after release"
    );
    Ok(())
}

fn print_binding(allocator: &Allocator, binding: &psys_engine::Binding) -> anyhow::Result<()> {
    let catalog = allocator.catalog();

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║                psys · Pipeline Binding               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  {} → {} on '{}'", binding.pipeline(), binding.id(), catalog.generation());
    println!();

    // ── Stages ─────────────────────────────────────────────────
    for stage in binding.stages() {
        let cell = catalog
            .cell(stage.cell)
            .map_or("?", |c| c.name.as_str());
        println!("  {:<9} {:<20} ({})", stage.stage.to_string(), cell, stage.cell_type);
        for grant in &stage.memory {
            let bank = catalog
                .memory(grant.memory)
                .map_or("?", |m| m.name.as_str());
            println!("   memory   {:<16} {:>8} on {bank}", grant.kind.as_str(), grant.amount);
        }
        for grant in &stage.channels {
            println!("   channel  {:<16} {:>8}", grant.kind.as_str(), grant.amount);
        }
        for grant in &stage.ports {
            println!("   port     {:<16} {:>8}", grant.kind.as_str(), grant.amount);
        }
    }
    println!();

    // ── Occupancy ──────────────────────────────────────────────
    let usage = allocator.usage()?;
    println!(
        "  Cells held:   {} / {}",
        usage.cells_held(),
        usage.cells.len(),
    );
    println!("  Memory");
    for mem in usage.memories.iter().filter(|m| m.used > 0) {
        println!(
            "   {:<16} {:>6} / {:<6} {}",
            mem.name,
            mem.used,
            mem.capacity,
            usage_bar(mem.utilisation()),
        );
    }
    for (label, rows) in [("Channels", &usage.channels), ("Ports", &usage.ports)] {
        let busy: Vec<_> = rows.iter().filter(|r| r.used > 0).collect();
        if busy.is_empty() {
            continue;
        }
        println!("  {label}");
        for r in busy {
            println!(
                "   {:<16} {:>6} / {:<6} {}",
                r.name,
                r.used,
                r.capacity,
                usage_bar(r.utilisation()),
            );
        }
    }
    println!();
    Ok(())
}
