// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `psys inspect` command: display a capability catalog.
//!
//! Prints every cell slot with the memory bank it reaches for each kind,
//! followed by the banks, DMA channels and DFM ports.

use psys_catalog::{CatalogManifest, MemoryKind};
use psys_engine::AllocatorConfig;

pub fn execute(config: &AllocatorConfig, json: bool) -> anyhow::Result<()> {
    let catalog = config.load_catalog()?;

    if json {
        println!("{}", CatalogManifest::from_catalog(&catalog).to_json()?);
        return Ok(());
    }

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              psys · Capability Catalog               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  {}", catalog.summary());
    println!();

    // ── Cells and affinity ─────────────────────────────────────
    let header: Vec<String> = MemoryKind::ALL
        .iter()
        .map(|k| format!("{:>14}", k.as_str()))
        .collect();
    println!("  {:<4} {:<20} {:<16} {}", "Idx", "Cell", "Type", header.join(""));
    println!("  {}", "-".repeat(42 + 14 * MemoryKind::COUNT));

    for (id, cell) in catalog.cells() {
        let row: Vec<String> = catalog
            .affinity_row(id)
            .into_iter()
            .map(|(_, mem)| {
                let name = mem
                    .and_then(|m| catalog.memory(m))
                    .map_or("·", |m| m.name.as_str());
                format!("{name:>14}")
            })
            .collect();
        println!(
            "  {:<4} {:<20} {:<16} {}",
            id.raw(),
            cell.name,
            cell.cell_type.as_str(),
            row.join(""),
        );
    }
    println!();

    // ── Memory banks ───────────────────────────────────────────
    println!("  Memory banks");
    for (id, mem) in catalog.memories() {
        println!(
            "   {:<4} {:<16} {:<16} {:>8} units",
            id.raw(),
            mem.name,
            mem.kind.as_str(),
            mem.capacity,
        );
    }
    println!();

    // ── Transfer resources ─────────────────────────────────────
    println!("  DMA channels");
    for (kind, capacity) in catalog.channels() {
        println!("   {:<16} {:>4}", kind.as_str(), capacity);
    }
    println!();

    println!("  DFM ports");
    for (kind, capacity) in catalog.ports() {
        println!("   {:<16} {:>4}", kind.as_str(), capacity);
    }
    println!();
    Ok(())
}
