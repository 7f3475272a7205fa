// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `psys generations` command: list the built-in chip generations.

use psys_catalog::Generation;

pub fn execute() -> anyhow::Result<()> {
    for generation in Generation::ALL {
        let catalog = generation.catalog()?;
        println!("  {:<10} {}", generation.id(), catalog.summary());
    }
    Ok(())
}
