// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

pub mod allocate;
pub mod generations;
pub mod inspect;

use crate::CatalogSource;
use anyhow::Context;
use psys_engine::AllocatorConfig;
use std::path::Path;
use tracing::Level;

/// Installs the fmt subscriber. `-v` enables info, `-vv` debug, `-vvv` trace.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the allocator configuration: config file first, then flags.
pub fn resolve_config(
    config_path: Option<&Path>,
    source: CatalogSource,
) -> anyhow::Result<AllocatorConfig> {
    let mut config = match config_path {
        Some(path) => AllocatorConfig::from_file(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => AllocatorConfig::default(),
    };

    if let Some(generation) = source.generation {
        config.generation = generation;
        config.catalog_path = None;
    }
    if let Some(catalog) = source.catalog {
        config.catalog_path = Some(catalog);
    }
    Ok(config)
}

/// Renders a fixed-width occupancy bar.
pub fn usage_bar(ratio: f64) -> String {
    let filled = (ratio * 20.0).round() as usize;
    let filled = filled.min(20);
    let empty = 20 - filled;
    let symbol = if ratio >= 0.9 {
        "#"
    } else if ratio >= 0.7 {
        "="
    } else {
        "-"
    };
    format!("[{}{}]", symbol.repeat(filled), ".".repeat(empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_usage_bar() {
        assert_eq!(usage_bar(0.0), format!("[{}]", ".".repeat(20)));
        assert_eq!(usage_bar(1.0), format!("[{}]", "#".repeat(20)));
        assert_eq!(usage_bar(0.5), format!("[{}{}]", "-".repeat(10), ".".repeat(10)));
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = resolve_config(
            None,
            CatalogSource {
                generation: None,
                catalog: Some(PathBuf::from("lab.json")),
            },
        )
        .unwrap();
        assert_eq!(config.catalog_path, Some(PathBuf::from("lab.json")));

        let config = resolve_config(
            None,
            CatalogSource {
                generation: Some("ipu6ep".into()),
                catalog: None,
            },
        )
        .unwrap();
        assert_eq!(config.generation, "ipu6ep");
        assert!(config.catalog_path.is_none());
    }
}
