// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Allocator configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! generation = "ipu6ep"
//! catalog_path = "./catalogs/lab.json"   # optional, overrides `generation`
//! panic_on_double_release = false
//! ```

use crate::AllocationError;
use psys_catalog::{Catalog, CatalogManifest};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration for the allocator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AllocatorConfig {
    /// Built-in generation identifier.
    #[serde(default = "default_generation")]
    pub generation: String,
    /// JSON catalog manifest. Takes precedence over `generation`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    /// Whether releasing an already-released binding aborts the process
    /// instead of returning an error.
    #[serde(default)]
    pub panic_on_double_release: bool,
}

fn default_generation() -> String {
    "ipu6ep".to_string()
}

impl AllocatorConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, AllocationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AllocationError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, AllocationError> {
        toml::from_str(toml_str)
            .map_err(|e| AllocationError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, AllocationError> {
        toml::to_string_pretty(self)
            .map_err(|e| AllocationError::Config(format!("TOML serialise error: {e}")))
    }

    /// Loads the catalog this configuration names.
    pub fn load_catalog(&self) -> Result<Arc<Catalog>, AllocationError> {
        let catalog = match &self.catalog_path {
            Some(path) => {
                tracing::info!("loading catalog manifest '{}'", path.display());
                CatalogManifest::from_file(path)?.into_catalog()?
            }
            None => Catalog::load(&self.generation)?,
        };
        Ok(Arc::new(catalog))
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            generation: default_generation(),
            catalog_path: None,
            panic_on_double_release: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = AllocatorConfig::default();
        assert_eq!(c.generation, "ipu6ep");
        assert!(c.catalog_path.is_none());
        assert!(!c.panic_on_double_release);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
generation = "IPU6EP"
catalog_path = "/tmp/lab.json"
panic_on_double_release = true
"#;
        let c = AllocatorConfig::from_toml(toml).unwrap();
        assert_eq!(c.generation, "IPU6EP");
        assert_eq!(c.catalog_path, Some(PathBuf::from("/tmp/lab.json")));
        assert!(c.panic_on_double_release);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(AllocatorConfig::from_toml("").unwrap(), AllocatorConfig::default());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = AllocatorConfig {
            panic_on_double_release: true,
            ..Default::default()
        };
        let back = AllocatorConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_load_builtin_catalog() {
        let c = AllocatorConfig::default();
        assert_eq!(c.load_catalog().unwrap().num_cells(), 29);
    }

    #[test]
    fn test_unknown_generation() {
        let c = AllocatorConfig {
            generation: "ipu99".into(),
            ..Default::default()
        };
        assert!(matches!(c.load_catalog(), Err(AllocationError::Catalog(_))));
    }

    #[test]
    fn test_load_manifest_catalog() {
        let path = std::env::temp_dir().join("psys_engine_config_manifest.json");
        std::fs::write(
            &path,
            r#"{ "generation": "lab", "cells": [{ "name": "g", "type": "gdc" }] }"#,
        )
        .unwrap();
        let c = AllocatorConfig {
            catalog_path: Some(path.clone()),
            ..Default::default()
        };
        let catalog = c.load_catalog().unwrap();
        assert_eq!(catalog.generation(), "lab");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            AllocatorConfig::from_toml("generation = ["),
            Err(AllocationError::Config(_))
        ));
    }
}
