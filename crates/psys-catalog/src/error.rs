// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for catalog loading and construction.

/// Errors that can occur when loading or building a capability catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The chip generation identifier is not one of the built-in tables.
    #[error("unknown chip generation '{0}'")]
    UnknownGeneration(String),

    /// The catalog description violates a structural invariant.
    #[error("invalid catalog '{generation}': {detail}")]
    InvalidCatalog { generation: String, detail: String },

    /// A resource kind name could not be parsed.
    #[error("unknown {kind} '{value}'")]
    UnknownKind { kind: &'static str, value: String },

    /// The catalog manifest file could not be read.
    #[error("failed to read catalog manifest: {0}")]
    ManifestRead(#[from] std::io::Error),

    /// The catalog manifest JSON is malformed.
    #[error("failed to parse catalog manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),
}

impl CatalogError {
    pub(crate) fn invalid(generation: &str, detail: impl Into<String>) -> Self {
        Self::InvalidCatalog {
            generation: generation.to_string(),
            detail: detail.into(),
        }
    }
}
