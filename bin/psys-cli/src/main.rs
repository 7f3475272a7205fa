// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # psys
//!
//! Command-line interface for the PSYS resource allocator.
//!
//! ## Usage
//! ```bash
//! # List built-in chip generations
//! psys generations
//!
//! # Inspect a generation's capability catalog
//! psys inspect --generation ipu6ep
//!
//! # Try a pipeline request against an idle pool
//! psys allocate --request ./pipelines/camera.json --json
//! ```

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "psys",
    about = "Resource allocator for the PSYS image-processing fabric",
    version,
    author
)]
struct Cli {
    /// Path to a TOML allocator configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where the capability catalog comes from. Overrides the config file.
#[derive(Args, Debug, Default)]
pub struct CatalogSource {
    /// Built-in generation identifier (e.g., "ipu6ep").
    #[arg(short, long, conflicts_with = "catalog")]
    pub generation: Option<String>,

    /// JSON catalog manifest for a generation that is not built in.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in chip generations.
    Generations,

    /// Print a capability catalog: cells, memory banks, affinity, channels and ports.
    Inspect {
        #[command(flatten)]
        source: CatalogSource,

        /// Print the catalog as a JSON manifest instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// Allocate a pipeline request against an idle pool and report the binding.
    Allocate {
        /// Path to the JSON pipeline request.
        #[arg(short, long)]
        request: PathBuf,

        #[command(flatten)]
        source: CatalogSource,

        /// Print the binding as JSON instead of tables.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Generations => commands::generations::execute(),
        Commands::Inspect { source, json } => {
            let config = commands::resolve_config(cli.config.as_deref(), source)?;
            commands::inspect::execute(&config, json)
        }
        Commands::Allocate {
            request,
            source,
            json,
        } => {
            let config = commands::resolve_config(cli.config.as_deref(), source)?;
            commands::allocate::execute(&config, &request, json)
        }
    }
}
