// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the vlpset command-line interface.
//!
//! Four subcommands: `inspect` to examine a `.vlpset` or `.pset` file,
//! `build` to turn a list of fragments or hex prefixes into a table, `lookup`
//! to check URLs against a table, and `migrate` to rewrite a legacy table in
//! the current format.

pub mod display;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vlpset",
    about = "Build, inspect and query variable-length hash-prefix sets",
    version
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect a .vlpset or .pset file
    Inspect {
        /// Path to the file
        file: PathBuf,

        /// Print a JSON report instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Build a table from fragments or hex prefixes and write it
    Build {
        /// Directory holding the table files
        #[arg(short, long)]
        dir: PathBuf,

        /// Table name, e.g. goog-phish-proto
        #[arg(short, long)]
        table: String,

        /// Newline-separated input (stdin if omitted)
        ///
        /// Empty lines and lines starting with '#' are skipped.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Prefix length in bytes for hashed fragments (4..=32)
        #[arg(short, long, default_value = "4", conflicts_with = "hex")]
        length: usize,

        /// Input lines are hex-encoded prefixes, not fragments
        #[arg(long)]
        hex: bool,
    },

    /// Check URL specs (host/path?query) against a table
    Lookup {
        /// Directory holding the table files
        #[arg(short, long)]
        dir: PathBuf,

        /// Table name
        #[arg(short, long)]
        table: String,

        /// Canonicalized URL specs to check
        #[arg(required = true)]
        specs: Vec<String>,

        /// Print a JSON report instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a legacy .pset table as .vlpset
    Migrate {
        /// Directory holding the table files
        #[arg(short, long)]
        dir: PathBuf,

        /// Table name
        #[arg(short, long)]
        table: String,
    },
}
