// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Turbo Eraser: paint a mask, get the region erased by a local image-edit
//! model after a short pause.

pub mod cli;
pub mod config;
pub mod driver;
pub mod editing;
pub mod image_io;
pub mod inference;
pub mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use config::EraserConfig;
pub use editing::{EditSession, SessionStatus, SessionUpdate};
pub use inference::{HttpInferenceClient, InferenceBackend, InferenceOutcome, InferenceRequest};

/// Entry point for the command line tool
pub fn run() -> anyhow::Result<()> {
    let args = cli::CliArgs::parse();

    // RUST_LOG wins when set
    let default_filter = if args.verbose {
        "turbo_eraser=debug"
    } else {
        "turbo_eraser=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    cli::run(args)
}
