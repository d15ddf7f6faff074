// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava-ELT pipeline steps.

use clap::Parser;
use std::process;
use strava_elt::{cli, config, logging};

#[tokio::main]
async fn main() {
    config::load_dotenv();
    logging::init_logging();

    let cli = cli::Cli::parse();

    match cli::run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "Pipeline step failed");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
