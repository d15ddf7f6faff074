// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Standalone data-quality check.
//!
//! `validator <script1.sql> <script2.sql> <operator> <severity>`
//!
//! Exit codes: 0 on success or a non-halting failure, 1 on a failed `halt`
//! check, -1 on bad arguments, 0 after `-h`.

use std::process;
use strava_elt::cli::{self, ValidatorInvocation, EXIT_BAD_ARGS};
use strava_elt::{config, logging};

#[tokio::main]
async fn main() {
    config::load_dotenv();
    logging::init_logging();

    let check = match cli::parse_validator_args(std::env::args_os()) {
        ValidatorInvocation::Run(check) => check,
        ValidatorInvocation::Help(help) => {
            println!("{}", help);
            process::exit(0);
        }
        ValidatorInvocation::Usage(usage) => {
            eprintln!("{}", usage);
            process::exit(EXIT_BAD_ARGS);
        }
    };

    match cli::validate(check).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "Validation failed to run");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
