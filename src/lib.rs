// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava-ELT: weekly load of Strava activities into Redshift
//!
//! Each pipeline step (extract, stage, validate, merge, build-model) is a
//! subcommand of the `strava-elt` binary so an external scheduler can run
//! them as separate shell tasks.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod time_utils;
