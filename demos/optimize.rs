//! Package Selection Example
//!
//! Loads a catalog and prescription request and prints the recommended packages.
//!
//! Use `-f` to load a fixture set by name
//! Use `-t` to override the prescribed quantity
//! Use `--trace` to list every candidate the search produced
//!
//! Run with: `cargo run --example optimize -- -f amoxicillin`

use std::{io, io::Write, time::Instant};

use anyhow::Result;
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing_subscriber::EnvFilter;

use packsize::{
    fixtures::Fixture, optimizer::heuristic::HeuristicOptimizer, search::CandidateLog,
    utils::ExampleArgs,
};

/// Package Selection Example
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = ExampleArgs::parse();

    let fixture = Fixture::from_set(&args.fixture)?;
    let options = args.apply(fixture.options())?;
    let target = match args.target {
        Some(target) => target,
        None => fixture.quantity()?,
    };

    let mut log = CandidateLog::new();

    let start = Instant::now();
    let result =
        HeuristicOptimizer::optimize_with_observer(target, fixture.packages(), &options, &mut log);
    let elapsed = start.elapsed();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if let Some(name) = fixture.name() {
        writeln!(handle, "\n {name}")?;
    }

    if args.trace {
        writeln!(handle, "\n Candidates:")?;

        for entry in log.entries() {
            match entry.rejected_overfill {
                Some(overfill) => writeln!(
                    handle,
                    "  {} = {} ({}, rejected at {}% overfill)",
                    entry.breakdown,
                    entry.total_units,
                    entry.source,
                    overfill.round_dp(2)
                )?,
                None => writeln!(
                    handle,
                    "  {} = {} ({})",
                    entry.breakdown, entry.total_units, entry.source
                )?,
            }
        }
    }

    result?.write_to(&mut handle)?;

    writeln!(
        handle,
        " {} ({}s)",
        elapsed.human(Truncate::Nano),
        elapsed.as_secs_f32()
    )?;

    Ok(())
}
