//! Utils

use clap::Parser;

use crate::{
    fixtures::{FixtureError, parse_percentage},
    search::SearchOptions,
};

/// Arguments for the optimize example
#[derive(Debug, Parser)]
pub struct ExampleArgs {
    /// Fixture set to use for the catalog & request
    #[clap(short, long, default_value = "atorvastatin")]
    pub fixture: String,

    /// Override the prescribed quantity
    #[clap(short, long, allow_negative_numbers = true)]
    pub target: Option<i64>,

    /// Override the maximum number of distinct package types
    #[clap(short, long)]
    pub max_packages: Option<usize>,

    /// Override the overfill bound (e.g. "50%")
    #[clap(short = 'o', long)]
    pub max_overfill: Option<String>,

    /// Penalise every package beyond the first
    #[clap(short, long)]
    pub prefer_fewer: bool,

    /// Print every candidate the search produced
    #[clap(long)]
    pub trace: bool,
}

impl ExampleArgs {
    /// Apply command line overrides on top of the fixture's options.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidPercentage`] if `--max-overfill` is not a percentage.
    pub fn apply(&self, mut options: SearchOptions) -> Result<SearchOptions, FixtureError> {
        if let Some(max_packages) = self.max_packages {
            options = options.with_max_packages(max_packages);
        }

        if let Some(max_overfill) = self.max_overfill.as_deref() {
            options = options.with_max_overfill_percentage(parse_percentage(max_overfill)?);
        }

        if self.prefer_fewer {
            options = options.with_prefer_fewer_packages(true);
        }

        Ok(options)
    }
}
