//! Request Fixtures

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, Request},
    search::{DEFAULT_MAX_PACKAGES, SearchOptions},
};

/// Wrapper for a request in YAML
#[derive(Debug, Deserialize)]
pub struct RequestsFixture {
    /// The prescription request
    pub request: RequestFixture,
}

/// Request fixture from YAML
#[derive(Debug, Deserialize)]
pub struct RequestFixture {
    /// Prescribed quantity
    pub quantity: i64,

    /// Maximum distinct package types per candidate
    #[serde(default = "default_max_packages")]
    pub max_packages: usize,

    /// Overfill bound (e.g. "50%" or "50")
    #[serde(default)]
    pub max_overfill: Option<String>,

    /// Penalise extra packages
    #[serde(default)]
    pub prefer_fewer_packages: bool,

    /// Percent points per extra package when fewer packages are preferred
    #[serde(default)]
    pub penalty_factor: Option<String>,
}

fn default_max_packages() -> usize {
    DEFAULT_MAX_PACKAGES
}

impl TryFrom<RequestFixture> for Request {
    type Error = FixtureError;

    fn try_from(fixture: RequestFixture) -> Result<Self, Self::Error> {
        let mut options = SearchOptions::default()
            .with_max_packages(fixture.max_packages)
            .with_prefer_fewer_packages(fixture.prefer_fewer_packages);

        if let Some(max_overfill) = fixture.max_overfill.as_deref() {
            options = options.with_max_overfill_percentage(parse_percentage(max_overfill)?);
        }

        if let Some(penalty_factor) = fixture.penalty_factor.as_deref() {
            options = options.with_penalty_factor(parse_percentage(penalty_factor)?);
        }

        Ok(Request {
            quantity: fixture.quantity,
            options,
        })
    }
}

/// Parse a percentage string into percent points (e.g., "15%" or "15" -> 15)
///
/// # Errors
///
/// Returns [`FixtureError::InvalidPercentage`] if the value is not a non-negative number.
pub fn parse_percentage(s: &str) -> Result<Decimal, FixtureError> {
    let trimmed = s.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();

    let value =
        Decimal::from_str(number).map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

    if value.is_sign_negative() {
        return Err(FixtureError::InvalidPercentage(s.to_string()));
    }

    Ok(value)
}
