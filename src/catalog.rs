//! Package Catalog Filtering
//!
//! Normalises a raw catalog to a single unit of measure before search so that,
//! for example, tablets are never combined with milliliters.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::warn;

use crate::{optimizer::OptimizerError, packages::PackageOption};

/// Packages that survived filtering, borrowed from the caller's catalog.
#[derive(Debug, Clone)]
pub struct FilteredCatalog<'a> {
    packages: SmallVec<[&'a PackageOption; 16]>,
    unit: &'a str,
    inactive_only: bool,
    source_size: usize,
}

impl<'a> FilteredCatalog<'a> {
    /// Iterate over the surviving packages in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &'a PackageOption> + '_ {
        self.packages.iter().copied()
    }

    /// Surviving packages in catalog order.
    pub fn packages(&self) -> &[&'a PackageOption] {
        &self.packages
    }

    /// The unit of measure every surviving package shares.
    pub fn unit(&self) -> &'a str {
        self.unit
    }

    /// True when no active package was available and inactive ones were kept instead.
    pub fn inactive_only(&self) -> bool {
        self.inactive_only
    }

    /// Number of packages in the catalog before filtering.
    pub fn source_size(&self) -> usize {
        self.source_size
    }

    /// Get the number of surviving packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Check if no packages survived.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Filter a catalog down to its majority unit of measure, preferring active packages.
///
/// When two units are equally frequent the lexicographically smaller one is kept.
///
/// # Errors
///
/// Returns [`OptimizerError::EmptyCatalog`] if the catalog has no packages.
pub fn filter(catalog: &[PackageOption]) -> Result<FilteredCatalog<'_>, OptimizerError> {
    let unit = majority_unit(catalog).ok_or(OptimizerError::EmptyCatalog { catalog_size: 0 })?;

    let same_unit = catalog.iter().filter(|package| package.unit() == unit);
    let has_active = same_unit.clone().any(PackageOption::is_active);

    let packages: SmallVec<[&PackageOption; 16]> = same_unit
        .filter(|package| !has_active || package.is_active())
        .collect();

    if !has_active {
        warn!(
            unit,
            packages = packages.len(),
            "no active packages available; falling back to inactive packages"
        );
    }

    Ok(FilteredCatalog {
        packages,
        unit,
        inactive_only: !has_active,
        source_size: catalog.len(),
    })
}

fn majority_unit(catalog: &[PackageOption]) -> Option<&str> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();

    for package in catalog {
        *counts.entry(package.unit()).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|(unit_a, count_a), (unit_b, count_b)| {
            count_a.cmp(count_b).then_with(|| unit_b.cmp(unit_a))
        })
        .map(|(unit, _count)| unit)
}
