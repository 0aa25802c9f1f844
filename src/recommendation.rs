//! Recommendations
//!
//! Turns the winning candidate into per-package line items and an owned
//! [`SelectionResult`] that outlives the catalog it was computed from.

use std::io;

use rust_decimal::Decimal;
use serde::Serialize;
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};

use crate::{
    candidates::SelectionCandidate,
    catalog::FilteredCatalog,
    optimizer::OptimizerError,
    scoring::{CostEfficiency, ScoredCandidate},
};

/// Line items of a recommendation, one per distinct package.
pub type LineItems = SmallVec<[LineItem; 4]>;

/// One package line of a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    /// Package identifier
    pub identifier: String,

    /// Brand and labeler, or size and unit when unknown
    pub description: String,

    /// Number of packages to dispense
    pub count: u32,

    /// Units in each package
    pub quantity_per_package: u32,

    /// Units contributed by this line
    pub subtotal_units: u64,

    /// This line's share of the overfill, proportional to its subtotal
    pub overage_share: Decimal,

    /// Whether the package is still marketed
    pub active: bool,
}

/// Build one line item per distinct package of a candidate.
///
/// # Errors
///
/// Returns [`OptimizerError::InvariantViolation`] if the candidate has no lines,
/// dispenses zero packages on a line, or falls short of the target. These only
/// happen if search produced a malformed candidate.
pub fn format_line_items(
    candidate: &SelectionCandidate<'_>,
    target: u64,
) -> Result<LineItems, OptimizerError> {
    if candidate.lines().is_empty() {
        return Err(OptimizerError::InvariantViolation {
            message: "selected candidate has no lines",
        });
    }

    if candidate.lines().iter().any(|line| line.count == 0) {
        return Err(OptimizerError::InvariantViolation {
            message: "selected candidate has a line with no packages",
        });
    }

    if !candidate.meets(target) {
        return Err(OptimizerError::InvariantViolation {
            message: "selected candidate does not meet the target",
        });
    }

    let total = Decimal::from(candidate.total_units());
    let overfill = Decimal::from(candidate.overfill(target));

    Ok(candidate
        .lines()
        .iter()
        .map(|line| {
            let subtotal_units = line.subtotal();

            LineItem {
                identifier: line.package.identifier().to_string(),
                description: line.package.description(),
                count: line.count,
                quantity_per_package: line.package.quantity(),
                subtotal_units,
                overage_share: overfill * Decimal::from(subtotal_units) / total,
                active: line.package.is_active(),
            }
        })
        .collect())
}

/// The chosen package combination for a prescribed quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionResult {
    line_items: LineItems,
    unit: String,
    target: u64,
    total_units: u64,
    overfill: u64,
    overfill_percentage: Decimal,
    efficiency: Decimal,
    cost_efficiency: CostEfficiency,
    reasoning: String,
    score: Decimal,
    inactive_only: bool,
}

impl SelectionResult {
    /// Build a result from the winning candidate.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::InvariantViolation`] if the candidate is malformed.
    pub fn from_scored(
        scored: &ScoredCandidate<'_>,
        catalog: &FilteredCatalog<'_>,
    ) -> Result<Self, OptimizerError> {
        let line_items = format_line_items(&scored.candidate, scored.target)?;

        Ok(Self {
            line_items,
            unit: catalog.unit().to_string(),
            target: scored.target,
            total_units: scored.total_units,
            overfill: scored.overfill,
            overfill_percentage: scored.overfill_percentage,
            efficiency: scored.efficiency,
            cost_efficiency: scored.cost_efficiency,
            reasoning: reasoning(scored, catalog.unit(), catalog.inactive_only()),
            score: scored.score,
            inactive_only: catalog.inactive_only(),
        })
    }

    /// Line items, ascending by package size
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Unit of measure shared by every line
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Prescribed quantity
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Units dispensed
    pub fn total_units(&self) -> u64 {
        self.total_units
    }

    /// Units dispensed beyond the target
    pub fn overfill(&self) -> u64 {
        self.overfill
    }

    /// Overfill in percent points of the target
    pub fn overfill_percentage(&self) -> Decimal {
        self.overfill_percentage
    }

    /// Target over units dispensed, in percent points
    pub fn efficiency(&self) -> Decimal {
        self.efficiency
    }

    /// Cost efficiency classification
    pub fn cost_efficiency(&self) -> CostEfficiency {
        self.cost_efficiency
    }

    /// Human readable explanation of the selection
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Composite score of the winning candidate
    pub fn score(&self) -> Decimal {
        self.score
    }

    /// True when only inactive packages were available
    pub fn inactive_only(&self) -> bool {
        self.inactive_only
    }

    /// Total number of packages to dispense
    pub fn package_count(&self) -> u64 {
        self.line_items
            .iter()
            .map(|line| u64::from(line.count))
            .sum()
    }

    /// Renders the recommendation as a table followed by a summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        let mut builder = Builder::default();

        builder.push_record([
            "Package",
            "Description",
            "Count",
            "Per Package",
            "Subtotal",
            "Overage",
        ]);

        for line in &self.line_items {
            builder.push_record([
                line.identifier.clone(),
                line.description.clone(),
                line.count.to_string(),
                format!("{} {}", line.quantity_per_package, self.unit),
                format!("{} {}", line.subtotal_units, self.unit),
                format!("{:.2}", line.overage_share),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(2..6), Alignment::right());
        table.modify(Rows::first(), Alignment::center());

        writeln!(out, "\n{table}")?;
        writeln!(out, " Target:      {} {}", self.target, self.unit)?;
        writeln!(out, " Dispensed:   {} {}", self.total_units, self.unit)?;
        writeln!(
            out,
            " Overfill:    {} {} ({:.2}%)",
            self.overfill, self.unit, self.overfill_percentage
        )?;
        writeln!(
            out,
            " Efficiency:  {:.2}% ({})",
            self.efficiency, self.cost_efficiency
        )?;
        writeln!(out, "\n {}", self.reasoning)
    }
}

fn reasoning(scored: &ScoredCandidate<'_>, unit: &str, inactive_only: bool) -> String {
    let mut text = if scored.is_exact() && scored.candidate.package_count() == 1 {
        format!(
            "Exact match: a single {} {unit} package fulfils the prescribed quantity with no waste.",
            scored.total_units
        )
    } else {
        format!(
            "{} = {} {unit} for a prescribed {} {unit} ({}); overfill {} {unit} ({:.2}%), efficiency {:.2}% ({}).",
            scored.candidate,
            scored.total_units,
            scored.target,
            scored.candidate.source(),
            scored.overfill,
            scored.overfill_percentage,
            scored.efficiency,
            scored.cost_efficiency,
        )
    };

    if inactive_only {
        text.push_str(
            " Only inactive packages were available; confirm stock before dispensing.",
        );
    }

    text
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use testresult::TestResult;

    use super::*;
    use crate::{
        candidates::{CandidateLine, CandidateSource},
        catalog::filter,
        packages::PackageOption,
        scoring::score,
        search::SearchOptions,
    };

    #[test]
    fn line_items_split_overage_by_subtotal() -> TestResult {
        let thirty = PackageOption::new("a-30", 30, "TABLET")?.with_brand("Generic");
        let sixty = PackageOption::new("b-60", 60, "TABLET")?;

        let candidate = SelectionCandidate::new(
            smallvec![
                CandidateLine {
                    package: &thirty,
                    count: 1,
                },
                CandidateLine {
                    package: &sixty,
                    count: 1,
                },
            ],
            CandidateSource::MultiPackage,
        );

        let items = format_line_items(&candidate, 75)?;

        assert_eq!(items.len(), 2);

        let shares: Vec<Decimal> = items.iter().map(|item| item.overage_share).collect();

        assert_eq!(shares, vec![Decimal::from(5), Decimal::from(10)]);

        let descriptions: Vec<&str> = items
            .iter()
            .map(|item| item.description.as_str())
            .collect();

        assert_eq!(descriptions, vec!["Generic", "60 TABLET"]);

        Ok(())
    }

    #[test]
    fn empty_candidate_is_an_invariant_violation() {
        let candidate = SelectionCandidate::new(smallvec![], CandidateSource::MultiPackage);

        let result = format_line_items(&candidate, 10);

        assert!(matches!(
            result,
            Err(OptimizerError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn short_candidate_is_an_invariant_violation() -> TestResult {
        let thirty = PackageOption::new("a-30", 30, "TABLET")?;
        let candidate = SelectionCandidate::single(&thirty, 1, CandidateSource::RepeatedSingle);

        let result = format_line_items(&candidate, 31);

        assert!(matches!(
            result,
            Err(OptimizerError::InvariantViolation { .. })
        ));

        Ok(())
    }

    #[test]
    fn from_scored_copies_metrics_and_unit() -> TestResult {
        let catalog = [PackageOption::new("n-90", 90, "tablet")?];
        let filtered = filter(&catalog)?;

        let Some(&package) = filtered.packages().first() else {
            panic!("expected a package to survive filtering");
        };

        let candidate = SelectionCandidate::single(
            package,
            1,
            CandidateSource::ExactMatch,
        );
        let scored = score(candidate, 90, &SearchOptions::default());

        let result = SelectionResult::from_scored(&scored, &filtered)?;

        assert_eq!(result.unit(), "TABLET");
        assert_eq!(result.total_units(), 90);
        assert_eq!(result.overfill(), 0);
        assert_eq!(result.efficiency(), Decimal::from(100));
        assert_eq!(result.cost_efficiency(), CostEfficiency::Optimal);
        assert_eq!(result.package_count(), 1);
        assert!(result.reasoning().starts_with("Exact match"));
        assert!(!result.inactive_only());

        Ok(())
    }

    #[test]
    fn reasoning_mentions_inactive_fallback() -> TestResult {
        let catalog = [PackageOption::new("n-30", 30, "TABLET")?.with_active(false)];
        let filtered = filter(&catalog)?;

        let Some(&package) = filtered.packages().first() else {
            panic!("expected a package to survive filtering");
        };

        let candidate = SelectionCandidate::single(
            package,
            1,
            CandidateSource::SmallestSufficient,
        );
        let scored = score(candidate, 5, &SearchOptions::default());

        let result = SelectionResult::from_scored(&scored, &filtered)?;

        assert!(result.inactive_only());
        assert!(result.reasoning().contains("1 x 30 = 30 TABLET"));
        assert!(result.reasoning().contains("(500.00%)"));
        assert!(result.reasoning().contains("wasteful"));
        assert!(result.reasoning().contains("Only inactive packages"));

        Ok(())
    }

    #[test]
    fn write_to_renders_lines_and_summary() -> TestResult {
        let catalog = [
            PackageOption::new("00093-0058-01", 30, "TABLET")?.with_brand("Atorvastatin"),
            PackageOption::new("00093-0058-02", 60, "TABLET")?,
        ];
        let filtered = filter(&catalog)?;
        let packages = filtered.packages();

        let lines: Vec<CandidateLine<'_>> = packages
            .iter()
            .map(|&package| CandidateLine { package, count: 1 })
            .collect();

        let candidate =
            SelectionCandidate::new(lines.into_iter().collect(), CandidateSource::MultiPackage);
        let scored = score(candidate, 90, &SearchOptions::default());
        let result = SelectionResult::from_scored(&scored, &filtered)?;

        let mut out = Vec::new();
        result.write_to(&mut out)?;

        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("00093-0058-01"));
        assert!(rendered.contains("Atorvastatin"));
        assert!(rendered.contains("Dispensed:   90 TABLET"));
        assert!(rendered.contains("100.00% (optimal)"));

        Ok(())
    }

    #[test]
    fn serializes_for_export() -> TestResult {
        let catalog = [PackageOption::new("n-100", 100, "ML")?];
        let filtered = filter(&catalog)?;

        let Some(&package) = filtered.packages().first() else {
            panic!("expected a package to survive filtering");
        };

        let candidate = SelectionCandidate::single(
            package,
            2,
            CandidateSource::RepeatedSingle,
        );
        let scored = score(candidate, 150, &SearchOptions::default());
        let result = SelectionResult::from_scored(&scored, &filtered)?;

        let yaml = serde_norway::to_string(&result)?;

        assert!(yaml.contains("cost_efficiency: wasteful"));
        assert!(yaml.contains("unit: ML"));

        Ok(())
    }
}
