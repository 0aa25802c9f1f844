//! Candidate Scoring
//!
//! Efficiency and overfill are expressed in percent points as exact decimals so
//! that ranking is a total order and identical inputs always pick the same winner.

use std::{cmp::Ordering, fmt};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{candidates::SelectionCandidate, optimizer::OptimizerError, search::SearchOptions};

/// Efficiency at or above which a selection is `optimal`, in percent points.
pub const OPTIMAL_THRESHOLD: Decimal = Decimal::from_parts(95, 0, 0, false, 0);

/// Efficiency at or above which a selection is `acceptable`, in percent points.
pub const ACCEPTABLE_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// Penalty per extra package applied to every candidate, in percent points.
///
/// Small enough to only separate candidates whose efficiency is practically equal.
pub const BASE_PACKAGE_PENALTY: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Cost efficiency classification of a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CostEfficiency {
    /// Efficiency of at least 95%
    Optimal,

    /// Efficiency of at least 80% and below 95%
    Acceptable,

    /// Efficiency below 80%
    Wasteful,
}

impl CostEfficiency {
    /// Classify an efficiency given in percent points.
    pub fn from_efficiency(efficiency: Decimal) -> Self {
        if efficiency >= OPTIMAL_THRESHOLD {
            CostEfficiency::Optimal
        } else if efficiency >= ACCEPTABLE_THRESHOLD {
            CostEfficiency::Acceptable
        } else {
            CostEfficiency::Wasteful
        }
    }
}

impl fmt::Display for CostEfficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CostEfficiency::Optimal => "optimal",
            CostEfficiency::Acceptable => "acceptable",
            CostEfficiency::Wasteful => "wasteful",
        };

        f.write_str(label)
    }
}

/// Overfill as percent points of the target.
pub fn overfill_percentage(overfill: u64, target: u64) -> Decimal {
    if target == 0 {
        return Decimal::ZERO;
    }

    Decimal::from(overfill) * Decimal::ONE_HUNDRED / Decimal::from(target)
}

/// Efficiency (target over units dispensed) as percent points.
pub fn efficiency(target: u64, total_units: u64) -> Decimal {
    if total_units == 0 {
        return Decimal::ZERO;
    }

    Decimal::from(target) * Decimal::ONE_HUNDRED / Decimal::from(total_units)
}

/// A candidate together with its derived metrics and composite score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate<'a> {
    /// The scored candidate
    pub candidate: SelectionCandidate<'a>,

    /// Prescribed quantity
    pub target: u64,

    /// Units dispensed
    pub total_units: u64,

    /// Units dispensed beyond the target
    pub overfill: u64,

    /// Overfill in percent points of the target
    pub overfill_percentage: Decimal,

    /// Target over units dispensed, in percent points
    pub efficiency: Decimal,

    /// Classification derived from `efficiency`
    pub cost_efficiency: CostEfficiency,

    /// Composite score, higher is better
    pub score: Decimal,
}

impl ScoredCandidate<'_> {
    /// Whether the candidate dispenses exactly the target.
    pub fn is_exact(&self) -> bool {
        self.overfill == 0
    }

    /// Ranking used to select the best candidate; `Less` means `self` is preferred.
    ///
    /// Exact matches come first, then higher scores, then fewer distinct packages,
    /// then fewer packages overall, then the smallest identifiers.
    pub fn rank(&self, other: &Self) -> Ordering {
        other
            .is_exact()
            .cmp(&self.is_exact())
            .then_with(|| other.score.cmp(&self.score))
            .then_with(|| {
                self.candidate
                    .distinct_packages()
                    .cmp(&other.candidate.distinct_packages())
            })
            .then_with(|| {
                self.candidate
                    .package_count()
                    .cmp(&other.candidate.package_count())
            })
            .then_with(|| {
                self.candidate
                    .sorted_identifiers()
                    .cmp(&other.candidate.sorted_identifiers())
            })
    }
}

/// Score a candidate against the target quantity.
///
/// The score is the efficiency minus a penalty for every package beyond the
/// first. The penalty is `options.penalty_factor` (never below zero) when fewer
/// packages are preferred and [`BASE_PACKAGE_PENALTY`] otherwise.
pub fn score<'a>(
    candidate: SelectionCandidate<'a>,
    target: u64,
    options: &SearchOptions,
) -> ScoredCandidate<'a> {
    let total_units = candidate.total_units();
    let overfill = candidate.overfill(target);
    let efficiency = efficiency(target, total_units);

    let penalty = if options.prefer_fewer_packages {
        options.penalty_factor.max(Decimal::ZERO)
    } else {
        BASE_PACKAGE_PENALTY
    };

    let extra_packages = Decimal::from(candidate.package_count().saturating_sub(1));

    ScoredCandidate {
        candidate,
        target,
        total_units,
        overfill,
        overfill_percentage: overfill_percentage(overfill, target),
        efficiency,
        cost_efficiency: CostEfficiency::from_efficiency(efficiency),
        score: efficiency - penalty * extra_packages,
    }
}

/// Score every candidate.
pub fn score_all<'a>(
    candidates: Vec<SelectionCandidate<'a>>,
    target: u64,
    options: &SearchOptions,
) -> Vec<ScoredCandidate<'a>> {
    candidates
        .into_iter()
        .map(|candidate| score(candidate, target, options))
        .collect()
}

/// Select the best scored candidate.
///
/// # Errors
///
/// Returns [`OptimizerError::NoFeasibleCombination`] if there are no candidates.
pub fn select_best(
    candidates: Vec<ScoredCandidate<'_>>,
    target: u64,
) -> Result<ScoredCandidate<'_>, OptimizerError> {
    candidates
        .into_iter()
        .min_by(ScoredCandidate::rank)
        .ok_or(OptimizerError::NoFeasibleCombination {
            target,
            explored: 0,
            max_overfill_percentage: None,
            closest_overfill_percentage: None,
        })
}
