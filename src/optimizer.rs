//! Optimizers

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{packages::PackageOption, recommendation::SelectionResult, search::SearchOptions};

pub mod heuristic;

/// Optimizer Errors
///
/// Every error is terminal for a single call. Callers decide whether to retry
/// with relaxed [`SearchOptions`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptimizerError {
    /// The prescribed quantity is zero, negative, or larger than [`MAX_TARGET`](crate::search::MAX_TARGET).
    #[error("prescribed quantity must be between 1 and {}, got {target}", crate::search::MAX_TARGET)]
    InvalidQuantity {
        /// Requested quantity
        target: i64,
    },

    /// No packages were supplied, or none survived filtering.
    #[error("package catalog is empty (received {catalog_size} packages)")]
    EmptyCatalog {
        /// Number of packages in the catalog before filtering
        catalog_size: usize,
    },

    /// Every explored candidate was infeasible or exceeded the overfill bound.
    #[error(
        "no feasible package combination for {target} units after exploring {explored} candidates (overfill bound: {}, closest: {})",
        display_percentage(.max_overfill_percentage.as_ref()),
        display_percentage(.closest_overfill_percentage.as_ref())
    )]
    NoFeasibleCombination {
        /// Requested quantity
        target: u64,

        /// Number of undominated candidates the overfill bound was applied to
        explored: usize,

        /// Overfill bound that rejected the candidates, in percent points
        max_overfill_percentage: Option<Decimal>,

        /// Smallest overfill seen across the rejected candidates, in percent points
        closest_overfill_percentage: Option<Decimal>,
    },

    /// Internal optimizer invariant was violated (this is a bug).
    #[error("optimizer invariant violated: {message}")]
    InvariantViolation {
        /// What invariant was violated
        message: &'static str,
    },
}

fn display_percentage(value: Option<&Decimal>) -> String {
    value.map_or_else(|| "none".to_string(), |pct| format!("{}%", pct.round_dp(2)))
}

/// Trait for selecting a package combination for a prescribed quantity
pub trait Optimizer {
    /// Select the package combination that best fulfils `target` units.
    ///
    /// # Errors
    ///
    /// Returns an [`OptimizerError`] if the quantity is invalid, the catalog is
    /// empty, or no combination satisfies the options.
    fn optimize(
        target: i64,
        catalog: &[PackageOption],
        options: &SearchOptions,
    ) -> Result<SelectionResult, OptimizerError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn no_feasible_combination_message_includes_bounds() {
        let err = OptimizerError::NoFeasibleCombination {
            target: 5,
            explored: 3,
            max_overfill_percentage: Some(Decimal::from(50)),
            closest_overfill_percentage: Some(Decimal::from(500)),
        };

        assert_eq!(
            err.to_string(),
            "no feasible package combination for 5 units after exploring 3 candidates (overfill bound: 50%, closest: 500%)"
        );
    }

    #[test]
    fn no_feasible_combination_message_without_bounds() {
        let err = OptimizerError::NoFeasibleCombination {
            target: 5,
            explored: 0,
            max_overfill_percentage: None,
            closest_overfill_percentage: None,
        };

        assert!(err.to_string().contains("overfill bound: none, closest: none"));
    }
}
