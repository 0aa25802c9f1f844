//! Heuristic Optimizer

use tracing::debug;

use crate::{
    catalog::filter,
    optimizer::{Optimizer, OptimizerError},
    packages::PackageOption,
    recommendation::SelectionResult,
    scoring::{score_all, select_best},
    search::{NoopObserver, SearchObserver, SearchOptions, search_with_observer, validate_target},
};

/// Optimizer using bounded combination search and deterministic ranking
///
/// Stateless; one value can serve any number of concurrent callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicOptimizer;

impl Optimizer for HeuristicOptimizer {
    fn optimize(
        target: i64,
        catalog: &[PackageOption],
        options: &SearchOptions,
    ) -> Result<SelectionResult, OptimizerError> {
        Self::optimize_with_observer(target, catalog, options, &mut NoopObserver)
    }
}

impl HeuristicOptimizer {
    /// Optimize while reporting every searched candidate to `observer`.
    ///
    /// # Errors
    ///
    /// See [`Optimizer::optimize`].
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(quantity = target, catalog_size = catalog.len())
    )]
    pub fn optimize_with_observer<O: SearchObserver + ?Sized>(
        target: i64,
        catalog: &[PackageOption],
        options: &SearchOptions,
        observer: &mut O,
    ) -> Result<SelectionResult, OptimizerError> {
        // Filter first so that an empty catalog is reported whatever the target.
        let filtered = filter(catalog)?;
        let target_units = validate_target(target)?;

        let candidates = search_with_observer(target, &filtered, options, observer)?;
        let scored = score_all(candidates, target_units, options);
        let best = select_best(scored, target_units)?;

        debug!(
            selection = %best.candidate,
            unit = filtered.unit(),
            overfill = best.overfill,
            efficiency = %best.efficiency.round_dp(2),
            score = %best.score,
            "selected package combination"
        );

        SelectionResult::from_scored(&best, &filtered)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{scoring::CostEfficiency, search::CandidateLog};

    fn tablets(sizes: &[u32]) -> TestResult<Vec<PackageOption>> {
        let mut packages = Vec::with_capacity(sizes.len());

        for &size in sizes {
            packages.push(PackageOption::new(
                format!("tab-{size}"),
                size,
                "TABLET",
            )?);
        }

        Ok(packages)
    }

    fn identifiers(result: &SelectionResult) -> Vec<(&str, u32)> {
        result
            .line_items()
            .iter()
            .map(|line| (line.identifier.as_str(), line.count))
            .collect()
    }

    #[test]
    fn exact_single_package_wins() -> TestResult {
        let catalog = tablets(&[30, 60, 90, 100])?;

        let result = HeuristicOptimizer::optimize(90, &catalog, &SearchOptions::default())?;

        assert_eq!(identifiers(&result), vec![("tab-90", 1)]);
        assert_eq!(result.overfill(), 0);
        assert_eq!(result.cost_efficiency(), CostEfficiency::Optimal);

        Ok(())
    }

    #[test]
    fn mixed_exact_beats_single_with_overfill() -> TestResult {
        let catalog = tablets(&[30, 60, 100])?;

        let result = HeuristicOptimizer::optimize(90, &catalog, &SearchOptions::default())?;

        assert_eq!(identifiers(&result), vec![("tab-30", 1), ("tab-60", 1)]);
        assert_eq!(result.overfill(), 0);

        Ok(())
    }

    #[test]
    fn prefer_fewer_packages_trades_small_waste_for_fewer_packages() -> TestResult {
        let catalog = tablets(&[10, 104])?;

        // 10 x 10 = 100 (99%) against 1 x 104 (95.19%).
        let default = HeuristicOptimizer::optimize(99, &catalog, &SearchOptions::default())?;
        let preferred = HeuristicOptimizer::optimize(
            99,
            &catalog,
            &SearchOptions::default().with_prefer_fewer_packages(true),
        )?;

        assert_eq!(identifiers(&default), vec![("tab-10", 10)]);
        assert_eq!(identifiers(&preferred), vec![("tab-104", 1)]);

        Ok(())
    }

    #[test]
    fn exact_match_wins_even_when_fewer_packages_preferred() -> TestResult {
        let catalog = tablets(&[5, 51])?;

        let result = HeuristicOptimizer::optimize(
            50,
            &catalog,
            &SearchOptions::default().with_prefer_fewer_packages(true),
        )?;

        assert_eq!(result.overfill(), 0);
        assert_eq!(identifiers(&result), vec![("tab-5", 10)]);

        Ok(())
    }

    #[test]
    fn penalty_factor_is_tunable() -> TestResult {
        let catalog = tablets(&[34, 100])?;

        // 3 x 34 = 102 (99.02%), 1 x 34 + 1 x 100 = 134 (75.37%), 2 x 100 = 200 (50.5%)
        let result = HeuristicOptimizer::optimize(
            101,
            &catalog,
            &SearchOptions::default().with_prefer_fewer_packages(true),
        )?;

        assert_eq!(identifiers(&result), vec![("tab-34", 3)]);

        let heavy = HeuristicOptimizer::optimize(
            101,
            &catalog,
            &SearchOptions::default()
                .with_prefer_fewer_packages(true)
                .with_penalty_factor(30),
        )?;

        assert_eq!(identifiers(&heavy), vec![("tab-34", 1), ("tab-100", 1)]);

        Ok(())
    }

    #[test]
    fn empty_catalog_reported_before_invalid_quantity() {
        let result = HeuristicOptimizer::optimize(0, &[], &SearchOptions::default());

        assert_eq!(result, Err(OptimizerError::EmptyCatalog { catalog_size: 0 }));
    }

    #[test]
    fn invalid_quantity_is_rejected() -> TestResult {
        let catalog = tablets(&[30])?;

        let zero = HeuristicOptimizer::optimize(0, &catalog, &SearchOptions::default());
        let negative = HeuristicOptimizer::optimize(-10, &catalog, &SearchOptions::default());

        assert_eq!(zero, Err(OptimizerError::InvalidQuantity { target: 0 }));
        assert_eq!(
            negative,
            Err(OptimizerError::InvalidQuantity { target: -10 })
        );

        Ok(())
    }

    #[test]
    fn observer_receives_candidates() -> TestResult {
        let catalog = tablets(&[30, 60, 100])?;
        let mut log = CandidateLog::new();

        let result = HeuristicOptimizer::optimize_with_observer(
            90,
            &catalog,
            &SearchOptions::default(),
            &mut log,
        )?;

        assert_eq!(result.total_units(), 90);
        assert!(log.accepted().count() >= 4);
        assert_eq!(log.rejected().count(), 0);

        Ok(())
    }

    #[test]
    fn overfill_percentage_reported() -> TestResult {
        let catalog = tablets(&[30, 60, 90])?;

        let result = HeuristicOptimizer::optimize(5, &catalog, &SearchOptions::default())?;

        assert_eq!(identifiers(&result), vec![("tab-30", 1)]);
        assert_eq!(result.overfill(), 25);
        assert_eq!(result.overfill_percentage(), Decimal::from(500));
        assert_eq!(result.cost_efficiency(), CostEfficiency::Wasteful);

        Ok(())
    }
}
