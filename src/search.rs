//! Combination Search
//!
//! Produces the candidate package combinations worth scoring for a target quantity:
//!
//! 1. A single package holding exactly the target
//! 2. The smallest single package holding at least the target
//! 3. `ceil(target / size)` copies of each package size
//! 4. Mixes of two to `max_packages` distinct sizes whose total lies within the
//!    search ceiling (at most 100% overfill)
//!
//! Mixed combinations are explored level by level: every level extends the
//! partial combinations of the previous one with a strictly larger size, and each
//! partial combination is completed with the minimum number of one larger size
//! needed to reach the target. Work per level is fixed by the catalog size and two
//! constants, never by the target or the size values:
//!
//! - a smaller size is repeated at most [`MAX_MIXED_REPEATS`] times, and never
//!   often enough to be exchangeable for fewer copies of a larger one
//! - only the [`SEARCH_BEAM_WIDTH`] partial combinations that come closest to
//!   being closed by one larger size are carried to the next level
//! - a combination is dropped as soon as removing one package would still meet
//!   the target
//!
//! Mixed candidates that another candidate matches or beats on total units,
//! package count and distinct packages are dropped before the overfill bound is
//! applied, since they can never rank first.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    candidates::{CandidateLine, CandidateLines, CandidateSource, SelectionCandidate},
    catalog::FilteredCatalog,
    optimizer::OptimizerError,
    packages::PackageOption,
    scoring::overfill_percentage,
};

pub mod observer;

pub use observer::{CandidateLog, NoopObserver, SearchObserver};

/// Default maximum number of distinct package types combined in one candidate.
pub const DEFAULT_MAX_PACKAGES: usize = 3;

/// Overfill ceiling for mixed combinations, in percent points.
///
/// A tighter `max_overfill_percentage` lowers the ceiling; a looser one never raises it.
pub const SEARCH_OVERFILL_CAP: Decimal = Decimal::ONE_HUNDRED;

/// Default penalty per extra package when fewer packages are preferred, in percent points.
pub const DEFAULT_PENALTY_FACTOR: Decimal = Decimal::ONE;

/// Largest prescribed quantity accepted, so every repeat count fits a `u32`.
pub const MAX_TARGET: u32 = u32::MAX;

/// Most copies of a smaller size placed alongside a larger one in a mixed combination.
pub const MAX_MIXED_REPEATS: u64 = 4;

/// Partial mixed combinations carried from one search level to the next.
pub const SEARCH_BEAM_WIDTH: usize = 512;

type SizeList<'a> = SmallVec<[&'a PackageOption; 16]>;

/// Search and scoring options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum number of distinct package types combined in one candidate
    pub max_packages: usize,

    /// Reject candidates whose overfill exceeds this many percent points of the target
    pub max_overfill_percentage: Option<Decimal>,

    /// Penalise candidates for every package beyond the first
    pub prefer_fewer_packages: bool,

    /// Percent points subtracted per extra package when `prefer_fewer_packages` is set
    pub penalty_factor: Decimal,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_packages: DEFAULT_MAX_PACKAGES,
            max_overfill_percentage: None,
            prefer_fewer_packages: false,
            penalty_factor: DEFAULT_PENALTY_FACTOR,
        }
    }
}

impl SearchOptions {
    /// Set the maximum number of distinct package types per candidate.
    #[must_use]
    pub fn with_max_packages(mut self, max_packages: usize) -> Self {
        self.max_packages = max_packages;
        self
    }

    /// Set the overfill bound in percent points (e.g. `50` for 50%).
    #[must_use]
    pub fn with_max_overfill_percentage(mut self, percentage: impl Into<Decimal>) -> Self {
        self.max_overfill_percentage = Some(percentage.into());
        self
    }

    /// Enable or disable the package count penalty.
    #[must_use]
    pub fn with_prefer_fewer_packages(mut self, prefer: bool) -> Self {
        self.prefer_fewer_packages = prefer;
        self
    }

    /// Set the per-package penalty used when fewer packages are preferred.
    ///
    /// Negative factors are clamped to zero: a penalty never rewards extra packages.
    #[must_use]
    pub fn with_penalty_factor(mut self, penalty_factor: impl Into<Decimal>) -> Self {
        self.penalty_factor = penalty_factor.into().max(Decimal::ZERO);
        self
    }
}

/// Validate a prescribed quantity.
///
/// # Errors
///
/// Returns [`OptimizerError::InvalidQuantity`] if `target` is zero, negative, or
/// above [`MAX_TARGET`].
pub fn validate_target(target: i64) -> Result<u64, OptimizerError> {
    u64::try_from(target)
        .ok()
        .filter(|target| (1..=u64::from(MAX_TARGET)).contains(target))
        .ok_or(OptimizerError::InvalidQuantity { target })
}

/// Find every candidate combination that fulfils `target` units.
///
/// # Errors
///
/// - [`OptimizerError::InvalidQuantity`]: `target` is zero, negative, or above [`MAX_TARGET`].
/// - [`OptimizerError::EmptyCatalog`]: the catalog has no packages.
/// - [`OptimizerError::NoFeasibleCombination`]: every candidate exceeded the overfill bound.
pub fn search<'a>(
    target: i64,
    catalog: &FilteredCatalog<'a>,
    options: &SearchOptions,
) -> Result<Vec<SelectionCandidate<'a>>, OptimizerError> {
    search_with_observer(target, catalog, options, &mut NoopObserver)
}

/// Find every candidate combination, reporting each one to `observer`.
///
/// # Errors
///
/// See [`search`].
pub fn search_with_observer<'a, O: SearchObserver + ?Sized>(
    target: i64,
    catalog: &FilteredCatalog<'a>,
    options: &SearchOptions,
    observer: &mut O,
) -> Result<Vec<SelectionCandidate<'a>>, OptimizerError> {
    let target = validate_target(target)?;

    if catalog.is_empty() {
        return Err(OptimizerError::EmptyCatalog {
            catalog_size: catalog.source_size(),
        });
    }

    let sizes = distinct_sizes(catalog);
    let mut collector = Collector::new(target);

    single_package_candidates(target, &sizes, &mut collector);
    multi_package_candidates(target, &sizes, options, &mut collector);

    collector.finish(options, observer)
}

/// Packages ordered by ascending size, keeping the smallest identifier for each size.
fn distinct_sizes<'a>(catalog: &FilteredCatalog<'a>) -> SizeList<'a> {
    let mut sizes: SizeList<'a> = catalog.iter().collect();

    sizes.sort_unstable_by(|a, b| {
        a.quantity()
            .cmp(&b.quantity())
            .then_with(|| a.identifier().cmp(b.identifier()))
    });
    sizes.dedup_by_key(|package| package.quantity());

    sizes
}

fn single_package_candidates<'a>(
    target: u64,
    sizes: &[&'a PackageOption],
    collector: &mut Collector<'a>,
) {
    if let Some(exact) = sizes
        .iter()
        .copied()
        .find(|package| u64::from(package.quantity()) == target)
    {
        collector.push(SelectionCandidate::single(
            exact,
            1,
            CandidateSource::ExactMatch,
        ));
    }

    if let Some(sufficient) = sizes
        .iter()
        .copied()
        .find(|package| u64::from(package.quantity()) >= target)
    {
        collector.push(SelectionCandidate::single(
            sufficient,
            1,
            CandidateSource::SmallestSufficient,
        ));
    }

    for &package in sizes {
        // Bounded by the target, which `validate_target` keeps within `u32`.
        let Ok(count) = u32::try_from(target.div_ceil(u64::from(package.quantity()))) else {
            continue;
        };

        collector.push(SelectionCandidate::single(
            package,
            count,
            CandidateSource::RepeatedSingle,
        ));
    }
}

fn multi_package_candidates<'a>(
    target: u64,
    sizes: &[&'a PackageOption],
    options: &SearchOptions,
    collector: &mut Collector<'a>,
) {
    if options.max_packages < 2 || sizes.len() < 2 {
        return;
    }

    let ceiling = search_ceiling(target, options.max_overfill_percentage);

    if ceiling < target {
        return;
    }

    let limits = repeat_limits(sizes);
    let mut prefixes = next_level(&[Prefix::root()], target, sizes, &limits);

    for depth in 2..=options.max_packages {
        if prefixes.is_empty() {
            break;
        }

        for prefix in &prefixes {
            prefix.complete(target, ceiling, sizes, collector);
        }

        if depth == options.max_packages {
            break;
        }

        prefixes = next_level(&prefixes, target, sizes, &limits);
    }
}

/// Extend every prefix by one larger size, keeping at most [`SEARCH_BEAM_WIDTH`]
/// of the extensions.
///
/// Extensions are ranked by how little overfill closing them would leave, then
/// by fewer packages. The remaining keys only make the order total.
fn next_level<'a>(
    prefixes: &[Prefix<'a>],
    target: u64,
    sizes: &[&'a PackageOption],
    limits: &[u64],
) -> Vec<Prefix<'a>> {
    let mut extensions = Vec::new();

    for (parent, prefix) in prefixes.iter().enumerate() {
        prefix.extensions(parent, target, sizes, limits, &mut extensions);
    }

    if extensions.len() > SEARCH_BEAM_WIDTH {
        extensions.select_nth_unstable_by_key(SEARCH_BEAM_WIDTH, Extension::rank);
        extensions.truncate(SEARCH_BEAM_WIDTH);
    }

    extensions.sort_unstable_by_key(Extension::rank);

    extensions
        .into_iter()
        .filter_map(|extension| {
            prefixes
                .get(extension.parent)
                .map(|parent| parent.with_line(&extension))
        })
        .collect()
}

/// Least overfill left by closing a `gap` with copies of one of the `larger` sizes.
///
/// Only two closers are tried: the smallest size covering the gap in one copy,
/// and repeats of the largest size.
fn closing_overfill(gap: u64, larger: &[&PackageOption]) -> Option<u64> {
    let largest = u64::from(larger.last()?.quantity());
    let repeated = gap.div_ceil(largest) * largest - gap;

    let covering = larger.partition_point(|package| u64::from(package.quantity()) < gap);
    let single = larger
        .get(covering)
        .map(|package| u64::from(package.quantity()) - gap);

    Some(single.map_or(repeated, |single| single.min(repeated)))
}

/// Largest total a mixed combination may reach.
fn search_ceiling(target: u64, max_overfill_percentage: Option<Decimal>) -> u64 {
    let percentage =
        max_overfill_percentage.map_or(SEARCH_OVERFILL_CAP, |bound| bound.min(SEARCH_OVERFILL_CAP));

    let ceiling =
        Decimal::from(target) * (Decimal::ONE_HUNDRED + percentage) / Decimal::ONE_HUNDRED;

    ceiling.floor().to_u64().unwrap_or(0)
}

/// For each size, the most copies worth combining with any larger size.
///
/// `b / gcd(a, b)` copies of `a` hold exactly as many units as `a / gcd(a, b)` copies
/// of `b`, so using that many or more is never better than swapping some for `b`.
fn repeat_limits(sizes: &[&PackageOption]) -> SmallVec<[u64; 16]> {
    sizes
        .iter()
        .enumerate()
        .map(|(index, package)| {
            let size = u64::from(package.quantity());

            sizes
                .iter()
                .skip(index + 1)
                .map(|larger| exchange_limit(size, u64::from(larger.quantity())))
                .max()
                .unwrap_or(0)
        })
        .collect()
}

/// Number of copies of `smaller` that can be exchanged for fewer copies of `larger`.
fn exchange_limit(smaller: u64, larger: u64) -> u64 {
    larger / gcd(smaller, larger)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }

    a
}

/// A partial mixed combination whose total is still below the target.
#[derive(Debug)]
struct Prefix<'a> {
    lines: CandidateLines<'a>,
    partial: u64,
    next: usize,
    smallest: u64,
}

impl<'a> Prefix<'a> {
    fn root() -> Self {
        Self {
            lines: CandidateLines::new(),
            partial: 0,
            next: 0,
            smallest: u64::MAX,
        }
    }

    /// Whether a larger `size` may join without making an existing line exchangeable.
    fn accepts(&self, size: u64) -> bool {
        self.lines.iter().all(|line| {
            u64::from(line.count) < exchange_limit(u64::from(line.package.quantity()), size)
        })
    }

    fn package_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.count)).sum()
    }

    /// Collect every way to add one more size while keeping the total below the target.
    fn extensions(
        &self,
        parent: usize,
        target: u64,
        sizes: &[&'a PackageOption],
        limits: &[u64],
        out: &mut Vec<Extension<'a>>,
    ) {
        let remaining = target - self.partial;
        let packages = self.package_count();

        for (index, (&package, limit)) in sizes.iter().zip(limits).enumerate().skip(self.next) {
            let size = u64::from(package.quantity());

            // From here on a single copy reaches the target, which completion covers.
            if size >= remaining {
                break;
            }

            if !self.accepts(size) {
                continue;
            }

            let larger = sizes.get(index + 1..).unwrap_or_default();
            let max_count = ((remaining - 1) / size)
                .min(limit.saturating_sub(1))
                .min(MAX_MIXED_REPEATS);

            for count in 1..=max_count {
                let partial = self.partial + count * size;

                let (Some(closing), Ok(line_count)) = (
                    closing_overfill(target - partial, larger),
                    u32::try_from(count),
                ) else {
                    break;
                };

                out.push(Extension {
                    closing_overfill: closing,
                    packages: packages + count,
                    parent,
                    next: index + 1,
                    package,
                    count: line_count,
                });
            }
        }
    }

    fn with_line(&self, extension: &Extension<'a>) -> Self {
        let size = u64::from(extension.package.quantity());
        let mut lines = self.lines.clone();

        lines.push(CandidateLine {
            package: extension.package,
            count: extension.count,
        });

        Self {
            lines,
            partial: self.partial + u64::from(extension.count) * size,
            next: extension.next,
            smallest: self.smallest.min(size),
        }
    }

    /// Finish the combination with the fewest copies of one larger size that reach the target.
    fn complete(
        &self,
        target: u64,
        ceiling: u64,
        sizes: &[&'a PackageOption],
        collector: &mut Collector<'a>,
    ) {
        let remaining = target - self.partial;

        for &package in sizes.iter().skip(self.next) {
            let size = u64::from(package.quantity());
            let count = remaining.div_ceil(size);
            let total = self.partial + count * size;
            let wasteful = total > ceiling || total - target >= self.smallest;

            if wasteful {
                // A single copy already reaches the target, so larger sizes only add waste.
                if size >= remaining {
                    break;
                }

                continue;
            }

            if !self.accepts(size) {
                continue;
            }

            let Ok(count) = u32::try_from(count) else {
                continue;
            };

            let mut lines = self.lines.clone();
            lines.push(CandidateLine { package, count });

            collector.push(SelectionCandidate::new(
                lines,
                CandidateSource::MultiPackage,
            ));
        }
    }
}

/// One more line for a prefix, not yet materialised.
#[derive(Debug)]
struct Extension<'a> {
    closing_overfill: u64,
    packages: u64,
    parent: usize,
    next: usize,
    package: &'a PackageOption,
    count: u32,
}

impl Extension<'_> {
    fn rank(&self) -> (u64, u64, usize, usize, u32) {
        (
            self.closing_overfill,
            self.packages,
            self.parent,
            self.next,
            self.count,
        )
    }
}

/// Accumulates candidates, discarding infeasible ones and duplicates.
#[derive(Debug)]
struct Collector<'a> {
    target: u64,
    seen: FxHashSet<SmallVec<[(u32, u32); 4]>>,
    candidates: Vec<SelectionCandidate<'a>>,
}

impl<'a> Collector<'a> {
    fn new(target: u64) -> Self {
        Self {
            target,
            seen: FxHashSet::default(),
            candidates: Vec::new(),
        }
    }

    fn push(&mut self, candidate: SelectionCandidate<'a>) {
        if !candidate.meets(self.target) {
            return;
        }

        let key = candidate
            .lines()
            .iter()
            .map(|line| (line.package.quantity(), line.count))
            .collect();

        if self.seen.insert(key) {
            self.candidates.push(candidate);
        }
    }

    /// Drop dominated mixed candidates, apply the overfill bound, and report every
    /// remaining candidate to the observer.
    fn finish<O: SearchObserver + ?Sized>(
        self,
        options: &SearchOptions,
        observer: &mut O,
    ) -> Result<Vec<SelectionCandidate<'a>>, OptimizerError> {
        let produced = self.candidates.len();
        let candidates = retain_undominated(self.candidates);
        let explored = candidates.len();
        let mut closest: Option<Decimal> = None;
        let mut surviving = Vec::with_capacity(explored);

        for candidate in candidates {
            let overfill = overfill_percentage(candidate.overfill(self.target), self.target);

            match options.max_overfill_percentage {
                Some(bound) if overfill > bound => {
                    observer.on_rejected(&candidate, overfill);
                    closest = Some(closest.map_or(overfill, |seen| seen.min(overfill)));
                }
                _ => {
                    observer.on_candidate(&candidate);
                    surviving.push(candidate);
                }
            }
        }

        debug!(
            target = self.target,
            produced,
            explored,
            surviving = surviving.len(),
            "package combination search complete"
        );

        if surviving.is_empty() {
            return Err(OptimizerError::NoFeasibleCombination {
                target: self.target,
                explored,
                max_overfill_percentage: options.max_overfill_percentage,
                closest_overfill_percentage: closest,
            });
        }

        Ok(surviving)
    }
}

/// Drop mixed candidates that another candidate dominates.
///
/// A candidate dominates another when it has no more total units, packages or
/// distinct packages and strictly fewer of at least one. Such a candidate scores at
/// least as well under any non-negative penalty and wins every tie-break before
/// identifiers. Single-size candidates are always kept.
fn retain_undominated(candidates: Vec<SelectionCandidate<'_>>) -> Vec<SelectionCandidate<'_>> {
    let widest = candidates
        .iter()
        .map(SelectionCandidate::distinct_packages)
        .max()
        .unwrap_or(0);

    let mut order: Vec<(u64, u64, usize, usize)> = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            (
                candidate.total_units(),
                candidate.package_count(),
                candidate.distinct_packages(),
                index,
            )
        })
        .collect();

    order.sort_unstable();

    // Fewest packages per distinct count, over smaller totals and within the current total.
    let mut fewest_below = vec![u64::MAX; widest + 1];
    let mut fewest_at = vec![u64::MAX; widest + 1];
    let mut current_total = None;
    let mut keep = vec![true; candidates.len()];

    for (total, packages, distinct, index) in order {
        if current_total != Some(total) {
            for (below, at) in fewest_below.iter_mut().zip(fewest_at.iter_mut()) {
                *below = (*below).min(*at);
                *at = u64::MAX;
            }

            current_total = Some(total);
        }

        // Same-total entries come in (packages, distinct) order, so any earlier one
        // with fewer distinct packages has no more packages.
        let dominated = fewest_below
            .iter()
            .take(distinct + 1)
            .any(|&fewest| fewest <= packages)
            || fewest_at
                .iter()
                .take(distinct)
                .any(|&fewest| fewest != u64::MAX)
            || fewest_at.get(distinct).is_some_and(|&fewest| fewest < packages);

        let mixed = candidates
            .get(index)
            .is_some_and(|candidate| candidate.source() == CandidateSource::MultiPackage);

        if let Some(slot) = keep.get_mut(index) {
            *slot = !(mixed && dominated);
        }

        if let Some(fewest) = fewest_at.get_mut(distinct) {
            *fewest = (*fewest).min(packages);
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(candidate, keep)| keep.then_some(candidate))
        .collect()
}
