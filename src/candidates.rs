//! Selection Candidates

use std::fmt;

use smallvec::SmallVec;

use crate::packages::PackageOption;

/// Lines of a candidate, one per distinct package.
pub type CandidateLines<'a> = SmallVec<[CandidateLine<'a>; 4]>;

/// How a candidate was discovered during search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CandidateSource {
    /// A single package holding exactly the target quantity
    ExactMatch,

    /// The smallest single package holding at least the target quantity
    SmallestSufficient,

    /// The minimum number of one package size that reaches the target
    RepeatedSingle,

    /// A mix of two or more distinct package sizes
    MultiPackage,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CandidateSource::ExactMatch => "exact match",
            CandidateSource::SmallestSufficient => "smallest sufficient package",
            CandidateSource::RepeatedSingle => "repeated package",
            CandidateSource::MultiPackage => "mixed packages",
        };

        f.write_str(label)
    }
}

/// A package and how many times it is used within a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateLine<'a> {
    /// Package used on this line
    pub package: &'a PackageOption,

    /// Number of packages dispensed
    pub count: u32,
}

impl CandidateLine<'_> {
    /// Units contributed by this line.
    pub fn subtotal(&self) -> u64 {
        u64::from(self.package.quantity()) * u64::from(self.count)
    }
}

/// One hypothesis for fulfilling a target quantity.
///
/// Lines are ordered by ascending package size and never repeat a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCandidate<'a> {
    lines: CandidateLines<'a>,
    source: CandidateSource,
}

impl<'a> SelectionCandidate<'a> {
    /// Create a candidate from its lines.
    pub fn new(lines: CandidateLines<'a>, source: CandidateSource) -> Self {
        Self { lines, source }
    }

    /// Create a candidate using `count` copies of a single package.
    pub fn single(package: &'a PackageOption, count: u32, source: CandidateSource) -> Self {
        let mut lines = CandidateLines::new();
        lines.push(CandidateLine { package, count });

        Self { lines, source }
    }

    /// Lines of the candidate, ascending by package size.
    pub fn lines(&self) -> &[CandidateLine<'a>] {
        &self.lines
    }

    /// How this candidate was discovered.
    pub fn source(&self) -> CandidateSource {
        self.source
    }

    /// Total units dispensed.
    pub fn total_units(&self) -> u64 {
        self.lines.iter().map(CandidateLine::subtotal).sum()
    }

    /// Units dispensed beyond `target`, zero if the candidate falls short.
    pub fn overfill(&self, target: u64) -> u64 {
        self.total_units().saturating_sub(target)
    }

    /// Whether the candidate dispenses at least `target` units.
    pub fn meets(&self, target: u64) -> bool {
        self.total_units() >= target
    }

    /// Total number of discrete packages dispensed.
    pub fn package_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.count)).sum()
    }

    /// Number of distinct packages used.
    pub fn distinct_packages(&self) -> usize {
        self.lines.len()
    }

    /// Package identifiers, sorted lexicographically.
    pub fn sorted_identifiers(&self) -> SmallVec<[&'a str; 4]> {
        let mut ids: SmallVec<[&'a str; 4]> = self
            .lines
            .iter()
            .map(|line| line.package.identifier())
            .collect();

        ids.sort_unstable();
        ids
    }

    /// Smallest package size used, if any.
    pub fn smallest_size(&self) -> Option<u32> {
        self.lines.iter().map(|line| line.package.quantity()).min()
    }
}

impl fmt::Display for SelectionCandidate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }

            write!(f, "{} x {}", line.count, line.package.quantity())?;
        }

        Ok(())
    }
}
