//! Search observer
//!
//! Observers receive every candidate the search emits, along with those rejected by
//! the overfill bound, without affecting the result. Useful for explaining a
//! recommendation to a pharmacist or for debugging catalog data.

use rust_decimal::Decimal;

use crate::candidates::{CandidateSource, SelectionCandidate};

/// Observer of candidates produced by the combination search.
pub trait SearchObserver {
    /// Called for each candidate that survives the search.
    fn on_candidate(&mut self, candidate: &SelectionCandidate<'_>);

    /// Called for each candidate rejected by the configured overfill bound.
    ///
    /// `overfill_percentage` is in percent points.
    fn on_rejected(&mut self, candidate: &SelectionCandidate<'_>, overfill_percentage: Decimal);
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {
    fn on_candidate(&mut self, _candidate: &SelectionCandidate<'_>) {}

    fn on_rejected(&mut self, _candidate: &SelectionCandidate<'_>, _overfill_percentage: Decimal) {}
}

/// A candidate as recorded by [`CandidateLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedCandidate {
    /// Breakdown such as `1 x 30 + 1 x 60`
    pub breakdown: String,

    /// How the candidate was discovered
    pub source: CandidateSource,

    /// Units dispensed
    pub total_units: u64,

    /// Overfill in percent points, only recorded for rejected candidates
    pub rejected_overfill: Option<Decimal>,
}

/// Observer that records every candidate it sees, in search order.
#[derive(Debug, Default, Clone)]
pub struct CandidateLog {
    entries: Vec<LoggedCandidate>,
}

impl CandidateLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded candidates.
    pub fn entries(&self) -> &[LoggedCandidate] {
        &self.entries
    }

    /// Candidates that survived the search.
    pub fn accepted(&self) -> impl Iterator<Item = &LoggedCandidate> {
        self.entries
            .iter()
            .filter(|entry| entry.rejected_overfill.is_none())
    }

    /// Candidates rejected by the overfill bound.
    pub fn rejected(&self) -> impl Iterator<Item = &LoggedCandidate> {
        self.entries
            .iter()
            .filter(|entry| entry.rejected_overfill.is_some())
    }

    fn record(&mut self, candidate: &SelectionCandidate<'_>, rejected_overfill: Option<Decimal>) {
        self.entries.push(LoggedCandidate {
            breakdown: candidate.to_string(),
            source: candidate.source(),
            total_units: candidate.total_units(),
            rejected_overfill,
        });
    }
}

impl SearchObserver for CandidateLog {
    fn on_candidate(&mut self, candidate: &SelectionCandidate<'_>) {
        self.record(candidate, None);
    }

    fn on_rejected(&mut self, candidate: &SelectionCandidate<'_>, overfill_percentage: Decimal) {
        self.record(candidate, Some(overfill_percentage));
    }
}
