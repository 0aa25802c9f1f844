//! Packsize prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    candidates::{CandidateLine, CandidateSource, SelectionCandidate},
    catalog::{FilteredCatalog, filter},
    optimizer::{Optimizer, OptimizerError, heuristic::HeuristicOptimizer},
    packages::{PackageError, PackageOption},
    recommendation::{LineItem, SelectionResult, format_line_items},
    scoring::{CostEfficiency, ScoredCandidate, score, select_best},
    search::{
        CandidateLog, NoopObserver, SearchObserver, SearchOptions, search, search_with_observer,
    },
};
