//! Packsize
//!
//! Packsize selects the combination of manufacturer package sizes that best fulfils a
//! prescribed quantity, minimising overfill and the number of packages dispensed.

pub mod candidates;
pub mod catalog;
pub mod fixtures;
pub mod optimizer;
pub mod packages;
pub mod prelude;
pub mod recommendation;
pub mod scoring;
pub mod search;
pub mod utils;
