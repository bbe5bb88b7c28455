//! The pure listing-processing pipeline: normalize → dedupe → score → rank.
//!
//! Everything in this crate is synchronous and side-effect free so each
//! cleaning rule and scoring formula can be tested in isolation. The
//! orchestrator drives [`process`] over a job's accumulated raw listings and
//! then applies [`rank::select`] with the job's criteria.

pub mod dedupe;
pub mod normalize;
pub mod rank;
pub mod score;

use leadscout_core::{RawListing, ScoredListing};

pub use dedupe::dedupe;
pub use normalize::normalize;
pub use rank::{select, SelectionCriteria};
pub use score::score;

/// Runs the full cleaning pass over one batch: normalize every listing,
/// drop duplicates and unnamed entries, and attach scores.
///
/// The surviving order is the first-seen order of the input.
#[must_use]
pub fn process(raw: Vec<RawListing>) -> Vec<ScoredListing> {
    let normalized = raw.into_iter().map(normalize).collect();
    dedupe(normalized).into_iter().map(score).collect()
}
