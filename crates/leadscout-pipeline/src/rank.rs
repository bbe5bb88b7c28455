//! Selection criteria and the ranked result set.

use std::cmp::Ordering;

use leadscout_core::ScoredListing;

/// Job-level thresholds for the calling-list cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionCriteria {
    pub max_reviews: u32,
    pub min_quality_score: f64,
}

/// Applies the selection criteria and sorts the survivors.
///
/// A listing survives iff its review count is at most `max_reviews`, its
/// data-quality score is at least `min_quality_score`, and it has a phone
/// number. Survivors are sorted ascending by
/// `(priority_score, review_count, name)`; the sort is stable, so the result
/// is deterministic for identical inputs.
#[must_use]
pub fn select(listings: Vec<ScoredListing>, criteria: &SelectionCriteria) -> Vec<ScoredListing> {
    let mut survivors: Vec<ScoredListing> = listings
        .into_iter()
        .filter(|s| {
            s.listing.review_count <= criteria.max_reviews
                && s.data_quality_score >= criteria.min_quality_score
                && !s.listing.phone.is_empty()
        })
        .collect();

    survivors.sort_by(ranking_order);
    survivors
}

/// Total order used by [`select`], exposed for callers that need to merge
/// pre-sorted sets.
#[must_use]
pub fn ranking_order(a: &ScoredListing, b: &ScoredListing) -> Ordering {
    a.priority_score
        .cmp(&b.priority_score)
        .then_with(|| a.listing.review_count.cmp(&b.listing.review_count))
        .then_with(|| a.listing.name.cmp(&b.listing.name))
}
