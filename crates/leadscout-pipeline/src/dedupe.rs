//! Batch deduplication on the (name, phone) key.

use std::collections::HashSet;

use leadscout_core::NormalizedListing;

/// Removes duplicate and unnamed listings from a batch.
///
/// The first occurrence of each `(name, phone)` pair wins; later occurrences
/// are dropped. Listings with an empty name are dropped regardless of phone.
/// Survivors keep their first-seen order.
#[must_use]
pub fn dedupe(listings: Vec<NormalizedListing>) -> Vec<NormalizedListing> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    listings
        .into_iter()
        .filter(|listing| {
            if listing.name.is_empty() {
                return false;
            }
            seen.insert((listing.name.clone(), listing.phone.clone()))
        })
        .collect()
}
