//! Priority and data-quality scoring.
//!
//! Priority is a lower-is-better contact ranking: businesses with few
//! reviews, a phone number, a known owner, and an established web presence
//! float to the top of the calling list. Data quality is a weighted
//! field-completeness percentage.

use leadscout_core::{NormalizedListing, ScoredListing};

/// Website values that mean "no real website".
const WEBSITE_PLACEHOLDERS: &[&str] = &["", "Not found", "N/A"];

/// Each review pushes a listing down the calling list by this much.
const REVIEW_PENALTY: i64 = 10;
/// Credit for a valid phone number.
const PHONE_CREDIT: i64 = 50;
/// Credit for an identified owner.
const OWNER_CREDIT: i64 = 30;
/// Credit for a real (non-placeholder) website.
const WEBSITE_CREDIT: i64 = 10;

/// Data-quality weights per field, in display order.
const QUALITY_NAME: f64 = 20.0;
const QUALITY_PHONE: f64 = 25.0;
const QUALITY_ADDRESS: f64 = 15.0;
const QUALITY_OWNER: f64 = 20.0;
const QUALITY_WEBSITE: f64 = 10.0;
const QUALITY_REVIEWS: f64 = 5.0;
const QUALITY_ADDITIONAL_CONTACT: f64 = 5.0;

const QUALITY_TOTAL: f64 = QUALITY_NAME
    + QUALITY_PHONE
    + QUALITY_ADDRESS
    + QUALITY_OWNER
    + QUALITY_WEBSITE
    + QUALITY_REVIEWS
    + QUALITY_ADDITIONAL_CONTACT;

/// Whether a website value points at an actual site.
#[must_use]
pub fn has_real_website(website: &str) -> bool {
    !WEBSITE_PLACEHOLDERS.contains(&website)
}

/// Computes the contact-priority score. Lower is better; never negative.
#[must_use]
pub fn priority_score(listing: &NormalizedListing) -> u32 {
    let mut score = i64::from(listing.review_count) * REVIEW_PENALTY;

    if !listing.phone.is_empty() {
        score -= PHONE_CREDIT;
    }
    if !listing.owner_name.is_empty() {
        score -= OWNER_CREDIT;
    }
    if has_real_website(&listing.website) {
        score -= WEBSITE_CREDIT;
    }
    if listing.rating > 0.0 {
        score -= (listing.rating * 2.0).floor() as i64;
    }

    u32::try_from(score.max(0)).unwrap_or(u32::MAX)
}

/// Computes the weighted field-completeness percentage in `[0.0, 100.0]`.
#[must_use]
pub fn data_quality_score(listing: &NormalizedListing) -> f64 {
    let mut score = 0.0;

    if !listing.name.is_empty() {
        score += QUALITY_NAME;
    }
    if !listing.phone.is_empty() {
        score += QUALITY_PHONE;
    }
    if !listing.address.is_empty() {
        score += QUALITY_ADDRESS;
    }
    if !listing.owner_name.is_empty() {
        score += QUALITY_OWNER;
    }
    if has_real_website(&listing.website) {
        score += QUALITY_WEBSITE;
    }
    if listing.review_count > 0 {
        score += QUALITY_REVIEWS;
    }
    if !listing.additional_contact.is_empty() {
        score += QUALITY_ADDITIONAL_CONTACT;
    }

    score / QUALITY_TOTAL * 100.0
}

/// Attaches both scores to a normalized listing.
#[must_use]
pub fn score(listing: NormalizedListing) -> ScoredListing {
    let priority_score = priority_score(&listing);
    let data_quality_score = data_quality_score(&listing);
    ScoredListing {
        listing,
        priority_score,
        data_quality_score,
    }
}
