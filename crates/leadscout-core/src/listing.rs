//! Business-listing types at each pipeline stage.
//!
//! A listing moves through three shapes: [`RawListing`] as delivered by the
//! extractor (all text, possibly malformed), [`NormalizedListing`] after
//! field cleaning (every field semantically valid or canonically empty),
//! and [`ScoredListing`] once priority and quality scores are attached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listing exactly as scraped.
///
/// Numeric-looking fields stay `String` here: extractors routinely hand back
/// sentinels ("N/A", "No reviews") or garbage where numbers belong, and the
/// normalizer is the single place that interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub review_count: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub additional_contact: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub scraped_at: String,
}

/// A listing after field cleaning.
///
/// Invariants upheld by the normalizer:
/// - `phone` is empty or formatted `(AAA) BBB-CCCC`
/// - `owner_name` is empty or 2–4 capitalized tokens
/// - `rating` is in `[0.0, 5.0]`, `review_count` is non-negative
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedListing {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub rating: f64,
    pub review_count: u32,
    pub hours: String,
    pub category: String,
    pub owner_name: String,
    pub additional_contact: String,
    pub location: String,
    pub source_url: String,
    pub scraped_at: Option<DateTime<Utc>>,
}

/// A normalized listing with contact-priority and data-quality scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredListing {
    #[serde(flatten)]
    pub listing: NormalizedListing,
    /// Lower is better: favors low-review, contactable, owner-identified
    /// businesses. Never negative.
    pub priority_score: u32,
    /// Percentage in `[0.0, 100.0]` of weighted field completeness.
    pub data_quality_score: f64,
}
