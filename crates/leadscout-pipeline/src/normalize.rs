//! Field-level cleaning heuristics and the record normalizer.
//!
//! Each field rule is a standalone pure function over `&str`; [`normalize`]
//! composes them into the [`RawListing`] → [`NormalizedListing`] conversion.
//! Unparseable input is never an error here — it resolves to the canonical
//! empty value ("" / 0 / 0.0) so a bad field can't poison a batch.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use leadscout_core::{NormalizedListing, RawListing};

/// Sentinel strings extractors emit where data was absent.
const FIELD_SENTINELS: &[&str] = &["Unknown", "N/A", "Not found", "No reviews"];

/// Owner fields carry one extra sentinel on top of [`FIELD_SENTINELS`].
const OWNER_SENTINELS: &[&str] = &[
    "Unknown",
    "N/A",
    "Not found",
    "Not explicitly stated",
];

static QUOTED_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^".*"$"#).expect("valid regex"));
static NUMBERED_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("valid regex"));
static MAPS_ARTIFACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^google maps").expect("valid regex"));
static LLC_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLLC\.?$").expect("valid regex"));
static INC_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bInc\.?$").expect("valid regex"));
static CORP_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bCorp\.?$").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static REPEATED_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*,)+").expect("valid regex"));
static PARENTHETICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").expect("valid regex"));
static HONORIFIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:Mr|Mrs|Ms|Dr)\.?\s+").expect("valid regex"));
static NAME_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+$").expect("valid regex"));

fn is_sentinel(value: &str, sentinels: &[&str]) -> bool {
    sentinels.contains(&value)
}

/// Cleans a business name.
///
/// Scrape artifacts (fully quoted strings, leading list numbering, maps UI
/// text) reject the whole name; otherwise trailing entity suffixes are
/// standardized to `LLC` / `Inc` / `Corp`.
#[must_use]
pub fn clean_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return String::new();
    }

    if QUOTED_NAME_RE.is_match(name)
        || NUMBERED_NAME_RE.is_match(name)
        || MAPS_ARTIFACT_RE.is_match(name)
    {
        return String::new();
    }

    let name = LLC_SUFFIX_RE.replace(name, "LLC");
    let name = INC_SUFFIX_RE.replace(&name, "Inc");
    let name = CORP_SUFFIX_RE.replace(&name, "Corp");

    name.trim().to_string()
}

/// Validates and formats a US phone number as `(AAA) BBB-CCCC`.
///
/// Accepts exactly ten digits, or eleven with a leading country `1`. Any
/// other digit count is invalid and maps to the empty string.
#[must_use]
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();

    let national = match digits.len() {
        10 => digits.as_str(),
        11 if digits.starts_with('1') => &digits[1..],
        _ => return String::new(),
    };

    format!(
        "({}) {}-{}",
        &national[..3],
        &national[3..6],
        &national[6..]
    )
}

/// Cleans an address: sentinels map to empty, runs of whitespace collapse to
/// one space, and repeated commas collapse to one.
#[must_use]
pub fn clean_address(address: &str) -> String {
    let address = address.trim();
    if address.is_empty() || is_sentinel(address, FIELD_SENTINELS) {
        return String::new();
    }

    let address = WHITESPACE_RE.replace_all(address, " ");
    let address = REPEATED_COMMA_RE.replace_all(&address, ",");

    address.trim().to_string()
}

/// Cleans an owner name.
///
/// Drops sentinels, strips parenthetical asides and a leading honorific,
/// then requires 2–4 tokens that each look like a capitalized word.
/// Anything else maps to empty.
#[must_use]
pub fn clean_owner_name(owner: &str) -> String {
    let owner = owner.trim();
    if owner.is_empty() || is_sentinel(owner, OWNER_SENTINELS) {
        return String::new();
    }

    let owner = PARENTHETICAL_RE.replace_all(owner, "");
    let owner = HONORIFIC_RE.replace(owner.trim(), "");

    let words: Vec<&str> = owner.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) {
        return String::new();
    }
    if words.iter().any(|w| !NAME_TOKEN_RE.is_match(w)) {
        return String::new();
    }

    words.join(" ")
}

/// Coerces a scraped review count to a non-negative integer.
#[must_use]
pub fn parse_review_count(raw: &str) -> u32 {
    let raw = raw.trim();
    let value = raw
        .parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|f| f as i64))
        .unwrap_or(0);
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Coerces a scraped star rating to a float in `[0.0, 5.0]`.
#[must_use]
pub fn parse_rating(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .map(|r| r.clamp(0.0, 5.0))
        .unwrap_or(0.0)
}

/// Best-effort RFC 3339 parse of the scrape timestamp.
#[must_use]
pub fn parse_scraped_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalizes one raw listing into canonical form.
///
/// Pure and total: every field is either semantically valid afterwards or
/// the canonical empty value. Fields with no cleaning rule (hours, category,
/// location, source URL, additional contact) are passed through trimmed.
#[must_use]
pub fn normalize(raw: RawListing) -> NormalizedListing {
    NormalizedListing {
        name: clean_name(&raw.name),
        address: clean_address(&raw.address),
        phone: format_phone(&raw.phone),
        website: raw.website.trim().to_string(),
        rating: parse_rating(&raw.rating),
        review_count: parse_review_count(&raw.review_count),
        hours: raw.hours.trim().to_string(),
        category: raw.category.trim().to_string(),
        owner_name: clean_owner_name(&raw.owner_name),
        additional_contact: raw.additional_contact.trim().to_string(),
        location: raw.location.trim().to_string(),
        source_url: raw.source_url.trim().to_string(),
        scraped_at: parse_scraped_at(&raw.scraped_at),
    }
}
