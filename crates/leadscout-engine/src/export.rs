//! The report-export contract and its file-writing adapter.
//!
//! The exporter receives the filtered, already-sorted listing set plus
//! summary metadata and returns references to the artifacts it produced.
//! [`FileExporter`] writes a plain-text summary report, a CSV, and a JSON
//! payload; richer spreadsheet rendering belongs to an external writer
//! behind the same trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use leadscout_core::{ArtifactRef, ReportArtifacts, ScoredListing};

use crate::error::ExportError;

/// Summary metadata handed to the exporter alongside the listing set.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub job_id: Uuid,
    pub job_name: String,
    pub generated_at: DateTime<Utc>,
    pub locations: Vec<String>,
}

/// External collaborator that renders the final artifacts.
#[async_trait]
pub trait ReportExporter: Send + Sync {
    /// Renders all artifact kinds for one completed run.
    ///
    /// Called with an empty listing set too: a run that found nothing still
    /// produces its (empty) reports.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] on any write or serialization failure; the
    /// orchestrator treats it as job-fatal.
    async fn export(
        &self,
        listings: &[ScoredListing],
        meta: &ReportMeta,
    ) -> Result<ReportArtifacts, ExportError>;
}

/// Writes artifacts into a configured reports directory.
pub struct FileExporter {
    reports_dir: PathBuf,
}

/// CSV column order, matching the calling-list layout.
const CSV_HEADER: &str = "name,location,phone,owner_name,address,website,\
                          review_count,rating,hours,additional_contact,\
                          data_quality_score,priority_score";

/// How many leads the summary report lists.
const SUMMARY_TOP_N: usize = 10;

impl FileExporter {
    #[must_use]
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    async fn write_artifact(&self, path: &Path, bytes: Vec<u8>) -> Result<ArtifactRef, ExportError> {
        let sha256 = format!("{:x}", Sha256::digest(&bytes));
        let len = bytes.len() as u64;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| ExportError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Ok(ArtifactRef {
            path: path.to_path_buf(),
            sha256,
            bytes: len,
        })
    }
}

#[async_trait]
impl ReportExporter for FileExporter {
    async fn export(
        &self,
        listings: &[ScoredListing],
        meta: &ReportMeta,
    ) -> Result<ReportArtifacts, ExportError> {
        tokio::fs::create_dir_all(&self.reports_dir)
            .await
            .map_err(|source| ExportError::Io {
                path: self.reports_dir.display().to_string(),
                source,
            })?;

        let stem = format!("job_{}_{}", meta.job_id, sanitize_stem(&meta.job_name));

        let report = self
            .write_artifact(
                &self.reports_dir.join(format!("{stem}_summary.txt")),
                render_summary(listings, meta).into_bytes(),
            )
            .await?;
        let csv = self
            .write_artifact(
                &self.reports_dir.join(format!("{stem}.csv")),
                render_csv(listings).into_bytes(),
            )
            .await?;
        let json = self
            .write_artifact(
                &self.reports_dir.join(format!("{stem}.json")),
                render_json(listings, meta)?,
            )
            .await?;

        tracing::info!(
            job_id = %meta.job_id,
            listings = listings.len(),
            dir = %self.reports_dir.display(),
            "report artifacts written"
        );

        Ok(ReportArtifacts { report, csv, json })
    }
}

/// Keeps file stems shell-safe: alphanumerics pass, everything else
/// becomes an underscore.
fn sanitize_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn render_summary(listings: &[ScoredListing], meta: &ReportMeta) -> String {
    let mut out = String::new();
    out.push_str(&format!("Lead report: {}\n", meta.job_name));
    out.push_str(&format!("Generated: {}\n", meta.generated_at.to_rfc3339()));
    out.push_str(&format!("Locations: {}\n", meta.locations.join("; ")));
    out.push_str(&format!("Matching listings: {}\n", listings.len()));

    if !listings.is_empty() {
        out.push_str("\nTop leads:\n");
        for (rank, s) in listings.iter().take(SUMMARY_TOP_N).enumerate() {
            out.push_str(&format!(
                "{}. {} | {} | quality {:.1}%\n",
                rank + 1,
                s.listing.name,
                if s.listing.phone.is_empty() {
                    "no phone"
                } else {
                    s.listing.phone.as_str()
                },
                s.data_quality_score,
            ));
        }
    }
    out
}

fn render_csv(listings: &[ScoredListing]) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');
    for s in listings {
        let l = &s.listing;
        let fields = [
            csv_field(&l.name),
            csv_field(&l.location),
            csv_field(&l.phone),
            csv_field(&l.owner_name),
            csv_field(&l.address),
            csv_field(&l.website),
            l.review_count.to_string(),
            l.rating.to_string(),
            csv_field(&l.hours),
            csv_field(&l.additional_contact),
            format!("{:.1}", s.data_quality_score),
            s.priority_score.to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Quotes a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_json(listings: &[ScoredListing], meta: &ReportMeta) -> Result<Vec<u8>, ExportError> {
    let payload = serde_json::json!({
        "metadata": {
            "generated_at": meta.generated_at.to_rfc3339(),
            "total": listings.len(),
            "locations": meta.locations,
        },
        "listings": listings,
    });
    serde_json::to_vec_pretty(&payload).map_err(|source| ExportError::Serialize {
        context: format!("JSON export for job {}", meta.job_id),
        source,
    })
}
