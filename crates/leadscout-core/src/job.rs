//! The scrape-job aggregate and its lifecycle state machine.
//!
//! A job is created `Pending`, moves to `Running` exactly once, and ends in
//! one of three terminal states. Every legal edge is enumerated in
//! [`JobStatus::can_transition_to`]; stores apply transitions through
//! [`Job::apply`] so the table is enforced on every path.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default business category when a creation request omits one.
pub const DEFAULT_BUSINESS_TYPE: &str = "HVAC";
/// Default review-count ceiling for the rank filter.
pub const DEFAULT_MAX_REVIEWS: u32 = 20;
/// Default data-quality floor for the rank filter.
pub const DEFAULT_MIN_QUALITY_SCORE: f64 = 40.0;

/// Lifecycle states of a scrape job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal states admit no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// The full transition table.
    ///
    /// `Pending → Running`, `Pending → Cancelled`, and `Running → {Completed,
    /// Failed, Cancelled}` are the only legal edges.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Running | Self::Cancelled),
            Self::Running => matches!(next, Self::Completed | Self::Failed | Self::Cancelled),
            Self::Completed | Self::Failed | Self::Cancelled => false,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown job status: {0}")]
pub struct ParseStatusError(String);

/// Kinds of artifact a completed job exposes for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Report,
    Csv,
    Json,
}

impl FromStr for ArtifactKind {
    type Err = ParseArtifactKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "report" => Ok(Self::Report),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ParseArtifactKindError(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown artifact kind: {0}")]
pub struct ParseArtifactKindError(String);

/// Reference to one generated artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub path: PathBuf,
    /// Hex SHA-256 of the file contents at generation time.
    pub sha256: String,
    pub bytes: u64,
}

/// The full set of artifacts produced by one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportArtifacts {
    pub report: ArtifactRef,
    pub csv: ArtifactRef,
    pub json: ArtifactRef,
}

impl ReportArtifacts {
    #[must_use]
    pub fn get(&self, kind: ArtifactKind) -> &ArtifactRef {
        match kind {
            ArtifactKind::Report => &self.report,
            ArtifactKind::Csv => &self.csv,
            ArtifactKind::Json => &self.json,
        }
    }
}

/// One request to scrape a set of locations and produce ranked reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    pub locations: Vec<String>,
    pub business_type: String,
    pub max_reviews: u32,
    pub min_quality_score: f64,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_found: u64,
    pub total_matching: u64,
    pub error_message: Option<String>,
    pub reports: Option<ReportArtifacts>,
}

/// A validated job-creation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewJob {
    pub name: String,
    pub locations: Vec<String>,
    pub business_type: Option<String>,
    pub max_reviews: Option<u32>,
    pub min_quality_score: Option<f64>,
}

impl NewJob {
    /// Checks the request is well-formed before any job is created.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the name is blank, the location list
    /// is empty, or any location entry is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.locations.is_empty() {
            return Err(ValidationError::NoLocations);
        }
        if self.locations.iter().any(|l| l.trim().is_empty()) {
            return Err(ValidationError::BlankLocation);
        }
        Ok(())
    }

    /// Materializes a `Pending` job, filling in defaults for omitted fields.
    #[must_use]
    pub fn into_job(self, id: Uuid, created_at: DateTime<Utc>) -> Job {
        Job {
            id,
            name: self.name,
            locations: self.locations,
            business_type: self
                .business_type
                .unwrap_or_else(|| DEFAULT_BUSINESS_TYPE.to_string()),
            max_reviews: self.max_reviews.unwrap_or(DEFAULT_MAX_REVIEWS),
            min_quality_score: self.min_quality_score.unwrap_or(DEFAULT_MIN_QUALITY_SCORE),
            status: JobStatus::Pending,
            created_at,
            started_at: None,
            completed_at: None,
            total_found: 0,
            total_matching: 0,
            error_message: None,
            reports: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("job name must not be empty")]
    EmptyName,
    #[error("at least one location is required")]
    NoLocations,
    #[error("locations must not contain blank entries")]
    BlankLocation,
}

/// A lifecycle transition command, applied atomically by the store.
#[derive(Debug, Clone)]
pub enum JobTransition {
    Start {
        at: DateTime<Utc>,
    },
    Complete {
        at: DateTime<Utc>,
        total_found: u64,
        total_matching: u64,
        reports: ReportArtifacts,
    },
    Fail {
        at: DateTime<Utc>,
        error: String,
    },
    Cancel {
        at: DateTime<Utc>,
    },
}

impl JobTransition {
    #[must_use]
    pub fn target_status(&self) -> JobStatus {
        match self {
            Self::Start { .. } => JobStatus::Running,
            Self::Complete { .. } => JobStatus::Completed,
            Self::Fail { .. } => JobStatus::Failed,
            Self::Cancel { .. } => JobStatus::Cancelled,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal job transition from {from} to {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl Job {
    /// Applies a transition in place after checking the transition table.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the current status does not admit the
    /// transition's target; the job is left unmodified in that case.
    pub fn apply(&mut self, transition: JobTransition) -> Result<(), TransitionError> {
        let to = transition.target_status();
        if !self.status.can_transition_to(to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }

        match transition {
            JobTransition::Start { at } => {
                self.started_at = Some(at);
            }
            JobTransition::Complete {
                at,
                total_found,
                total_matching,
                reports,
            } => {
                self.completed_at = Some(at);
                self.total_found = total_found;
                self.total_matching = total_matching;
                self.reports = Some(reports);
            }
            JobTransition::Fail { at, error } => {
                self.completed_at = Some(at);
                self.error_message = Some(error);
            }
            JobTransition::Cancel { at } => {
                self.completed_at = Some(at);
            }
        }
        self.status = to;
        Ok(())
    }
}
