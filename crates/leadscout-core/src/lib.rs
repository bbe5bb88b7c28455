pub mod app_config;
pub mod config;
pub mod job;
pub mod listing;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use job::{
    ArtifactKind, ArtifactRef, Job, JobStatus, JobTransition, NewJob, ReportArtifacts,
    TransitionError, ValidationError,
};
pub use listing::{NormalizedListing, RawListing, ScoredListing};
