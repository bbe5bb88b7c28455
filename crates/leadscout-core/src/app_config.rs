use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Directory report artifacts are written into; created on demand.
    pub reports_dir: PathBuf,
    /// Base URL of the external extraction service.
    pub extractor_base_url: String,
    pub extractor_timeout_secs: u64,
    pub extractor_user_agent: String,
    /// Six-field cron expression for the stale-job sweep.
    pub sweep_schedule: String,
}
