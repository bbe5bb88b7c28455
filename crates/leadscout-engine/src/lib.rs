//! Job orchestration: execution handles, background runs, cooperative
//! cancellation, and the external extraction/export contracts.

pub mod error;
pub mod export;
pub mod extract;
pub mod orchestrator;
pub mod registry;

pub use error::{ExecutionError, ExportError, ExtractError, OrchestratorError};
pub use export::{FileExporter, ReportExporter, ReportMeta};
pub use extract::{Extractor, HttpExtractor};
pub use orchestrator::JobOrchestrator;
pub use registry::ExecutionRegistry;
