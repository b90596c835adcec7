pub mod orchestrator;
pub mod progress;

pub use orchestrator::{InstallOutcome, InstallRequest, InstallationOrchestrator};
pub use progress::{percent, InstallPhase, ProgressEvent, ProgressSink};
