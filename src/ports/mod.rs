// Ports - Interface definitions (contracts)

use std::path::Path;

use crate::domain::model::{CommandSpec, RunResult};
use crate::engine::progress::ProgressCallback;

/// Port for running one external engine invocation
///
/// Implementations block until the process exits and never return an
/// error past this boundary: launch, exit-status and I/O problems all
/// become [`RunResult::Failed`]. Exactly one progress sample is emitted per
/// output line, followed by a final `1.0` on success or `0.0` on failure.
pub trait ExecutePort: Send + Sync {
    fn run(&self, spec: &CommandSpec, progress: &dyn ProgressCallback) -> RunResult;
}

/// Port for learning a media asset's duration without transcoding it
///
/// Probing is advisory: `None` means "unknown" and is never fatal.
pub trait ProbePort: Send + Sync {
    fn duration(&self, path: &Path) -> Option<f64>;
}
