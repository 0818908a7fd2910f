//! Exclusively-owned temporary directories for multi-step pipelines

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::EngineResult;

/// A uniquely named scratch directory owned by one pipeline run.
///
/// The tree is removed by [`ScratchSpace::release`] or, failing that, when
/// the value is dropped, so every exit path of a pipeline cleans up.
/// Releasing more than once is a no-op.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScratchSpace {
    /// Create a scratch directory under the system temporary root
    pub fn acquire(prefix: &str) -> EngineResult<Self> {
        Self::acquire_in(prefix, std::env::temp_dir())
    }

    /// Create a scratch directory under `root`
    pub fn acquire_in(prefix: &str, root: impl AsRef<Path>) -> EngineResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", prefix))
            .tempdir_in(root)?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "Acquired scratch space");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file directly inside the scratch tree
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Create (if needed) and return a sub-directory
    pub fn subdir(&self, name: &str) -> EngineResult<PathBuf> {
        let dir = self.path.join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    #[cfg(test)]
    pub(crate) fn is_released(&self) -> bool {
        self.dir.is_none()
    }

    /// Recursively remove the scratch tree
    pub fn release(&mut self) -> EngineResult<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        match dir.close() {
            Ok(()) => {
                debug!(path = %self.path.display(), "Released scratch space");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(path = %self.path.display(), error = %e, "Failed to remove scratch space");
        }
    }
}
