//! Concat manifests for the engine's concatenation demuxer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::engine::scratch::ScratchSpace;
use crate::error::EngineResult;
use crate::utils::path::absolute;

/// Name of the manifest file inside a scratch tree
pub const MANIFEST_FILE_NAME: &str = "concat.txt";

/// Writes ordered `file '...'` manifests
pub struct ConcatManifestBuilder;

impl ConcatManifestBuilder {
    /// Single manifest line for one clip path
    ///
    /// Embedded single quotes are closed, escaped and reopened (`'\''`).
    pub fn entry(path: &Path) -> String {
        let escaped = path.to_string_lossy().replace('\'', "'\\''");
        format!("file '{}'", escaped)
    }

    /// Write one line per path, in the given order, into the scratch tree.
    ///
    /// The order of `ordered_paths` becomes the temporal order of the merged
    /// output, so callers pass clips in extraction order.
    pub fn build(scratch: &ScratchSpace, ordered_paths: &[PathBuf]) -> EngineResult<PathBuf> {
        let manifest_path = scratch.file(MANIFEST_FILE_NAME);
        let mut writer = BufWriter::new(File::create(&manifest_path)?);
        for path in ordered_paths {
            let path = absolute(path)?;
            writeln!(writer, "{}", Self::entry(&path))?;
        }
        writer.flush()?;

        debug!(
            manifest = %manifest_path.display(),
            entries = ordered_paths.len(),
            "Wrote concat manifest"
        );
        Ok(manifest_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_entry_escapes_single_quotes() {
        assert_eq!(
            ConcatManifestBuilder::entry(Path::new("/tmp/it's/part0.mp4")),
            "file '/tmp/it'\\''s/part0.mp4'"
        );
        assert_eq!(
            ConcatManifestBuilder::entry(Path::new("/tmp/plain.mp4")),
            "file '/tmp/plain.mp4'"
        );
    }

    #[test]
    fn test_build_preserves_given_order() {
        let root = TempDir::new().unwrap();
        let scratch = ScratchSpace::acquire_in("manifest", root.path()).unwrap();
        let paths: Vec<PathBuf> = [2, 0, 10, 1]
            .iter()
            .map(|i| scratch.file(&format!("part{}.mp4", i)))
            .collect();

        let manifest = ConcatManifestBuilder::build(&scratch, &paths).unwrap();
        assert_eq!(manifest.parent(), Some(scratch.path()));

        let content = std::fs::read_to_string(&manifest).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("part2.mp4'"));
        assert!(lines[1].ends_with("part0.mp4'"));
        assert!(lines[2].ends_with("part10.mp4'"));
        assert!(lines[3].ends_with("part1.mp4'"));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_build_makes_relative_paths_absolute() {
        let root = TempDir::new().unwrap();
        let scratch = ScratchSpace::acquire_in("manifest", root.path()).unwrap();

        let manifest =
            ConcatManifestBuilder::build(&scratch, &[PathBuf::from("clips/part0.mp4")]).unwrap();
        let content = std::fs::read_to_string(manifest).unwrap();
        let quoted = content.trim_end().trim_start_matches("file '");
        assert!(Path::new(quoted.trim_end_matches('\'')).is_absolute());
    }
}
