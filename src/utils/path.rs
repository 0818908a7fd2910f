//! Path helpers for output naming and input discovery

use std::path::{Path, PathBuf};

/// Container extensions picked up by batch mode
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "mkv", "webm", "avi", "m4v", "flv", "ts", "mts", "m2ts", "wmv", "mpg", "mpeg",
];

/// Whether the path looks like a video file by extension
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Lower-cased extension of the input, or `mp4`
pub fn container_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "mp4".to_string())
}

/// `{stem}_{operation}_{millis}.{ext}` next to the input
pub fn default_output_path(input: &Path, operation: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    let millis = chrono::Utc::now().timestamp_millis();
    let file_name = format!("{}_{}_{}.{}", stem, operation, millis, extension);

    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

/// Resolve a path against the current directory without touching the filesystem
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("clip.MP4")));
        assert!(is_video_file(Path::new("/a/b/c.webm")));
        assert!(!is_video_file(Path::new("notes.txt")));
        assert!(!is_video_file(Path::new("noext")));
    }

    #[test]
    fn test_container_extension() {
        assert_eq!(container_extension(Path::new("a.MOV")), "mov");
        assert_eq!(container_extension(Path::new("a")), "mp4");
    }

    #[test]
    fn test_default_output_path() {
        let out = default_output_path(Path::new("/videos/cat.mp4"), "speed", "mp4");
        assert_eq!(out.parent(), Some(Path::new("/videos")));
        let name = out.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("cat_speed_"));
        assert!(name.ends_with(".mp4"));

        let bare = default_output_path(Path::new("cat.mov"), "round", "webm");
        assert_eq!(bare.parent(), Some(Path::new("")));
    }

    #[test]
    fn test_absolute() {
        let abs = absolute(Path::new("x/y.mp4")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("x/y.mp4"));
    }
}
