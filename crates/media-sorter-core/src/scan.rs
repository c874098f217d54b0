use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::media::MediaPath;

/// Image formats, lowercase without the dot
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "heic", "heif", "avif", "bmp", "dng", "gif", "ico", "jfif", "webp",
];

/// Video formats, lowercase without the dot
const VIDEO_EXTENSIONS: &[&str] = &["avci", "avi", "mov", "mp4"];

/// Every extension the scanner accepts.
pub const SUPPORTED_EXTENSIONS: &[&[&str]] = &[IMAGE_EXTENSIONS, VIDEO_EXTENSIONS];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Check a path's extension against the allow-list (case-insensitive).
pub fn is_supported(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    SUPPORTED_EXTENSIONS
        .iter()
        .flat_map(|group| group.iter())
        .any(|supported| supported.eq_ignore_ascii_case(ext))
}

pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
}

/// Source of media files for the pipeline.
pub trait MediaScanner {
    fn scan(&self, root: &Path) -> Result<Vec<MediaPath>, ScanError>;
}

/// Recursive filesystem walk filtered by extension.
#[derive(Debug, Default, Clone)]
pub struct DirectoryScanner;

impl MediaScanner for DirectoryScanner {
    fn scan(&self, root: &Path) -> Result<Vec<MediaPath>, ScanError> {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let mut media = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    if let Some(m) = MediaPath::new(entry.into_path()) {
                        media.push(m);
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        tracing::debug!("Found {} media files under {}", media.len(), root.display());
        Ok(media)
    }
}
