use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::scan;

/// A file on disk whose extension is on the supported media allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaPath(PathBuf);

impl MediaPath {
    /// Returns `None` when the extension is not a supported media format.
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        scan::is_supported(&path).then_some(Self(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Final path component, lossily converted.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl AsRef<Path> for MediaPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// One date-like tag reported by the metadata decoder for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDateMetadata {
    /// Metadata block the tag came from ("Exif SubIFD", "GPS", ...)
    pub source_group: String,
    pub tag_name: String,
    /// Description string as reported, empty when absent
    pub raw_value: String,
}

impl RawDateMetadata {
    pub fn new(
        source_group: impl Into<String>,
        tag_name: impl Into<String>,
        raw_value: impl Into<String>,
    ) -> Self {
        Self {
            source_group: source_group.into(),
            tag_name: tag_name.into(),
            raw_value: raw_value.into(),
        }
    }
}

/// The single date chosen for a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDate {
    pub source_group: String,
    pub tag_name: String,
    pub raw_value: String,
    /// `None` means unresolved: the selected tag did not parse, or there was no tag
    pub parsed: Option<NaiveDateTime>,
    /// Trust in the selected tag, 0.0 ..= 1.0
    pub accuracy_weight: f64,
}

impl ResolvedDate {
    /// Placeholder for a file with no date metadata at all.
    pub fn unresolved() -> Self {
        Self {
            source_group: String::new(),
            tag_name: String::new(),
            raw_value: String::new(),
            parsed: None,
            accuracy_weight: 0.0,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.parsed.is_some()
    }
}

/// Result of placing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOutcome {
    pub source_path: PathBuf,
    /// Where the copy was (or would have been) written
    pub destination: Option<PathBuf>,
    pub success: bool,
    pub message: String,
}

impl SortOutcome {
    pub fn succeeded(source_path: &Path, destination: &Path) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            destination: Some(destination.to_path_buf()),
            success: true,
            message: format!("Copied to \"{}\"", destination.display()),
        }
    }

    pub fn failed(source_path: &Path, destination: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            destination: destination.map(Path::to_path_buf),
            success: false,
            message: message.into(),
        }
    }
}
