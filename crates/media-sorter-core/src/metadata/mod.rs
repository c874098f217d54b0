pub mod exif;
pub mod filesystem;
pub mod quicktime;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::media::{MediaPath, RawDateMetadata};
use crate::scan;
use crate::ThrottledProgress;

/// Tag excluded from collection: it records when the file was last written, not taken.
pub const FILE_MODIFIED_TAG: &str = "File Modified Date";

/// A single named field inside a metadata group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub description: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }
}

/// A logical metadata block (Exif SubIFD, GPS, QuickTime Movie Header, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagGroup {
    pub name: String,
    pub tags: Vec<Tag>,
}

impl TagGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unable to read \"{path}\": {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads every metadata group a file carries.
pub trait MetadataDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<TagGroup>, DecodeError>;
}

/// Decoder backed by the file itself: embedded EXIF for images, the
/// movie header for videos, and filesystem timestamps for everything.
#[derive(Debug, Default, Clone)]
pub struct FileMetadataDecoder;

impl MetadataDecoder for FileMetadataDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<TagGroup>, DecodeError> {
        let fs_group = filesystem::read_filesystem_group(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut groups = if scan::is_video(path) {
            quicktime::read_quicktime_groups(path)
        } else {
            exif::read_exif_groups(path)
        };
        groups.push(fs_group);
        Ok(groups)
    }
}

fn is_date_tag(name: &str) -> bool {
    !name.eq_ignore_ascii_case(FILE_MODIFIED_TAG) && (name.contains("Date") || name.contains("Created"))
}

/// Keep only the date-like tags of a file, in decoder order.
///
/// A file that cannot be decoded yields an empty list so that it flows
/// through resolution as "no metadata".
pub fn collect_date_metadata(decoder: &dyn MetadataDecoder, path: &Path) -> Vec<RawDateMetadata> {
    let groups = match decoder.decode(path) {
        Ok(groups) => groups,
        Err(e) => {
            tracing::debug!("Unable to get metadata for \"{}\": {}", path.display(), e);
            return Vec::new();
        }
    };

    let dates: Vec<RawDateMetadata> = groups
        .into_iter()
        .flat_map(|group| {
            let group_name = group.name;
            group
                .tags
                .into_iter()
                .filter(|tag| is_date_tag(&tag.name))
                .map(move |tag| {
                    RawDateMetadata::new(group_name.clone(), tag.name, tag.description.unwrap_or_default())
                })
        })
        .collect();

    if dates.is_empty() {
        tracing::debug!("No date metadata found for \"{}\"", path.display());
    }
    dates
}

/// Collect date metadata for every file, preserving input order.
pub fn collect_all(
    decoder: &dyn MetadataDecoder,
    media: Vec<MediaPath>,
    progress: &ThrottledProgress<'_>,
) -> Vec<(MediaPath, Vec<RawDateMetadata>)> {
    let total = media.len() as u64;
    media
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            progress.report("metadata", i as u64, total, "Reading metadata");
            let dates = collect_date_metadata(decoder, m.path());
            (m, dates)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct FakeDecoder(Vec<TagGroup>);

    impl MetadataDecoder for FakeDecoder {
        fn decode(&self, _path: &Path) -> Result<Vec<TagGroup>, DecodeError> {
            Ok(self.0.clone())
        }
    }

    struct FailingDecoder;

    impl MetadataDecoder for FailingDecoder {
        fn decode(&self, path: &Path) -> Result<Vec<TagGroup>, DecodeError> {
            Err(DecodeError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "corrupt"),
            })
        }
    }

    fn group(name: &str, tags: &[(&str, Option<&str>)]) -> TagGroup {
        TagGroup {
            name: name.to_string(),
            tags: tags
                .iter()
                .map(|(n, d)| Tag::new(*n, d.map(str::to_string)))
                .collect(),
        }
    }

    #[test]
    fn test_collect_filters_date_tags() {
        let decoder = FakeDecoder(vec![
            group(
                "Exif IFD0",
                &[("Make", Some("Canon")), ("Date/Time", Some("2024:01:02 03:04:05"))],
            ),
            group(
                "Exif SubIFD",
                &[("Date/Time Original", Some("2024:01:01 10:00:00")), ("Exposure Time", Some("1/60 sec"))],
            ),
            group("QuickTime Movie Header", &[("Created", None)]),
            group("File", &[("File Modified Date", Some("Wed Oct 01 00:00:00 +00:00 2025"))]),
        ]);

        let dates = collect_date_metadata(&decoder, Path::new("a.jpg"));
        assert_eq!(
            dates,
            vec![
                RawDateMetadata::new("Exif IFD0", "Date/Time", "2024:01:02 03:04:05"),
                RawDateMetadata::new("Exif SubIFD", "Date/Time Original", "2024:01:01 10:00:00"),
                RawDateMetadata::new("QuickTime Movie Header", "Created", ""),
            ]
        );
    }

    #[test]
    fn test_collect_excludes_file_modified_case_insensitively() {
        let decoder = FakeDecoder(vec![group("File", &[("file modified date", Some("x"))])]);
        assert!(collect_date_metadata(&decoder, Path::new("a.jpg")).is_empty());
    }

    #[test]
    fn test_decode_failure_degrades_to_empty() {
        assert!(collect_date_metadata(&FailingDecoder, Path::new("a.jpg")).is_empty());
    }

    #[test]
    fn test_file_decoder_on_plain_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not_really.jpg");
        fs::write(&path, b"not an image").unwrap();

        let groups = FileMetadataDecoder.decode(&path).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, filesystem::FILE_GROUP);
        assert!(collect_date_metadata(&FileMetadataDecoder, &path).is_empty());
    }

    #[test]
    fn test_file_decoder_missing_file() {
        let dir = tempdir().unwrap();
        assert!(FileMetadataDecoder.decode(&dir.path().join("gone.jpg")).is_err());
    }
}
