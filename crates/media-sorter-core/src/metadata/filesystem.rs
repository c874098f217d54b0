use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::{Tag, TagGroup, FILE_MODIFIED_TAG};

pub const FILE_GROUP: &str = "File";

/// Same layout the date resolver expects for the "File" group.
const FILE_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %:z %Y";

/// Filesystem timestamps, reported as a "File" group.
pub fn read_filesystem_group(path: &Path) -> io::Result<TagGroup> {
    let meta = std::fs::metadata(path)?;
    let mut group = TagGroup::new(FILE_GROUP);

    let modified = meta
        .modified()
        .ok()
        .map(|t| DateTime::<Utc>::from(t).format(FILE_DATE_FORMAT).to_string());
    group.tags.push(Tag::new(FILE_MODIFIED_TAG, modified));

    Ok(group)
}
