use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{Context, Field, In, Reader, Tag, Value};

use super::{Tag as MetaTag, TagGroup};

/// Display names for the tags the date resolver knows how to weigh.
const TAG_NAMES: &[(Tag, &str)] = &[
    (Tag::DateTimeOriginal, "Date/Time Original"),
    (Tag::DateTimeDigitized, "Date/Time Digitized"),
    (Tag::DateTime, "Date/Time"),
    (Tag::GPSDateStamp, "GPS Date Stamp"),
];

fn group_name(context: Context) -> &'static str {
    match context {
        Context::Tiff => "Exif IFD0",
        Context::Exif => "Exif SubIFD",
        Context::Gps => "GPS",
        _ => "Exif",
    }
}

fn tag_name(tag: Tag) -> String {
    TAG_NAMES
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| tag.to_string())
}

/// ASCII values are returned raw; `display_value()` would wrap them in quotes.
fn describe(field: &Field) -> String {
    match &field.value {
        Value::Ascii(parts) if !parts.is_empty() => String::from_utf8_lossy(&parts[0])
            .trim_end_matches('\0')
            .to_string(),
        _ => field.display_value().to_string(),
    }
}

/// Read the primary-image EXIF fields of a file, grouped by IFD.
///
/// Files without an EXIF block produce no groups.
pub fn read_exif_groups(path: &Path) -> Vec<TagGroup> {
    let Ok(file) = File::open(path) else {
        return Vec::new();
    };
    let exif = match Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::trace!("No EXIF in \"{}\": {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut groups: Vec<TagGroup> = Vec::new();
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let name = group_name(field.tag.context());
        let tag = MetaTag::new(tag_name(field.tag), Some(describe(field)));
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.tags.push(tag),
            None => {
                let mut group = TagGroup::new(name);
                group.tags.push(tag);
                groups.push(group);
            }
        }
    }
    groups
}
