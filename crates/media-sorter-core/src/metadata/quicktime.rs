use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use chrono::{DateTime, Utc};

use super::{Tag, TagGroup};

pub const MOVIE_HEADER_GROUP: &str = "QuickTime Movie Header";
pub const CREATED_TAG: &str = "Created";

/// Layout matching the resolver's QuickTime format.
const QUICKTIME_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Seconds between 1904-01-01 and 1970-01-01.
const QT_TO_UNIX_OFFSET: i64 = 2_082_844_800;

#[derive(Debug, Clone, Copy)]
struct AtomRange {
    data_start: u64,
    data_end: u64,
}

/// Read the movie header of an ISO-BMFF / QuickTime container.
///
/// Anything that is not such a container yields no groups.
pub fn read_quicktime_groups(path: &Path) -> Vec<TagGroup> {
    let Ok(file) = File::open(path) else {
        return Vec::new();
    };
    let Ok(len) = file.metadata().map(|m| m.len()) else {
        return Vec::new();
    };
    let mut reader = BufReader::new(file);

    let Some(secs) = read_creation_time(&mut reader, len) else {
        tracing::trace!("No movie header in \"{}\"", path.display());
        return Vec::new();
    };

    let mut group = TagGroup::new(MOVIE_HEADER_GROUP);
    group
        .tags
        .push(Tag::new(CREATED_TAG, creation_description(secs)));
    vec![group]
}

/// Creation time of `moov/mvhd`, in seconds since 1904. Zero means unset.
fn read_creation_time<R: Read + Seek>(reader: &mut R, len: u64) -> Option<u64> {
    let moov = find_atom(reader, 0, len, *b"moov")?;
    let mvhd = find_atom(reader, moov.data_start, moov.data_end, *b"mvhd")?;

    reader.seek(SeekFrom::Start(mvhd.data_start)).ok()?;
    let mut ver_flags = [0u8; 4];
    reader.read_exact(&mut ver_flags).ok()?;
    if ver_flags[0] == 1 {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).ok()?;
        Some(u64::from_be_bytes(buf))
    } else {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).ok()?;
        Some(u32::from_be_bytes(buf) as u64)
    }
}

fn creation_description(qt_seconds: u64) -> Option<String> {
    if qt_seconds == 0 {
        return None;
    }
    let unix = i64::try_from(qt_seconds).ok()?.checked_sub(QT_TO_UNIX_OFFSET)?;
    let utc = DateTime::<Utc>::from_timestamp(unix, 0)?;
    Some(utc.format(QUICKTIME_DATE_FORMAT).to_string())
}

fn find_atom<R: Read + Seek>(reader: &mut R, start: u64, end: u64, atom_type: [u8; 4]) -> Option<AtomRange> {
    let mut offset = start;
    while offset + 8 <= end {
        reader.seek(SeekFrom::Start(offset)).ok()?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header).ok()?;
        let mut atom_size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let atom_kind = [header[4], header[5], header[6], header[7]];
        let mut header_size = 8u64;

        if atom_size == 1 {
            let mut ext = [0u8; 8];
            reader.read_exact(&mut ext).ok()?;
            atom_size = u64::from_be_bytes(ext);
            header_size = 16;
        } else if atom_size == 0 {
            atom_size = end.saturating_sub(offset);
        }
        if atom_size < header_size {
            return None;
        }
        let atom_end = offset.saturating_add(atom_size).min(end);

        if atom_kind == atom_type {
            return Some(AtomRange {
                data_start: offset + header_size,
                data_end: atom_end,
            });
        }
        offset = atom_end;
    }
    None
}
