use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// How a raw date string from a given metadata group is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    Exif,
    Iptc,
    Gps,
    FileModified,
    Icc,
    QuickTime,
    /// Unknown group: try a fixed list of common layouts
    FreeForm,
}

/// Group-name fragments, matched case-insensitively in order; first hit wins.
const GROUP_FORMATS: &[(&str, DateFormat)] = &[
    ("Exif", DateFormat::Exif),
    ("IPTC", DateFormat::Iptc),
    ("GPS", DateFormat::Gps),
    // before "File": "ICC Profile" and "QuickTime File Type" both contain it
    ("ICC", DateFormat::Icc),
    ("QuickTime", DateFormat::QuickTime),
    ("File", DateFormat::FileModified),
];

#[derive(Debug, Clone, Copy)]
enum Layout {
    DateTime(&'static str),
    Date(&'static str),
    /// Carries an offset; the wall-clock time as written is kept
    Zoned(&'static str),
    Rfc3339,
    Rfc2822,
}

const EXIF_LAYOUTS: &[Layout] = &[Layout::DateTime("%Y:%m:%d %H:%M:%S")];

const IPTC_LAYOUTS: &[Layout] = &[Layout::DateTime("%Y:%m:%d %H:%M:%S"), Layout::Date("%m/%d/%Y")];

const GPS_LAYOUTS: &[Layout] = &[Layout::Date("%Y:%m:%d")];

const FILE_LAYOUTS: &[Layout] = &[Layout::Zoned("%a %b %d %H:%M:%S %:z %Y")];

const QUICKTIME_LAYOUTS: &[Layout] = &[Layout::DateTime("%a %b %d %H:%M:%S %Y")];

const FREE_FORM_LAYOUTS: &[Layout] = &[
    Layout::Rfc3339,
    Layout::Rfc2822,
    Layout::Zoned("%Y-%m-%dT%H:%M:%S%.f%:z"),
    Layout::DateTime("%Y-%m-%dT%H:%M:%S%.fZ"),
    Layout::DateTime("%Y-%m-%dT%H:%M:%S%.f"),
    Layout::DateTime("%Y-%m-%d %H:%M:%S%.f"),
    Layout::DateTime("%Y-%m-%d %H:%M"),
    Layout::DateTime("%Y/%m/%d %H:%M:%S"),
    Layout::DateTime("%Y:%m:%d %H:%M:%S"),
    Layout::DateTime("%Y.%m.%d %H:%M:%S"),
    Layout::DateTime("%m/%d/%Y %H:%M:%S"),
    Layout::DateTime("%m/%d/%Y %I:%M:%S %p"),
    Layout::DateTime("%m/%d/%Y %I:%M %p"),
    Layout::DateTime("%d %B %Y %H:%M:%S"),
    Layout::Date("%Y-%m-%d"),
    Layout::Date("%Y/%m/%d"),
    Layout::Date("%Y.%m.%d"),
    Layout::Date("%Y:%m:%d"),
    Layout::Date("%m/%d/%Y"),
    Layout::Date("%d %B %Y"),
    Layout::Date("%B %d, %Y"),
    Layout::Date("%d %b %Y"),
    Layout::Date("%b %d, %Y"),
];

impl Layout {
    fn parse(self, s: &str) -> Option<NaiveDateTime> {
        match self {
            Layout::DateTime(fmt) => NaiveDateTime::parse_from_str(s, fmt).ok(),
            Layout::Date(fmt) => NaiveDate::parse_from_str(s, fmt).ok()?.and_hms_opt(0, 0, 0),
            Layout::Zoned(fmt) => DateTime::parse_from_str(s, fmt).ok().map(|dt| dt.naive_local()),
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()),
            Layout::Rfc2822 => DateTime::parse_from_rfc2822(s).ok().map(|dt| dt.naive_local()),
        }
    }
}

impl DateFormat {
    /// Pick the format for a metadata group name.
    pub fn for_group(group: &str) -> Self {
        let group = group.to_ascii_lowercase();
        GROUP_FORMATS
            .iter()
            .find(|(key, _)| group.contains(&key.to_ascii_lowercase()))
            .map(|(_, format)| *format)
            .unwrap_or(DateFormat::FreeForm)
    }

    fn layouts(self) -> &'static [Layout] {
        match self {
            DateFormat::Exif | DateFormat::Icc => EXIF_LAYOUTS,
            DateFormat::Iptc => IPTC_LAYOUTS,
            DateFormat::Gps => GPS_LAYOUTS,
            DateFormat::FileModified => FILE_LAYOUTS,
            DateFormat::QuickTime => QUICKTIME_LAYOUTS,
            DateFormat::FreeForm => FREE_FORM_LAYOUTS,
        }
    }

    /// Parse a raw value; `None` when no layout of this format matches.
    pub fn parse(self, raw: &str) -> Option<NaiveDateTime> {
        let s = raw.trim_matches(|c: char| c.is_whitespace() || c == '\0');
        if s.is_empty() {
            return None;
        }
        self.layouts().iter().find_map(|layout| layout.parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_group_lookup() {
        assert_eq!(DateFormat::for_group("Exif SubIFD"), DateFormat::Exif);
        assert_eq!(DateFormat::for_group("exif ifd0"), DateFormat::Exif);
        assert_eq!(DateFormat::for_group("IPTC"), DateFormat::Iptc);
        assert_eq!(DateFormat::for_group("GPS"), DateFormat::Gps);
        assert_eq!(DateFormat::for_group("File"), DateFormat::FileModified);
        assert_eq!(DateFormat::for_group("ICC Profile"), DateFormat::Icc);
        assert_eq!(DateFormat::for_group("QuickTime Movie Header"), DateFormat::QuickTime);
        assert_eq!(DateFormat::for_group("XMP"), DateFormat::FreeForm);
    }

    #[test]
    fn test_parse_per_group() {
        let cases = [
            ("Exif", "2025:10:01 00:00:00", dt(2025, 10, 1, 0, 0, 0)),
            ("File", "Wed Oct 01 00:00:00 -00:00 2025", dt(2025, 10, 1, 0, 0, 0)),
            ("File", "Wed Oct 01 09:15:00 +02:00 2025", dt(2025, 10, 1, 9, 15, 0)),
            ("GPS", "2025:10:01", dt(2025, 10, 1, 0, 0, 0)),
            ("ICC", "2025:10:01 00:00:00", dt(2025, 10, 1, 0, 0, 0)),
            ("IPTC", "10/01/2025", dt(2025, 10, 1, 0, 0, 0)),
            ("IPTC", "2025:10:01 08:00:00", dt(2025, 10, 1, 8, 0, 0)),
            ("QuickTime", "Wed Oct 01 00:00:00 2025", dt(2025, 10, 1, 0, 0, 0)),
            ("Unknown", "2025/10/01", dt(2025, 10, 1, 0, 0, 0)),
        ];
        for (group, raw, expected) in cases {
            assert_eq!(DateFormat::for_group(group).parse(raw), Some(expected), "{group}: {raw}");
        }
    }

    #[test]
    fn test_free_form_layouts() {
        let f = DateFormat::FreeForm;
        assert_eq!(f.parse("2024-01-15T08:30:00+09:00"), Some(dt(2024, 1, 15, 8, 30, 0)));
        assert_eq!(f.parse("2024-01-15 08:30"), Some(dt(2024, 1, 15, 8, 30, 0)));
        assert_eq!(f.parse("15 January 2024"), Some(dt(2024, 1, 15, 0, 0, 0)));
        assert_eq!(f.parse("Jan 15, 2024"), Some(dt(2024, 1, 15, 0, 0, 0)));
        assert_eq!(f.parse("yesterday"), None);
    }

    #[test]
    fn test_free_form_utc_and_12_hour_forms() {
        let f = DateFormat::FreeForm;
        assert_eq!(f.parse("2024-10-15T12:30:45Z"), Some(dt(2024, 10, 15, 12, 30, 45)));
        assert_eq!(f.parse("2024-10-15T12:30:45.120Z").map(|d| d.date()), Some(dt(2024, 10, 15, 0, 0, 0).date()));
        assert_eq!(f.parse("Tue, 15 Oct 2024 12:30:45 GMT"), Some(dt(2024, 10, 15, 12, 30, 45)));
        assert_eq!(f.parse("Tue, 15 Oct 2024 12:30:45 +0200"), Some(dt(2024, 10, 15, 12, 30, 45)));
        assert_eq!(f.parse("10/15/2024 12:30:45 PM"), Some(dt(2024, 10, 15, 12, 30, 45)));
        assert_eq!(f.parse("10/15/2024 01:05:00 AM"), Some(dt(2024, 10, 15, 1, 5, 0)));
        assert_eq!(f.parse("10/15/2024 7:05 PM"), Some(dt(2024, 10, 15, 19, 5, 0)));
    }

    #[test]
    fn test_parse_trims_padding() {
        assert_eq!(
            DateFormat::Exif.parse(" 2024:01:15 14:30:00\0\0"),
            Some(dt(2024, 1, 15, 14, 30, 0))
        );
    }

    #[test]
    fn test_parse_rejects_wrong_layout() {
        assert_eq!(DateFormat::Exif.parse("2024-01-15 14:30:00"), None);
        assert_eq!(DateFormat::Gps.parse("2024:13:01"), None);
        assert_eq!(DateFormat::QuickTime.parse(""), None);
        assert_eq!(DateFormat::Exif.parse("0000:00:00 00:00:00"), None);
    }
}
