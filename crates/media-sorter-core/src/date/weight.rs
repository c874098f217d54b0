/// Trust placed in each tag as a "date taken" signal, matched case-insensitively.
const TAG_WEIGHTS: &[(&str, f64)] = &[
    ("Date/Time Original", 0.9), // Exif, IPTC
    ("Created", 0.9),            // QuickTime videos
    ("GPS Date Stamp", 0.8),
    ("Date/Time Digitized", 0.7),
    ("Date/Time", 0.6),
    ("File Modified Date", 0.0), // says nothing about when the photo was taken
];

/// Weight for any tag not in the table.
pub const DEFAULT_WEIGHT: f64 = 0.1;

pub fn weight_for_tag(tag_name: &str) -> f64 {
    TAG_WEIGHTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(tag_name))
        .map(|(_, weight)| *weight)
        .unwrap_or(DEFAULT_WEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_weights() {
        for (name, weight) in TAG_WEIGHTS {
            assert_eq!(weight_for_tag(name), *weight);
            assert_eq!(weight_for_tag(&name.to_uppercase()), *weight);
            assert_eq!(weight_for_tag(&name.to_lowercase()), *weight);
        }
    }

    #[test]
    fn test_unknown_tag_gets_default() {
        assert_eq!(weight_for_tag("Date Created"), DEFAULT_WEIGHT);
        assert_eq!(weight_for_tag("Date/Time Original "), DEFAULT_WEIGHT);
        assert_eq!(weight_for_tag(""), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_weights_in_range() {
        assert!(TAG_WEIGHTS.iter().all(|(_, w)| (0.0..=1.0).contains(w)));
    }
}
