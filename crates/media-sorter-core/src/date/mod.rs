pub mod format;
pub mod weight;

use std::path::Path;

use crate::media::{MediaPath, RawDateMetadata, ResolvedDate};
use crate::ThrottledProgress;

pub use format::DateFormat;
pub use weight::weight_for_tag;

/// Parse and weigh a single tag. Parse failure leaves the weight untouched.
pub fn evaluate(raw: &RawDateMetadata) -> ResolvedDate {
    let parsed = DateFormat::for_group(&raw.source_group).parse(&raw.raw_value);
    ResolvedDate {
        source_group: raw.source_group.clone(),
        tag_name: raw.tag_name.clone(),
        raw_value: raw.raw_value.clone(),
        parsed,
        accuracy_weight: weight_for_tag(&raw.tag_name),
    }
}

/// Pick the single most trustworthy date among a file's tags.
///
/// The highest weight wins and ties go to the earliest tag. Selection looks
/// at the tag only: a heavily weighted tag that fails to parse still wins
/// over a lighter one that parsed, leaving the file unresolved.
pub fn resolve(file_id: &Path, triples: &[RawDateMetadata]) -> ResolvedDate {
    if triples.is_empty() {
        tracing::debug!("No date metadata found for \"{}\"", file_id.display());
        return ResolvedDate::unresolved();
    }

    let mut best: Option<ResolvedDate> = None;
    for candidate in triples.iter().map(evaluate) {
        tracing::trace!(
            "\"{}\" | {} / {} = {:?} ({})",
            file_id.display(),
            candidate.source_group,
            candidate.tag_name,
            candidate.parsed,
            candidate.accuracy_weight
        );
        match &best {
            Some(current) if candidate.accuracy_weight <= current.accuracy_weight => {}
            _ => best = Some(candidate),
        }
    }

    let best = best.unwrap_or_else(ResolvedDate::unresolved);
    tracing::debug!(
        "Most accurate date for \"{}\": {} / {} -> {:?}",
        file_id.display(),
        best.source_group,
        best.tag_name,
        best.parsed
    );
    best
}

/// Resolve every file, preserving input order.
pub fn resolve_all(
    files: Vec<(MediaPath, Vec<RawDateMetadata>)>,
    progress: &ThrottledProgress<'_>,
) -> Vec<(MediaPath, ResolvedDate)> {
    let total = files.len() as u64;
    files
        .into_iter()
        .enumerate()
        .map(|(i, (media, triples))| {
            progress.report("date", i as u64, total, "Resolving dates");
            let resolved = resolve(media.path(), &triples);
            (media, resolved)
        })
        .collect()
}
