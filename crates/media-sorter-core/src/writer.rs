use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::media::{MediaPath, ResolvedDate, SortOutcome};

/// Folder under the output root for files without a usable date.
pub const UNKNOWN_DIR: &str = "unknown";

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceOptions {
    /// Stamp each copy's modification time with its resolved date
    pub set_mtime: bool,
}

/// A failure that is not about the file itself (permissions, full disk, ...).
///
/// The outcome for the file is recorded in the error; placement stops after it.
#[derive(Debug, Error)]
pub enum PlaceError {
    #[error("Unexpected error placing \"{}\": {source}", .outcome.source_path.display())]
    Environment {
        outcome: SortOutcome,
        #[source]
        source: io::Error,
    },
}

impl PlaceError {
    pub fn outcome(&self) -> &SortOutcome {
        match self {
            PlaceError::Environment { outcome, .. } => outcome,
        }
    }
}

enum CopyFailure {
    /// Reported on the file and skipped
    Skipped(String),
    Fatal(io::Error),
}

/// Create a directory and its parents unless it already exists.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Directory a file belongs in: `<root>/<yyyy>/<MM Month>` or `<root>/unknown`.
pub fn destination_dir(output_root: &Path, date: Option<NaiveDateTime>) -> PathBuf {
    match date {
        Some(dt) => output_root
            .join(dt.format("%Y").to_string())
            .join(dt.format("%m %B").to_string()),
        None => output_root.join(UNKNOWN_DIR),
    }
}

/// File name of the copy: dated files get a `yyyyMMdd_` prefix.
pub fn destination_name(file_name: &str, date: Option<NaiveDateTime>) -> String {
    match date {
        Some(dt) => format!("{}_{}", dt.format("%Y%m%d"), file_name),
        None => file_name.to_string(),
    }
}

/// Copy without ever replacing an existing destination.
fn copy_new(source: &Path, dest: &Path) -> Result<(), CopyFailure> {
    let mut input = match File::open(source) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CopyFailure::Skipped(format!(
                "Could not find the source file \"{}\" to copy",
                source.display()
            )));
        }
        Err(e) => return Err(CopyFailure::Fatal(e)),
    };

    let output = match OpenOptions::new().write(true).create_new(true).open(dest) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(CopyFailure::Skipped(format!(
                "Destination file \"{}\" already exists.",
                dest.display()
            )));
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let folder = dest.parent().unwrap_or(dest);
            let name = dest.file_name().unwrap_or_default();
            return Err(CopyFailure::Skipped(format!(
                "Destination folder \"{}\" does not exist for file \"{}\"",
                folder.display(),
                name.to_string_lossy()
            )));
        }
        Err(e) => return Err(CopyFailure::Fatal(e)),
    };

    let mut writer = BufWriter::new(output);
    let copied = io::copy(&mut input, &mut writer).and_then(|_| writer.flush());
    if let Err(e) = copied {
        drop(writer);
        // Remove the partial copy.
        fs::remove_file(dest).ok();
        return Err(CopyFailure::Fatal(e));
    }
    Ok(())
}

fn stamp_mtime(dest: &Path, date: NaiveDateTime) {
    if let Some(local) = date.and_local_timezone(chrono::Local).single() {
        let ft = filetime::FileTime::from_unix_time(local.timestamp(), 0);
        filetime::set_file_mtime(dest, ft).ok();
    }
}

/// Lazy placement of files into the dated hierarchy.
///
/// Yields one outcome per file, in input order. Per-file problems (missing
/// source, name collision) are `Ok` outcomes with `success == false`; an
/// environment error is yielded as `Err` and ends the sequence.
pub struct PlaceAll<I> {
    output_root: PathBuf,
    files: I,
    options: PlaceOptions,
    created_dirs: HashSet<PathBuf>,
    halted: bool,
}

/// Start placing `files` under `output_root`. Nothing happens until the
/// returned iterator is consumed.
pub fn place_all<I>(output_root: &Path, files: I, options: PlaceOptions) -> PlaceAll<I::IntoIter>
where
    I: IntoIterator<Item = (MediaPath, ResolvedDate)>,
{
    PlaceAll {
        output_root: output_root.to_path_buf(),
        files: files.into_iter(),
        options,
        created_dirs: HashSet::new(),
        halted: false,
    }
}

impl<I> PlaceAll<I> {
    fn ensure_dir_once(&mut self, dir: &Path) -> io::Result<()> {
        if !self.created_dirs.contains(dir) {
            ensure_dir(dir)?;
            self.created_dirs.insert(dir.to_path_buf());
        }
        Ok(())
    }

    fn place(&mut self, media: &MediaPath, date: &ResolvedDate) -> Result<SortOutcome, PlaceError> {
        let source = media.path();
        let dir = destination_dir(&self.output_root, date.parsed);
        let dest = dir.join(destination_name(&media.file_name(), date.parsed));

        if date.parsed.is_none() {
            tracing::debug!(
                "Couldn't determine date taken for \"{}\". Saving to \"{}\"",
                source.display(),
                UNKNOWN_DIR
            );
        }

        if let Err(e) = self.ensure_dir_once(&dir) {
            return Err(fatal(source, &dest, e));
        }

        tracing::debug!("Attempting to save \"{}\" to \"{}\"", source.display(), dest.display());
        match copy_new(source, &dest) {
            Ok(()) => {
                if self.options.set_mtime {
                    if let Some(dt) = date.parsed {
                        stamp_mtime(&dest, dt);
                    }
                }
                Ok(SortOutcome::succeeded(source, &dest))
            }
            Err(CopyFailure::Skipped(message)) => {
                tracing::warn!("{}", message);
                Ok(SortOutcome::failed(source, Some(&dest), message))
            }
            Err(CopyFailure::Fatal(e)) => Err(fatal(source, &dest, e)),
        }
    }
}

fn fatal(source: &Path, dest: &Path, e: io::Error) -> PlaceError {
    let outcome = SortOutcome::failed(source, Some(dest), format!("An unexpected error occurred: {}", e));
    tracing::error!("\"{}\": {}", source.display(), outcome.message);
    PlaceError::Environment { outcome, source: e }
}

impl<I> Iterator for PlaceAll<I>
where
    I: Iterator<Item = (MediaPath, ResolvedDate)>,
{
    type Item = Result<SortOutcome, PlaceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let Some((media, date)) = self.files.next() else {
            self.halted = true;
            return None;
        };
        let result = self.place(&media, &date);
        match &result {
            Ok(outcome) => tracing::debug!(
                "\"{}\" sorting status: {}. Message: {}",
                media.path().display(),
                if outcome.success { "Successful" } else { "Unsuccessful" },
                outcome.message
            ),
            Err(_) => self.halted = true,
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.halted {
            (0, Some(0))
        } else {
            (0, self.files.size_hint().1)
        }
    }
}

impl<I> FusedIterator for PlaceAll<I> where I: Iterator<Item = (MediaPath, ResolvedDate)> {}
