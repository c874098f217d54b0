use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use media_sorter_core::{
    CancellationToken, CancelledError, PlaceError, ProcessControl, ProcessOptions, ProcessResult,
    SortOutcome,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "media-sorter",
    version,
    about = "Copy photos and videos into year/month folders by the date they were taken"
)]
struct Cli {
    /// Folder to sort (scanned recursively)
    source: PathBuf,

    /// Folder to write the sorted copies to
    #[arg(short, long)]
    output: PathBuf,

    /// Set each copy's modification time to its resolved date
    #[arg(long)]
    set_mtime: bool,

    /// Write a JSON report of every file's outcome
    #[arg(long)]
    report: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Per-file status rows; successes are listed only when `all` is set.
fn status_rows(outcomes: &[SortOutcome], all: bool) -> Vec<String> {
    let shown: Vec<&SortOutcome> = outcomes.iter().filter(|o| all || !o.success).collect();
    if shown.is_empty() {
        return Vec::new();
    }
    let width = shown
        .iter()
        .map(|o| o.source_path.display().to_string().len())
        .max()
        .unwrap_or(0)
        .max("File".len());
    let mut rows = vec![format!("{:<width$}  {}", "File", "Status", width = width)];
    for o in shown {
        rows.push(format!("{:<width$}  {}", o.source_path.display(), o.message, width = width));
    }
    rows
}

fn print_status_table(outcomes: &[SortOutcome], all: bool) {
    let rows = status_rows(outcomes, all);
    if rows.is_empty() {
        return;
    }
    eprintln!();
    for row in rows {
        eprintln!("{}", row);
    }
}

fn write_report(path: &Path, options: &ProcessOptions, result: &ProcessResult) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &json!({ "options": options, "result": result }))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let t_total = std::time::Instant::now();

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel()).context("Failed to install Ctrl-C handler")?;

    let options = ProcessOptions {
        source: cli.source,
        output: cli.output,
        set_mtime: cli.set_mtime,
    };
    let control = ProcessControl::new().with_cancel_token(token);
    tracing::debug!("Sorting {} into {}", options.source.display(), options.output.display());

    let bar = Mutex::new(None::<(String, ProgressBar)>);
    let style = ProgressStyle::with_template("[{prefix}] {wide_bar} {pos}/{len} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());

    let outcome = media_sorter_core::process_with_control(&options, &control, &|stage, current, total, message| {
        let Ok(mut slot) = bar.lock() else {
            return;
        };
        let same_stage = matches!(slot.as_ref(), Some((s, _)) if s == stage);
        if !same_stage {
            if let Some((_, old)) = slot.take() {
                old.finish();
            }
            let pb = ProgressBar::new(total).with_style(style.clone()).with_prefix(stage.to_string());
            *slot = Some((stage.to_string(), pb));
        }
        if let Some((_, pb)) = slot.as_ref() {
            pb.set_position(current + 1);
            pb.set_message(message.to_string());
        }
    });

    if let Ok(mut slot) = bar.lock() {
        if let Some((_, pb)) = slot.take() {
            pb.finish();
        }
    }

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            if e.downcast_ref::<CancelledError>().is_some() {
                tracing::warn!("Cancelled. Files already copied remain in {}", options.output.display());
            } else if let Some(place) = e.downcast_ref::<PlaceError>() {
                let failed = place.outcome();
                tracing::error!("{}: {}", failed.source_path.display(), failed.message);
            }
            return Err(e);
        }
    };

    print_status_table(&result.outcomes, cli.verbose > 0);

    if let Some(report) = &cli.report {
        write_report(report, &options, &result)?;
    }

    if result.total_media == 0 {
        eprintln!("No media files were found in {}.", options.source.display());
        return Ok(());
    }

    eprintln!(
        "Done! {} media files, {} sorted, {} failed, {} without a date ({:.2}s)",
        result.total_media,
        result.files_sorted,
        result.files_failed,
        result.unknown_dates,
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes() -> Vec<SortOutcome> {
        vec![
            SortOutcome::succeeded(Path::new("in/a.jpg"), Path::new("out/2024/10 October/20241015_a.jpg")),
            SortOutcome::failed(Path::new("in/b.jpg"), None, "Destination file already exists.".to_string()),
        ]
    }

    #[test]
    fn test_status_rows_failures_only() {
        let rows = status_rows(&outcomes(), false);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("File"));
        assert!(rows[1].starts_with("in/b.jpg"));
        assert!(rows[1].ends_with("Destination file already exists."));
    }

    #[test]
    fn test_status_rows_all_outcomes() {
        let rows = status_rows(&outcomes(), true);
        assert_eq!(rows.len(), 3);
        assert!(rows[1].starts_with("in/a.jpg"));
        assert!(rows[2].starts_with("in/b.jpg"));
    }

    #[test]
    fn test_status_rows_empty_when_nothing_failed() {
        let all = outcomes();
        assert!(status_rows(&all[..1], false).is_empty());
    }

    #[test]
    fn test_cli_parses_options() {
        let cli = Cli::try_parse_from(["media-sorter", "photos", "-o", "sorted", "--set-mtime", "-vv"]).unwrap();
        assert_eq!(cli.source, PathBuf::from("photos"));
        assert_eq!(cli.output, PathBuf::from("sorted"));
        assert!(cli.set_mtime);
        assert_eq!(cli.verbose, 2);
        assert!(cli.report.is_none());
    }
}
