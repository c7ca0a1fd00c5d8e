//! Large-file detection: walk the tree, analyze every file independently in
//! parallel, keep the ones that exceed policy thresholds.

use crate::config::Policy;
use crate::core::{FileMetrics, ParsedFile, SkippedFile};
use crate::io::FileWalker;
use crate::metrics;
use anyhow::Result;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// One analyzed file. The parse result is retained so later stages (the
/// reverse-import index, grouping) never re-parse.
#[derive(Debug)]
pub struct DetectionRecord {
    pub metrics: FileMetrics,
    pub parsed: Option<ParsedFile>,
}

#[derive(Debug, Default)]
pub struct Detection {
    pub root: PathBuf,
    pub records: Vec<DetectionRecord>,
    pub skipped: Vec<SkippedFile>,
}

impl Detection {
    /// Records exceeding a detection threshold, parse-clean only.
    pub fn oversized<'a>(&'a self, policy: &'a Policy) -> impl Iterator<Item = &'a DetectionRecord> {
        self.records.iter().filter(|record| {
            !record.metrics.parse_error
                && metrics::is_oversized(
                    record.metrics.physical_lines,
                    record.metrics.cyclomatic_complexity,
                    &policy.thresholds,
                )
        })
    }
}

/// Walk `root` and analyze each file. Per-file work shares no mutable state;
/// unreadable files are recorded as skipped, parse failures yield metrics
/// with the parse-error flag, and neither fails the run.
pub fn scan_tree(root: &Path, policy: &Policy, show_progress: bool) -> Result<Detection> {
    let files = FileWalker::new(root.to_path_buf(), &policy.walk).walk()?;
    log::info!("analyzing {} files under {}", files.len(), root.display());

    let bar = if show_progress {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message("analyzing");
        bar
    } else {
        ProgressBar::hidden()
    };

    let outcomes: Vec<std::result::Result<DetectionRecord, SkippedFile>> = files
        .par_iter()
        .progress_with(bar)
        .map(|path| analyze_one(path, policy))
        .collect();

    let mut detection = Detection {
        root: root.to_path_buf(),
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            Ok(record) => detection.records.push(record),
            Err(skipped) => detection.skipped.push(skipped),
        }
    }
    Ok(detection)
}

fn analyze_one(path: &Path, policy: &Policy) -> std::result::Result<DetectionRecord, SkippedFile> {
    let source = std::fs::read_to_string(path).map_err(|err| SkippedFile {
        path: path.to_path_buf(),
        reason: format!("unreadable: {err}"),
    })?;

    match syn::parse_file(&source) {
        Ok(ast) => {
            let parsed = ParsedFile {
                path: path.to_path_buf(),
                source,
                ast,
            };
            let metrics = metrics::compute(path, &parsed.source, Some(&parsed.ast), policy);
            Ok(DetectionRecord {
                metrics,
                parsed: Some(parsed),
            })
        }
        Err(err) => {
            log::debug!("parse failure in {}, keeping metrics only: {err}", path.display());
            let metrics = metrics::compute(path, &source, None, policy);
            Ok(DetectionRecord {
                metrics,
                parsed: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn parse_failures_do_not_abort_the_run() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/ok.rs", "pub fn fine() {}\n");
        write(tmp.path(), "src/broken.rs", "fn broken( {\n");

        let detection = scan_tree(tmp.path(), &Policy::default(), false).unwrap();
        assert_eq!(detection.records.len(), 2);
        let broken = detection
            .records
            .iter()
            .find(|r| r.metrics.path.ends_with("broken.rs"))
            .unwrap();
        assert!(broken.metrics.parse_error);
        assert!(broken.parsed.is_none());
    }

    #[test]
    fn unreadable_files_are_recorded_not_fatal() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/ok.rs", "pub fn fine() {}\n");
        fs::write(tmp.path().join("src/binary.rs"), [0xff, 0xfe, 0x00, 0x01]).unwrap();

        let detection = scan_tree(tmp.path(), &Policy::default(), false).unwrap();
        assert_eq!(detection.records.len(), 1);
        assert_eq!(detection.skipped.len(), 1);
        assert!(detection.skipped[0].path.ends_with("binary.rs"));
    }

    #[test]
    fn no_duplicate_entries_per_path() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/a.rs", "pub fn a() {}\n");
        write(tmp.path(), "src/b.rs", "pub fn b() {}\n");

        let detection = scan_tree(tmp.path(), &Policy::default(), false).unwrap();
        let mut paths: Vec<_> = detection
            .records
            .iter()
            .map(|r| r.metrics.path.clone())
            .collect();
        paths.sort();
        let before = paths.len();
        paths.dedup();
        assert_eq!(paths.len(), before);
    }

    #[test]
    fn small_files_are_not_oversized() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "src/a.rs", "pub fn a() {}\n");

        let policy = Policy::default();
        let detection = scan_tree(tmp.path(), &policy, false).unwrap();
        assert_eq!(detection.oversized(&policy).count(), 0);
    }
}
