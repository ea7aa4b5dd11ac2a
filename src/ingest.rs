use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::detect::{detect_format, Format};
use crate::diagnostics::Diagnostics;
use crate::error::{CovsetError, Result};
use crate::model::FileCoverage;
use crate::parsers::{parser_for, Parser};
use crate::set::{AddOutcome, CoverageSet};

/// Tally of an `ingest_paths` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    /// New paths added to the set.
    pub inserted: usize,
    /// Inputs merged into a path already present.
    pub merged: usize,
    /// Inputs that could not be read or parsed.
    pub skipped: usize,
    /// Inputs whose merge was refused (line count mismatch).
    pub rejected: usize,
}

impl IngestSummary {
    /// Inputs that made it into the set.
    pub fn accepted(&self) -> usize {
        self.inserted + self.merged
    }
}

/// Detect the format (or use the override) and parse `content`.
pub fn parse_bytes(
    path: &Path,
    content: &[u8],
    format_override: Option<Format>,
    diag: &dyn Diagnostics,
) -> Result<FileCoverage> {
    let name = path.to_string_lossy();
    let format = match format_override {
        Some(format) => format,
        None => match detect_format(path, content) {
            Some(format) => format,
            None => {
                diag.error(&name, "not recognizable as gcov coverage output");
                return Err(CovsetError::UnknownFormat);
            }
        },
    };
    parser_for(format).parse(&name, content, diag)
}

/// Read and parse one coverage file.
pub fn read_file(
    path: &Path,
    format_override: Option<Format>,
    diag: &dyn Diagnostics,
) -> Result<FileCoverage> {
    let content = std::fs::read(path).map_err(|e| {
        diag.error(&path.to_string_lossy(), &format!("cannot read file: {e}"));
        CovsetError::Io(e)
    })?;
    parse_bytes(path, &content, format_override, diag)
}

/// Parse `content` and add the result to `set`.
pub fn ingest_bytes(
    set: &mut CoverageSet,
    path: &Path,
    content: &[u8],
    format_override: Option<Format>,
    diag: &dyn Diagnostics,
) -> Result<AddOutcome> {
    let file = parse_bytes(path, content, format_override, diag)?;
    set.add_file(file, diag)
}

/// Read a coverage file from disk and add it to `set`.
pub fn ingest_file(
    set: &mut CoverageSet,
    path: &Path,
    format_override: Option<Format>,
    diag: &dyn Diagnostics,
) -> Result<AddOutcome> {
    let file = read_file(path, format_override, diag)?;
    set.add_file(file, diag)
}

/// Read and parse every input in parallel, then add the results to `set` in
/// input order. Failures are reported to `diag` and counted; they never stop
/// the other inputs.
pub fn ingest_paths(
    set: &mut CoverageSet,
    paths: &[PathBuf],
    format_override: Option<Format>,
    diag: &(dyn Diagnostics + Sync),
) -> IngestSummary {
    let parsed: Vec<Result<FileCoverage>> = paths
        .par_iter()
        .map(|path| read_file(path, format_override, diag))
        .collect();

    let mut summary = IngestSummary::default();
    for result in parsed {
        let Ok(file) = result else {
            summary.skipped += 1;
            continue;
        };
        match set.add_file(file, diag) {
            Ok(AddOutcome::Inserted) => summary.inserted += 1,
            Ok(AddOutcome::Merged) => summary.merged += 1,
            Err(_) => summary.rejected += 1,
        }
    }

    log::debug!(
        "ingested {} inputs: {} new, {} merged, {} skipped, {} rejected",
        paths.len(),
        summary.inserted,
        summary.merged,
        summary.skipped,
        summary.rejected
    );
    summary
}
