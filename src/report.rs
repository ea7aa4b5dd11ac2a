//! Report data for presentation: JSON-ready summaries and compact line
//! ranges.

use serde::Serialize;

use crate::model::{CoverageStats, FileCoverage, HitCount};
use crate::set::CoverageSet;

/// Statistics plus the derived percentage.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub stats: CoverageStats,
    pub coverage_percent: f64,
    /// Display form, see [`crate::model::coverage_string`].
    pub coverage: String,
}

impl From<CoverageStats> for StatsReport {
    fn from(stats: CoverageStats) -> Self {
        Self {
            coverage_percent: stats.coverage_percent(),
            coverage: stats.coverage_string(),
            stats,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(flatten)]
    pub summary: StatsReport,
    /// Executable lines that never ran.
    pub uncovered_lines: Vec<u32>,
}

/// Whole-set report.
#[derive(Debug, Serialize)]
pub struct SetReport {
    /// RFC 3339 timestamp.
    pub generated_at: String,
    pub total_files: usize,
    pub summary: StatsReport,
    pub files: Vec<FileReport>,
}

/// Build the report for every file in `set`, in path order.
pub fn build_report(set: &CoverageSet) -> SetReport {
    let files = set
        .files()
        .map(|file| FileReport {
            path: file.source_path().to_string(),
            summary: file.stats().into(),
            uncovered_lines: uncovered_lines(file),
        })
        .collect();

    SetReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        total_files: set.len(),
        summary: set.stats().into(),
        files,
    }
}

/// Executable lines with no hits, ascending.
pub fn uncovered_lines(file: &FileCoverage) -> Vec<u32> {
    file.lines()
        .iter()
        .filter(|l| l.hits().is_code() && !l.hits().is_hit())
        .map(|l| l.line_number())
        .collect()
}

/// Executable lines, ascending.
pub fn code_lines(file: &FileCoverage) -> Vec<u32> {
    file.lines()
        .iter()
        .filter(|l| l.hits().is_code())
        .map(|l| l.line_number())
        .collect()
}

/// Render a hit count for a gutter column.
pub fn gutter(hits: HitCount) -> String {
    match hits {
        HitCount::NonCode => String::new(),
        other => other.to_string(),
    }
}

/// Maximum number of consecutive non-code lines that can be bridged when
/// coalescing uncovered ranges.
const MAX_BRIDGE_GAP: u32 = 2;

/// Coalesce sorted line numbers into `(start, end)` ranges, bridging small
/// gaps where every line in the gap is not executable.
///
/// A gap between two uncovered lines is bridged only when:
/// 1. Every line in the gap is absent from `code_lines`, AND
/// 2. The gap is at most [`MAX_BRIDGE_GAP`] lines wide.
///
/// Both `lines` and `code_lines` must be sorted and deduplicated.
#[must_use]
pub fn coalesce_ranges(lines: &[u32], code_lines: &[u32]) -> Vec<(u32, u32)> {
    let Some((&first, rest)) = lines.split_first() else {
        return Vec::new();
    };

    debug_assert!(
        lines.windows(2).all(|w| w[0] < w[1]),
        "coalesce_ranges requires sorted, deduplicated input"
    );

    let mut ranges: Vec<(u32, u32)> = Vec::new();
    let mut start = first;
    let mut end = first;

    for &line in rest {
        let gap = line - end - 1;
        if gap <= MAX_BRIDGE_GAP && (end + 1..line).all(|l| code_lines.binary_search(&l).is_err())
        {
            end = line;
        } else {
            ranges.push((start, end));
            start = line;
            end = line;
        }
    }

    ranges.push((start, end));
    ranges
}

/// Format line numbers into compact range notation, e.g. "1, 3-5, 8".
///
/// The input slice must be sorted in ascending order.
#[must_use]
pub fn format_line_ranges(lines: &[u32], code_lines: &[u32]) -> String {
    coalesce_ranges(lines, code_lines)
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
