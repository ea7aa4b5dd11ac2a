//! Uniform in-memory representation of line coverage for one source file.
//! Parsers produce a `FileCoverage`; a `CoverageSet` then owns it and merges
//! later observations of the same file into it.

use std::fmt;
use std::ops::AddAssign;

use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::error::{CovsetError, Result};
use crate::paths::canonical_path;

/// Coverage percentage, 0.0..=100.0. A file with nothing to cover is
/// considered fully covered.
#[must_use]
pub fn coverage_percent(code_lines: u64, hit_code_lines: u64) -> f64 {
    if code_lines == 0 {
        100.0
    } else {
        hit_code_lines as f64 / code_lines as f64 * 100.0
    }
}

/// Percentage rendered with one decimal place.
///
/// Partially covered code never shows as `100.0` and code with at least one
/// hit never shows as `0.0`.
#[must_use]
pub fn coverage_string(code_lines: u64, hit_code_lines: u64) -> String {
    let text = format!("{:.1}", coverage_percent(code_lines, hit_code_lines));
    if hit_code_lines < code_lines && text == "100.0" {
        "99.9".to_string()
    } else if hit_code_lines > 0 && text == "0.0" {
        "0.1".to_string()
    } else {
        text
    }
}

/// Execution count of one line, or the reason it has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "count")]
pub enum HitCount {
    /// Executable line that ran this many times.
    Count(u64),
    /// Executable line that never ran.
    NotExecuted,
    /// Line excluded from coverage (unreachable, or marked by the author).
    NonFeasible,
    /// Blank line, comment, declaration: nothing to execute.
    NonCode,
}

/// How a line takes part in coverage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Executable,
    NonFeasible,
    NonCode,
}

impl HitCount {
    #[must_use]
    pub fn class(self) -> LineClass {
        match self {
            HitCount::Count(_) | HitCount::NotExecuted => LineClass::Executable,
            HitCount::NonFeasible => LineClass::NonFeasible,
            HitCount::NonCode => LineClass::NonCode,
        }
    }

    /// Executable lines are the ones that count towards coverage.
    #[must_use]
    pub fn is_code(self) -> bool {
        self.class() == LineClass::Executable
    }

    #[must_use]
    pub fn is_hit(self) -> bool {
        matches!(self, HitCount::Count(n) if n > 0)
    }

    /// The real count, if there is one.
    #[must_use]
    pub fn count(self) -> Option<u64> {
        match self {
            HitCount::Count(n) => Some(n),
            _ => None,
        }
    }

    /// Combine two observations of the same line.
    ///
    /// Counts add up; markers contribute nothing to the sum. The kind of the
    /// result is the strongest evidence present, in the order
    /// `Count > NotExecuted > NonFeasible > NonCode`. The operation is
    /// associative and commutative.
    #[must_use]
    pub fn combine(self, other: HitCount) -> HitCount {
        let sum = self.contribution().saturating_add(other.contribution());
        match self.precedence().max(other.precedence()) {
            3 => HitCount::Count(sum),
            2 => HitCount::NotExecuted,
            1 => HitCount::NonFeasible,
            _ => HitCount::NonCode,
        }
    }

    fn contribution(self) -> u64 {
        self.count().unwrap_or(0)
    }

    fn precedence(self) -> u8 {
        match self {
            HitCount::Count(_) => 3,
            HitCount::NotExecuted => 2,
            HitCount::NonFeasible => 1,
            HitCount::NonCode => 0,
        }
    }
}

impl fmt::Display for HitCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitCount::Count(n) => write!(f, "{n}"),
            HitCount::NotExecuted => f.write_str("#####"),
            HitCount::NonFeasible => f.write_str("NF"),
            HitCount::NonCode => f.write_str("-"),
        }
    }
}

/// Two runs disagreed on whether a line is executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    pub existing: HitCount,
    pub incoming: HitCount,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inconsistent classification across runs ({} vs {}), treating line as {}",
            describe(self.existing),
            describe(self.incoming),
            describe(self.existing.combine(self.incoming)),
        )
    }
}

fn describe(hits: HitCount) -> &'static str {
    match hits {
        HitCount::Count(_) => "executed",
        HitCount::NotExecuted => "not executed",
        HitCount::NonFeasible => "non-feasible",
        HitCount::NonCode => "non-code",
    }
}

/// One physical source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRecord {
    line_number: u32,
    text: String,
    hits: HitCount,
    complexity: u32,
}

impl LineRecord {
    pub fn new(line_number: u32, text: impl Into<String>, hits: HitCount) -> Self {
        Self {
            line_number,
            text: text.into(),
            hits,
            complexity: 0,
        }
    }

    #[must_use]
    pub fn with_complexity(mut self, complexity: u32) -> Self {
        self.complexity = complexity;
        self
    }

    /// 1-based position within the owning file.
    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn hits(&self) -> HitCount {
        self.hits
    }

    pub fn complexity(&self) -> u32 {
        self.complexity
    }

    /// Fold another observation's count into this line.
    ///
    /// Returns the disagreement when the two observations classify the line
    /// differently; the combined value has already been stored either way.
    pub fn add_hits(&mut self, incoming: HitCount) -> Option<Conflict> {
        let existing = self.hits;
        self.hits = existing.combine(incoming);
        (existing.class() != incoming.class()).then_some(Conflict { existing, incoming })
    }

    /// Fold another record for the same line into this one. Complexity is a
    /// property of the code, so it takes the maximum rather than the sum.
    pub fn accumulate(&mut self, other: &LineRecord) -> Option<Conflict> {
        self.complexity = self.complexity.max(other.complexity);
        self.add_hits(other.hits)
    }

    /// Reclassify an executable line as non-feasible.
    ///
    /// A line that actually ran keeps its count; the count is returned as the
    /// error so the caller can report it.
    pub(crate) fn mark_non_feasible(&mut self) -> std::result::Result<(), u64> {
        match self.hits {
            HitCount::Count(n) if n > 0 => Err(n),
            HitCount::Count(_) | HitCount::NotExecuted => {
                self.hits = HitCount::NonFeasible;
                Ok(())
            }
            HitCount::NonFeasible | HitCount::NonCode => Ok(()),
        }
    }

    pub(crate) fn renumber(&mut self, line_number: u32) {
        self.line_number = line_number;
    }
}

/// Aggregate line statistics for a file or a set of files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageStats {
    pub total_lines: u64,
    /// Executable lines; excludes non-feasible and non-code lines.
    pub code_lines: u64,
    pub hit_code_lines: u64,
    pub non_feasible_lines: u64,
    pub non_code_lines: u64,
    pub max_complexity: u32,
}

impl CoverageStats {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a LineRecord>) -> Self {
        let mut stats = Self::default();
        for line in lines {
            stats.total_lines += 1;
            match line.hits.class() {
                LineClass::Executable => stats.code_lines += 1,
                LineClass::NonFeasible => stats.non_feasible_lines += 1,
                LineClass::NonCode => stats.non_code_lines += 1,
            }
            if line.hits.is_hit() {
                stats.hit_code_lines += 1;
            }
            stats.max_complexity = stats.max_complexity.max(line.complexity);
        }
        stats
    }

    #[must_use]
    pub fn coverage_percent(&self) -> f64 {
        coverage_percent(self.code_lines, self.hit_code_lines)
    }

    #[must_use]
    pub fn coverage_string(&self) -> String {
        coverage_string(self.code_lines, self.hit_code_lines)
    }
}

impl AddAssign for CoverageStats {
    fn add_assign(&mut self, other: Self) {
        self.total_lines += other.total_lines;
        self.code_lines += other.code_lines;
        self.hit_code_lines += other.hit_code_lines;
        self.non_feasible_lines += other.non_feasible_lines;
        self.non_code_lines += other.non_code_lines;
        self.max_complexity = self.max_complexity.max(other.max_complexity);
    }
}

/// Coverage for a single source file, one record per physical line.
#[derive(Debug, Clone)]
pub struct FileCoverage {
    source_path: String,
    lines: Vec<LineRecord>,
    warnings: Vec<String>,
    stats: CoverageStats,
}

impl FileCoverage {
    /// Build from an already-decoded record stream. Records are numbered by
    /// position, starting at 1.
    pub fn from_records(path: &str, records: impl IntoIterator<Item = LineRecord>) -> Self {
        let lines = records
            .into_iter()
            .enumerate()
            .map(|(idx, mut record)| {
                record.renumber(idx as u32 + 1);
                record
            })
            .collect();
        Self::from_parts(path, lines, Vec::new())
    }

    pub(crate) fn from_parts(path: &str, lines: Vec<LineRecord>, warnings: Vec<String>) -> Self {
        let stats = CoverageStats::from_lines(&lines);
        Self {
            source_path: canonical_path(path),
            lines,
            warnings,
            stats,
        }
    }

    /// Canonical path; the identity key within a `CoverageSet`.
    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    /// Look up a line by its 1-based number.
    pub fn line(&self, line_number: u32) -> Option<&LineRecord> {
        let idx = usize::try_from(line_number.checked_sub(1)?).ok()?;
        self.lines.get(idx)
    }

    pub fn stats(&self) -> CoverageStats {
        self.stats
    }

    pub fn coverage_percent(&self) -> f64 {
        self.stats.coverage_percent()
    }

    pub fn queued_warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Drain the warning queue.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Merge another observation of this file into `self`, line by line.
    ///
    /// Both must have the same number of lines. Otherwise nothing changes,
    /// the mismatch is reported to `diag` as an error, and `other` is dropped.
    /// Source text differences and classification conflicts are reported as
    /// warnings and merged anyway.
    pub fn merge(&mut self, other: FileCoverage, diag: &dyn Diagnostics) -> Result<()> {
        let existing = self.lines.len();
        let incoming = other.lines.len();
        if existing != incoming {
            diag.error(
                &self.source_path,
                &format!(
                    "cannot merge coverage: existing data has {existing} lines, \
                     new data has {incoming} (different source revision?)"
                ),
            );
            return Err(CovsetError::LineCountMismatch {
                path: self.source_path.clone(),
                existing,
                incoming,
            });
        }

        let mut found = Vec::new();
        for (mine, theirs) in self.lines.iter_mut().zip(&other.lines) {
            let n = mine.line_number;
            if mine.text != theirs.text {
                found.push(format!(
                    "line {n}: source text differs between runs, source may have been edited"
                ));
            }
            if let Some(conflict) = mine.accumulate(theirs) {
                found.push(format!("line {n}: {conflict}"));
            }
        }

        self.warnings.extend(other.warnings);
        for message in found {
            diag.warning(&self.source_path, &message);
            self.warnings.push(message);
        }

        self.stats = CoverageStats::from_lines(&self.lines);
        log::debug!(
            "{}: merged {} lines, now {}% covered",
            self.source_path,
            existing,
            self.stats.coverage_string()
        );
        Ok(())
    }
}
