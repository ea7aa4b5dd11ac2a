//! Command handler functions for the covset CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;

use anyhow::{Context, Result};

use crate::model::HitCount;
use crate::report;
use crate::set::CoverageSet;

pub fn cmd_summary(set: &CoverageSet) -> String {
    let stats = set.stats();

    let mut out = String::new();
    writeln!(out, "Files:          {}", set.len()).unwrap();
    writeln!(
        out,
        "Lines:          {}/{} ({}%)",
        stats.hit_code_lines,
        stats.code_lines,
        stats.coverage_string()
    )
    .unwrap();
    if stats.non_feasible_lines > 0 {
        writeln!(out, "Non-feasible:   {}", stats.non_feasible_lines).unwrap();
    }
    if stats.max_complexity > 0 {
        writeln!(out, "Max complexity: {}", stats.max_complexity).unwrap();
    }
    out
}

pub fn cmd_files(set: &CoverageSet, sort_by_coverage: bool) -> String {
    let mut files: Vec<_> = set.files().collect();

    if sort_by_coverage {
        files.sort_by(|a, b| a.coverage_percent().total_cmp(&b.coverage_percent()));
    }

    let mut out = String::new();
    writeln!(
        out,
        "{:<60} {:>8} {:>8} {:>8} {:>8}",
        "FILE", "LINES", "HIT", "NF", "RATE"
    )
    .unwrap();
    writeln!(out, "{}", "-".repeat(96)).unwrap();

    for f in &files {
        let stats = f.stats();
        writeln!(
            out,
            "{:<60} {:>8} {:>8} {:>8} {:>7}%",
            f.source_path(),
            stats.code_lines,
            stats.hit_code_lines,
            stats.non_feasible_lines,
            stats.coverage_string()
        )
        .unwrap();
    }

    out
}

pub fn cmd_lines(set: &CoverageSet, source_file: &str, uncovered: bool) -> Result<String> {
    let file = set
        .get(source_file)
        .with_context(|| format!("No coverage data for '{}'", source_file))?;

    if uncovered {
        let missed = report::uncovered_lines(file);
        if missed.is_empty() {
            return Ok(format!(
                "All executable lines are covered in '{}'\n",
                file.source_path()
            ));
        }

        let mut out = String::new();
        writeln!(out, "Uncovered lines in '{}':", file.source_path()).unwrap();
        let code = report::code_lines(file);
        writeln!(out, "  {}", report::format_line_ranges(&missed, &code)).unwrap();
        writeln!(out, "  ({} lines)", missed.len()).unwrap();
        return Ok(out);
    }

    let mut out = String::new();
    writeln!(out, "{:>6}  {:>10}  {:>4}  SOURCE", "LINE", "HITS", "CCN").unwrap();
    writeln!(out, "{}", "-".repeat(40)).unwrap();
    for line in file.lines() {
        let marker = match line.hits() {
            h if h.is_hit() => "✓",
            HitCount::Count(_) | HitCount::NotExecuted => "✗",
            _ => " ",
        };
        let complexity = match line.complexity() {
            0 => String::new(),
            n => n.to_string(),
        };
        writeln!(
            out,
            "{:>6}  {:>10}  {:>4} {} {}",
            line.line_number(),
            report::gutter(line.hits()),
            complexity,
            marker,
            line.text()
        )
        .unwrap();
    }
    Ok(out)
}

pub fn cmd_json(set: &CoverageSet) -> Result<String> {
    let report = report::build_report(set);
    let mut out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullDiagnostics;
    use crate::model::{FileCoverage, LineRecord};

    /// Two files, some lines covered, some not.
    fn seed_coverage() -> CoverageSet {
        let mut set = CoverageSet::new();
        let main = FileCoverage::from_records(
            "src/main.c",
            vec![
                LineRecord::new(0, "int main() {", HitCount::Count(5)).with_complexity(2),
                LineRecord::new(0, "  a();", HitCount::Count(3)),
                LineRecord::new(0, "  b();", HitCount::NotExecuted),
                LineRecord::new(0, "  c();", HitCount::NotExecuted),
                LineRecord::new(0, "  d(); // COV_NF_LINE", HitCount::NonFeasible),
                LineRecord::new(0, "}", HitCount::NonCode),
            ],
        );
        let lib = FileCoverage::from_records(
            "src/lib.c",
            vec![
                LineRecord::new(0, "int f() {", HitCount::Count(10)),
                LineRecord::new(0, "  return 1; }", HitCount::Count(10)),
            ],
        );
        set.add_file(main, &NullDiagnostics).unwrap();
        set.add_file(lib, &NullDiagnostics).unwrap();
        set
    }

    #[test]
    fn test_cmd_summary() {
        let out = cmd_summary(&seed_coverage());

        assert!(out.contains("Files:          2"));
        assert!(out.contains("Lines:          4/6 (66.7%)"));
        assert!(out.contains("Non-feasible:   1"));
        assert!(out.contains("Max complexity: 2"));
    }

    #[test]
    fn test_cmd_summary_empty() {
        let out = cmd_summary(&CoverageSet::new());

        assert!(out.contains("Files:          0"));
        assert!(out.contains("0/0 (100.0%)"));
        assert!(!out.contains("Non-feasible"));
    }

    #[test]
    fn test_cmd_files() {
        let out = cmd_files(&seed_coverage(), false);

        assert!(out.contains("src/main.c"));
        assert!(out.contains("src/lib.c"));
        assert!(out.contains("100.0%"));
        assert!(out.contains("50.0%"));
    }

    #[test]
    fn test_cmd_files_sorted_by_coverage() {
        let out = cmd_files(&seed_coverage(), true);

        // Ascending by coverage: src/main.c (50%) before src/lib.c (100%).
        // Path order alone would put lib first.
        let main_pos = out.find("src/main.c").unwrap();
        let lib_pos = out.find("src/lib.c").unwrap();
        assert!(main_pos < lib_pos);
    }

    #[test]
    fn test_cmd_lines() {
        let out = cmd_lines(&seed_coverage(), "src/main.c", false).unwrap();

        assert!(out.contains("LINE"));
        assert!(out.contains("HITS"));
        assert!(out.contains("✓"));
        assert!(out.contains("✗"));
        assert!(out.contains("#####"));
        assert!(out.contains("NF"));
    }

    #[test]
    fn test_cmd_lines_no_data() {
        let result = cmd_lines(&seed_coverage(), "nonexistent.c", false);
        assert!(result.is_err());
    }

    #[test]
    fn test_cmd_lines_uncovered() {
        let out = cmd_lines(&seed_coverage(), "./src/main.c", true).unwrap();

        assert!(out.contains("Uncovered lines in 'src/main.c':"));
        assert!(out.contains("3-4"));
        assert!(out.contains("2 lines"));
    }

    #[test]
    fn test_cmd_lines_uncovered_all_covered() {
        let out = cmd_lines(&seed_coverage(), "src/lib.c", true).unwrap();

        assert!(out.contains("All executable lines are covered"));
    }

    #[test]
    fn test_cmd_json() {
        let out = cmd_json(&seed_coverage()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["total_files"], 2);
        assert_eq!(value["summary"]["hit_code_lines"], 4);
        assert_eq!(value["files"].as_array().unwrap().len(), 2);
        assert!(value["generated_at"].is_string());
    }
}
