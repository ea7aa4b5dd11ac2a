// Parser for gcov's annotated source output (`foo.c.gcov`).
//
// Reference: https://gcc.gnu.org/onlinedocs/gcc/Invoking-Gcov.html
//
// Format, one record per source line:
//   <count>:<lineno>:<source text>
//
// With a complexity column:
//   <count>:<complexity>:<lineno>:<source text>
//
// Count tokens:
//   5, 5*                     executed (the `*` marks partially run blocks)
//   #####, =====, $$$$$, %%%%% executable but never run
//   -                         nothing to execute on this line
//
// Records with line number 0 are headers (`Source:`, `Graph:`, `Runs:`, ...).
// Anything else (`function ... called`, `branch 0 taken`, separators,
// template instantiation headers) is ignored.
//
// Authors can exclude code from coverage by putting `COV_NF_LINE` on a line,
// or by bracketing a region with `COV_NF_START` / `COV_NF_END`.
use std::borrow::Cow;

use super::{Parser, SNIFF_LEN};
use crate::detect::Format;
use crate::diagnostics::Diagnostics;
use crate::error::{CovsetError, Result};
use crate::model::{FileCoverage, HitCount, LineRecord};
use crate::paths::canonical_path;

const NF_LINE: &str = "COV_NF_LINE";
const NF_START: &str = "COV_NF_START";
const NF_END: &str = "COV_NF_END";

/// Largest run of missing line numbers that is filled in. A bigger jump is a
/// corrupt line number, not a gap.
const MAX_LINE_GAP: u32 = 100_000;

/// gcov text parser, for either layout.
pub struct GcovParser {
    format: Format,
}

impl GcovParser {
    pub fn new(format: Format) -> Self {
        Self { format }
    }
}

impl Parser for GcovParser {
    fn format(&self) -> Format {
        self.format
    }

    fn parse(&self, path: &str, input: &[u8], diag: &dyn Diagnostics) -> Result<FileCoverage> {
        parse_gcov(path, input, self.format == Format::GcovComplexity, diag)
    }
}

/// Parse plain gcov output.
pub fn parse(path: &str, input: &[u8], diag: &dyn Diagnostics) -> Result<FileCoverage> {
    parse_gcov(path, input, false, diag)
}

fn parse_gcov(
    path: &str,
    input: &[u8],
    with_complexity: bool,
    diag: &dyn Diagnostics,
) -> Result<FileCoverage> {
    let path = canonical_path(path);

    let head_len = input.len().min(SNIFF_LEN);
    if input[..head_len].contains(&0) {
        diag.error(&path, "input looks like binary data, not gcov text");
        return Err(CovsetError::BinaryInput { path });
    }

    let text = String::from_utf8_lossy(input);
    let mut file = GcovFile::new(path, diag);
    file.lossy = matches!(text, Cow::Owned(_));

    for line in text.lines() {
        file.feed(split_entry(line, with_complexity));
    }

    file.finish()
}

/// One input line, split into fields.
#[derive(Debug, PartialEq, Eq)]
enum Entry<'a> {
    Record {
        count: &'a str,
        complexity: Option<&'a str>,
        line_number: u32,
        text: &'a str,
    },
    /// Count and line number, but the record stops before the source text.
    Truncated { line_number: u32 },
    /// Not a line record at all.
    Other,
}

fn split_entry(line: &str, with_complexity: bool) -> Entry<'_> {
    let fields = if with_complexity { 4 } else { 3 };
    let parts: Vec<&str> = line.splitn(fields, ':').collect();

    let Some(line_number) = parts
        .get(fields - 2)
        .and_then(|s| s.trim().parse::<u32>().ok())
    else {
        return Entry::Other;
    };

    match parts.get(fields - 1) {
        Some(text) => Entry::Record {
            count: parts[0].trim(),
            complexity: with_complexity.then(|| parts[1].trim()),
            line_number,
            text,
        },
        None => Entry::Truncated { line_number },
    }
}

fn parse_count(token: &str) -> Option<HitCount> {
    match token {
        "-" => Some(HitCount::NonCode),
        "#####" | "=====" | "$$$$$" | "%%%%%" => Some(HitCount::NotExecuted),
        t => t
            .strip_suffix('*')
            .unwrap_or(t)
            .parse::<u64>()
            .ok()
            .map(HitCount::Count),
    }
}

/// Accumulates records for one file.
struct GcovFile<'d> {
    path: String,
    lines: Vec<LineRecord>,
    warnings: Vec<String>,
    diag: &'d dyn Diagnostics,
    /// Path came from a `Source:` header.
    named: bool,
    /// Invalid UTF-8 was replaced while decoding.
    lossy: bool,
    /// A header for another source file was seen; the rest is not ours.
    done: bool,
}

impl<'d> GcovFile<'d> {
    fn new(path: String, diag: &'d dyn Diagnostics) -> Self {
        Self {
            path,
            lines: Vec::new(),
            warnings: Vec::new(),
            diag,
            named: false,
            lossy: false,
            done: false,
        }
    }

    fn warn(&mut self, message: String) {
        self.diag.warning(&self.path, &message);
        self.warnings.push(message);
    }

    fn feed(&mut self, entry: Entry<'_>) {
        if self.done {
            return;
        }
        match entry {
            Entry::Other => {}
            Entry::Record {
                line_number: 0,
                text,
                ..
            } => self.header(text),
            Entry::Truncated { line_number: 0 } => {}
            Entry::Truncated { line_number } => {
                if self.advance_to(line_number) {
                    self.warn(format!(
                        "line {line_number}: truncated record, treating as not executed"
                    ));
                    self.lines
                        .push(LineRecord::new(line_number, "", HitCount::NotExecuted));
                }
            }
            Entry::Record {
                count,
                complexity,
                line_number,
                text,
            } => {
                if !self.advance_to(line_number) {
                    return;
                }
                let hits = parse_count(count).unwrap_or_else(|| {
                    self.warn(format!(
                        "line {line_number}: unparseable execution count '{count}', \
                         treating as not executed"
                    ));
                    HitCount::NotExecuted
                });
                let complexity = complexity
                    .map(|token| self.complexity(line_number, token))
                    .unwrap_or(0);
                self.lines
                    .push(LineRecord::new(line_number, text, hits).with_complexity(complexity));
            }
        }
    }

    fn header(&mut self, text: &str) {
        let Some(source) = text.strip_prefix("Source:").map(str::trim) else {
            return;
        };
        if source.is_empty() {
            return;
        }
        let source = canonical_path(source);
        if source == self.path {
            self.named = true;
            return;
        }
        if self.named || !self.lines.is_empty() {
            let message = format!(
                "Source: header for '{source}' follows data for '{}', ignoring the rest of the input",
                self.path
            );
            self.warn(message);
            self.done = true;
            return;
        }
        self.path = source;
        self.named = true;
    }

    fn complexity(&mut self, line_number: u32, token: &str) -> u32 {
        if token.is_empty() || token == "-" {
            return 0;
        }
        token.parse().unwrap_or_else(|_| {
            self.warn(format!(
                "line {line_number}: unparseable complexity '{token}', using 0"
            ));
            0
        })
    }

    /// Make `line_number` the next line to be pushed, filling any gap with
    /// non-code lines. Returns false when the record should be skipped.
    fn advance_to(&mut self, line_number: u32) -> bool {
        let expected = self.lines.len() as u32 + 1;
        if line_number < expected {
            // Repeated in a per-instantiation block; the first occurrence
            // already carries the total.
            return false;
        }
        if line_number - expected > MAX_LINE_GAP {
            self.warn(format!(
                "line number {line_number} jumps too far past line {expected}, skipping record"
            ));
            return false;
        }
        if line_number > expected {
            self.warn(format!(
                "lines {expected}-{} missing from coverage data, treating as non-code",
                line_number - 1
            ));
            for n in expected..line_number {
                self.lines.push(LineRecord::new(n, "", HitCount::NonCode));
            }
        }
        true
    }

    fn apply_non_feasible_markers(&mut self) {
        let mut found = Vec::new();
        let mut open: Option<u32> = None;

        for line in &mut self.lines {
            let n = line.line_number();
            let text = line.text();
            let starts = text.contains(NF_START);
            let ends = text.contains(NF_END);
            let single = text.contains(NF_LINE);

            if starts {
                match open {
                    Some(at) => found.push(format!(
                        "line {n}: {NF_START} inside region already opened at line {at}"
                    )),
                    None => open = Some(n),
                }
            }
            if single || open.is_some() {
                if let Err(count) = line.mark_non_feasible() {
                    found.push(format!(
                        "line {n}: marked non-feasible but executed {count} times, keeping count"
                    ));
                }
            }
            if ends && open.take().is_none() {
                found.push(format!("line {n}: {NF_END} without matching {NF_START}"));
            }
        }

        if let Some(at) = open {
            found.push(format!("line {at}: {NF_START} is never closed by {NF_END}"));
        }
        for message in found {
            self.warn(message);
        }
    }

    fn finish(mut self) -> Result<FileCoverage> {
        if self.lossy {
            self.warn("input is not valid UTF-8, invalid bytes were replaced".to_string());
        }
        if self.lines.is_empty() {
            self.diag.error(&self.path, "no coverage line records found");
            return Err(CovsetError::NoLineRecords { path: self.path });
        }

        self.apply_non_feasible_markers();
        log::debug!(
            "{}: parsed {} lines ({} warnings)",
            self.path,
            self.lines.len(),
            self.warnings.len()
        );
        Ok(FileCoverage::from_parts(&self.path, self.lines, self.warnings))
    }
}
