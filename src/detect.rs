/// Auto-detection of the gcov text layout.
///
/// Strategy:
///   1. Peek at the first bytes of the content for record-shaped lines
///   2. Fall back to the file extension when nothing record-shaped is found
///   3. Fall back to CLI --format override (handled by caller)
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CovsetError;
use crate::parsers::sniff_head;

/// `<count>:<lineno>:` as printed by gcov.
static PLAIN_RECORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[^:\s]+\s*:\s*(\d+)\s*:").unwrap());

/// `<count>:<complexity>:<lineno>:` with a complexity column.
static COMPLEXITY_RECORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[^:\s]+\s*:\s*(?:\d+|-)\s*:\s*(\d+)\s*:").unwrap());

/// Supported input layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Plain `gcov` output: `count:lineno:source`.
    Gcov,
    /// gcov output annotated with per-line complexity:
    /// `count:complexity:lineno:source`.
    GcovComplexity,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Gcov => "gcov",
            Format::GcovComplexity => "gcov-complexity",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = CovsetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcov" => Ok(Format::Gcov),
            "gcov-complexity" => Ok(Format::GcovComplexity),
            _ => Err(CovsetError::Parse(format!(
                "Unknown format: '{}'. Supported: gcov, gcov-complexity",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the layout from filename and file content.
pub fn detect_format(path: &Path, content: &[u8]) -> Option<Format> {
    // 1. Content-based detection decides the layout
    if let Some(fmt) = detect_by_content(content) {
        return Some(fmt);
    }

    // 2. A .gcov file with no recognizable records is still gcov; the parser
    //    will report what is wrong with it.
    detect_by_extension(path)
}

fn detect_by_extension(path: &Path) -> Option<Format> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "gcov" => Some(Format::Gcov),
        _ => None,
    }
}

fn detect_by_content(content: &[u8]) -> Option<Format> {
    let head = sniff_head(content);

    // Header records (line 0) look the same in both layouts, so only real
    // line records vote. A single plain record rules out the complexity
    // layout.
    let mut plain = 0usize;
    let mut annotated = 0usize;
    for line in head.lines() {
        if let Some(caps) = COMPLEXITY_RECORD_RE.captures(line) {
            if &caps[1] != "0" {
                annotated += 1;
            }
        } else if let Some(caps) = PLAIN_RECORD_RE.captures(line) {
            if &caps[1] != "0" {
                plain += 1;
            }
        }
    }

    match (plain, annotated) {
        (0, 0) => None,
        (0, _) => Some(Format::GcovComplexity),
        _ => Some(Format::Gcov),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_gcov_by_content() {
        let content = b"        -:    0:Source:foo.c\n        5:    1:int main() {\n    #####:    2:  bar();\n";
        let path = Path::new("foo.c.txt");
        assert_eq!(detect_format(path, content), Some(Format::Gcov));
    }

    #[test]
    fn test_detect_complexity_by_content() {
        let content = b"-:-:0:Source:foo.c\n5:1:1:int main() {\n#####:-:2:  bar();\n";
        let path = Path::new("foo.c.gcov");
        assert_eq!(detect_format(path, content), Some(Format::GcovComplexity));
    }

    #[test]
    fn test_detect_plain_line_with_digits_in_text() {
        // Line 2's text starts with "10:", which looks like a complexity
        // column, but line 1 proves the layout is plain.
        let content = b"        1:    1:int x;\n        1:    2:10: label\n";
        assert_eq!(detect_format(Path::new("a"), content), Some(Format::Gcov));
    }

    #[test]
    fn test_detect_header_only_falls_back_to_extension() {
        let content = b"        -:    0:Source:foo.c\n";
        assert_eq!(detect_format(Path::new("foo.c.gcov"), content), Some(Format::Gcov));
        assert_eq!(detect_format(Path::new("foo.txt"), content), None);
    }

    #[test]
    fn test_detect_unknown() {
        let path = Path::new("random.dat");
        assert_eq!(detect_format(path, b"hello world"), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("GCOV".parse::<Format>().unwrap(), Format::Gcov);
        assert_eq!(
            "gcov-complexity".parse::<Format>().unwrap(),
            Format::GcovComplexity
        );
        assert!("lcov".parse::<Format>().is_err());
    }
}
