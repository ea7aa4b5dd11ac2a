pub mod gcov;

use std::borrow::Cow;

use crate::detect::Format;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::model::FileCoverage;

/// How much of the input detection looks at.
pub(crate) const SNIFF_LEN: usize = 4096;

/// Every input parser implements this trait.
pub trait Parser {
    fn format(&self) -> Format;

    /// Parse the coverage output for one source file.
    ///
    /// `path` identifies the input until the data names its own source path.
    /// Per-line problems are reported to `diag` and parsing continues; an
    /// input with no usable line records is reported as an error and returned
    /// as `Err`.
    fn parse(&self, path: &str, input: &[u8], diag: &dyn Diagnostics) -> Result<FileCoverage>;
}

/// The parser for a given layout.
pub fn parser_for(format: Format) -> gcov::GcovParser {
    gcov::GcovParser::new(format)
}

/// The first few KB of the content, lossily decoded.
pub(crate) fn sniff_head(content: &[u8]) -> Cow<'_, str> {
    let head_len = content.len().min(SNIFF_LEN);
    String::from_utf8_lossy(&content[..head_len])
}
