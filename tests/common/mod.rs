#![allow(dead_code)]

use std::path::PathBuf;

use covset::diagnostics::CollectingDiagnostics;
use covset::model::FileCoverage;

/// Path to a file under tests/fixtures.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Parse a fixture as plain gcov, panicking on failure.
pub fn parse_fixture(name: &str, diag: &CollectingDiagnostics) -> FileCoverage {
    let content = std::fs::read(fixture(name)).unwrap();
    covset::parsers::gcov::parse(name, &content, diag).unwrap()
}
