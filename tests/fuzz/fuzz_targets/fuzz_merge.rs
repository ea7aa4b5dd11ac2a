#![no_main]
use covset::diagnostics::NullDiagnostics;
use covset::set::CoverageSet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Split the input in two and feed both halves as observations of the
    // same file. Whatever merges must keep the line classes consistent.
    let mid = data.len() / 2;
    let mut set = CoverageSet::new();
    for half in [&data[..mid], &data[mid..]] {
        if let Ok(file) = covset::parsers::gcov::parse("fuzz.c", half, &NullDiagnostics) {
            let _ = set.add_file(file, &NullDiagnostics);
        }
    }
    let stats = set.stats();
    assert_eq!(
        stats.code_lines + stats.non_feasible_lines + stats.non_code_lines,
        stats.total_lines
    );
});
