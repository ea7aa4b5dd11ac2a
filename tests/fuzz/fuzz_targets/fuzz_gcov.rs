#![no_main]
use covset::detect::Format;
use covset::diagnostics::NullDiagnostics;
use covset::parsers::{parser_for, Parser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parser must not panic on any input, in either layout.
    let _ = parser_for(Format::Gcov).parse("fuzz.gcov", data, &NullDiagnostics);
    let _ = parser_for(Format::GcovComplexity).parse("fuzz.gcov", data, &NullDiagnostics);
});
