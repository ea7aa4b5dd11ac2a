pub mod cli;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod ingest;
pub mod model;
pub mod parsers;
pub mod paths;
pub mod report;
pub mod set;
