use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use covset::cli;
use covset::detect::Format;
use covset::diagnostics::LogDiagnostics;
use covset::ingest;
use covset::set::CoverageSet;

/// covset: merge gcov line coverage from many runs and report on it.
#[derive(Parser)]
#[command(name = "covset", version, about)]
struct Cli {
    /// Override format detection (gcov, gcov-complexity).
    #[arg(long, global = true)]
    format: Option<Format>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Inputs {
    /// gcov output files. Files describing the same source are merged.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show overall coverage.
    Summary {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// List per-file coverage.
    Files {
        #[command(flatten)]
        inputs: Inputs,

        /// Sort by coverage rate ascending (show worst files first).
        #[arg(long)]
        sort_by_coverage: bool,
    },

    /// Show line-level coverage for a source file.
    Lines {
        /// The source file path (as named in the coverage data).
        source_file: String,

        #[command(flatten)]
        inputs: Inputs,

        /// Only list uncovered lines, as ranges.
        #[arg(long)]
        uncovered: bool,
    },

    /// Print a JSON report.
    Json {
        #[command(flatten)]
        inputs: Inputs,
    },
}

impl Commands {
    fn inputs(&self) -> &[PathBuf] {
        match self {
            Commands::Summary { inputs }
            | Commands::Files { inputs, .. }
            | Commands::Lines { inputs, .. }
            | Commands::Json { inputs } => &inputs.inputs,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("COVSET_LOG", "warn")).init();

    let args = Cli::parse();

    let mut set = CoverageSet::new();
    let paths = args.command.inputs();
    let summary = ingest::ingest_paths(&mut set, paths, args.format, &LogDiagnostics);
    if summary.accepted() == 0 {
        anyhow::bail!("no coverage data could be ingested from {} input(s)", paths.len());
    }
    if summary.skipped + summary.rejected > 0 {
        log::warn!(
            "{} of {} input(s) were not used ({} unreadable, {} conflicting)",
            summary.skipped + summary.rejected,
            paths.len(),
            summary.skipped,
            summary.rejected
        );
    }

    let output = match &args.command {
        Commands::Summary { .. } => cli::cmd_summary(&set),
        Commands::Files {
            sort_by_coverage, ..
        } => cli::cmd_files(&set, *sort_by_coverage),
        Commands::Lines {
            source_file,
            uncovered,
            ..
        } => cli::cmd_lines(&set, source_file, *uncovered)?,
        Commands::Json { .. } => cli::cmd_json(&set)?,
    };
    print!("{output}");
    Ok(())
}
