//! `increq` command-line interface.

use anyhow::Result;
use clap::{Parser, Subcommand};
use increq::cli::{check, output, synthesize};
use std::path::PathBuf;

/// Incremental-implementation synthesis tools.
#[derive(Parser)]
#[command(name = "increq")]
#[command(author, version, about = "Synthesizes incrementally-maintained implementations of abstract data structures", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, pretty)
    #[arg(short = 'f', long, global = true)]
    format: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize an incrementally-maintained implementation for a specification.
    Synthesize {
        /// Specification file (serialized `Specification` JSON).
        spec: PathBuf,

        /// Disable coalescing newly-proposed concrete vars against
        /// provably-equal already-installed ones.
        #[arg(long)]
        no_dedup: bool,

        /// Wall-clock budget, in seconds, for the whole improver run.
        #[arg(short, long, default_value_t = 60)]
        timeout: u64,

        /// Print which concrete vars a given query's maintenance code
        /// reads, once synthesis finishes. May be given multiple times.
        #[arg(short, long = "explain")]
        explain: Vec<String>,
    },

    /// Type-check a specification without running synthesis.
    Check {
        /// Specification file (serialized `Specification` JSON).
        spec: PathBuf,
    },
}

fn main() {
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();
    output::setup_colors(&cli.color);

    let result: Result<()> = match cli.command {
        Commands::Synthesize { spec, no_dedup, timeout, explain } => synthesize::synthesize(synthesize::SynthesizeConfig {
            spec_file: spec,
            output_file: cli.output.clone(),
            output_format: cli.format.clone(),
            no_dedup,
            timeout_secs: timeout,
            explain,
            verbose: cli.verbose,
        }),
        Commands::Check { spec } => check::check(check::CheckConfig { spec_file: spec, verbose: cli.verbose }),
    };

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
