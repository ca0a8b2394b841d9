use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use benchrun::algorithm;
use benchrun::config::HarnessConfig;
use benchrun::envcheck;
use benchrun::harness::{self, RunOptions};
use benchrun::types::{InputMode, Naming, shell_word};

#[derive(Parser)]
#[command(name = "benchrun", version, about = "Run an attractor-detection algorithm over a benchmark directory")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: ./benchrun.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run every benchmark in a directory and write the result tables
    Run {
        /// Per-benchmark cutoff, passed verbatim to the timeout utility (e.g. 1h, 30s)
        cutoff: String,

        /// Directory containing the benchmark models
        bench_dir: PathBuf,

        /// Algorithm identifier (see `benchrun algorithms`)
        algorithm: String,

        /// Ask before each benchmark whether to run, skip it, or abort
        #[arg(short, long)]
        interactive: bool,

        /// Benchmark file naming scheme
        #[arg(long, value_enum, default_value_t = Naming::Plain)]
        naming: Naming,

        /// Time value of the final row of the aggregated table
        #[arg(long)]
        horizon: Option<f64>,

        /// Where the run's output directory is created
        #[arg(long, default_value = ".")]
        out_root: PathBuf,

        /// Directory holding the locally built algorithm binaries
        #[arg(long)]
        bin_dir: Option<PathBuf>,
    },
    /// Check that the timeout utility, external tool and toolchain are usable
    Check,
    /// List the supported algorithm identifiers
    Algorithms {
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = HarnessConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            cutoff,
            bench_dir,
            algorithm,
            interactive,
            naming,
            horizon,
            out_root,
            bin_dir,
        } => {
            if let Some(h) = horizon {
                config.horizon_secs = h;
            }
            if let Some(dir) = bin_dir {
                config.bin_dir = dir;
            }
            let options = RunOptions {
                cutoff,
                bench_dir,
                algorithm,
                interactive,
                naming,
                out_root,
            };
            let summary = harness::run(&options, &config)?;
            println!("{}", summary.out_dir.display());
            Ok(0)
        }
        Command::Check => {
            let report = envcheck::run_checks(&config);
            print!("{}", envcheck::format_report(&report));
            Ok(if report.has_errors() { 1 } else { 0 })
        }
        Command::Algorithms { json } => {
            let bindings = algorithm::table(&config, |var| std::env::var(var).ok());
            if json {
                println!("{}", serde_json::to_string_pretty(&bindings)?);
            } else {
                for b in &bindings {
                    let mut line = format!("{:<8} {}", b.name, shell_word(&b.program.to_string_lossy()));
                    for arg in &b.args {
                        line.push(' ');
                        line.push_str(&shell_word(arg));
                    }
                    line.push_str(match b.input {
                        InputMode::Stdin => " < model",
                        InputMode::Argument => " model",
                    });
                    println!("{}   (*.{})", line, b.extension);
                }
            }
            Ok(0)
        }
    }
}

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("ERROR: {:#}", err);
            process::exit(1);
        }
    }
}
