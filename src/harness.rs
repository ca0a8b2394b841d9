//! The sequential benchmark loop and the output directory it fills.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::aggregate::{AggregatedCsv, Aggregator, TimesCsv};
use crate::algorithm;
use crate::config::HarnessConfig;
use crate::errors::BenchError;
use crate::footer::classify;
use crate::runner::{Decision, Executor, ask_operator};
use crate::select::{Matcher, select_benchmarks};
use crate::tools::resolve_timeout_tool;
use crate::types::{BenchmarkEntry, Naming, RunOutcome, format_seconds};

/// Everything the operator chose on the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub cutoff: String,
    pub bench_dir: PathBuf,
    pub algorithm: String,
    pub interactive: bool,
    pub naming: Naming,
    pub out_root: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub out_dir: PathBuf,
    pub selected: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub aborted: bool,
}

/// Label used in output names: the benchmark directory's last component.
pub fn bench_label(bench_dir: &Path) -> String {
    bench_dir
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("benchmarks")
        .to_string()
}

pub fn output_dir_name(label: &str, algorithm: &str, timestamp: i64) -> String {
    format!("{}_run_{}_{}", label, algorithm, timestamp)
}

pub fn times_file_name(label: &str, algorithm: &str) -> String {
    format!("{}_{}_times.csv", label, algorithm)
}

pub fn aggregated_file_name(label: &str, algorithm: &str) -> String {
    format!("{}_{}_aggregated.csv", label, algorithm)
}

pub fn log_file_name(entry: &BenchmarkEntry) -> String {
    format!("{}_out.txt", entry.name)
}

/// Resolve everything fallible first, then create the output directory and
/// run. Configuration errors therefore leave no trace on disk.
pub fn run(options: &RunOptions, config: &HarnessConfig) -> Result<RunSummary> {
    tracing::info!(cutoff = %options.cutoff, "timeout");
    tracing::info!(dir = %options.bench_dir.display(), "benchmark directory");
    tracing::info!(algorithm = %options.algorithm, "algorithm");
    tracing::info!(interactive = options.interactive, "interactive");

    let binding = algorithm::resolve(&options.algorithm, config)?;
    let timeout = resolve_timeout_tool()?;
    let matcher = Matcher::for_naming(options.naming, &binding.extension)?;
    let entries = select_benchmarks(&options.bench_dir, &matcher)?;
    tracing::info!(count = entries.len(), "benchmarks selected");

    let label = bench_label(&options.bench_dir);
    let out_dir = options.out_root.join(output_dir_name(
        &label,
        &binding.name,
        Utc::now().timestamp(),
    ));
    create_output_dir(&out_dir)?;

    let executor = Executor {
        timeout,
        cutoff: options.cutoff.clone(),
        timer: config.timer.clone(),
        binding,
        tail_lines: config.tail_lines,
    };

    let stdin = std::io::stdin();
    let mut operator = options.interactive.then(|| stdin.lock());

    run_entries(
        &executor,
        &entries,
        &out_dir,
        &label,
        config.horizon_secs,
        operator.as_mut(),
    )
}

fn create_output_dir(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(BenchError::OutputDirExists {
            path: path.to_path_buf(),
        }
        .into());
    }
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create output directory {}", path.display()))
}

/// Run `entries` one after another, writing both tables into `out_dir`.
///
/// With an `operator`, each benchmark waits for a line of input first.
/// An abort stops the loop but still finalizes both tables.
pub fn run_entries<R: BufRead>(
    executor: &Executor,
    entries: &[BenchmarkEntry],
    out_dir: &Path,
    label: &str,
    horizon: f64,
    mut operator: Option<&mut R>,
) -> Result<RunSummary> {
    let algorithm = executor.binding.name.as_str();
    let mut times = TimesCsv::create(&out_dir.join(times_file_name(label, algorithm)))?;
    let aggregated = AggregatedCsv::create(&out_dir.join(aggregated_file_name(label, algorithm)))?;
    let recognizer = executor.binding.footer.recognizer();

    let mut aggregator = Aggregator::default();
    let mut skipped = 0;
    let mut aborted = false;

    for entry in entries {
        tracing::info!(">>>>>>>>>> START MODEL {}", entry.path.display());

        if let Some(input) = operator.as_deref_mut() {
            match ask_operator(input).context("Failed to read operator input")? {
                Decision::Proceed => {}
                Decision::Skip => {
                    tracing::info!("Skipped!");
                    skipped += 1;
                    continue;
                }
                Decision::Abort => {
                    tracing::info!("Aborted!");
                    aborted = true;
                    break;
                }
            }
        }

        let log = out_dir.join(log_file_name(entry));
        let record = executor.run(entry, &log)?;
        let outcome = classify(&record.tail, recognizer);

        match &outcome {
            RunOutcome::Success { elapsed_seconds } => {
                tracing::info!("Success. Elapsed: {}", format_seconds(*elapsed_seconds));
            }
            RunOutcome::Failure { reason } => {
                tracing::warn!(exit_code = ?record.exit_code, "Fail. Last line of output: {}", reason);
            }
        }

        times.write_row(&entry.name, &outcome)?;
        aggregator.record(&outcome);
    }

    aggregated.finish(&aggregator.series(horizon))?;

    let summary = RunSummary {
        out_dir: out_dir.to_path_buf(),
        selected: entries.len(),
        succeeded: aggregator.successes(),
        failed: times.rows() - aggregator.successes(),
        skipped,
        aborted,
    };
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        aborted = summary.aborted,
        out_dir = %summary.out_dir.display(),
        "run finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AlgorithmBinding;
    use crate::footer::FooterKind;
    use crate::types::{InputMode, TimeoutTool};
    use std::fs;

    #[test]
    fn output_names() {
        assert_eq!(output_dir_name("models", "TGR", 1700000000), "models_run_TGR_1700000000");
        assert_eq!(times_file_name("models", "TGR"), "models_TGR_times.csv");
        assert_eq!(aggregated_file_name("models", "TGR"), "models_TGR_aggregated.csv");
        let entry = BenchmarkEntry {
            path: PathBuf::from("models/a.aeon"),
            name: "a".to_string(),
        };
        assert_eq!(log_file_name(&entry), "a_out.txt");
    }

    #[test]
    fn label_from_directory() {
        assert_eq!(bench_label(Path::new("benchmarks_real_life")), "benchmarks_real_life");
        assert_eq!(bench_label(Path::new("./data/models/")), "models");
        assert_eq!(bench_label(Path::new("/")), "benchmarks");
    }

    #[test]
    fn existing_output_dir_is_refused() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let err = create_output_dir(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn unknown_algorithm_creates_nothing() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let bench = tmp.path().join("models");
        fs::create_dir(&bench).unwrap();
        let options = RunOptions {
            cutoff: "1s".to_string(),
            bench_dir: bench,
            algorithm: "NOPE".to_string(),
            interactive: false,
            naming: Naming::Plain,
            out_root: tmp.path().join("out"),
        };

        let err = run(&options, &HarnessConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Unknown algorithm 'NOPE'"));
        assert!(!tmp.path().join("out").exists());
    }

    /// Runs a stand-in algorithm under the host's real `timeout`; skipped
    /// where that is unavailable.
    #[cfg(unix)]
    mod sequential {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Prints a `time -p` style footer with the seconds read from the
        /// model file; a model containing `crash` fails without a footer.
        const ALGO: &str = "#!/bin/sh
read secs
if [ \"$secs\" = crash ]; then echo 'thread main panicked'; exit 101; fi
echo 'Attractor #1: 4'
echo \"real $secs\"
echo 'user 0.0'
echo 'sys 0.0'
";

        fn fixture(tmp: &Path) -> Option<(Executor, Vec<BenchmarkEntry>, PathBuf)> {
            if !crate::tools::help_succeeds("timeout") {
                return None;
            }

            let algo = tmp.join("algo");
            fs::write(&algo, ALGO).unwrap();
            fs::set_permissions(&algo, fs::Permissions::from_mode(0o755)).unwrap();

            let models = tmp.join("models");
            fs::create_dir(&models).unwrap();
            let mut entries = Vec::new();
            for (name, body) in [("a", "5.0"), ("b", "crash"), ("c", "5.0"), ("d", "1.5"), ("e", "2.0")] {
                let path = models.join(format!("{name}.aeon"));
                fs::write(&path, format!("{body}\n")).unwrap();
                entries.push(BenchmarkEntry {
                    path,
                    name: name.to_string(),
                });
            }

            let out = tmp.join("out");
            fs::create_dir(&out).unwrap();

            let executor = Executor {
                timeout: TimeoutTool::Timeout,
                cutoff: "30s".to_string(),
                timer: Vec::new(),
                binding: AlgorithmBinding {
                    name: "TGR".to_string(),
                    program: algo,
                    args: Vec::new(),
                    input: InputMode::Stdin,
                    extension: "aeon".to_string(),
                    footer: FooterKind::TimeP,
                    external: false,
                },
                tail_lines: 16,
            };
            Some((executor, entries, out))
        }

        #[test]
        fn full_run_writes_both_tables() {
            let tmp = assert_fs::TempDir::new().unwrap();
            let Some((executor, entries, out)) = fixture(tmp.path()) else {
                return;
            };

            let summary =
                run_entries(&executor, &entries, &out, "models", 3600.0, None::<&mut &[u8]>).unwrap();
            assert_eq!(summary.succeeded, 4);
            assert_eq!(summary.failed, 1);
            assert!(!summary.aborted);

            let times = fs::read_to_string(out.join("models_TGR_times.csv")).unwrap();
            assert_eq!(
                times,
                "Benchmark, Time[s]\na, 5.0\nb, fail\nc, 5.0\nd, 1.5\ne, 2.0\n"
            );

            let aggregated = fs::read_to_string(out.join("models_TGR_aggregated.csv")).unwrap();
            assert_eq!(
                aggregated,
                "Time[s], No. Completed\n1.5, 1\n2.0, 2\n5.0, 3\n5.0, 4\n3600.0, 4\n"
            );

            let log = fs::read_to_string(out.join("b_out.txt")).unwrap();
            assert!(log.contains("thread main panicked"));
        }

        #[test]
        fn abort_on_third_keeps_two_rows() {
            let tmp = assert_fs::TempDir::new().unwrap();
            let Some((executor, entries, out)) = fixture(tmp.path()) else {
                return;
            };

            let mut operator: &[u8] = b"\n\nabort\n";
            let summary =
                run_entries(&executor, &entries, &out, "models", 3600.0, Some(&mut operator)).unwrap();
            assert!(summary.aborted);
            assert_eq!(summary.succeeded + summary.failed, 2);

            let times = fs::read_to_string(out.join("models_TGR_times.csv")).unwrap();
            assert_eq!(times, "Benchmark, Time[s]\na, 5.0\nb, fail\n");

            let aggregated = fs::read_to_string(out.join("models_TGR_aggregated.csv")).unwrap();
            assert_eq!(aggregated, "Time[s], No. Completed\n5.0, 1\n3600.0, 1\n");
            assert!(!out.join("c_out.txt").exists());
        }

        #[test]
        fn skip_leaves_no_row_and_no_log() {
            let tmp = assert_fs::TempDir::new().unwrap();
            let Some((executor, entries, out)) = fixture(tmp.path()) else {
                return;
            };

            let mut operator: &[u8] = b"skip\n\nskip\n\n\n";
            let summary =
                run_entries(&executor, &entries, &out, "models", 3600.0, Some(&mut operator)).unwrap();
            assert_eq!(summary.skipped, 2);
            assert!(!out.join("a_out.txt").exists());

            let times = fs::read_to_string(out.join("models_TGR_times.csv")).unwrap();
            assert_eq!(times, "Benchmark, Time[s]\nb, fail\nd, 1.5\ne, 2.0\n");
        }

        #[test]
        fn cutoff_kills_slow_runs() {
            let tmp = assert_fs::TempDir::new().unwrap();
            let Some((mut executor, entries, out)) = fixture(tmp.path()) else {
                return;
            };
            let slow = tmp.path().join("slow");
            fs::write(&slow, "#!/bin/sh\necho 'Attractor #1'\nsleep 5\necho 'real 5.0'\n").unwrap();
            fs::set_permissions(&slow, fs::Permissions::from_mode(0o755)).unwrap();
            executor.binding.program = slow;
            executor.cutoff = "0.2s".to_string();

            let summary =
                run_entries(&executor, &entries[..1], &out, "models", 3600.0, None::<&mut &[u8]>).unwrap();
            assert_eq!(summary.succeeded, 0);
            assert_eq!(summary.failed, 1);

            let aggregated = fs::read_to_string(out.join("models_TGR_aggregated.csv")).unwrap();
            assert_eq!(aggregated, "Time[s], No. Completed\n3600.0, 0\n");
        }
    }
}
