//! One bounded-time invocation per benchmark.
//!
//! The harness never kills anything itself: the timeout utility wraps the
//! timer, which wraps the algorithm, and all three write into the same log.

use std::fs::File;
use std::io::{BufRead, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::algorithm::AlgorithmBinding;
use crate::types::{BenchmarkEntry, InputMode, TimeoutTool, shell_word};

/// What a finished bounded run left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// Wall-clock time as seen by the harness, including process start-up.
    pub wall_time: Duration,
    /// `None` when the process ended by signal.
    pub exit_code: Option<i32>,
    /// Last lines of the log, oldest first.
    pub tail: Vec<String>,
}

/// Spawn `command` with stdout and stderr both going to `log`, wait for it,
/// and read back the log's last `tail_lines` lines.
pub fn bounded_run(mut command: Command, log: &Path, tail_lines: usize) -> Result<RunRecord> {
    let out = File::create(log).with_context(|| format!("Failed to create log {}", log.display()))?;
    let err = out
        .try_clone()
        .with_context(|| format!("Failed to share log handle {}", log.display()))?;

    let start = Instant::now();
    let status = command
        .stdout(Stdio::from(out))
        .stderr(Stdio::from(err))
        .status()
        .with_context(|| format!("Failed to start {:?}", command.get_program()))?;
    let wall_time = start.elapsed();

    Ok(RunRecord {
        wall_time,
        exit_code: status.code(),
        tail: read_tail(log, tail_lines),
    })
}

/// Last `n` lines of a file. A missing or unreadable file reads as empty.
pub fn read_tail(path: &Path, n: usize) -> Vec<String> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(_) => return Vec::new(),
    };
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(n);
    lines[skip..].iter().map(|l| l.to_string()).collect()
}

/// Process-wide invocation settings, fixed once at startup.
#[derive(Debug, Clone)]
pub struct Executor {
    pub timeout: TimeoutTool,
    /// Passed verbatim to the timeout utility.
    pub cutoff: String,
    pub timer: Vec<String>,
    pub binding: AlgorithmBinding,
    pub tail_lines: usize,
}

impl Executor {
    /// `timeout <cutoff> <timer...> <program> <args...> [<input>]`, without redirections.
    fn argv(&self, input: &Path) -> Vec<String> {
        let mut argv = vec![self.timeout.program().to_string(), self.cutoff.clone()];
        argv.extend(self.timer.iter().cloned());
        argv.push(self.binding.program.to_string_lossy().into_owned());
        argv.extend(self.binding.args.iter().cloned());
        if self.binding.input == InputMode::Argument {
            argv.push(input.to_string_lossy().into_owned());
        }
        argv
    }

    pub fn command(&self, input: &Path) -> Result<Command> {
        let argv = self.argv(input);
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        match self.binding.input {
            InputMode::Stdin => {
                let file = File::open(input)
                    .with_context(|| format!("Failed to open benchmark {}", input.display()))?;
                command.stdin(Stdio::from(file));
            }
            InputMode::Argument => {
                command.stdin(Stdio::null());
            }
        }
        Ok(command)
    }

    /// The equivalent `sh` command line, for the operator's log.
    pub fn command_line(&self, input: &Path, log: &Path) -> String {
        let mut words: Vec<String> = self.argv(input).iter().map(|w| shell_word(w)).collect();
        if self.binding.input == InputMode::Stdin {
            words.push("<".to_string());
            words.push(shell_word(&input.to_string_lossy()));
        }
        words.push(">".to_string());
        words.push(shell_word(&log.to_string_lossy()));
        words.push("2>&1".to_string());
        words.join(" ")
    }

    /// Run one benchmark, logging to `log`.
    ///
    /// An unreadable input is recorded in the log instead of failing the run.
    pub fn run(&self, entry: &BenchmarkEntry, log: &Path) -> Result<RunRecord> {
        tracing::info!("{}", self.command_line(&entry.path, log));
        let command = match self.command(&entry.path) {
            Ok(c) => c,
            Err(e) => {
                let mut file =
                    File::create(log).with_context(|| format!("Failed to create log {}", log.display()))?;
                writeln!(file, "{:#}", e)?;
                return Ok(RunRecord {
                    wall_time: Duration::ZERO,
                    exit_code: None,
                    tail: read_tail(log, self.tail_lines),
                });
            }
        };
        let record = bounded_run(command, log, self.tail_lines)?;
        tracing::debug!(
            exit_code = ?record.exit_code,
            wall_ms = record.wall_time.as_millis() as u64,
            "run finished"
        );
        Ok(record)
    }
}

/// Operator's answer at the interactive pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Skip,
    Abort,
}

pub fn parse_decision(line: &str) -> Decision {
    if line.starts_with("skip") {
        Decision::Skip
    } else if line.starts_with("abort") {
        Decision::Abort
    } else {
        Decision::Proceed
    }
}

/// Blocks until the operator enters a line. End of input means proceed.
pub fn ask_operator<R: BufRead>(input: &mut R) -> std::io::Result<Decision> {
    println!("Write 'skip' to go to next benchmark, 'abort' to end the run, or press enter key to continue...");
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(parse_decision(&line))
}
