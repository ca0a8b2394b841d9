use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

/// One selected benchmark input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkEntry {
    pub path: PathBuf,
    pub name: String,
}

/// Classification of a single run's log.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Success { elapsed_seconds: f64 },
    Failure { reason: String },
}

impl RunOutcome {
    pub const NO_OUTPUT: &'static str = "no output";

    pub fn elapsed(&self) -> Option<f64> {
        match self {
            RunOutcome::Success { elapsed_seconds } => Some(*elapsed_seconds),
            RunOutcome::Failure { .. } => None,
        }
    }
}

/// The timeout-enforcing command found on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutTool {
    Timeout,
    Gtimeout,
}

impl TimeoutTool {
    /// Probe order: GNU name first, then the Homebrew coreutils name.
    pub const CANDIDATES: [TimeoutTool; 2] = [TimeoutTool::Timeout, TimeoutTool::Gtimeout];

    pub fn program(self) -> &'static str {
        match self {
            TimeoutTool::Timeout => "timeout",
            TimeoutTool::Gtimeout => "gtimeout",
        }
    }
}

impl fmt::Display for TimeoutTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// How a benchmark file is handed to the algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputMode {
    /// `program args < file`
    Stdin,
    /// `program args file`
    Argument,
}

/// Filename scheme used to recognise and order benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Naming {
    /// `*.<ext>`, sorted by file name
    #[default]
    Plain,
    /// `[v<vars>]__[r<regs>]__[<name>]__[<id>]*.<ext>`, sorted by variable count
    RealLife,
    /// `<a>_<vars>_<b>.<ext>`, sorted by variable count
    RandomWide,
}

/// Wraps a string in single quotes, escaping internal single quotes as `'\''`.
pub fn shell_escape_single_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Quotes only when the word would be split or expanded by `sh`.
pub fn shell_word(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:+,@%".contains(c));
    if plain {
        s.to_string()
    } else {
        shell_escape_single_quote(s)
    }
}

/// Seconds in shortest round-trip form, always with a decimal point.
pub fn format_seconds(secs: f64) -> String {
    format!("{:?}", secs)
}
