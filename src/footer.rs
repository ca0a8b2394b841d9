//! Classification of a run's log by the fixed-shape footer at its end.
//!
//! The time-measurement wrapper prints a three-line footer (`real`, `user`,
//! `sys`) after the algorithm exits. A run counts as successful only when the
//! algorithm got far enough to print its own label line right before that
//! footer. Which lines are inspected is a property of the wrapper, so each
//! algorithm binding picks a [`FooterRecognizer`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::RunOutcome;

/// Label prefixes the algorithms print once attractor search has completed.
pub const ATTRACTOR_LABELS: &[&str] = &["time for attractor", "Attractor #"];

/// `real 12.34` (POSIX `time -p`) or `12.34 real ...` (BSD `time`).
static REAL_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:real\s*(\d+\.?\d*)|(\d+\.?\d*)\s+real\b)").unwrap()
});

/// Extract the wall-clock seconds from a timing line, in either word order.
pub fn parse_real_seconds(line: &str) -> Option<f64> {
    let caps = REAL_TIME.captures(line)?;
    let value = caps.get(1).or_else(|| caps.get(2))?;
    value.as_str().parse().ok()
}

pub trait FooterRecognizer {
    /// Elapsed seconds when `tail` ends with a valid footer.
    fn elapsed(&self, tail: &[String]) -> Option<f64>;
}

/// `time -p` footer: label line, `real`, `user`, `sys`.
///
/// Positional on purpose: anything the algorithm printed earlier is ignored.
#[derive(Debug, Clone, Copy)]
pub struct TimePFooter {
    pub labels: &'static [&'static str],
}

impl FooterRecognizer for TimePFooter {
    fn elapsed(&self, tail: &[String]) -> Option<f64> {
        let n = tail.len();
        if n < 4 {
            return None;
        }
        let label = &tail[n - 4];
        if !self.labels.iter().any(|prefix| label.starts_with(prefix)) {
            return None;
        }
        parse_real_seconds(&tail[n - 3])
    }
}

/// BSD `time` footer: a single trailing `<secs> real <u> user <s> sys` line.
#[derive(Debug, Clone, Copy, Default)]
pub struct BsdTimeFooter;

impl FooterRecognizer for BsdTimeFooter {
    fn elapsed(&self, tail: &[String]) -> Option<f64> {
        parse_real_seconds(tail.last()?)
    }
}

static TIME_P: TimePFooter = TimePFooter {
    labels: ATTRACTOR_LABELS,
};
static BSD_TIME: BsdTimeFooter = BsdTimeFooter;

/// Named footer shapes a binding can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FooterKind {
    #[default]
    TimeP,
    BsdTime,
}

impl FooterKind {
    pub fn recognizer(self) -> &'static dyn FooterRecognizer {
        match self {
            FooterKind::TimeP => &TIME_P,
            FooterKind::BsdTime => &BSD_TIME,
        }
    }
}

/// Classify a log tail. Empty logs fail with "no output"; anything the
/// recognizer rejects fails with the log's last line as the reason.
pub fn classify(tail: &[String], recognizer: &dyn FooterRecognizer) -> RunOutcome {
    let Some(last) = tail.last() else {
        return RunOutcome::Failure {
            reason: RunOutcome::NO_OUTPUT.to_string(),
        };
    };
    match recognizer.elapsed(tail) {
        Some(elapsed_seconds) => RunOutcome::Success { elapsed_seconds },
        None => RunOutcome::Failure {
            reason: last.clone(),
        },
    }
}
