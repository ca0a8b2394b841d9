use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::types::{RunOutcome, format_seconds};

pub const TIMES_HEADER: &str = "Benchmark, Time[s]";
pub const AGGREGATED_HEADER: &str = "Time[s], No. Completed";

/// Sorted `(elapsed, completed)` pairs ending with the horizon row.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeSeries {
    pub points: Vec<(f64, usize)>,
}

impl CumulativeSeries {
    /// Each successful time gets its own rank, so equal times take
    /// consecutive ranks rather than sharing one.
    pub fn build(times: &[f64], horizon: f64) -> Self {
        let mut sorted = times.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mut points: Vec<(f64, usize)> = sorted
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t, i + 1))
            .collect();
        points.push((horizon, times.len()));

        Self { points }
    }
}

/// Successful elapsed times seen so far; failures are dropped.
#[derive(Debug, Default)]
pub struct Aggregator {
    times: Vec<f64>,
}

impl Aggregator {
    pub fn record(&mut self, outcome: &RunOutcome) {
        if let Some(t) = outcome.elapsed() {
            self.times.push(t);
        }
    }

    pub fn successes(&self) -> usize {
        self.times.len()
    }

    pub fn series(&self, horizon: f64) -> CumulativeSeries {
        CumulativeSeries::build(&self.times, horizon)
    }
}

/// Per-benchmark outcome rows, flushed one at a time.
pub struct TimesCsv<W: Write> {
    out: W,
    rows: usize,
}

impl TimesCsv<File> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Self::new(file)
    }
}

impl<W: Write> TimesCsv<W> {
    pub fn new(mut out: W) -> Result<Self> {
        writeln!(out, "{}", TIMES_HEADER)?;
        out.flush()?;
        Ok(Self { out, rows: 0 })
    }

    pub fn write_row(&mut self, name: &str, outcome: &RunOutcome) -> Result<()> {
        let value = match outcome {
            RunOutcome::Success { elapsed_seconds } => format_seconds(*elapsed_seconds),
            RunOutcome::Failure { .. } => "fail".to_string(),
        };
        writeln!(self.out, "{}, {}", name, value)?;
        self.out.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// The aggregated table. The header is written up front so the file exists
/// even if the run dies; rows are written once, when the run is finalized.
pub struct AggregatedCsv<W: Write> {
    out: BufWriter<W>,
}

impl AggregatedCsv<File> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Self::new(file)
    }
}

impl<W: Write> AggregatedCsv<W> {
    pub fn new(out: W) -> Result<Self> {
        let mut out = BufWriter::new(out);
        writeln!(out, "{}", AGGREGATED_HEADER)?;
        out.flush()?;
        Ok(Self { out })
    }

    pub fn finish(mut self, series: &CumulativeSeries) -> Result<W> {
        for (time, count) in &series.points {
            writeln!(self.out, "{}, {}", format_seconds(*time), count)?;
        }
        self.out.flush()?;
        self.out
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush aggregated table: {}", e.error()))
    }
}
