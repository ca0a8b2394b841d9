use std::ffi::OsStr;
use std::process::{Command, Stdio};

use anyhow::Result;

use crate::errors::BenchError;
use crate::types::TimeoutTool;

/// Runs `program args` with all output discarded and returns its exit code.
///
/// `Ok(None)` means the process was terminated by a signal; `Err` means it
/// could not be started at all.
pub fn quiet_exit_code<S: AsRef<OsStr>>(program: S, args: &[&str]) -> std::io::Result<Option<i32>> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    Ok(status.code())
}

/// True when `program --help` starts and exits with status 0.
pub fn help_succeeds(program: &str) -> bool {
    matches!(quiet_exit_code(program, &["--help"]), Ok(Some(0)))
}

/// Find the timeout utility available on this host.
pub fn resolve_timeout_tool() -> Result<TimeoutTool> {
    resolve_timeout_tool_with(help_succeeds)
}

/// First candidate accepted by `probe` wins, in [`TimeoutTool::CANDIDATES`] order.
pub fn resolve_timeout_tool_with<F>(mut probe: F) -> Result<TimeoutTool>
where
    F: FnMut(&str) -> bool,
{
    for tool in TimeoutTool::CANDIDATES {
        if probe(tool.program()) {
            tracing::info!(tool = %tool, "timeout utility ok");
            return Ok(tool);
        }
        tracing::debug!(tool = %tool, "timeout utility not usable");
    }
    Err(BenchError::NoTimeoutTool.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_name_preferred() {
        let mut probed = Vec::new();
        let tool = resolve_timeout_tool_with(|p| {
            probed.push(p.to_string());
            true
        })
        .unwrap();
        assert_eq!(tool, TimeoutTool::Timeout);
        assert_eq!(probed, vec!["timeout"]);
    }

    #[test]
    fn falls_back_to_gtimeout() {
        let mut probed = Vec::new();
        let tool = resolve_timeout_tool_with(|p| {
            probed.push(p.to_string());
            p == "gtimeout"
        })
        .unwrap();
        assert_eq!(tool, TimeoutTool::Gtimeout);
        assert_eq!(probed, vec!["timeout", "gtimeout"]);
    }

    #[test]
    fn none_available_is_fatal() {
        let err = resolve_timeout_tool_with(|_| false).unwrap_err();
        assert!(err.to_string().contains("No timeout utility found"));
    }

    #[test]
    fn missing_program_does_not_probe_ok() {
        assert!(!help_succeeds("benchrun-definitely-not-a-real-program"));
        assert!(quiet_exit_code("benchrun-definitely-not-a-real-program", &[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_is_reported() {
        assert_eq!(quiet_exit_code("sh", &["-c", "exit 3"]).unwrap(), Some(3));
    }
}
