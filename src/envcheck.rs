//! Pre-benchmark environment check: is everything the harness shells out to present?

use owo_colors::{OwoColorize, Stream};

use crate::algorithm::is_healthy_exit;
use crate::config::HarnessConfig;
use crate::tools::{quiet_exit_code, resolve_timeout_tool};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Ok(String),
    /// Informational, does not fail the check.
    Skipped(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckItem {
    pub name: &'static str,
    pub status: CheckStatus,
}

#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub items: Vec<CheckItem>,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|i| matches!(i.status, CheckStatus::Error(_)))
    }
}

pub fn check_external_tool(path: Option<&str>, var: &str) -> CheckStatus {
    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return CheckStatus::Skipped(format!("${} undefined", var));
    };
    match quiet_exit_code(path, &[]) {
        Ok(code) if is_healthy_exit(code) => CheckStatus::Ok(format!("{} executable ok", path)),
        Ok(Some(code)) => CheckStatus::Error(format!("{} exit code {}", path, code)),
        Ok(None) => CheckStatus::Error(format!("{} killed by signal", path)),
        Err(e) => CheckStatus::Error(format!("{} not runnable: {}", path, e)),
    }
}

fn check_timeout() -> CheckStatus {
    match resolve_timeout_tool() {
        Ok(tool) => CheckStatus::Ok(format!("{} ok", tool)),
        Err(e) => CheckStatus::Error(e.to_string()),
    }
}

fn check_cargo() -> CheckStatus {
    match std::process::Command::new("cargo").arg("--version").output() {
        Ok(out) if out.status.success() => {
            CheckStatus::Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
        }
        Ok(out) => CheckStatus::Error(format!("cargo --version failed with {}", out.status)),
        Err(_) => CheckStatus::Error("Rust compiler not found".to_string()),
    }
}

pub fn run_checks(config: &HarnessConfig) -> CheckReport {
    let tool_path = std::env::var(&config.cabean_env).ok();
    CheckReport {
        items: vec![
            CheckItem {
                name: "external tool",
                status: check_external_tool(tool_path.as_deref(), &config.cabean_env),
            },
            CheckItem {
                name: "timeout utility",
                status: check_timeout(),
            },
            CheckItem {
                name: "rust toolchain",
                status: check_cargo(),
            },
        ],
    }
}

pub fn format_report(report: &CheckReport) -> String {
    let mut out = String::new();
    let width = report.items.iter().map(|i| i.name.len()).max().unwrap_or(0);

    for item in &report.items {
        let (tag, detail) = match &item.status {
            CheckStatus::Ok(d) => (
                "ok".if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
                d,
            ),
            CheckStatus::Skipped(d) => (
                "--".if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string(),
                d,
            ),
            CheckStatus::Error(d) => (
                "!!".if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
                d,
            ),
        };
        out.push_str(&format!(
            "  {}  {:<width$}  {}\n",
            tag,
            item.name,
            detail,
            width = width
        ));
    }

    let footer = if report.has_errors() {
        "CHECK COMPLETED WITH ERRORS"
    } else {
        "CHECK COMPLETED"
    };
    out.push_str(&footer.if_supports_color(Stream::Stdout, |s| s.bold()).to_string());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_tool_is_not_an_error() {
        assert_eq!(
            check_external_tool(None, "CABEAN_BIN"),
            CheckStatus::Skipped("$CABEAN_BIN undefined".to_string())
        );
        assert!(matches!(check_external_tool(Some(""), "X"), CheckStatus::Skipped(_)));
    }

    #[test]
    fn missing_tool_is_an_error() {
        assert!(matches!(
            check_external_tool(Some("/nonexistent/cabean"), "CABEAN_BIN"),
            CheckStatus::Error(_)
        ));
    }

    #[test]
    fn report_errors_and_footer() {
        let report = CheckReport {
            items: vec![
                CheckItem {
                    name: "a",
                    status: CheckStatus::Ok("fine".to_string()),
                },
                CheckItem {
                    name: "bb",
                    status: CheckStatus::Error("broken".to_string()),
                },
            ],
        };
        assert!(report.has_errors());
        let text = format_report(&report);
        assert!(text.contains("broken"));
        assert!(text.contains("CHECK COMPLETED WITH ERRORS"));
    }

    #[test]
    fn skipped_only_report_passes() {
        let report = CheckReport {
            items: vec![CheckItem {
                name: "external tool",
                status: CheckStatus::Skipped("$CABEAN_BIN undefined".to_string()),
            }],
        };
        assert!(!report.has_errors());
        let text = format_report(&report);
        assert!(text.contains("CHECK COMPLETED"));
        assert!(!text.contains("WITH ERRORS"));
    }
}
