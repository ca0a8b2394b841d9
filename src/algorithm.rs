use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::config::HarnessConfig;
use crate::errors::BenchError;
use crate::footer::FooterKind;
use crate::tools::quiet_exit_code;
use crate::types::InputMode;

/// Exit codes of the external tool when run without arguments
/// (0 on Linux builds, 1 on macOS builds).
const HEALTHY_EXIT_CODES: [i32; 2] = [0, 1];

/// Everything the executor needs to invoke one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmBinding {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub input: InputMode,
    /// Benchmark file extension, without the dot.
    pub extension: String,
    pub footer: FooterKind,
    #[serde(skip)]
    pub external: bool,
}

enum Program {
    /// A binary built from this workspace, looked up in `bin_dir`.
    Local(&'static str),
    /// A third-party tool whose path comes from the environment.
    External,
}

struct BindingRow {
    name: &'static str,
    program: Program,
    input: InputMode,
    extension: &'static str,
}

const BINDINGS: &[BindingRow] = &[
    BindingRow {
        name: "BASIC",
        program: Program::Local("algorithm_basic"),
        input: InputMode::Stdin,
        extension: "aeon",
    },
    BindingRow {
        name: "TGR",
        program: Program::Local("algorithm_sequential"),
        input: InputMode::Stdin,
        extension: "aeon",
    },
    BindingRow {
        name: "ITGR",
        program: Program::Local("algorithm_priority"),
        input: InputMode::Stdin,
        extension: "aeon",
    },
    BindingRow {
        name: "RR",
        program: Program::Local("algorithm_round_robin"),
        input: InputMode::Stdin,
        extension: "aeon",
    },
    BindingRow {
        name: "CABEAN",
        program: Program::External,
        input: InputMode::Argument,
        extension: "bnet",
    },
];

pub fn supported_names() -> Vec<&'static str> {
    BINDINGS.iter().map(|b| b.name).collect()
}

/// Look up a binding, reading the external tool path from the process environment.
///
/// External tools are health-checked before the binding is returned.
pub fn resolve(name: &str, config: &HarnessConfig) -> Result<AlgorithmBinding> {
    let binding = lookup(name, config, |var| std::env::var(var).ok())?;
    if binding.external {
        check_tool_health(&binding.program)?;
    }
    Ok(binding)
}

/// Table lookup without side effects. `env` supplies environment variables.
pub fn lookup<F>(name: &str, config: &HarnessConfig, env: F) -> Result<AlgorithmBinding>
where
    F: Fn(&str) -> Option<String>,
{
    let row = BINDINGS
        .iter()
        .find(|b| b.name == name)
        .ok_or_else(|| BenchError::UnknownAlgorithm {
            name: name.to_string(),
            supported: supported_names().join(", "),
        })?;

    let (program, args, external) = match row.program {
        Program::Local(binary) => (config.bin_dir.join(binary), Vec::new(), false),
        Program::External => {
            let path = env(&config.cabean_env)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| BenchError::MissingToolPath {
                    algorithm: row.name.to_string(),
                    var: config.cabean_env.clone(),
                })?;
            (PathBuf::from(path), config.cabean_flags.clone(), true)
        }
    };

    Ok(AlgorithmBinding {
        name: row.name.to_string(),
        program,
        args,
        input: row.input,
        extension: row.extension.to_string(),
        footer: config.footer,
        external,
    })
}

/// Every binding, for listing. Unset tool paths show as `$VAR`.
pub fn table<F>(config: &HarnessConfig, env: F) -> Vec<AlgorithmBinding>
where
    F: Fn(&str) -> Option<String>,
{
    let placeholder = format!("${}", config.cabean_env);
    let env = |var: &str| env(var).filter(|p| !p.is_empty()).or_else(|| Some(placeholder.clone()));
    supported_names()
        .into_iter()
        .filter_map(|name| lookup(name, config, env).ok())
        .collect()
}

pub fn is_healthy_exit(code: Option<i32>) -> bool {
    code.is_some_and(|c| HEALTHY_EXIT_CODES.contains(&c))
}

/// Run the tool once with no arguments and output discarded.
pub fn check_tool_health(program: &Path) -> Result<()> {
    let code = match quiet_exit_code(program, &[]) {
        Ok(code) => code,
        Err(e) => {
            return Err(BenchError::UnhealthyTool {
                path: program.to_path_buf(),
                code: format!("not runnable: {}", e),
            }
            .into());
        }
    };
    if !is_healthy_exit(code) {
        return Err(BenchError::UnhealthyTool {
            path: program.to_path_buf(),
            code: code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
        }
        .into());
    }
    tracing::info!(path = %program.display(), "external tool ok");
    Ok(())
}
