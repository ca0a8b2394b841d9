use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("No timeout utility found. Install coreutils (`timeout`, or `gtimeout` on macOS).")]
    NoTimeoutTool,

    #[error("Unknown algorithm '{name}'. Supported: {supported}")]
    UnknownAlgorithm { name: String, supported: String },

    #[error("Algorithm {algorithm} needs the tool path in ${var}, but it is not set")]
    MissingToolPath { algorithm: String, var: String },

    #[error("External tool {path} is not healthy (exit code {code})")]
    UnhealthyTool { path: PathBuf, code: String },

    #[error("Benchmark directory {path} does not exist or is not a directory")]
    BenchDirNotFound { path: PathBuf },

    #[error("Invalid benchmark name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    #[error("Output directory {path} already exists")]
    OutputDirExists { path: PathBuf },
}
