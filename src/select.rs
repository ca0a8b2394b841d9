use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

use crate::errors::BenchError;
use crate::types::{BenchmarkEntry, Naming};

/// Recognises benchmark file names and derives their display name and sort key.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Any `*.<ext>` file; display name is the name without the extension.
    Extension(String),
    /// Structured names. `name_group` of `None` means the name without the extension.
    Pattern {
        regex: Regex,
        name_group: Option<usize>,
        key_group: usize,
    },
}

/// Display name plus optional numeric ordering key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognized {
    pub name: String,
    pub key: Option<u64>,
}

impl Matcher {
    pub fn for_naming(naming: Naming, extension: &str) -> Result<Self> {
        let ext = regex::escape(extension);
        let (pattern, name_group, key_group) = match naming {
            Naming::Plain => return Ok(Matcher::Extension(extension.to_string())),
            Naming::RealLife => (
                format!(r"^\[v(\d+)\]__\[r(\d+)\]__\[(.+?)\]__\[(.+?)\].*\.{ext}$"),
                Some(3),
                1,
            ),
            Naming::RandomWide => (format!(r"^(\d+)_(\d+)_(\d+)\.{ext}$"), None, 2),
        };
        let regex = Regex::new(&pattern).map_err(|source| BenchError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        Ok(Matcher::Pattern {
            regex,
            name_group,
            key_group,
        })
    }

    pub fn recognize(&self, file_name: &str) -> Option<Recognized> {
        match self {
            Matcher::Extension(ext) => {
                let stem = strip_extension(file_name, ext)?;
                Some(Recognized {
                    name: stem.to_string(),
                    key: None,
                })
            }
            Matcher::Pattern {
                regex,
                name_group,
                key_group,
            } => {
                let caps = regex.captures(file_name)?;
                let key = caps.get(*key_group)?.as_str().parse().ok()?;
                let name = match name_group {
                    Some(group) => caps.get(*group)?.as_str().to_string(),
                    None => Path::new(file_name).file_stem()?.to_str()?.to_string(),
                };
                Some(Recognized {
                    name,
                    key: Some(key),
                })
            }
        }
    }
}

fn strip_extension<'a>(file_name: &'a str, ext: &str) -> Option<&'a str> {
    let stem = file_name.strip_suffix(ext)?.strip_suffix('.')?;
    if stem.is_empty() { None } else { Some(stem) }
}

/// List `dir`, keep the files `matcher` recognises, and order them.
///
/// Ordering is by numeric key when the matcher yields one, then by file name.
pub fn select_benchmarks(dir: &Path, matcher: &Matcher) -> Result<Vec<BenchmarkEntry>> {
    if !dir.is_dir() {
        return Err(BenchError::BenchDirNotFound {
            path: dir.to_path_buf(),
        }
        .into());
    }

    let mut found: Vec<(Option<u64>, String, BenchmarkEntry)> = Vec::new();

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list benchmark directory {}", dir.display()))?;

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let file_name = match entry.file_name().into_string() {
            Ok(n) => n,
            Err(_) => continue,
        };

        let Some(recognized) = matcher.recognize(&file_name) else {
            tracing::debug!(file = %file_name, "not a benchmark, skipping");
            continue;
        };

        found.push((
            recognized.key,
            file_name,
            BenchmarkEntry {
                path,
                name: recognized.name,
            },
        ));
    }

    found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    Ok(found.into_iter().map(|(_, _, entry)| entry).collect())
}
