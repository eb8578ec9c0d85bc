// pidstat_report - pidstat Memory Log Analyzer
// Copyright (C) 2025 The pidstat_report contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

/*!
    # exectime.rs

    Locates the optional execution-time file (one float, seconds) written
    by the benchmark wrapper next to the pidstat log.

    Lookup order:
    1. the path given on the command line
    2. `execution_time_<base>.txt` derived from the log name
       (`pidstat_<base>.txt` -> `<base>`)
    3. the first `execution_time_*.txt` in the working directory
*/

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

static EXEC_TIME_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^execution_time_.*\.txt$").expect("execution time file pattern")
});

#[derive(Debug, thiserror::Error)]
pub enum ExecTimeError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: not a number: {value:?}")]
    Parse { path: PathBuf, value: String },
}

/// One way of finding the execution-time file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecTimeSource {
    Explicit(PathBuf),
    DerivedFromLog { log: PathBuf, dir: PathBuf },
    ScanDirectory(PathBuf),
}

impl ExecTimeSource {
    /// Candidate file for this strategy, if one exists on disk.
    pub fn locate(&self) -> Option<PathBuf> {
        match self {
            ExecTimeSource::Explicit(path) => path.is_file().then(|| path.clone()),
            ExecTimeSource::DerivedFromLog { log, dir } => {
                let path = dir.join(derived_file_name(log)?);
                path.is_file().then_some(path)
            }
            ExecTimeSource::ScanDirectory(dir) => scan_directory(dir),
        }
    }
}

fn derived_file_name(log: &Path) -> Option<String> {
    let name = log.file_name()?.to_string_lossy();
    let base = name.replace(".txt", "").replace("pidstat_", "");
    Some(format!("execution_time_{}.txt", base))
}

fn scan_directory(dir: &Path) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .filter(|entry| EXEC_TIME_FILE.is_match(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Standard lookup order. The explicit entry is only present when a path
/// was given.
pub fn default_sources(explicit: Option<&Path>, log: &Path, dir: &Path) -> Vec<ExecTimeSource> {
    let mut sources = Vec::with_capacity(3);
    if let Some(path) = explicit {
        sources.push(ExecTimeSource::Explicit(path.to_path_buf()));
    }
    sources.push(ExecTimeSource::DerivedFromLog {
        log: log.to_path_buf(),
        dir: dir.to_path_buf(),
    });
    sources.push(ExecTimeSource::ScanDirectory(dir.to_path_buf()));
    sources
}

pub fn read_execution_time(path: &Path) -> Result<f64, ExecTimeError> {
    let content = fs::read_to_string(path).map_err(|source| ExecTimeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = content.trim();
    value.parse().map_err(|_| ExecTimeError::Parse {
        path: path.to_path_buf(),
        value: value.to_string(),
    })
}

/// First source that yields a readable number wins.
pub fn resolve_execution_time(sources: &[ExecTimeSource]) -> Option<f64> {
    sources.iter().find_map(|source| {
        let path = source.locate()?;
        match read_execution_time(&path) {
            Ok(secs) => {
                debug!("execution time {}s from {}", secs, path.display());
                Some(secs)
            }
            Err(e) => {
                warn!("Ignoring execution time file: {}", e);
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_pattern_matches_only_txt_candidates() {
        assert!(EXEC_TIME_FILE.is_match("execution_time_vm.txt"));
        assert!(EXEC_TIME_FILE.is_match("execution_time_.txt"));
        assert!(!EXEC_TIME_FILE.is_match("execution_time_vm.log"));
        assert!(!EXEC_TIME_FILE.is_match("old_execution_time_vm.txt"));
    }

    #[test]
    fn derived_name_strips_log_prefix_and_extension() {
        assert_eq!(
            derived_file_name(Path::new("runs/pidstat_vm_create.txt")).as_deref(),
            Some("execution_time_vm_create.txt")
        );
    }
}
