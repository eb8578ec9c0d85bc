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
    # analyze.rs

    Analysis driver: resolve inputs, parse, summarize, chart, export.

    A missing pidstat log or a log without rows for the PID ends the run
    early (see [`AnalysisOutcome`]). A missing or broken system memory log
    or execution-time file only drops that data from the report.
*/

use std::path::{Path, PathBuf};

use anyhow::Context;
use log::warn;

use crate::chart::render_report;
use crate::exectime::{default_sources, resolve_execution_time};
use crate::export::export_workbook;
use crate::pidstat::parse_pidstat_log;
use crate::stats::SummaryStatistics;
use crate::style::ChartStyle;
use crate::sysmem::{SystemMemorySample, parse_system_memory_log};

pub const DEFAULT_LOG_FILE: &str = "pidstat.2sec.log";
pub const DEFAULT_SYSTEM_MEMORY_FILE: &str = "system_memory.log";
pub const DEFAULT_PID: u32 = 1292676;
pub const DEFAULT_TITLE: &str = "Server Memory Usage Analysis";
pub const DEFAULT_OUTPUT_PREFIX: &str = "memory_analysis_pid_1292676";

/// Spans longer than a day are charted but flagged.
const LONG_SPAN_SECS: f64 = 86_400.0;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub log_file: PathBuf,
    pub system_memory_file: PathBuf,
    pub target_pid: u32,
    pub title: String,
    /// Output files are `<prefix>.png` and `<prefix>.xlsx`
    pub output_prefix: String,
    pub execution_time_file: Option<PathBuf>,
    /// Where execution-time files are looked up
    pub work_dir: PathBuf,
    pub style: ChartStyle,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            system_memory_file: PathBuf::from(DEFAULT_SYSTEM_MEMORY_FILE),
            target_pid: DEFAULT_PID,
            title: DEFAULT_TITLE.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            execution_time_file: None,
            work_dir: PathBuf::from("."),
            style: ChartStyle::default(),
        }
    }
}

impl AnalysisConfig {
    /// Positional argument modes:
    /// - 6 or more: `<log> <system_log> <pid> <title> <prefix> <exec_time_file>`
    /// - 1 to 5: `<title>`, everything else defaulted
    /// - none: all defaults
    pub fn from_positional(args: &[String]) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if args.len() >= 6 {
            config.log_file = PathBuf::from(&args[0]);
            config.system_memory_file = PathBuf::from(&args[1]);
            config.target_pid = args[2]
                .parse()
                .with_context(|| format!("invalid PID {:?}", args[2]))?;
            config.title = args[3].clone();
            config.output_prefix = args[4].clone();
            config.execution_time_file = Some(PathBuf::from(&args[5]));
        } else if let Some(title) = args.first() {
            config.title = title.clone();
        }
        Ok(config)
    }

    pub fn chart_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.png", self.output_prefix))
    }

    pub fn workbook_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.xlsx", self.output_prefix))
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Completed {
        chart: PathBuf,
        workbook: PathBuf,
        samples: usize,
    },
    LogNotFound(PathBuf),
    NoSamples { pid: u32 },
}

pub fn run_analysis(config: &AnalysisConfig) -> anyhow::Result<AnalysisOutcome> {
    let sources = default_sources(
        config.execution_time_file.as_deref(),
        &config.log_file,
        &config.work_dir,
    );
    let execution_time = resolve_execution_time(&sources);

    if !config.log_file.exists() {
        return Ok(AnalysisOutcome::LogNotFound(config.log_file.clone()));
    }

    println!("Starting pidstat log file analysis...");
    let samples = parse_pidstat_log(&config.log_file, config.target_pid)
        .with_context(|| format!("reading {}", config.log_file.display()))?;
    let Some(stats) = SummaryStatistics::compute(&samples) else {
        return Ok(AnalysisOutcome::NoSamples {
            pid: config.target_pid,
        });
    };

    let span = stats.duration_secs();
    println!(
        "Process data: {} entries, time range: {:.1}s ({:.1}min)",
        samples.len(),
        span,
        span / 60.0
    );
    if span > LONG_SPAN_SECS {
        warn!("Very large time range: {:.1}s ({:.1}h)", span, span / 3600.0);
        warn!("Graph generation may take a long time.");
    }

    let system = load_system_memory(&config.system_memory_file);

    stats.print_report();

    let chart = config.chart_path();
    render_report(
        &samples,
        &system,
        &chart,
        execution_time,
        &config.title,
        &config.style,
    )?;

    let workbook = config.workbook_path();
    export_workbook(&samples, &system, &workbook)?;

    Ok(AnalysisOutcome::Completed {
        chart,
        workbook,
        samples: samples.len(),
    })
}

fn load_system_memory(path: &Path) -> Vec<SystemMemorySample> {
    if !path.exists() {
        warn!("System memory log file not found: {}", path.display());
        return Vec::new();
    }
    let rows = parse_system_memory_log(path);
    println!("System memory log parsing completed: {} entries", rows.len());
    rows
}
