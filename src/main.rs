// pidstat_report - pidstat Memory Log Analyzer (Main Entry)
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

//! # pidstat_report Main Entry Point
//!
//! Usage:
//!   pidstat_report <pidstat_log> <system_memory_log> <pid> <title> <output_prefix> <exec_time_file>
//!   pidstat_report <title>
//!   pidstat_report

// Increment as tool evolves
const VERSION_NUMBER: &str = "1.0.0";

use std::path::PathBuf;
use std::process;

use clap::Parser;
use env_logger::Env;
use pidstat_report::analyze::{AnalysisConfig, AnalysisOutcome, run_analysis};
use pidstat_report::style::ChartStyle;

#[derive(Parser)]
#[command(name = "pidstat_report", version = VERSION_NUMBER)]
#[command(about = "Chart and summarize pidstat memory logs (PNG + XLSX)")]
struct Cli {
    /// <pidstat_log> <system_memory_log> <pid> <title> <output_prefix> <exec_time_file>, or just <title>
    args: Vec<String>,

    /// Chart style TOML file
    #[arg(long)]
    style: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let mut config = AnalysisConfig::from_positional(&cli.args)?;
    if let Some(path) = &cli.style {
        config.style = ChartStyle::load(path)?;
    }

    match run_analysis(&config)? {
        AnalysisOutcome::Completed {
            chart,
            workbook,
            samples,
        } => {
            println!();
            println!("Analysis completed! ({} samples)", samples);
            println!("Graph: {}", chart.display());
            println!("Excel: {}", workbook.display());
        }
        AnalysisOutcome::LogNotFound(path) => {
            eprintln!("Log file not found: {}", path.display());
            process::exit(1);
        }
        AnalysisOutcome::NoSamples { pid } => {
            eprintln!("No data found for PID {}.", pid);
            process::exit(1);
        }
    }
    Ok(())
}
