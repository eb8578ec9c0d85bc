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
    # pidstat.rs

    Reader for `pidstat -r -p <pid> <interval>` output.

    Expected layout after the two banner lines:

    ```text
    12:00:01      UID       PID  minflt/s  majflt/s     VSZ     RSS   %MEM  Command
    12:00:03     1000   1292676      0.50      0.00  812344  104212   0.63  cb-spider
    ```

    Only rows for the requested PID are kept. Rows that fail to convert are
    logged and skipped, they never abort the parse.
*/

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, warn};

/// Lines shorter than this are not sample rows.
pub const MIN_FIELDS: usize = 8;
/// Column holding the PID.
pub const PID_COLUMN: usize = 2;
/// Banner lines at the top of every pidstat log.
const BANNER_LINES: usize = 2;

/// One pidstat observation for the target process.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Wall clock time, date taken from the parse base date
    pub timestamp: NaiveDateTime,
    /// Raw `HH:MM:SS` column as logged
    pub time_str: String,
    pub pid: u32,
    /// Minor page faults per second
    pub minflt_per_sec: f64,
    /// Major page faults per second
    pub majflt_per_sec: f64,
    /// Virtual memory size (KB)
    pub vsz_kb: u64,
    /// Resident set size (KB)
    pub rss_kb: u64,
    pub mem_percent: f64,
    pub command: String,
}

impl Sample {
    /// Resident set size in MB.
    pub fn rss_mb(&self) -> f64 {
        self.rss_kb as f64 / 1024.0
    }

    /// Virtual size in MB.
    pub fn vsz_mb(&self) -> f64 {
        self.vsz_kb as f64 / 1024.0
    }

    /// Builds a sample from an already PID-filtered field slice.
    fn from_fields(fields: &[&str], base_date: NaiveDate) -> Result<Self, LineError> {
        let time_str = field(fields, 0, "time")?;
        let time = NaiveTime::parse_from_str(time_str, "%H:%M:%S").map_err(|source| {
            LineError::Time {
                value: time_str.to_string(),
                source,
            }
        })?;

        Ok(Self {
            timestamp: base_date.and_time(time),
            time_str: time_str.to_string(),
            pid: number(fields, PID_COLUMN, "PID")?,
            minflt_per_sec: number(fields, 3, "minflt/s")?,
            majflt_per_sec: number(fields, 4, "majflt/s")?,
            vsz_kb: number(fields, 5, "VSZ")?,
            rss_kb: number(fields, 6, "RSS")?,
            mem_percent: number(fields, 7, "%MEM")?,
            command: field(fields, 8, "Command")?.to_string(),
        })
    }
}

/// Why a candidate sample row was skipped.
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("missing {0} column")]
    MissingField(&'static str),
    #[error("invalid time {value:?}")]
    Time {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("invalid {column} value {value:?}")]
    Number { column: &'static str, value: String },
}

fn field<'a>(fields: &[&'a str], idx: usize, name: &'static str) -> Result<&'a str, LineError> {
    fields.get(idx).copied().ok_or(LineError::MissingField(name))
}

fn number<T: std::str::FromStr>(
    fields: &[&str],
    idx: usize,
    name: &'static str,
) -> Result<T, LineError> {
    let raw = field(fields, idx, name)?;
    raw.parse().map_err(|_| LineError::Number {
        column: name,
        value: raw.to_string(),
    })
}

fn is_header(line: &str) -> bool {
    line.starts_with("Linux") || line.contains("UID")
}

/// Parse a pidstat log file for `target_pid`, dating samples from today.
pub fn parse_pidstat_log(path: &Path, target_pid: u32) -> io::Result<Vec<Sample>> {
    let file = File::open(path)?;
    parse_pidstat(BufReader::new(file), target_pid, Local::now().date_naive())
}

/// Parse pidstat output from any reader.
///
/// Timestamps are built from `base_date` plus the logged time of day. When a
/// time goes backwards the log has crossed midnight and every later sample moves
/// one more day forward, so the result is always in non-decreasing order.
pub fn parse_pidstat<R: BufRead>(
    reader: R,
    target_pid: u32,
    base_date: NaiveDate,
) -> io::Result<Vec<Sample>> {
    let pid_str = target_pid.to_string();
    let mut samples: Vec<Sample> = Vec::new();
    // Days crossed so far
    let mut day_offset: i64 = 0;

    for line in reader.lines().skip(BANNER_LINES) {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || is_header(trimmed) {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < MIN_FIELDS || fields[PID_COLUMN] != pid_str {
            continue;
        }

        match Sample::from_fields(&fields, base_date) {
            Ok(mut sample) => {
                sample.timestamp += Duration::days(day_offset);
                if let Some(prev) = samples.last() {
                    if sample.timestamp < prev.timestamp {
                        day_offset += 1;
                        sample.timestamp += Duration::days(1);
                    }
                }
                samples.push(sample);
            }
            Err(e) => warn!("Parsing error: {} - {}", trimmed, e),
        }
    }

    debug!("pidstat: {} samples for PID {}", samples.len(), target_pid);
    Ok(samples)
}
