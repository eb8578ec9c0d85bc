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

//! System memory CSV reader.
//!
//! Header: `timestamp,total_memory_gb,available_memory_gb,used_memory_gb,memory_usage_percent`

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use log::error;
use serde::{Deserialize, Deserializer};

/// One system-wide memory observation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SystemMemorySample {
    #[serde(deserialize_with = "de_timestamp")]
    pub timestamp: NaiveDateTime,
    pub total_memory_gb: f64,
    pub available_memory_gb: f64,
    pub used_memory_gb: f64,
    pub memory_usage_percent: f64,
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

/// Accepts the usual logger timestamp spellings, RFC 3339 included.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {:?}", raw)))
}

/// Read every row, failing as a whole on the first bad one.
pub fn read_system_memory<R: Read>(reader: R) -> Result<Vec<SystemMemorySample>, csv::Error> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .collect()
}

/// Parse the system memory log. Failures are reported and yield no samples.
pub fn parse_system_memory_log(path: &Path) -> Vec<SystemMemorySample> {
    let parsed = File::open(path)
        .map_err(csv::Error::from)
        .and_then(read_system_memory);
    match parsed {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to parse system memory log {}: {}", path.display(), e);
            Vec::new()
        }
    }
}
