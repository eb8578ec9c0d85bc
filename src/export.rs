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
    # export.rs

    Spreadsheet export. Sheets are first built as plain tables, then
    written with `rust_xlsxwriter`:
    - "Process Memory": every sample plus MB columns
    - "System Memory": system log rows (only when present)
    - "Statistics": metric / value summary
*/

use std::path::Path;

use anyhow::Context;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::pidstat::Sample;
use crate::stats::{SummaryStatistics, SystemSummary};
use crate::sysmem::SystemMemorySample;

pub const PROCESS_SHEET: &str = "Process Memory";
pub const SYSTEM_SHEET: &str = "System Memory";
pub const STATISTICS_SHEET: &str = "Statistics";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<u64> for Cell {
    fn from(v: u64) -> Self {
        Cell::Number(v as f64)
    }
}

impl From<u32> for Cell {
    fn from(v: u32) -> Self {
        Cell::Number(v as f64)
    }
}

/// One worksheet: header row plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetTable {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

fn round(v: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (v * scale).round() / scale
}

pub fn process_sheet(samples: &[Sample]) -> SheetTable {
    let mut sheet = SheetTable::new(
        PROCESS_SHEET,
        &[
            "Timestamp",
            "Time",
            "PID",
            "Command",
            "RSS(KB)",
            "RSS(MB)",
            "VSZ(KB)",
            "VSZ(MB)",
            "Memory%",
            "MinorFaults/sec",
            "MajorFaults/sec",
        ],
    );
    sheet.rows = samples
        .iter()
        .map(|s| -> Vec<Cell> {
            vec![
                s.timestamp.format(TIMESTAMP_FORMAT).to_string().into(),
                s.time_str.as_str().into(),
                s.pid.into(),
                s.command.as_str().into(),
                s.rss_kb.into(),
                s.rss_mb().into(),
                s.vsz_kb.into(),
                s.vsz_mb().into(),
                s.mem_percent.into(),
                s.minflt_per_sec.into(),
                s.majflt_per_sec.into(),
            ]
        })
        .collect();
    sheet
}

pub fn system_sheet(system: &[SystemMemorySample]) -> SheetTable {
    let mut sheet = SheetTable::new(
        SYSTEM_SHEET,
        &[
            "Timestamp",
            "Total Memory(GB)",
            "Available Memory(GB)",
            "Used Memory(GB)",
            "System Memory Usage(%)",
        ],
    );
    sheet.rows = system
        .iter()
        .map(|s| -> Vec<Cell> {
            vec![
                s.timestamp.format(TIMESTAMP_FORMAT).to_string().into(),
                s.total_memory_gb.into(),
                s.available_memory_gb.into(),
                s.used_memory_gb.into(),
                s.memory_usage_percent.into(),
            ]
        })
        .collect();
    sheet
}

pub fn statistics_sheet(stats: &SummaryStatistics, system: Option<&SystemSummary>) -> SheetTable {
    let mut rows: Vec<(&str, f64)> = vec![
        ("RSS Average(MB)", round(stats.rss_mb.mean, 2)),
        ("RSS Minimum(MB)", round(stats.rss_mb.min, 2)),
        ("RSS Maximum(MB)", round(stats.rss_mb.max, 2)),
        ("RSS StdDev(MB)", round(stats.rss_mb.std_dev, 2)),
        ("Memory% Average", round(stats.mem_percent.mean, 3)),
        ("Memory% Minimum", round(stats.mem_percent.min, 3)),
        ("Memory% Maximum", round(stats.mem_percent.max, 3)),
        ("Total Data Points", stats.sample_count as f64),
        ("Monitoring Duration(min)", round(stats.duration_minutes(), 1)),
    ];
    if let Some(sys) = system {
        rows.push(("System Total Memory(GB)", round(sys.total_gb, 1)));
        rows.push(("System Average Usage(%)", round(sys.usage_percent.mean, 1)));
        rows.push(("System Maximum Usage(%)", round(sys.usage_percent.max, 1)));
    }

    let mut sheet = SheetTable::new(STATISTICS_SHEET, &["Metric", "Value"]);
    sheet.rows = rows
        .into_iter()
        .map(|(metric, value)| vec![Cell::from(metric), Cell::from(value)])
        .collect();
    sheet
}

/// All sheets in workbook order. The system sheet and system rows are
/// left out when there are no system samples.
pub fn workbook_tables(samples: &[Sample], system: &[SystemMemorySample]) -> Vec<SheetTable> {
    let mut tables = vec![process_sheet(samples)];
    if !system.is_empty() {
        tables.push(system_sheet(system));
    }
    if let Some(stats) = SummaryStatistics::compute(samples) {
        let sys = SystemSummary::compute(system);
        tables.push(statistics_sheet(&stats, sys.as_ref()));
    }
    tables
}

/// Write tables to an `.xlsx` file, replacing any existing file.
pub fn write_workbook(tables: &[SheetTable], path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for table in tables {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(table.name.as_str())?;
        for (col, header) in table.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header.as_str(), &bold)?;
        }
        for (r, row) in table.rows.iter().enumerate() {
            let r = r as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(s) => worksheet.write_string(r, col, s.as_str())?,
                    Cell::Number(v) if v.is_finite() => worksheet.write_number(r, col, *v)?,
                    // Excel has no NaN/inf
                    Cell::Number(v) => worksheet.write_string(r, col, v.to_string())?,
                };
            }
        }
        worksheet.autofit();
    }

    workbook.save(path)
}

/// Build and write the analysis workbook.
pub fn export_workbook(
    samples: &[Sample],
    system: &[SystemMemorySample],
    path: &Path,
) -> anyhow::Result<()> {
    let tables = workbook_tables(samples, system);
    write_workbook(&tables, path).with_context(|| format!("writing workbook {}", path.display()))?;
    println!("Excel file saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use chrono::NaiveDate;

    fn sample(sec: u32, rss_kb: u64) -> Sample {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, sec)
            .unwrap();
        Sample {
            timestamp: ts,
            time_str: ts.format("%H:%M:%S").to_string(),
            pid: 42,
            minflt_per_sec: 1.5,
            majflt_per_sec: 0.0,
            vsz_kb: 2048,
            rss_kb,
            mem_percent: 0.5,
            command: "worker".to_string(),
        }
    }

    #[test]
    fn process_sheet_has_derived_columns() {
        let sheet = process_sheet(&[sample(0, 1024), sample(2, 2048)]);
        assert_eq!(sheet.headers.len(), 11);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][0], Cell::Text("2025-01-01 12:00:00".into()));
        assert_eq!(sheet.rows[1][5], Cell::Number(2.0));
        assert_eq!(sheet.rows[1][7], Cell::Number(2.0));
    }

    #[test]
    fn single_sample_statistics_do_not_fail() {
        let samples = [sample(0, 1024)];
        let tables = workbook_tables(&samples, &[]);
        assert_eq!(tables.len(), 2);
        let stats = &tables[1];
        assert_eq!(stats.name, STATISTICS_SHEET);
        assert_eq!(stats.rows.len(), 9);
        match &stats.rows[3][1] {
            Cell::Number(v) => assert!(v.is_nan()),
            other => panic!("unexpected cell {:?}", other),
        }
    }

    #[test]
    fn nan_cells_are_written_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.xlsx");
        write_workbook(&workbook_tables(&[sample(0, 1024)], &[]), &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![PROCESS_SHEET, STATISTICS_SHEET]);
        let stats = workbook.worksheet_range(STATISTICS_SHEET).unwrap();
        assert_eq!(stats.get_value((4, 0)), Some(&Data::String("RSS StdDev(MB)".to_string())));
        assert_eq!(stats.get_value((4, 1)), Some(&Data::String("NaN".to_string())));
        assert_eq!(stats.get_value((1, 1)), Some(&Data::Float(1.0)));
    }
}
