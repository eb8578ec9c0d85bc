use chrono::NaiveDate;
use pidstat_report::sysmem::{parse_system_memory_log, parse_timestamp, read_system_memory};
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "timestamp,total_memory_gb,available_memory_gb,used_memory_gb,memory_usage_percent\n";

#[test]
fn test_read_rows() {
    let csv = format!(
        "{}2025-05-14 12:00:00,15.6,12.1,3.5,22.4\n2025-05-14 12:00:02, 15.6, 12.0, 3.6, 23.1\n",
        HEADER
    );
    let rows = read_system_memory(csv.as_bytes()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].timestamp,
        NaiveDate::from_ymd_opt(2025, 5, 14).unwrap().and_hms_opt(12, 0, 0).unwrap()
    );
    assert_eq!(rows[1].used_memory_gb, 3.6);
    assert_eq!(rows[1].memory_usage_percent, 23.1);
}

#[test]
fn test_timestamp_spellings() {
    let expected = NaiveDate::from_ymd_opt(2025, 5, 14).unwrap().and_hms_opt(8, 30, 15).unwrap();
    assert_eq!(parse_timestamp("2025-05-14 08:30:15"), Some(expected));
    assert_eq!(parse_timestamp("2025-05-14T08:30:15"), Some(expected));
    assert_eq!(parse_timestamp("2025/05/14 08:30:15"), Some(expected));
    assert_eq!(parse_timestamp("2025-05-14T08:30:15+09:00"), Some(expected));
    assert!(parse_timestamp("2025-05-14 08:30:15.250").is_some());
    assert_eq!(parse_timestamp("yesterday"), None);
}

#[test]
fn test_bad_timestamp_yields_empty() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}not-a-time,15.6,12.1,3.5,22.4\n", HEADER).unwrap();
    assert!(parse_system_memory_log(file.path()).is_empty());
}

#[test]
fn test_missing_column_yields_empty() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "timestamp,used_memory_gb\n2025-05-14 12:00:00,3.5\n").unwrap();
    assert!(parse_system_memory_log(file.path()).is_empty());
}

#[test]
fn test_missing_file_yields_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(parse_system_memory_log(&dir.path().join("absent.log")).is_empty());
}
