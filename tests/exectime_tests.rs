use pidstat_report::exectime::{
    ExecTimeSource, default_sources, read_execution_time, resolve_execution_time,
};
use std::fs;
use std::path::Path;

#[test]
fn test_explicit_file_wins() {
    let dir = tempfile::tempdir().unwrap();
    let explicit = dir.path().join("custom.txt");
    fs::write(&explicit, "12.5\n").unwrap();
    fs::write(dir.path().join("execution_time_vm.txt"), "99.0").unwrap();

    let sources = default_sources(Some(&explicit), Path::new("pidstat_vm.txt"), dir.path());
    assert_eq!(resolve_execution_time(&sources), Some(12.5));
}

#[test]
fn test_derived_name_from_log() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("execution_time_vm_create.txt"), " 33.25 ").unwrap();
    fs::write(dir.path().join("execution_time_aaa.txt"), "1.0").unwrap();

    let sources = default_sources(
        Some(&dir.path().join("missing.txt")),
        Path::new("logs/pidstat_vm_create.txt"),
        dir.path(),
    );
    assert_eq!(resolve_execution_time(&sources), Some(33.25));
}

#[test]
fn test_scan_picks_first_match_by_name() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("execution_time_b.txt"), "2.0").unwrap();
    fs::write(dir.path().join("execution_time_a.txt"), "1.0").unwrap();
    fs::write(dir.path().join("execution_time_c.log"), "3.0").unwrap();

    let source = ExecTimeSource::ScanDirectory(dir.path().to_path_buf());
    assert_eq!(source.locate(), Some(dir.path().join("execution_time_a.txt")));
    let sources = default_sources(None, Path::new("pidstat.2sec.log"), dir.path());
    assert_eq!(resolve_execution_time(&sources), Some(1.0));
}

#[test]
fn test_unreadable_candidate_falls_through() {
    let dir = tempfile::tempdir().unwrap();
    let explicit = dir.path().join("broken.txt");
    fs::write(&explicit, "n/a").unwrap();
    fs::write(dir.path().join("execution_time_x.txt"), "7").unwrap();

    assert!(read_execution_time(&explicit).is_err());
    let sources = default_sources(Some(&explicit), Path::new("pidstat.log"), dir.path());
    assert_eq!(resolve_execution_time(&sources), Some(7.0));
}

#[test]
fn test_nothing_found() {
    let dir = tempfile::tempdir().unwrap();
    let sources = default_sources(None, Path::new("pidstat.log"), dir.path());
    assert_eq!(resolve_execution_time(&sources), None);
}
