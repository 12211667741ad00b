//! End-to-end CLI scenarios: build a tiny corpus on disk, point the binary
//! at it via `QFIND_DIR`, and check stdout/exit code (spec §6).

use std::path::PathBuf;
use std::process::Command;

fn qfind_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_qfind"))
}

fn write_file(path: &std::path::Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, "").unwrap();
}

#[test]
fn cli_search_finds_matching_files() {
    let qfind_dir = tempfile::tempdir().unwrap();
    let corpus = tempfile::tempdir().unwrap();

    write_file(&corpus.path().join("notes.txt"));
    write_file(&corpus.path().join("other.log"));

    let config = qfind_core::Config {
        index_roots: vec![corpus.path().to_path_buf()],
        exclusions: Vec::new(),
        ..Default::default()
    };
    std::fs::create_dir_all(qfind_dir.path()).unwrap();
    config
        .save(&qfind_dir.path().join("config.toml"))
        .unwrap();

    let output = Command::new(qfind_bin())
        .env("QFIND_DIR", qfind_dir.path())
        .args(["notes"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("notes.txt"), "stdout was: {stdout}");
}

#[test]
fn cli_search_reports_no_matches() {
    let qfind_dir = tempfile::tempdir().unwrap();
    let corpus = tempfile::tempdir().unwrap();

    write_file(&corpus.path().join("alpha.txt"));

    let config = qfind_core::Config {
        index_roots: vec![corpus.path().to_path_buf()],
        exclusions: Vec::new(),
        ..Default::default()
    };
    std::fs::create_dir_all(qfind_dir.path()).unwrap();
    config
        .save(&qfind_dir.path().join("config.toml"))
        .unwrap();

    let output = Command::new(qfind_bin())
        .env("QFIND_DIR", qfind_dir.path())
        .args(["zzz_nonexistent_pattern"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No matching files found."));
}

#[test]
fn cli_rejects_empty_pattern() {
    let qfind_dir = tempfile::tempdir().unwrap();

    let output = Command::new(qfind_bin())
        .env("QFIND_DIR", qfind_dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn cli_version_flag_exits_zero() {
    let output = Command::new(qfind_bin()).args(["-v"]).output().unwrap();
    assert!(output.status.success());
    assert!(!output.stdout.is_empty());
}
