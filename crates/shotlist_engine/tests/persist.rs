use std::fs;
use std::path::PathBuf;

use shotlist_core::{parse_targets, CaptureOutcome, CaptureStatus, ScanConfig, ScanRun};
use shotlist_engine::{
    ensure_output_dir, list_captures, write_run_manifest, AtomicFileWriter, UrlMapping,
};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("screenshots");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_bytes() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("a.jpg", [1u8, 2, 3]).unwrap();
    assert_eq!(fs::read(&first).unwrap(), vec![1, 2, 3]);

    let second = writer.write("a.jpg", b"xyz").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"xyz");
    // Only the final file remains; no stray temp files.
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("shot.jpg", b"data").is_err());
    assert!(!file_path.with_file_name("shot.jpg").exists());
}

fn run_with_files(dir: &std::path::Path) -> ScanRun {
    let targets = parse_targets("a.example.com\nb.example.com\n").unwrap().targets;
    let mut run = ScanRun::start(&ScanConfig::with_output(dir), targets.len());
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    let path = writer.write("a.example.com_0000.jpg", b"abc").unwrap();
    run.record(CaptureOutcome::unsuccessful(
        targets[1].clone(),
        CaptureStatus::Failed,
        "navigation error: dns",
        4,
    ))
    .unwrap();
    run.record(CaptureOutcome::success(targets[0].clone(), path, 9))
        .unwrap();
    run.finish(false);
    run
}

#[test]
fn manifest_lists_outcomes_in_logical_order_with_digests() {
    let temp = TempDir::new().unwrap();
    let run = run_with_files(temp.path());

    let path = write_run_manifest(&run).unwrap();
    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(manifest["total"], 2);
    assert_eq!(manifest["succeeded"], 1);
    assert_eq!(manifest["failed"], 1);
    let outcomes = manifest["outcomes"].as_array().unwrap();
    assert_eq!(outcomes[0]["sequence_index"], 0);
    assert_eq!(outcomes[0]["filename"], "a.example.com_0000.jpg");
    assert_eq!(outcomes[0]["bytes"], 3);
    assert_eq!(
        outcomes[0]["sha256"],
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(outcomes[1]["status"], "Failed");
    assert_eq!(outcomes[1]["error_detail"], "navigation error: dns");
    assert!(outcomes[1]["filename"].is_null());
}

#[test]
fn url_mapping_merges_across_runs_and_feeds_listing() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("url_mapping.json"),
        r#"{"old.example.com_0000.jpg": "https://old.example.com/"}"#,
    )
    .unwrap();
    fs::write(temp.path().join("old.example.com_0000.jpg"), b"12345").unwrap();
    fs::write(temp.path().join("notes.txt"), b"ignored").unwrap();
    let run = run_with_files(temp.path());

    let mut mapping = UrlMapping::load(temp.path());
    mapping.merge_run(&run);
    mapping.save(temp.path()).unwrap();

    let reloaded = UrlMapping::load(temp.path());
    assert_eq!(reloaded.len(), 2);
    assert_eq!(
        reloaded.get("a.example.com_0000.jpg"),
        Some("https://a.example.com/")
    );

    let files = list_captures(temp.path()).unwrap();
    let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["a.example.com_0000.jpg", "old.example.com_0000.jpg"]);
    assert_eq!(files[1].size, 5);
    assert_eq!(files[1].url.as_deref(), Some("https://old.example.com/"));
    assert_eq!(files[0].path, PathBuf::from(temp.path()).join("a.example.com_0000.jpg"));
}

#[test]
fn listing_a_missing_directory_fails() {
    let temp = TempDir::new().unwrap();
    assert!(list_captures(&temp.path().join("nope")).is_err());
}
