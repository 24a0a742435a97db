use std::fs;

use assert_cmd::Command;

mod common;
use common::{rectangle_annotation, write_annotation};

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("sly2yolo").unwrap();
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("sly2yolo"));
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("sly2yolo").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("sly2yolo 0.1.0\n");
}

// Convert subcommand tests

#[test]
fn convert_writes_dataset_and_summary() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let ann_dir = temp.path().join("ann");
    let img_dir = temp.path().join("img");
    let output = temp.path().join("yolo_dataset");
    fs::create_dir_all(&ann_dir).expect("create ann dir");
    fs::create_dir_all(&img_dir).expect("create img dir");

    fs::write(img_dir.join("a.jpg"), b"img").expect("write image");
    write_annotation(
        &ann_dir.join("a.json"),
        &rectangle_annotation(100, 50, "stain", [[10, 10], [30, 20]]),
    );

    let mut cmd = Command::cargo_bin("sly2yolo").unwrap();
    cmd.args([
        "convert",
        "--ann-dir",
        ann_dir.to_str().unwrap(),
        "--img-dir",
        img_dir.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("1 converted, 0 skipped"))
        .stdout(predicates::str::contains("stain"));

    assert!(output.join("labels/a.txt").is_file());
    assert!(output.join("images/a.jpg").is_file());
    assert!(output.join("classes.txt").is_file());
    assert!(output.join("data.yaml").is_file());
}

#[test]
fn convert_report_json_emits_structured_output() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let ann_dir = temp.path().join("ann");
    let img_dir = temp.path().join("img");
    fs::create_dir_all(&ann_dir).expect("create ann dir");
    fs::create_dir_all(&img_dir).expect("create img dir");

    let mut cmd = Command::cargo_bin("sly2yolo").unwrap();
    cmd.args([
        "convert",
        "--ann-dir",
        ann_dir.to_str().unwrap(),
        "--img-dir",
        img_dir.to_str().unwrap(),
        "--output",
        temp.path().join("out").to_str().unwrap(),
        "--report",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"counts\""))
        .stdout(predicates::str::contains("\"issues\""));
}

#[test]
fn convert_missing_ann_dir_fails_before_producing_output() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let img_dir = temp.path().join("img");
    let output = temp.path().join("out");
    fs::create_dir_all(&img_dir).expect("create img dir");

    let mut cmd = Command::cargo_bin("sly2yolo").unwrap();
    cmd.args([
        "convert",
        "--ann-dir",
        temp.path().join("nonexistent").to_str().unwrap(),
        "--img-dir",
        img_dir.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("does not exist"));

    assert!(!output.exists());
}

// Split subcommand tests

#[test]
fn split_copies_into_train_and_val() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("dataset");
    let output = temp.path().join("split");
    fs::create_dir_all(input.join("images")).expect("create images dir");
    fs::create_dir_all(input.join("labels")).expect("create labels dir");
    for stem in ["a", "b", "c"] {
        fs::write(input.join(format!("images/{stem}.jpg")), b"img").expect("write image");
        fs::write(input.join(format!("labels/{stem}.txt")), "").expect("write label");
    }

    let mut cmd = Command::cargo_bin("sly2yolo").unwrap();
    cmd.args([
        "split",
        "--input",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--seed",
        "42",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("3 image(s): 2 train, 1 val"));

    assert!(output.join("train/images").is_dir());
    assert!(output.join("val/images").is_dir());
}

#[test]
fn split_rejects_invalid_fraction() {
    let temp = tempfile::tempdir().expect("create temp dir");

    let mut cmd = Command::cargo_bin("sly2yolo").unwrap();
    cmd.args([
        "split",
        "--input",
        temp.path().to_str().unwrap(),
        "--output",
        temp.path().join("out").to_str().unwrap(),
        "--val-fraction",
        "1.5",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("val-fraction"));
}

// Train subcommand tests

#[test]
fn train_dry_run_prints_the_full_recipe() {
    let mut cmd = Command::cargo_bin("sly2yolo").unwrap();
    cmd.args(["train", "--data", "yolo_dataset/data.yaml", "--dry-run"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("yolo detect train"))
        .stdout(predicates::str::contains("data=yolo_dataset/data.yaml"))
        .stdout(predicates::str::contains("model=yolov8n.pt"))
        .stdout(predicates::str::contains("epochs=100"))
        .stdout(predicates::str::contains("imgsz=640"))
        .stdout(predicates::str::contains("batch=8"))
        .stdout(predicates::str::contains("name=stain_detection"))
        .stdout(predicates::str::contains("patience=15"));
}

#[test]
fn train_with_missing_program_fails() {
    let mut cmd = Command::cargo_bin("sly2yolo").unwrap();
    cmd.args([
        "train",
        "--data",
        "data.yaml",
        "--program",
        "definitely-not-a-real-trainer-binary",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Failed to launch trainer"));
}
