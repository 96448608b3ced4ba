use assert_cmd::Command;
use predicates::prelude::*;

// Argument-level checks only; anything deeper needs yt-dlp and a network.

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("tubescribe")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("transcribe"))
        .stdout(predicate::str::contains("translate"))
        .stdout(predicate::str::contains("languages"));
}

#[test]
fn version_flag_works() {
    Command::cargo_bin("tubescribe")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tubescribe"));
}

#[test]
fn transcribe_requires_a_url() {
    Command::cargo_bin("tubescribe")
        .unwrap()
        .arg("transcribe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("URL"));
}

#[test]
fn transcribe_rejects_unknown_format() {
    Command::cargo_bin("tubescribe")
        .unwrap()
        .args(["transcribe", "https://youtu.be/dQw4w9WgXcQ", "-f", "docx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
