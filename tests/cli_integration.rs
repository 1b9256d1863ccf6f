//! Integration tests for the SecureLookup CLI.
//!
//! The binary is driven end-to-end with `assert_cmd`.  Passwords come from
//! `SECURELOOKUP_PASSWORD` so no prompt is ever shown, and every test runs
//! inside its own temp dir so no `.securelookup.toml` leaks in.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const PASSWORD: &str = "correct horse";

/// Helper: get a Command pointing at the securelookup binary.
fn securelookup() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("securelookup").expect("binary should exist")
}

/// Helper: a command running in `tmp` against `tmp/lookup.db`.
fn in_dir(tmp: &TempDir) -> Command {
    let mut cmd = securelookup();
    cmd.current_dir(tmp.path())
        .env("SECURELOOKUP_PASSWORD", PASSWORD)
        .env_remove("SECURELOOKUP_DB")
        .env_remove("SECURELOOKUP_CIPHER")
        .arg("--db")
        .arg(tmp.path().join("lookup.db"));
    cmd
}

/// Helper: initialize a database with cheap key derivation.
fn init(tmp: &TempDir) {
    in_dir(tmp)
        .args([
            "init",
            "--primary-hashing",
            "PBKDF2-HMAC-SHA256",
            "--primary-properties",
            "iterations=10",
            "--secondary-hashing",
            "PBKDF2-HMAC-SHA256",
            "--secondary-properties",
            "iterations=10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Database created"));
}

#[test]
fn help_flag_shows_usage() {
    securelookup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lookup table"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("find"))
        .stdout(predicate::str::contains("drop"))
        .stdout(predicate::str::contains("clean"))
        .stdout(predicate::str::contains("passwd"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn version_flag_shows_version() {
    securelookup()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("securelookup"));
}

#[test]
fn no_args_shows_help() {
    securelookup()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn algorithms_lists_every_family() {
    securelookup()
        .arg("algorithms")
        .assert()
        .success()
        .stdout(predicate::str::contains("Argon2id"))
        .stdout(predicate::str::contains("XChaCha20-Poly1305"))
        .stdout(predicate::str::contains("Zstd"))
        .stdout(predicate::str::contains("BLAKE3"));
}

#[test]
fn find_on_missing_database_fails() {
    let tmp = TempDir::new().unwrap();
    in_dir(&tmp)
        .args(["find"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Database not found"));
}

#[test]
fn init_creates_the_file_and_refuses_twice() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    tmp.child("lookup.db").assert(predicate::path::exists());

    in_dir(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn add_then_find() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);

    in_dir(&tmp)
        .args(["add", "tax-2023", "--archive", "Qm3xv81L", "--password", "s3cret"])
        .assert()
        .success();

    in_dir(&tmp)
        .args(["find", "tax", "--show-passwords"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Qm3xv81L"))
        .stdout(predicate::str::contains("s3cret"));

    in_dir(&tmp)
        .args(["find", "tax"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s3cret").not());
}

#[test]
fn add_generates_an_archive_name() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);

    in_dir(&tmp)
        .args(["add", "photos"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated archive name"));
}

#[test]
fn wrong_password_is_reported_generically() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);

    in_dir(&tmp)
        .env("SECURELOOKUP_PASSWORD", "battery staple")
        .arg("find")
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong password or corrupted database"));
}

#[test]
fn drop_removes_an_entry() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    in_dir(&tmp)
        .args(["add", "bank", "--archive", "b1", "--password", "x"])
        .assert()
        .success();

    in_dir(&tmp)
        .args(["drop", "bank", "--force"])
        .assert()
        .success();

    in_dir(&tmp)
        .args(["drop", "bank", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn clean_removes_dangling_entries() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.child("archives");
    repo.create_dir_all().unwrap();
    repo.child("kept.7z").touch().unwrap();
    init(&tmp);

    for (name, archive) in [("kept", "kept.7z"), ("gone", "gone.7z")] {
        in_dir(&tmp)
            .args(["add", name, "--archive", archive, "--password", "x"])
            .assert()
            .success();
    }

    in_dir(&tmp)
        .arg("clean")
        .arg(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 dangling entries"));

    in_dir(&tmp)
        .args(["find", "--show-passwords"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kept.7z"))
        .stdout(predicate::str::contains("gone.7z").not());
}

#[test]
fn passwd_switches_password_and_cipher() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);

    in_dir(&tmp)
        .env("SECURELOOKUP_NEW_PASSWORD", "battery staple")
        .args(["passwd", "--cipher", "XChaCha20-Poly1305"])
        .assert()
        .success()
        .stdout(predicate::str::contains("XChaCha20-Poly1305"));

    in_dir(&tmp).arg("find").assert().failure();
    in_dir(&tmp)
        .env("SECURELOOKUP_PASSWORD", "battery staple")
        .arg("find")
        .assert()
        .success();
}

#[test]
fn export_refuses_to_overwrite_without_force() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    let out = tmp.child("export.json");
    out.write_str("keep me").unwrap();

    in_dir(&tmp)
        .arg("export")
        .arg(out.path())
        .assert()
        .failure();
    out.assert("keep me");

    in_dir(&tmp)
        .arg("export")
        .arg(out.path())
        .arg("--force")
        .assert()
        .success();
    out.assert(predicate::str::contains("\"entries\""));
}

#[test]
fn completions_generates_script() {
    securelookup()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("securelookup"));
}
