//! `adx delta` and `adx scan` against fixture projects.

mod util;

use std::process::Command;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;

use util::{CLASSES, commit_all, git, make_project, write_class};

fn adx(tmp: &assert_fs::TempDir) -> Command
{
    let mut cmd = Command::cargo_bin("adx").expect("bin");
    cmd.current_dir(tmp.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn delta_lists_filtered_changes()
{
    let tmp = make_project();
    write_class(&tmp, "Foo", "public class Foo { /* v2 */ }\n");
    tmp.child("README.md")
        .write_str("changed\n")
        .unwrap();
    commit_all(&tmp, "change Foo and docs");

    adx(&tmp)
        .args(["delta", "--key", "HEAD"])
        .assert()
        .success()
        .stdout(format!("{CLASSES}/Foo.cls\n"));
}

#[test]
fn delta_copies_sources_with_descriptors()
{
    let tmp = make_project();
    write_class(&tmp, "Foo", "public class Foo { /* v2 */ }\n");
    git(tmp.path(), &["rm", "-q", &format!("{CLASSES}/Baz.cls")]);
    commit_all(&tmp, "change Foo, drop Baz");

    let out = assert_fs::TempDir::new().unwrap();
    adx(&tmp)
        .args(["delta", "--key", "HEAD", "--out"])
        .arg(out.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Copied 2 files"))
        .stderr(predicate::str::contains("Baz.cls (deleted, not copied)"));

    out.child(format!("{CLASSES}/Foo.cls"))
        .assert(predicate::str::contains("v2"));
    out.child(format!("{CLASSES}/Foo.cls-meta.xml"))
        .assert(predicate::path::exists());
    out.child(format!("{CLASSES}/Bar.cls"))
        .assert(predicate::path::missing());
}

#[test]
fn delta_dry_run_writes_nothing()
{
    let tmp = make_project();
    write_class(&tmp, "Foo", "public class Foo { /* v2 */ }\n");
    commit_all(&tmp, "change Foo");

    let out = assert_fs::TempDir::new().unwrap();
    adx(&tmp)
        .args(["--dry-run", "delta", "--key", "HEAD", "--out"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Would copy"));

    out.child(CLASSES)
        .assert(predicate::path::missing());
}

#[test]
fn scan_lists_referrers_and_their_tests()
{
    let tmp = make_project();

    adx(&tmp)
        .args(["--quiet", "scan", "Foo"])
        .assert()
        .success()
        .stdout("Bar -> BarTest\nQux\n");
}

#[test]
fn scan_json_includes_substring_matches()
{
    let tmp = make_project();
    write_class(&tmp, "FooBar", "public class FooBar {}\n");
    write_class(&tmp, "FooBarTest", "@isTest class FooBarTest {}\n");

    let assert = adx(&tmp)
        .args(["scan", "Foo", "--json"])
        .assert()
        .success();
    let v: Value = serde_json::from_slice(&assert.get_output().stdout).expect("json");

    let refs = v["references"]
        .as_array()
        .expect("references");
    let names: Vec<&str> = refs
        .iter()
        .map(|r| r["class_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Bar", "FooBar", "Qux"]);
    assert_eq!(refs[1]["test_class"], "FooBarTest");
    assert!(refs[2]["test_class"].is_null());
}

#[test]
fn scan_missing_directory_fails()
{
    let tmp = assert_fs::TempDir::new().unwrap();

    adx(&tmp)
        .args(["scan", "Foo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("directory not found"));
}

#[test]
fn init_writes_config_once()
{
    let tmp = assert_fs::TempDir::new().unwrap();

    adx(&tmp)
        .arg("init")
        .assert()
        .success();
    tmp.child("apexdelta.toml")
        .assert(predicate::str::contains("force-app/main/default"));

    adx(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
