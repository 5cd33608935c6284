//! Shared test utilities for integration tests
//!
//! Builds throwaway git repositories laid out like an SFDX project.

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use assert_fs::prelude::*;

pub const CLASSES: &str = "force-app/main/default/classes";

/// Run git in `root` with a fixed identity, panicking on failure.
pub fn git(
    root: &Path,
    args: &[&str],
) -> String
{
    let out = Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=t@example.com"])
        .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
        .args(args)
        .current_dir(root)
        .output()
        .expect("spawn git");
    assert!(
        out.status
            .success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout)
        .trim()
        .to_string()
}

/// Write a class and its descriptor under the classes directory.
pub fn write_class(
    tmp: &assert_fs::TempDir,
    name: &str,
    body: &str,
)
{
    tmp.child(format!("{CLASSES}/{name}.cls"))
        .write_str(body)
        .expect("write class");
    tmp.child(format!("{CLASSES}/{name}.cls-meta.xml"))
        .write_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ApexClass/>\n")
        .expect("write descriptor");
}

pub fn commit_all(
    tmp: &assert_fs::TempDir,
    message: &str,
)
{
    git(tmp.path(), &["add", "-A"]);
    git(tmp.path(), &["commit", "-q", "-m", message]);
}

/// Project with Foo/FooTest, Bar (mentions Foo) + BarTest, a Baz that does
/// not mention Foo, and Qux (mentions Foo, no test). One initial commit.
pub fn make_project() -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");
    git(tmp.path(), &["init", "-q"]);

    write_class(&tmp, "Foo", "public class Foo {\n    public Integer n() { return 1; }\n}\n");
    write_class(&tmp, "FooTest", "@isTest\nprivate class FooTest {\n    @isTest static void t() { new Foo().n(); }\n}\n");
    write_class(&tmp, "Bar", "public class Bar {\n    Foo dep = new Foo();\n}\n");
    write_class(&tmp, "BarTest", "@isTest\nprivate class BarTest {\n    @isTest static void t() { new Bar(); }\n}\n");
    write_class(&tmp, "Baz", "public class Baz {}\n");
    write_class(&tmp, "Qux", "public class Qux { Foo f; }\n");
    tmp.child("README.md")
        .write_str("# Project\n")
        .expect("write readme");

    commit_all(&tmp, "initial");
    tmp
}
