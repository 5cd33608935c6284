//! Reverse-reference lookup by textual co-occurrence.
//!
//! A class "references" a target when the target's name appears anywhere in
//! its body as a case-sensitive substring. There is no tokenizing and no
//! word-boundary check: `FooBar` mentions `Foo`, and so does a comment or a
//! string literal containing it. Those false positives widen the test list;
//! they never shrink it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use memchr::memmem;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use serde_json::json;
use tracing::trace;

use crate::cli::{AppContext, ScanArgs};
use crate::core::class_index::{ClassIndex, ClassRecord, IndexOptions};
use crate::infra::config::load_config;
use crate::infra::walk::FileWalker;

/// A class whose body mentions the target, with its conventional test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference
{
    pub class_name: String,
    /// `<class_name><suffix>` when that class exists in the index
    pub test_class: Option<String>,
}

/// Non-test records, other than `target` itself, whose body contains `target`.
pub fn find_referencing_classes<'a>(
    index: &'a ClassIndex,
    target: &str,
) -> Vec<&'a ClassRecord>
{
    if target.is_empty()
    {
        return Vec::new();
    }

    let finder = memmem::Finder::new(target.as_bytes());
    index
        .records()
        .filter(|r| !r.is_test && r.name != target)
        .filter(|r| {
            finder
                .find(r.content.as_bytes())
                .is_some()
        })
        .collect()
}

/// Test classes conventionally paired with the classes that mention `target`.
pub fn find_referencing_tests(
    index: &ClassIndex,
    target: &str,
    test_suffix: &str,
) -> Vec<String>
{
    references(index, target, test_suffix)
        .into_iter()
        .filter_map(|r| r.test_class)
        .collect()
}

/// Full reference report for `target`: every mentioning class, with its test
/// counterpart when one is indexed.
pub fn references(
    index: &ClassIndex,
    target: &str,
    test_suffix: &str,
) -> Vec<Reference>
{
    find_referencing_classes(index, target)
        .into_iter()
        .map(|r| {
            let candidate = format!("{}{}", r.name, test_suffix);
            let test_class = index
                .contains(&candidate)
                .then_some(candidate);
            trace!(target_class = target, referrer = %r.name, test = ?test_class, "reference");
            Reference { class_name: r.name.clone(), test_class }
        })
        .collect()
}

/// `adx scan <ClassName>`
pub fn run(
    args: ScanArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config = load_config()?;
    let root = args
        .path
        .unwrap_or_else(|| {
            PathBuf::from(&config.resolve.base_dir).join("classes")
        });
    let opts = IndexOptions {
        class_suffixes: config
            .resolve
            .class_suffixes
            .clone(),
        test_suffix: args
            .test_suffix
            .unwrap_or_else(|| {
                config
                    .resolve
                    .test_suffix
                    .clone()
            }),
    };

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would scan:".yellow());
            println!("  Root: {}", root.display());
            println!("  Class: {}", args.class_name);
        }
        return Ok(());
    }

    let walker = FileWalker::new(&config.ignore_patterns)
        .context("Invalid ignore pattern")?
        .with_settings(&config.walk);
    let index = ClassIndex::build(&root, &opts, &walker)
        .with_context(|| format!("Failed to index {}", root.display()))?;
    let refs = references(&index, &args.class_name, &opts.test_suffix);

    if args.json
    {
        let out = json!({
            "class": args.class_name,
            "root": root,
            "references": refs,
        });
        println!("{}", serde_json::to_string(&out).context("Failed to serialize references")?);
        return Ok(());
    }

    for r in &refs
    {
        match &r.test_class
        {
            Some(test) => println!("{} -> {}", r.class_name, test),
            None => println!("{}", r.class_name),
        }
    }

    if !ctx.quiet
    {
        let with_tests = refs
            .iter()
            .filter(|r| {
                r.test_class
                    .is_some()
            })
            .count();
        eprintln!(
            "{} {} classes mention {} ({} with tests)",
            "✓".if_supports_color(Stream::Stderr, |t| t.green()),
            refs.len(),
            args.class_name,
            with_tests
        );
    }

    Ok(())
}
