//! Delta packaging: copy the changed sources under the base directory into
//! a separate tree that can be deployed on its own.
//!
//! A source file and its `-meta.xml` descriptor travel together: changing
//! either one brings the other along when it exists on disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexSet;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{AppContext, DeltaArgs};
use crate::core::class_index::META_SUFFIX;
use crate::core::resolve::DiffSelection;
use crate::core::vcs::GitDiffProvider;
use crate::infra::config::load_config_from;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeltaPlan
{
    /// Repo-relative files to copy, changed files first, then companions
    pub files: Vec<String>,
    /// Changed paths no longer present in the working tree
    pub deleted: Vec<String>,
}

/// Companion of a path: the descriptor for a source, or the source for a
/// descriptor.
pub fn companion_of(path: &str) -> String
{
    match path.strip_suffix(META_SUFFIX)
    {
        Some(source) => source.to_string(),
        None => format!("{path}{META_SUFFIX}"),
    }
}

/// Split changed files into present and deleted, adding companions that
/// exist on disk.
pub fn plan_delta<S: AsRef<str>>(
    repo_root: &Path,
    changed_files: &[S],
) -> DeltaPlan
{
    let mut present: IndexSet<String> = IndexSet::new();
    let mut deleted = Vec::new();

    for file in changed_files
        .iter()
        .map(AsRef::as_ref)
    {
        if repo_root
            .join(file)
            .is_file()
        {
            present.insert(file.to_string());
        }
        else
        {
            deleted.push(file.to_string());
        }
    }

    let companions: Vec<String> = present
        .iter()
        .map(|f| companion_of(f))
        .filter(|c| {
            repo_root
                .join(c)
                .is_file()
        })
        .collect();
    present.extend(companions);

    DeltaPlan {
        files: present
            .into_iter()
            .collect(),
        deleted,
    }
}

/// Copy every planned file from `repo_root` into `out`, keeping relative
/// paths. Returns the number of files written.
pub fn write_delta(
    repo_root: &Path,
    plan: &DeltaPlan,
    out: &Path,
) -> Result<usize>
{
    for rel in &plan.files
    {
        let src = repo_root.join(rel);
        let dst = out.join(rel);
        if let Some(parent) = dst.parent()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(&src, &dst)
            .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
        debug!(file = %rel, "copied");
    }

    Ok(plan
        .files
        .len())
}

/// `adx delta`
pub fn run(
    args: DeltaArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let repo = args
        .diff
        .repo
        .clone();
    let config = load_config_from(&repo)?;
    let selection = DiffSelection::from_args(&args.diff, &config);

    let provider = GitDiffProvider::new(&repo);
    let changed = selection.changed_files(&provider)?;
    let plan = plan_delta(&repo, &changed);
    info!(files = plan.files.len(), deleted = plan.deleted.len(), "delta planned");

    let Some(out) = args.out
    else
    {
        if args.json
        {
            println!("{}", serde_json::to_string(&plan).context("Failed to serialize delta")?);
        }
        else
        {
            for f in &changed
            {
                println!("{f}");
            }
        }
        return Ok(());
    };

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would copy:".yellow());
            for f in &plan.files
            {
                println!("  {f}");
            }
            for f in &plan.deleted
            {
                println!("  (deleted) {f}");
            }
            println!("  into {}", out.display());
        }
        return Ok(());
    }

    let written = write_delta(&repo, &plan, &out)?;

    if args.json
    {
        println!("{}", serde_json::to_string(&plan).context("Failed to serialize delta")?);
    }

    if !ctx.quiet
    {
        eprintln!(
            "{} Copied {} files to {}",
            "✓".if_supports_color(Stream::Stderr, |t| t.green()),
            written,
            out.display()
        );
        for f in &plan.deleted
        {
            eprintln!(
                "  {} {f} (deleted, not copied)",
                "!".if_supports_color(Stream::Stderr, |t| t.yellow())
            );
        }
    }

    Ok(())
}
