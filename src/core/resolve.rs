//! Impacted-test resolution.
//!
//! Changed classes are looked up one hop deep: a test is impacted when its
//! conventional subject (`FooTest` -> `Foo`) mentions a changed class. A
//! class that mentions a class that mentions the changed one is not
//! followed.

use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexSet;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::cli::{AppContext, DiffArgs, TestsArgs};
use crate::core::class_index::{
    ClassIndex, DuplicateClassName, IndexError, IndexOptions, META_SUFFIX, class_name_for,
};
use crate::core::filter::filter_paths;
use crate::core::scanner::find_referencing_tests;
use crate::core::vcs::{DiffMode, DiffProvider, GitDiffProvider};
use crate::infra::config::{Config, WalkConfig, load_config_from};
use crate::infra::walk::FileWalker;

/// Ordered, deduplicated set of impacted test class names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImpactSet(IndexSet<String>);

impl ImpactSet
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Returns false when the name was already present.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
    ) -> bool
    {
        self.0
            .insert(name.into())
    }

    pub fn len(&self) -> usize
    {
        self.0
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.0
            .is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str>
    {
        self.0
            .iter()
            .map(String::as_str)
    }

    /// Comma-joined names, ready for a test-class allow-list argument.
    pub fn to_csv(&self) -> String
    {
        self.iter()
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn into_vec(self) -> Vec<String>
    {
        self.0
            .into_iter()
            .collect()
    }
}

impl Extend<String> for ImpactSet
{
    fn extend<I: IntoIterator<Item = String>>(
        &mut self,
        iter: I,
    )
    {
        self.0
            .extend(iter);
    }
}

/// Knobs for a single resolution.
#[derive(Debug, Clone)]
pub struct ResolveOptions
{
    pub test_suffix: String,
    /// Add `<Changed><suffix>` directly when it exists in the index
    pub include_changed_tests: bool,
}

impl Default for ResolveOptions
{
    fn default() -> Self
    {
        Self { test_suffix: "Test".to_string(), include_changed_tests: false }
    }
}

/// Effective settings after layering CLI flags over config.
#[derive(Debug, Clone)]
pub struct ResolveSettings
{
    pub base_dir: String,
    pub meta_types: Vec<String>,
    pub class_suffixes: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub walk: WalkConfig,
    pub options: ResolveOptions,
}

impl ResolveSettings
{
    pub fn from_config(config: &Config) -> Self
    {
        let r = &config.resolve;
        Self {
            base_dir: r
                .base_dir
                .clone(),
            meta_types: r
                .meta_types
                .clone(),
            class_suffixes: r
                .class_suffixes
                .clone(),
            ignore_patterns: config
                .ignore_patterns
                .clone(),
            walk: config
                .walk
                .clone(),
            options: ResolveOptions {
                test_suffix: r
                    .test_suffix
                    .clone(),
                include_changed_tests: r.include_changed_tests,
            },
        }
    }

    fn index_options(&self) -> IndexOptions
    {
        IndexOptions {
            class_suffixes: self
                .class_suffixes
                .clone(),
            test_suffix: self
                .options
                .test_suffix
                .clone(),
        }
    }

    /// Repo-relative directory prefix for one metadata type.
    pub fn meta_dir(
        &self,
        meta_type: &str,
    ) -> String
    {
        let base = self
            .base_dir
            .trim_end_matches('/');
        if base.is_empty()
        {
            format!("{meta_type}/")
        }
        else
        {
            format!("{base}/{meta_type}/")
        }
    }
}

/// Diff mode, key and base directory for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSelection
{
    pub mode: DiffMode,
    pub key: Option<String>,
    pub base_dir: String,
}

impl DiffSelection
{
    pub fn from_args(
        args: &DiffArgs,
        config: &Config,
    ) -> Self
    {
        Self {
            mode: args
                .mode
                .map(DiffMode::from)
                .unwrap_or(config.diff.mode),
            key: args
                .key
                .clone()
                .or_else(|| {
                    config
                        .diff
                        .key
                        .clone()
                }),
            base_dir: args
                .base_dir
                .clone()
                .unwrap_or_else(|| {
                    config
                        .resolve
                        .base_dir
                        .clone()
                }),
        }
    }

    /// Query the provider and keep the unique paths under the base directory.
    pub fn changed_files(
        &self,
        provider: &dyn DiffProvider,
    ) -> Result<Vec<String>>
    {
        let raw = provider
            .changed_files(self.mode, self.key.as_deref())
            .with_context(|| format!("Failed to list changed files ({} mode)", self.mode))?;
        let kept = filter_paths(&raw, &self.base_dir);
        debug!(reported = raw.len(), kept = kept.len(), base = %self.base_dir, "filtered changes");
        Ok(kept)
    }
}

/// Outcome of a multi-type resolution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImpactReport
{
    pub tests: ImpactSet,
    pub changed_classes: Vec<String>,
    /// Metadata types whose directory does not exist
    pub skipped_meta_types: Vec<String>,
    pub duplicates: Vec<DuplicateClassName>,
}

/// Class names for changed files, in order, without descriptors or repeats.
pub fn changed_class_names<S: AsRef<str>>(
    changed_files: &[S],
    class_suffixes: &[String],
) -> Vec<String>
{
    let names: IndexSet<String> = changed_files
        .iter()
        .map(AsRef::as_ref)
        .filter(|f| !f.ends_with(META_SUFFIX))
        .filter_map(|f| class_name_for(Path::new(f), class_suffixes))
        .collect();
    names
        .into_iter()
        .collect()
}

/// Impacted tests for `changed_classes` against one index.
pub fn resolve_impacted_tests<S: AsRef<str>>(
    changed_classes: &[S],
    index: &ClassIndex,
    opts: &ResolveOptions,
) -> ImpactSet
{
    let mut impacted = ImpactSet::new();

    for changed in changed_classes
    {
        let changed = changed.as_ref();

        if opts.include_changed_tests
        {
            let own = format!("{changed}{}", opts.test_suffix);
            if index.contains(&own)
            {
                impacted.insert(own);
            }
        }

        let found = find_referencing_tests(index, changed, &opts.test_suffix);
        debug!(class = changed, tests = found.len(), "scanned references");
        impacted.extend(found);
    }

    impacted
}

/// Resolve impacted tests for every configured metadata type under
/// `repo_root`. A missing metadata-type directory contributes nothing.
#[instrument(skip_all, fields(repo = %repo_root.display()))]
pub fn resolve_for_meta_types<S: AsRef<str>>(
    repo_root: &Path,
    settings: &ResolveSettings,
    changed_files: &[S],
) -> Result<ImpactReport>
{
    let walker = FileWalker::new(&settings.ignore_patterns)
        .context("Invalid ignore pattern")?
        .with_settings(&settings.walk);
    let index_opts = settings.index_options();
    let mut report = ImpactReport::default();
    let mut all_changed: IndexSet<String> = IndexSet::new();

    for meta_type in &settings.meta_types
    {
        let prefix = settings.meta_dir(meta_type);
        let under_type: Vec<&str> = changed_files
            .iter()
            .map(AsRef::as_ref)
            .filter(|f| f.starts_with(&prefix))
            .collect();
        let changed = changed_class_names(&under_type, &settings.class_suffixes);

        let root = repo_root.join(prefix.trim_end_matches('/'));
        let index = match ClassIndex::build(&root, &index_opts, &walker)
        {
            Ok(index) => index,
            Err(IndexError::DirectoryNotFound(dir)) =>
            {
                info!(meta_type = %meta_type, dir = %dir.display(), "metadata directory missing, skipping");
                report
                    .skipped_meta_types
                    .push(meta_type.clone());
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to index {meta_type}")),
        };

        if changed.is_empty()
        {
            debug!(meta_type = %meta_type, "no changed classes");
        }

        let tests = resolve_impacted_tests(&changed, &index, &settings.options);
        info!(meta_type = %meta_type, changed = changed.len(), impacted = tests.len(), "resolved");

        report
            .tests
            .extend(tests.into_vec());
        report
            .duplicates
            .extend(
                index
                    .duplicates()
                    .iter()
                    .cloned(),
            );
        all_changed.extend(changed);
    }

    report.changed_classes = all_changed
        .into_iter()
        .collect();
    Ok(report)
}

/// `adx tests`
pub fn run(
    args: TestsArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let repo = args
        .diff
        .repo
        .clone();
    let config = load_config_from(&repo)?;
    let selection = DiffSelection::from_args(&args.diff, &config);

    let mut settings = ResolveSettings::from_config(&config);
    settings.base_dir = selection
        .base_dir
        .clone();
    if !args
        .meta_types
        .is_empty()
    {
        settings.meta_types = args
            .meta_types
            .iter()
            .map(|s| {
                s.trim()
                    .to_string()
            })
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(suffix) = args.test_suffix
    {
        settings
            .options
            .test_suffix = suffix;
    }
    if args.include_changed_tests
    {
        settings
            .options
            .include_changed_tests = true;
    }

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("{}", "DRY RUN: Would resolve impacted tests:".yellow());
            println!("  Repo: {}", repo.display());
            println!("  Mode: {} (key: {:?})", selection.mode, selection.key);
            println!("  Base dir: {}", settings.base_dir);
            println!("  Metadata types: {:?}", settings.meta_types);
            println!("  Test suffix: {}", settings.options.test_suffix);
        }
        return Ok(());
    }

    let provider = GitDiffProvider::new(&repo);
    let changed = selection.changed_files(&provider)?;
    let report = resolve_for_meta_types(&repo, &settings, &changed)?;

    if args.json
    {
        println!("{}", serde_json::to_string(&report).context("Failed to serialize report")?);
    }
    else
    {
        println!("{}", report.tests.to_csv());
    }

    if !ctx.quiet
    {
        eprintln!(
            "{} {} impacted test classes from {} changed classes",
            "✓".if_supports_color(Stream::Stderr, |t| t.green()),
            report
                .tests
                .len(),
            report
                .changed_classes
                .len()
        );
    }

    Ok(())
}
