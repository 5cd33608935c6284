//! Filepath: src/infra/walk.rs
//! File walker for metadata source directories.
//! - Extra ignore globs (early prune + late filter)
//! - Optional VCS ignore rules (.gitignore, .git/info/exclude, global)
//! - Optional hidden file policy, following symlinks, and max depth
//! - Deterministic ordering for stable tests/CI
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use tracing::debug;

use crate::infra::config::WalkConfig;

/// Walker with optional extra ignore globs and filters.
/// Extra globs are applied in two places:
///   1) Early: prune directories during traversal (filter_entry).
///   2) Late: filter out files that still slipped through.
pub struct FileWalker
{
    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,

    /// Honor .gitignore and friends; default false so every source file counts
    vcs_ignores: bool,

    /// Include hidden (dot) files; default false
    include_hidden: bool,

    /// Follow symbolic links; default false
    follow_symlinks: bool,

    /// Maximum recursion depth; default None (unbounded)
    max_depth: Option<usize>,
}

impl FileWalker
{
    /// Build a walker with additional ignore patterns (e.g. ".sfdx/**").
    /// Patterns match on paths relative to the walk root.
    pub fn new(additional_ignores: &[String]) -> Result<Self>
    {
        let mut builder = GlobSetBuilder::new();

        for pattern in additional_ignores
        {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            ignore_patterns: builder.build()?,
            vcs_ignores: false,
            include_hidden: false,
            follow_symlinks: false,
            max_depth: None,
        })
    }

    /// (Optional) Respect .gitignore, .git/info/exclude and global gitignore.
    pub fn with_vcs_ignores(
        mut self,
        enabled: bool,
    ) -> Self
    {
        self.vcs_ignores = enabled;
        self
    }

    /// (Optional) Include or exclude hidden files (dotfiles).
    pub fn with_include_hidden(
        mut self,
        include_hidden: bool,
    ) -> Self
    {
        self.include_hidden = include_hidden;
        self
    }

    /// (Optional) Follow or skip symbolic links (default false).
    pub fn with_follow_symlinks(
        mut self,
        follow: bool,
    ) -> Self
    {
        self.follow_symlinks = follow;
        self
    }

    /// (Optional) Limit recursion depth (`None` = unbounded).
    pub fn with_max_depth(
        mut self,
        depth: Option<usize>,
    ) -> Self
    {
        self.max_depth = depth;
        self
    }

    /// Apply a configured traversal policy on top of the ignore globs.
    pub fn with_settings(
        self,
        walk: &WalkConfig,
    ) -> Self
    {
        self.with_vcs_ignores(walk.vcs_ignores)
            .with_include_hidden(walk.include_hidden)
            .with_follow_symlinks(walk.follow_symlinks)
            .with_max_depth(walk.max_depth)
    }

    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        //   WalkBuilder::hidden(true)  => *skip* dotfiles
        b.hidden(!self.include_hidden);

        b.ignore(self.vcs_ignores);
        b.git_ignore(self.vcs_ignores);
        b.git_global(self.vcs_ignores);
        b.git_exclude(self.vcs_ignores);
        b.parents(self.vcs_ignores);

        b.follow_links(self.follow_symlinks);
        b.max_depth(self.max_depth);

        let extra = self
            .ignore_patterns
            .clone();
        let prune_root = root.to_path_buf();
        b.filter_entry(move |ent: &DirEntry| {
            let is_dir = ent
                .file_type()
                .map(|ft| ft.is_dir())
                .unwrap_or(false);

            if !is_dir
            {
                return true;
            }
            let rel = ent
                .path()
                .strip_prefix(&prune_root)
                .unwrap_or(ent.path());
            !extra.is_match(rel)
        });

        b
    }

    /// Append every regular file under `root` to `acc`, sorted within the
    /// appended run. Returns the number of files added.
    pub fn walk_into<P: AsRef<Path>>(
        &self,
        root: P,
        acc: &mut Vec<PathBuf>,
    ) -> usize
    {
        let root_path = root.as_ref();
        let start = acc.len();

        for res in self
            .build_walk(root_path)
            .build()
        {
            let entry = match res
            {
                Ok(entry) => entry,
                Err(err) =>
                {
                    debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry
                .file_type()
                .is_some_and(|ft| ft.is_file())
            {
                continue;
            }

            let abs = entry.into_path();
            let rel = abs
                .strip_prefix(root_path)
                .unwrap_or(&abs);
            if self
                .ignore_patterns
                .is_match(rel)
            {
                continue;
            }
            acc.push(abs);
        }

        // Deterministic order (stable CLI & tests)
        acc[start..].sort();

        acc.len() - start
    }
}
