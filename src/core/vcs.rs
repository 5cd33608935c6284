//! Changed-file queries against git history.
//!
//! Three comparison strategies are supported: a single commit, the working
//! tree against a ref, and the most recent (optionally prefix-matched) tag
//! against HEAD. Queries are read-only; a spawn failure is retried once, a
//! git error never is.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Output};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Git comparison strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode
{
    /// Files touched by one commit (no ancestor range)
    #[default]
    Commit,
    /// Working tree compared against a branch or ref
    Branch,
    /// Most recent (matching) tag compared against HEAD
    Tags,
}

impl fmt::Display for DiffMode
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        match self
        {
            DiffMode::Commit => write!(f, "commit"),
            DiffMode::Branch => write!(f, "branch"),
            DiffMode::Tags => write!(f, "tags"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VcsError
{
    #[error("failed to run `git {args}`: {source}")]
    Spawn
    {
        args: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`git {args}` failed: {stderr}")]
    Query
    {
        args: String,
        stderr: String,
    },

    #[error("--key is required in {0} mode")]
    MissingKey(DiffMode),
}

/// Source of changed file paths, in the order the backend reports them.
pub trait DiffProvider
{
    fn changed_files(
        &self,
        mode: DiffMode,
        key: Option<&str>,
    ) -> Result<Vec<String>, VcsError>;
}

/// `DiffProvider` backed by the `git` executable.
///
/// Paths are reported relative to `repo_root` (`--relative`), so a project
/// living in a subdirectory of a larger repository sees the same paths as
/// one at the top level. Changes outside `repo_root` are not reported.
#[derive(Debug, Clone)]
pub struct GitDiffProvider
{
    repo_root: PathBuf,
    git: PathBuf,
}

impl GitDiffProvider
{
    pub fn new(repo_root: impl Into<PathBuf>) -> Self
    {
        Self { repo_root: repo_root.into(), git: PathBuf::from("git") }
    }

    /// Use a specific git binary instead of the one on PATH.
    pub fn with_git_executable(
        mut self,
        git: impl Into<PathBuf>,
    ) -> Self
    {
        self.git = git.into();
        self
    }

    fn spawn(
        &self,
        args: &[&str],
    ) -> std::io::Result<Output>
    {
        Command::new(&self.git)
            .arg("-c")
            .arg("core.quotePath=false")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
    }

    /// Run git and return stdout. Only a failure to start the process is
    /// retried, and only once.
    fn run(
        &self,
        args: &[&str],
    ) -> Result<String, VcsError>
    {
        let joined = args.join(" ");
        debug!(args = %joined, "running git");

        let output = retry_spawn_once(|| self.spawn(args))
            .map_err(|source| VcsError::Spawn { args: joined.clone(), source })?;

        if !output
            .status
            .success()
        {
            let stderr = String::from_utf8_lossy(&output.stderr)
                .trim()
                .to_string();
            return Err(VcsError::Query { args: joined, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Most recent tag reachable from HEAD, optionally restricted to names
    /// starting with `prefix`.
    pub fn latest_tag(
        &self,
        prefix: Option<&str>,
    ) -> Result<String, VcsError>
    {
        let pattern = prefix.map(|p| format!("{p}*"));
        let mut args = vec!["describe", "--tags", "--abbrev=0"];
        if let Some(pattern) = pattern.as_deref()
        {
            args.push("--match");
            args.push(pattern);
        }

        let out = self.run(&args)?;
        let tag = out
            .trim()
            .to_string();
        if tag.is_empty()
        {
            return Err(VcsError::Query {
                args: args.join(" "),
                stderr: "no tag found".to_string(),
            });
        }
        Ok(tag)
    }
}

impl DiffProvider for GitDiffProvider
{
    #[instrument(skip(self), fields(repo = %self.repo_root.display()))]
    fn changed_files(
        &self,
        mode: DiffMode,
        key: Option<&str>,
    ) -> Result<Vec<String>, VcsError>
    {
        let key = key.filter(|k| !k.trim().is_empty());

        let stdout = match mode
        {
            DiffMode::Commit =>
            {
                let commit = key.ok_or(VcsError::MissingKey(mode))?;
                self.run(&[
                    "diff-tree",
                    "--no-commit-id",
                    "--name-only",
                    "--relative",
                    "-r",
                    "--root",
                    commit,
                ])?
            }
            DiffMode::Branch =>
            {
                let reference = key.ok_or(VcsError::MissingKey(mode))?;
                self.run(&["diff", "--name-only", "--relative", reference])?
            }
            DiffMode::Tags =>
            {
                let tag = self.latest_tag(key)?;
                debug!(%tag, "diffing from tag");
                self.run(&["diff", "--name-only", "--relative", &tag, "HEAD"])?
            }
        };

        Ok(split_paths(&stdout))
    }
}

/// Call `spawn`, and call it once more if the process could not be started.
fn retry_spawn_once<T>(mut spawn: impl FnMut() -> std::io::Result<T>) -> std::io::Result<T>
{
    spawn().or_else(|first| {
        warn!(error = %first, "git spawn failed, retrying once");
        spawn()
    })
}

/// Split newline-separated git output into paths, dropping blank entries.
pub fn split_paths(stdout: &str) -> Vec<String>
{
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
