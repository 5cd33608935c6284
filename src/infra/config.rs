use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::vcs::DiffMode;

/// Config file names probed in priority order; the first one found wins
pub const CONFIG_FILES: [&str; 4] =
    ["apexdelta.toml", "apexdelta.yaml", "apexdelta.json", ".apexdelta.toml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Extra ignore globs applied while walking source directories
    pub ignore_patterns: Vec<String>,

    /// Default diff selection
    pub diff: DiffConfig,

    /// Default impact-resolution settings
    pub resolve: ResolveConfig,

    /// Source-directory traversal policy
    pub walk: WalkConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig
{
    pub mode: DiffMode,
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig
{
    /// Changed files outside this prefix are ignored
    pub base_dir: String,

    /// Subdirectories of `base_dir` holding class sources
    pub meta_types: Vec<String>,

    /// Class names ending with this suffix are tests
    pub test_suffix: String,

    /// File suffixes recognized as class sources
    pub class_suffixes: Vec<String>,

    /// Add each changed class's own test when it exists
    pub include_changed_tests: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig
{
    /// Index dotfiles too
    pub include_hidden: bool,

    /// Descend into symlinked directories
    pub follow_symlinks: bool,

    /// Skip files excluded by .gitignore and friends
    pub vcs_ignores: bool,

    /// Maximum depth below a metadata-type directory (unbounded when unset)
    pub max_depth: Option<usize>,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            ignore_patterns: vec![".sfdx/**".to_string(), ".sf/**".to_string()],
            diff: DiffConfig::default(),
            resolve: ResolveConfig::default(),
            walk: WalkConfig::default(),
        }
    }
}

impl Default for DiffConfig
{
    fn default() -> Self
    {
        Self { mode: DiffMode::Commit, key: None }
    }
}

impl Default for ResolveConfig
{
    fn default() -> Self
    {
        Self {
            base_dir: "force-app/main/default".to_string(),
            meta_types: vec!["classes".to_string()],
            test_suffix: "Test".to_string(),
            class_suffixes: vec![".cls".to_string(), ".trigger".to_string()],
            include_changed_tests: false,
        }
    }
}

/// Load configuration from the current directory.
pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

/// Load configuration rooted at `root`: the first config file found, then
/// `APEXDELTA_*` environment variables (nested keys use `__`, e.g.
/// `APEXDELTA_RESOLVE__BASE_DIR`).
pub fn load_config_from(root: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    for name in &CONFIG_FILES
    {
        let path = root.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("APEXDELTA")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("resolve.meta_types")
            .with_list_parse_key("resolve.class_suffixes")
            .with_list_parse_key("ignore_patterns")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("DRY RUN: would write {}:\n{}", config_path.display(), toml_string);
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use tempfile::TempDir;

    use super::*;

    fn ctx() -> AppContext
    {
        AppContext { quiet: true, no_color: true, dry_run: false }
    }

    #[test]
    fn test_missing_file_yields_defaults() -> Result<()>
    {
        let tmp = TempDir::new()?;
        let cfg = load_config_from(tmp.path())?;
        assert_eq!(cfg.resolve.base_dir, "force-app/main/default");
        assert_eq!(cfg.resolve.meta_types, vec!["classes".to_string()]);
        assert_eq!(cfg.resolve.test_suffix, "Test");
        assert_eq!(cfg.diff.mode, DiffMode::Commit);
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_remaining_defaults() -> Result<()>
    {
        let tmp = TempDir::new()?;
        std::fs::write(
            tmp.path().join("apexdelta.toml"),
            "[resolve]\nbase_dir = \"src\"\nmeta_types = [\"classes\", \"triggers\"]\n\n[diff]\nmode = \"tags\"\n",
        )?;

        let cfg = load_config_from(tmp.path())?;
        assert_eq!(cfg.resolve.base_dir, "src");
        assert_eq!(cfg.resolve.meta_types, vec!["classes".to_string(), "triggers".to_string()]);
        assert_eq!(cfg.resolve.test_suffix, "Test");
        assert_eq!(cfg.diff.mode, DiffMode::Tags);
        assert_eq!(cfg.walk, WalkConfig::default());
        Ok(())
    }

    #[test]
    fn test_walk_table_is_read() -> Result<()>
    {
        let tmp = TempDir::new()?;
        std::fs::write(
            tmp.path().join("apexdelta.toml"),
            "[walk]\ninclude_hidden = true\nfollow_symlinks = true\nmax_depth = 3\n",
        )?;

        let cfg = load_config_from(tmp.path())?;
        assert!(cfg.walk.include_hidden);
        assert!(cfg.walk.follow_symlinks);
        assert!(!cfg.walk.vcs_ignores);
        assert_eq!(cfg.walk.max_depth, Some(3));
        Ok(())
    }

    #[test]
    fn test_init_round_trips_defaults() -> Result<()>
    {
        let tmp = TempDir::new()?;
        init(InitArgs { path: tmp.path().to_path_buf(), force: false }, &ctx())?;

        let cfg = load_config_from(tmp.path())?;
        assert_eq!(cfg, Config::default());

        // Second init without --force refuses to overwrite
        let err = init(InitArgs { path: tmp.path().to_path_buf(), force: false }, &ctx())
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        Ok(())
    }
}
