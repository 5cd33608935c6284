//! **apexdelta** - Git-driven delta and impacted-test resolution for Salesforce DX
//!
//! Lists what changed under a source directory, packages those files into a
//! deployable delta tree, and infers which Apex test classes need to run by
//! scanning class bodies for textual mentions of the changed classes.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core pipeline - diff, filter, index, scan, resolve
pub mod core {
    /// Changed-file queries against git (commit, branch, tags)
    pub mod vcs;
    pub use vcs::{DiffMode, DiffProvider, GitDiffProvider, VcsError};

    /// Stable, deduplicating base-directory filter
    pub mod filter;
    pub use filter::filter_paths;

    /// Class name -> source record index for one metadata-type directory
    pub mod class_index;
    pub use class_index::{ClassIndex, ClassRecord, IndexError, IndexOptions};

    /// Textual co-occurrence scanner (who mentions a class)
    pub mod scanner;
    pub use scanner::{find_referencing_tests, run as scan_run};

    /// One-hop impacted-test resolution across metadata types
    pub mod resolve;
    pub use resolve::{ImpactSet, ResolveOptions, resolve_impacted_tests, run as tests_run};

    /// Delta tree packaging from the changed file list
    pub mod delta;
    pub use delta::run as delta_run;
}

/// Infrastructure - Configuration, I/O, walking, and logging
pub mod infra {
    /// Layered configuration (file + APEXDELTA_* env) with TOML init
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Memory-mapped file I/O for large files (>1MB threshold)
    pub mod io;
    pub use io::read_text;

    /// Directory walking with extra ignore globs
    pub mod walk;
    pub use walk::FileWalker;

    /// tracing-subscriber setup
    pub mod logging;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use crate::core::{delta_run, scan_run, tests_run};
pub use infra::{Config, FileWalker, load_config};

// Core types for external consumers
pub use crate::core::{ClassIndex, ClassRecord, DiffMode, ImpactSet};
