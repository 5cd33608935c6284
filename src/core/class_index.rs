//! In-memory index of class sources under one metadata-type directory.
//!
//! Records are keyed by class name, which is the file name with its
//! class-source suffix stripped (`Foo.cls` -> `Foo`). Companion descriptors
//! (`Foo.cls-meta.xml`) are never indexed. Duplicate names are allowed on
//! disk; the last one registered wins and the collision is kept on the index
//! so callers can surface it.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::infra::io::read_text;
use crate::infra::walk::FileWalker;

/// Suffix of the companion descriptor that sits next to every source file
pub const META_SUFFIX: &str = "-meta.xml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRecord
{
    pub name: String,
    pub path: PathBuf,
    pub is_test: bool,
    #[serde(skip)]
    pub content: String,
}

/// Two source files mapped to the same class name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateClassName
{
    pub name: String,
    /// Record that now holds the name
    pub kept: PathBuf,
    /// Record that was overwritten
    pub replaced: PathBuf,
}

#[derive(Debug, Clone)]
pub struct IndexOptions
{
    /// File suffixes recognized as class sources, e.g. ".cls"
    pub class_suffixes: Vec<String>,
    /// Class names ending with this are tests
    pub test_suffix: String,
}

impl Default for IndexOptions
{
    fn default() -> Self
    {
        Self {
            class_suffixes: vec![".cls".to_string(), ".trigger".to_string()],
            test_suffix: "Test".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError
{
    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("failed to read {path}: {message}")]
    Read
    {
        path: PathBuf,
        message: String,
    },
}

#[derive(Debug, Default)]
pub struct ClassIndex
{
    records: IndexMap<String, ClassRecord>,
    duplicates: Vec<DuplicateClassName>,
}

/// Class name for a source path, or `None` for descriptors and files
/// without a recognized class suffix.
pub fn class_name_for(
    path: &Path,
    class_suffixes: &[String],
) -> Option<String>
{
    let file_name = path
        .file_name()?
        .to_str()?;
    if file_name.ends_with(META_SUFFIX)
    {
        return None;
    }

    class_suffixes
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix.as_str()))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

impl ClassIndex
{
    /// Walk `root` and load every class source beneath it.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn build(
        root: &Path,
        opts: &IndexOptions,
        walker: &FileWalker,
    ) -> Result<Self, IndexError>
    {
        if !root.is_dir()
        {
            return Err(IndexError::DirectoryNotFound(root.to_path_buf()));
        }

        let mut files = Vec::new();
        walker.walk_into(root, &mut files);

        let mut index = ClassIndex::default();
        for path in files
        {
            let Some(name) = class_name_for(&path, &opts.class_suffixes)
            else
            {
                continue;
            };

            let content = read_text(&path).map_err(|e| IndexError::Read {
                path: path.clone(),
                message: format!("{e:#}"),
            })?;

            let is_test = name.ends_with(&opts.test_suffix);
            index.insert(ClassRecord { name, path, is_test, content });
        }

        debug!(classes = index.len(), duplicates = index.duplicates.len(), "class index built");
        Ok(index)
    }

    /// Register a record; a record with the same name is replaced.
    pub fn insert(
        &mut self,
        record: ClassRecord,
    )
    {
        let name = record
            .name
            .clone();
        let kept = record
            .path
            .clone();

        if let Some(previous) = self
            .records
            .insert(name.clone(), record)
        {
            warn!(
                class = %name,
                kept = %kept.display(),
                replaced = %previous.path.display(),
                "duplicate class name"
            );
            self.duplicates
                .push(DuplicateClassName { name, kept, replaced: previous.path });
        }
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&ClassRecord>
    {
        self.records
            .get(name)
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool
    {
        self.records
            .contains_key(name)
    }

    pub fn records(&self) -> impl Iterator<Item = &ClassRecord>
    {
        self.records
            .values()
    }

    pub fn duplicates(&self) -> &[DuplicateClassName]
    {
        &self.duplicates
    }

    pub fn len(&self) -> usize
    {
        self.records
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.records
            .is_empty()
    }
}
