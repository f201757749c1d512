//! Project handle: the set of TypeScript files being migrated.
//!
//! The project owns every file's text and tree for the duration of a run and
//! is passed explicitly to the passes that read or rewrite it.

pub mod source_file;

pub use source_file::SourceFile;

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::syntax::Dialect;
use crate::{MigrateConfig, MigrateError, Result};

#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    files: Vec<SourceFile>,
}

impl Project {
    /// Enumerate and parse every TypeScript file below the configured root
    pub fn load(config: &MigrateConfig) -> Result<Self> {
        let root = config.root.clone();
        if !root.is_dir() {
            return Err(MigrateError::Load {
                path: root,
                reason: "project root is not a directory".to_string(),
            });
        }
        if let Some(tsconfig) = config.tsconfig_path() {
            if !tsconfig.is_file() {
                return Err(MigrateError::Load {
                    path: tsconfig,
                    reason: "tsconfig not found".to_string(),
                });
            }
        }

        let mut paths = Vec::new();
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_excluded_dir(entry));
        for entry in walker {
            let entry = entry.map_err(|e| MigrateError::Load {
                path: root.clone(),
                reason: e.to_string(),
            })?;
            if entry.file_type().is_file() && Dialect::from_path(entry.path()).is_some() {
                paths.push(entry.into_path());
            }
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            debug!("Loading {}", path.display());
            files.push(SourceFile::load(path)?);
        }
        info!("Loaded {} source files from {}", files.len(), root.display());

        Ok(Self { root, files })
    }

    /// Project over files that are already in memory
    pub fn from_files(root: impl Into<PathBuf>, files: Vec<SourceFile>) -> Self {
        Self {
            root: root.into(),
            files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut [SourceFile] {
        &mut self.files
    }

    /// Index of the file at `path`, which may be relative to the root
    pub fn index_of(&self, path: &Path) -> Option<usize> {
        let joined = self.root.join(path);
        if let Some(index) = self
            .files
            .iter()
            .position(|file| file.path() == path || file.path() == joined)
        {
            return Some(index);
        }

        // Fall back to canonical paths for absolute or differently spelled paths
        let canonical = joined.canonicalize().ok()?;
        self.files.iter().position(|file| {
            file.path()
                .canonicalize()
                .is_ok_and(|candidate| candidate == canonical)
        })
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.index_of(path).map(|index| &self.files[index])
    }

    pub fn dirty_count(&self) -> usize {
        self.files.iter().filter(|file| file.is_dirty()).count()
    }

    /// Write every changed file; returns how many were written
    pub fn persist(&mut self) -> Result<usize> {
        let mut written = 0;
        for file in &mut self.files {
            if file.is_dirty() {
                file.persist()?;
                written += 1;
            }
        }
        info!("Persisted {written} files");
        Ok(written)
    }
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == "node_modules" || name.starts_with('.')
}
