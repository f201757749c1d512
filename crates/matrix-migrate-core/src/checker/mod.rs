//! Type-checker oracle.
//!
//! The migration never infers types itself: after rewriting it asks an
//! external checker for diagnostics and reacts to the ones it recognises.

pub mod tsc;

pub use tsc::TscChecker;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::project::Project;
use crate::Result;

/// A diagnostic reported by the type-checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: u32,
    pub message: String,
    pub file: Option<PathBuf>,
    /// Byte offset into the file's current text
    pub start: Option<usize>,
}

impl Diagnostic {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            file: None,
            start: None,
        }
    }

    pub fn at(mut self, file: impl Into<PathBuf>, start: usize) -> Self {
        self.file = Some(file.into());
        self.start = Some(start);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.start) {
            (Some(file), Some(start)) => write!(
                f,
                "{}@{start}: TS{}: {}",
                file.display(),
                self.code,
                self.message
            ),
            (Some(file), None) => {
                write!(f, "{}: TS{}: {}", file.display(), self.code, self.message)
            }
            _ => write!(f, "TS{}: {}", self.code, self.message),
        }
    }
}

/// Full-project type-checking
pub trait TypeChecker {
    /// Fail early when the checker cannot run at all, before any file is
    /// rewritten
    fn ensure_available(&mut self, project: &Project) -> Result<()> {
        let _ = project;
        Ok(())
    }

    /// Type-check the project as persisted on disk
    fn check(&mut self, project: &Project) -> Result<Vec<Diagnostic>>;
}
