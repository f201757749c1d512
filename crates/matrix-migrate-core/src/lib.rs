//! # Matrix Migrate Core
//!
//! Rewrite engine for migrating TypeScript call sites from the `gl-matrix`
//! API to the `sprig-matrix` API, including:
//! - A lossless TypeScript syntax tree built on tree-sitter
//! - Declarative rule tables for renames, argument reordering and alias types
//! - A post-order tree transform engine driven by transformation rules
//! - A type-checker oracle and a diagnostic-driven repair pass
//! - The migration pipeline tying the passes together
//!
//! The crate is a library so the passes can be driven and tested in isolation;
//! the `matrix-migrate` binary wires it to the command line.

#![warn(clippy::all)]

pub mod checker;
pub mod pipeline;
pub mod project;
pub mod repair;
pub mod syntax;
pub mod tables;
pub mod tracer;

use std::path::PathBuf;

// Re-export commonly used types
pub use checker::{Diagnostic, TscChecker, TypeChecker};
pub use pipeline::{Migration, MigrationReport, MigrationState};
pub use project::{Project, SourceFile};
pub use repair::{DiagnosticRepairPass, RepairSummary};
pub use syntax::{Dialect, SyntaxNode, ToSource};
pub use tables::{Namespace, RuleTables};
pub use tracer::{FileTracer, TraceEvent, TransformationContext, TransformationRule};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the migration tool.
///
/// `RUST_LOG` overrides the default filter, which shows every trace record
/// emitted by the rewrite and repair passes.
pub fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "matrix_migrate_core=debug,matrix_migrate=debug"
    } else {
        "matrix_migrate_core=info,matrix_migrate=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Migration run configuration
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    /// Project root; source files are enumerated below it
    pub root: PathBuf,
    /// tsconfig handed to the type-checker, relative to `root`
    pub tsconfig: Option<PathBuf>,
    /// File base names the rewrite and repair passes never touch
    pub skip_files: Vec<String>,
    /// Program plus leading arguments used to invoke the TypeScript compiler
    pub checker_command: Vec<String>,
    /// Maximum syntax tree nesting the transform engine will descend
    pub max_depth: usize,
    /// Rename, reorder, alias and import tables
    pub tables: RuleTables,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            tsconfig: Some(PathBuf::from("tsconfig.json")),
            skip_files: vec!["sprig-matrix.ts".to_string(), "gl-matrix.d.ts".to_string()],
            checker_command: vec!["npx".to_string(), "tsc".to_string()],
            max_depth: crate::syntax::MAX_NESTING,
            tables: RuleTables::default(),
        }
    }
}

impl MigrateConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Absolute-or-root-relative path of the configured tsconfig
    pub fn tsconfig_path(&self) -> Option<PathBuf> {
        self.tsconfig.as_ref().map(|path| self.root.join(path))
    }
}

/// Error types for migration runs
#[derive(thiserror::Error, Debug)]
pub enum MigrateError {
    /// The project could not be enumerated or read
    #[error("Failed to load project at {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// A source file produced no syntax tree
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Writing a rewritten file failed
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external type-checker could not be run
    #[error("Type-checker unavailable: {0}")]
    CheckerUnavailable(String),

    /// A pipeline step was invoked out of order
    #[error("Invalid migration state: expected {expected}, found {actual}")]
    InvalidState {
        expected: MigrationState,
        actual: MigrationState,
    },

    /// A transformation rule failed
    #[error("Transform error: {0}")]
    Transform(#[from] anyhow::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for migration operations
pub type Result<T> = std::result::Result<T, MigrateError>;
