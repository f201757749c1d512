use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::tables::Namespace;

/// One transform applied by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    pub file: Option<PathBuf>,
    /// One-based line of the rewritten node, when it came from the parser
    pub line: Option<usize>,
    #[serde(flatten)]
    pub action: TraceAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceAction {
    Rename {
        namespace: Namespace,
        from: String,
        to: String,
    },
    Reorder {
        namespace: Namespace,
        function: String,
        /// Scratch allocator call dropped instead of moved
        dropped: Option<String>,
    },
    IdentifierRename {
        from: String,
        to: Namespace,
    },
    ImportRewrite {
        from: String,
        to: String,
    },
    Wrap {
        namespace: Namespace,
        elements: usize,
    },
}

impl fmt::Display for TraceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceAction::Rename { namespace, from, to } => {
                write!(f, "Rewriting {namespace}.{from} to {to}")
            }
            TraceAction::Reorder {
                namespace,
                function,
                dropped: None,
            } => write!(f, "Flipping arguments of call: {namespace}.{function}"),
            TraceAction::Reorder {
                namespace,
                function,
                dropped: Some(scratch),
            } => write!(
                f,
                "Dropping scratch argument {scratch} of call: {namespace}.{function}"
            ),
            TraceAction::IdentifierRename { from, to } => write!(f, "Rewriting {from} to {to}"),
            TraceAction::ImportRewrite { from, to } => {
                write!(f, "Rewriting import of {from} to {to}")
            }
            TraceAction::Wrap {
                namespace,
                elements,
            } => write!(
                f,
                "Wrapping array of {elements} elements in {namespace}.clone"
            ),
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{line}: {}", file.display(), self.action),
            (Some(file), None) => write!(f, "{}: {}", file.display(), self.action),
            _ => write!(f, "{}", self.action),
        }
    }
}
