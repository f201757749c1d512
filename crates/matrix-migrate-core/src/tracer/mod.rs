/*!
# Tracer - Rule-Driven Syntax Tree Transformation

Rewrites TypeScript syntax trees by running a list of transformation rules
over every node in a single post-order walk.

## Architecture

- `TransformationRule`: Trait for defining transformation rules
- `FileTracer`: The tree transform engine; walks a file bottom-up, applies
  rules, and hands the new tree back to the file
- `patterns`: Node matcher classifying target calls and alias identifiers
- `matrix_rules`: The gl-matrix to sprig-matrix rules (imports, calls,
  alias identifiers, array literal repair)
- `TraceEvent`: Audit record of every transform applied

## Example Usage

```rust,no_run
use matrix_migrate_core::{FileTracer, MigrateConfig, Project};

let config = MigrateConfig::new("web");
let mut project = Project::load(&config)?;
let mut tracer = FileTracer::for_migration(&config);
let summary = tracer.transform_project(&mut project)?;
println!("{} files rewritten", summary.files_transformed);
# Ok::<(), matrix_migrate_core::MigrateError>(())
```
*/

pub mod file_tracer;
pub mod matrix_rules;
pub mod patterns;
pub mod rules;
pub mod trace;

use std::path::{Path, PathBuf};

// Re-export main types
pub use file_tracer::{FileTracer, FileTransformationSummary, NestingTooDeep};
pub use patterns::{NodeMatch, NodeMatcher, TargetCall};
pub use rules::{RuleStats, TransformationRule};
pub use trace::{TraceAction, TraceEvent};

use crate::syntax::SyntaxNode;
use crate::tables::Namespace;

// Common result type for transformations
pub type TransformResult<T> = anyhow::Result<T>;

/// What a rule may know about a node above the one being transformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ancestor {
    pub kind: &'static str,
    /// Namespace and function when the ancestor is a target call
    pub call_target: Option<(Namespace, String)>,
    /// Named children, comments excluded
    pub child_count: usize,
}

impl Ancestor {
    fn of(node: &SyntaxNode) -> Self {
        Self {
            kind: node.kind(),
            call_target: patterns::target_call(node).map(|call| (call.namespace, call.function)),
            child_count: node.named_child_count(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformationContext {
    pub source_file: Option<PathBuf>,
    pub max_depth: usize,
    ancestors: Vec<Ancestor>,
    events: Vec<TraceEvent>,
}

impl Default for TransformationContext {
    fn default() -> Self {
        Self {
            source_file: None,
            max_depth: crate::syntax::MAX_NESTING,
            ancestors: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl TransformationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.source_file = Some(file.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// Push `node` as the parent of the nodes visited next
    pub fn enter(&mut self, node: &SyntaxNode) {
        self.ancestors.push(Ancestor::of(node));
    }

    pub fn leave(&mut self) {
        self.ancestors.pop();
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    pub fn at_max_depth(&self) -> bool {
        self.depth() >= self.max_depth
    }

    pub fn parent(&self) -> Option<&Ancestor> {
        self.ancestors.last()
    }

    pub fn grandparent(&self) -> Option<&Ancestor> {
        self.ancestors.iter().rev().nth(1)
    }

    /// Log a transform and keep it for the run report
    pub fn record(&mut self, node: &SyntaxNode, action: TraceAction) {
        let event = TraceEvent {
            file: self.source_file.clone(),
            line: node.line().map(|line| line + 1),
            action,
        };
        tracing::info!("{event}");
        self.events.push(event);
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::build;

    #[test]
    fn test_ancestor_stack() {
        let mut context = TransformationContext::new().with_max_depth(2);
        let call = build::call(
            build::member(build::identifier("vec3"), "clone"),
            vec![build::identifier("v")],
        );
        let args = call.child_by_field("arguments").unwrap().clone();

        context.enter(&call);
        context.enter(&args);
        assert!(context.at_max_depth());
        assert_eq!(context.parent().unwrap().kind, "arguments");
        assert_eq!(context.parent().unwrap().child_count, 1);
        assert_eq!(
            context.grandparent().unwrap().call_target,
            Some((Namespace::Vec3, "clone".to_string()))
        );

        context.leave();
        context.leave();
        assert_eq!(context.depth(), 0);
        assert!(context.parent().is_none());
    }

    #[test]
    fn test_record_keeps_file_and_line() {
        let mut context = TransformationContext::new().with_source_file("src/a.ts");
        let node = build::identifier("ReadonlyVec3");
        context.record(
            &node,
            TraceAction::IdentifierRename {
                from: "ReadonlyVec3".to_string(),
                to: Namespace::Vec3,
            },
        );
        let events = context.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].file.as_deref(), Some(Path::new("src/a.ts")));
        assert_eq!(events[0].line, None);
        assert!(context.events().is_empty());
    }
}
