/*!
# FileTracer - Tree Transform Engine

Walks each file's syntax tree post-order, so children are rewritten before
their parent is inspected, and applies the registered rules at every node.
Produces a new tree per file and hands it back to the file; persisting is
the caller's job.
*/

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::bail;
use tracing::{debug, warn};

use crate::project::{Project, SourceFile};
use crate::syntax::SyntaxNode;
use crate::{MigrateConfig, Result};

use super::matrix_rules::{AliasTypeRenamer, ImportRewriter, MatrixCallRewriter};
use super::rules::{RuleStats, TransformationRule};
use super::{TraceEvent, TransformResult, TransformationContext};

/// Rule-driven transformation of whole files
pub struct FileTracer {
    rules: Vec<Box<dyn TransformationRule>>,
    stats: HashMap<String, RuleStats>,
    skip_files: Vec<String>,
    max_depth: usize,
}

impl FileTracer {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            stats: HashMap::new(),
            skip_files: Vec::new(),
            max_depth: TransformationContext::default().max_depth,
        }
    }

    /// Tracer for the first rewrite pass: import rewrite, then target call
    /// rename and reorder, then alias identifier rename
    pub fn for_migration(config: &MigrateConfig) -> Self {
        let tables = Arc::new(config.tables.clone());
        let mut tracer = Self::new()
            .skip_files(config.skip_files.clone())
            .max_depth(config.max_depth);
        tracer.add_rule(Box::new(ImportRewriter::new(Arc::clone(&tables))));
        tracer.add_rule(Box::new(MatrixCallRewriter::new(Arc::clone(&tables))));
        tracer.add_rule(Box::new(AliasTypeRenamer::new(tables)));
        tracer
    }

    /// File base names that are never transformed
    pub fn skip_files(mut self, names: Vec<String>) -> Self {
        self.skip_files = names;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Add a transformation rule; rules run in the order they were added
    pub fn add_rule(&mut self, rule: Box<dyn TransformationRule>) {
        let rule_name = rule.name().to_string();
        debug!("Registered rule {rule_name}: {}", rule.description());
        self.stats.insert(rule_name.clone(), RuleStats::new(rule_name));
        self.rules.push(rule);
    }

    pub fn should_process_file(&self, path: &Path) -> bool {
        let Some(base_name) = path.file_name() else {
            return false;
        };
        let base_name = base_name.to_string_lossy();
        !self.skip_files.iter().any(|skip| *skip == base_name)
    }

    /// Rewrite every processable file in the project.
    ///
    /// Files nested too deeply to walk are left unchanged and counted as
    /// skipped; they never end the pass.
    pub fn transform_project(
        &mut self,
        project: &mut Project,
    ) -> Result<FileTransformationSummary> {
        let mut summary = FileTransformationSummary::new();

        for file in project.files_mut() {
            if !self.should_process_file(file.path()) {
                debug!("Skipping {}", file.path().display());
                summary.files_skipped += 1;
                continue;
            }

            let Some(events) = self.rewrite_file(file)? else {
                summary.files_skipped += 1;
                continue;
            };
            summary.files_processed += 1;
            if !events.is_empty() {
                summary.files_transformed += 1;
            }
            summary.events.extend(events);
        }

        Ok(summary)
    }

    /// Rewrite one file in place, returning the transforms applied.
    ///
    /// Skipped and over-deep files are left untouched and yield no events.
    pub fn transform_file(&mut self, file: &mut SourceFile) -> Result<Vec<TraceEvent>> {
        if !self.should_process_file(file.path()) {
            return Ok(Vec::new());
        }
        Ok(self.rewrite_file(file)?.unwrap_or_default())
    }

    /// `None` when the file nests too deeply to walk
    fn rewrite_file(&mut self, file: &mut SourceFile) -> Result<Option<Vec<TraceEvent>>> {
        if file.is_too_deep() {
            warn!("Leaving {} unchanged: nesting too deep", file.path().display());
            return Ok(None);
        }

        let mut context = TransformationContext::new()
            .with_source_file(file.path())
            .with_max_depth(self.max_depth);

        let transformed = match self.transform_tree(file.tree().clone(), &mut context) {
            Ok(tree) => tree,
            Err(e) if e.is::<NestingTooDeep>() => {
                warn!("Leaving {} unchanged: {e}", file.path().display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let events = context.take_events();
        if !events.is_empty() {
            file.replace_tree(transformed)?;
        }

        Ok(Some(events))
    }

    /// Apply the rules to `tree` bottom-up and return the new tree
    pub fn transform_tree(
        &mut self,
        tree: SyntaxNode,
        context: &mut TransformationContext,
    ) -> TransformResult<SyntaxNode> {
        if context.at_max_depth() {
            bail!(NestingTooDeep {
                max_depth: context.max_depth,
                file: context
                    .source_file()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "<memory>".to_string()),
            });
        }

        context.enter(&tree);
        let visited = tree.try_map_children(|child| self.transform_tree(child, context));
        context.leave();
        let mut node = visited?;

        for rule in &self.rules {
            if !rule.matches(&node, context) {
                continue;
            }
            let stats = self
                .stats
                .entry(rule.name().to_string())
                .or_insert_with(|| RuleStats::new(rule.name().to_string()));
            stats.applications += 1;

            let before = context.events().len();
            match rule.transform(node, context) {
                Ok(transformed) => {
                    node = transformed;
                    if context.events().len() > before {
                        stats.transformations += 1;
                    }
                }
                Err(e) => {
                    stats.errors += 1;
                    warn!("Rule {} failed: {e}", rule.name());
                    return Err(e);
                }
            }
        }

        Ok(node)
    }

    /// Get transformation statistics
    pub fn stats(&self) -> &HashMap<String, RuleStats> {
        &self.stats
    }
}

impl Default for FileTracer {
    fn default() -> Self {
        Self::new()
    }
}

/// A tree nests deeper than the walk allows
#[derive(thiserror::Error, Debug)]
#[error("syntax tree nesting exceeds {max_depth} levels in {file}")]
pub struct NestingTooDeep {
    pub max_depth: usize,
    pub file: String,
}

/// Summary of a rewrite pass over a project
#[derive(Debug, Default)]
pub struct FileTransformationSummary {
    pub files_processed: u64,
    pub files_transformed: u64,
    pub files_skipped: u64,
    pub events: Vec<TraceEvent>,
}

impl FileTransformationSummary {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ToSource;
    use pretty_assertions::assert_eq;

    fn rewrite(source: &str) -> (String, Vec<TraceEvent>) {
        let mut file = SourceFile::parse("src/scene.ts", source).unwrap();
        let mut tracer = FileTracer::for_migration(&MigrateConfig::default());
        let events = tracer.transform_file(&mut file).unwrap();
        (file.text().to_string(), events)
    }

    #[test]
    fn test_rewrites_compose_bottom_up() {
        // The alias identifier becomes `mat4` before the call is classified.
        let (text, events) = rewrite("ReadonlyMat4.multiply(out, a, b);\n");
        assert_eq!(text, "mat4.mul(a, b, out);\n");
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_nested_target_calls() {
        let (text, _) = rewrite("vec3.add(out, vec3.scale(tempVec3(), v, 2), w);\n");
        assert_eq!(text, "vec3.add(vec3.scale(v, 2), w, out);\n");
    }

    #[test]
    fn test_untouched_file_keeps_text() {
        let source = "const x = [1, 2, 3];\nfoo.multiply(out, a);\n";
        let (text, events) = rewrite(source);
        assert_eq!(text, source);
        assert!(events.is_empty());
    }

    #[test]
    fn test_skipped_files_are_not_transformed() {
        let source =
            "export function mul(out: ReadonlyVec3) { return vec3.multiply(out, a, b); }\n";
        let mut file = SourceFile::parse("lib/sprig-matrix.ts", source).unwrap();
        let mut tracer = FileTracer::for_migration(&MigrateConfig::default());

        assert!(!tracer.should_process_file(file.path()));
        let events = tracer.transform_file(&mut file).unwrap();
        assert!(events.is_empty());
        assert_eq!(file.text(), source);
        assert!(!file.is_dirty());
    }

    #[test]
    fn test_rule_stats() {
        let mut file = SourceFile::parse("a.ts", "vec2.len(v);\nvec2.dot(a, b);\n").unwrap();
        let mut tracer = FileTracer::for_migration(&MigrateConfig::default());
        tracer.transform_file(&mut file).unwrap();

        let stats = &tracer.stats()["MatrixCallRewriter"];
        assert_eq!(stats.applications, 2);
        assert_eq!(stats.transformations, 1);
        assert_eq!(file.tree().to_source(), "vec2.length(v);\nvec2.dot(a, b);\n");
    }

    #[test]
    fn test_max_depth_is_enforced() {
        let tree = SourceFile::parse("a.ts", "f(g(h(i(1))));").unwrap().tree().clone();
        let mut tracer = FileTracer::new();
        let mut context = TransformationContext::new().with_max_depth(3);
        let err = tracer.transform_tree(tree, &mut context).unwrap_err();
        assert!(err.is::<NestingTooDeep>());
    }

    #[test]
    fn test_over_deep_file_is_skipped_and_others_rewritten() {
        let terms: Vec<String> = (0..2100).map(|i| format!("\"p{i}\"")).collect();
        let deep = format!("const s = {};\nmat4.multiply(out, a, b);\n", terms.join(" + "));
        let project_files = vec![
            SourceFile::parse("/p/deep.ts", deep.clone()).unwrap(),
            SourceFile::parse("/p/scene.ts", "mat4.multiply(out, a, b);\n").unwrap(),
        ];
        assert!(project_files[0].is_too_deep());
        let mut project = Project::from_files("/p", project_files);

        let mut tracer = FileTracer::for_migration(&MigrateConfig::default());
        let summary = tracer.transform_project(&mut project).unwrap();

        assert_eq!(project.files()[0].text(), deep);
        assert!(!project.files()[0].is_dirty());
        assert_eq!(project.files()[1].text(), "mat4.mul(a, b, out);\n");
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.files_transformed, 1);
    }

    #[test]
    fn test_walk_depth_overflow_is_not_fatal() {
        let mut project = Project::from_files(
            "/p",
            vec![
                SourceFile::parse("/p/deep.ts", "f(g(h(i(j(vec3.len(v))))));\n").unwrap(),
                SourceFile::parse("/p/flat.ts", "vec3.len(v);\n").unwrap(),
            ],
        );
        let config = MigrateConfig {
            max_depth: 6,
            ..MigrateConfig::default()
        };

        let mut tracer = FileTracer::for_migration(&config);
        let summary = tracer.transform_project(&mut project).unwrap();

        assert_eq!(project.files()[0].text(), "f(g(h(i(j(vec3.len(v))))));\n");
        assert_eq!(project.files()[1].text(), "vec3.length(v);\n");
        assert_eq!((summary.files_skipped, summary.files_transformed), (1, 1));
    }
}
