/*!
# Import Rewriter

Points imports of the old matrix module at the new module and replaces the
import clause with the full list of namespace types. Every namespace is
imported whether or not the file uses it; unused imports are left for a
later cleanup.
*/

use std::sync::Arc;

use crate::syntax::{build, kinds, SyntaxNode};
use crate::tables::RuleTables;
use crate::tracer::rules::TransformationRule;
use crate::tracer::{TraceAction, TransformResult, TransformationContext};

pub struct ImportRewriter {
    tables: Arc<RuleTables>,
}

impl ImportRewriter {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }

    /// Quote character and module path of an import statement
    fn module_path(node: &SyntaxNode) -> Option<(char, String)> {
        if !node.is(kinds::IMPORT_STATEMENT) {
            return None;
        }
        let source = node.child_by_field("source")?;
        if !source.is(kinds::STRING) {
            return None;
        }
        let text = source.text();
        let quote = text.chars().next()?;
        let path = text.strip_prefix(quote)?.strip_suffix(quote)?;
        Some((quote, path.to_string()))
    }
}

impl TransformationRule for ImportRewriter {
    fn name(&self) -> &'static str {
        "ImportRewriter"
    }

    fn description(&self) -> &'static str {
        "Rewrites imports of the old matrix module to named imports from the new module"
    }

    fn matches(&self, node: &SyntaxNode, _context: &TransformationContext) -> bool {
        Self::module_path(node)
            .is_some_and(|(_, path)| self.tables.import.rewrite_path(&path).is_some())
    }

    fn transform(
        &self,
        node: SyntaxNode,
        context: &mut TransformationContext,
    ) -> TransformResult<SyntaxNode> {
        let Some((quote, path)) = Self::module_path(&node) else {
            return Ok(node);
        };
        let Some(new_path) = self.tables.import.rewrite_path(&path) else {
            return Ok(node);
        };

        let semicolon = node.text().trim_end().ends_with(';');
        context.record(
            &node,
            TraceAction::ImportRewrite {
                from: path,
                to: new_path.clone(),
            },
        );

        Ok(build::named_import(
            &self.tables.import.symbols,
            build::string(quote, &new_path),
            semicolon,
        ))
    }
}
