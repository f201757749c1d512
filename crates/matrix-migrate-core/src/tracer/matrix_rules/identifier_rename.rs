/*!
# Alias Type Renamer

Replaces the deprecated `ReadonlyVec3`-style alias types with the namespace
type that supersedes them, wherever the identifier appears.
*/

use std::sync::Arc;

use crate::syntax::SyntaxNode;
use crate::tables::RuleTables;
use crate::tracer::patterns::{NodeMatch, NodeMatcher};
use crate::tracer::rules::TransformationRule;
use crate::tracer::{TraceAction, TransformResult, TransformationContext};

pub struct AliasTypeRenamer {
    tables: Arc<RuleTables>,
}

impl AliasTypeRenamer {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }
}

impl TransformationRule for AliasTypeRenamer {
    fn name(&self) -> &'static str {
        "AliasTypeRenamer"
    }

    fn description(&self) -> &'static str {
        "Rewrites deprecated readonly alias types to their namespace type"
    }

    fn matches(&self, node: &SyntaxNode, _context: &TransformationContext) -> bool {
        matches!(
            NodeMatcher::new(&self.tables.identifiers).classify(node),
            NodeMatch::Identifier { .. }
        )
    }

    fn transform(
        &self,
        node: SyntaxNode,
        context: &mut TransformationContext,
    ) -> TransformResult<SyntaxNode> {
        let matched = match NodeMatcher::new(&self.tables.identifiers).classify(&node) {
            NodeMatch::Identifier {
                old_name,
                replacement,
            } => Some((old_name, replacement)),
            _ => None,
        };
        let Some((old_name, replacement)) = matched else {
            return Ok(node);
        };

        context.record(
            &node,
            TraceAction::IdentifierRename {
                from: old_name,
                to: replacement,
            },
        );
        Ok(SyntaxNode::leaf(node.kind(), replacement.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{kinds, Dialect, ToSource, TypeScriptParser};
    use crate::tables::Namespace;

    fn parse(source: &str) -> SyntaxNode {
        TypeScriptParser::new(Dialect::TypeScript)
            .unwrap()
            .parse(source)
            .unwrap()
    }

    #[test]
    fn test_renames_type_annotation() {
        let renamer = AliasTypeRenamer::new(Arc::new(RuleTables::default()));
        let tree = parse("function f(v: ReadonlyVec3): number { return 0; }");
        let ident = tree.find_all(&|node| node.is(kinds::TYPE_IDENTIFIER))[0].clone();

        let mut context = TransformationContext::new();
        assert!(renamer.matches(&ident, &context));
        let renamed = renamer.transform(ident, &mut context).unwrap();

        assert_eq!(renamed.to_source(), "vec3");
        assert_eq!(renamed.kind(), kinds::TYPE_IDENTIFIER);
        assert!(matches!(
            context.events()[0].action,
            TraceAction::IdentifierRename { to: Namespace::Vec3, .. }
        ));
    }

    #[test]
    fn test_other_identifiers_untouched() {
        let renamer = AliasTypeRenamer::new(Arc::new(RuleTables::default()));
        let context = TransformationContext::new();
        let tree = parse("let ReadonlyVec5: Vec3 = readonlyVec3;");
        let idents = tree.find_all(&|node| {
            node.is(kinds::IDENTIFIER) || node.is(kinds::TYPE_IDENTIFIER)
        });
        assert_eq!(idents.len(), 3);
        assert!(idents.iter().all(|ident| !renamer.matches(ident, &context)));
    }
}
