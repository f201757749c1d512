/*!
# Node Matcher

Classifies syntax nodes as target calls (`<namespace>.<function>(...)`) or
deprecated alias identifiers. Matching is purely syntactic: a call made
through any other callee shape, such as a local alias of a namespace, is not
a target call.
*/

use crate::syntax::{kinds, SyntaxNode};
use crate::tables::{IdentifierRenameMap, Namespace, RuleTables};

/// A call whose callee is exactly `<namespace>.<function>`
#[derive(Debug, Clone)]
pub struct TargetCall<'a> {
    pub namespace: Namespace,
    pub function: String,
    pub node: &'a SyntaxNode,
}

#[derive(Debug, Clone)]
pub enum NodeMatch<'a> {
    NotMatched,
    Call(TargetCall<'a>),
    Identifier {
        old_name: String,
        replacement: Namespace,
    },
}

impl NodeMatch<'_> {
    pub fn is_matched(&self) -> bool {
        !matches!(self, NodeMatch::NotMatched)
    }
}

pub struct NodeMatcher<'t> {
    aliases: &'t IdentifierRenameMap,
}

impl<'t> NodeMatcher<'t> {
    pub fn new(aliases: &'t IdentifierRenameMap) -> Self {
        Self { aliases }
    }

    pub fn classify<'a>(&self, node: &'a SyntaxNode) -> NodeMatch<'a> {
        if let Some(call) = target_call(node) {
            return NodeMatch::Call(call);
        }
        if is_identifier(node) {
            let name = node.text();
            if let Some(replacement) = self.aliases.get(&name) {
                return NodeMatch::Identifier {
                    old_name: name,
                    replacement,
                };
            }
        }
        NodeMatch::NotMatched
    }
}

/// Identifier in value or type position
pub fn is_identifier(node: &SyntaxNode) -> bool {
    node.is(kinds::IDENTIFIER) || node.is(kinds::TYPE_IDENTIFIER)
}

pub fn target_call(node: &SyntaxNode) -> Option<TargetCall<'_>> {
    if !node.is(kinds::CALL_EXPRESSION) {
        return None;
    }
    // Tagged templates share the call_expression kind
    if !node.child_by_field("arguments")?.is(kinds::ARGUMENTS) {
        return None;
    }

    let callee = node.child_by_field("function")?;
    if !callee.is(kinds::MEMBER_EXPRESSION) {
        return None;
    }
    let object = callee.child_by_field("object")?;
    if !object.is(kinds::IDENTIFIER) {
        return None;
    }
    let property = callee.child_by_field("property")?;
    if !property.is(kinds::PROPERTY_IDENTIFIER) {
        return None;
    }

    let namespace = Namespace::from_ident(&object.text())?;
    Some(TargetCall {
        namespace,
        function: property.text(),
        node,
    })
}

/// Arguments of a call expression, comments excluded
pub fn call_arguments(node: &SyntaxNode) -> Vec<&SyntaxNode> {
    node.child_by_field("arguments")
        .map(|args| args.named_children().collect())
        .unwrap_or_default()
}

/// `tempVec3()` and friends
pub fn is_scratch_call(node: &SyntaxNode, tables: &RuleTables) -> bool {
    node.is(kinds::CALL_EXPRESSION)
        && node
            .child_by_field("function")
            .is_some_and(|callee| {
                callee.is(kinds::IDENTIFIER) && tables.is_scratch_allocator(&callee.text())
            })
}
