/*!
# Matrix Call Rewriter

Renames target calls whose function changed name and moves the output
argument from first to last position for functions whose calling convention
flipped. A first argument that only allocates scratch output (`tempVec3()`)
is dropped instead of moved.
*/

use std::sync::Arc;

use crate::syntax::{build, kinds, Piece, SyntaxNode, ToSource};
use crate::tables::RuleTables;
use crate::tracer::patterns::{is_scratch_call, target_call};
use crate::tracer::rules::TransformationRule;
use crate::tracer::{TraceAction, TransformResult, TransformationContext};

pub struct MatrixCallRewriter {
    tables: Arc<RuleTables>,
}

impl MatrixCallRewriter {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self { tables }
    }
}

impl TransformationRule for MatrixCallRewriter {
    fn name(&self) -> &'static str {
        "MatrixCallRewriter"
    }

    fn description(&self) -> &'static str {
        "Renames namespaced matrix calls and moves their output argument last"
    }

    fn matches(&self, node: &SyntaxNode, _context: &TransformationContext) -> bool {
        target_call(node).is_some()
    }

    fn transform(
        &self,
        node: SyntaxNode,
        context: &mut TransformationContext,
    ) -> TransformResult<SyntaxNode> {
        let target = target_call(&node).map(|call| (call.namespace, call.function));
        let Some((namespace, function)) = target else {
            return Ok(node);
        };
        let Some(rules) = self.tables.calls.get(namespace) else {
            return Ok(node);
        };

        let mut node = node;

        if let Some(new_name) = rules.rename(&function) {
            node = rename_callee(node, new_name);
            context.record(
                &node,
                TraceAction::Rename {
                    namespace,
                    from: function.clone(),
                    to: new_name.to_string(),
                },
            );
        }

        // Reorder eligibility is keyed by the name as written at the call site.
        if rules.reorders(&function) {
            let (reordered, outcome) = move_first_argument_last(node, &self.tables);
            node = reordered;
            match outcome {
                Reorder::Unchanged => {}
                Reorder::Moved => context.record(
                    &node,
                    TraceAction::Reorder {
                        namespace,
                        function,
                        dropped: None,
                    },
                ),
                Reorder::DroppedScratch(scratch) => context.record(
                    &node,
                    TraceAction::Reorder {
                        namespace,
                        function,
                        dropped: Some(scratch),
                    },
                ),
            }
        }

        Ok(node)
    }
}

fn rename_callee(call: SyntaxNode, new_name: &str) -> SyntaxNode {
    let Some(callee) = call.child_by_field("function").cloned() else {
        return call;
    };
    let callee = callee.replace_field("property", build::property_identifier(new_name));
    call.replace_field("function", callee)
}

#[derive(Debug, PartialEq, Eq)]
enum Reorder {
    Unchanged,
    Moved,
    DroppedScratch(String),
}

/// An argument list taken apart into its arguments and the text around them
struct ArgumentList {
    open: String,
    args: Vec<SyntaxNode>,
    separators: Vec<String>,
    close: String,
}

impl ArgumentList {
    /// Comments travel with the separator text that surrounds them.
    fn split(arguments: SyntaxNode) -> Self {
        let mut open = String::new();
        let mut args = Vec::new();
        let mut separators = Vec::new();
        let mut pending = String::new();

        for piece in arguments.into_pieces() {
            match piece {
                Piece::Node { node, .. } if !node.is(kinds::COMMENT) => {
                    let text = std::mem::take(&mut pending);
                    if args.is_empty() {
                        open = text;
                    } else {
                        separators.push(text);
                    }
                    args.push(node);
                }
                other => other.write_source(&mut pending),
            }
        }

        Self {
            open,
            args,
            separators,
            close: pending,
        }
    }

    /// `(tempVec3(),)` left as `(,)` reads `()` again
    fn drop_trailing_comma(&mut self) {
        if let Some(rest) = self.close.trim_start().strip_prefix(',') {
            self.close = rest.trim_start().to_string();
            self.open = self.open.trim_end().to_string();
        }
    }

    fn build(self) -> SyntaxNode {
        build::arguments(&self.open, self.args, self.separators, &self.close)
    }
}

fn move_first_argument_last(call: SyntaxNode, tables: &RuleTables) -> (SyntaxNode, Reorder) {
    let Some(arguments) = call.child_by_field("arguments").cloned() else {
        return (call, Reorder::Unchanged);
    };

    let mut list = ArgumentList::split(arguments);
    if list.args.is_empty() {
        return (call, Reorder::Unchanged);
    }

    let first = list.args.remove(0);
    let outcome = if is_scratch_call(&first, tables) {
        // The separator after the dropped argument goes with it.
        if !list.separators.is_empty() {
            list.separators.remove(0);
        }
        if list.args.is_empty() {
            list.drop_trailing_comma();
        }
        Reorder::DroppedScratch(first.to_source())
    } else {
        list.args.push(first);
        Reorder::Moved
    };

    (call.replace_field("arguments", list.build()), outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Dialect, TypeScriptParser};
    use crate::tracer::patterns::call_arguments;
    use pretty_assertions::assert_eq;

    fn parse_call(source: &str) -> SyntaxNode {
        let tree = TypeScriptParser::new(Dialect::TypeScript)
            .unwrap()
            .parse(source)
            .unwrap();
        tree.find_all(&|node| node.is(kinds::CALL_EXPRESSION))[0].clone()
    }

    fn rewrite(source: &str) -> (String, Vec<TraceAction>) {
        let rewriter = MatrixCallRewriter::new(Arc::new(RuleTables::default()));
        let mut context = TransformationContext::new();
        let call = parse_call(source);
        assert!(rewriter.matches(&call, &context));
        let rewritten = rewriter.transform(call, &mut context).unwrap();
        let actions = context
            .take_events()
            .into_iter()
            .map(|event| event.action)
            .collect();
        (rewritten.to_source(), actions)
    }

    #[test]
    fn test_rename_and_reorder() {
        let (text, actions) = rewrite("mat4.multiply(out, a, b)");
        assert_eq!(text, "mat4.mul(a, b, out)");
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], TraceAction::Rename { ref to, .. } if to == "mul"));
        assert!(matches!(actions[1], TraceAction::Reorder { dropped: None, .. }));
    }

    #[test]
    fn test_scratch_argument_is_dropped() {
        let (text, actions) = rewrite("vec3.add(tempVec3(), a, b)");
        assert_eq!(text, "vec3.add(a, b)");
        assert!(matches!(
            actions[0],
            TraceAction::Reorder { dropped: Some(ref scratch), .. } if scratch == "tempVec3()"
        ));
    }

    #[test]
    fn test_lone_scratch_argument_with_trailing_comma() {
        let (text, _) = rewrite("vec3.normalize(tempVec3(),)");
        assert_eq!(text, "vec3.normalize()");

        let (text, _) = rewrite("vec3.normalize(\n  tempVec3(),\n)");
        assert_eq!(text, "vec3.normalize()");
    }

    #[test]
    fn test_reorder_preserves_arguments() {
        let call = parse_call("quat.slerp(out, q1, q2, t * 0.5)");
        let before: Vec<String> = call_arguments(&call)
            .iter()
            .map(|arg| arg.to_source())
            .collect();

        let rewriter = MatrixCallRewriter::new(Arc::new(RuleTables::default()));
        let rewritten = rewriter
            .transform(call, &mut TransformationContext::new())
            .unwrap();
        let after: Vec<String> = call_arguments(&rewritten)
            .iter()
            .map(|arg| arg.to_source())
            .collect();

        assert_eq!(after.len(), before.len());
        assert_eq!(&after[..3], &before[1..]);
        assert_eq!(after[3], before[0]);
    }

    #[test]
    fn test_multiline_arguments_keep_layout() {
        let (text, _) = rewrite("mat4.lookAt(\n  view,\n  eye,\n  center,\n  up,\n)");
        assert_eq!(text, "mat4.lookAt(\n  eye,\n  center,\n  up,\n  view,\n)");
    }

    #[test]
    fn test_rename_only() {
        let (text, actions) = rewrite("vec3.len(v)");
        assert_eq!(text, "vec3.length(v)");
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_rename_is_idempotent() {
        let (once, _) = rewrite("vec4.subtract(out, a, b)");
        assert_eq!(once, "vec4.sub(a, b, out)");

        // A second pass never renames again: `sub` is not a rename source.
        let (_, actions) = rewrite(&once);
        assert!(actions
            .iter()
            .all(|action| !matches!(action, TraceAction::Rename { .. })));
    }

    #[test]
    fn test_unknown_function_passes_through() {
        let (text, actions) = rewrite("vec3.dot(a, b)");
        assert_eq!(text, "vec3.dot(a, b)");
        assert!(actions.is_empty());
    }

    #[test]
    fn test_namespace_without_rules_passes_through() {
        let tables = RuleTables {
            calls: crate::tables::RewriteRuleSet::new(),
            ..RuleTables::default()
        };
        let rewriter = MatrixCallRewriter::new(Arc::new(tables));
        let mut context = TransformationContext::new();
        let call = parse_call("mat4.multiply(out, a, b)");
        let rewritten = rewriter.transform(call, &mut context).unwrap();
        assert_eq!(rewritten.to_source(), "mat4.multiply(out, a, b)");
        assert!(context.events().is_empty());
    }

    #[test]
    fn test_empty_argument_list() {
        let (text, actions) = rewrite("mat4.invert()");
        assert_eq!(text, "mat4.invert()");
        assert!(actions.is_empty());
    }
}
