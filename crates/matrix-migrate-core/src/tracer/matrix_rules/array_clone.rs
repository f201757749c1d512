/*!
# Array Clone Wrapper

Repair rule for bare array literals that the type-checker no longer accepts
where a vector object is expected: `[1, 2, 3]` on the flagged line becomes
`vec3.clone([1, 2, 3])`. Arrays that already are the sole argument of a
`clone` call are left alone.
*/

use tracing::debug;

use crate::syntax::{build, kinds, Piece, SyntaxNode};
use crate::tables::{Namespace, CLONE_FUNCTION};
use crate::tracer::rules::TransformationRule;
use crate::tracer::{TraceAction, TransformResult, TransformationContext};

pub struct ArrayCloneWrapper {
    /// Zero-based line the diagnostic points at
    line: usize,
}

impl ArrayCloneWrapper {
    pub fn new(line: usize) -> Self {
        Self { line }
    }

    fn is_clone_argument(context: &TransformationContext) -> bool {
        let Some(parent) = context.parent() else {
            return false;
        };
        if parent.kind != kinds::ARGUMENTS || parent.child_count != 1 {
            return false;
        }
        context
            .grandparent()
            .and_then(|call| call.call_target.as_ref())
            .is_some_and(|(_, function)| function == CLONE_FUNCTION)
    }
}

impl TransformationRule for ArrayCloneWrapper {
    fn name(&self) -> &'static str {
        "ArrayCloneWrapper"
    }

    fn description(&self) -> &'static str {
        "Wraps vector-sized array literals on a flagged line in a clone constructor"
    }

    fn matches(&self, node: &SyntaxNode, context: &TransformationContext) -> bool {
        node.is(kinds::ARRAY)
            && node.line() == Some(self.line)
            && !Self::is_clone_argument(context)
    }

    fn transform(
        &self,
        node: SyntaxNode,
        context: &mut TransformationContext,
    ) -> TransformResult<SyntaxNode> {
        let elements = element_slots(&node);
        let Some(namespace) = Namespace::vector_of_arity(elements) else {
            debug!(
                "Array of {elements} elements on line {} has no vector type",
                self.line + 1
            );
            return Ok(node);
        };

        context.record(&node, TraceAction::Wrap { namespace, elements });
        Ok(build::call(
            build::member(build::identifier(namespace.as_str()), CLONE_FUNCTION),
            vec![node],
        ))
    }
}

/// Element slots of an array literal, holes included: `[1, , 3]` has three
/// and a trailing comma adds none
fn element_slots(array: &SyntaxNode) -> usize {
    let mut slots = 0;
    let mut open_slot = false;
    for piece in array.pieces() {
        match piece {
            Piece::Text(text) => {
                let commas = text.matches(',').count();
                if commas > 0 {
                    slots += commas;
                    open_slot = false;
                }
            }
            Piece::Node { node, .. } if !node.is(kinds::COMMENT) => open_slot = true,
            Piece::Node { .. } => {}
        }
    }
    slots + usize::from(open_slot)
}
