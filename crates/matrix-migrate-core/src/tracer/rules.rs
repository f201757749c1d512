/*!
# Transformation Rules

Core trait and bookkeeping for transformation rules.
*/

use crate::syntax::SyntaxNode;
use super::{TransformResult, TransformationContext};

/// Core trait for transformation rules
///
/// The engine calls `matches` on every node after the node's children have
/// been rewritten, and `transform` only when it returned true. Rules record
/// each change they make on the context so the run stays auditable.
pub trait TransformationRule: Send + Sync {
    /// Human-readable name for this rule
    fn name(&self) -> &'static str;

    /// Detailed description of what this rule does
    fn description(&self) -> &'static str;

    /// Check if this rule applies to the given node
    fn matches(&self, node: &SyntaxNode, context: &TransformationContext) -> bool;

    /// Apply the transformation to the node
    ///
    /// Returns the rewritten node, or the original if nothing applied.
    fn transform(
        &self,
        node: SyntaxNode,
        context: &mut TransformationContext,
    ) -> TransformResult<SyntaxNode>;
}

/// Rule execution statistics
#[derive(Debug, Default, Clone)]
pub struct RuleStats {
    pub rule_name: String,
    pub applications: u64,
    pub transformations: u64,
    pub errors: u64,
}

impl RuleStats {
    pub fn new(rule_name: String) -> Self {
        Self {
            rule_name,
            applications: 0,
            transformations: 0,
            errors: 0,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.applications == 0 {
            0.0
        } else {
            (self.transformations as f64) / (self.applications as f64)
        }
    }
}
