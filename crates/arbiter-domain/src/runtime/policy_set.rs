use super::PolicyNode;
use crate::combining::{CombiningAlgorithm, Evaluable};
use crate::context::EvaluationContext;
use crate::error::EngineError;
use crate::model;
use crate::target::{TargetEvaluationValue, evaluate_target};
use arbiter_types::Decision;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Runtime wrapper around a policy set. References among its children have
/// already been resolved.
pub struct PolicySet<'a> {
    doc: &'a model::PolicySet,
    algorithm: Arc<dyn CombiningAlgorithm>,
    children: Vec<PolicyNode<'a>>,
    all_resources: BTreeSet<String>,
}

impl<'a> PolicySet<'a> {
    pub(crate) fn new(
        doc: &'a model::PolicySet,
        algorithm: Arc<dyn CombiningAlgorithm>,
        children: Vec<PolicyNode<'a>>,
    ) -> Self {
        let mut all_resources = BTreeSet::new();
        super::collect_resources(&doc.target, &mut all_resources);
        for child in &children {
            all_resources.extend(child.all_resources().iter().cloned());
        }
        Self {
            doc,
            algorithm,
            children,
            all_resources,
        }
    }

    pub fn id(&self) -> &'a str {
        &self.doc.id
    }

    pub fn children(&self) -> &[PolicyNode<'a>] {
        &self.children
    }

    pub fn all_resources(&self) -> &BTreeSet<String> {
        &self.all_resources
    }

    fn evaluate_body(&'a self, ctx: &mut EvaluationContext<'a>) -> Result<Decision, EngineError> {
        match evaluate_target(ctx, &self.doc.target) {
            TargetEvaluationValue::Match => {}
            TargetEvaluationValue::NoMatch => return Ok(Decision::NotApplicable),
            TargetEvaluationValue::Indeterminate => return Ok(Decision::Indeterminate),
        }

        let mark = ctx.obligation_mark();
        let children: Vec<&'a dyn Evaluable<'a>> = self
            .children
            .iter()
            .map(|child| child as &'a dyn Evaluable<'a>)
            .collect();
        let decision = self.algorithm.combine(ctx, &children)?;

        // Child obligations survive only when they agree with this outcome.
        match decision.effect() {
            Some(effect) => {
                ctx.retain_obligations_since(mark, effect);
                ctx.push_obligations(
                    self.doc
                        .obligations
                        .iter()
                        .filter(|o| o.fulfill_on == effect)
                        .cloned(),
                );
            }
            None => ctx.truncate_obligations(mark),
        }
        Ok(decision)
    }
}

impl<'a> Evaluable<'a> for PolicySet<'a> {
    fn evaluate(&'a self, ctx: &mut EvaluationContext<'a>) -> Result<Decision, EngineError> {
        let previous = ctx.enter_policy_set(self.id());
        ctx.trace(format_args!("policy set {}", self.id()));
        ctx.add_indent();
        let decision = self.evaluate_body(ctx);
        ctx.remove_indent();
        ctx.restore_policy_set(previous);

        let decision = decision?;
        tracing::debug!(policy_set = self.id(), %decision, "policy set evaluated");
        ctx.trace(format_args!("policy set {} => {decision}", self.id()));
        Ok(decision)
    }
}
