use super::Rule;
use crate::combining::{CombiningAlgorithm, Evaluable};
use crate::context::{EvaluationContext, PolicyScope, VariableTable};
use crate::error::EngineError;
use crate::model;
use crate::target::{TargetEvaluationValue, evaluate_target};
use arbiter_types::Decision;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Runtime wrapper around a policy: its rules, rule-combining algorithm and
/// variable definitions.
pub struct Policy<'a> {
    doc: &'a model::Policy,
    key: usize,
    algorithm: Arc<dyn CombiningAlgorithm>,
    rules: Vec<Rule<'a>>,
    variables: VariableTable<'a>,
    all_resources: BTreeSet<String>,
}

impl<'a> Policy<'a> {
    pub(crate) fn new(
        doc: &'a model::Policy,
        key: usize,
        algorithm: Arc<dyn CombiningAlgorithm>,
    ) -> Self {
        let rules: Vec<Rule<'a>> = doc.rules.iter().map(Rule::new).collect();
        let variables: VariableTable<'a> = doc
            .variables
            .iter()
            .map(|v| (v.variable_id.as_str(), v))
            .collect();

        let mut all_resources = BTreeSet::new();
        super::collect_resources(&doc.target, &mut all_resources);
        for rule in &rules {
            all_resources.extend(rule.all_resources().iter().cloned());
        }

        Self {
            doc,
            key,
            algorithm,
            rules,
            variables,
            all_resources,
        }
    }

    pub fn id(&self) -> &'a str {
        &self.doc.id
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

        let children: Vec<&'a dyn Evaluable<'a>> = self
            .rules
            .iter()
            .map(|rule| rule as &'a dyn Evaluable<'a>)
            .collect();
        let decision = self.algorithm.combine(ctx, &children)?;

        if let Some(effect) = decision.effect() {
            ctx.push_obligations(
                self.doc
                    .obligations
                    .iter()
                    .filter(|o| o.fulfill_on == effect)
                    .cloned(),
            );
        }
        Ok(decision)
    }
}

impl<'a> Evaluable<'a> for Policy<'a> {
    fn evaluate(&'a self, ctx: &mut EvaluationContext<'a>) -> Result<Decision, EngineError> {
        let previous = ctx.enter_policy(PolicyScope {
            key: self.key,
            policy_id: self.id(),
            variables: &self.variables,
        });
        ctx.trace(format_args!("policy {}", self.id()));
        ctx.add_indent();
        let decision = self.evaluate_body(ctx);
        ctx.remove_indent();
        ctx.restore_policy(previous);

        let decision = decision?;
        tracing::debug!(policy = self.id(), %decision, "policy evaluated");
        ctx.trace(format_args!("policy {} => {decision}", self.id()));
        Ok(decision)
    }
}
