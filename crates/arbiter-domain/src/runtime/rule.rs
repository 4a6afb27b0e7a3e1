use crate::combining::Evaluable;
use crate::context::EvaluationContext;
use crate::error::EngineError;
use crate::expression::evaluate_condition;
use crate::model;
use crate::target::{TargetEvaluationValue, evaluate_target};
use crate::value::EvaluationValue;
use arbiter_types::Decision;
use std::collections::BTreeSet;

/// Runtime wrapper around one rule of a policy.
pub struct Rule<'a> {
    doc: &'a model::Rule,
    all_resources: BTreeSet<String>,
}

impl<'a> Rule<'a> {
    pub(crate) fn new(doc: &'a model::Rule) -> Self {
        let mut all_resources = BTreeSet::new();
        if let Some(target) = &doc.target {
            super::collect_resources(target, &mut all_resources);
        }
        Self { doc, all_resources }
    }

    pub fn id(&self) -> &'a str {
        &self.doc.id
    }

    pub fn all_resources(&self) -> &BTreeSet<String> {
        &self.all_resources
    }

    fn evaluate_body(&'a self, ctx: &mut EvaluationContext<'a>) -> Result<Decision, EngineError> {
        if let Some(target) = &self.doc.target {
            match evaluate_target(ctx, target) {
                TargetEvaluationValue::Match => {}
                TargetEvaluationValue::NoMatch => return Ok(Decision::NotApplicable),
                TargetEvaluationValue::Indeterminate => return Ok(Decision::Indeterminate),
            }
        }

        let Some(condition) = &self.doc.condition else {
            return Ok(Decision::from(self.doc.effect));
        };
        let value = evaluate_condition(ctx, condition)?;
        let decision = match value {
            EvaluationValue::Scalar(s) if s.as_bool() == Some(true) => Decision::from(self.doc.effect),
            EvaluationValue::Scalar(s) if s.as_bool() == Some(false) => Decision::NotApplicable,
            EvaluationValue::Indeterminate => Decision::Indeterminate,
            other => {
                tracing::warn!(rule = self.id(), value = %other, "condition did not produce a boolean");
                ctx.set_processing_error();
                Decision::Indeterminate
            }
        };
        Ok(decision)
    }
}

impl<'a> Evaluable<'a> for Rule<'a> {
    fn evaluate(&'a self, ctx: &mut EvaluationContext<'a>) -> Result<Decision, EngineError> {
        let previous = ctx.enter_rule(self.id());
        ctx.trace(format_args!("rule {}", self.id()));
        ctx.add_indent();
        let decision = self.evaluate_body(ctx);
        ctx.remove_indent();
        ctx.restore_rule(previous);

        let decision = decision?;
        tracing::debug!(rule = self.id(), %decision, "rule evaluated");
        ctx.trace(format_args!("rule {} => {decision}", self.id()));
        Ok(decision)
    }
}
