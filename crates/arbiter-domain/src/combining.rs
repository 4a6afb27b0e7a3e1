//! Rule- and policy-combining algorithms.
//!
//! Every algorithm folds its children in document order. The status flags are
//! cleared before each child and read right after it, since the next child
//! overwrites them. On return the context carries:
//!
//! - the deciding child's flags, when a child's decision is returned as is;
//! - the union of all children's flags, when the result is Indeterminate;
//! - clean flags otherwise.

use crate::context::{EvalStatus, EvaluationContext};
use crate::error::EngineError;
use arbiter_types::{Decision, ids};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Something a combining algorithm can evaluate: a rule, policy or policy set.
pub trait Evaluable<'a> {
    fn evaluate(&'a self, ctx: &mut EvaluationContext<'a>) -> Result<Decision, EngineError>;
}

pub trait CombiningAlgorithm: Send + Sync {
    fn id(&self) -> &str;

    fn combine<'a>(
        &self,
        ctx: &mut EvaluationContext<'a>,
        children: &[&'a dyn Evaluable<'a>],
    ) -> Result<Decision, EngineError>;
}

/// Resolves combining algorithm ids the built-in registry does not know.
pub trait CombiningAlgorithmRepository: Send + Sync {
    fn get_algorithm(&self, id: &str) -> Option<Arc<dyn CombiningAlgorithm>>;
}

/// Evaluate one child with clean flags and return its decision and flags.
///
/// Missing-attribute details the child recorded are dropped again unless it
/// ends with the missing-attribute flag set.
pub fn evaluate_child<'a>(
    ctx: &mut EvaluationContext<'a>,
    child: &'a dyn Evaluable<'a>,
) -> Result<(Decision, EvalStatus), EngineError> {
    ctx.take_status();
    let mark = ctx.missing_attribute_mark();
    let decision = child.evaluate(ctx)?;
    let status = ctx.status();
    if !status.missing_attribute {
        ctx.truncate_missing_attributes(mark);
    }
    Ok((decision, status))
}

/// Like [`evaluate_child`], for algorithms that ignore the flags of a
/// NotApplicable child: its details are dropped as well.
fn evaluate_skippable_child<'a>(
    ctx: &mut EvaluationContext<'a>,
    child: &'a dyn Evaluable<'a>,
) -> Result<(Decision, EvalStatus), EngineError> {
    let mark = ctx.missing_attribute_mark();
    let (decision, status) = evaluate_child(ctx, child)?;
    if decision == Decision::NotApplicable {
        ctx.truncate_missing_attributes(mark);
    }
    Ok((decision, status))
}

#[derive(Clone, Copy, Debug)]
pub struct DenyOverrides {
    id: &'static str,
}

impl CombiningAlgorithm for DenyOverrides {
    fn id(&self) -> &str {
        self.id
    }

    fn combine<'a>(
        &self,
        ctx: &mut EvaluationContext<'a>,
        children: &[&'a dyn Evaluable<'a>],
    ) -> Result<Decision, EngineError> {
        let mut seen = EvalStatus::CLEAN;
        let mut at_least_one_error = false;
        let mut at_least_one_permit = false;
        for child in children {
            let (decision, status) = evaluate_child(ctx, *child)?;
            match decision {
                Decision::Deny => return Ok(Decision::Deny),
                Decision::Permit => at_least_one_permit = true,
                Decision::Indeterminate => at_least_one_error = true,
                Decision::NotApplicable => {}
            }
            if !status.is_clean() {
                at_least_one_error = true;
            }
            seen.merge(status);
        }

        if at_least_one_error {
            ctx.set_status(seen);
            return Ok(Decision::Indeterminate);
        }
        ctx.set_status(EvalStatus::CLEAN);
        Ok(if at_least_one_permit {
            Decision::Permit
        } else {
            Decision::NotApplicable
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PermitOverrides {
    id: &'static str,
}

impl CombiningAlgorithm for PermitOverrides {
    fn id(&self) -> &str {
        self.id
    }

    fn combine<'a>(
        &self,
        ctx: &mut EvaluationContext<'a>,
        children: &[&'a dyn Evaluable<'a>],
    ) -> Result<Decision, EngineError> {
        let mut seen = EvalStatus::CLEAN;
        let mut at_least_one_error = false;
        let mut at_least_one_deny = false;
        for child in children {
            let (decision, status) = evaluate_child(ctx, *child)?;
            match decision {
                Decision::Permit => {
                    // Errors seen before a Permit no longer matter.
                    ctx.set_status(EvalStatus::CLEAN);
                    return Ok(Decision::Permit);
                }
                Decision::Deny => at_least_one_deny = true,
                Decision::Indeterminate => at_least_one_error = true,
                Decision::NotApplicable => {}
            }
            if !status.is_clean() {
                at_least_one_error = true;
            }
            seen.merge(status);
        }

        if at_least_one_deny {
            ctx.set_status(EvalStatus::CLEAN);
            return Ok(Decision::Deny);
        }
        if at_least_one_error {
            ctx.set_status(seen);
            return Ok(Decision::Indeterminate);
        }
        ctx.set_status(EvalStatus::CLEAN);
        Ok(Decision::NotApplicable)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FirstApplicable {
    id: &'static str,
}

impl CombiningAlgorithm for FirstApplicable {
    fn id(&self) -> &str {
        self.id
    }

    fn combine<'a>(
        &self,
        ctx: &mut EvaluationContext<'a>,
        children: &[&'a dyn Evaluable<'a>],
    ) -> Result<Decision, EngineError> {
        for child in children {
            let (decision, _) = evaluate_skippable_child(ctx, *child)?;
            if decision != Decision::NotApplicable {
                return Ok(decision);
            }
        }
        ctx.set_status(EvalStatus::CLEAN);
        Ok(Decision::NotApplicable)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OnlyOneApplicable {
    id: &'static str,
}

impl CombiningAlgorithm for OnlyOneApplicable {
    fn id(&self) -> &str {
        self.id
    }

    fn combine<'a>(
        &self,
        ctx: &mut EvaluationContext<'a>,
        children: &[&'a dyn Evaluable<'a>],
    ) -> Result<Decision, EngineError> {
        let mut selected: Option<(Decision, EvalStatus)> = None;
        for child in children {
            let (decision, status) = evaluate_skippable_child(ctx, *child)?;
            if decision == Decision::NotApplicable {
                continue;
            }
            if let Some((_, first)) = selected {
                tracing::warn!(algorithm = self.id, "more than one applicable child");
                let mut seen = first;
                seen.merge(status);
                seen.processing_error = true;
                ctx.set_status(seen);
                return Ok(Decision::Indeterminate);
            }
            selected = Some((decision, status));
        }

        match selected {
            Some((decision, status)) => {
                ctx.set_status(status);
                Ok(decision)
            }
            None => {
                ctx.set_status(EvalStatus::CLEAN);
                Ok(Decision::NotApplicable)
            }
        }
    }
}

/// Built-in algorithms keyed by id, for both rule and policy combining.
pub struct CombiningAlgorithmRegistry {
    algorithms: BTreeMap<&'static str, Arc<dyn CombiningAlgorithm>>,
}

impl CombiningAlgorithmRegistry {
    pub fn builtin() -> &'static CombiningAlgorithmRegistry {
        static BUILTIN: OnceLock<CombiningAlgorithmRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let mut algorithms: BTreeMap<&'static str, Arc<dyn CombiningAlgorithm>> =
                BTreeMap::new();
            // The ordered variants fold identically; children are always
            // visited in document order.
            for id in [
                ids::RULE_DENY_OVERRIDES,
                ids::RULE_ORDERED_DENY_OVERRIDES,
                ids::POLICY_DENY_OVERRIDES,
                ids::POLICY_ORDERED_DENY_OVERRIDES,
            ] {
                algorithms.insert(id, Arc::new(DenyOverrides { id }));
            }
            for id in [
                ids::RULE_PERMIT_OVERRIDES,
                ids::RULE_ORDERED_PERMIT_OVERRIDES,
                ids::POLICY_PERMIT_OVERRIDES,
                ids::POLICY_ORDERED_PERMIT_OVERRIDES,
            ] {
                algorithms.insert(id, Arc::new(PermitOverrides { id }));
            }
            for id in [ids::RULE_FIRST_APPLICABLE, ids::POLICY_FIRST_APPLICABLE] {
                algorithms.insert(id, Arc::new(FirstApplicable { id }));
            }
            algorithms.insert(
                ids::POLICY_ONLY_ONE_APPLICABLE,
                Arc::new(OnlyOneApplicable {
                    id: ids::POLICY_ONLY_ONE_APPLICABLE,
                }),
            );
            CombiningAlgorithmRegistry { algorithms }
        })
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn CombiningAlgorithm>> {
        self.algorithms.get(id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.algorithms.keys().copied()
    }
}
