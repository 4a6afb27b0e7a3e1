use crate::combining::Evaluable;
use crate::context::{EvalStatus, EvaluationContext};
use crate::engine::Engine;
use crate::error::{EngineError, EvalError};
use crate::functions::{Function, function_id, invoke};
use crate::model::{
    Action, Apply, Attribute, AttributeDesignator, AttributeReference, AttributeValue, Category,
    ContextDocument, Environment, Expression, Match, Policy, PolicySet, PolicySetChild, Request,
    Resource, Rule, Subject, Target, TargetItem, TargetSection,
};
use crate::value::{DataType, EvaluationValue};
use arbiter_types::{Decision, Effect, Obligation, ids};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;
use time::macros::datetime;

pub fn fixed_clock() -> OffsetDateTime {
    datetime!(2024-06-01 09:30:00 UTC)
}

#[derive(Default)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, attributes: Vec<Attribute>) -> Self {
        self.request.subjects.push(Subject {
            attributes,
            ..Subject::default()
        });
        self
    }

    pub fn resource(mut self, resource: Resource) -> Self {
        self.request.resources.push(resource);
        self
    }

    pub fn resource_id(self, id: &str) -> Self {
        self.resource(Resource {
            attributes: vec![Attribute::string(ids::ATTR_RESOURCE_ID, id)],
            content: None,
        })
    }

    pub fn action(mut self, attributes: Vec<Attribute>) -> Self {
        self.request.action = Action { attributes };
        self
    }

    pub fn environment(mut self, attributes: Vec<Attribute>) -> Self {
        self.request.environment = Environment { attributes };
        self
    }

    pub fn build(self) -> ContextDocument {
        ContextDocument::new(self.request)
    }
}

/// Invoke a built-in function by short name against an empty request.
pub fn call(name: &str, args: &[EvaluationValue]) -> EvaluationValue {
    call_with_status(name, args).0
}

pub fn call_with_status(name: &str, args: &[EvaluationValue]) -> (EvaluationValue, EvalStatus) {
    let engine = Engine::new();
    let doc = ContextDocument::default();
    let mut ctx = EvaluationContext::new(&engine, &doc);
    let id = function_id(name);
    let function = engine
        .functions()
        .get_function(&id)
        .unwrap_or_else(|| panic!("no built-in function {id}"));
    let value = invoke(&mut ctx, function, args);
    (value, ctx.status())
}

/// Boolean function that accepts anything, answers `true` and counts calls.
pub struct CountingFunction {
    id: String,
    calls: Arc<AtomicUsize>,
}

impl CountingFunction {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Function for CountingFunction {
    fn id(&self) -> &str {
        &self.id
    }

    fn returns(&self) -> Option<DataType> {
        Some(DataType::Boolean)
    }

    fn arguments(&self) -> &[DataType] {
        &[]
    }

    fn var_args(&self) -> bool {
        true
    }

    fn evaluate(
        &self,
        _ctx: &mut EvaluationContext<'_>,
        _args: &[EvaluationValue],
    ) -> Result<EvaluationValue, EvalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(EvaluationValue::TRUE)
    }
}

/// Combining-algorithm child with a canned decision and flags.
#[derive(Clone, Copy, Debug)]
pub struct FixedChild {
    decision: Decision,
    status: EvalStatus,
}

impl FixedChild {
    pub const fn new(decision: Decision, status: EvalStatus) -> Self {
        Self { decision, status }
    }

    pub const fn ok(decision: Decision) -> Self {
        Self::new(decision, EvalStatus::CLEAN)
    }

    pub const fn missing(decision: Decision) -> Self {
        Self::new(
            decision,
            EvalStatus {
                missing_attribute: true,
                processing_error: false,
            },
        )
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }
}

impl<'a> Evaluable<'a> for FixedChild {
    fn evaluate(&'a self, ctx: &mut EvaluationContext<'a>) -> Result<Decision, EngineError> {
        let mut status = ctx.status();
        status.merge(self.status);
        ctx.set_status(status);
        Ok(self.decision)
    }
}

// --- expressions ---

pub fn apply(name: &str, arguments: Vec<Expression>) -> Apply {
    Apply {
        function_id: function_id(name),
        arguments,
    }
}

pub fn designator_expr(category: Category, id: &str, data_type: &str, required: bool) -> Expression {
    let mut designator = AttributeDesignator::new(category, id, data_type);
    designator.must_be_present = required;
    Expression::Designator(designator)
}

pub fn string_expr(value: &str) -> Expression {
    Expression::Value(AttributeValue::new(ids::DATA_TYPE_STRING, value))
}

// --- targets ---

pub fn string_match(category: Category, id: &str, value: &str) -> Match {
    Match {
        match_id: function_id("string-equal"),
        value: AttributeValue::new(ids::DATA_TYPE_STRING, value),
        attribute: AttributeReference::Designator(AttributeDesignator::new(
            category,
            id,
            ids::DATA_TYPE_STRING,
        )),
    }
}

pub fn target_item(matches: Vec<Match>) -> TargetItem {
    TargetItem { matches }
}

/// Target whose resource section matches exactly one resource id.
pub fn resource_target(resource_id: &str) -> Target {
    Target {
        resources: TargetSection::AnyOf(vec![target_item(vec![string_match(
            Category::Resource,
            ids::ATTR_RESOURCE_ID,
            resource_id,
        )])]),
        ..Target::default()
    }
}

// --- policies ---

pub fn permit_rule(id: &str) -> Rule {
    Rule {
        id: id.to_string(),
        description: None,
        effect: Effect::Permit,
        target: None,
        condition: None,
    }
}

pub fn deny_rule(id: &str) -> Rule {
    Rule {
        effect: Effect::Deny,
        ..permit_rule(id)
    }
}

pub fn policy(id: &str, algorithm: &str, rules: Vec<Rule>) -> Policy {
    Policy {
        id: id.to_string(),
        version: "1.0".to_string(),
        description: None,
        target: Target::default(),
        rule_combining_algorithm: algorithm.to_string(),
        variables: Vec::new(),
        rules,
        obligations: Vec::new(),
    }
}

pub fn policy_set(id: &str, algorithm: &str, policies: Vec<Policy>) -> PolicySet {
    PolicySet {
        policy_combining_algorithm: algorithm.to_string(),
        ..set_with_children(id, policies.into_iter().map(PolicySetChild::Policy).collect())
    }
}

/// Deny-overrides policy set over arbitrary children.
pub fn set_with_children(id: &str, children: Vec<PolicySetChild>) -> PolicySet {
    PolicySet {
        id: id.to_string(),
        version: "1.0".to_string(),
        description: None,
        target: Target::default(),
        policy_combining_algorithm: ids::POLICY_DENY_OVERRIDES.to_string(),
        children,
        obligations: Vec::new(),
    }
}

pub fn obligation(id: &str, fulfill_on: Effect) -> Obligation {
    Obligation {
        obligation_id: id.to_string(),
        fulfill_on,
        assignments: Vec::new(),
    }
}
