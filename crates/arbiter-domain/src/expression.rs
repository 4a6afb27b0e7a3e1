//! Expression evaluation: applies, conditions, variables.
//!
//! Arguments are evaluated left to right and all of them are evaluated even
//! when an earlier one is Indeterminate. A `must_be_present` designator or
//! selector that resolves to an empty bag is *absent*: it is not added to the
//! argument list at all, and the missing-attribute flag it raised makes the
//! enclosing function call return Indeterminate without being invoked.

use crate::context::EvaluationContext;
use crate::error::EngineError;
use crate::functions::{Function, invoke};
use crate::model::{Apply, AttributeValue, Expression};
use crate::resolver;
use crate::value::{Bag, DataType, EvaluationValue};

pub fn evaluate_apply<'a>(
    ctx: &mut EvaluationContext<'a>,
    apply: &'a Apply,
) -> Result<EvaluationValue, EngineError> {
    apply_function(ctx, apply, false)
}

/// Evaluate a rule condition.
///
/// The function must declare a Boolean return type. A `false` result is only
/// trusted when no attribute went missing during the evaluation; otherwise it
/// becomes Indeterminate.
pub fn evaluate_condition<'a>(
    ctx: &mut EvaluationContext<'a>,
    condition: &'a Apply,
) -> Result<EvaluationValue, EngineError> {
    let value = apply_function(ctx, condition, true)?;
    if value == EvaluationValue::FALSE && ctx.is_missing_attribute() {
        ctx.trace("condition is false with a missing attribute: Indeterminate");
        return Ok(EvaluationValue::INDETERMINATE);
    }
    Ok(value)
}

fn apply_function<'a>(
    ctx: &mut EvaluationContext<'a>,
    apply: &'a Apply,
    condition: bool,
) -> Result<EvaluationValue, EngineError> {
    let engine = ctx.engine();
    let Some(function) = engine.functions().get_function(&apply.function_id) else {
        tracing::warn!(function = %apply.function_id, "unknown function");
        ctx.trace(format_args!("unknown function {}", apply.function_id));
        ctx.set_processing_error();
        return Ok(EvaluationValue::INDETERMINATE);
    };
    if condition && function.returns() != Some(DataType::Boolean) {
        tracing::warn!(function = %apply.function_id, "condition function does not return boolean");
        ctx.set_processing_error();
        return Ok(EvaluationValue::INDETERMINATE);
    }

    ctx.trace(format_args!("apply {}", apply.function_id));
    ctx.add_indent();
    let args = process_arguments(ctx, &apply.arguments);
    ctx.remove_indent();
    let args = args?;

    let value = evaluate_function(ctx, function, &args);
    ctx.trace(format_args!("{} => {value}", apply.function_id));
    Ok(value)
}

/// Evaluate the argument expressions of an apply, left to right.
pub fn process_arguments<'a>(
    ctx: &mut EvaluationContext<'a>,
    arguments: &'a [Expression],
) -> Result<Vec<EvaluationValue>, EngineError> {
    let mut args = Vec::with_capacity(arguments.len());
    for expression in arguments {
        match expression {
            Expression::Apply(apply) => args.push(evaluate_apply(ctx, apply)?),
            Expression::Function { function_id } => {
                args.push(EvaluationValue::Function(function_id.clone()));
            }
            Expression::Value(value) => args.push(evaluate_attribute_value(ctx, value)),
            Expression::Designator(designator) => {
                let resolved = resolver::resolve_designator(ctx, designator);
                push_resolved(&mut args, resolved, designator.must_be_present);
            }
            Expression::Selector(selector) => {
                let resolved = resolver::resolve_selector(ctx, selector);
                push_resolved(&mut args, resolved, selector.must_be_present);
            }
            Expression::VariableReference { variable_id } => {
                args.push(resolve_variable(ctx, variable_id)?);
            }
        }
    }
    Ok(args)
}

fn push_resolved(args: &mut Vec<EvaluationValue>, resolved: Option<Bag>, must_be_present: bool) {
    match resolved {
        Some(bag) if bag.is_empty() && must_be_present => {}
        Some(bag) => args.push(EvaluationValue::Bag(bag)),
        None => args.push(EvaluationValue::INDETERMINATE),
    }
}

/// Dispatch a call, short-circuiting when an attribute is already missing.
pub fn evaluate_function(
    ctx: &mut EvaluationContext<'_>,
    function: &dyn Function,
    args: &[EvaluationValue],
) -> EvaluationValue {
    if ctx.is_missing_attribute() {
        ctx.trace(format_args!("{} skipped: missing attribute", function.id()));
        return EvaluationValue::INDETERMINATE;
    }
    invoke(ctx, function, args)
}

/// Parse a literal; a malformed literal is a processing error.
pub fn evaluate_attribute_value(
    ctx: &mut EvaluationContext<'_>,
    value: &AttributeValue,
) -> EvaluationValue {
    let parsed = match DataType::from_uri(&value.data_type) {
        Some(data_type) => data_type.parse(&value.value, 0).map_err(|e| e.to_string()),
        None => Err(format!("unknown data type {}", value.data_type)),
    };
    match parsed {
        Ok(scalar) => EvaluationValue::Scalar(scalar),
        Err(message) => {
            tracing::warn!(value = %value.value, error = %message, "invalid attribute value");
            ctx.set_processing_error();
            EvaluationValue::INDETERMINATE
        }
    }
}

/// Resolve a variable reference in the current policy, evaluating and
/// memoizing the definition on first use.
pub fn resolve_variable<'a>(
    ctx: &mut EvaluationContext<'a>,
    variable_id: &str,
) -> Result<EvaluationValue, EngineError> {
    let Some(scope) = ctx.current_policy() else {
        tracing::warn!(variable_id, "variable reference outside of a policy");
        ctx.set_processing_error();
        return Ok(EvaluationValue::INDETERMINATE);
    };
    let Some(definition) = scope.variables.get(variable_id).copied() else {
        tracing::warn!(variable_id, policy_id = scope.policy_id, "undefined variable");
        ctx.set_processing_error();
        return Ok(EvaluationValue::INDETERMINATE);
    };

    let key = (scope.key, definition.variable_id.as_str());
    if let Some(value) = ctx.cached_variable(key) {
        return Ok(value.clone());
    }
    if ctx.variables_in_progress().contains(&key) {
        return Err(EngineError::VariableCycle {
            policy_id: scope.policy_id.to_string(),
            variable_id: definition.variable_id.clone(),
        });
    }
    let limit = ctx.engine().options().max_variable_depth;
    if ctx.variables_in_progress().len() >= limit {
        return Err(EngineError::VariableDepthExceeded {
            limit,
            variable_id: definition.variable_id.clone(),
        });
    }

    ctx.trace(format_args!("variable {}", definition.variable_id));
    ctx.begin_variable(key);
    let value = evaluate_variable_expression(ctx, &definition.expression);
    ctx.end_variable();
    let value = value?;

    ctx.cache_variable(key, value.clone());
    Ok(value)
}

/// Literals, designators and selectors are evaluated inline; only applies go
/// through the function machinery.
fn evaluate_variable_expression<'a>(
    ctx: &mut EvaluationContext<'a>,
    expression: &'a Expression,
) -> Result<EvaluationValue, EngineError> {
    let value = match expression {
        Expression::Apply(apply) => evaluate_apply(ctx, apply)?,
        Expression::Function { function_id } => EvaluationValue::Function(function_id.clone()),
        Expression::Value(value) => evaluate_attribute_value(ctx, value),
        Expression::Designator(designator) => resolver::resolve_designator(ctx, designator)
            .map_or(EvaluationValue::INDETERMINATE, EvaluationValue::Bag),
        Expression::Selector(selector) => resolver::resolve_selector(ctx, selector)
            .map_or(EvaluationValue::INDETERMINATE, EvaluationValue::Bag),
        Expression::VariableReference { variable_id } => resolve_variable(ctx, variable_id)?,
    };
    Ok(value)
}
