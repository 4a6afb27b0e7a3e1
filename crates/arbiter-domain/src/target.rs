//! Target matching.
//!
//! Each of the four sections is either `Any` or a disjunction of items, each
//! item a conjunction of matches. Resources, actions and environments are
//! checked in that order and the first one that does not match decides the
//! result; subjects are only consulted once all three match.

use crate::context::EvaluationContext;
use crate::expression::evaluate_attribute_value;
use crate::functions::invoke;
use crate::model::{Match, Target, TargetItem, TargetSection};
use crate::resolver;
use crate::value::{DataType, EvaluationValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetEvaluationValue {
    Match,
    NoMatch,
    Indeterminate,
}

/// A match function that cannot be used for matching; it invalidates the
/// whole target.
struct InvalidMatchFunction;

pub fn evaluate_target<'a>(
    ctx: &mut EvaluationContext<'a>,
    target: &'a Target,
) -> TargetEvaluationValue {
    match evaluate_sections(ctx, target) {
        Ok(value) => value,
        Err(InvalidMatchFunction) => TargetEvaluationValue::Indeterminate,
    }
}

fn evaluate_sections<'a>(
    ctx: &mut EvaluationContext<'a>,
    target: &'a Target,
) -> Result<TargetEvaluationValue, InvalidMatchFunction> {
    for (name, section) in [
        ("resources", &target.resources),
        ("actions", &target.actions),
        ("environments", &target.environments),
    ] {
        let value = evaluate_section(ctx, section)?;
        if value != TargetEvaluationValue::Match {
            ctx.trace(format_args!("target {name}: {value:?}"));
            return Ok(value);
        }
    }
    evaluate_section(ctx, &target.subjects)
}

/// OR over items, stopping at the first matching item.
fn evaluate_section<'a>(
    ctx: &mut EvaluationContext<'a>,
    section: &'a TargetSection,
) -> Result<TargetEvaluationValue, InvalidMatchFunction> {
    let items = match section {
        TargetSection::Any => return Ok(TargetEvaluationValue::Match),
        TargetSection::AnyOf(items) => items,
    };
    let mut indeterminate = false;
    for item in items {
        match evaluate_item(ctx, item)? {
            TargetEvaluationValue::Match => return Ok(TargetEvaluationValue::Match),
            TargetEvaluationValue::NoMatch => {}
            TargetEvaluationValue::Indeterminate => indeterminate = true,
        }
    }
    Ok(if indeterminate {
        TargetEvaluationValue::Indeterminate
    } else {
        TargetEvaluationValue::NoMatch
    })
}

/// AND over matches; a NoMatch wins over an Indeterminate.
fn evaluate_item<'a>(
    ctx: &mut EvaluationContext<'a>,
    item: &'a TargetItem,
) -> Result<TargetEvaluationValue, InvalidMatchFunction> {
    let mut indeterminate = false;
    for m in &item.matches {
        match evaluate_match(ctx, m)? {
            TargetEvaluationValue::Match => {}
            TargetEvaluationValue::NoMatch => return Ok(TargetEvaluationValue::NoMatch),
            TargetEvaluationValue::Indeterminate => indeterminate = true,
        }
    }
    Ok(if indeterminate {
        TargetEvaluationValue::Indeterminate
    } else {
        TargetEvaluationValue::Match
    })
}

/// Match is true if the match function holds for `(value, element)` for any
/// element of the resolved bag.
fn evaluate_match<'a>(
    ctx: &mut EvaluationContext<'a>,
    m: &'a Match,
) -> Result<TargetEvaluationValue, InvalidMatchFunction> {
    let engine = ctx.engine();
    let Some(function) = engine.functions().get_function(&m.match_id) else {
        tracing::warn!(match_id = %m.match_id, "unknown match function");
        ctx.set_processing_error();
        return Err(InvalidMatchFunction);
    };
    if function.returns() != Some(DataType::Boolean) {
        tracing::warn!(match_id = %m.match_id, "match function does not return boolean");
        ctx.set_processing_error();
        return Err(InvalidMatchFunction);
    }

    let value = evaluate_attribute_value(ctx, &m.value);
    if value.is_indeterminate() {
        return Ok(TargetEvaluationValue::Indeterminate);
    }
    let Some(bag) = resolver::resolve_reference(ctx, &m.attribute) else {
        return Ok(TargetEvaluationValue::Indeterminate);
    };
    if bag.is_empty() {
        return Ok(if m.attribute.must_be_present() {
            TargetEvaluationValue::Indeterminate
        } else {
            TargetEvaluationValue::NoMatch
        });
    }

    let mut indeterminate = false;
    for element in &bag {
        let args = [value.clone(), EvaluationValue::Scalar(element.clone())];
        let outcome = invoke(ctx, function, &args);
        match outcome {
            EvaluationValue::Scalar(s) if s.as_bool() == Some(true) => {
                return Ok(TargetEvaluationValue::Match);
            }
            EvaluationValue::Scalar(s) if s.as_bool() == Some(false) => {}
            _ => indeterminate = true,
        }
    }
    Ok(if indeterminate {
        TargetEvaluationValue::Indeterminate
    } else {
        TargetEvaluationValue::NoMatch
    })
}
