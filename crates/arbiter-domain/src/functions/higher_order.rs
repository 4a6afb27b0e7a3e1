use super::{FunctionRegistryBuilder, bag_arg, function_arg, invoke};
use crate::context::EvaluationContext;
use crate::error::EvalError;
use crate::value::{DataType, EvaluationValue};

/// Apply the boolean function `id` to `(a, b)`.
fn apply_predicate(
    ctx: &mut EvaluationContext<'_>,
    id: &str,
    a: EvaluationValue,
    b: EvaluationValue,
) -> Result<bool, EvalError> {
    let engine = ctx.engine();
    let function = engine
        .functions()
        .get_function(id)
        .ok_or_else(|| EvalError::UnknownFunction(id.to_string()))?;
    if function.returns() != Some(DataType::Boolean) {
        return Err(EvalError::TypeMismatch {
            position: 0,
            expected: DataType::Boolean.to_string(),
            found: function
                .returns()
                .map_or_else(|| "undeclared".to_string(), |dt| dt.to_string()),
        });
    }
    invoke(ctx, function, &[a, b]).bool_value()
}

/// `any-of`, `all-of` and `any-of-any`.
///
/// These take a function reference as their first argument and validate
/// their own arguments, so they declare no positional types.
pub(super) fn register(builder: &mut FunctionRegistryBuilder) {
    builder.builtin("any-of", DataType::Boolean, &[], true, |ctx, args| {
        let id = function_arg(args, 0)?;
        let value = args.get(1).cloned().ok_or(EvalError::Arity {
            expected: "3".to_string(),
            found: args.len(),
        })?;
        for element in bag_arg(args, 2)? {
            if apply_predicate(ctx, id, value.clone(), element.clone().into())? {
                return Ok(EvaluationValue::TRUE);
            }
        }
        Ok(EvaluationValue::FALSE)
    });
    builder.builtin("all-of", DataType::Boolean, &[], true, |ctx, args| {
        let id = function_arg(args, 0)?;
        let value = args.get(1).cloned().ok_or(EvalError::Arity {
            expected: "3".to_string(),
            found: args.len(),
        })?;
        for element in bag_arg(args, 2)? {
            if !apply_predicate(ctx, id, value.clone(), element.clone().into())? {
                return Ok(EvaluationValue::FALSE);
            }
        }
        Ok(EvaluationValue::TRUE)
    });
    builder.builtin("any-of-any", DataType::Boolean, &[], true, |ctx, args| {
        let id = function_arg(args, 0)?;
        let (left, right) = (bag_arg(args, 1)?, bag_arg(args, 2)?);
        for a in left {
            for b in right {
                if apply_predicate(ctx, id, a.clone().into(), b.clone().into())? {
                    return Ok(EvaluationValue::TRUE);
                }
            }
        }
        Ok(EvaluationValue::FALSE)
    });
}

#[cfg(test)]
mod tests {
    use crate::functions::function_id;
    use crate::test_support::{call, call_with_status};
    use crate::value::{EvaluationValue, Scalar};

    fn s(v: &str) -> EvaluationValue {
        EvaluationValue::Scalar(Scalar::String(v.to_string()))
    }

    fn f(name: &str) -> EvaluationValue {
        EvaluationValue::Function(function_id(name))
    }

    #[test]
    fn any_of_and_all_of() {
        let bag = call("string-bag", &[s("a"), s("b")]);
        assert_eq!(
            call("any-of", &[f("string-equal"), s("b"), bag.clone()]),
            EvaluationValue::TRUE
        );
        assert_eq!(
            call("all-of", &[f("string-equal"), s("b"), bag.clone()]),
            EvaluationValue::FALSE
        );
        assert_eq!(
            call("all-of", &[f("string-less-than"), s("0"), bag]),
            EvaluationValue::TRUE
        );
    }

    #[test]
    fn any_of_any_pairs_every_element() {
        let left = call("string-bag", &[s("x"), s("y")]);
        let right = call("string-bag", &[s("z"), s("y")]);
        assert_eq!(
            call("any-of-any", &[f("string-equal"), left, right]),
            EvaluationValue::TRUE
        );
    }

    #[test]
    fn non_boolean_predicate_is_processing_error() {
        let bag = call("string-bag", &[s("a")]);
        let (value, status) =
            call_with_status("any-of", &[f("string-normalize-space"), s("a"), bag]);
        assert!(value.is_indeterminate());
        assert!(status.processing_error);
    }
}
