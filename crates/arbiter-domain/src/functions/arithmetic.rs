use super::{FunctionRegistryBuilder, double_arg, integer_arg};
use crate::error::EvalError;
use crate::value::{DataType, EvaluationValue, Scalar};

fn integer(value: i64) -> EvaluationValue {
    EvaluationValue::Scalar(Scalar::Integer(value))
}

fn double(value: f64) -> EvaluationValue {
    EvaluationValue::Scalar(Scalar::Double(value))
}

pub(super) fn register(builder: &mut FunctionRegistryBuilder) {
    use DataType::{Double, Integer};

    builder.builtin("integer-add", Integer, &[Integer, Integer], true, |_, args| {
        if args.len() < 2 {
            return Err(EvalError::Arity {
                expected: "at least 2".to_string(),
                found: args.len(),
            });
        }
        let mut sum: i64 = 0;
        for i in 0..args.len() {
            sum = sum.checked_add(integer_arg(args, i)?).ok_or(EvalError::Overflow)?;
        }
        Ok(integer(sum))
    });
    builder.builtin("integer-subtract", Integer, &[Integer, Integer], false, |_, args| {
        let (a, b) = (integer_arg(args, 0)?, integer_arg(args, 1)?);
        Ok(integer(a.checked_sub(b).ok_or(EvalError::Overflow)?))
    });
    builder.builtin("integer-multiply", Integer, &[Integer, Integer], false, |_, args| {
        let (a, b) = (integer_arg(args, 0)?, integer_arg(args, 1)?);
        Ok(integer(a.checked_mul(b).ok_or(EvalError::Overflow)?))
    });
    builder.builtin("integer-divide", Integer, &[Integer, Integer], false, |_, args| {
        let (a, b) = (integer_arg(args, 0)?, integer_arg(args, 1)?);
        if b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        Ok(integer(a.checked_div(b).ok_or(EvalError::Overflow)?))
    });
    builder.builtin("integer-mod", Integer, &[Integer, Integer], false, |_, args| {
        let (a, b) = (integer_arg(args, 0)?, integer_arg(args, 1)?);
        if b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        Ok(integer(a.checked_rem(b).ok_or(EvalError::Overflow)?))
    });
    builder.builtin("integer-abs", Integer, &[Integer], false, |_, args| {
        Ok(integer(integer_arg(args, 0)?.checked_abs().ok_or(EvalError::Overflow)?))
    });

    builder.builtin("double-add", Double, &[Double, Double], true, |_, args| {
        if args.len() < 2 {
            return Err(EvalError::Arity {
                expected: "at least 2".to_string(),
                found: args.len(),
            });
        }
        let mut sum = 0.0;
        for i in 0..args.len() {
            sum += double_arg(args, i)?;
        }
        Ok(double(sum))
    });
    builder.builtin("double-subtract", Double, &[Double, Double], false, |_, args| {
        Ok(double(double_arg(args, 0)? - double_arg(args, 1)?))
    });
    builder.builtin("double-multiply", Double, &[Double, Double], false, |_, args| {
        Ok(double(double_arg(args, 0)? * double_arg(args, 1)?))
    });
    builder.builtin("double-divide", Double, &[Double, Double], false, |_, args| {
        let (a, b) = (double_arg(args, 0)?, double_arg(args, 1)?);
        if b == 0.0 {
            return Err(EvalError::DivisionByZero);
        }
        Ok(double(a / b))
    });
    builder.builtin("double-abs", Double, &[Double], false, |_, args| {
        Ok(double(double_arg(args, 0)?.abs()))
    });
    builder.builtin("round", Double, &[Double], false, |_, args| {
        Ok(double(double_arg(args, 0)?.round()))
    });
    builder.builtin("floor", Double, &[Double], false, |_, args| {
        Ok(double(double_arg(args, 0)?.floor()))
    });

    builder.builtin("integer-to-double", Double, &[Integer], false, |_, args| {
        Ok(double(integer_arg(args, 0)? as f64))
    });
    builder.builtin("double-to-integer", Integer, &[Double], false, |_, args| {
        let d = double_arg(args, 0)?.trunc();
        if !d.is_finite() || d < i64::MIN as f64 || d >= i64::MAX as f64 {
            return Err(EvalError::Overflow);
        }
        Ok(integer(d as i64))
    });
}
