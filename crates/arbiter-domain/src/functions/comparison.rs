use super::{FunctionRegistryBuilder, scalar_arg};
use crate::error::EvalError;
use crate::value::{DataType, EvaluationValue};
use std::cmp::Ordering;

const ORDERED: [DataType; 6] = [
    DataType::Integer,
    DataType::Double,
    DataType::String,
    DataType::Date,
    DataType::Time,
    DataType::DateTime,
];

type Test = fn(Ordering) -> bool;

const COMPARISONS: [(&str, Test); 4] = [
    ("greater-than", |o| o == Ordering::Greater),
    ("greater-than-or-equal", |o| o != Ordering::Less),
    ("less-than", |o| o == Ordering::Less),
    ("less-than-or-equal", |o| o != Ordering::Greater),
];

/// `{type}-greater-than` and friends for the totally ordered data types.
pub(super) fn register(builder: &mut FunctionRegistryBuilder) {
    for dt in ORDERED {
        for (suffix, test) in COMPARISONS {
            builder.builtin(
                &format!("{}-{suffix}", dt.short_name()),
                DataType::Boolean,
                &[dt, dt],
                false,
                move |_, args| {
                    let (a, b) = (scalar_arg(args, 0)?, scalar_arg(args, 1)?);
                    // NaN is the only incomparable pair; every comparison is false.
                    let outcome = match a.compare(b) {
                        Some(ordering) => test(ordering),
                        None if a.data_type() == b.data_type() => false,
                        None => {
                            return Err(EvalError::TypeMismatch {
                                position: 1,
                                expected: a.data_type().to_string(),
                                found: b.data_type().to_string(),
                            });
                        }
                    };
                    Ok(EvaluationValue::from(outcome))
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::call;
    use crate::value::{DataType, EvaluationValue, Scalar};

    fn date(s: &str) -> EvaluationValue {
        EvaluationValue::Scalar(DataType::Date.parse(s, 0).unwrap())
    }

    #[test]
    fn orders_dates_and_strings() {
        assert_eq!(
            call("date-less-than", &[date("2024-01-01"), date("2024-02-01")]),
            EvaluationValue::TRUE
        );
        assert_eq!(
            call("date-greater-than-or-equal", &[date("2024-01-01"), date("2024-01-01")]),
            EvaluationValue::TRUE
        );
        let s = |v: &str| EvaluationValue::Scalar(Scalar::String(v.to_string()));
        assert_eq!(call("string-greater-than", &[s("b"), s("a")]), EvaluationValue::TRUE);
    }

    #[test]
    fn nan_compares_false() {
        let nan = EvaluationValue::Scalar(Scalar::Double(f64::NAN));
        let one = EvaluationValue::Scalar(Scalar::Double(1.0));
        assert_eq!(call("double-less-than", &[nan.clone(), one.clone()]), EvaluationValue::FALSE);
        assert_eq!(call("double-greater-than-or-equal", &[nan, one]), EvaluationValue::FALSE);
    }
}
