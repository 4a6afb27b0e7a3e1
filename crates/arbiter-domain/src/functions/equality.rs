use super::{FunctionRegistryBuilder, scalar_arg};
use crate::value::{DataType, EvaluationValue};

/// `{type}-equal` for every data type.
pub(super) fn register(builder: &mut FunctionRegistryBuilder) {
    for dt in DataType::ALL {
        builder.builtin(
            &format!("{}-equal", dt.short_name()),
            DataType::Boolean,
            &[dt, dt],
            false,
            |_, args| {
                let (a, b) = (scalar_arg(args, 0)?, scalar_arg(args, 1)?);
                Ok(EvaluationValue::from(a == b))
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::call;
    use crate::value::{EvaluationValue, Scalar};

    #[test]
    fn equal_compares_typed_values() {
        let a = EvaluationValue::Scalar(Scalar::Integer(7));
        assert_eq!(call("integer-equal", &[a.clone(), a.clone()]), EvaluationValue::TRUE);
        assert_eq!(
            call(
                "integer-equal",
                &[a, EvaluationValue::Scalar(Scalar::Integer(8))]
            ),
            EvaluationValue::FALSE
        );
    }
}
