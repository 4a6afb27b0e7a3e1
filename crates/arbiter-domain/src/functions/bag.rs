use super::{FunctionRegistryBuilder, bag_arg, scalar_arg};
use crate::error::EvalError;
use crate::value::{Bag, DataType, EvaluationValue, Scalar};

/// Per data type: `one-and-only`, `bag-size`, `is-in` and the `bag` constructor.
pub(super) fn register(builder: &mut FunctionRegistryBuilder) {
    for dt in DataType::ALL {
        let name = dt.short_name();
        builder.builtin(&format!("{name}-one-and-only"), dt, &[dt], false, |_, args| {
            let bag = bag_arg(args, 0)?;
            match bag.values() {
                [only] => Ok(EvaluationValue::Scalar(only.clone())),
                values => Err(EvalError::NotOneAndOnly(values.len())),
            }
        });
        builder.builtin(
            &format!("{name}-bag-size"),
            DataType::Integer,
            &[dt],
            false,
            |_, args| {
                let size = bag_arg(args, 0)?.len();
                Ok(EvaluationValue::Scalar(Scalar::Integer(
                    i64::try_from(size).map_err(|_| EvalError::Overflow)?,
                )))
            },
        );
        builder.builtin(
            &format!("{name}-is-in"),
            DataType::Boolean,
            &[dt, dt],
            false,
            |_, args| {
                let value = scalar_arg(args, 0)?;
                Ok(EvaluationValue::from(bag_arg(args, 1)?.contains(value)))
            },
        );
        builder.builtin(&format!("{name}-bag"), dt, &[dt], true, move |_, args| {
            let mut bag = Bag::new(dt);
            for i in 0..args.len() {
                bag.push(scalar_arg(args, i)?.clone())?;
            }
            Ok(EvaluationValue::Bag(bag))
        });
    }
}
