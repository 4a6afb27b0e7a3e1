use super::{FunctionRegistryBuilder, bag_arg};
use crate::value::{Bag, DataType, EvaluationValue, Scalar};

fn distinct(values: impl IntoIterator<Item = Scalar>, data_type: DataType) -> Bag {
    let mut out = Bag::new(data_type);
    for v in values {
        if !out.contains(&v) {
            // Same data type as both inputs; signature validation guarantees it.
            let _ = out.push(v);
        }
    }
    out
}

fn subset(a: &Bag, b: &Bag) -> bool {
    a.iter().all(|v| b.contains(v))
}

/// Per data type: `intersection`, `union`, `at-least-one-member-of`, `subset`
/// and `set-equals`. Bags are treated as sets: results have no duplicates.
pub(super) fn register(builder: &mut FunctionRegistryBuilder) {
    for dt in DataType::ALL {
        let name = dt.short_name();
        builder.builtin(&format!("{name}-intersection"), dt, &[dt, dt], false, move |_, args| {
            let (a, b) = (bag_arg(args, 0)?, bag_arg(args, 1)?);
            let common = a.iter().filter(|v| b.contains(v)).cloned();
            Ok(EvaluationValue::Bag(distinct(common, dt)))
        });
        builder.builtin(&format!("{name}-union"), dt, &[dt, dt], false, move |_, args| {
            let (a, b) = (bag_arg(args, 0)?, bag_arg(args, 1)?);
            let all = a.iter().chain(b.iter()).cloned();
            Ok(EvaluationValue::Bag(distinct(all, dt)))
        });
        builder.builtin(
            &format!("{name}-at-least-one-member-of"),
            DataType::Boolean,
            &[dt, dt],
            false,
            |_, args| {
                let (a, b) = (bag_arg(args, 0)?, bag_arg(args, 1)?);
                Ok(EvaluationValue::from(a.iter().any(|v| b.contains(v))))
            },
        );
        builder.builtin(
            &format!("{name}-subset"),
            DataType::Boolean,
            &[dt, dt],
            false,
            |_, args| {
                let (a, b) = (bag_arg(args, 0)?, bag_arg(args, 1)?);
                Ok(EvaluationValue::from(subset(a, b)))
            },
        );
        builder.builtin(
            &format!("{name}-set-equals"),
            DataType::Boolean,
            &[dt, dt],
            false,
            |_, args| {
                let (a, b) = (bag_arg(args, 0)?, bag_arg(args, 1)?);
                Ok(EvaluationValue::from(subset(a, b) && subset(b, a)))
            },
        );
    }
}
