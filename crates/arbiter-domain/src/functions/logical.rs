use super::{FunctionRegistryBuilder, bool_arg};
use crate::value::{DataType, EvaluationValue};

pub(super) fn register(builder: &mut FunctionRegistryBuilder) {
    use DataType::Boolean;

    // Arguments are already evaluated, so "short-circuit" only stops the scan.
    builder.builtin("and", Boolean, &[Boolean], true, |_, args| {
        for i in 0..args.len() {
            if !bool_arg(args, i)? {
                return Ok(EvaluationValue::FALSE);
            }
        }
        Ok(EvaluationValue::TRUE)
    });
    builder.builtin("or", Boolean, &[Boolean], true, |_, args| {
        for i in 0..args.len() {
            if bool_arg(args, i)? {
                return Ok(EvaluationValue::TRUE);
            }
        }
        Ok(EvaluationValue::FALSE)
    });
    builder.builtin("not", Boolean, &[Boolean], false, |_, args| {
        Ok(EvaluationValue::from(!bool_arg(args, 0)?))
    });
}
