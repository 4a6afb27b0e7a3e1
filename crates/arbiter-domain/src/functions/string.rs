use super::{FunctionRegistryBuilder, str_arg};
use crate::value::{DataType, EvaluationValue, Scalar};

fn string(value: String) -> EvaluationValue {
    EvaluationValue::Scalar(Scalar::String(value))
}

pub(super) fn register(builder: &mut FunctionRegistryBuilder) {
    const STRING: DataType = DataType::String;

    builder.builtin("string-normalize-space", STRING, &[STRING], false, |_, args| {
        Ok(string(str_arg(args, 0)?.trim().to_string()))
    });
    builder.builtin("string-normalize-to-lower-case", STRING, &[STRING], false, |_, args| {
        Ok(string(str_arg(args, 0)?.to_lowercase()))
    });
    builder.builtin("string-concatenate", STRING, &[STRING, STRING], true, |_, args| {
        let mut out = String::new();
        for i in 0..args.len() {
            out.push_str(str_arg(args, i)?);
        }
        Ok(string(out))
    });
}
