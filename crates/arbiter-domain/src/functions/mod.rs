//! Function dispatch contract and the built-in function library.
//!
//! Functions are looked up by identifier in a flat map. The built-in
//! registry is built once on first use and is read-only afterwards; custom
//! functions are added through [`FunctionRegistry::builder`] before the
//! engine is constructed.

mod arithmetic;
mod bag;
mod comparison;
mod equality;
mod higher_order;
mod logical;
mod set;
mod string;

use crate::context::EvaluationContext;
use crate::error::EvalError;
use crate::value::{Bag, DataType, EvaluationValue, Scalar};
use arbiter_types::ids;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// A callable function.
///
/// `arguments` lists the declared positional types. With `var_args`, the last
/// declared type also applies to any number of trailing arguments (including
/// none). A function that declares no arguments and `var_args` validates its
/// own arguments, as the higher-order functions do.
pub trait Function: Send + Sync {
    fn id(&self) -> &str;

    /// Declared return type; `None` when undeclared.
    fn returns(&self) -> Option<DataType>;

    fn arguments(&self) -> &[DataType];

    fn var_args(&self) -> bool;

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        args: &[EvaluationValue],
    ) -> Result<EvaluationValue, EvalError>;
}

/// Lookup service consumed by the evaluator.
pub trait FunctionRepository: Send + Sync {
    fn get_function(&self, id: &str) -> Option<&dyn Function>;
}

pub struct FunctionRegistry {
    functions: BTreeMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    /// Shared registry holding the built-in library.
    pub fn builtin() -> Arc<FunctionRegistry> {
        static BUILTIN: OnceLock<Arc<FunctionRegistry>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| Arc::new(FunctionRegistryBuilder::with_builtins().build()))
            .clone()
    }

    /// Builder pre-populated with the built-in library.
    pub fn builder() -> FunctionRegistryBuilder {
        FunctionRegistryBuilder::with_builtins()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl FunctionRepository for FunctionRegistry {
    fn get_function(&self, id: &str) -> Option<&dyn Function> {
        self.functions.get(id).map(|f| f.as_ref())
    }
}

pub struct FunctionRegistryBuilder {
    functions: BTreeMap<String, Arc<dyn Function>>,
}

impl FunctionRegistryBuilder {
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    fn with_builtins() -> Self {
        let mut builder = Self::empty();
        equality::register(&mut builder);
        comparison::register(&mut builder);
        arithmetic::register(&mut builder);
        logical::register(&mut builder);
        string::register(&mut builder);
        bag::register(&mut builder);
        set::register(&mut builder);
        higher_order::register(&mut builder);
        builder
    }

    /// Add or replace a function under its own id.
    pub fn function<F: Function + 'static>(mut self, function: F) -> Self {
        self.insert(Arc::new(function));
        self
    }

    fn insert(&mut self, function: Arc<dyn Function>) {
        self.functions.insert(function.id().to_string(), function);
    }

    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry {
            functions: self.functions,
        }
    }
}

type Body = Box<
    dyn Fn(&mut EvaluationContext<'_>, &[EvaluationValue]) -> Result<EvaluationValue, EvalError>
        + Send
        + Sync,
>;

/// Built-in function backed by a closure.
pub(crate) struct Builtin {
    id: String,
    returns: Option<DataType>,
    arguments: Vec<DataType>,
    var_args: bool,
    body: Body,
}

impl Function for Builtin {
    fn id(&self) -> &str {
        &self.id
    }

    fn returns(&self) -> Option<DataType> {
        self.returns
    }

    fn arguments(&self) -> &[DataType] {
        &self.arguments
    }

    fn var_args(&self) -> bool {
        self.var_args
    }

    fn evaluate(
        &self,
        ctx: &mut EvaluationContext<'_>,
        args: &[EvaluationValue],
    ) -> Result<EvaluationValue, EvalError> {
        (self.body)(ctx, args)
    }
}

impl FunctionRegistryBuilder {
    pub(crate) fn builtin<F>(
        &mut self,
        name: &str,
        returns: DataType,
        arguments: &[DataType],
        var_args: bool,
        body: F,
    ) where
        F: Fn(&mut EvaluationContext<'_>, &[EvaluationValue]) -> Result<EvaluationValue, EvalError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(Arc::new(Builtin {
            id: function_id(name),
            returns: Some(returns),
            arguments: arguments.to_vec(),
            var_args,
            body: Box::new(body),
        }));
    }
}

/// Full identifier of a built-in function from its short name.
pub fn function_id(name: &str) -> String {
    format!("{}{name}", ids::FUNCTION_PREFIX)
}

/// Check `args` against the declared signature of `function`.
pub fn check_signature(function: &dyn Function, args: &[EvaluationValue]) -> Result<(), EvalError> {
    let declared = function.arguments();
    if function.var_args() {
        if declared.is_empty() {
            return Ok(());
        }
        let minimum = declared.len() - 1;
        if args.len() < minimum {
            return Err(EvalError::Arity {
                expected: format!("at least {minimum}"),
                found: args.len(),
            });
        }
    } else if args.len() != declared.len() {
        return Err(EvalError::Arity {
            expected: declared.len().to_string(),
            found: args.len(),
        });
    }

    for (position, arg) in args.iter().enumerate() {
        let expected = declared[position.min(declared.len() - 1)];
        if arg.data_type() != Some(expected) {
            return Err(EvalError::TypeMismatch {
                position,
                expected: expected.to_string(),
                found: describe(arg),
            });
        }
    }
    Ok(())
}

fn describe(value: &EvaluationValue) -> String {
    match value {
        EvaluationValue::Indeterminate => "Indeterminate".to_string(),
        EvaluationValue::Scalar(s) => s.data_type().to_string(),
        EvaluationValue::Bag(b) => format!("bag<{}>", b.data_type()),
        EvaluationValue::Function(_) => "function".to_string(),
    }
}

/// Validate and call `function`, converting failures into the
/// `processing_error` flag plus an Indeterminate value.
///
/// Does not look at the missing-attribute flag; see
/// [`crate::expression::evaluate_function`] for the short-circuiting entry.
pub fn invoke(
    ctx: &mut EvaluationContext<'_>,
    function: &dyn Function,
    args: &[EvaluationValue],
) -> EvaluationValue {
    let result = check_signature(function, args).and_then(|()| function.evaluate(ctx, args));
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(function = function.id(), error = %err, "function evaluation failed");
            ctx.trace(format_args!("{} failed: {err}", function.id()));
            ctx.set_processing_error();
            EvaluationValue::INDETERMINATE
        }
    }
}

// --- argument accessors shared by the built-in bodies ---

fn arg(args: &[EvaluationValue], position: usize) -> Result<&EvaluationValue, EvalError> {
    args.get(position).ok_or(EvalError::Arity {
        expected: format!("at least {}", position + 1),
        found: args.len(),
    })
}

pub(crate) fn scalar_arg(args: &[EvaluationValue], position: usize) -> Result<&Scalar, EvalError> {
    match arg(args, position)? {
        EvaluationValue::Scalar(s) => Ok(s),
        EvaluationValue::Indeterminate => Err(EvalError::Indeterminate),
        _ => Err(EvalError::ExpectedScalar(position)),
    }
}

pub(crate) fn bag_arg(args: &[EvaluationValue], position: usize) -> Result<&Bag, EvalError> {
    match arg(args, position)? {
        EvaluationValue::Bag(b) => Ok(b),
        EvaluationValue::Indeterminate => Err(EvalError::Indeterminate),
        _ => Err(EvalError::ExpectedBag(position)),
    }
}

pub(crate) fn function_arg(args: &[EvaluationValue], position: usize) -> Result<&str, EvalError> {
    match arg(args, position)? {
        EvaluationValue::Function(id) => Ok(id),
        _ => Err(EvalError::ExpectedFunction(position)),
    }
}

fn mismatch(position: usize, expected: DataType, found: &Scalar) -> EvalError {
    EvalError::TypeMismatch {
        position,
        expected: expected.to_string(),
        found: found.data_type().to_string(),
    }
}

pub(crate) fn bool_arg(args: &[EvaluationValue], position: usize) -> Result<bool, EvalError> {
    let s = scalar_arg(args, position)?;
    s.as_bool().ok_or_else(|| mismatch(position, DataType::Boolean, s))
}

pub(crate) fn integer_arg(args: &[EvaluationValue], position: usize) -> Result<i64, EvalError> {
    let s = scalar_arg(args, position)?;
    s.as_integer().ok_or_else(|| mismatch(position, DataType::Integer, s))
}

pub(crate) fn double_arg(args: &[EvaluationValue], position: usize) -> Result<f64, EvalError> {
    let s = scalar_arg(args, position)?;
    s.as_double().ok_or_else(|| mismatch(position, DataType::Double, s))
}

pub(crate) fn str_arg(args: &[EvaluationValue], position: usize) -> Result<&str, EvalError> {
    let s = scalar_arg(args, position)?;
    s.as_str().ok_or_else(|| mismatch(position, DataType::String, s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::model::ContextDocument;

    fn string(s: &str) -> EvaluationValue {
        EvaluationValue::Scalar(Scalar::String(s.to_string()))
    }

    #[test]
    fn builtin_registry_is_shared_and_populated() {
        let a = FunctionRegistry::builtin();
        let b = FunctionRegistry::builtin();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.get_function(&function_id("string-equal")).is_some());
        assert!(a.get_function(&function_id("any-of-any")).is_some());
        assert!(a.get_function("urn:example:nope").is_none());
    }

    #[test]
    fn signature_checks_positional_and_var_args() {
        let registry = FunctionRegistry::builtin();
        let equal = registry.get_function(&function_id("string-equal")).unwrap();
        assert!(check_signature(equal, &[string("a"), string("b")]).is_ok());
        assert!(matches!(
            check_signature(equal, &[string("a")]),
            Err(EvalError::Arity { .. })
        ));
        assert!(matches!(
            check_signature(equal, &[string("a"), EvaluationValue::Scalar(Scalar::Integer(1))]),
            Err(EvalError::TypeMismatch { position: 1, .. })
        ));
        assert!(matches!(
            check_signature(equal, &[string("a"), EvaluationValue::INDETERMINATE]),
            Err(EvalError::TypeMismatch { position: 1, .. })
        ));

        let and = registry.get_function(&function_id("and")).unwrap();
        assert!(check_signature(and, &[]).is_ok());
        assert!(check_signature(and, &[EvaluationValue::TRUE, EvaluationValue::FALSE, EvaluationValue::TRUE]).is_ok());
        assert!(check_signature(and, &[EvaluationValue::TRUE, string("x")]).is_err());
    }

    #[test]
    fn invoke_converts_errors_to_processing_error() {
        let engine = Engine::new();
        let doc = ContextDocument::default();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let registry = FunctionRegistry::builtin();
        let divide = registry.get_function(&function_id("integer-divide")).unwrap();
        let args = [
            EvaluationValue::Scalar(Scalar::Integer(1)),
            EvaluationValue::Scalar(Scalar::Integer(0)),
        ];
        assert!(invoke(&mut ctx, divide, &args).is_indeterminate());
        assert!(ctx.processing_error());
    }

    #[test]
    fn builder_adds_custom_functions() {
        struct AlwaysTrue;
        impl Function for AlwaysTrue {
            fn id(&self) -> &str {
                "urn:example:always-true"
            }
            fn returns(&self) -> Option<DataType> {
                Some(DataType::Boolean)
            }
            fn arguments(&self) -> &[DataType] {
                &[]
            }
            fn var_args(&self) -> bool {
                false
            }
            fn evaluate(
                &self,
                _ctx: &mut EvaluationContext<'_>,
                _args: &[EvaluationValue],
            ) -> Result<EvaluationValue, EvalError> {
                Ok(EvaluationValue::TRUE)
            }
        }

        let registry = FunctionRegistry::builder().function(AlwaysTrue).build();
        assert!(registry.get_function("urn:example:always-true").is_some());
        assert!(registry.len() > FunctionRegistryBuilder::empty().build().len());
    }
}
