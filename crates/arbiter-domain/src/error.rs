use thiserror::Error;

/// Evaluation-domain failure raised by a function body or a value conversion.
///
/// These never escape a function-invocation or selector boundary: the caller
/// converts them into the context's `processing_error` flag plus an
/// Indeterminate value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("value is indeterminate")]
    Indeterminate,

    #[error("argument {position}: cannot parse {value:?} as {data_type}")]
    Parse {
        position: usize,
        value: String,
        data_type: &'static str,
    },

    #[error("unknown data type: {0}")]
    UnknownDataType(String),

    #[error("argument {position}: expected {expected}, found {found}")]
    TypeMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("expected {expected} arguments, found {found}")]
    Arity { expected: String, found: usize },

    #[error("argument {0}: expected a bag")]
    ExpectedBag(usize),

    #[error("argument {0}: expected a single value, found a bag")]
    ExpectedScalar(usize),

    #[error("argument {0}: expected a function reference")]
    ExpectedFunction(usize),

    #[error("bag must contain exactly one value, found {0}")]
    NotOneAndOnly(usize),

    #[error("bag elements must be {expected}, found {found}")]
    MixedBag {
        expected: &'static str,
        found: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("selector query failed: {0}")]
    Selector(String),
}

/// Fatal failure that aborts the evaluation of a whole request.
///
/// Raised while building the runtime tree (references, combining algorithms)
/// or when a variable definition cannot terminate. `Engine::evaluate` turns it
/// into a single Indeterminate result with a processing-error status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unresolved policy reference: {0}")]
    UnresolvedPolicyReference(String),

    #[error("unresolved policy set reference: {0}")]
    UnresolvedPolicySetReference(String),

    #[error("no policy repository configured to resolve reference: {0}")]
    NoPolicyRepository(String),

    #[error("unknown combining algorithm: {0}")]
    UnknownCombiningAlgorithm(String),

    #[error("policy reference depth exceeds {limit} while resolving {reference}")]
    ReferenceDepthExceeded { limit: usize, reference: String },

    #[error("variable {variable_id} in policy {policy_id} references itself")]
    VariableCycle {
        policy_id: String,
        variable_id: String,
    },

    #[error("variable nesting exceeds {limit} while evaluating {variable_id}")]
    VariableDepthExceeded { limit: usize, variable_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        let err = EvalError::Parse {
            position: 1,
            value: "abc".to_string(),
            data_type: "integer",
        };
        assert_eq!(err.to_string(), "argument 1: cannot parse \"abc\" as integer");

        let err = EngineError::VariableCycle {
            policy_id: "p1".to_string(),
            variable_id: "v".to_string(),
        };
        assert_eq!(err.to_string(), "variable v in policy p1 references itself");
    }
}
