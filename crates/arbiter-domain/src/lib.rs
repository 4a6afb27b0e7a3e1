//! Pure attribute-based access-control evaluation (no IO).
//!
//! Input: an already-parsed policy document and request context.
//! Output: a [`Response`](arbiter_types::Response) with one decision per
//! evaluated resource, its status and its obligations.

#![forbid(unsafe_code)]

pub mod combining;
pub mod context;
pub mod error;
pub mod expression;
pub mod functions;
pub mod model;
pub mod resolver;
pub mod runtime;
pub mod selector;
pub mod target;
pub mod value;

mod engine;

#[cfg(test)]
mod proptest;
#[cfg(test)]
pub(crate) mod test_support;

pub use combining::{CombiningAlgorithm, CombiningAlgorithmRepository, Evaluable};
pub use context::{EvalStatus, EvaluationContext};
pub use engine::{Engine, EngineBuilder, EngineOptions};
pub use error::{EngineError, EvalError};
pub use functions::{Function, FunctionRegistry, FunctionRepository};
pub use resolver::{AttributeRepository, StaticAttribute, StaticAttributeRepository};
pub use runtime::{InMemoryPolicyRepository, PolicyRepository};
pub use selector::{ContentSelector, JsonPathSelector};
pub use value::{Bag, DataType, EvaluationValue, Scalar};
