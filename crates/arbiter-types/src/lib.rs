//! Stable DTOs and IDs used across the arbiter workspace.
//!
//! This crate is intentionally boring:
//! - decision, effect and status types shared by the engine and its callers
//! - the response envelope emitted by the CLI
//! - stable URN identifiers (data types, combining algorithms, status codes)
//! - explain registry for status codes and combining algorithms

#![forbid(unsafe_code)]

pub mod explain;
pub mod ids;
pub mod response;

pub use explain::{lookup_explanation, ExamplePair, Explanation};
pub use response::{
    AttributeAssignment, Decision, DecisionResult, Effect, MissingAttributeDetail, Obligation,
    Response, ResponseEnvelope, Status, StatusCode, ToolMeta, SCHEMA_RESPONSE_V1,
};
