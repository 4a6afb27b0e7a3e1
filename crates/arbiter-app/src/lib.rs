//! Use case orchestration for arbiter.
//!
//! This crate provides the application layer: use cases that coordinate the domain, repo,
//! settings and render layers. It is intentionally thin and delegates heavy lifting to the
//! appropriate layers.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod evaluate;
mod explain;
mod render;
mod response;

pub use evaluate::{EvaluateInput, EvaluateOutput, decision_exit_code, run_evaluate};
pub use explain::{ExplainOutput, format_explanation, format_not_found, run_explain};
pub use render::{render_markdown, render_text};
pub use response::{parse_response_json, runtime_error_envelope, serialize_response, to_renderable};
