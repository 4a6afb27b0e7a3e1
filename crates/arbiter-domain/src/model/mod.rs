//! Static document model consumed by the engine.
//!
//! These types are plain data, produced by a document provider (the JSON
//! loader in `arbiter-repo`, or test builders) and never mutated during
//! evaluation.

mod policy;
mod request;
mod version;

pub use policy::{
    Apply, AttributeDesignator, AttributeReference, AttributeSelector, AttributeValue, Category,
    Expression, IdReference, Match, Policy, PolicyDocument, PolicyElement, PolicySet,
    PolicySetChild, Rule, Target, TargetItem, TargetSection, VariableDefinition,
};
pub use request::{
    Action, Attribute, ContextDocument, Environment, Request, Resource, ResourceScope, Subject,
};
pub use version::{compare_versions, version_matches};
