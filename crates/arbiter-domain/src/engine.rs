//! Engine entry point.
//!
//! An [`Engine`] holds the immutable collaborators (function registry,
//! attribute repositories, policy repository, content selector, clock) and is
//! shared freely between threads. Every call to [`Engine::evaluate`] builds
//! its own runtime tree and [`EvaluationContext`].

use crate::combining::{
    CombiningAlgorithm, CombiningAlgorithmRegistry, CombiningAlgorithmRepository, Evaluable,
};
use crate::context::EvaluationContext;
use crate::error::EngineError;
use crate::functions::{FunctionRegistry, FunctionRepository};
use crate::model::{ContextDocument, PolicyDocument, Resource};
use crate::resolver::AttributeRepository;
use crate::runtime::{PolicyNode, PolicyRepository, TreeBuilder};
use crate::selector::{ContentSelector, JsonPathSelector};
use arbiter_types::{Decision, DecisionResult, Response, Status, StatusCode};
use std::sync::Arc;
use time::OffsetDateTime;

/// Recursion limits applied while building and walking the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum nesting of variable references being evaluated at once.
    pub max_variable_depth: usize,
    /// Maximum nesting of policy-set references.
    pub max_reference_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_variable_depth: 64,
            max_reference_depth: 32,
        }
    }
}

#[derive(Clone)]
pub struct Engine {
    functions: Arc<dyn FunctionRepository>,
    attribute_repositories: Vec<Arc<dyn AttributeRepository>>,
    policy_repository: Option<Arc<dyn PolicyRepository>>,
    algorithm_repository: Option<Arc<dyn CombiningAlgorithmRepository>>,
    selector: Arc<dyn ContentSelector>,
    clock: fn() -> OffsetDateTime,
    options: EngineOptions,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with the built-in functions and no external repositories.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn functions(&self) -> &dyn FunctionRepository {
        self.functions.as_ref()
    }

    pub fn attribute_repositories(&self) -> &[Arc<dyn AttributeRepository>] {
        &self.attribute_repositories
    }

    pub fn policy_repository(&self) -> Option<&dyn PolicyRepository> {
        self.policy_repository.as_deref()
    }

    pub fn selector(&self) -> &dyn ContentSelector {
        self.selector.as_ref()
    }

    /// Current time as seen by `current-*` environment attributes.
    pub fn now(&self) -> OffsetDateTime {
        (self.clock)()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Built-in algorithms first, then the external repository.
    pub fn combining_algorithm(&self, id: &str) -> Result<Arc<dyn CombiningAlgorithm>, EngineError> {
        CombiningAlgorithmRegistry::builtin()
            .get(id)
            .or_else(|| {
                self.algorithm_repository
                    .as_ref()
                    .and_then(|repo| repo.get_algorithm(id))
            })
            .ok_or_else(|| EngineError::UnknownCombiningAlgorithm(id.to_string()))
    }

    /// Build the runtime tree for a policy document without evaluating it.
    pub fn build_tree<'a>(&'a self, policy: &'a PolicyDocument) -> Result<PolicyNode<'a>, EngineError> {
        TreeBuilder::new(self).build(&policy.root)
    }

    /// Evaluate `context` against `policy`.
    ///
    /// Never fails: invalid documents produce a SyntaxError result and fatal
    /// engine errors a single ProcessingError result.
    pub fn evaluate(&self, policy: &PolicyDocument, context: &ContextDocument) -> Response {
        if !policy.valid || !context.valid {
            tracing::warn!(
                policy_valid = policy.valid,
                context_valid = context.valid,
                "refusing to evaluate invalid document"
            );
            let which = if policy.valid { "request context" } else { "policy" };
            return Response {
                results: vec![DecisionResult::indeterminate(
                    StatusCode::SyntaxError,
                    format!("{which} document is not valid"),
                )],
            };
        }

        match self.evaluate_document(policy, context) {
            Ok(results) => Response { results },
            Err(err) => {
                tracing::warn!(error = %err, "evaluation aborted");
                Response {
                    results: vec![DecisionResult::indeterminate(
                        StatusCode::ProcessingError,
                        err.to_string(),
                    )],
                }
            }
        }
    }

    fn evaluate_document(
        &self,
        policy: &PolicyDocument,
        context: &ContextDocument,
    ) -> Result<Vec<DecisionResult>, EngineError> {
        let root = self.build_tree(policy)?;
        let mut ctx = EvaluationContext::new(self, context);
        let resources = &context.request.resources;

        if resources.is_empty() {
            return Ok(vec![evaluate_resource(&root, &mut ctx, Resource::default())?]);
        }

        let mut results = Vec::new();
        for resource in resources {
            let scope = resource.scope();
            if !scope.is_hierarchical() {
                results.push(evaluate_resource(&root, &mut ctx, resource.clone())?);
                break;
            }

            // Without a resource id there is nothing to expand from.
            let Some(requested) = resource.resource_id().filter(|id| !id.is_empty()) else {
                tracing::warn!(?scope, "hierarchical resource request without a resource id");
                results.push(evaluate_resource(&root, &mut ctx, resource.clone())?);
                continue;
            };
            let candidates: Vec<&String> = root
                .all_resources()
                .iter()
                .filter(|candidate| scope.covers(requested, candidate))
                .collect();
            tracing::debug!(
                resource = requested,
                ?scope,
                candidates = candidates.len(),
                "hierarchical resource request"
            );
            if candidates.is_empty() {
                results.push(evaluate_resource(&root, &mut ctx, resource.clone())?);
                continue;
            }
            for candidate in candidates {
                let expanded = resource.with_resource_id(candidate);
                results.push(evaluate_resource(&root, &mut ctx, expanded)?);
            }
        }
        Ok(results)
    }
}

fn evaluate_resource<'a>(
    root: &'a PolicyNode<'a>,
    ctx: &mut EvaluationContext<'a>,
    resource: Resource,
) -> Result<DecisionResult, EngineError> {
    let resource_id = resource.resource_id().map(str::to_string);
    ctx.begin_resource(resource);
    let decision = root.evaluate(ctx)?;

    let status = if ctx.is_missing_attribute() {
        Status {
            code: StatusCode::MissingAttribute,
            message: None,
            missing_attributes: ctx.missing_attributes().to_vec(),
        }
    } else if ctx.processing_error() {
        Status {
            code: StatusCode::ProcessingError,
            message: None,
            missing_attributes: Vec::new(),
        }
    } else {
        Status::ok()
    };
    let obligations = match decision {
        Decision::Permit | Decision::Deny => ctx.take_obligations(),
        Decision::NotApplicable | Decision::Indeterminate => Vec::new(),
    };

    tracing::debug!(
        resource = resource_id.as_deref().unwrap_or("-"),
        %decision,
        status = ?status.code,
        "resource evaluated"
    );
    Ok(DecisionResult {
        resource_id,
        decision,
        status,
        obligations,
    })
}

fn system_clock() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub struct EngineBuilder {
    functions: Option<Arc<dyn FunctionRepository>>,
    attribute_repositories: Vec<Arc<dyn AttributeRepository>>,
    policy_repository: Option<Arc<dyn PolicyRepository>>,
    algorithm_repository: Option<Arc<dyn CombiningAlgorithmRepository>>,
    selector: Option<Arc<dyn ContentSelector>>,
    clock: fn() -> OffsetDateTime,
    options: EngineOptions,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            functions: None,
            attribute_repositories: Vec::new(),
            policy_repository: None,
            algorithm_repository: None,
            selector: None,
            clock: system_clock,
            options: EngineOptions::default(),
        }
    }
}

impl EngineBuilder {
    /// Replace the built-in registry. Use `FunctionRegistry::builder()` to
    /// extend the built-ins rather than replace them.
    pub fn functions(mut self, functions: Arc<dyn FunctionRepository>) -> Self {
        self.functions = Some(functions);
        self
    }

    /// Append a repository; repositories are consulted in insertion order.
    pub fn attribute_repository(mut self, repository: impl AttributeRepository + 'static) -> Self {
        self.attribute_repositories.push(Arc::new(repository));
        self
    }

    pub fn policy_repository(mut self, repository: impl PolicyRepository + 'static) -> Self {
        self.policy_repository = Some(Arc::new(repository));
        self
    }

    pub fn algorithm_repository(
        mut self,
        repository: impl CombiningAlgorithmRepository + 'static,
    ) -> Self {
        self.algorithm_repository = Some(Arc::new(repository));
        self
    }

    pub fn selector(mut self, selector: impl ContentSelector + 'static) -> Self {
        self.selector = Some(Arc::new(selector));
        self
    }

    pub fn clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            functions: self
                .functions
                .unwrap_or_else(|| FunctionRegistry::builtin() as Arc<dyn FunctionRepository>),
            attribute_repositories: self.attribute_repositories,
            policy_repository: self.policy_repository,
            algorithm_repository: self.algorithm_repository,
            selector: self.selector.unwrap_or_else(|| Arc::new(JsonPathSelector)),
            clock: self.clock,
            options: self.options,
        }
    }
}
