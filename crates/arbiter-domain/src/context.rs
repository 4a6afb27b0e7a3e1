//! Per-request evaluation state.
//!
//! One [`EvaluationContext`] is created per `Engine::evaluate` call and passed
//! by `&mut` down the whole evaluation. It carries the request, the resource
//! currently under evaluation, the policy and rule being visited, the two
//! sticky status flags, the variable memo table and the obligation
//! accumulator. None of its operations fail.

use crate::engine::Engine;
use crate::model::{ContextDocument, Request, Resource, VariableDefinition};
use crate::value::EvaluationValue;
use arbiter_types::{Effect, MissingAttributeDetail, Obligation};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Snapshot of the two sticky flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvalStatus {
    pub missing_attribute: bool,
    pub processing_error: bool,
}

impl EvalStatus {
    pub const CLEAN: EvalStatus = EvalStatus {
        missing_attribute: false,
        processing_error: false,
    };

    pub fn is_clean(self) -> bool {
        !self.missing_attribute && !self.processing_error
    }

    pub fn merge(&mut self, other: EvalStatus) {
        self.missing_attribute |= other.missing_attribute;
        self.processing_error |= other.processing_error;
    }
}

/// Variable definitions of one policy, keyed by variable id.
pub type VariableTable<'a> = BTreeMap<&'a str, &'a VariableDefinition>;

/// The policy whose variables are in scope.
#[derive(Clone, Copy, Debug)]
pub struct PolicyScope<'a> {
    /// Unique per runtime policy node within one evaluation.
    pub key: usize,
    pub policy_id: &'a str,
    pub variables: &'a VariableTable<'a>,
}

pub struct EvaluationContext<'a> {
    engine: &'a Engine,
    document: &'a ContextDocument,
    current_resource: Resource,
    current_policy: Option<PolicyScope<'a>>,
    current_policy_set: Option<&'a str>,
    current_rule: Option<&'a str>,
    status: EvalStatus,
    missing_attributes: Vec<MissingAttributeDetail>,
    obligations: Vec<Obligation>,
    variables: HashMap<(usize, &'a str), EvaluationValue>,
    variables_in_progress: Vec<(usize, &'a str)>,
    indent: usize,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(engine: &'a Engine, document: &'a ContextDocument) -> Self {
        let current_resource = document
            .request
            .resources
            .first()
            .cloned()
            .unwrap_or_default();
        Self {
            engine,
            document,
            current_resource,
            current_policy: None,
            current_policy_set: None,
            current_rule: None,
            status: EvalStatus::CLEAN,
            missing_attributes: Vec::new(),
            obligations: Vec::new(),
            variables: HashMap::new(),
            variables_in_progress: Vec::new(),
            indent: 0,
        }
    }

    pub fn engine(&self) -> &'a Engine {
        self.engine
    }

    pub fn request(&self) -> &'a Request {
        &self.document.request
    }

    pub fn current_resource(&self) -> &Resource {
        &self.current_resource
    }

    /// Start evaluating `resource`: swaps it in and clears everything that
    /// belongs to the previous resource's evaluation.
    pub fn begin_resource(&mut self, resource: Resource) {
        self.current_resource = resource;
        self.status = EvalStatus::CLEAN;
        self.missing_attributes.clear();
        self.obligations.clear();
        self.variables.clear();
        self.variables_in_progress.clear();
    }

    // --- current node slots ---

    pub fn current_policy(&self) -> Option<PolicyScope<'a>> {
        self.current_policy
    }

    /// Returns the previous scope, to be handed back to [`Self::restore_policy`].
    pub fn enter_policy(&mut self, scope: PolicyScope<'a>) -> Option<PolicyScope<'a>> {
        self.current_policy.replace(scope)
    }

    pub fn restore_policy(&mut self, previous: Option<PolicyScope<'a>>) {
        self.current_policy = previous;
    }

    pub fn current_policy_set(&self) -> Option<&'a str> {
        self.current_policy_set
    }

    pub fn enter_policy_set(&mut self, id: &'a str) -> Option<&'a str> {
        self.current_policy_set.replace(id)
    }

    pub fn restore_policy_set(&mut self, previous: Option<&'a str>) {
        self.current_policy_set = previous;
    }

    pub fn current_rule(&self) -> Option<&'a str> {
        self.current_rule
    }

    pub fn enter_rule(&mut self, id: &'a str) -> Option<&'a str> {
        self.current_rule.replace(id)
    }

    pub fn restore_rule(&mut self, previous: Option<&'a str>) {
        self.current_rule = previous;
    }

    // --- flags ---

    pub fn is_missing_attribute(&self) -> bool {
        self.status.missing_attribute
    }

    pub fn processing_error(&self) -> bool {
        self.status.processing_error
    }

    pub fn set_processing_error(&mut self) {
        self.status.processing_error = true;
    }

    /// Record a required attribute reference that resolved to nothing.
    pub fn add_missing_attribute(&mut self, detail: MissingAttributeDetail) {
        self.status.missing_attribute = true;
        if !self.missing_attributes.contains(&detail) {
            self.missing_attributes.push(detail);
        }
    }

    pub fn missing_attributes(&self) -> &[MissingAttributeDetail] {
        &self.missing_attributes
    }

    /// Current number of missing-attribute details, used as a rollback mark.
    pub fn missing_attribute_mark(&self) -> usize {
        self.missing_attributes.len()
    }

    pub fn truncate_missing_attributes(&mut self, mark: usize) {
        self.missing_attributes.truncate(mark);
    }

    pub fn status(&self) -> EvalStatus {
        self.status
    }

    /// Read and clear both flags.
    pub fn take_status(&mut self) -> EvalStatus {
        std::mem::take(&mut self.status)
    }

    pub fn set_status(&mut self, status: EvalStatus) {
        self.status = status;
    }

    // --- obligations ---

    /// Current length of the obligation accumulator, used as a rollback mark.
    pub fn obligation_mark(&self) -> usize {
        self.obligations.len()
    }

    pub fn push_obligations<I>(&mut self, obligations: I)
    where
        I: IntoIterator<Item = Obligation>,
    {
        self.obligations.extend(obligations);
    }

    /// Keep only obligations added after `mark` whose `fulfill_on` is `effect`.
    pub fn retain_obligations_since(&mut self, mark: usize, effect: Effect) {
        let mark = mark.min(self.obligations.len());
        let kept: Vec<Obligation> = self
            .obligations
            .drain(mark..)
            .filter(|o| o.fulfill_on == effect)
            .collect();
        self.obligations.extend(kept);
    }

    pub fn truncate_obligations(&mut self, mark: usize) {
        self.obligations.truncate(mark);
    }

    pub fn take_obligations(&mut self) -> Vec<Obligation> {
        std::mem::take(&mut self.obligations)
    }

    // --- variable memo table ---

    pub(crate) fn cached_variable(&self, key: (usize, &'a str)) -> Option<&EvaluationValue> {
        self.variables.get(&key)
    }

    pub(crate) fn cache_variable(&mut self, key: (usize, &'a str), value: EvaluationValue) {
        self.variables.insert(key, value);
    }

    pub(crate) fn variables_in_progress(&self) -> &[(usize, &'a str)] {
        &self.variables_in_progress
    }

    pub(crate) fn begin_variable(&mut self, key: (usize, &'a str)) {
        self.variables_in_progress.push(key);
    }

    pub(crate) fn end_variable(&mut self) {
        self.variables_in_progress.pop();
    }

    // --- diagnostics ---

    pub fn trace(&self, message: impl fmt::Display) {
        tracing::trace!(
            target: "arbiter::eval",
            "{:width$}{}",
            "",
            message,
            width = self.indent * 2
        );
    }

    pub fn add_indent(&mut self) {
        self.indent += 1;
    }

    pub fn remove_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }
}
