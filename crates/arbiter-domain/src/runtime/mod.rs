//! Runtime tree.
//!
//! Built once per `Engine::evaluate` from the static document, wrapping the
//! model nodes 1:1. Combining algorithms are looked up and policy references
//! are resolved while the tree is built, so any failure there is fatal before
//! a single rule runs.

mod policy;
mod policy_set;
mod rule;

pub use policy::Policy;
pub use policy_set::PolicySet;
pub use rule::Rule;

use crate::combining::Evaluable;
use crate::context::EvaluationContext;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::model::{
    self, AttributeReference, Category, IdReference, PolicyElement, PolicySetChild, Target,
    TargetSection, compare_versions,
};
use arbiter_types::{Decision, ids};
use std::collections::BTreeSet;

/// Resolves policy and policy-set references.
pub trait PolicyRepository: Send + Sync {
    fn find_policy(&self, reference: &IdReference) -> Option<&model::Policy>;
    fn find_policy_set(&self, reference: &IdReference) -> Option<&model::PolicySet>;
}

/// Policies and policy sets held in memory. A reference resolves to the
/// highest version that satisfies its constraints.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPolicyRepository {
    policies: Vec<model::Policy>,
    policy_sets: Vec<model::PolicySet>,
}

impl InMemoryPolicyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: PolicyElement) {
        match element {
            PolicyElement::Policy(policy) => self.policies.push(policy),
            PolicyElement::PolicySet(set) => self.policy_sets.push(set),
        }
    }

    pub fn with(mut self, element: PolicyElement) -> Self {
        self.insert(element);
        self
    }

    pub fn len(&self) -> usize {
        self.policies.len() + self.policy_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<PolicyElement> for InMemoryPolicyRepository {
    fn from_iter<I: IntoIterator<Item = PolicyElement>>(iter: I) -> Self {
        let mut repo = Self::new();
        for element in iter {
            repo.insert(element);
        }
        repo
    }
}

fn best_match<'r, T>(
    candidates: &'r [T],
    reference: &IdReference,
    key: impl Fn(&T) -> (&str, &str),
) -> Option<&'r T> {
    candidates
        .iter()
        .filter(|c| {
            let (id, version) = key(c);
            id == reference.id && reference.accepts(version)
        })
        .max_by(|a, b| compare_versions(key(a).1, key(b).1))
}

impl PolicyRepository for InMemoryPolicyRepository {
    fn find_policy(&self, reference: &IdReference) -> Option<&model::Policy> {
        best_match(&self.policies, reference, |p| (p.id.as_str(), p.version.as_str()))
    }

    fn find_policy_set(&self, reference: &IdReference) -> Option<&model::PolicySet> {
        best_match(&self.policy_sets, reference, |s| (s.id.as_str(), s.version.as_str()))
    }
}

/// Root or child of a policy set.
pub enum PolicyNode<'a> {
    Policy(Policy<'a>),
    PolicySet(PolicySet<'a>),
}

impl<'a> PolicyNode<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            PolicyNode::Policy(p) => p.id(),
            PolicyNode::PolicySet(s) => s.id(),
        }
    }

    /// Resource ids named by resource-id matches anywhere below this node.
    pub fn all_resources(&self) -> &BTreeSet<String> {
        match self {
            PolicyNode::Policy(p) => p.all_resources(),
            PolicyNode::PolicySet(s) => s.all_resources(),
        }
    }
}

impl<'a> Evaluable<'a> for PolicyNode<'a> {
    fn evaluate(&'a self, ctx: &mut EvaluationContext<'a>) -> Result<Decision, EngineError> {
        match self {
            PolicyNode::Policy(p) => p.evaluate(ctx),
            PolicyNode::PolicySet(s) => s.evaluate(ctx),
        }
    }
}

/// Adds the literal values of resource-id matches in the resource section.
pub(crate) fn collect_resources(target: &Target, out: &mut BTreeSet<String>) {
    let TargetSection::AnyOf(items) = &target.resources else {
        return;
    };
    for m in items.iter().flat_map(|item| &item.matches) {
        if let AttributeReference::Designator(d) = &m.attribute
            && d.category == Category::Resource
            && d.attribute_id == ids::ATTR_RESOURCE_ID
        {
            out.insert(m.value.value.clone());
        }
    }
}

/// Builds the runtime tree for one evaluation.
pub struct TreeBuilder<'a> {
    engine: &'a Engine,
    next_key: usize,
    reference_depth: usize,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self {
            engine,
            next_key: 0,
            reference_depth: 0,
        }
    }

    pub fn build(&mut self, element: &'a PolicyElement) -> Result<PolicyNode<'a>, EngineError> {
        match element {
            PolicyElement::Policy(p) => Ok(PolicyNode::Policy(self.policy(p)?)),
            PolicyElement::PolicySet(s) => Ok(PolicyNode::PolicySet(self.policy_set(s)?)),
        }
    }

    fn policy(&mut self, doc: &'a model::Policy) -> Result<Policy<'a>, EngineError> {
        let algorithm = self
            .engine
            .combining_algorithm(&doc.rule_combining_algorithm)?;
        let key = self.next_key;
        self.next_key += 1;
        Ok(Policy::new(doc, key, algorithm))
    }

    fn policy_set(&mut self, doc: &'a model::PolicySet) -> Result<PolicySet<'a>, EngineError> {
        let algorithm = self
            .engine
            .combining_algorithm(&doc.policy_combining_algorithm)?;
        let mut children = Vec::with_capacity(doc.children.len());
        for child in &doc.children {
            let node = match child {
                PolicySetChild::Policy(p) => PolicyNode::Policy(self.policy(p)?),
                PolicySetChild::PolicySet(s) => PolicyNode::PolicySet(self.policy_set(s)?),
                PolicySetChild::PolicyIdReference(reference) => {
                    let policy = self.resolve(reference, |repo, r| repo.find_policy(r), false)?;
                    PolicyNode::Policy(self.policy(policy)?)
                }
                PolicySetChild::PolicySetIdReference(reference) => {
                    let set = self.resolve(reference, |repo, r| repo.find_policy_set(r), true)?;
                    self.reference_depth += 1;
                    let node = self.policy_set(set);
                    self.reference_depth -= 1;
                    PolicyNode::PolicySet(node?)
                }
            };
            children.push(node);
        }
        Ok(PolicySet::new(doc, algorithm, children))
    }

    fn resolve<T: ?Sized>(
        &self,
        reference: &IdReference,
        find: impl FnOnce(&'a dyn PolicyRepository, &IdReference) -> Option<&'a T>,
        is_set: bool,
    ) -> Result<&'a T, EngineError> {
        let limit = self.engine.options().max_reference_depth;
        if self.reference_depth >= limit {
            return Err(EngineError::ReferenceDepthExceeded {
                limit,
                reference: reference.id.clone(),
            });
        }
        let Some(repository) = self.engine.policy_repository() else {
            return Err(EngineError::NoPolicyRepository(reference.id.clone()));
        };
        match find(repository, reference) {
            Some(found) => {
                tracing::debug!(reference = %reference.id, "resolved policy reference");
                Ok(found)
            }
            None if is_set => Err(EngineError::UnresolvedPolicySetReference(
                reference.id.clone(),
            )),
            None => Err(EngineError::UnresolvedPolicyReference(reference.id.clone())),
        }
    }
}
