//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - combining-algorithm laws for arbitrary child sequences
//! - attribute resolution being repeatable within one context
//! - version pattern matching used by policy references

use crate::combining::{CombiningAlgorithmRegistry, Evaluable};
use crate::context::{EvalStatus, EvaluationContext};
use crate::engine::Engine;
use crate::model::{
    Attribute, AttributeDesignator, Category, ContextDocument, compare_versions, version_matches,
};
use crate::resolver::resolve_designator;
use crate::test_support::{FixedChild, RequestBuilder};
use arbiter_types::{Decision, ids};
use proptest::prelude::*;
use std::cmp::Ordering;

// ============================================================================
// Strategies
// ============================================================================

fn arb_decision() -> impl Strategy<Value = Decision> {
    prop_oneof![
        Just(Decision::Permit),
        Just(Decision::Deny),
        Just(Decision::NotApplicable),
        Just(Decision::Indeterminate),
    ]
}

/// Children whose flags are only raised alongside an Indeterminate decision,
/// the way real rules and policies behave.
fn arb_child() -> impl Strategy<Value = FixedChild> {
    (arb_decision(), any::<bool>(), any::<bool>()).prop_map(|(decision, missing, error)| {
        let status = if decision == Decision::Indeterminate {
            EvalStatus {
                missing_attribute: missing,
                processing_error: error,
            }
        } else {
            EvalStatus::CLEAN
        };
        FixedChild::new(decision, status)
    })
}

fn arb_children() -> impl Strategy<Value = Vec<FixedChild>> {
    prop::collection::vec(arb_child(), 0..8)
}

fn arb_version() -> impl Strategy<Value = String> {
    prop::collection::vec(0u32..20, 1..4).prop_map(|parts| {
        parts
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".")
    })
}

fn arb_role() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,8}").unwrap()
}

// ============================================================================
// Helpers
// ============================================================================

fn combine(id: &str, children: &[FixedChild]) -> (Decision, EvalStatus) {
    let engine = Engine::new();
    let doc = ContextDocument::default();
    let mut ctx = EvaluationContext::new(&engine, &doc);
    let algorithm = CombiningAlgorithmRegistry::builtin().get(id).unwrap();
    let refs: Vec<&dyn Evaluable<'_>> = children.iter().map(|c| c as &dyn Evaluable<'_>).collect();
    let decision = algorithm.combine(&mut ctx, &refs).unwrap();
    (decision, ctx.status())
}

fn count(children: &[FixedChild], decision: Decision) -> usize {
    children.iter().filter(|c| c.decision() == decision).count()
}

// ============================================================================
// Combining algorithms
// ============================================================================

proptest! {
    #[test]
    fn deny_overrides_is_deny_iff_any_child_denies(children in arb_children()) {
        let (decision, _) = combine(ids::RULE_DENY_OVERRIDES, &children);
        prop_assert_eq!(decision == Decision::Deny, count(&children, Decision::Deny) > 0);
    }

    #[test]
    fn permit_overrides_is_permit_iff_any_child_permits(children in arb_children()) {
        let (decision, status) = combine(ids::POLICY_PERMIT_OVERRIDES, &children);
        prop_assert_eq!(decision == Decision::Permit, count(&children, Decision::Permit) > 0);
        if decision == Decision::Permit {
            prop_assert!(status.is_clean());
        }
    }

    #[test]
    fn only_one_applicable_rejects_two_applicable_children(children in arb_children()) {
        let applicable = children.len() - count(&children, Decision::NotApplicable);
        let (decision, _) = combine(ids::POLICY_ONLY_ONE_APPLICABLE, &children);
        if applicable >= 2 {
            prop_assert_eq!(decision, Decision::Indeterminate);
        }
        if applicable == 0 {
            prop_assert_eq!(decision, Decision::NotApplicable);
        }
    }

    #[test]
    fn first_applicable_returns_first_applicable_child(children in arb_children()) {
        let expected = children
            .iter()
            .map(FixedChild::decision)
            .find(|d| *d != Decision::NotApplicable)
            .unwrap_or(Decision::NotApplicable);
        let (decision, _) = combine(ids::RULE_FIRST_APPLICABLE, &children);
        prop_assert_eq!(decision, expected);
    }

    #[test]
    fn interleaving_not_applicable_does_not_change_deny_overrides(
        children in arb_children(),
        padding in 0usize..4,
    ) {
        let mut padded = Vec::new();
        for child in &children {
            padded.extend(std::iter::repeat_n(FixedChild::ok(Decision::NotApplicable), padding));
            padded.push(*child);
        }
        prop_assert_eq!(
            combine(ids::RULE_DENY_OVERRIDES, &children).0,
            combine(ids::RULE_DENY_OVERRIDES, &padded).0
        );
    }
}

// ============================================================================
// Attribute resolution
// ============================================================================

proptest! {
    #[test]
    fn resolving_twice_yields_identical_bags(
        roles in prop::collection::vec(arb_role(), 0..6),
        required in any::<bool>(),
    ) {
        let attributes: Vec<Attribute> = roles
            .iter()
            .map(|r| Attribute::string("urn:example:role", r))
            .collect();
        let doc = RequestBuilder::new().subject(attributes).build();
        let engine = Engine::new();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let mut designator =
            AttributeDesignator::new(Category::Subject, "urn:example:role", ids::DATA_TYPE_STRING);
        designator.must_be_present = required;

        let first = resolve_designator(&mut ctx, &designator).unwrap();
        let second = resolve_designator(&mut ctx, &designator).unwrap();
        prop_assert_eq!(first.values(), second.values());
        prop_assert_eq!(first.len(), roles.len());
        prop_assert_eq!(ctx.is_missing_attribute(), required && roles.is_empty());
    }
}

// ============================================================================
// Versions
// ============================================================================

proptest! {
    #[test]
    fn version_matches_itself(version in arb_version()) {
        prop_assert!(version_matches(&version, &version));
    }

    #[test]
    fn trailing_plus_matches_any_extension(version in arb_version(), extra in arb_version()) {
        let extended = format!("{version}.{extra}");
        let pattern = format!("{version}.+");
        prop_assert!(version_matches(&pattern, &extended));
        prop_assert!(!version_matches(&pattern, &version));
    }

    #[test]
    fn version_ordering_is_antisymmetric(a in arb_version(), b in arb_version()) {
        prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
        prop_assert_eq!(compare_versions(&a, &a), Ordering::Equal);
    }
}
