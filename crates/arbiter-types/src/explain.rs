//! Explain registry for combining algorithms and status codes.
//!
//! Maps algorithm identifiers and status codes to human-readable explanations
//! with remediation guidance.

use crate::ids;

/// Explanation entry for a combining algorithm or status code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the algorithm/status.
    pub title: &'static str,
    /// What it means and when it is produced.
    pub description: &'static str,
    /// What a policy author can do about it.
    pub remediation: &'static str,
    /// Before/after policy fragments.
    pub examples: ExamplePair,
}

/// Before and after policy fragments (JSON document provider syntax).
#[derive(Debug, Clone)]
pub struct ExamplePair {
    pub before: &'static str,
    pub after: &'static str,
}

/// Look up an explanation by algorithm id or status code.
///
/// Both the full URN and the trailing short name are accepted
/// (`deny-overrides`, `missing-attribute`).
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        ids::RULE_DENY_OVERRIDES
        | ids::POLICY_DENY_OVERRIDES
        | ids::RULE_ORDERED_DENY_OVERRIDES
        | ids::POLICY_ORDERED_DENY_OVERRIDES
        | "deny-overrides"
        | "ordered-deny-overrides" => Some(explain_deny_overrides()),
        ids::RULE_PERMIT_OVERRIDES
        | ids::POLICY_PERMIT_OVERRIDES
        | ids::RULE_ORDERED_PERMIT_OVERRIDES
        | ids::POLICY_ORDERED_PERMIT_OVERRIDES
        | "permit-overrides"
        | "ordered-permit-overrides" => Some(explain_permit_overrides()),
        ids::RULE_FIRST_APPLICABLE | ids::POLICY_FIRST_APPLICABLE | "first-applicable" => {
            Some(explain_first_applicable())
        }
        ids::POLICY_ONLY_ONE_APPLICABLE | "only-one-applicable" => {
            Some(explain_only_one_applicable())
        }

        ids::STATUS_OK | "ok" => Some(explain_ok()),
        ids::STATUS_MISSING_ATTRIBUTE | "missing-attribute" => Some(explain_missing_attribute()),
        ids::STATUS_SYNTAX_ERROR | "syntax-error" => Some(explain_syntax_error()),
        ids::STATUS_PROCESSING_ERROR | "processing-error" => Some(explain_processing_error()),

        _ => None,
    }
}

/// List all known combining algorithm ids.
pub fn all_algorithm_ids() -> &'static [&'static str] {
    &[
        ids::RULE_DENY_OVERRIDES,
        ids::RULE_PERMIT_OVERRIDES,
        ids::RULE_FIRST_APPLICABLE,
        ids::RULE_ORDERED_DENY_OVERRIDES,
        ids::RULE_ORDERED_PERMIT_OVERRIDES,
        ids::POLICY_DENY_OVERRIDES,
        ids::POLICY_PERMIT_OVERRIDES,
        ids::POLICY_FIRST_APPLICABLE,
        ids::POLICY_ONLY_ONE_APPLICABLE,
        ids::POLICY_ORDERED_DENY_OVERRIDES,
        ids::POLICY_ORDERED_PERMIT_OVERRIDES,
    ]
}

/// List all known status codes.
pub fn all_status_codes() -> &'static [&'static str] {
    &[
        ids::STATUS_OK,
        ids::STATUS_MISSING_ATTRIBUTE,
        ids::STATUS_SYNTAX_ERROR,
        ids::STATUS_PROCESSING_ERROR,
    ]
}

// --- Combining algorithms ---

fn explain_deny_overrides() -> Explanation {
    Explanation {
        title: "Deny Overrides",
        description: "\
Children are evaluated in document order. The first Deny wins immediately.
Otherwise any Indeterminate child (or a child that hit a missing attribute or a
processing error) makes the result Indeterminate. Otherwise any Permit gives
Permit, and with no applicable child the result is NotApplicable.

The ordered variant folds the same way; evaluation order is always the
document order.",
        remediation: "\
Use deny-overrides when a single matching prohibition must never be masked by
a permission. Keep permissive rules free of error-prone conditions, since an
Indeterminate child blocks the Permit fallback.",
        examples: ExamplePair {
            before: r#"{ "rule_combining_algorithm": "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable" }"#,
            after: r#"{ "rule_combining_algorithm": "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:deny-overrides" }"#,
        },
    }
}

fn explain_permit_overrides() -> Explanation {
    Explanation {
        title: "Permit Overrides",
        description: "\
The first Permit wins immediately and discards errors seen in earlier children.
Otherwise Deny beats Indeterminate, and Indeterminate beats NotApplicable.",
        remediation: "\
Use permit-overrides for allow-lists where any matching grant is sufficient.
Place broad deny rules in a separate policy if they must not be overridden.",
        examples: ExamplePair {
            before: r#"{ "rule_combining_algorithm": "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:deny-overrides" }"#,
            after: r#"{ "rule_combining_algorithm": "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:permit-overrides" }"#,
        },
    }
}

fn explain_first_applicable() -> Explanation {
    Explanation {
        title: "First Applicable",
        description: "\
Children are evaluated in document order and the first decision that is not
NotApplicable is returned, including Indeterminate.",
        remediation: "\
Order children from most to least specific. A failing child early in the list
stops the scan, so guard conditions against missing attributes.",
        examples: ExamplePair {
            before: r#"{ "rules": [ { "id": "default-deny", "effect": "Deny" }, { "id": "owner", "effect": "Permit" } ] }"#,
            after: r#"{ "rules": [ { "id": "owner", "effect": "Permit" }, { "id": "default-deny", "effect": "Deny" } ] }"#,
        },
    }
}

fn explain_only_one_applicable() -> Explanation {
    Explanation {
        title: "Only One Applicable",
        description: "\
Exactly one child policy may apply. None gives NotApplicable, one gives that
child's decision, and two or more give Indeterminate.",
        remediation: "\
Make child policy targets mutually exclusive, for example by targeting
disjoint resource-id values.",
        examples: ExamplePair {
            before: r#"{ "target": { "resources": "any" } }"#,
            after: r#"{ "target": { "resources": { "any_of": [ { "matches": [ "..." ] } ] } } }"#,
        },
    }
}

// --- Status codes ---

fn explain_ok() -> Explanation {
    Explanation {
        title: "OK",
        description: "Evaluation finished without missing attributes or processing errors.",
        remediation: "Nothing to do.",
        examples: ExamplePair {
            before: r#"{ "status": { "code": "ok" } }"#,
            after: r#"{ "status": { "code": "ok" } }"#,
        },
    }
}

fn explain_missing_attribute() -> Explanation {
    Explanation {
        title: "Missing Attribute",
        description: "\
A designator or selector marked must_be_present resolved to an empty bag after
the request, the synthesized environment attributes and every configured
attribute repository were consulted. The status detail lists the references.",
        remediation: "\
Supply the attribute in the request, configure an attribute repository that
can provide it, or relax must_be_present when an empty bag is acceptable.",
        examples: ExamplePair {
            before: r#"{ "designator": { "category": "subject", "attribute_id": "urn:example:role", "data_type": "http://www.w3.org/2001/XMLSchema#string", "must_be_present": true } }"#,
            after: r#"{ "designator": { "category": "subject", "attribute_id": "urn:example:role", "data_type": "http://www.w3.org/2001/XMLSchema#string", "must_be_present": false } }"#,
        },
    }
}

fn explain_syntax_error() -> Explanation {
    Explanation {
        title: "Syntax Error",
        description: "\
The policy or request document was flagged invalid by its document provider.
The engine does not walk invalid documents.",
        remediation: "Validate the document against the published JSON schema and fix reported errors.",
        examples: ExamplePair {
            before: r#"{ "valid": false, "root": { "Policy": { "id": "p" } } }"#,
            after: r#"{ "root": { "Policy": { "id": "p", "rule_combining_algorithm": "..." } } }"#,
        },
    }
}

fn explain_processing_error() -> Explanation {
    Explanation {
        title: "Processing Error",
        description: "\
A function could not be resolved or rejected its arguments, a value failed to
parse under its data type, a selector query failed, or the policy tree could
not be built (unresolved reference, unknown combining algorithm, variable
cycle).",
        remediation: "\
Check function identifiers and argument data types. Make sure referenced
policies are on a configured search path.",
        examples: ExamplePair {
            before: r#"{ "apply": { "function_id": "urn:oasis:names:tc:xacml:1.0:function:string-equal", "arguments": [ { "value": { "data_type": "http://www.w3.org/2001/XMLSchema#integer", "value": "1" } } ] } }"#,
            after: r#"{ "apply": { "function_id": "urn:oasis:names:tc:xacml:1.0:function:integer-equal", "arguments": [ { "value": { "data_type": "http://www.w3.org/2001/XMLSchema#integer", "value": "1" } } ] } }"#,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_identifier_has_an_explanation() {
        for id in all_algorithm_ids().iter().chain(all_status_codes()) {
            let exp = lookup_explanation(id).unwrap_or_else(|| panic!("no explanation for {id}"));
            assert!(!exp.title.is_empty());
            assert!(!exp.remediation.is_empty());
        }
    }

    #[test]
    fn short_names_resolve() {
        assert_eq!(
            lookup_explanation("deny-overrides").map(|e| e.title),
            Some("Deny Overrides")
        );
        assert_eq!(
            lookup_explanation("missing-attribute").map(|e| e.title),
            Some("Missing Attribute")
        );
        assert!(lookup_explanation("nope").is_none());
    }
}
