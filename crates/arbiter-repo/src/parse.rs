use anyhow::Context;
use arbiter_domain::model::{ContextDocument, PolicyDocument, PolicyElement, PolicySetChild};
use serde_json::Value;
use std::collections::BTreeSet;

/// Parse a policy document.
///
/// Accepts either the full document form (`{"valid": .., "root": {..}}`) or a
/// bare element (`{"Policy": {..}}` / `{"PolicySet": {..}}`). Structural
/// problems do not fail the parse; they clear the `valid` flag.
pub fn parse_policy_document(text: &str) -> anyhow::Result<PolicyDocument> {
    let value: Value = serde_json::from_str(text).context("parse policy JSON")?;
    let mut document = if value.get("root").is_some() {
        serde_json::from_value::<PolicyDocument>(value).context("decode policy document")?
    } else {
        let root = serde_json::from_value::<PolicyElement>(value).context("decode policy element")?;
        PolicyDocument::new(root)
    };
    if !policy_problems(&document.root).is_empty() {
        document.valid = false;
    }
    Ok(document)
}

/// Parse a bare policy or policy set, failing on structural problems.
pub fn parse_policy_element(text: &str) -> anyhow::Result<PolicyElement> {
    let document = parse_policy_document(text)?;
    let problems = policy_problems(&document.root);
    if !problems.is_empty() {
        anyhow::bail!("invalid policy {}: {}", document.root.id(), problems.join("; "));
    }
    Ok(document.root)
}

/// Parse a request context document.
///
/// Accepts either `{"valid": .., "request": {..}}` or a bare request.
pub fn parse_context_document(text: &str) -> anyhow::Result<ContextDocument> {
    let value: Value = serde_json::from_str(text).context("parse request JSON")?;
    let mut document = if value.get("request").is_some() {
        serde_json::from_value::<ContextDocument>(value).context("decode request document")?
    } else {
        ContextDocument::new(serde_json::from_value(value).context("decode request")?)
    };
    let request = &document.request;
    let empty_id = request
        .subjects
        .iter()
        .flat_map(|s| &s.attributes)
        .chain(request.resources.iter().flat_map(|r| &r.attributes))
        .chain(&request.action.attributes)
        .chain(&request.environment.attributes)
        .any(|a| a.attribute_id.is_empty() || a.data_type.is_empty());
    if empty_id {
        document.valid = false;
    }
    Ok(document)
}

/// Structural checks serde cannot express: non-empty ids and unique rule ids.
pub fn policy_problems(element: &PolicyElement) -> Vec<String> {
    let mut problems = Vec::new();
    match element {
        PolicyElement::Policy(policy) => check_policy(policy, &mut problems),
        PolicyElement::PolicySet(set) => check_set(set, &mut problems),
    }
    problems
}

fn check_policy(policy: &arbiter_domain::model::Policy, problems: &mut Vec<String>) {
    if policy.id.is_empty() {
        problems.push("policy with empty id".to_string());
    }
    let mut seen = BTreeSet::new();
    for rule in &policy.rules {
        if rule.id.is_empty() {
            problems.push(format!("policy {}: rule with empty id", policy.id));
        } else if !seen.insert(rule.id.as_str()) {
            problems.push(format!("policy {}: duplicate rule id {}", policy.id, rule.id));
        }
    }
    let mut variables = BTreeSet::new();
    for variable in &policy.variables {
        if !variables.insert(variable.variable_id.as_str()) {
            problems.push(format!(
                "policy {}: duplicate variable id {}",
                policy.id, variable.variable_id
            ));
        }
    }
}

fn check_set(set: &arbiter_domain::model::PolicySet, problems: &mut Vec<String>) {
    if set.id.is_empty() {
        problems.push("policy set with empty id".to_string());
    }
    for child in &set.children {
        match child {
            PolicySetChild::Policy(policy) => check_policy(policy, problems),
            PolicySetChild::PolicySet(inner) => check_set(inner, problems),
            PolicySetChild::PolicyIdReference(r) | PolicySetChild::PolicySetIdReference(r) => {
                if r.id.is_empty() {
                    problems.push(format!("policy set {}: reference with empty id", set.id));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = r#"{
        "Policy": {
            "id": "p",
            "rule_combining_algorithm": "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:deny-overrides",
            "rules": [
                { "id": "r1", "effect": "Permit" },
                { "id": "r2", "effect": "Deny" }
            ]
        }
    }"#;

    #[test]
    fn bare_element_and_document_forms() {
        let bare = parse_policy_document(POLICY).unwrap();
        assert!(bare.valid);
        assert_eq!(bare.root.id(), "p");
        assert_eq!(bare.root.version(), "1.0");

        let wrapped = format!(r#"{{ "valid": false, "root": {POLICY} }}"#);
        let doc = parse_policy_document(&wrapped).unwrap();
        assert!(!doc.valid);
        assert_eq!(doc.root, bare.root);
    }

    #[test]
    fn duplicate_rule_ids_invalidate_the_document() {
        let text = POLICY.replace("\"r2\"", "\"r1\"");
        let doc = parse_policy_document(&text).unwrap();
        assert!(!doc.valid);
        let err = parse_policy_element(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate rule id r1"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_policy_document("{").is_err());
        assert!(parse_policy_document(r#"{"Policy": {"id": 3}}"#).is_err());
        assert!(parse_context_document("42").is_err());
    }

    #[test]
    fn bare_request_is_wrapped() {
        let doc = parse_context_document(
            r#"{
                "subjects": [
                    { "attributes": [
                        { "attribute_id": "urn:oasis:names:tc:xacml:1.0:subject:subject-id",
                          "data_type": "http://www.w3.org/2001/XMLSchema#string",
                          "value": "alice" }
                    ] }
                ],
                "action": { "attributes": [] }
            }"#,
        )
        .unwrap();
        assert!(doc.valid);
        assert_eq!(doc.request.subjects.len(), 1);
        assert_eq!(
            doc.request.subjects[0].subject_category,
            arbiter_types::ids::SUBJECT_CATEGORY_ACCESS_SUBJECT
        );
    }

    #[test]
    fn empty_attribute_id_invalidates_request() {
        let doc = parse_context_document(
            r#"{ "request": { "action": { "attributes": [
                { "attribute_id": "", "data_type": "http://www.w3.org/2001/XMLSchema#string", "value": "x" }
            ] } } }"#,
        )
        .unwrap();
        assert!(!doc.valid);
    }
}
