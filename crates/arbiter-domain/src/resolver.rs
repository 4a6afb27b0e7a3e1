//! Attribute resolution.
//!
//! A designator is resolved against the request first (subjects, the current
//! resource, the action or the environment, depending on its category). An
//! empty result falls back to the synthesized `current-*` environment
//! attributes and then to the engine's attribute repositories, in order.

use crate::context::EvaluationContext;
use crate::model::{
    Attribute, AttributeDesignator, AttributeReference, AttributeSelector, Category,
};
use crate::value::{Bag, DataType, Scalar};
use arbiter_types::{MissingAttributeDetail, ids};
use time::OffsetDateTime;

/// External source of attribute values consulted when the request has none.
pub trait AttributeRepository: Send + Sync {
    /// `None` means "not known here"; the next repository is asked.
    fn get_attribute(
        &self,
        ctx: &EvaluationContext<'_>,
        designator: &AttributeDesignator,
    ) -> Option<Bag>;
}

/// Resolve a designator to a bag.
///
/// Returns `None` only when the designator's data type is unknown, in which
/// case `processing_error` has been set. An empty bag for a `must_be_present`
/// designator records a missing attribute.
pub fn resolve_designator(
    ctx: &mut EvaluationContext<'_>,
    designator: &AttributeDesignator,
) -> Option<Bag> {
    let Some(data_type) = DataType::from_uri(&designator.data_type) else {
        tracing::warn!(
            data_type = %designator.data_type,
            attribute_id = %designator.attribute_id,
            "designator has unknown data type"
        );
        ctx.set_processing_error();
        return None;
    };

    let mut bag = Bag::new(data_type);
    let mut parse_failures = 0;
    match designator.category {
        Category::Subject => {
            let request = ctx.request();
            for subject in &request.subjects {
                if let Some(category) = &designator.subject_category
                    && &subject.subject_category != category
                {
                    continue;
                }
                parse_failures +=
                    collect_matching(&subject.attributes, designator, data_type, &mut bag);
            }
        }
        Category::Resource => {
            parse_failures += collect_matching(
                &ctx.current_resource().attributes,
                designator,
                data_type,
                &mut bag,
            );
        }
        Category::Action => {
            parse_failures += collect_matching(
                &ctx.request().action.attributes,
                designator,
                data_type,
                &mut bag,
            );
        }
        Category::Environment => {
            parse_failures += collect_matching(
                &ctx.request().environment.attributes,
                designator,
                data_type,
                &mut bag,
            );
        }
    }
    if parse_failures > 0 {
        ctx.set_processing_error();
    }

    if bag.is_empty()
        && let Some(found) = get_attribute(ctx, designator, data_type)
    {
        bag = found;
    }

    if bag.is_empty() && designator.must_be_present {
        ctx.trace(format_args!(
            "missing attribute {} ({})",
            designator.attribute_id,
            designator.category.as_str()
        ));
        ctx.add_missing_attribute(MissingAttributeDetail {
            category: designator.category.as_str().to_string(),
            attribute_id: designator.attribute_id.clone(),
            data_type: designator.data_type.clone(),
            issuer: designator.issuer.clone(),
        });
    }
    Some(bag)
}

/// Resolve a selector against the current resource's content.
///
/// A query failure sets `processing_error` and yields an empty bag. A resource
/// without content yields an empty bag without error.
pub fn resolve_selector(
    ctx: &mut EvaluationContext<'_>,
    selector: &AttributeSelector,
) -> Option<Bag> {
    let Some(data_type) = DataType::from_uri(&selector.data_type) else {
        tracing::warn!(data_type = %selector.data_type, "selector has unknown data type");
        ctx.set_processing_error();
        return None;
    };

    let mut bag = Bag::new(data_type);
    let selected = match &ctx.current_resource().content {
        Some(content) => ctx.engine().selector().select(content, &selector.path),
        None => Ok(Vec::new()),
    };
    match selected {
        Ok(texts) => {
            let mut failed = false;
            for (pos, text) in texts.iter().enumerate() {
                match data_type.parse(text, pos) {
                    Ok(value) => bag_push(&mut bag, value),
                    Err(err) => {
                        tracing::warn!(path = %selector.path, error = %err, "selected value skipped");
                        failed = true;
                    }
                }
            }
            if failed {
                ctx.set_processing_error();
            }
        }
        Err(err) => {
            tracing::warn!(path = %selector.path, error = %err, "selector query failed");
            ctx.set_processing_error();
        }
    }

    if bag.is_empty() && selector.must_be_present {
        ctx.add_missing_attribute(MissingAttributeDetail {
            category: "selector".to_string(),
            attribute_id: selector.path.clone(),
            data_type: selector.data_type.clone(),
            issuer: None,
        });
    }
    Some(bag)
}

pub fn resolve_reference(
    ctx: &mut EvaluationContext<'_>,
    reference: &AttributeReference,
) -> Option<Bag> {
    match reference {
        AttributeReference::Designator(d) => resolve_designator(ctx, d),
        AttributeReference::Selector(s) => resolve_selector(ctx, s),
    }
}

/// Fallback lookup: synthesized environment attributes, then repositories.
fn get_attribute(
    ctx: &EvaluationContext<'_>,
    designator: &AttributeDesignator,
    data_type: DataType,
) -> Option<Bag> {
    if designator.category == Category::Environment
        && let Some(bag) =
            current_time_attribute(&designator.attribute_id, data_type, ctx.engine().now())
    {
        return Some(bag);
    }

    for repository in ctx.engine().attribute_repositories() {
        if let Some(bag) = repository.get_attribute(ctx, designator) {
            if bag.data_type() == data_type {
                return Some(bag);
            }
            tracing::warn!(
                attribute_id = %designator.attribute_id,
                expected = %data_type,
                found = %bag.data_type(),
                "attribute repository returned a bag of the wrong data type"
            );
        }
    }
    None
}

fn current_time_attribute(
    attribute_id: &str,
    data_type: DataType,
    now: OffsetDateTime,
) -> Option<Bag> {
    let value = match (attribute_id, data_type) {
        (ids::ATTR_CURRENT_TIME, DataType::Time) => Scalar::Time(now.time()),
        (ids::ATTR_CURRENT_DATE, DataType::Date) => Scalar::Date(now.date()),
        (ids::ATTR_CURRENT_DATE_TIME, DataType::DateTime) => Scalar::DateTime(now),
        _ => return None,
    };
    let mut bag = Bag::new(data_type);
    bag_push(&mut bag, value);
    Some(bag)
}

/// Append the parsed values of every attribute matching the designator.
/// Returns how many values failed to parse.
fn collect_matching(
    attributes: &[Attribute],
    designator: &AttributeDesignator,
    data_type: DataType,
    bag: &mut Bag,
) -> usize {
    let mut failures = 0;
    for attr in attributes.iter().filter(|a| attribute_matches(a, designator)) {
        match data_type.parse(&attr.value, bag.len()) {
            Ok(value) => bag_push(bag, value),
            Err(err) => {
                tracing::warn!(attribute_id = %attr.attribute_id, error = %err, "attribute value skipped");
                failures += 1;
            }
        }
    }
    failures
}

/// Id and data type must be equal; a designator issuer must equal the
/// attribute's issuer, an absent one matches any issuer.
pub fn attribute_matches(attr: &Attribute, designator: &AttributeDesignator) -> bool {
    if attr.attribute_id != designator.attribute_id || attr.data_type != designator.data_type {
        return false;
    }
    match designator.issuer.as_deref() {
        None | Some("") => true,
        Some(issuer) => attr.issuer.as_deref() == Some(issuer),
    }
}

fn bag_push(bag: &mut Bag, value: Scalar) {
    // Values come from `bag.data_type().parse`, so the type always agrees.
    let _ = bag.push(value);
}

/// One attribute served by [`StaticAttributeRepository`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticAttribute {
    pub category: Category,
    pub attribute_id: String,
    pub data_type: String,
    pub issuer: Option<String>,
    pub values: Vec<String>,
}

/// Fixed attribute values, typically loaded from configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticAttributeRepository {
    attributes: Vec<StaticAttribute>,
}

impl StaticAttributeRepository {
    pub fn new(attributes: Vec<StaticAttribute>) -> Self {
        Self { attributes }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }
}

impl AttributeRepository for StaticAttributeRepository {
    fn get_attribute(
        &self,
        _ctx: &EvaluationContext<'_>,
        designator: &AttributeDesignator,
    ) -> Option<Bag> {
        let data_type = DataType::from_uri(&designator.data_type)?;
        let entry = self.attributes.iter().find(|a| {
            a.category == designator.category
                && a.attribute_id == designator.attribute_id
                && a.data_type == designator.data_type
                && match designator.issuer.as_deref() {
                    None | Some("") => true,
                    Some(issuer) => a.issuer.as_deref() == Some(issuer),
                }
        })?;
        let mut bag = Bag::new(data_type);
        for (pos, text) in entry.values.iter().enumerate() {
            match data_type.parse(text, pos) {
                Ok(value) => bag_push(&mut bag, value),
                Err(err) => tracing::warn!(
                    attribute_id = %entry.attribute_id,
                    error = %err,
                    "skipping static attribute value"
                ),
            }
        }
        Some(bag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::model::{ContextDocument, Resource};
    use crate::test_support::{RequestBuilder, fixed_clock};
    use serde_json::json;
    use time::macros::datetime;

    fn subject_role(issuer: Option<&str>) -> AttributeDesignator {
        let mut d = AttributeDesignator::new(Category::Subject, "urn:example:role", ids::DATA_TYPE_STRING);
        d.issuer = issuer.map(str::to_string);
        d
    }

    #[test]
    fn subject_values_are_unioned_across_subjects() {
        let engine = Engine::new();
        let doc = RequestBuilder::new()
            .subject(vec![Attribute::string("urn:example:role", "admin")])
            .subject(vec![
                Attribute::string("urn:example:role", "auditor"),
                Attribute::string("urn:example:other", "x"),
            ])
            .build();
        let mut ctx = EvaluationContext::new(&engine, &doc);

        let bag = resolve_designator(&mut ctx, &subject_role(None)).expect("known type");
        let values: Vec<String> = bag.iter().map(|v| v.to_string()).collect();
        assert_eq!(values, vec!["admin", "auditor"]);
        assert!(ctx.status().is_clean());
    }

    #[test]
    fn subject_category_filter_and_issuer_rule() {
        let engine = Engine::new();
        let mut doc = RequestBuilder::new()
            .subject(vec![
                Attribute::string("urn:example:role", "admin").with_issuer("corp"),
            ])
            .subject(vec![Attribute::string("urn:example:role", "guest")])
            .build();
        doc.request.subjects[1].subject_category = "urn:example:codebase".to_string();
        let mut ctx = EvaluationContext::new(&engine, &doc);

        let bag = resolve_designator(&mut ctx, &subject_role(Some("corp"))).unwrap();
        assert_eq!(bag.len(), 1);
        let bag = resolve_designator(&mut ctx, &subject_role(Some("other"))).unwrap();
        assert!(bag.is_empty());

        let mut d = subject_role(None);
        d.subject_category = Some("urn:example:codebase".to_string());
        let bag = resolve_designator(&mut ctx, &d).unwrap();
        assert_eq!(bag.values(), &[Scalar::String("guest".into())]);
    }

    #[test]
    fn missing_required_attribute_sets_flag_and_detail() {
        let engine = Engine::new();
        let doc = ContextDocument::default();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let bag = resolve_designator(&mut ctx, &subject_role(None).required()).unwrap();
        assert!(bag.is_empty());
        assert!(ctx.is_missing_attribute());
        assert_eq!(ctx.missing_attributes()[0].attribute_id, "urn:example:role");
        assert!(!ctx.processing_error());
    }

    #[test]
    fn optional_absent_attribute_is_silent() {
        let engine = Engine::new();
        let doc = ContextDocument::default();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let bag = resolve_designator(&mut ctx, &subject_role(None)).unwrap();
        assert!(bag.is_empty());
        assert!(ctx.status().is_clean());
    }

    #[test]
    fn unparsable_value_sets_processing_error() {
        let engine = Engine::new();
        let doc = RequestBuilder::new()
            .action(vec![Attribute::new(
                "urn:example:count",
                ids::DATA_TYPE_INTEGER,
                "many",
            )])
            .build();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let d = AttributeDesignator::new(Category::Action, "urn:example:count", ids::DATA_TYPE_INTEGER);
        let bag = resolve_designator(&mut ctx, &d).unwrap();
        assert!(bag.is_empty());
        assert!(ctx.processing_error());
    }

    #[test]
    fn unknown_data_type_is_processing_error() {
        let engine = Engine::new();
        let doc = ContextDocument::default();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let d = AttributeDesignator::new(Category::Action, "a", "urn:example:no-such-type");
        assert!(resolve_designator(&mut ctx, &d).is_none());
        assert!(ctx.processing_error());
    }

    #[test]
    fn current_date_time_is_synthesized_from_clock() {
        let engine = Engine::builder()
            .clock(fixed_clock)
            .build();
        let doc = ContextDocument::default();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let d = AttributeDesignator::new(
            Category::Environment,
            ids::ATTR_CURRENT_DATE_TIME,
            ids::DATA_TYPE_DATE_TIME,
        )
        .required();
        let bag = resolve_designator(&mut ctx, &d).unwrap();
        assert_eq!(
            bag.values(),
            &[Scalar::DateTime(datetime!(2024-06-01 09:30:00 UTC))]
        );
        assert!(ctx.status().is_clean());
    }

    #[test]
    fn repositories_are_consulted_in_order() {
        let first = StaticAttributeRepository::new(vec![StaticAttribute {
            category: Category::Environment,
            attribute_id: "urn:example:region".to_string(),
            data_type: ids::DATA_TYPE_STRING.to_string(),
            issuer: None,
            values: vec!["eu-west".to_string()],
        }]);
        let second = StaticAttributeRepository::new(vec![StaticAttribute {
            category: Category::Environment,
            attribute_id: "urn:example:region".to_string(),
            data_type: ids::DATA_TYPE_STRING.to_string(),
            issuer: None,
            values: vec!["us-east".to_string()],
        }]);
        let engine = Engine::builder()
            .attribute_repository(first)
            .attribute_repository(second)
            .build();
        let doc = ContextDocument::default();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let d = AttributeDesignator::new(Category::Environment, "urn:example:region", ids::DATA_TYPE_STRING);
        let bag = resolve_designator(&mut ctx, &d).unwrap();
        assert_eq!(bag.values(), &[Scalar::String("eu-west".into())]);
    }

    #[test]
    fn environment_attributes_come_from_the_request() {
        let engine = Engine::new();
        let doc = RequestBuilder::new()
            .environment(vec![Attribute::string("urn:example:region", "eu-west")])
            .build();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let d = AttributeDesignator::new(Category::Environment, "urn:example:region", ids::DATA_TYPE_STRING)
            .required();
        let bag = resolve_designator(&mut ctx, &d).unwrap();
        assert_eq!(bag.values(), &[Scalar::String("eu-west".into())]);
        assert!(ctx.status().is_clean());
    }

    #[test]
    fn static_values_that_do_not_parse_are_skipped() {
        let repository = StaticAttributeRepository::new(vec![StaticAttribute {
            category: Category::Environment,
            attribute_id: "urn:example:limit".to_string(),
            data_type: ids::DATA_TYPE_INTEGER.to_string(),
            issuer: None,
            values: vec!["10".to_string(), "ten".to_string(), "20".to_string()],
        }]);
        let engine = Engine::builder().attribute_repository(repository).build();
        let doc = ContextDocument::default();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let d = AttributeDesignator::new(Category::Environment, "urn:example:limit", ids::DATA_TYPE_INTEGER);
        let bag = resolve_designator(&mut ctx, &d).unwrap();
        assert_eq!(bag.values(), &[Scalar::Integer(10), Scalar::Integer(20)]);
    }

    #[test]
    fn selector_reads_resource_content() {
        let engine = Engine::new();
        let doc = RequestBuilder::new()
            .resource(Resource {
                attributes: Vec::new(),
                content: Some(json!({ "owner": "alice", "size": [1, 2] })),
            })
            .build();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let sel = AttributeSelector {
            path: "/size".to_string(),
            data_type: ids::DATA_TYPE_INTEGER.to_string(),
            must_be_present: false,
        };
        let bag = resolve_selector(&mut ctx, &sel).unwrap();
        assert_eq!(bag.values(), &[Scalar::Integer(1), Scalar::Integer(2)]);
    }

    #[test]
    fn selector_with_zero_matches_is_silent() {
        let engine = Engine::new();
        let doc = RequestBuilder::new()
            .resource(Resource {
                attributes: Vec::new(),
                content: Some(json!({ "owner": "alice" })),
            })
            .build();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let sel = AttributeSelector {
            path: "/nobody/home".to_string(),
            data_type: ids::DATA_TYPE_STRING.to_string(),
            must_be_present: false,
        };
        let bag = resolve_selector(&mut ctx, &sel).unwrap();
        assert!(bag.is_empty());
        assert!(!ctx.is_missing_attribute());
        assert!(!ctx.processing_error());
    }

    #[test]
    fn selector_query_failure_is_processing_error() {
        let engine = Engine::new();
        let doc = RequestBuilder::new()
            .resource(Resource {
                attributes: Vec::new(),
                content: Some(json!({})),
            })
            .build();
        let mut ctx = EvaluationContext::new(&engine, &doc);
        let sel = AttributeSelector {
            path: "relative".to_string(),
            data_type: ids::DATA_TYPE_STRING.to_string(),
            must_be_present: false,
        };
        let bag = resolve_selector(&mut ctx, &sel).unwrap();
        assert!(bag.is_empty());
        assert!(ctx.processing_error());
    }
}
