use anyhow::Context;
use arbiter_render::{
    RenderableDecision, RenderableMissingAttribute, RenderableObligation, RenderableResponse,
    RenderableResult,
};
use arbiter_types::{
    Decision, DecisionResult, Response, ResponseEnvelope, SCHEMA_RESPONSE_V1, StatusCode,
    ToolMeta,
};
use time::OffsetDateTime;

pub fn parse_response_json(text: &str) -> anyhow::Result<ResponseEnvelope> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse response json")?;
    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if schema != SCHEMA_RESPONSE_V1 {
        anyhow::bail!("unknown response schema: {schema} (expected {SCHEMA_RESPONSE_V1})");
    }
    serde_json::from_value(value).context("parse arbiter response")
}

pub fn serialize_response(envelope: &ResponseEnvelope) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec_pretty(envelope).context("serialize response")
}

/// Envelope reported when the tool itself fails before a decision is made.
pub fn runtime_error_envelope(message: &str) -> ResponseEnvelope {
    let now = OffsetDateTime::now_utc();
    ResponseEnvelope {
        schema: SCHEMA_RESPONSE_V1.to_string(),
        tool: ToolMeta {
            name: "arbiter".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at: now,
        finished_at: now,
        decision: Decision::Indeterminate,
        response: Response {
            results: vec![DecisionResult::indeterminate(
                StatusCode::ProcessingError,
                message,
            )],
        },
    }
}

pub fn to_renderable(envelope: &ResponseEnvelope) -> RenderableResponse {
    RenderableResponse {
        decision: renderable_decision(envelope.decision),
        results: envelope
            .response
            .results
            .iter()
            .map(renderable_result)
            .collect(),
    }
}

fn renderable_decision(decision: Decision) -> RenderableDecision {
    match decision {
        Decision::Permit => RenderableDecision::Permit,
        Decision::Deny => RenderableDecision::Deny,
        Decision::NotApplicable => RenderableDecision::NotApplicable,
        Decision::Indeterminate => RenderableDecision::Indeterminate,
    }
}

fn status_label(code: StatusCode) -> &'static str {
    match code {
        StatusCode::Ok => "ok",
        StatusCode::MissingAttribute => "missing-attribute",
        StatusCode::SyntaxError => "syntax-error",
        StatusCode::ProcessingError => "processing-error",
    }
}

fn renderable_result(r: &DecisionResult) -> RenderableResult {
    RenderableResult {
        resource_id: r.resource_id.clone(),
        decision: renderable_decision(r.decision),
        status: status_label(r.status.code).to_string(),
        message: r.status.message.clone(),
        missing_attributes: r
            .status
            .missing_attributes
            .iter()
            .map(|m| RenderableMissingAttribute {
                category: m.category.clone(),
                attribute_id: m.attribute_id.clone(),
                data_type: m.data_type.clone(),
            })
            .collect(),
        obligations: r
            .obligations
            .iter()
            .map(|o| RenderableObligation {
                obligation_id: o.obligation_id.clone(),
                assignments: o
                    .assignments
                    .iter()
                    .map(|a| (a.attribute_id.clone(), a.value.clone()))
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_types::{AttributeAssignment, Effect, Obligation, Status};

    #[test]
    fn serialize_then_parse_keeps_the_envelope() {
        let envelope = runtime_error_envelope("boom");
        let bytes = serialize_response(&envelope).expect("serialize");
        let text = String::from_utf8(bytes).expect("utf8");
        assert!(text.contains("\"schema\": \"arbiter.response.v1\""));
        let parsed = parse_response_json(&text).expect("parse");
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn foreign_schema_is_rejected() {
        let err = parse_response_json(r#"{ "schema": "other.v1" }"#).unwrap_err();
        assert!(err.to_string().contains("unknown response schema: other.v1"));
        assert!(parse_response_json("not json").is_err());
    }

    #[test]
    fn renderable_carries_obligations_and_status() {
        let mut envelope = runtime_error_envelope("unused");
        envelope.decision = Decision::Deny;
        envelope.response.results = vec![DecisionResult {
            resource_id: Some("/docs/a".to_string()),
            decision: Decision::Deny,
            status: Status::ok(),
            obligations: vec![Obligation {
                obligation_id: "notify".to_string(),
                fulfill_on: Effect::Deny,
                assignments: vec![AttributeAssignment {
                    attribute_id: "to".to_string(),
                    data_type: arbiter_types::ids::DATA_TYPE_STRING.to_string(),
                    value: "security".to_string(),
                }],
            }],
        }];

        let renderable = to_renderable(&envelope);
        assert_eq!(renderable.decision, RenderableDecision::Deny);
        let result = &renderable.results[0];
        assert_eq!(result.status, "ok");
        assert_eq!(result.resource_label(), "/docs/a");
        assert_eq!(
            result.obligations[0].assignments,
            vec![("to".to_string(), "security".to_string())]
        );
    }
}
