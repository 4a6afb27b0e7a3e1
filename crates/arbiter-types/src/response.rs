use crate::ids;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Stable schema identifier for the CLI response envelope.
pub const SCHEMA_RESPONSE_V1: &str = "arbiter.response.v1";

/// Outcome of evaluating a rule, policy or policy set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Decision {
    Permit,
    Deny,
    NotApplicable,
    Indeterminate,
}

impl Decision {
    /// Permit and Deny are the only decisions an obligation can be attached to.
    pub fn effect(self) -> Option<Effect> {
        match self {
            Decision::Permit => Some(Effect::Permit),
            Decision::Deny => Some(Effect::Deny),
            Decision::NotApplicable | Decision::Indeterminate => None,
        }
    }

    pub fn is_applicable(self) -> bool {
        self != Decision::NotApplicable
    }
}

impl From<Effect> for Decision {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Permit => Decision::Permit,
            Effect::Deny => Decision::Deny,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Permit => "Permit",
            Decision::Deny => "Deny",
            Decision::NotApplicable => "NotApplicable",
            Decision::Indeterminate => "Indeterminate",
        };
        f.write_str(s)
    }
}

/// Rule effect, also used as the `FulfillOn` selector of obligations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Effect {
    Permit,
    Deny,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StatusCode {
    Ok,
    MissingAttribute,
    SyntaxError,
    ProcessingError,
}

impl StatusCode {
    pub fn urn(self) -> &'static str {
        match self {
            StatusCode::Ok => ids::STATUS_OK,
            StatusCode::MissingAttribute => ids::STATUS_MISSING_ATTRIBUTE,
            StatusCode::SyntaxError => ids::STATUS_SYNTAX_ERROR,
            StatusCode::ProcessingError => ids::STATUS_PROCESSING_ERROR,
        }
    }
}

/// One attribute reference that was required but could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MissingAttributeDetail {
    /// `subject`, `resource`, `action`, `environment` or `selector`.
    pub category: String,
    /// Attribute id, or the selector path for selectors.
    pub attribute_id: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Status {
    pub code: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_attributes: Vec<MissingAttributeDetail>,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            message: None,
            missing_attributes: Vec::new(),
        }
    }

    pub fn with_message(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            missing_attributes: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AttributeAssignment {
    pub attribute_id: String,
    pub data_type: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Obligation {
    pub obligation_id: String,
    pub fulfill_on: Effect,
    #[serde(default)]
    pub assignments: Vec<AttributeAssignment>,
}

/// Decision for one (possibly hierarchical) resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DecisionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub decision: Decision,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obligations: Vec<Obligation>,
}

impl DecisionResult {
    pub fn indeterminate(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            resource_id: None,
            decision: Decision::Indeterminate,
            status: Status::with_message(code, message),
            obligations: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Response {
    pub results: Vec<DecisionResult>,
}

impl Response {
    /// Aggregate decision used for exit codes: Indeterminate > Deny > NotApplicable > Permit.
    ///
    /// An empty response is NotApplicable.
    pub fn aggregate_decision(&self) -> Decision {
        let rank = |d: Decision| match d {
            Decision::Permit => 0,
            Decision::NotApplicable => 1,
            Decision::Deny => 2,
            Decision::Indeterminate => 3,
        };
        self.results
            .iter()
            .map(|r| r.decision)
            .max_by_key(|d| rank(*d))
            .unwrap_or(Decision::NotApplicable)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Envelope written by the CLI around an engine response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseEnvelope {
    /// Versioned schema identifier for the envelope shape.
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub decision: Decision,
    pub response: Response,
}
