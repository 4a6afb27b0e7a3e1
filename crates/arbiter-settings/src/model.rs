use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Schema id accepted in the optional `schema` field.
pub const SCHEMA_CONFIG_V1: &str = "arbiter.config.v1";

/// `arbiter.toml` schema v1.
///
/// This is a *user-facing* config model: every field is optional so an empty file is valid.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArbiterConfigV1 {
    /// Optional schema string for tooling (`arbiter.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub policies: PoliciesConfig,

    /// Static attributes consulted after the request context.
    #[serde(default)]
    pub attributes: Vec<AttributeConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EngineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_variable_depth: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_reference_depth: Option<usize>,

    /// Emit evaluation trace lines at TRACE level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PoliciesConfig {
    /// Directories (relative to the config file) searched for referenced policies.
    #[serde(default)]
    pub search_paths: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AttributeConfig {
    /// `subject`, `resource`, `action` or `environment`.
    pub category: String,
    pub attribute_id: String,
    /// Data type URI; defaults to string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}
