use arbiter_types::{Effect, Obligation};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Parsed policy document as handed over by a document provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyDocument {
    /// Pre-computed schema validity. Invalid documents are never walked.
    #[serde(default = "default_true")]
    pub valid: bool,
    pub root: PolicyElement,
}

impl PolicyDocument {
    pub fn new(root: PolicyElement) -> Self {
        Self { valid: true, root }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum PolicyElement {
    Policy(Policy),
    PolicySet(PolicySet),
}

impl PolicyElement {
    pub fn id(&self) -> &str {
        match self {
            PolicyElement::Policy(p) => &p.id,
            PolicyElement::PolicySet(s) => &s.id,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            PolicyElement::Policy(p) => &p.version,
            PolicyElement::PolicySet(s) => &s.version,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolicySet {
    pub id: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Target,
    pub policy_combining_algorithm: String,
    #[serde(default)]
    pub children: Vec<PolicySetChild>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obligations: Vec<Obligation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum PolicySetChild {
    Policy(Policy),
    PolicySet(PolicySet),
    PolicyIdReference(IdReference),
    PolicySetIdReference(IdReference),
}

/// Reference to a policy or policy set held by a policy repository.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IdReference {
    pub id: String,
    /// Version-match pattern (`1.*`, `2.+`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
}

impl IdReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Policy {
    pub id: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Target,
    pub rule_combining_algorithm: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDefinition>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obligations: Vec<Obligation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub effect: Effect,
    /// Absent target means the rule inherits its policy's applicability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Apply>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VariableDefinition {
    pub variable_id: String,
    pub expression: Expression,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Target {
    #[serde(default)]
    pub subjects: TargetSection,
    #[serde(default)]
    pub resources: TargetSection,
    #[serde(default)]
    pub actions: TargetSection,
    #[serde(default)]
    pub environments: TargetSection,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TargetSection {
    /// Wildcard: matches without consulting the request.
    #[default]
    Any,
    /// Disjunction of items, each a conjunction of matches.
    AnyOf(Vec<TargetItem>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TargetItem {
    pub matches: Vec<Match>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Match {
    pub match_id: String,
    pub value: AttributeValue,
    pub attribute: AttributeReference,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttributeReference {
    Designator(AttributeDesignator),
    Selector(AttributeSelector),
}

impl AttributeReference {
    pub fn data_type(&self) -> &str {
        match self {
            AttributeReference::Designator(d) => &d.data_type,
            AttributeReference::Selector(s) => &s.data_type,
        }
    }

    pub fn must_be_present(&self) -> bool {
        match self {
            AttributeReference::Designator(d) => d.must_be_present,
            AttributeReference::Selector(s) => s.must_be_present,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Subject,
    Resource,
    Action,
    Environment,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Subject => "subject",
            Category::Resource => "resource",
            Category::Action => "action",
            Category::Environment => "environment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "subject" => Some(Category::Subject),
            "resource" => Some(Category::Resource),
            "action" => Some(Category::Action),
            "environment" => Some(Category::Environment),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AttributeDesignator {
    pub category: Category,
    pub attribute_id: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Subject designators only: restrict to subjects of this category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_category: Option<String>,
    #[serde(default)]
    pub must_be_present: bool,
}

impl AttributeDesignator {
    pub fn new(category: Category, attribute_id: impl Into<String>, data_type: &str) -> Self {
        Self {
            category,
            attribute_id: attribute_id.into(),
            data_type: data_type.to_string(),
            issuer: None,
            subject_category: None,
            must_be_present: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.must_be_present = true;
        self
    }
}

/// Path query against the current resource's content document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AttributeSelector {
    pub path: String,
    pub data_type: String,
    #[serde(default)]
    pub must_be_present: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AttributeValue {
    pub data_type: String,
    pub value: String,
}

impl AttributeValue {
    pub fn new(data_type: &str, value: impl Into<String>) -> Self {
        Self {
            data_type: data_type.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Apply {
    pub function_id: String,
    #[serde(default)]
    pub arguments: Vec<Expression>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Apply(Apply),
    Function { function_id: String },
    Value(AttributeValue),
    Designator(AttributeDesignator),
    Selector(AttributeSelector),
    VariableReference { variable_id: String },
}
