use arbiter_types::ids;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_subject_category() -> String {
    ids::SUBJECT_CATEGORY_ACCESS_SUBJECT.to_string()
}

/// Parsed request context as handed over by a document provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContextDocument {
    #[serde(default = "default_true")]
    pub valid: bool,
    #[serde(default)]
    pub request: Request,
}

impl ContextDocument {
    pub fn new(request: Request) -> Self {
        Self {
            valid: true,
            request,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Request {
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub environment: Environment,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Subject {
    #[serde(default = "default_subject_category")]
    pub subject_category: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Default for Subject {
    fn default() -> Self {
        Self {
            subject_category: default_subject_category(),
            attributes: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Resource {
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Sub-document queried by attribute selectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
}

impl Resource {
    pub fn resource_id(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.attribute_id == ids::ATTR_RESOURCE_ID)
            .map(|a| a.value.as_str())
    }

    /// Scope requested through the `resource:scope` attribute.
    pub fn scope(&self) -> ResourceScope {
        self.attributes
            .iter()
            .find(|a| a.attribute_id == ids::ATTR_RESOURCE_SCOPE)
            .and_then(|a| ResourceScope::parse(&a.value))
            .unwrap_or_default()
    }

    /// Copy of this resource with its resource-id replaced by `resource_id`.
    pub fn with_resource_id(&self, resource_id: &str) -> Resource {
        let mut copy = self.clone();
        let mut replaced = false;
        for attr in copy
            .attributes
            .iter_mut()
            .filter(|a| a.attribute_id == ids::ATTR_RESOURCE_ID)
        {
            attr.value = resource_id.to_string();
            replaced = true;
        }
        if !replaced {
            copy.attributes.push(Attribute::new(
                ids::ATTR_RESOURCE_ID,
                ids::DATA_TYPE_STRING,
                resource_id,
            ));
        }
        copy
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Environment {
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Attribute {
    pub attribute_id: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    pub value: String,
}

impl Attribute {
    pub fn new(attribute_id: &str, data_type: &str, value: impl Into<String>) -> Self {
        Self {
            attribute_id: attribute_id.to_string(),
            data_type: data_type.to_string(),
            issuer: None,
            value: value.into(),
        }
    }

    pub fn string(attribute_id: &str, value: impl Into<String>) -> Self {
        Self::new(attribute_id, ids::DATA_TYPE_STRING, value)
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ResourceScope {
    #[default]
    Immediate,
    Children,
    Descendants,
}

impl ResourceScope {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "immediate" => Some(ResourceScope::Immediate),
            "children" => Some(ResourceScope::Children),
            "descendants" => Some(ResourceScope::Descendants),
            _ => None,
        }
    }

    pub fn is_hierarchical(self) -> bool {
        self != ResourceScope::Immediate
    }

    /// Whether `candidate` falls under `requested` for this scope.
    ///
    /// URIs are compared as `/`-separated paths; a trailing slash on either
    /// side is ignored. `Children` covers the URI itself and its immediate
    /// children, `Descendants` the URI and everything below it.
    pub fn covers(self, requested: &str, candidate: &str) -> bool {
        let requested = requested.trim_end_matches('/');
        let candidate = candidate.trim_end_matches('/');
        if requested == candidate {
            return true;
        }
        let Some(rest) = candidate
            .strip_prefix(requested)
            .and_then(|r| r.strip_prefix('/'))
        else {
            return false;
        };
        match self {
            ResourceScope::Immediate => false,
            ResourceScope::Children => !rest.is_empty() && !rest.contains('/'),
            ResourceScope::Descendants => !rest.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_covers_self_and_immediate_children() {
        let scope = ResourceScope::Children;
        assert!(scope.covers("/docs", "/docs"));
        assert!(scope.covers("/docs/", "/docs/a"));
        assert!(!scope.covers("/docs", "/docs/a/b"));
        assert!(!scope.covers("/docs", "/docsx"));
    }

    #[test]
    fn descendants_covers_whole_subtree() {
        let scope = ResourceScope::Descendants;
        assert!(scope.covers("/docs", "/docs"));
        assert!(scope.covers("/docs", "/docs/a/b/c"));
        assert!(!scope.covers("/docs", "/other/docs"));
    }

    #[test]
    fn scope_is_read_from_attribute() {
        let resource = Resource {
            attributes: vec![
                Attribute::string(ids::ATTR_RESOURCE_ID, "/docs"),
                Attribute::string(ids::ATTR_RESOURCE_SCOPE, "Descendants"),
            ],
            content: None,
        };
        assert_eq!(resource.scope(), ResourceScope::Descendants);
        assert_eq!(Resource::default().scope(), ResourceScope::Immediate);

        let copy = resource.with_resource_id("/docs/a");
        assert_eq!(copy.resource_id(), Some("/docs/a"));
        assert_eq!(resource.resource_id(), Some("/docs"));
    }

    #[test]
    fn subject_category_defaults_to_access_subject() {
        let subject: Subject = serde_json::from_str(r#"{ "attributes": [] }"#).expect("parse");
        assert_eq!(subject.subject_category, ids::SUBJECT_CATEGORY_ACCESS_SUBJECT);
    }
}
