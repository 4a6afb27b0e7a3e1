#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderableDecision {
    Permit,
    Deny,
    NotApplicable,
    Indeterminate,
}

impl RenderableDecision {
    pub fn label(self) -> &'static str {
        match self {
            RenderableDecision::Permit => "Permit",
            RenderableDecision::Deny => "Deny",
            RenderableDecision::NotApplicable => "NotApplicable",
            RenderableDecision::Indeterminate => "Indeterminate",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableMissingAttribute {
    pub category: String,
    pub attribute_id: String,
    pub data_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableObligation {
    pub obligation_id: String,
    /// `(attribute_id, value)` pairs in document order.
    pub assignments: Vec<(String, String)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableResult {
    pub resource_id: Option<String>,
    pub decision: RenderableDecision,
    /// Short status code (`ok`, `missing-attribute`, ...).
    pub status: String,
    pub message: Option<String>,
    pub missing_attributes: Vec<RenderableMissingAttribute>,
    pub obligations: Vec<RenderableObligation>,
}

impl RenderableResult {
    pub fn resource_label(&self) -> &str {
        self.resource_id.as_deref().unwrap_or("(no resource id)")
    }

    pub(crate) fn has_details(&self) -> bool {
        self.message.is_some() || !self.missing_attributes.is_empty() || !self.obligations.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderableResponse {
    pub decision: RenderableDecision,
    pub results: Vec<RenderableResult>,
}
